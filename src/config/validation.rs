use crate::config::types::{
    Config, CrawlerConfig, ExtractConfig, FetchConfig, FilterConfig, OutputConfig,
    UserAgentConfig,
};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Upper bound on the worker pool size
const MAX_WORKERS: usize = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_fetch_config(&config.fetch)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_extract_config(&config.extract)?;
    validate_filter_config(&config.filter)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    if config.max_pages == Some(0) {
        return Err(ConfigError::Validation(
            "max_pages must be >= 1 when set".to_string(),
        ));
    }

    if config.idle_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "idle_timeout_ms must be > 0".to_string(),
        ));
    }

    if let Some(prefix) = &config.scope_prefix {
        if !prefix.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "scope_prefix must start with '/', got '{}'",
                prefix
            )));
        }
    }

    Ok(())
}

/// Validates fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.page_load_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "page_load_timeout_ms must be > 0".to_string(),
        ));
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if let Some(contact_url) = &config.contact_url {
        Url::parse(contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    Ok(())
}

/// Validates that every content selector parses
fn validate_extract_config(config: &ExtractConfig) -> Result<(), ConfigError> {
    for selector in &config.content_selectors {
        Selector::parse(selector).map_err(|e| {
            ConfigError::InvalidSelector(format!("'{}': {:?}", selector, e))
        })?;
    }
    Ok(())
}

/// Validates the link filter configuration
fn validate_filter_config(config: &FilterConfig) -> Result<(), ConfigError> {
    if config.blocked_fragments.iter().any(|f| f.is_empty()) {
        // An empty fragment would match every URL
        return Err(ConfigError::Validation(
            "blocked_fragments cannot contain an empty entry".to_string(),
        ));
    }
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "output path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_workers() {
        let mut config = CrawlerConfig::default();
        config.workers = 0;
        assert!(validate_crawler_config(&config).is_err());

        config.workers = MAX_WORKERS + 1;
        assert!(validate_crawler_config(&config).is_err());

        config.workers = MAX_WORKERS;
        assert!(validate_crawler_config(&config).is_ok());
    }

    #[test]
    fn test_validate_max_pages() {
        let mut config = CrawlerConfig::default();
        config.max_pages = Some(0);
        assert!(validate_crawler_config(&config).is_err());

        config.max_pages = Some(1);
        assert!(validate_crawler_config(&config).is_ok());
    }

    #[test]
    fn test_validate_scope_prefix() {
        let mut config = CrawlerConfig::default();
        config.scope_prefix = Some("docs".to_string());
        assert!(validate_crawler_config(&config).is_err());

        config.scope_prefix = Some("/docs".to_string());
        assert!(validate_crawler_config(&config).is_ok());
    }

    #[test]
    fn test_validate_fetch_config() {
        let mut config = FetchConfig::default();
        config.max_attempts = 0;
        assert!(validate_fetch_config(&config).is_err());

        let mut config = FetchConfig::default();
        config.page_load_timeout_ms = 0;
        assert!(validate_fetch_config(&config).is_err());
    }

    #[test]
    fn test_validate_crawler_name() {
        let mut config = UserAgentConfig::default();
        assert!(validate_user_agent_config(&config).is_ok());

        config.crawler_name = String::new();
        assert!(validate_user_agent_config(&config).is_err());

        config.crawler_name = "bad name!".to_string();
        assert!(validate_user_agent_config(&config).is_err());
    }

    #[test]
    fn test_validate_contact_url() {
        let mut config = UserAgentConfig::default();
        config.contact_url = Some("not a url".to_string());
        assert!(matches!(
            validate_user_agent_config(&config),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_validate_selectors() {
        let config = ExtractConfig {
            content_selectors: vec!["main".to_string(), "div[[".to_string()],
        };
        assert!(matches!(
            validate_extract_config(&config),
            Err(ConfigError::InvalidSelector(_))
        ));
    }

    #[test]
    fn test_validate_empty_blocked_fragment() {
        let config = FilterConfig {
            blocked_fragments: vec![String::new()],
        };
        assert!(validate_filter_config(&config).is_err());
    }
}
