use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Sumi-Harvest
///
/// Every section is optional in the TOML file; missing values fall back to
/// the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Number of concurrent workers
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Maximum number of page records to produce (unbounded when absent)
    #[serde(default)]
    pub max_pages: Option<usize>,

    /// Fixed delay each worker sleeps after a page (milliseconds)
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// How long an idle worker waits for new work before exiting (milliseconds)
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    /// Optional path prefix narrowing the crawl scope below the seed's origin
    #[serde(default)]
    pub scope_prefix: Option<String>,
}

/// Page fetch and retry configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FetchConfig {
    /// Navigation timeout for a single page load (milliseconds)
    #[serde(default = "default_page_load_timeout_ms")]
    pub page_load_timeout_ms: u64,

    /// Total page load attempts before giving up on a timing-out page
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Pause between attempts (milliseconds)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(default)]
    pub contact_url: Option<String>,
}

/// Text extraction configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExtractConfig {
    /// Content region selectors, tried in order before the whole document
    #[serde(default = "default_content_selectors")]
    pub content_selectors: Vec<String>,
}

/// Link validity filter configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FilterConfig {
    /// Substrings that disqualify a URL from the frontier
    #[serde(default = "default_blocked_fragments")]
    pub blocked_fragments: Vec<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path of the harvested output file
    #[serde(default = "default_output_path")]
    pub path: String,

    /// Output file format
    #[serde(default)]
    pub format: OutputFormat,
}

/// Supported output formats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain text blocks separated by a dashed line
    #[default]
    Text,
    /// One JSON object per line
    Jsonl,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Jsonl => write!(f, "jsonl"),
        }
    }
}

impl CrawlerConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

impl FetchConfig {
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_millis(self.page_load_timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `CrawlerName/Version` or `CrawlerName/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            max_pages: None,
            request_delay_ms: default_request_delay_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
            scope_prefix: None,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_load_timeout_ms: default_page_load_timeout_ms(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: None,
        }
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            content_selectors: default_content_selectors(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            blocked_fragments: default_blocked_fragments(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            format: OutputFormat::default(),
        }
    }
}

fn default_workers() -> usize {
    3
}

fn default_request_delay_ms() -> u64 {
    1000
}

fn default_idle_timeout_ms() -> u64 {
    5000
}

fn default_page_load_timeout_ms() -> u64 {
    20_000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_crawler_name() -> String {
    "SumiHarvest".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_content_selectors() -> Vec<String> {
    vec!["main".to_string(), ".container".to_string()]
}

fn default_blocked_fragments() -> Vec<String> {
    ["#carousel", "#skip", "javascript:", "mailto:"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_output_path() -> String {
    "scraped_data.txt".to_string()
}
