use crate::config::FilterConfig;

/// Fragments that mark a link as non-navigable or duplicate content
pub const DEFAULT_BLOCKED_FRAGMENTS: &[&str] = &["#carousel", "#skip", "javascript:", "mailto:"];

/// Validity predicate applied to the seed and to every discovered link
///
/// The check runs on the raw link text, before normalization strips the
/// fragment, so UI anchors such as `#carousel` are still visible.
#[derive(Debug, Clone)]
pub struct UrlFilter {
    blocked: Vec<String>,
}

impl UrlFilter {
    /// Creates a filter rejecting any URL containing one of `blocked`
    pub fn new<I, S>(blocked: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            blocked: blocked
                .into_iter()
                .map(Into::into)
                .filter(|f: &String| !f.is_empty())
                .map(|f| f.to_lowercase())
                .collect(),
        }
    }

    /// Builds the filter from configuration
    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(config.blocked_fragments.iter().cloned())
    }

    /// Returns true if the URL may enter the frontier
    pub fn is_valid(&self, url: &str) -> bool {
        let lowered = url.to_lowercase();
        !self.blocked.iter().any(|fragment| lowered.contains(fragment))
    }
}

impl Default for UrlFilter {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCKED_FRAGMENTS.iter().copied())
    }
}

/// Checks a URL against the default blocked fragments
///
/// # Examples
///
/// ```
/// use sumi_harvest::url::is_valid;
///
/// assert!(is_valid("https://example.com/about"));
/// assert!(!is_valid("https://example.com/#carousel"));
/// assert!(!is_valid("javascript:void(0)"));
/// assert!(!is_valid("mailto:team@example.com"));
/// ```
pub fn is_valid(url: &str) -> bool {
    UrlFilter::default().is_valid(url)
}
