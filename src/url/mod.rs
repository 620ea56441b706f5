//! URL handling module for Sumi-Harvest
//!
//! This module provides URL normalization, the link validity filter and the
//! base-origin scope check that together decide which links reach the
//! frontier.

mod filter;
mod normalize;
mod scope;

// Re-export main functions
pub use filter::{is_valid, UrlFilter, DEFAULT_BLOCKED_FRAGMENTS};
pub use normalize::normalize_url;
pub use scope::BaseOrigin;

/// Why a discovered link did not reach the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkVerdict {
    /// In scope and valid
    Follow,
    /// Rejected by the validity filter
    Invalid,
    /// Parsed but outside the base origin
    OutOfScope,
    /// Could not be normalized
    Unparseable,
}

impl LinkVerdict {
    /// Returns true if the link should be offered to the frontier
    pub fn should_follow(&self) -> bool {
        matches!(self, Self::Follow)
    }
}

/// Classifies a discovered link against the filter and the base origin
///
/// Checks run in the following order:
/// 1. Validity filter on the raw link (highest priority)
/// 2. Normalization
/// 3. Base origin scope
pub fn classify_link(raw: &str, filter: &UrlFilter, origin: &BaseOrigin) -> LinkVerdict {
    if !filter.is_valid(raw) {
        return LinkVerdict::Invalid;
    }

    match normalize_url(raw) {
        Ok(url) if origin.contains(&url) => LinkVerdict::Follow,
        Ok(_) => LinkVerdict::OutOfScope,
        Err(_) => LinkVerdict::Unparseable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::url::Url;

    fn origin() -> BaseOrigin {
        BaseOrigin::from_seed(&Url::parse("http://example.test/").unwrap(), None).unwrap()
    }

    #[test]
    fn test_classify_follow() {
        assert_eq!(
            classify_link("http://example.test/a", &UrlFilter::default(), &origin()),
            LinkVerdict::Follow
        );
    }

    #[test]
    fn test_classify_invalid_before_scope() {
        // Out of scope and invalid: the filter wins
        assert_eq!(
            classify_link("mailto:a@other.test", &UrlFilter::default(), &origin()),
            LinkVerdict::Invalid
        );
        assert_eq!(
            classify_link(
                "http://example.test/#carousel",
                &UrlFilter::default(),
                &origin()
            ),
            LinkVerdict::Invalid
        );
    }

    #[test]
    fn test_classify_out_of_scope() {
        assert_eq!(
            classify_link("http://other.test/a", &UrlFilter::default(), &origin()),
            LinkVerdict::OutOfScope
        );
    }

    #[test]
    fn test_classify_unparseable() {
        assert_eq!(
            classify_link("ftp://example.test/file", &UrlFilter::default(), &origin()),
            LinkVerdict::Unparseable
        );
    }

    #[test]
    fn test_should_follow() {
        assert!(LinkVerdict::Follow.should_follow());
        assert!(!LinkVerdict::Invalid.should_follow());
        assert!(!LinkVerdict::OutOfScope.should_follow());
        assert!(!LinkVerdict::Unparseable.should_follow());
    }
}
