/// Page state definitions for tracking harvest outcomes
///
/// Every URL a worker dequeues ends in exactly one of these states.
use std::fmt;

/// Represents the final state of a dequeued page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PageState {
    // ===== Success States =====
    /// Page was fetched and text was extracted
    Processed,

    /// Page was fetched but no extraction strategy produced text;
    /// an empty record is still emitted
    Empty,

    // ===== Error States =====
    /// Every page load attempt timed out
    TimedOut,

    /// Page load failed for a non-timeout reason (bad target, HTTP error,
    /// non-HTML content)
    Failed,

    // ===== Skip States =====
    /// Page was dequeued after the page budget ran out and never fetched
    Skipped,
}

impl PageState {
    /// Returns true if a page record was produced
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Processed | Self::Empty)
    }

    /// Returns true if this represents a fetch failure
    pub fn is_error(&self) -> bool {
        matches!(self, Self::TimedOut | Self::Failed)
    }

    /// Returns true if the page was never fetched
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    /// Stable lowercase name used in logs and statistics output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::Empty => "empty",
            Self::TimedOut => "timed_out",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }

    /// Returns all possible page states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Processed,
            Self::Empty,
            Self::TimedOut,
            Self::Failed,
            Self::Skipped,
        ]
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
