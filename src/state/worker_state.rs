/// Per-worker state machine
///
/// `Idle → Fetching → Extracting → Enqueueing → Idle`, with `Idle → Stopped`
/// once the worker observes a terminal condition. A failed fetch returns
/// straight to `Idle`.
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerState {
    /// Waiting on the frontier
    Idle,

    /// Renderer session is loading the page
    Fetching,

    /// Pulling text and links out of the rendered markup
    Extracting,

    /// Offering discovered links back to the frontier
    Enqueueing,

    /// Terminal condition reached; the worker has exited its loop
    Stopped,
}

impl WorkerState {
    /// Returns true if moving from `self` to `next` follows the state machine
    pub fn can_transition_to(&self, next: WorkerState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Fetching)
                | (Self::Idle, Self::Stopped)
                | (Self::Fetching, Self::Extracting)
                | (Self::Fetching, Self::Idle)
                | (Self::Extracting, Self::Enqueueing)
                | (Self::Enqueueing, Self::Idle)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Extracting => "extracting",
            Self::Enqueueing => "enqueueing",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
