//! State module for tracking harvest progress
//!
//! # Components
//!
//! - `PageState`: the final outcome of each dequeued page
//! - `WorkerState`: the per-worker fetch/extract/enqueue state machine

mod page_state;
mod worker_state;

// Re-export main types
pub use page_state::PageState;
pub use worker_state::WorkerState;
