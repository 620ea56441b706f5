//! Crawler module for page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The URL frontier with deduplication and in-flight accounting
//! - Renderer sessions and fetching with retry-on-timeout
//! - Text and link extraction
//! - The worker pool, page budget and result collection

mod budget;
mod collector;
mod coordinator;
mod extractor;
mod fetcher;
mod frontier;
mod http_renderer;
mod renderer;

#[cfg(test)]
mod testing;

pub use budget::{BudgetSlot, CrawlBudget};
pub use collector::{PageRecord, ResultCollector};
pub use coordinator::{CancelHandle, CrawlReport, CrawlSettings, Crawler};
pub use extractor::{ContentStrategy, ExtractedPage, Extractor};
pub use fetcher::{FetchError, Fetcher, RetryPolicy};
pub use frontier::{Admission, Frontier, Lease};
pub use http_renderer::{build_http_client, HttpRenderer};
pub use renderer::{RenderError, RenderSession, RenderedPage, Renderer};
