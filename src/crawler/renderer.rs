//! Page renderer abstraction
//!
//! A renderer hands out sessions. A session is one private renderer instance:
//! it is acquired for a single fetch, never shared between workers, and
//! closed when the fetch ends.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Rendered markup of one page
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// URL the renderer ended up on (after redirects); relative links on the
    /// page resolve against this
    pub final_url: Url,

    /// Full page markup
    pub html: String,
}

/// Errors reported by a renderer or one of its sessions
///
/// `Timeout` is the only retryable kind.
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error("Navigation to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Expected HTML from {url}, got {content_type}")]
    ContentMismatch { url: String, content_type: String },

    #[error("{0}")]
    Unavailable(String),
}

impl RenderError {
    /// Returns true for timeout-class failures
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Source of renderer sessions
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Starts a new private session
    ///
    /// Fails with `RenderError::Unavailable` when no session can be started
    /// at all (missing binary, broken TLS backend, ...).
    async fn launch(&self) -> Result<Box<dyn RenderSession>, RenderError>;
}

/// One renderer instance, owned by a single fetch
#[async_trait]
pub trait RenderSession: Send {
    /// Loads `url` and returns its markup, failing with
    /// `RenderError::Timeout` if it takes longer than `timeout`
    async fn navigate(&mut self, url: &Url, timeout: Duration) -> Result<RenderedPage, RenderError>;

    /// Soft-resets the session after a timed-out load
    async fn reload(&mut self) -> Result<(), RenderError>;

    /// Releases the session's resources; called exactly once
    fn close(&mut self);
}
