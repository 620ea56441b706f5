//! Page fetcher with retry-on-timeout
//!
//! # Retry Logic
//!
//! | Condition | Action |
//! |-----------|--------|
//! | Navigation timeout | Soft reload, wait, retry (up to `max_attempts` loads) |
//! | HTTP error / bad target | Immediate failure |
//! | Non-HTML content | Immediate failure |
//! | Renderer unavailable | Immediate failure |
//!
//! Every fetch runs in its own renderer session, released on all exit paths.

use crate::config::FetchConfig;
use crate::crawler::renderer::{RenderError, RenderSession, RenderedPage, Renderer};
use crate::state::PageState;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Attempt cap and timings for one fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total page loads before giving up on a timing-out page
    pub max_attempts: u32,

    /// Navigation timeout per load
    pub page_load_timeout: Duration,

    /// Pause after a soft reload, before the next load
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&FetchConfig::default())
    }
}

impl From<&FetchConfig> for RetryPolicy {
    fn from(config: &FetchConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            page_load_timeout: config.page_load_timeout(),
            retry_delay: config.retry_delay(),
        }
    }
}

/// A fetch that ran out of attempts or hit a non-retryable failure
#[derive(Debug, Error)]
#[error("Failed to fetch {url} after {attempts} attempt(s): {cause}")]
pub struct FetchError {
    pub url: String,
    pub attempts: u32,
    #[source]
    pub cause: RenderError,
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        self.cause.is_timeout()
    }

    /// The page state this failure maps to
    pub fn page_state(&self) -> PageState {
        if self.is_timeout() {
            PageState::TimedOut
        } else {
            PageState::Failed
        }
    }
}

/// Wraps the renderer with the retry policy
pub struct Fetcher {
    renderer: Arc<dyn Renderer>,
    policy: RetryPolicy,
}

impl Fetcher {
    pub fn new(renderer: Arc<dyn Renderer>, policy: RetryPolicy) -> Self {
        Self { renderer, policy }
    }

    /// Starts and immediately releases one session
    ///
    /// Run once before crawling so an unavailable renderer fails the run
    /// up front instead of failing every page.
    pub async fn check_available(&self) -> Result<(), RenderError> {
        let session = self.renderer.launch().await?;
        drop(SessionGuard::new(session));
        Ok(())
    }

    /// Fetches one page
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to load
    ///
    /// # Returns
    ///
    /// * `Ok(RenderedPage)` - The page markup
    /// * `Err(FetchError)` - Last failure cause and the number of loads made
    pub async fn fetch(&self, url: &Url) -> Result<RenderedPage, FetchError> {
        let session = self.renderer.launch().await.map_err(|cause| FetchError {
            url: url.to_string(),
            attempts: 0,
            cause,
        })?;
        let mut session = SessionGuard::new(session);

        let mut attempt = 0;
        loop {
            attempt += 1;

            match session.navigate(url, self.policy.page_load_timeout).await {
                Ok(page) => {
                    if attempt > 1 {
                        tracing::debug!("Loaded {} on attempt {}", url, attempt);
                    }
                    return Ok(page);
                }
                Err(cause) if cause.is_timeout() && attempt < self.policy.max_attempts => {
                    tracing::debug!(
                        "Timeout loading {} (attempt {}/{}), reloading",
                        url,
                        attempt,
                        self.policy.max_attempts
                    );
                    if let Err(e) = session.reload().await {
                        tracing::debug!("Reload after timeout failed for {}: {}", url, e);
                    }
                    tokio::time::sleep(self.policy.retry_delay).await;
                }
                Err(cause) => {
                    return Err(FetchError {
                        url: url.to_string(),
                        attempts: attempt,
                        cause,
                    });
                }
            }
        }
    }
}

/// Closes the wrapped session when dropped
struct SessionGuard {
    session: Box<dyn RenderSession>,
}

impl SessionGuard {
    fn new(session: Box<dyn RenderSession>) -> Self {
        Self { session }
    }
}

impl Deref for SessionGuard {
    type Target = dyn RenderSession;

    fn deref(&self) -> &Self::Target {
        self.session.as_ref()
    }
}

impl DerefMut for SessionGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.session.as_mut()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.session.close();
    }
}
