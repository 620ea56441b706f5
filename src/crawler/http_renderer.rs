//! HTTP renderer implementation
//!
//! This module renders pages with a plain HTTP client:
//! - Building HTTP clients with proper user agent strings
//! - GET requests bounded by the navigation timeout
//! - Error classification into timeout vs. non-retryable failures
//!
//! It executes no JavaScript; the markup returned is what the server sends.

use crate::config::UserAgentConfig;
use crate::crawler::renderer::{RenderError, RenderSession, RenderedPage, Renderer};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, Response};
use std::time::Duration;
use url::Url;

/// Maximum redirect hops followed per navigation
const MAX_REDIRECTS: usize = 10;

/// Renderer that fetches pages over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    user_agent: String,
}

impl HttpRenderer {
    pub fn new(config: &UserAgentConfig) -> Self {
        Self {
            user_agent: config.header_value(),
        }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn launch(&self) -> Result<Box<dyn RenderSession>, RenderError> {
        let client = build_http_client(&self.user_agent)
            .map_err(|e| RenderError::Unavailable(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Box::new(HttpSession {
            client: Some(client),
            user_agent: self.user_agent.clone(),
        }))
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The formatted User-Agent header value
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use sumi_harvest::crawler::build_http_client;
///
/// let client = build_http_client("SumiHarvest/0.1.0").unwrap();
/// ```
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    // The per-request navigation timeout is applied in `navigate`
    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Session backed by its own HTTP client and connection pool
struct HttpSession {
    client: Option<Client>,
    user_agent: String,
}

impl HttpSession {
    fn client(&self) -> Result<&Client, RenderError> {
        self.client
            .as_ref()
            .ok_or_else(|| RenderError::Unavailable("Session already closed".to_string()))
    }
}

#[async_trait]
impl RenderSession for HttpSession {
    async fn navigate(&mut self, url: &Url, timeout: Duration) -> Result<RenderedPage, RenderError> {
        let response = self
            .client()?
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_error(url, timeout, e))?;

        read_page(url, timeout, response).await
    }

    async fn reload(&mut self) -> Result<(), RenderError> {
        // Drop the pooled connections a stalled load may still be holding
        let client = build_http_client(&self.user_agent)
            .map_err(|e| RenderError::Unavailable(format!("Failed to rebuild HTTP client: {}", e)))?;
        self.client = Some(client);
        Ok(())
    }

    fn close(&mut self) {
        self.client = None;
    }
}

/// Checks status and content type, then reads the body
async fn read_page(url: &Url, timeout: Duration, response: Response) -> Result<RenderedPage, RenderError> {
    let status = response.status();
    let final_url = response.url().clone();

    if !status.is_success() {
        return Err(RenderError::Navigation {
            url: url.to_string(),
            message: format!("HTTP {}", status.as_u16()),
        });
    }

    // A missing Content-Type is accepted; a non-HTML one is not
    if let Some(content_type) = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    {
        if !is_html_content_type(content_type) {
            return Err(RenderError::ContentMismatch {
                url: url.to_string(),
                content_type: content_type.to_string(),
            });
        }
    }

    let html = response
        .text()
        .await
        .map_err(|e| classify_error(url, timeout, e))?;

    Ok(RenderedPage { final_url, html })
}

/// Maps a reqwest failure onto the renderer error taxonomy
fn classify_error(url: &Url, timeout: Duration, error: reqwest::Error) -> RenderError {
    if error.is_timeout() {
        RenderError::Timeout {
            url: url.to_string(),
            timeout,
        }
    } else if error.is_connect() {
        RenderError::Navigation {
            url: url.to_string(),
            message: "Connection refused".to_string(),
        }
    } else if error.is_redirect() {
        RenderError::Navigation {
            url: url.to_string(),
            message: format!("Redirect error: {}", error),
        }
    } else {
        RenderError::Navigation {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

fn is_html_content_type(content_type: &str) -> bool {
    let lowered = content_type.to_ascii_lowercase();
    lowered.contains("text/html") || lowered.contains("application/xhtml+xml")
}
