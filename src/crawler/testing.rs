//! In-memory renderer for exercising the crawl core without a network

use crate::crawler::renderer::{RenderError, RenderSession, RenderedPage, Renderer};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// What one navigation to a scripted URL does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Return the registered page (or a 404 failure if none)
    Serve,
    /// Fail with `RenderError::Timeout`
    Timeout,
    /// Fail with a non-retryable navigation error
    Fail,
}

#[derive(Default)]
struct Inner {
    pages: Mutex<HashMap<String, String>>,
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    navigations: Mutex<HashMap<String, usize>>,
    latency: Mutex<Duration>,
    launched: AtomicUsize,
    closed: AtomicUsize,
    reloads: AtomicUsize,
    open: AtomicUsize,
    peak_open: AtomicUsize,
    unavailable: bool,
}

/// Renderer serving a fixed page graph, with per-URL failure scripts
#[derive(Clone, Default)]
pub struct ScriptedRenderer {
    inner: Arc<Inner>,
}

impl ScriptedRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A renderer whose `launch` always fails
    pub fn unavailable() -> Self {
        Self {
            inner: Arc::new(Inner {
                unavailable: true,
                ..Inner::default()
            }),
        }
    }

    /// Registers a page with `body` inside `<main>` and one anchor per link
    pub fn page(&self, url: &str, body: &str, links: &[&str]) {
        let anchors: String = links
            .iter()
            .map(|href| format!(r#"<a href="{}">{}</a>"#, href, href))
            .collect();
        let html = format!(
            "<html><head><title>{}</title></head><body>{}<nav>{}</nav></body></html>",
            url, body, anchors
        );
        self.inner.pages.lock().insert(url.to_string(), html);
    }

    /// Registers raw markup for a URL
    pub fn raw(&self, url: &str, html: &str) {
        self.inner
            .pages
            .lock()
            .insert(url.to_string(), html.to_string());
    }

    /// Queues the outcomes of the next navigations to `url`; once the script
    /// runs out the page is served normally
    pub fn script(&self, url: &str, steps: Vec<Step>) {
        self.inner
            .scripts
            .lock()
            .insert(url.to_string(), steps.into());
    }

    /// Delay applied to every navigation
    pub fn set_latency(&self, latency: Duration) {
        *self.inner.latency.lock() = latency;
    }

    pub fn navigations(&self, url: &str) -> usize {
        self.inner.navigations.lock().get(url).copied().unwrap_or(0)
    }

    pub fn total_navigations(&self) -> usize {
        self.inner.navigations.lock().values().sum()
    }

    pub fn launched(&self) -> usize {
        self.inner.launched.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.inner.closed.load(Ordering::SeqCst)
    }

    pub fn reloads(&self) -> usize {
        self.inner.reloads.load(Ordering::SeqCst)
    }

    /// Highest number of sessions that were open at the same time
    pub fn peak_sessions(&self) -> usize {
        self.inner.peak_open.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Renderer for ScriptedRenderer {
    async fn launch(&self) -> Result<Box<dyn RenderSession>, RenderError> {
        if self.inner.unavailable {
            return Err(RenderError::Unavailable("renderer not installed".to_string()));
        }

        self.inner.launched.fetch_add(1, Ordering::SeqCst);
        let open = self.inner.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.peak_open.fetch_max(open, Ordering::SeqCst);

        Ok(Box::new(ScriptedSession {
            inner: self.inner.clone(),
            closed: false,
        }))
    }
}

struct ScriptedSession {
    inner: Arc<Inner>,
    closed: bool,
}

#[async_trait]
impl RenderSession for ScriptedSession {
    async fn navigate(&mut self, url: &Url, timeout: Duration) -> Result<RenderedPage, RenderError> {
        let key = url.to_string();
        *self.inner.navigations.lock().entry(key.clone()).or_insert(0) += 1;

        let latency = *self.inner.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let step = self
            .inner
            .scripts
            .lock()
            .get_mut(&key)
            .and_then(|steps| steps.pop_front())
            .unwrap_or(Step::Serve);

        match step {
            Step::Timeout => Err(RenderError::Timeout { url: key, timeout }),
            Step::Fail => Err(RenderError::Navigation {
                url: key,
                message: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            }),
            Step::Serve => match self.inner.pages.lock().get(&key) {
                Some(html) => Ok(RenderedPage {
                    final_url: url.clone(),
                    html: html.clone(),
                }),
                None => Err(RenderError::Navigation {
                    url: key,
                    message: "HTTP 404".to_string(),
                }),
            },
        }
    }

    async fn reload(&mut self) -> Result<(), RenderError> {
        self.inner.reloads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.inner.closed.fetch_add(1, Ordering::SeqCst);
            self.inner.open.fetch_sub(1, Ordering::SeqCst);
        }
    }
}
