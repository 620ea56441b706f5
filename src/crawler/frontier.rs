//! Crawl frontier: pending queue, seen set and in-flight accounting
//!
//! The frontier is the single source of truth for which URLs still need a
//! worker. It owns deduplication: a URL is admitted at most once per run and
//! handed to at most one worker.
//!
//! # Termination
//!
//! `take` returns `None` when:
//! - nothing is pending and no lease is outstanding (exhaustion)
//! - the frontier has been closed (cancellation)
//! - the idle timeout elapses with nothing to hand out
//!
//! A lease keeps its URL "in flight" until dropped, so exhaustion is never
//! reported while a page that may still yield links is being fetched.
//!
//! The idle timeout bounds every wait regardless. A worker that waits
//! longer than `idle_timeout` for an in-flight page gets `None` and exits,
//! so an idle timeout shorter than a slow fetch shrinks the pool to the
//! workers still busy. The crawl still completes.

use crate::url::{normalize_url, UrlFilter};
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::ops::Deref;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use url::Url;

/// Outcome of offering a URL to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Newly queued
    Admitted,
    /// Already queued or already visited
    Duplicate,
    /// Failed the validity filter or normalization, or the frontier is closed
    Rejected,
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted)
    }
}

#[derive(Debug, Default)]
struct FrontierState {
    /// URLs waiting for a worker, in discovery order
    pending: VecDeque<Url>,

    /// Every URL ever admitted; the dedup key set
    seen: HashSet<String>,

    /// URLs handed to a worker
    visited: HashSet<String>,

    /// Outstanding leases
    in_flight: usize,

    closed: bool,
}

impl FrontierState {
    fn is_exhausted(&self) -> bool {
        self.pending.is_empty() && self.in_flight == 0
    }
}

enum TakeAttempt {
    Ready(Url),
    Exhausted,
    Closed,
    Wait,
}

/// Thread-safe URL frontier shared by all workers
#[derive(Debug)]
pub struct Frontier {
    state: Mutex<FrontierState>,
    notify: Notify,
    filter: UrlFilter,
}

impl Frontier {
    pub fn new(filter: UrlFilter) -> Self {
        Self {
            state: Mutex::new(FrontierState::default()),
            notify: Notify::new(),
            filter,
        }
    }

    /// Offers a URL for crawling
    ///
    /// The URL is filtered on its raw form, normalized, and queued unless
    /// its normalized form has been seen before. The seen-check and the
    /// enqueue happen under one lock, so two workers discovering the same
    /// link at the same moment queue it once.
    pub fn offer(&self, raw: &str) -> Admission {
        if !self.filter.is_valid(raw) {
            return Admission::Rejected;
        }

        let url = match normalize_url(raw) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Rejected {}: {}", raw, e);
                return Admission::Rejected;
            }
        };

        {
            let mut state = self.state.lock();
            if state.closed {
                return Admission::Rejected;
            }
            if !state.seen.insert(url.to_string()) {
                return Admission::Duplicate;
            }
            state.pending.push_back(url);
        }

        self.notify.notify_one();
        Admission::Admitted
    }

    /// Hands the next pending URL to the caller
    ///
    /// Waits up to `timeout` for work to appear. On success the URL moves
    /// from pending to visited and stays in flight until the returned lease
    /// is dropped.
    pub async fn take(&self, timeout: Duration) -> Option<Lease<'_>> {
        let deadline = Instant::now() + timeout;

        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a notify between the check and
            // the await is not lost
            notified.as_mut().enable();

            match self.try_take() {
                TakeAttempt::Ready(url) => return Some(self.lease(url)),
                TakeAttempt::Exhausted | TakeAttempt::Closed => return None,
                TakeAttempt::Wait => {}
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return match self.try_take() {
                    TakeAttempt::Ready(url) => Some(self.lease(url)),
                    _ => None,
                };
            }
        }
    }

    fn try_take(&self) -> TakeAttempt {
        let mut state = self.state.lock();

        if state.closed {
            return TakeAttempt::Closed;
        }

        match state.pending.pop_front() {
            Some(url) => {
                state.visited.insert(url.to_string());
                state.in_flight += 1;
                TakeAttempt::Ready(url)
            }
            None if state.in_flight == 0 => TakeAttempt::Exhausted,
            None => TakeAttempt::Wait,
        }
    }

    fn lease(&self, url: Url) -> Lease<'_> {
        Lease {
            frontier: self,
            url,
        }
    }

    fn release(&self) {
        let exhausted = {
            let mut state = self.state.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
            state.is_exhausted()
        };

        if exhausted {
            self.notify.notify_waiters();
        }
    }

    /// Stops handing out work; pending and waiting `take` calls return `None`
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.notify.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn visited_count(&self) -> usize {
        self.state.lock().visited.len()
    }

    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    #[cfg(test)]
    pub fn in_flight(&self) -> usize {
        self.state.lock().in_flight
    }
}

/// A URL handed out by `Frontier::take`
///
/// Counts as in flight until dropped.
#[derive(Debug)]
pub struct Lease<'a> {
    frontier: &'a Frontier,
    url: Url,
}

impl Lease<'_> {
    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl Deref for Lease<'_> {
    type Target = Url;

    fn deref(&self) -> &Url {
        &self.url
    }
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        self.frontier.release();
    }
}
