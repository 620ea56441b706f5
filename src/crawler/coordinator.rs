//! Crawler coordinator - main crawl orchestration logic
//!
//! This module runs the worker pool that drives a crawl:
//! - Seeding the frontier and probing the renderer
//! - Spawning a fixed number of workers over the shared components
//! - Fetching, extracting and re-enqueueing links per page
//! - Enforcing the page budget and detecting termination
//! - Handing the collected records back to the caller

use crate::config::{Config, CrawlerConfig};
use crate::crawler::budget::CrawlBudget;
use crate::crawler::collector::{PageRecord, ResultCollector};
use crate::crawler::extractor::Extractor;
use crate::crawler::fetcher::{Fetcher, RetryPolicy};
use crate::crawler::frontier::Frontier;
use crate::crawler::renderer::Renderer;
use crate::output::{CrawlStatistics, StatsRecorder};
use crate::state::{PageState, WorkerState};
use crate::url::{classify_link, normalize_url, BaseOrigin, UrlFilter};
use crate::HarvestError;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use url::Url;

/// Pages between progress log lines
const PROGRESS_INTERVAL: u64 = 10;

/// Worker pool settings derived from the crawler configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlSettings {
    pub workers: usize,
    pub request_delay: Duration,
    pub idle_timeout: Duration,
}

impl From<&CrawlerConfig> for CrawlSettings {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            workers: config.workers.max(1),
            request_delay: config.request_delay(),
            idle_timeout: config.idle_timeout(),
        }
    }
}

/// Everything a finished crawl produced
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Page records in completion order
    pub records: Vec<PageRecord>,

    pub statistics: CrawlStatistics,
}

/// Components shared by every worker
struct Shared {
    frontier: Frontier,
    fetcher: Fetcher,
    extractor: Extractor,
    collector: ResultCollector,
    budget: CrawlBudget,
    stats: StatsRecorder,
    origin: BaseOrigin,
    filter: UrlFilter,
    settings: CrawlSettings,
    seed: Url,
}

/// Stops a running crawl
///
/// Pages already finished are kept; workers exit at their next iteration.
#[derive(Clone)]
pub struct CancelHandle {
    shared: Arc<Shared>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        if !self.shared.frontier.is_closed() {
            tracing::info!("Cancelling crawl");
            self.shared.frontier.close();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.frontier.is_closed()
    }
}

/// Main crawler structure
pub struct Crawler {
    shared: Arc<Shared>,
}

impl Crawler {
    /// Creates a crawler for one site
    ///
    /// # Arguments
    ///
    /// * `config` - The harvester configuration
    /// * `seed` - The URL the crawl starts from; fixes the base origin
    /// * `renderer` - Source of page renderer sessions
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to run
    /// * `Err(HarvestError)` - The seed is unusable or the configuration is
    ///   invalid
    pub fn new(
        config: &Config,
        seed: &str,
        renderer: Arc<dyn Renderer>,
    ) -> Result<Self, HarvestError> {
        let filter = UrlFilter::from_config(&config.filter);
        if !filter.is_valid(seed) {
            return Err(HarvestError::SeedRejected {
                url: seed.to_string(),
            });
        }

        let seed_url = normalize_url(seed)?;
        let origin = BaseOrigin::from_seed(&seed_url, config.crawler.scope_prefix.as_deref())?;
        if !origin.contains(&seed_url) {
            return Err(HarvestError::SeedRejected {
                url: seed_url.to_string(),
            });
        }

        let extractor = Extractor::from_config(&config.extract)?;
        let fetcher = Fetcher::new(renderer, RetryPolicy::from(&config.fetch));

        let shared = Shared {
            frontier: Frontier::new(filter.clone()),
            fetcher,
            extractor,
            collector: ResultCollector::new(),
            budget: CrawlBudget::new(config.crawler.max_pages),
            stats: StatsRecorder::new(),
            origin,
            filter,
            settings: CrawlSettings::from(&config.crawler),
            seed: seed_url,
        };

        Ok(Self {
            shared: Arc::new(shared),
        })
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            shared: self.shared.clone(),
        }
    }

    pub fn seed(&self) -> &Url {
        &self.shared.seed
    }

    pub fn origin(&self) -> &BaseOrigin {
        &self.shared.origin
    }

    pub fn settings(&self) -> &CrawlSettings {
        &self.shared.settings
    }

    /// Starts and releases one renderer session
    ///
    /// Lets callers confirm the renderer works before committing to side
    /// effects such as creating the output file. `run` performs the same
    /// check itself.
    pub async fn check_renderer(&self) -> Result<(), HarvestError> {
        self.shared.fetcher.check_available().await?;
        Ok(())
    }

    /// Runs the crawl to completion
    ///
    /// Fails only if the renderer cannot start; per-page failures are
    /// logged, counted, and otherwise ignored.
    pub async fn run(self) -> Result<CrawlReport, HarvestError> {
        self.check_renderer().await?;
        let shared = self.shared;

        tracing::info!(
            "Starting crawl of {} with {} workers (budget: {})",
            shared.origin,
            shared.settings.workers,
            shared
                .budget
                .limit()
                .map_or_else(|| "unbounded".to_string(), |limit| limit.to_string())
        );

        shared.frontier.offer(shared.seed.as_str());

        let mut workers = JoinSet::new();
        for id in 0..shared.settings.workers {
            let worker = Worker::new(id, shared.clone());
            workers.spawn(worker.run());
        }

        while let Some(result) = workers.join_next().await {
            if let Err(e) = result {
                tracing::error!("Worker task failed: {}", e);
            }
        }

        let unfetched = shared.frontier.pending_count();
        if unfetched > 0 {
            tracing::info!("{} queued pages left unfetched", unfetched);
            shared.stats.record_skipped(unfetched);
        }

        let statistics = shared.stats.finish();
        let records = shared.collector.drain();

        tracing::info!(
            "Crawl completed: {} records from {} pages in {:?}",
            records.len(),
            shared.frontier.visited_count(),
            statistics.elapsed
        );

        Ok(CrawlReport {
            records,
            statistics,
        })
    }
}

/// One member of the worker pool
struct Worker {
    id: usize,
    shared: Arc<Shared>,
    state: WorkerState,
}

impl Worker {
    fn new(id: usize, shared: Arc<Shared>) -> Self {
        Self {
            id,
            shared,
            state: WorkerState::Idle,
        }
    }

    fn transition(&mut self, next: WorkerState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid worker transition {} -> {}",
            self.state,
            next
        );
        tracing::trace!(worker = self.id, "{} -> {}", self.state, next);
        self.state = next;
    }

    async fn run(mut self) {
        let shared = self.shared.clone();
        let settings = shared.settings;

        loop {
            // Reserve before dequeuing so no URL is taken without a slot to
            // fetch it with
            let Some(slot) = shared.budget.claim().await else {
                tracing::debug!(worker = self.id, "Page budget spent");
                break;
            };
            let Some(lease) = shared.frontier.take(settings.idle_timeout).await else {
                break;
            };

            self.transition(WorkerState::Fetching);
            tracing::debug!(worker = self.id, "Fetching {}", lease.as_str());

            let page = match shared.fetcher.fetch(&lease).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!("{}", e);
                    shared.stats.record_page(e.page_state());
                    drop(slot);
                    drop(lease);
                    self.transition(WorkerState::Idle);
                    self.pause().await;
                    continue;
                }
            };

            self.transition(WorkerState::Extracting);
            let extracted = shared.extractor.extract(&page.html, &page.final_url);

            // Links are offered while the lease is still held so the page
            // counts as in flight until its discoveries are queued
            self.transition(WorkerState::Enqueueing);
            let enqueued = self.enqueue_links(&extracted.links);
            shared.stats.record_links(extracted.links.len(), enqueued);

            let state = if extracted.text.is_empty() {
                tracing::debug!("No text extracted from {}", lease.as_str());
                PageState::Empty
            } else {
                PageState::Processed
            };
            shared
                .collector
                .add(PageRecord::new(lease.as_str(), extracted.text));
            slot.commit();

            let pages_done = shared.stats.record_page(state);
            if pages_done % PROGRESS_INTERVAL == 0 {
                let snapshot = shared.stats.snapshot();
                tracing::info!(
                    "Progress: {} pages crawled, {} in frontier, {:.2} pages/sec",
                    pages_done,
                    shared.frontier.pending_count(),
                    snapshot.pages_per_second()
                );
            }

            if shared.budget.is_spent() && !shared.frontier.is_closed() {
                tracing::info!("Page budget of {} reached", shared.budget.committed());
                shared.frontier.close();
            }

            drop(lease);
            self.transition(WorkerState::Idle);
            self.pause().await;
        }

        self.transition(WorkerState::Stopped);
        tracing::debug!(worker = self.id, "Worker stopped");
    }

    /// Offers in-scope, valid links to the frontier and returns how many
    /// were newly queued
    fn enqueue_links(&self, links: &[String]) -> usize {
        let shared = &self.shared;

        links
            .iter()
            .filter(|link| {
                let verdict = classify_link(link, &shared.filter, &shared.origin);
                if !verdict.should_follow() {
                    tracing::trace!("Not following {} ({:?})", link, verdict);
                }
                verdict.should_follow()
            })
            .filter(|link| shared.frontier.offer(link).is_admitted())
            .count()
    }

    /// Politeness delay between pages
    async fn pause(&self) {
        if !self.shared.settings.request_delay.is_zero() && !self.shared.frontier.is_closed() {
            tokio::time::sleep(self.shared.settings.request_delay).await;
        }
    }
}
