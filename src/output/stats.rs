//! Crawl statistics
//!
//! This module records per-page outcomes while a crawl runs and prints the
//! summary at the end of it.

use crate::state::PageState;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Count of admitted pages by final state
    pub pages_by_state: BTreeMap<PageState, u64>,

    /// Links found on fetched pages, before filtering
    pub links_discovered: u64,

    /// Links newly admitted to the frontier
    pub links_enqueued: u64,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl Default for CrawlStatistics {
    fn default() -> Self {
        Self {
            pages_by_state: BTreeMap::new(),
            links_discovered: 0,
            links_enqueued: 0,
            started_at: Utc::now(),
            finished_at: None,
            elapsed: Duration::ZERO,
        }
    }
}

impl CrawlStatistics {
    /// Total number of pages with a final state, skipped ones included
    pub fn total_pages(&self) -> u64 {
        self.pages_by_state.values().sum()
    }

    pub fn count(&self, state: PageState) -> u64 {
        self.pages_by_state.get(&state).copied().unwrap_or(0)
    }

    /// Pages that produced a record
    pub fn records(&self) -> u64 {
        self.pages_by_state
            .iter()
            .filter(|(state, _)| state.is_success())
            .map(|(_, count)| count)
            .sum()
    }

    /// Pages whose fetch failed
    pub fn errors(&self) -> u64 {
        self.pages_by_state
            .iter()
            .filter(|(state, _)| state.is_error())
            .map(|(_, count)| count)
            .sum()
    }

    pub fn pages_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total_pages() as f64 / secs
        } else {
            0.0
        }
    }
}

/// Thread-safe statistics accumulator used while a crawl runs
#[derive(Debug)]
pub struct StatsRecorder {
    stats: Mutex<CrawlStatistics>,
    started: Instant,
}

impl Default for StatsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsRecorder {
    pub fn new() -> Self {
        Self {
            stats: Mutex::new(CrawlStatistics::default()),
            started: Instant::now(),
        }
    }

    /// Records a page's final state and returns the number of pages
    /// recorded so far
    pub fn record_page(&self, state: PageState) -> u64 {
        let mut stats = self.stats.lock();
        *stats.pages_by_state.entry(state).or_insert(0) += 1;
        stats.total_pages()
    }

    /// Counts queued URLs that were never handed to a worker
    pub fn record_skipped(&self, count: usize) {
        let mut stats = self.stats.lock();
        *stats.pages_by_state.entry(PageState::Skipped).or_insert(0) += count as u64;
    }

    pub fn record_links(&self, discovered: usize, enqueued: usize) {
        let mut stats = self.stats.lock();
        stats.links_discovered += discovered as u64;
        stats.links_enqueued += enqueued as u64;
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Current counts, without closing the run
    pub fn snapshot(&self) -> CrawlStatistics {
        let mut stats = self.stats.lock().clone();
        stats.elapsed = self.elapsed();
        stats
    }

    /// Stamps the finish time and returns the final statistics
    pub fn finish(&self) -> CrawlStatistics {
        let mut stats = self.stats.lock();
        stats.finished_at = Some(Utc::now());
        stats.elapsed = self.elapsed();
        stats.clone()
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    let total = stats.total_pages();

    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Started: {}", stats.started_at.format("%Y-%m-%d %H:%M:%S UTC"));
    if let Some(finished) = stats.finished_at {
        println!("  Finished: {}", finished.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    println!("  Duration: {:.1}s", stats.elapsed.as_secs_f64());
    println!("  Pages dequeued: {}", total);
    println!("  Links discovered: {}", stats.links_discovered);
    println!("  Links enqueued: {}", stats.links_enqueued);
    println!();

    println!("Pages by State:");
    // Sort states by count (descending)
    let mut state_counts: Vec<_> = stats.pages_by_state.iter().collect();
    state_counts.sort_by(|a, b| b.1.cmp(a.1));

    for (state, count) in state_counts {
        let percentage = if total > 0 {
            (*count as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", state, count, percentage);
    }
    println!();

    let records = stats.records();
    let success_rate = if total > 0 {
        (records as f64 / total as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} pages harvested)",
        success_rate, records, total
    );
    println!("  Fetch errors: {}", stats.errors());
    println!("  Throughput: {:.2} pages/sec", stats.pages_per_second());
}
