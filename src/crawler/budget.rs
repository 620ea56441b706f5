//! Global page budget
//!
//! Workers claim a slot before taking a URL. A slot is committed when its
//! page produces a record and handed back otherwise, so failed pages never
//! eat into the budget and the number of records can never exceed the limit.
//!
//! While every remaining slot is held by a page still in flight, `claim`
//! waits: the holder either commits (the budget may now be spent) or hands
//! its slot back for the waiter to use.

use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

#[derive(Debug)]
pub struct CrawlBudget {
    limit: Option<usize>,
    claimed: AtomicUsize,
    committed: AtomicUsize,
    /// Signalled whenever a slot is committed or handed back
    changed: Notify,
}

impl CrawlBudget {
    /// Creates a budget; `None` means unbounded
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            limit,
            claimed: AtomicUsize::new(0),
            committed: AtomicUsize::new(0),
            changed: Notify::new(),
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Reserves one record slot, or returns `None` if the budget is spent
    pub fn try_claim(&self) -> Option<BudgetSlot<'_>> {
        match self.limit {
            None => {
                self.claimed.fetch_add(1, Ordering::SeqCst);
            }
            Some(limit) => {
                self.claimed
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |claimed| {
                        (claimed < limit).then_some(claimed + 1)
                    })
                    .ok()?;
            }
        }

        Some(BudgetSlot {
            budget: self,
            committed: false,
        })
    }

    /// Reserves one record slot, waiting while in-flight pages hold the rest
    ///
    /// Returns `None` only once the budget is spent. Every held slot belongs
    /// to a bounded fetch, so the wait always ends.
    pub async fn claim(&self) -> Option<BudgetSlot<'_>> {
        loop {
            let changed = self.changed.notified();
            tokio::pin!(changed);
            changed.as_mut().enable();

            if let Some(slot) = self.try_claim() {
                return Some(slot);
            }
            if self.is_spent() {
                return None;
            }

            changed.await;
        }
    }

    /// Slots currently claimed, committed or not
    #[cfg(test)]
    pub fn claimed(&self) -> usize {
        self.claimed.load(Ordering::SeqCst)
    }

    /// Slots turned into records
    pub fn committed(&self) -> usize {
        self.committed.load(Ordering::SeqCst)
    }

    /// True once every slot has become a record; no claim can succeed
    /// again for the rest of the run
    pub fn is_spent(&self) -> bool {
        self.limit.map_or(false, |limit| self.committed() >= limit)
    }
}

/// A reserved budget slot; released on drop unless committed
#[derive(Debug)]
pub struct BudgetSlot<'a> {
    budget: &'a CrawlBudget,
    committed: bool,
}

impl BudgetSlot<'_> {
    /// Keeps the slot for good
    pub fn commit(mut self) {
        self.committed = true;
        self.budget.committed.fetch_add(1, Ordering::SeqCst);
        self.budget.changed.notify_waiters();
    }
}

impl Drop for BudgetSlot<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.budget.claimed.fetch_sub(1, Ordering::SeqCst);
            self.budget.changed.notify_waiters();
        }
    }
}
