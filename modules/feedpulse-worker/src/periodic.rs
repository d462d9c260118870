//! Generic periodic worker: a job enumerates its work items, the worker runs
//! them in sequence with inter-item spacing and per-item failure isolation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

/// The two-method skeleton every periodic loop implements: a way to
/// enumerate work items and a per-item action.
#[async_trait]
pub trait CycleJob: Send + Sync {
    type Item: std::fmt::Display + Send + Sync;

    fn name(&self) -> &str;

    /// Enumerate this cycle's work items. Called fresh every cycle because
    /// configuration may change between cycles.
    async fn list_items(&self) -> anyhow::Result<Vec<Self::Item>>;

    /// Run one item. An error here is scoped to the item, never the cycle.
    async fn run_item(&self, item: &Self::Item) -> anyhow::Result<()>;
}

/// Drives a `CycleJob` forever until the shared cancellation flag is set.
///
/// Holds no persistent state: after a process restart the next cycle simply
/// starts from a fresh enumeration, and a missed cycle is skipped.
pub struct PeriodicWorker {
    cycle_delay: Duration,
    item_delay: Duration,
    cancelled: Arc<AtomicBool>,
}

impl PeriodicWorker {
    pub fn new(cycle_delay: Duration, item_delay: Duration, cancelled: Arc<AtomicBool>) -> Self {
        Self {
            cycle_delay,
            item_delay,
            cancelled,
        }
    }

    /// Run cycles until cancelled. The flag is checked at the top of every
    /// cycle and before each item; an in-flight item call always runs to
    /// completion.
    pub async fn run<J: CycleJob>(&self, job: &J) {
        info!(worker = job.name(), "Periodic worker started");
        'cycle: loop {
            if self.cancelled.load(Ordering::Relaxed) {
                break;
            }

            let items = match job.list_items().await {
                Ok(items) => items,
                Err(e) => {
                    warn!(worker = job.name(), error = %e, "Failed to enumerate work items");
                    tokio::time::sleep(self.cycle_delay).await;
                    continue;
                }
            };

            if items.is_empty() {
                info!(worker = job.name(), "No work items this cycle");
                tokio::time::sleep(self.cycle_delay).await;
                continue;
            }

            info!(worker = job.name(), count = items.len(), "Cycle starting");
            for (i, item) in items.iter().enumerate() {
                if self.cancelled.load(Ordering::Relaxed) {
                    break 'cycle;
                }
                if i > 0 && !self.item_delay.is_zero() {
                    tokio::time::sleep(self.item_delay).await;
                }
                if let Err(e) = job.run_item(item).await {
                    warn!(worker = job.name(), item = %item, error = %e, "Item failed, continuing");
                }
            }

            tokio::time::sleep(self.cycle_delay).await;
        }
        info!(worker = job.name(), "Periodic worker stopped");
    }
}
