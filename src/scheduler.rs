//! Refresh scheduler
//!
//! Drives the fetch-commit-persist cycle on a fixed interval. The only
//! writer to the tracker store; a failed cycle is logged and skipped,
//! never fatal.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::feed::MarketFeed;
use crate::sink::PersistenceSink;
use crate::tracker::TrackerStore;

/// What one refresh cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Instruments present in the fetched snapshot
    pub updated: usize,
    /// Instruments that gained a history entry
    pub committed: usize,
    /// True when the fetch failed and state was left untouched
    pub skipped: bool,
}

/// Periodic refresh task with an explicit stop signal
pub struct RefreshScheduler {
    feed: Arc<dyn MarketFeed>,
    store: Arc<TrackerStore>,
    sink: Arc<dyn PersistenceSink>,
    interval: Duration,
}

impl RefreshScheduler {
    pub fn new(
        feed: Arc<dyn MarketFeed>,
        store: Arc<TrackerStore>,
        sink: Arc<dyn PersistenceSink>,
        interval: Duration,
    ) -> Self {
        Self {
            feed,
            store,
            sink,
            interval,
        }
    }

    /// Run one fetch-commit-persist pass
    pub async fn run_cycle(&self) -> CycleOutcome {
        let snapshot = match self.feed.fetch().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(error = %e, "Snapshot fetch failed, keeping previous state");
                return CycleOutcome {
                    updated: 0,
                    committed: 0,
                    skipped: true,
                };
            }
        };

        let observed_at = Utc::now();
        let updated = snapshot.products.len();
        let committed = self.store.replace_snapshot(&snapshot, observed_at).await;

        // Durable writes happen after the store lock is released so a
        // slow sink cannot stall concurrent readers
        for observation in &committed {
            if let Err(e) = self
                .sink
                .record(
                    &observation.instrument_id,
                    observation.buy_price,
                    observation.sell_price,
                    observation.observed_at,
                )
                .await
            {
                warn!(
                    instrument_id = %observation.instrument_id,
                    error = %e,
                    "Persistence sink rejected observation"
                );
            }
        }

        info!(updated, committed = committed.len(), "Snapshot committed");
        CycleOutcome {
            updated,
            committed: committed.len(),
            skipped: false,
        }
    }

    /// Run until the shutdown signal flips to true.
    ///
    /// The first cycle fires immediately; failed cycles never terminate
    /// the loop.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_secs = self.interval.as_secs(),
            "Starting refresh loop"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Refresh loop stopping");
                        break;
                    }
                }
            }
        }
    }
}
