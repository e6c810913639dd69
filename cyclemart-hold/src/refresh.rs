use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cyclemart_domain::{HoldError, HoldWithCycle};
use cyclemart_store::ChangeNotifier;
use tokio::sync::{broadcast, watch};
use tokio::time::MissedTickBehavior;

use crate::manager::HoldManager;

/// Runs one refresh cycle (sweep expired holds, then re-fetch the active
/// list) and publishes the snapshot on a watch channel. An atomic in-flight
/// flag makes overlapping triggers coalesce: a refresh requested while one is
/// running is skipped, never queued.
pub struct Refresher {
    manager: Arc<HoldManager>,
    busy: AtomicBool,
    snapshot_tx: watch::Sender<Vec<HoldWithCycle>>,
}

impl Refresher {
    pub fn new(manager: Arc<HoldManager>) -> (Arc<Self>, watch::Receiver<Vec<HoldWithCycle>>) {
        let (snapshot_tx, snapshot_rx) = watch::channel(Vec::new());
        let refresher = Arc::new(Self {
            manager,
            busy: AtomicBool::new(false),
            snapshot_tx,
        });
        (refresher, snapshot_rx)
    }

    /// Returns `Ok(false)` when another refresh was already in flight.
    pub async fn refresh(&self) -> Result<bool, HoldError> {
        if self.busy.swap(true, Ordering::AcqRel) {
            tracing::trace!("refresh already in progress, skipping");
            return Ok(false);
        }
        let result = self.run_cycle().await;
        self.busy.store(false, Ordering::Release);
        result.map(|_| true)
    }

    async fn run_cycle(&self) -> Result<(), HoldError> {
        self.manager.expire_stale_holds().await?;
        let holds = self.manager.list_active_holds().await?;
        let _ = self.snapshot_tx.send(holds);
        Ok(())
    }
}

/// Drives a [`Refresher`] from two independent, idempotent triggers: a
/// recurring interval (bounding worst-case staleness even when the push
/// channel is degraded) and the change-notifier subscription. Stops when the
/// shutdown signal fires; in-flight store calls are left to complete.
pub struct RefreshLoop {
    refresher: Arc<Refresher>,
    notifier: ChangeNotifier,
    interval: Duration,
}

impl RefreshLoop {
    pub fn new(refresher: Arc<Refresher>, notifier: ChangeNotifier, interval: Duration) -> Self {
        Self {
            refresher,
            notifier,
            interval,
        }
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut changes = self.notifier.subscribe();
        let mut changes_closed = false;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                result = changes.recv(), if !changes_closed => {
                    match result {
                        Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                        Err(broadcast::error::RecvError::Closed) => {
                            // Push channel gone; the timer alone still bounds
                            // staleness.
                            changes_closed = true;
                            continue;
                        }
                    }
                }
                _ = shutdown.changed() => {
                    tracing::debug!("refresh loop stopping");
                    return;
                }
            }

            if let Err(err) = self.refresher.refresh().await {
                tracing::warn!(error = %err, "refresh cycle failed");
            }
        }
    }
}
