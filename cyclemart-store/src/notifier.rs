use cyclemart_domain::HoldChange;
use tokio::sync::broadcast;

/// In-process publish/subscribe channel keyed to the hold ledger. Every
/// mutation publishes a [`HoldChange`] to all subscribers; delivery is
/// at-least-once within the process and slow subscribers may observe lag, so
/// consumers re-fetch the authoritative list rather than trusting payloads.
#[derive(Clone)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<HoldChange>,
}

impl ChangeNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish a change. Dropped silently when nobody is subscribed.
    pub fn publish(&self, change: HoldChange) {
        let _ = self.tx.send(change);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HoldChange> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}
