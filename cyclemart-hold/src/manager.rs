use std::sync::Arc;

use chrono::{Duration, Utc};
use cyclemart_domain::repository::{CycleRepository, HoldRepository};
use cyclemart_domain::{Hold, HoldChange, HoldError, HoldWithCycle, Requester};
use cyclemart_store::ChangeNotifier;
use uuid::Uuid;

/// Serializes "what is reserved right now". Enforces the one-active-hold-per-
/// cycle invariant by delegating the final word to the store's exclusivity
/// guarantee; its own pre-check is a latency optimization only.
pub struct HoldManager {
    holds: Arc<dyn HoldRepository>,
    cycles: Arc<dyn CycleRepository>,
    notifier: ChangeNotifier,
    window: Duration,
}

impl HoldManager {
    pub fn new(
        holds: Arc<dyn HoldRepository>,
        cycles: Arc<dyn CycleRepository>,
        notifier: ChangeNotifier,
        hold_minutes: i64,
    ) -> Self {
        Self {
            holds,
            cycles,
            notifier,
            window: Duration::minutes(hold_minutes),
        }
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    /// Place a hold on a cycle. Exactly one of two racing calls for the same
    /// cycle succeeds; the loser gets `AlreadyHeld` from the store's
    /// uniqueness check, regardless of what the advisory pre-check saw.
    pub async fn create_hold(&self, cycle_id: Uuid, requester: Requester) -> Result<Hold, HoldError> {
        requester.validate()?;

        self.cycles
            .get_cycle(cycle_id)
            .await?
            .ok_or_else(|| HoldError::not_found(format!("cycle {cycle_id}")))?;

        let now = Utc::now();

        // Advisory fast path: fail before the insert when the cycle is
        // visibly taken. An active hold past its end time no longer blocks;
        // clear it here so the unique index accepts the new row even when
        // the sweep hasn't reached it yet.
        if let Some(existing) = self.holds.active_hold_for_cycle(cycle_id).await? {
            if existing.blocks(now) {
                return Err(HoldError::AlreadyHeld);
            }
            self.holds.deactivate_hold(existing.id).await?;
            self.notifier.publish(HoldChange::updated(existing.id));
        }

        let hold = Hold::new(cycle_id, requester, now, self.window);
        let created = self.holds.insert_hold(&hold).await?;

        tracing::info!(hold_id = %created.id, cycle_id = %cycle_id, "hold created");
        self.notifier.publish(HoldChange::inserted(created.id));
        Ok(created)
    }

    /// Release a hold. Idempotent: releasing an already-inactive or unknown
    /// hold succeeds, because the sweep and an explicit release may race on
    /// the same row.
    pub async fn release_hold(&self, hold_id: Uuid) -> Result<(), HoldError> {
        let flipped = self.holds.deactivate_hold(hold_id).await?;
        if flipped {
            tracing::info!(hold_id = %hold_id, "hold released");
            self.notifier.publish(HoldChange::updated(hold_id));
        }
        Ok(())
    }

    /// All active holds enriched with cycle display fields, newest first.
    pub async fn list_active_holds(&self) -> Result<Vec<HoldWithCycle>, HoldError> {
        self.holds.list_active_holds().await
    }

    pub async fn get_hold(&self, hold_id: Uuid) -> Result<Option<Hold>, HoldError> {
        self.holds.get_hold(hold_id).await
    }

    /// Deactivate every hold whose window has elapsed. Set-based and
    /// idempotent, safe to run concurrently with itself and with releases.
    pub async fn expire_stale_holds(&self) -> Result<u64, HoldError> {
        let swept = self.holds.deactivate_expired_holds(Utc::now()).await?;
        if swept > 0 {
            tracing::info!(count = swept, "expired stale holds");
            self.notifier.publish(HoldChange::swept());
        }
        Ok(swept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use cyclemart_domain::Cycle;
    use cyclemart_store::MemoryStore;

    fn cycle() -> Cycle {
        Cycle {
            id: Uuid::new_v4(),
            name: "Campus Cruiser".to_string(),
            brand: "Hero".to_string(),
            model: "Sprint".to_string(),
            price: 350_000,
            image_url: None,
            is_available: true,
            created_at: Utc::now(),
        }
    }

    fn requester(name: &str) -> Requester {
        Requester {
            full_name: name.to_string(),
            email: format!("{}@campus.edu", name.to_lowercase()),
            phone: "9000000001".to_string(),
            allotment_number: "AL-1".to_string(),
        }
    }

    async fn manager_with_cycle() -> (Arc<HoldManager>, Arc<MemoryStore>, Cycle) {
        let store = Arc::new(MemoryStore::new());
        let cycle = cycle();
        store.add_cycle(cycle.clone()).await;
        let manager = Arc::new(HoldManager::new(
            store.clone(),
            store.clone(),
            ChangeNotifier::default(),
            20,
        ));
        (manager, store, cycle)
    }

    #[tokio::test]
    async fn create_then_conflict_then_release_then_create() {
        let (manager, _store, cycle) = manager_with_cycle().await;

        let h1 = manager.create_hold(cycle.id, requester("A")).await.unwrap();
        assert!(h1.is_active);
        assert_eq!(h1.hold_end_time - h1.created_at, Duration::minutes(20));

        assert_eq!(
            manager.create_hold(cycle.id, requester("B")).await,
            Err(HoldError::AlreadyHeld)
        );

        manager.release_hold(h1.id).await.unwrap();

        let h2 = manager.create_hold(cycle.id, requester("B")).await.unwrap();
        assert_ne!(h2.id, h1.id);
    }

    #[tokio::test]
    async fn concurrent_creates_have_exactly_one_winner() {
        let (manager, _store, cycle) = manager_with_cycle().await;

        let mut handles = Vec::new();
        for i in 0..16 {
            let manager = manager.clone();
            let cycle_id = cycle.id;
            handles.push(tokio::spawn(async move {
                manager.create_hold(cycle_id, requester(&format!("U{i}"))).await
            }));
        }

        let mut won = 0;
        let mut held = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => won += 1,
                Err(HoldError::AlreadyHeld) => held += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(won, 1);
        assert_eq!(held, 15);

        let active = manager.list_active_holds().await.unwrap();
        assert_eq!(active.len(), 1);
    }

    #[tokio::test]
    async fn validation_failures_insert_nothing() {
        let (manager, _store, cycle) = manager_with_cycle().await;

        let mut bad = requester("A");
        bad.full_name = String::new();
        assert!(matches!(
            manager.create_hold(cycle.id, bad).await,
            Err(HoldError::Validation(_))
        ));
        assert!(manager.list_active_holds().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_cycle_is_not_found() {
        let (manager, _store, _cycle) = manager_with_cycle().await;
        assert!(matches!(
            manager.create_hold(Uuid::new_v4(), requester("A")).await,
            Err(HoldError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn double_release_and_unknown_release_are_no_op_success() {
        let (manager, _store, cycle) = manager_with_cycle().await;
        let hold = manager.create_hold(cycle.id, requester("A")).await.unwrap();

        manager.release_hold(hold.id).await.unwrap();
        manager.release_hold(hold.id).await.unwrap();
        manager.release_hold(Uuid::new_v4()).await.unwrap();
    }

    #[tokio::test]
    async fn sweep_clears_only_past_holds_and_frees_the_cycle() {
        let (manager, store, cycle) = manager_with_cycle().await;
        use cyclemart_domain::repository::HoldRepository;

        // Hold whose window elapsed a second ago, inserted directly so the
        // end time can sit in the past.
        let expired = Hold {
            hold_end_time: Utc::now() - Duration::seconds(1),
            ..Hold::new(cycle.id, requester("A"), Utc::now() - Duration::minutes(20), Duration::minutes(20))
        };
        store.insert_hold(&expired).await.unwrap();

        manager.expire_stale_holds().await.unwrap();
        assert!(manager.list_active_holds().await.unwrap().is_empty());

        // Availability recovers: a fresh hold on the same cycle succeeds.
        manager.create_hold(cycle.id, requester("B")).await.unwrap();
    }

    #[tokio::test]
    async fn create_steps_over_an_expired_unswept_hold() {
        let (manager, store, cycle) = manager_with_cycle().await;
        use cyclemart_domain::repository::HoldRepository;

        let stale = Hold {
            hold_end_time: Utc::now() - Duration::seconds(1),
            ..Hold::new(cycle.id, requester("A"), Utc::now() - Duration::minutes(20), Duration::minutes(20))
        };
        store.insert_hold(&stale).await.unwrap();

        // No sweep has run; the stale row is still flagged active but no
        // longer blocks.
        let fresh = manager.create_hold(cycle.id, requester("B")).await.unwrap();
        assert!(fresh.is_active);

        let stale_after = store.get_hold(stale.id).await.unwrap().unwrap();
        assert!(!stale_after.is_active);
    }

    #[tokio::test]
    async fn mutations_publish_change_events() {
        let (manager, _store, cycle) = manager_with_cycle().await;
        let mut rx = manager.notifier().subscribe();

        let hold = manager.create_hold(cycle.id, requester("A")).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), HoldChange::inserted(hold.id));

        manager.release_hold(hold.id).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), HoldChange::updated(hold.id));

        // Releasing again is a no-op and must not publish.
        manager.release_hold(hold.id).await.unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn end_time_arithmetic_is_exact() {
        let now: DateTime<Utc> = Utc::now();
        let hold = Hold::new(Uuid::new_v4(), requester("A"), now, Duration::minutes(20));
        assert_eq!(hold.hold_end_time, now + Duration::minutes(20));
    }
}
