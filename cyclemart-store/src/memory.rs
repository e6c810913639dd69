use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cyclemart_domain::repository::{CycleRepository, HoldRepository, SettlementRepository};
use cyclemart_domain::{
    Cycle, Hold, HoldError, HoldWithCycle, PaymentRequest, PaymentStatus, Purchase,
};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    cycles: HashMap<Uuid, Cycle>,
    holds: HashMap<Uuid, Hold>,
    requests: HashMap<Uuid, PaymentRequest>,
    purchases: Vec<Purchase>,
}

/// In-memory store used by tests and local development. Implements the same
/// repository traits as the Postgres store; the exclusivity guarantee comes
/// from doing the active-hold check and the insert under one lock, mirroring
/// the partial unique index on `cycle_holds (cycle_id) WHERE is_active`.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_cycle(&self, cycle: Cycle) {
        self.inner.lock().await.cycles.insert(cycle.id, cycle);
    }

    pub async fn purchases(&self) -> Vec<Purchase> {
        self.inner.lock().await.purchases.clone()
    }
}

#[async_trait]
impl HoldRepository for MemoryStore {
    async fn insert_hold(&self, hold: &Hold) -> Result<Hold, HoldError> {
        let mut tables = self.inner.lock().await;

        if !tables.cycles.contains_key(&hold.cycle_id) {
            return Err(HoldError::not_found(format!("cycle {}", hold.cycle_id)));
        }
        // Same condition the partial unique index enforces: any active row
        // conflicts, even one past its end time that the sweep hasn't reached.
        let conflict = tables
            .holds
            .values()
            .any(|h| h.cycle_id == hold.cycle_id && h.is_active);
        if conflict {
            return Err(HoldError::AlreadyHeld);
        }

        tables.holds.insert(hold.id, hold.clone());
        Ok(hold.clone())
    }

    async fn get_hold(&self, id: Uuid) -> Result<Option<Hold>, HoldError> {
        Ok(self.inner.lock().await.holds.get(&id).cloned())
    }

    async fn active_hold_for_cycle(&self, cycle_id: Uuid) -> Result<Option<Hold>, HoldError> {
        let tables = self.inner.lock().await;
        Ok(tables
            .holds
            .values()
            .find(|h| h.cycle_id == cycle_id && h.is_active)
            .cloned())
    }

    async fn deactivate_hold(&self, id: Uuid) -> Result<bool, HoldError> {
        let mut tables = self.inner.lock().await;
        match tables.holds.get_mut(&id) {
            Some(hold) if hold.is_active => {
                hold.is_active = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn deactivate_expired_holds(&self, now: DateTime<Utc>) -> Result<u64, HoldError> {
        let mut tables = self.inner.lock().await;
        let mut swept = 0;
        for hold in tables.holds.values_mut() {
            if hold.is_active && hold.hold_end_time <= now {
                hold.is_active = false;
                swept += 1;
            }
        }
        Ok(swept)
    }

    async fn list_active_holds(&self) -> Result<Vec<HoldWithCycle>, HoldError> {
        let tables = self.inner.lock().await;
        let mut active: Vec<HoldWithCycle> = tables
            .holds
            .values()
            .filter(|h| h.is_active)
            .filter_map(|h| {
                tables.cycles.get(&h.cycle_id).map(|c| HoldWithCycle {
                    hold: h.clone(),
                    cycle: c.summary(),
                })
            })
            .collect();
        active.sort_by(|a, b| {
            b.hold
                .created_at
                .cmp(&a.hold.created_at)
                .then(b.hold.id.cmp(&a.hold.id))
        });
        Ok(active)
    }
}

#[async_trait]
impl CycleRepository for MemoryStore {
    async fn get_cycle(&self, id: Uuid) -> Result<Option<Cycle>, HoldError> {
        Ok(self.inner.lock().await.cycles.get(&id).cloned())
    }

    async fn list_cycles(&self) -> Result<Vec<Cycle>, HoldError> {
        let tables = self.inner.lock().await;
        let mut cycles: Vec<Cycle> = tables.cycles.values().cloned().collect();
        cycles.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(cycles)
    }
}

#[async_trait]
impl SettlementRepository for MemoryStore {
    async fn insert_request(&self, request: &PaymentRequest) -> Result<(), HoldError> {
        let mut tables = self.inner.lock().await;
        tables.requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn get_request(&self, id: Uuid) -> Result<Option<PaymentRequest>, HoldError> {
        Ok(self.inner.lock().await.requests.get(&id).cloned())
    }

    async fn list_requests(
        &self,
        status: Option<PaymentStatus>,
    ) -> Result<Vec<PaymentRequest>, HoldError> {
        let tables = self.inner.lock().await;
        let mut requests: Vec<PaymentRequest> = tables
            .requests
            .values()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(requests)
    }

    async fn update_request_status(
        &self,
        id: Uuid,
        status: PaymentStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), HoldError> {
        let mut tables = self.inner.lock().await;
        let request = tables
            .requests
            .get_mut(&id)
            .ok_or_else(|| HoldError::not_found(format!("payment request {id}")))?;
        request.status = status;
        request.updated_at = updated_at;
        Ok(())
    }

    async fn insert_purchase(&self, purchase: &Purchase) -> Result<(), HoldError> {
        self.inner.lock().await.purchases.push(purchase.clone());
        Ok(())
    }
}
