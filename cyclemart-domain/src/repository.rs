use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::cycle::Cycle;
use crate::error::HoldError;
use crate::hold::{Hold, HoldWithCycle};
use crate::settlement::{PaymentRequest, PaymentStatus, Purchase};

/// Ledger access for holds. Implementations must provide the exclusivity
/// guarantee on insert: at most one row per cycle with `is_active = true` can
/// exist, enforced atomically by the store (a partial unique index or an
/// equivalent check-and-insert under one lock). An application-level read
/// followed by a separate write is not sufficient.
#[async_trait]
pub trait HoldRepository: Send + Sync {
    /// Insert a new hold. Returns `AlreadyHeld` when the cycle already has an
    /// active row, whichever session committed it first.
    async fn insert_hold(&self, hold: &Hold) -> Result<Hold, HoldError>;

    async fn get_hold(&self, id: Uuid) -> Result<Option<Hold>, HoldError>;

    /// The active hold for a cycle, if any. Advisory: callers use this as a
    /// fast-path check, never as the correctness mechanism.
    async fn active_hold_for_cycle(&self, cycle_id: Uuid) -> Result<Option<Hold>, HoldError>;

    /// Flip `is_active` off. Idempotent: returns `true` when a row actually
    /// flipped, `Ok(false)` for already-inactive or unknown ids.
    async fn deactivate_hold(&self, id: Uuid) -> Result<bool, HoldError>;

    /// Set-based sweep: deactivate every active hold whose end time has
    /// passed. Safe to run concurrently with itself and with releases.
    async fn deactivate_expired_holds(&self, now: DateTime<Utc>) -> Result<u64, HoldError>;

    /// All active holds joined with cycle display fields, newest first.
    async fn list_active_holds(&self) -> Result<Vec<HoldWithCycle>, HoldError>;
}

#[async_trait]
pub trait CycleRepository: Send + Sync {
    async fn get_cycle(&self, id: Uuid) -> Result<Option<Cycle>, HoldError>;

    async fn list_cycles(&self) -> Result<Vec<Cycle>, HoldError>;
}

/// Storage for payment requests and finalized purchases.
#[async_trait]
pub trait SettlementRepository: Send + Sync {
    async fn insert_request(&self, request: &PaymentRequest) -> Result<(), HoldError>;

    async fn get_request(&self, id: Uuid) -> Result<Option<PaymentRequest>, HoldError>;

    async fn list_requests(
        &self,
        status: Option<PaymentStatus>,
    ) -> Result<Vec<PaymentRequest>, HoldError>;

    async fn update_request_status(
        &self,
        id: Uuid,
        status: PaymentStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), HoldError>;

    async fn insert_purchase(&self, purchase: &Purchase) -> Result<(), HoldError>;
}
