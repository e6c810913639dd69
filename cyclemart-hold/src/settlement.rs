use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use cyclemart_domain::repository::SettlementRepository;
use cyclemart_domain::{
    HoldError, PaymentMethod, PaymentRequest, PaymentStatus, Purchase,
};
use uuid::Uuid;

use crate::manager::HoldManager;

const RELEASE_ATTEMPTS: u32 = 3;

/// Ties the out-of-band payment flow to hold release. Payments settle via
/// UPI deep link/QR or cash and are approved manually by an admin; approval
/// finalizes the purchase record and releases the hold, rejection just
/// releases the hold.
pub struct SettlementService {
    store: Arc<dyn SettlementRepository>,
    manager: Arc<HoldManager>,
}

impl SettlementService {
    pub fn new(store: Arc<dyn SettlementRepository>, manager: Arc<HoldManager>) -> Self {
        Self { store, manager }
    }

    /// Open a pending payment request against a blocking hold.
    pub async fn create_request(
        &self,
        hold_id: Uuid,
        method: PaymentMethod,
        amount: i64,
        payment_ref: Option<String>,
    ) -> Result<PaymentRequest, HoldError> {
        let hold = self
            .manager
            .get_hold(hold_id)
            .await?
            .ok_or_else(|| HoldError::not_found(format!("hold {hold_id}")))?;

        if !hold.blocks(Utc::now()) {
            return Err(HoldError::validation("hold is no longer active"));
        }

        let now = Utc::now();
        let request = PaymentRequest {
            id: Uuid::new_v4(),
            cycle_id: hold.cycle_id,
            hold_id,
            amount,
            method,
            order_id: bill_number(),
            payment_ref,
            status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_request(&request).await?;

        tracing::info!(request_id = %request.id, hold_id = %hold_id, method = method.as_str(), "payment request opened");
        Ok(request)
    }

    pub async fn list_requests(
        &self,
        status: Option<PaymentStatus>,
    ) -> Result<Vec<PaymentRequest>, HoldError> {
        self.store.list_requests(status).await
    }

    /// Admin approval: record the purchase, mark the request approved, then
    /// release the hold. The request stays pending until the purchase row is
    /// in, so a failed approval can simply be retried. The release is
    /// retried too; if every attempt fails the purchase still stands and the
    /// expiry sweep reclaims the cycle, so a paid-for cycle is never
    /// permanently blocked.
    pub async fn approve(&self, request_id: Uuid) -> Result<Purchase, HoldError> {
        let request = self
            .store
            .get_request(request_id)
            .await?
            .ok_or_else(|| HoldError::not_found(format!("payment request {request_id}")))?;

        if request.status != PaymentStatus::Pending {
            return Err(HoldError::validation("payment request is already settled"));
        }

        let hold = self
            .manager
            .get_hold(request.hold_id)
            .await?
            .ok_or_else(|| HoldError::not_found(format!("hold {}", request.hold_id)))?;

        let purchase = Purchase {
            id: Uuid::new_v4(),
            cycle_id: request.cycle_id,
            buyer_name: hold.requester.full_name.clone(),
            buyer_email: hold.requester.email.clone(),
            bill_number: request.order_id.clone(),
            amount: request.amount,
            created_at: Utc::now(),
        };
        self.store.insert_purchase(&purchase).await?;
        self.store
            .update_request_status(request_id, PaymentStatus::Approved, Utc::now())
            .await?;

        self.release_with_retry(request.hold_id).await;

        tracing::info!(request_id = %request_id, bill_number = %purchase.bill_number, "payment approved");
        Ok(purchase)
    }

    /// Admin rejection: the engagement is abandoned, so the hold is released
    /// and the cycle returns to the pool.
    pub async fn reject(&self, request_id: Uuid) -> Result<PaymentRequest, HoldError> {
        let request = self.settle(request_id, PaymentStatus::Rejected).await?;
        self.release_with_retry(request.hold_id).await;

        tracing::info!(request_id = %request_id, "payment rejected");
        self.store
            .get_request(request_id)
            .await?
            .ok_or_else(|| HoldError::not_found(format!("payment request {request_id}")))
    }

    async fn settle(
        &self,
        request_id: Uuid,
        status: PaymentStatus,
    ) -> Result<PaymentRequest, HoldError> {
        let request = self
            .store
            .get_request(request_id)
            .await?
            .ok_or_else(|| HoldError::not_found(format!("payment request {request_id}")))?;

        if request.status != PaymentStatus::Pending {
            return Err(HoldError::validation("payment request is already settled"));
        }

        self.store
            .update_request_status(request_id, status, Utc::now())
            .await?;
        Ok(request)
    }

    async fn release_with_retry(&self, hold_id: Uuid) {
        for attempt in 1..=RELEASE_ATTEMPTS {
            match self.manager.release_hold(hold_id).await {
                Ok(()) => return,
                Err(err) => {
                    tracing::warn!(hold_id = %hold_id, attempt, error = %err, "hold release failed");
                    tokio::time::sleep(Duration::from_millis(50 * u64::from(attempt))).await;
                }
            }
        }
        // The sweep is the backstop: the hold lapses at its end time anyway.
        tracing::error!(hold_id = %hold_id, "hold release exhausted retries; expiry sweep will reclaim it");
    }
}

/// Human-facing bill number, also used as the payment request's order id.
fn bill_number() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("CM-{}", id[..10].to_uppercase())
}
