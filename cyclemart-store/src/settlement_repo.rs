use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cyclemart_domain::repository::SettlementRepository;
use cyclemart_domain::{HoldError, PaymentMethod, PaymentRequest, PaymentStatus, Purchase};
use sqlx::PgPool;
use uuid::Uuid;

use crate::store_err;

pub struct PgSettlementRepository {
    pub pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct RequestRow {
    id: Uuid,
    cycle_id: Uuid,
    hold_id: Uuid,
    amount: i64,
    method: String,
    order_id: String,
    payment_ref: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RequestRow> for PaymentRequest {
    fn from(row: RequestRow) -> Self {
        PaymentRequest {
            id: row.id,
            cycle_id: row.cycle_id,
            hold_id: row.hold_id,
            amount: row.amount,
            method: row.method.parse().unwrap_or(PaymentMethod::Cash),
            order_id: row.order_id,
            payment_ref: row.payment_ref,
            status: row.status.parse().unwrap_or(PaymentStatus::Pending),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl SettlementRepository for PgSettlementRepository {
    async fn insert_request(&self, request: &PaymentRequest) -> Result<(), HoldError> {
        sqlx::query(
            r#"
            INSERT INTO payment_requests
                (id, cycle_id, hold_id, amount, method, order_id, payment_ref,
                 status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(request.id)
        .bind(request.cycle_id)
        .bind(request.hold_id)
        .bind(request.amount)
        .bind(request.method.as_str())
        .bind(&request.order_id)
        .bind(&request.payment_ref)
        .bind(request.status.as_str())
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(())
    }

    async fn get_request(&self, id: Uuid) -> Result<Option<PaymentRequest>, HoldError> {
        let row = sqlx::query_as::<_, RequestRow>(
            r#"
            SELECT id, cycle_id, hold_id, amount, method, order_id, payment_ref,
                   status, created_at, updated_at
            FROM payment_requests
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(row.map(Into::into))
    }

    async fn list_requests(
        &self,
        status: Option<PaymentStatus>,
    ) -> Result<Vec<PaymentRequest>, HoldError> {
        let rows = match status {
            Some(status) => {
                sqlx::query_as::<_, RequestRow>(
                    r#"
                    SELECT id, cycle_id, hold_id, amount, method, order_id, payment_ref,
                           status, created_at, updated_at
                    FROM payment_requests
                    WHERE status = $1
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, RequestRow>(
                    r#"
                    SELECT id, cycle_id, hold_id, amount, method, order_id, payment_ref,
                           status, created_at, updated_at
                    FROM payment_requests
                    ORDER BY created_at DESC
                    "#,
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(store_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_request_status(
        &self,
        id: Uuid,
        status: PaymentStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), HoldError> {
        let result = sqlx::query(
            "UPDATE payment_requests SET status = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(updated_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        if result.rows_affected() == 0 {
            return Err(HoldError::not_found(format!("payment request {id}")));
        }
        Ok(())
    }

    async fn insert_purchase(&self, purchase: &Purchase) -> Result<(), HoldError> {
        sqlx::query(
            r#"
            INSERT INTO purchases
                (id, cycle_id, buyer_name, buyer_email, bill_number, amount, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(purchase.id)
        .bind(purchase.cycle_id)
        .bind(&purchase.buyer_name)
        .bind(&purchase.buyer_email)
        .bind(&purchase.bill_number)
        .bind(purchase.amount)
        .bind(purchase.created_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(())
    }
}
