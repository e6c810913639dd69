use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cyclemart_domain::repository::HoldRepository;
use cyclemart_domain::{CycleSummary, Hold, HoldError, HoldWithCycle, Requester};
use sqlx::PgPool;
use uuid::Uuid;

use crate::store_err;

/// Hold ledger over Postgres. The exclusivity guarantee is the partial unique
/// index `cycle_holds_one_active ON cycle_holds (cycle_id) WHERE is_active`;
/// a conflicting insert surfaces as a unique violation and maps to
/// `AlreadyHeld`, so two racing sessions resolve at commit time with exactly
/// one winner.
pub struct PgHoldRepository {
    pub pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct HoldRow {
    id: Uuid,
    cycle_id: Uuid,
    customer_name: String,
    customer_email: String,
    customer_phone: String,
    allotment_number: String,
    created_at: DateTime<Utc>,
    hold_end_time: DateTime<Utc>,
    is_active: bool,
}

impl From<HoldRow> for Hold {
    fn from(row: HoldRow) -> Self {
        Hold {
            id: row.id,
            cycle_id: row.cycle_id,
            requester: Requester {
                full_name: row.customer_name,
                email: row.customer_email,
                phone: row.customer_phone,
                allotment_number: row.allotment_number,
            },
            created_at: row.created_at,
            hold_end_time: row.hold_end_time,
            is_active: row.is_active,
        }
    }
}

#[derive(sqlx::FromRow)]
struct HoldJoinRow {
    id: Uuid,
    cycle_id: Uuid,
    customer_name: String,
    customer_email: String,
    customer_phone: String,
    allotment_number: String,
    created_at: DateTime<Utc>,
    hold_end_time: DateTime<Utc>,
    is_active: bool,
    cycle_name: String,
    cycle_brand: String,
    cycle_model: String,
    cycle_price: i64,
    cycle_image_url: Option<String>,
}

impl From<HoldJoinRow> for HoldWithCycle {
    fn from(row: HoldJoinRow) -> Self {
        HoldWithCycle {
            cycle: CycleSummary {
                id: row.cycle_id,
                name: row.cycle_name,
                brand: row.cycle_brand,
                model: row.cycle_model,
                price: row.cycle_price,
                image_url: row.cycle_image_url,
            },
            hold: Hold {
                id: row.id,
                cycle_id: row.cycle_id,
                requester: Requester {
                    full_name: row.customer_name,
                    email: row.customer_email,
                    phone: row.customer_phone,
                    allotment_number: row.allotment_number,
                },
                created_at: row.created_at,
                hold_end_time: row.hold_end_time,
                is_active: row.is_active,
            },
        }
    }
}

fn insert_err(err: sqlx::Error) -> HoldError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return HoldError::AlreadyHeld;
        }
        if db.is_foreign_key_violation() {
            return HoldError::not_found("cycle");
        }
    }
    store_err(err)
}

#[async_trait]
impl HoldRepository for PgHoldRepository {
    async fn insert_hold(&self, hold: &Hold) -> Result<Hold, HoldError> {
        let row = sqlx::query_as::<_, HoldRow>(
            r#"
            INSERT INTO cycle_holds
                (id, cycle_id, customer_name, customer_email, customer_phone,
                 allotment_number, created_at, hold_end_time, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE)
            RETURNING id, cycle_id, customer_name, customer_email, customer_phone,
                      allotment_number, created_at, hold_end_time, is_active
            "#,
        )
        .bind(hold.id)
        .bind(hold.cycle_id)
        .bind(&hold.requester.full_name)
        .bind(&hold.requester.email)
        .bind(&hold.requester.phone)
        .bind(&hold.requester.allotment_number)
        .bind(hold.created_at)
        .bind(hold.hold_end_time)
        .fetch_one(&self.pool)
        .await
        .map_err(insert_err)?;

        Ok(row.into())
    }

    async fn get_hold(&self, id: Uuid) -> Result<Option<Hold>, HoldError> {
        let row = sqlx::query_as::<_, HoldRow>(
            r#"
            SELECT id, cycle_id, customer_name, customer_email, customer_phone,
                   allotment_number, created_at, hold_end_time, is_active
            FROM cycle_holds
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(row.map(Into::into))
    }

    async fn active_hold_for_cycle(&self, cycle_id: Uuid) -> Result<Option<Hold>, HoldError> {
        let row = sqlx::query_as::<_, HoldRow>(
            r#"
            SELECT id, cycle_id, customer_name, customer_email, customer_phone,
                   allotment_number, created_at, hold_end_time, is_active
            FROM cycle_holds
            WHERE cycle_id = $1 AND is_active
            "#,
        )
        .bind(cycle_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(row.map(Into::into))
    }

    async fn deactivate_hold(&self, id: Uuid) -> Result<bool, HoldError> {
        let result = sqlx::query("UPDATE cycle_holds SET is_active = FALSE WHERE id = $1 AND is_active")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn deactivate_expired_holds(&self, now: DateTime<Utc>) -> Result<u64, HoldError> {
        let result = sqlx::query(
            "UPDATE cycle_holds SET is_active = FALSE WHERE is_active AND hold_end_time <= $1",
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(result.rows_affected())
    }

    async fn list_active_holds(&self) -> Result<Vec<HoldWithCycle>, HoldError> {
        let rows = sqlx::query_as::<_, HoldJoinRow>(
            r#"
            SELECT h.id, h.cycle_id, h.customer_name, h.customer_email, h.customer_phone,
                   h.allotment_number, h.created_at, h.hold_end_time, h.is_active,
                   c.name AS cycle_name, c.brand AS cycle_brand, c.model AS cycle_model,
                   c.price AS cycle_price, c.image_url AS cycle_image_url
            FROM cycle_holds h
            JOIN cycles c ON c.id = h.cycle_id
            WHERE h.is_active
            ORDER BY h.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
