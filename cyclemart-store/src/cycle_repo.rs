use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cyclemart_domain::repository::CycleRepository;
use cyclemart_domain::{Cycle, HoldError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::store_err;

pub struct PgCycleRepository {
    pub pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct CycleRow {
    id: Uuid,
    name: String,
    brand: String,
    model: String,
    price: i64,
    image_url: Option<String>,
    is_available: bool,
    created_at: DateTime<Utc>,
}

impl From<CycleRow> for Cycle {
    fn from(row: CycleRow) -> Self {
        Cycle {
            id: row.id,
            name: row.name,
            brand: row.brand,
            model: row.model,
            price: row.price,
            image_url: row.image_url,
            is_available: row.is_available,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl CycleRepository for PgCycleRepository {
    async fn get_cycle(&self, id: Uuid) -> Result<Option<Cycle>, HoldError> {
        let row = sqlx::query_as::<_, CycleRow>(
            r#"
            SELECT id, name, brand, model, price, image_url, is_available, created_at
            FROM cycles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(row.map(Into::into))
    }

    async fn list_cycles(&self) -> Result<Vec<Cycle>, HoldError> {
        let rows = sqlx::query_as::<_, CycleRow>(
            r#"
            SELECT id, name, brand, model, price, image_url, is_available, created_at
            FROM cycles
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
