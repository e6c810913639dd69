use std::collections::HashSet;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use cyclemart_domain::{Cycle, HoldError};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CycleResponse {
    pub id: Uuid,
    pub name: String,
    pub brand: String,
    pub model: String,
    pub price: i64,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Derived from hold state; the stored `is_available` flag is advisory
    /// only and deliberately not exposed.
    pub on_hold: bool,
}

impl CycleResponse {
    fn from_cycle(cycle: Cycle, on_hold: bool) -> Self {
        Self {
            id: cycle.id,
            name: cycle.name,
            brand: cycle.brand,
            model: cycle.model,
            price: cycle.price,
            image_url: cycle.image_url,
            created_at: cycle.created_at,
            on_hold,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/cycles", get(list_cycles))
        .route("/v1/cycles/{id}", get(get_cycle))
}

async fn held_cycle_ids(state: &AppState, now: DateTime<Utc>) -> Result<HashSet<Uuid>, HoldError> {
    let active = state.manager.list_active_holds().await?;
    Ok(active
        .iter()
        .filter(|h| h.hold.blocks(now))
        .map(|h| h.hold.cycle_id)
        .collect())
}

async fn list_cycles(State(state): State<AppState>) -> Result<Json<Vec<CycleResponse>>, AppError> {
    let now = Utc::now();
    let held = held_cycle_ids(&state, now).await?;
    let cycles = state.cycles.list_cycles().await?;

    let body = cycles
        .into_iter()
        .map(|c| {
            let on_hold = held.contains(&c.id);
            CycleResponse::from_cycle(c, on_hold)
        })
        .collect();
    Ok(Json(body))
}

async fn get_cycle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CycleResponse>, AppError> {
    let cycle = state
        .cycles
        .get_cycle(id)
        .await?
        .ok_or_else(|| HoldError::not_found(format!("cycle {id}")))?;

    let now = Utc::now();
    let held = held_cycle_ids(&state, now).await?;
    Ok(Json(CycleResponse::from_cycle(cycle, held.contains(&id))))
}
