use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use cyclemart_domain::{CycleSummary, Hold, Requester};
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateHoldRequest {
    pub cycle_id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub allotment_number: String,
}

#[derive(Debug, Serialize)]
pub struct HoldResponse {
    pub id: Uuid,
    pub cycle_id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub allotment_number: String,
    pub created_at: DateTime<Utc>,
    pub hold_end_time: DateTime<Utc>,
    pub is_active: bool,
    /// Countdown at response time; clients re-derive it locally every second
    /// from `hold_end_time`.
    pub remaining_time: String,
}

impl HoldResponse {
    fn from_hold(hold: &Hold, now: DateTime<Utc>) -> Self {
        Self {
            id: hold.id,
            cycle_id: hold.cycle_id,
            customer_name: hold.requester.full_name.clone(),
            customer_email: hold.requester.email.clone(),
            customer_phone: hold.requester.phone.clone(),
            allotment_number: hold.requester.allotment_number.clone(),
            created_at: hold.created_at,
            hold_end_time: hold.hold_end_time,
            is_active: hold.is_active,
            remaining_time: hold.remaining_time(now).to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ActiveHoldResponse {
    #[serde(flatten)]
    pub hold: HoldResponse,
    pub cycle: CycleSummary,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/holds", post(create_hold).get(list_holds))
        .route("/v1/holds/expire", post(expire_holds))
        .route("/v1/holds/stream", get(stream_changes))
        .route("/v1/holds/{id}", delete(release_hold))
}

async fn create_hold(
    State(state): State<AppState>,
    Json(req): Json<CreateHoldRequest>,
) -> Result<(StatusCode, Json<HoldResponse>), AppError> {
    let requester = Requester {
        full_name: req.customer_name,
        email: req.customer_email,
        phone: req.customer_phone,
        allotment_number: req.allotment_number,
    };
    let hold = state.manager.create_hold(req.cycle_id, requester).await?;
    Ok((StatusCode::CREATED, Json(HoldResponse::from_hold(&hold, Utc::now()))))
}

async fn list_holds(
    State(state): State<AppState>,
) -> Result<Json<Vec<ActiveHoldResponse>>, AppError> {
    let now = Utc::now();
    let holds = state.manager.list_active_holds().await?;
    let body = holds
        .into_iter()
        .map(|h| ActiveHoldResponse {
            hold: HoldResponse::from_hold(&h.hold, now),
            cycle: h.cycle,
        })
        .collect();
    Ok(Json(body))
}

async fn release_hold(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.manager.release_hold(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn expire_holds(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let expired = state.manager.expire_stale_holds().await?;
    Ok(Json(json!({ "expired": expired })))
}

/// SSE feed of ledger changes. Events carry only "something changed";
/// clients follow up with a re-fetch of the active list.
async fn stream_changes(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.notifier.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(change) => Event::default()
                .event("hold_change")
                .json_data(&change)
                .ok()
                .map(Ok),
            // A lagged receiver just misses coalesced events; the polling
            // loop bounds the staleness either way.
            Err(_) => None,
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
