use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use cyclemart_domain::{PaymentMethod, PaymentRequest, PaymentStatus, Purchase};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OpenPaymentRequest {
    pub hold_id: Uuid,
    pub method: PaymentMethod,
    pub amount: i64,
    pub payment_ref: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<PaymentStatus>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/payment-requests", post(open_request).get(list_requests))
        .route("/v1/payment-requests/{id}/approve", post(approve_request))
        .route("/v1/payment-requests/{id}/reject", post(reject_request))
}

async fn open_request(
    State(state): State<AppState>,
    Json(req): Json<OpenPaymentRequest>,
) -> Result<(StatusCode, Json<PaymentRequest>), AppError> {
    let request = state
        .settlement
        .create_request(req.hold_id, req.method, req.amount, req.payment_ref)
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

async fn list_requests(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<PaymentRequest>>, AppError> {
    let requests = state.settlement.list_requests(query.status).await?;
    Ok(Json(requests))
}

async fn approve_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Purchase>, AppError> {
    let purchase = state.settlement.approve(id).await?;
    Ok(Json(purchase))
}

async fn reject_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentRequest>, AppError> {
    let request = state.settlement.reject(id).await?;
    Ok(Json(request))
}
