use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::{Duration, Utc};
use cyclemart_api::AppState;
use cyclemart_domain::repository::HoldRepository;
use cyclemart_domain::{Cycle, Hold, Requester};
use cyclemart_hold::{HoldManager, SettlementService};
use cyclemart_store::{ChangeNotifier, MemoryStore};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

fn cycle(name: &str) -> Cycle {
    Cycle {
        id: Uuid::new_v4(),
        name: name.to_string(),
        brand: "Hero".to_string(),
        model: "Sprint".to_string(),
        price: 350_000,
        image_url: Some("https://img.example/cycle.jpg".to_string()),
        is_available: true,
        created_at: Utc::now(),
    }
}

async fn test_app() -> (axum::Router, Arc<MemoryStore>, Cycle) {
    let store = Arc::new(MemoryStore::new());
    let c = cycle("Campus Cruiser");
    store.add_cycle(c.clone()).await;

    let notifier = ChangeNotifier::default();
    let manager = Arc::new(HoldManager::new(
        store.clone(),
        store.clone(),
        notifier.clone(),
        20,
    ));
    let settlement = Arc::new(SettlementService::new(store.clone(), manager.clone()));

    let state = AppState {
        manager,
        settlement,
        cycles: store.clone(),
        notifier,
    };
    (cyclemart_api::app(state), store, c)
}

fn hold_payload(cycle_id: Uuid, name: &str) -> Value {
    json!({
        "cycle_id": cycle_id,
        "customer_name": name,
        "customer_email": format!("{}@campus.edu", name.to_lowercase()),
        "customer_phone": "9000000001",
        "allotment_number": "AL-42",
    })
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn create_hold_returns_201_with_countdown() {
    let (app, _store, cycle) = test_app().await;

    let response = app
        .oneshot(post_json("/v1/holds", &hold_payload(cycle.id, "Asha")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["cycle_id"], json!(cycle.id));
    assert_eq!(body["is_active"], json!(true));
    assert_eq!(body["customer_name"], json!("Asha"));
    // A fresh 20 minute hold counts down from 20:00.
    let remaining = body["remaining_time"].as_str().unwrap();
    assert!(remaining.starts_with("19:") || remaining == "20:00", "got {remaining}");
}

#[tokio::test]
async fn second_hold_on_same_cycle_is_a_conflict() {
    let (app, _store, cycle) = test_app().await;

    let first = app
        .clone()
        .oneshot(post_json("/v1/holds", &hold_payload(cycle.id, "Asha")))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app
        .oneshot(post_json("/v1/holds", &hold_payload(cycle.id, "Ravi")))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let body = body_json(second).await;
    assert_eq!(body["error"], json!("cycle is already on hold"));
}

#[tokio::test]
async fn missing_requester_fields_are_a_bad_request() {
    let (app, _store, cycle) = test_app().await;

    let mut payload = hold_payload(cycle.id, "Asha");
    payload["customer_name"] = json!("");
    let response = app
        .oneshot(post_json("/v1/holds", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn holding_an_unknown_cycle_is_not_found() {
    let (app, _store, _cycle) = test_app().await;

    let response = app
        .oneshot(post_json("/v1/holds", &hold_payload(Uuid::new_v4(), "Asha")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn release_is_idempotent_over_http() {
    let (app, _store, cycle) = test_app().await;

    let created = app
        .clone()
        .oneshot(post_json("/v1/holds", &hold_payload(cycle.id, "Asha")))
        .await
        .unwrap();
    let hold_id = body_json(created).await["id"].as_str().unwrap().to_string();

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/v1/holds/{hold_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    // Released cycle is reservable again.
    let again = app
        .oneshot(post_json("/v1/holds", &hold_payload(cycle.id, "Ravi")))
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn active_list_joins_cycle_summary() {
    let (app, _store, cycle) = test_app().await;

    app.clone()
        .oneshot(post_json("/v1/holds", &hold_payload(cycle.id, "Asha")))
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/holds")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let holds = body.as_array().unwrap();
    assert_eq!(holds.len(), 1);
    assert_eq!(holds[0]["cycle"]["name"], json!("Campus Cruiser"));
    assert_eq!(holds[0]["cycle"]["brand"], json!("Hero"));
}

#[tokio::test]
async fn expire_endpoint_sweeps_stale_holds() {
    let (app, store, cycle) = test_app().await;

    let stale = Hold {
        hold_end_time: Utc::now() - Duration::seconds(1),
        ..Hold::new(
            cycle.id,
            Requester {
                full_name: "Asha Rao".to_string(),
                email: "asha@campus.edu".to_string(),
                phone: "9876543210".to_string(),
                allotment_number: "AL-2041".to_string(),
            },
            Utc::now(),
            Duration::minutes(20),
        )
    };
    store.insert_hold(&stale).await.unwrap();

    let response = app
        .clone()
        .oneshot(post_json("/v1/holds/expire", &json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["expired"], json!(1));

    let list = app
        .oneshot(
            Request::builder()
                .uri("/v1/holds")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(body_json(list).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn cycles_report_derived_hold_state() {
    let (app, _store, cycle) = test_app().await;

    app.clone()
        .oneshot(post_json("/v1/holds", &hold_payload(cycle.id, "Asha")))
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/v1/cycles/{}", cycle.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["on_hold"], json!(true));
}

#[tokio::test]
async fn payment_approval_finalizes_the_purchase_and_frees_the_cycle() {
    let (app, store, cycle) = test_app().await;

    let created = app
        .clone()
        .oneshot(post_json("/v1/holds", &hold_payload(cycle.id, "Asha")))
        .await
        .unwrap();
    let hold_id = body_json(created).await["id"].as_str().unwrap().to_string();

    let opened = app
        .clone()
        .oneshot(post_json(
            "/v1/payment-requests",
            &json!({
                "hold_id": hold_id,
                "method": "upi",
                "amount": 350000,
                "payment_ref": "UPI-TXN-1",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(opened.status(), StatusCode::CREATED);
    let request_id = body_json(opened).await["id"].as_str().unwrap().to_string();

    let approved = app
        .clone()
        .oneshot(post_json(
            &format!("/v1/payment-requests/{request_id}/approve"),
            &json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(approved.status(), StatusCode::OK);
    let purchase = body_json(approved).await;
    assert_eq!(purchase["buyer_email"], json!("asha@campus.edu"));

    assert_eq!(store.purchases().await.len(), 1);

    // The hold is gone, so the cycle can be reserved again.
    let again = app
        .oneshot(post_json("/v1/holds", &hold_payload(cycle.id, "Ravi")))
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::CREATED);
}
