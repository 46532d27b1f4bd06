//! HTTP surface: authentication, role checks and the error taxonomy.

mod common;

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use seller_settlement::{
    app::{self, AppState},
    config::SettlementPolicy,
    models::api_key::{ActorRole, IssueApiKeyRequest},
    services::admin_service,
    store::MemoryStore,
};

use common::{dec, seed_seller};

const ADMIN: &str = "admin-key";
const SELLER: &str = "seller-key";
const OTHER_SELLER: &str = "other-seller-key";
const BUYER: &str = "buyer-key";

async fn register(store: &MemoryStore, raw_key: &str, actor_id: &str, role: ActorRole, seller_id: Option<&str>) {
    admin_service::register_api_key(
        store,
        raw_key,
        IssueApiKeyRequest {
            actor_id: actor_id.into(),
            role,
            seller_id: seller_id.map(str::to_string),
        },
    )
    .await
    .unwrap();
}

async fn test_app() -> Router {
    let store = Arc::new(MemoryStore::new());
    register(&store, ADMIN, "admin", ActorRole::Admin, None).await;
    register(&store, SELLER, "u-1", ActorRole::Seller, Some("s-1")).await;
    register(&store, OTHER_SELLER, "u-2", ActorRole::Seller, Some("s-2")).await;
    register(&store, BUYER, "b-1", ActorRole::Buyer, None).await;
    seed_seller(&store, "s-1", 10).await;
    seed_seller(&store, "s-2", 10).await;

    app::router(AppState::new(store, SettlementPolicy::default()))
}

async fn send(app: &Router, method: Method, uri: &str, key: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = key {
        builder = builder.header("Authorization", format!("Bearer {key}"));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn order_body(items: Value, payment_mode: &str, payment_status: &str) -> Value {
    json!({
        "items": items,
        "shipping_address": {
            "name": "Asha", "phone": "9999999999", "line1": "12 MG Road",
            "city": "Pune", "state": "MH", "postal_code": "411001"
        },
        "payment_mode": payment_mode,
        "payment_status": payment_status
    })
}

#[tokio::test]
async fn health_needs_no_key() {
    let app = test_app().await;
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn missing_or_unknown_keys_are_rejected() {
    let app = test_app().await;

    let (status, body) = send(&app, Method::GET, "/api/v1/wallet", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "invalid_api_key");

    let (status, _) = send(&app, Method::GET, "/api/v1/wallet", Some("nope"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_role_is_forbidden() {
    let app = test_app().await;

    let (status, body) = send(&app, Method::GET, "/api/v1/admin/withdrawals", Some(SELLER), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "unauthorized");

    let (status, _) = send(&app, Method::GET, "/api/v1/wallet", Some(BUYER), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn delivered_order_flows_into_a_paid_withdrawal() {
    let app = test_app().await;

    let items = json!([{ "product_id": "p-1", "seller_id": "s-1", "quantity": 2, "unit_price": "500" }]);
    let (status, order) = send(
        &app,
        Method::POST,
        "/api/v1/orders",
        Some(BUYER),
        Some(order_body(items, "prepaid", "paid")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let order_id = order["id"].as_str().unwrap().to_string();

    let (status, update) = send(
        &app,
        Method::PATCH,
        &format!("/api/v1/orders/{order_id}/status"),
        Some(SELLER),
        Some(json!({ "status": "delivered" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(update["sellers"][0]["sync"], "synced");
    assert_eq!(update["sellers"][0]["settlement"]["outcome"], "credited");

    let (_, wallet) = send(&app, Method::GET, "/api/v1/wallet", Some(SELLER), None).await;
    assert_eq!(dec(wallet["available_balance"].as_str().unwrap()), dec("1000"));

    let (status, preview) = send(
        &app,
        Method::POST,
        "/api/v1/withdrawals/preview",
        Some(SELLER),
        Some(json!({ "amount": "1000" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec(preview["net_payable"].as_str().unwrap()), dec("882"));

    let (status, request) = send(
        &app,
        Method::POST,
        "/api/v1/withdrawals",
        Some(SELLER),
        Some(json!({ "amount": "1000" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(request["status"], "pending");
    let id = request["id"].as_str().unwrap().to_string();

    // Another seller can't see it.
    let (status, _) = send(&app, Method::GET, &format!("/api/v1/withdrawals/{id}"), Some(OTHER_SELLER), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    for step in ["approve", "process"] {
        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/api/v1/admin/withdrawals/{id}/{step}"),
            Some(ADMIN),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{step}");
    }
    let (status, paid) = send(
        &app,
        Method::POST,
        &format!("/api/v1/admin/withdrawals/{id}/paid"),
        Some(ADMIN),
        Some(json!({ "payout_reference": "UTR9" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["status"], "paid");

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/admin/withdrawals/{id}/approve"),
        Some(ADMIN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "invalid_state");
}

#[tokio::test]
async fn withdrawal_errors_map_to_status_codes() {
    let app = test_app().await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/admin/wallets/s-1/adjustments",
        Some(ADMIN),
        Some(json!({ "amount": "300", "description": "Goodwill credit" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/withdrawals",
        Some(SELLER),
        Some(json!({ "amount": "50" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].as_str().unwrap().contains("₹100"));

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/withdrawals",
        Some(SELLER),
        Some(json!({ "amount": "500" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "insufficient_balance");

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/v1/withdrawals/6f1c2a34-0000-4000-8000-000000000000",
        Some(SELLER),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_can_issue_keys_and_register_sellers() {
    let app = test_app().await;

    let (status, seller) = send(
        &app,
        Method::PUT,
        "/api/v1/admin/sellers/s-9",
        Some(ADMIN),
        Some(json!({ "display_name": "Nine Crafts", "commission": "5" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(seller["id"], "s-9");

    let (status, issued) = send(
        &app,
        Method::POST,
        "/api/v1/admin/api-keys",
        Some(ADMIN),
        Some(json!({ "actor_id": "u-9", "role": "seller", "seller_id": "s-9" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let key = issued["api_key"].as_str().unwrap().to_string();

    let (status, wallet) = send(&app, Method::GET, "/api/v1/wallet", Some(&key), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(wallet["seller_id"], "s-9");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/admin/api-keys",
        Some(&key),
        Some(json!({ "actor_id": "u-10", "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
