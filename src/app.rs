//! Shared handler state and the HTTP router.

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, patch, post, put},
};
use tower_http::trace::TraceLayer;

use crate::{config::SettlementPolicy, handlers, middleware, store::Store};

/// State shared by every handler via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub policy: SettlementPolicy,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, policy: SettlementPolicy) -> Self {
        Self { store, policy }
    }
}

/// Builds the full application: public health check plus the
/// authenticated `/api/v1` routes.
pub fn router(state: AppState) -> Router {
    let authenticated_routes = Router::new()
        // Orders
        .route("/api/v1/orders", post(handlers::orders::place_order))
        .route("/api/v1/orders/{id}", get(handlers::orders::get_order))
        .route(
            "/api/v1/orders/{id}/status",
            patch(handlers::orders::update_status),
        )
        .route(
            "/api/v1/orders/{id}/sellers/{seller_id}/status",
            patch(handlers::orders::update_seller_status),
        )
        .route(
            "/api/v1/orders/{id}/payment-status",
            patch(handlers::orders::update_payment_status),
        )
        .route(
            "/api/v1/seller/orders",
            get(handlers::orders::list_seller_orders),
        )
        // Seller wallet
        .route("/api/v1/wallet", get(handlers::wallet::get_wallet))
        .route(
            "/api/v1/wallet/transactions",
            get(handlers::wallet::list_transactions),
        )
        // Seller withdrawals
        .route(
            "/api/v1/withdrawals/preview",
            post(handlers::withdrawals::preview),
        )
        .route(
            "/api/v1/withdrawals",
            post(handlers::withdrawals::create).get(handlers::withdrawals::list_mine),
        )
        .route(
            "/api/v1/withdrawals/{id}",
            get(handlers::withdrawals::get_withdrawal),
        )
        .route(
            "/api/v1/withdrawals/{id}/cancel",
            post(handlers::withdrawals::cancel),
        )
        // Admin
        .route(
            "/api/v1/admin/withdrawals",
            get(handlers::withdrawals::admin_list),
        )
        .route(
            "/api/v1/admin/withdrawals/{id}/approve",
            post(handlers::withdrawals::approve),
        )
        .route(
            "/api/v1/admin/withdrawals/{id}/process",
            post(handlers::withdrawals::process),
        )
        .route(
            "/api/v1/admin/withdrawals/{id}/paid",
            post(handlers::withdrawals::mark_paid),
        )
        .route(
            "/api/v1/admin/withdrawals/{id}/reject",
            post(handlers::withdrawals::reject),
        )
        .route(
            "/api/v1/admin/wallets/{seller_id}",
            get(handlers::wallet::admin_get_wallet),
        )
        .route(
            "/api/v1/admin/wallets/{seller_id}/adjustments",
            post(handlers::wallet::admin_post_adjustment),
        )
        .route("/api/v1/admin/api-keys", post(handlers::admin::issue_api_key))
        .route(
            "/api/v1/admin/sellers/{seller_id}",
            put(handlers::admin::upsert_seller),
        )
        // Apply authentication middleware to all routes in this group
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .merge(authenticated_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
