//! Order HTTP handlers.
//!
//! - POST  /api/v1/orders - Place an order
//! - GET   /api/v1/orders/{id} - Get an order
//! - PATCH /api/v1/orders/{id}/status - Move the whole order
//! - PATCH /api/v1/orders/{id}/sellers/{seller_id}/status - Move one seller's group
//! - PATCH /api/v1/orders/{id}/payment-status - Record a payment status
//! - GET   /api/v1/seller/orders - The calling seller's orders

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;

use crate::{
    app::AppState,
    error::AppError,
    middleware::auth::AuthContext,
    models::{
        api_key::ActorRole,
        order::{
            Order, OrderStatus, PlaceOrderRequest, UpdatePaymentStatusRequest,
            UpdateStatusRequest,
        },
        seller_order::SellerOrder,
    },
    services::order_service::{self, StatusUpdate},
};

#[derive(Debug, Default, Deserialize)]
pub struct SellerOrdersQuery {
    #[serde(default)]
    pub status: Option<OrderStatus>,
}

fn can_view(auth: &AuthContext, order: &Order) -> bool {
    match auth.role {
        ActorRole::Admin => true,
        ActorRole::Buyer => order.buyer_id == auth.actor_id,
        ActorRole::Seller => auth
            .seller_id
            .as_deref()
            .is_some_and(|seller_id| order.involves_seller(seller_id)),
    }
}

/// Place an order.
///
/// Buyers always order for themselves; admins must name the buyer in
/// `buyer_id`. Sellers cannot place orders.
///
/// # Response (201)
///
/// The stored order, including `seller_groups` with each seller's sub-total.
pub async fn place_order(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let buyer_id = match auth.role {
        ActorRole::Buyer => auth.actor_id.clone(),
        ActorRole::Admin => request
            .buyer_id
            .clone()
            .ok_or_else(|| AppError::invalid_argument("buyer_id is required"))?,
        ActorRole::Seller => return Err(AppError::Unauthorized),
    };

    let order = order_service::place_order(state.store.as_ref(), &buyer_id, request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Get an order. Visible to its buyer, any seller on it, and admins.
pub async fn get_order(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Json<Order>, AppError> {
    let order = order_service::fetch_order(state.store.as_ref(), &id).await?;
    if !can_view(&auth, &order) {
        return Err(AppError::Unauthorized);
    }
    Ok(Json(order))
}

/// Move the whole order to a new status.
///
/// Admins may move any order; a seller may move a single-seller order
/// they own. Multi-seller orders are moved per seller instead.
///
/// # Request Body
///
/// ```json
/// { "status": "delivered", "note": "Left with neighbour" }
/// ```
///
/// # Response (200)
///
/// The updated order, its previous status, and a per-seller report of the
/// copy sync and wallet settlement.
pub async fn update_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<StatusUpdate>, AppError> {
    let store = state.store.as_ref();

    if !auth.is_admin() {
        let order = order_service::fetch_order(store, &id).await?;
        let owns_order = !order.is_multi_seller
            && order
                .seller_id
                .as_deref()
                .is_some_and(|seller_id| auth.is_seller(seller_id));
        if !owns_order {
            return Err(AppError::Unauthorized);
        }
    }

    let update = order_service::update_order_status(store, &id, request.into_change(Utc::now())).await?;
    Ok(Json(update))
}

/// Move one seller's group of an order. Allowed for that seller and admins.
pub async fn update_seller_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((id, seller_id)): Path<(String, String)>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<StatusUpdate>, AppError> {
    if !auth.is_admin() && !auth.is_seller(&seller_id) {
        return Err(AppError::Unauthorized);
    }

    let update = order_service::update_seller_status(
        state.store.as_ref(),
        &id,
        &seller_id,
        request.into_change(Utc::now()),
    )
    .await?;
    Ok(Json(update))
}

/// Record a payment status (e.g. COD `collected`). Allowed for admins and
/// any seller on the order.
pub async fn update_payment_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(request): Json<UpdatePaymentStatusRequest>,
) -> Result<Json<Order>, AppError> {
    let store = state.store.as_ref();

    if !auth.is_admin() {
        let order = order_service::fetch_order(store, &id).await?;
        let involved = auth.role == ActorRole::Seller && can_view(&auth, &order);
        if !involved {
            return Err(AppError::Unauthorized);
        }
    }

    let order = order_service::update_payment_status(store, &id, request.payment_status).await?;
    Ok(Json(order))
}

/// List the calling seller's orders, newest first.
///
/// # Query Parameters
///
/// - `status` (optional): only orders whose seller status matches
pub async fn list_seller_orders(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<SellerOrdersQuery>,
) -> Result<Json<Vec<SellerOrder>>, AppError> {
    let seller_id = auth.require_seller()?;
    let orders = order_service::list_seller_orders(state.store.as_ref(), seller_id, query.status).await?;
    Ok(Json(orders))
}
