//! Wallet HTTP handlers.
//!
//! - GET  /api/v1/wallet - The calling seller's counters
//! - GET  /api/v1/wallet/transactions - The calling seller's ledger
//! - GET  /api/v1/admin/wallets/{seller_id} - Any seller's counters (admin)
//! - POST /api/v1/admin/wallets/{seller_id}/adjustments - Manual correction (admin)

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;

use crate::{
    app::AppState,
    error::AppError,
    middleware::auth::AuthContext,
    models::wallet::{AdjustmentRequest, Wallet, WalletTransaction},
    services::wallet_service,
};

/// Response for a posted adjustment.
#[derive(Debug, Serialize)]
pub struct AdjustmentResponse {
    pub wallet: Wallet,
    pub transaction: WalletTransaction,
}

pub async fn get_wallet(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Wallet>, AppError> {
    let seller_id = auth.require_seller()?;
    let wallet = wallet_service::get_wallet(state.store.as_ref(), seller_id).await?;
    Ok(Json(wallet))
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<WalletTransaction>>, AppError> {
    let seller_id = auth.require_seller()?;
    let transactions = wallet_service::list_transactions(state.store.as_ref(), seller_id).await?;
    Ok(Json(transactions))
}

pub async fn admin_get_wallet(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(seller_id): Path<String>,
) -> Result<Json<Wallet>, AppError> {
    auth.require_admin()?;
    let wallet = wallet_service::get_wallet(state.store.as_ref(), &seller_id).await?;
    Ok(Json(wallet))
}

/// Post a signed adjustment.
///
/// # Request Body
///
/// ```json
/// { "amount": "-250.00", "description": "Chargeback on order 123" }
/// ```
///
/// # Errors
///
/// - 400 if the amount is zero
/// - 422 if a negative amount would overdraw the wallet
pub async fn admin_post_adjustment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(seller_id): Path<String>,
    Json(request): Json<AdjustmentRequest>,
) -> Result<(StatusCode, Json<AdjustmentResponse>), AppError> {
    auth.require_admin()?;
    let posting = wallet_service::post_adjustment(state.store.as_ref(), &seller_id, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(AdjustmentResponse {
            wallet: posting.wallet,
            transaction: posting.transaction,
        }),
    ))
}
