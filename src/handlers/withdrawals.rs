//! Withdrawal HTTP handlers.
//!
//! Seller endpoints:
//! - POST /api/v1/withdrawals/preview - Commission breakdown for an amount
//! - POST /api/v1/withdrawals - Request a withdrawal
//! - GET  /api/v1/withdrawals - List own requests
//! - GET  /api/v1/withdrawals/{id} - Get a request (owner or admin)
//! - POST /api/v1/withdrawals/{id}/cancel - Cancel a pending request
//!
//! Admin endpoints:
//! - GET  /api/v1/admin/withdrawals - List all requests
//! - POST /api/v1/admin/withdrawals/{id}/approve|process|paid|reject

use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::{
    app::AppState,
    error::AppError,
    middleware::auth::AuthContext,
    models::withdrawal::{
        AdminActionRequest, CommissionBreakdown, CreateWithdrawalRequest, MarkPaidRequest,
        RejectWithdrawalRequest, WithdrawalFilter, WithdrawalRequest,
    },
    services::withdrawal_service,
};

/// Admin action bodies are optional; an empty body means no note.
fn optional_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, AppError> {
    if body.is_empty() {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::invalid_argument(format!("Invalid request body: {e}")))
}

/// Preview the breakdown for an amount at the seller's commission rate.
///
/// # Request Body
///
/// ```json
/// { "amount": "1000" }
/// ```
///
/// # Response (200)
///
/// ```json
/// {
///   "gross_amount": "1000",
///   "commission_rate": "10",
///   "commission_amount": "100.00",
///   "gst_on_commission": "18.00",
///   "total_deduction": "118.00",
///   "net_payable": "882.00"
/// }
/// ```
pub async fn preview(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CreateWithdrawalRequest>,
) -> Result<Json<CommissionBreakdown>, AppError> {
    let seller_id = auth.require_seller()?;
    let breakdown =
        withdrawal_service::preview(state.store.as_ref(), &state.policy, seller_id, request.amount)
            .await?;
    Ok(Json(breakdown))
}

/// Request a withdrawal of part of the available balance.
///
/// # Errors
///
/// - 400 with the joined validation reasons
/// - 409 if a pending request already exists
/// - 422 if the amount exceeds the available balance
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CreateWithdrawalRequest>,
) -> Result<(StatusCode, Json<WithdrawalRequest>), AppError> {
    let seller_id = auth.require_seller()?;
    let withdrawal =
        withdrawal_service::create(state.store.as_ref(), &state.policy, seller_id, request).await?;
    Ok((StatusCode::CREATED, Json(withdrawal)))
}

pub async fn list_mine(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<WithdrawalRequest>>, AppError> {
    let seller_id = auth.require_seller()?;
    let filter = WithdrawalFilter {
        seller_id: Some(seller_id.to_string()),
        status: None,
    };
    let requests = withdrawal_service::list(state.store.as_ref(), &filter).await?;
    Ok(Json(requests))
}

pub async fn get_withdrawal(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<WithdrawalRequest>, AppError> {
    let request = withdrawal_service::fetch(state.store.as_ref(), id).await?;
    if !auth.is_admin() && !auth.is_seller(&request.seller_id) {
        return Err(AppError::Unauthorized);
    }
    Ok(Json(request))
}

pub async fn cancel(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<WithdrawalRequest>, AppError> {
    let seller_id = auth.require_seller()?;
    let request = withdrawal_service::cancel(state.store.as_ref(), seller_id, id).await?;
    Ok(Json(request))
}

/// List every request, newest first.
///
/// # Query Parameters
///
/// - `status` (optional): e.g. `pending`
/// - `seller_id` (optional)
pub async fn admin_list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(filter): Query<WithdrawalFilter>,
) -> Result<Json<Vec<WithdrawalRequest>>, AppError> {
    auth.require_admin()?;
    let requests = withdrawal_service::list(state.store.as_ref(), &filter).await?;
    Ok(Json(requests))
}

/// Approve a pending request and debit the seller's wallet.
pub async fn approve(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<WithdrawalRequest>, AppError> {
    auth.require_admin()?;
    let action: AdminActionRequest = optional_body(&body)?;
    let request =
        withdrawal_service::approve(state.store.as_ref(), id, &auth.actor_id, action).await?;
    Ok(Json(request))
}

pub async fn process(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<WithdrawalRequest>, AppError> {
    auth.require_admin()?;
    let action: AdminActionRequest = optional_body(&body)?;
    let request =
        withdrawal_service::process(state.store.as_ref(), id, &auth.actor_id, action).await?;
    Ok(Json(request))
}

pub async fn mark_paid(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<WithdrawalRequest>, AppError> {
    auth.require_admin()?;
    let action: MarkPaidRequest = optional_body(&body)?;
    let request =
        withdrawal_service::mark_paid(state.store.as_ref(), id, &auth.actor_id, action).await?;
    Ok(Json(request))
}

/// Reject a request; a debited wallet is refunded.
///
/// # Request Body
///
/// ```json
/// { "reason": "Bank account closed", "note": "Seller notified" }
/// ```
pub async fn reject(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<RejectWithdrawalRequest>,
) -> Result<Json<WithdrawalRequest>, AppError> {
    auth.require_admin()?;
    let request =
        withdrawal_service::reject(state.store.as_ref(), id, &auth.actor_id, request).await?;
    Ok(Json(request))
}
