//! Admin HTTP handlers for actors and seller profiles.
//!
//! - POST /api/v1/admin/api-keys - Issue an API key
//! - PUT  /api/v1/admin/sellers/{seller_id} - Create or replace a seller profile

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    app::AppState,
    error::AppError,
    middleware::auth::AuthContext,
    models::{
        api_key::{IssueApiKeyRequest, IssuedApiKey},
        seller::{SellerProfile, UpsertSellerRequest},
    },
    services::admin_service,
};

/// Issue an API key.
///
/// # Request Body
///
/// ```json
/// { "actor_id": "u-42", "role": "seller", "seller_id": "s-42" }
/// ```
///
/// # Response (201)
///
/// The raw key is returned once and never stored.
///
/// ```json
/// { "api_key": "sk_3f2a...", "actor_id": "u-42", "role": "seller", "seller_id": "s-42" }
/// ```
pub async fn issue_api_key(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<IssueApiKeyRequest>,
) -> Result<(StatusCode, Json<IssuedApiKey>), AppError> {
    auth.require_admin()?;
    let issued = admin_service::issue_api_key(state.store.as_ref(), request).await?;
    Ok((StatusCode::CREATED, Json(issued)))
}

pub async fn upsert_seller(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(seller_id): Path<String>,
    Json(request): Json<UpsertSellerRequest>,
) -> Result<Json<SellerProfile>, AppError> {
    auth.require_admin()?;
    let profile = admin_service::upsert_seller(state.store.as_ref(), &seller_id, request).await?;
    Ok(Json(profile))
}
