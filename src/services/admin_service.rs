//! Admin service - API key issuance and seller profile maintenance.

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        api_key::{ActorRole, ApiKey, IssueApiKeyRequest, IssuedApiKey, hash_api_key},
        seller::{SellerProfile, UpsertSellerRequest},
    },
    store::Store,
};

/// Stores the hash of `raw_key` for the given actor.
pub async fn register_api_key(
    store: &dyn Store,
    raw_key: &str,
    request: IssueApiKeyRequest,
) -> Result<ApiKey, AppError> {
    if request.actor_id.trim().is_empty() {
        return Err(AppError::invalid_argument("actor_id is required"));
    }
    let seller_id = match (request.role, request.seller_id) {
        (ActorRole::Seller, Some(id)) if !id.trim().is_empty() => Some(id),
        (ActorRole::Seller, _) => {
            return Err(AppError::invalid_argument("seller keys need a seller_id"));
        }
        _ => None,
    };

    let key = ApiKey {
        key_hash: hash_api_key(raw_key),
        actor_id: request.actor_id,
        role: request.role,
        seller_id,
        is_active: true,
        created_at: Utc::now(),
    };
    store.insert_api_key(&key).await?;

    tracing::info!(actor_id = %key.actor_id, role = %key.role, "API key registered");
    Ok(key)
}

/// Generates a random key and registers it.
pub async fn issue_api_key(
    store: &dyn Store,
    request: IssueApiKeyRequest,
) -> Result<IssuedApiKey, AppError> {
    let raw_key = format!("sk_{}", Uuid::new_v4().simple());
    let key = register_api_key(store, &raw_key, request).await?;
    Ok(IssuedApiKey {
        api_key: raw_key,
        actor_id: key.actor_id,
        role: key.role,
        seller_id: key.seller_id,
    })
}

/// Creates or replaces a seller profile, keeping the original creation time.
pub async fn upsert_seller(
    store: &dyn Store,
    seller_id: &str,
    request: UpsertSellerRequest,
) -> Result<SellerProfile, AppError> {
    if request.display_name.trim().is_empty() {
        return Err(AppError::invalid_argument("display_name is required"));
    }
    if let Some(rate) = request.commission {
        if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
            return Err(AppError::invalid_argument(
                "Commission rate must be between 0 and 100",
            ));
        }
    }

    let now = Utc::now();
    let created_at = store
        .fetch_seller(seller_id)
        .await?
        .map_or(now, |existing| existing.created_at);

    let profile = SellerProfile {
        id: seller_id.to_string(),
        display_name: request.display_name,
        email: request.email,
        phone: request.phone,
        store_name: request.store_name,
        commission: request.commission,
        bank_details: request.bank_details,
        created_at,
        updated_at: now,
    };
    store.upsert_seller(&profile).await?;

    tracing::info!(seller_id, "seller profile saved");
    Ok(profile)
}
