//! API key authentication middleware.
//!
//! This middleware intercepts every protected request to:
//! 1. Extract the API key from the Authorization header
//! 2. Hash it and look it up through the store
//! 3. Inject the caller's `AuthContext` into the request
//! 4. Reject unknown or inactive keys with HTTP 401

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{
    app::AppState,
    error::AppError,
    models::api_key::{ActorRole, hash_api_key},
};

/// Who is making the request.
///
/// Inserted into the request's extension map; handlers extract it with
/// `Extension<AuthContext>` and use it for ownership checks.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub actor_id: String,
    pub role: ActorRole,
    /// Set for seller keys only.
    pub seller_id: Option<String>,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.role == ActorRole::Admin
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Unauthorized)
        }
    }

    /// The seller this key manages.
    pub fn require_seller(&self) -> Result<&str, AppError> {
        match (self.role, self.seller_id.as_deref()) {
            (ActorRole::Seller, Some(seller_id)) => Ok(seller_id),
            _ => Err(AppError::Unauthorized),
        }
    }

    /// True for a seller key bound to `seller_id`.
    pub fn is_seller(&self, seller_id: &str) -> bool {
        self.role == ActorRole::Seller && self.seller_id.as_deref() == Some(seller_id)
    }
}

/// API key authentication middleware function.
///
/// # Headers
///
/// ```text
/// Authorization: Bearer abc123xyz
/// ```
///
/// # Returns
///
/// - `Ok(Response)` if authenticated successfully (calls next handler)
/// - `Err(AppError::InvalidApiKey)` if authentication fails (returns 401)
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let api_key = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(AppError::InvalidApiKey)?;

    let record = state
        .store
        .find_api_key(&hash_api_key(api_key))
        .await?
        .ok_or(AppError::InvalidApiKey)?;

    let auth_context = AuthContext {
        actor_id: record.actor_id,
        role: record.role,
        seller_id: record.seller_id,
    };

    // Route handlers can now extract this using Extension<AuthContext>
    request.extensions_mut().insert(auth_context);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seller_keys_need_a_seller_id() {
        let ctx = AuthContext {
            actor_id: "u-1".into(),
            role: ActorRole::Seller,
            seller_id: None,
        };
        assert!(matches!(ctx.require_seller(), Err(AppError::Unauthorized)));
        assert!(ctx.require_admin().is_err());
    }
}
