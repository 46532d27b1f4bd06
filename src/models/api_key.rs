//! API Key model for authentication.
//!
//! Every caller presents an API key. Keys are stored as SHA-256 hashes and
//! resolve to an actor: a buyer, a seller (bound to one seller id) or an admin.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
    Buyer,
    Seller,
    Admin,
}

string_enum!(ActorRole {
    Buyer => "buyer",
    Seller => "seller",
    Admin => "admin",
});

/// SHA-256 of a raw API key, hex encoded. Only the hash is ever stored.
pub fn hash_api_key(api_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Represents an API key record.
///
/// # Database Table
///
/// Maps to the `api_keys` table with columns:
/// - `key_hash`: SHA-256 hash of the actual API key (primary key)
/// - `actor_id`: buyer/seller/admin identifier the key acts as
/// - `role`: `buyer`, `seller` or `admin`
/// - `seller_id`: the seller a `seller` key manages
/// - `is_active`: whether the key is currently valid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKey {
    /// SHA-256 hash of the actual API key (64 hex characters)
    pub key_hash: String,

    pub actor_id: String,

    pub role: ActorRole,

    pub seller_id: Option<String>,

    /// Inactive keys are rejected during authentication.
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
}

/// Request body for issuing a new API key.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueApiKeyRequest {
    pub actor_id: String,
    pub role: ActorRole,
    /// Required for `seller` keys.
    #[serde(default)]
    pub seller_id: Option<String>,
}

/// A freshly issued key. The raw key is only ever returned here.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedApiKey {
    pub api_key: String,
    pub actor_id: String,
    pub role: ActorRole,
    pub seller_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_hex_sha256() {
        let hash = hash_api_key("secret");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "2bb80d537b1da3e38bd30361aa855686bde0eacd7162fef6a25fe97bf527a25b"
        );
    }

    #[test]
    fn roles_parse_from_their_stored_form() {
        assert_eq!("seller".parse::<ActorRole>().unwrap(), ActorRole::Seller);
        assert!("owner".parse::<ActorRole>().is_err());
    }
}
