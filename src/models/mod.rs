//! Data models representing stored documents and API payloads.
//!
//! Each submodule maps to one logical collection (see `store` for how the
//! collections are laid out in Postgres and in memory).

/// Implements `as_str`, `Display` and `FromStr` for a fieldless enum whose
/// stored form is a lowercase string.
macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::error::AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(crate::error::AppError::InvalidArgument(format!(
                        "Unknown {} '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

/// API key / actor model
pub mod api_key;
/// Money rounding helpers
pub mod money;
/// Canonical order documents
pub mod order;
/// Seller profiles (read-only collaborator)
pub mod seller;
/// Denormalized per-seller order copies
pub mod seller_order;
/// Wallet counters and ledger entries
pub mod wallet;
/// Withdrawal requests and commission breakdowns
pub mod withdrawal;
