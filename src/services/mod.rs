//! Business logic services.
//!
//! Services contain the settlement rules, separated from HTTP handlers.
//! Each one takes a `&dyn Store` so it runs unchanged against Postgres or
//! the in-memory store.

/// API keys and seller profiles
pub mod admin_service;
/// Commission/GST calculator and withdrawal validation
pub mod commission;
/// Checkout, status transitions and seller copy sync
pub mod order_service;
/// Wallet settlement and ledger operations
pub mod wallet_service;
/// Withdrawal request lifecycle
pub mod withdrawal_service;
