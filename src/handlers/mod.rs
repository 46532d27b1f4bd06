//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, the caller's `AuthContext`)
//! 2. Checks the caller may touch the resource and calls a service
//! 3. Returns HTTP response (JSON, status code)

/// Actor and seller profile administration
pub mod admin;
/// Health check endpoint
pub mod health;
/// Order placement and status endpoints
pub mod orders;
/// Wallet endpoints
pub mod wallet;
/// Withdrawal endpoints
pub mod withdrawals;
