//! HTTP middleware components.
//!
//! Middleware are functions that run before route handlers.

/// API key authentication middleware
pub mod auth;
