//! Seller settlement service.
//!
//! Order status transitions, seller wallet accounting and the withdrawal
//! lifecycle for a multi-seller marketplace, served as a JSON API.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (`app::router`)
//! - **Storage**: `store::Store`, backed by PostgreSQL (sqlx) or memory
//! - **Authentication**: API key with SHA-256 hashing
//! - **Money**: `rust_decimal`, rounded to 2 dp

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;
