//! Application configuration management.
//!
//! Configuration is loaded from environment variables with the `envy` crate,
//! which deserializes them into a type-safe struct.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Which store implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required for the postgres backend)
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `STORAGE_BACKEND` (optional): `postgres` or `memory`, defaults to `postgres`
/// - `DB_MAX_CONNECTIONS` (optional): pool size, defaults to 5
/// - `MIN_WITHDRAWAL_AMOUNT` (optional): smallest withdrawal a seller may request, defaults to 100
/// - `DEFAULT_COMMISSION_RATE` (optional): percent used when a seller profile has no rate, defaults to 10
/// - `BOOTSTRAP_ADMIN_KEY` (optional): raw admin API key registered at startup
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: Option<String>,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_backend")]
    pub storage_backend: StorageBackend,

    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,

    #[serde(default = "default_min_withdrawal")]
    pub min_withdrawal_amount: Decimal,

    #[serde(default = "default_commission_rate")]
    pub default_commission_rate: Decimal,

    #[serde(default)]
    pub bootstrap_admin_key: Option<String>,
}

fn default_port() -> u16 {
    3000
}

fn default_backend() -> StorageBackend {
    StorageBackend::Postgres
}

fn default_max_connections() -> u32 {
    5
}

fn default_min_withdrawal() -> Decimal {
    Decimal::ONE_HUNDRED
}

fn default_commission_rate() -> Decimal {
    Decimal::TEN
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file is loaded first when present.
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be parsed into its expected type.
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();

        // Field names are converted automatically: server_port -> SERVER_PORT
        envy::from_env::<Config>()
    }

    /// The business rules the services need, split off from transport settings.
    pub fn policy(&self) -> SettlementPolicy {
        SettlementPolicy {
            min_withdrawal_amount: self.min_withdrawal_amount,
            default_commission_rate: self.default_commission_rate,
        }
    }
}

/// Tunable rules shared by the withdrawal services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementPolicy {
    pub min_withdrawal_amount: Decimal,
    pub default_commission_rate: Decimal,
}

impl Default for SettlementPolicy {
    fn default() -> Self {
        Self {
            min_withdrawal_amount: default_min_withdrawal(),
            default_commission_rate: default_commission_rate(),
        }
    }
}
