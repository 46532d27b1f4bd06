//! Storage abstraction for the settlement collections.
//!
//! Services never talk to a database handle directly. They receive a
//! `&dyn Store` (the HTTP layer holds an `Arc<dyn Store>`), so tests can run
//! against `MemoryStore` and production against `PgStore`.
//!
//! # Collections
//!
//! | Logical path                                   | Postgres table        |
//! |------------------------------------------------|-----------------------|
//! | `orders/{orderId}`                             | `orders`              |
//! | `sellerOrders/{sellerId}/orders/{orderId}`     | `seller_orders`       |
//! | `sellerWallet/{sellerId}`                      | `seller_wallets`      |
//! | `sellerWallet/{sellerId}/transactions/{auto}`  | `wallet_transactions` |
//! | `withdrawalRequests/{requestId}`               | `withdrawal_requests` |
//! | `sellers/{sellerId}`                           | `sellers`             |
//!
//! # Atomicity
//!
//! Every method is one atomic unit: a single Postgres transaction, or a
//! single write-lock section in memory. The `modify_*` methods load a
//! document, hand it to the caller's closure, and persist the result only if
//! the closure returns `Ok`.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        api_key::ApiKey,
        order::{Order, OrderStatus},
        seller::SellerProfile,
        seller_order::SellerOrder,
        wallet::{LedgerPosting, NewWalletTransaction, Wallet, WalletTransaction},
        withdrawal::{WithdrawalFilter, WithdrawalRequest},
    },
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// In-place mutation applied to a loaded document inside the store's atomic section.
pub type Mutator<'a, T> = dyn FnMut(&mut T) -> Result<(), AppError> + Send + 'a;

/// Like [`Mutator`], but may hand back a ledger entry to post in the same atomic section.
pub type LedgerMutator<'a, T> =
    dyn FnMut(&mut T) -> Result<Option<NewWalletTransaction>, AppError> + Send + 'a;

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Writes the canonical order and all of its seller copies together.
    async fn insert_order(&self, order: &Order, seller_orders: &[SellerOrder])
    -> Result<(), AppError>;

    async fn fetch_order(&self, order_id: &str) -> Result<Option<Order>, AppError>;

    /// Returns the updated order, or `None` if it does not exist.
    async fn modify_order(
        &self,
        order_id: &str,
        mutate: &mut Mutator<'_, Order>,
    ) -> Result<Option<Order>, AppError>;

    async fn fetch_seller_order(
        &self,
        seller_id: &str,
        order_id: &str,
    ) -> Result<Option<SellerOrder>, AppError>;

    /// Returns the updated copy, or `None` if the seller has no copy of this order.
    async fn modify_seller_order(
        &self,
        seller_id: &str,
        order_id: &str,
        mutate: &mut Mutator<'_, SellerOrder>,
    ) -> Result<Option<SellerOrder>, AppError>;

    /// Newest first.
    async fn list_seller_orders(
        &self,
        seller_id: &str,
        status: Option<OrderStatus>,
    ) -> Result<Vec<SellerOrder>, AppError>;
}

#[async_trait]
pub trait WalletStore: Send + Sync {
    async fn fetch_wallet(&self, seller_id: &str) -> Result<Option<Wallet>, AppError>;

    /// Creates the wallet at zero if needed, applies the entry's counter
    /// deltas as increments, and appends the entry.
    ///
    /// If the entry's idempotency key was already used for this seller the
    /// existing entry is returned with `duplicate = true` and nothing changes.
    /// Fails with `InsufficientBalance` if the balance would go negative.
    async fn post_ledger_entry(&self, entry: NewWalletTransaction)
    -> Result<LedgerPosting, AppError>;

    /// Newest first.
    async fn list_wallet_transactions(
        &self,
        seller_id: &str,
    ) -> Result<Vec<WalletTransaction>, AppError>;
}

#[async_trait]
pub trait WithdrawalStore: Send + Sync {
    /// Inserts a new pending request. Fails with `InvalidState` if the seller
    /// already has a pending request at write time.
    async fn insert_withdrawal(&self, request: &WithdrawalRequest) -> Result<(), AppError>;

    async fn fetch_withdrawal(&self, id: Uuid) -> Result<Option<WithdrawalRequest>, AppError>;

    async fn find_pending_withdrawal(
        &self,
        seller_id: &str,
    ) -> Result<Option<WithdrawalRequest>, AppError>;

    /// Newest first.
    async fn list_withdrawals(
        &self,
        filter: &WithdrawalFilter,
    ) -> Result<Vec<WithdrawalRequest>, AppError>;

    async fn modify_withdrawal(
        &self,
        id: Uuid,
        mutate: &mut Mutator<'_, WithdrawalRequest>,
    ) -> Result<Option<WithdrawalRequest>, AppError>;

    /// Mutates a request and posts the ledger entry the closure returns, all
    /// or nothing. The entry follows the rules of
    /// [`WalletStore::post_ledger_entry`]; if posting fails the request is
    /// left untouched.
    async fn modify_withdrawal_with_ledger(
        &self,
        id: Uuid,
        mutate: &mut LedgerMutator<'_, WithdrawalRequest>,
    ) -> Result<Option<(WithdrawalRequest, Option<LedgerPosting>)>, AppError>;
}

#[async_trait]
pub trait SellerStore: Send + Sync {
    async fn fetch_seller(&self, seller_id: &str) -> Result<Option<SellerProfile>, AppError>;

    async fn upsert_seller(&self, profile: &SellerProfile) -> Result<(), AppError>;
}

#[async_trait]
pub trait ActorStore: Send + Sync {
    async fn find_api_key(&self, key_hash: &str) -> Result<Option<ApiKey>, AppError>;

    async fn insert_api_key(&self, key: &ApiKey) -> Result<(), AppError>;

    /// Connectivity check for the health endpoint.
    async fn ping(&self) -> Result<(), AppError>;
}

/// Everything the settlement services need from a backend.
pub trait Store: OrderStore + WalletStore + WithdrawalStore + SellerStore + ActorStore {}

impl<T> Store for T where T: OrderStore + WalletStore + WithdrawalStore + SellerStore + ActorStore {}
