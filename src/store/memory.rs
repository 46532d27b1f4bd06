//! In-memory store.
//!
//! All collections sit behind one `RwLock`, so each trait method is atomic
//! with respect to every other. Used by the test suites and by
//! `STORAGE_BACKEND=memory` for local runs.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        api_key::ApiKey,
        order::{Order, OrderStatus},
        seller::SellerProfile,
        seller_order::SellerOrder,
        wallet::{LedgerPosting, NewWalletTransaction, Wallet, WalletTransaction},
        withdrawal::{WithdrawalFilter, WithdrawalRequest, WithdrawalStatus},
    },
    store::{
        ActorStore, LedgerMutator, Mutator, OrderStore, SellerStore, WalletStore,
        WithdrawalStore,
    },
};

#[derive(Default)]
struct Collections {
    orders: HashMap<String, Order>,
    seller_orders: HashMap<(String, String), SellerOrder>,
    wallets: HashMap<String, Wallet>,
    transactions: Vec<WalletTransaction>,
    withdrawals: HashMap<Uuid, WithdrawalRequest>,
    sellers: HashMap<String, SellerProfile>,
    api_keys: HashMap<String, ApiKey>,
}

impl Collections {
    /// Validates `entry` against the current wallet and returns the posting
    /// it would produce, without changing anything.
    fn stage_entry(&self, entry: NewWalletTransaction) -> Result<LedgerPosting, AppError> {
        let wallet = self
            .wallets
            .get(&entry.seller_id)
            .cloned()
            .unwrap_or_else(|| Wallet::empty(&entry.seller_id, entry.created_at));

        if let Some(key) = &entry.idempotency_key {
            let existing = self
                .transactions
                .iter()
                .find(|t| t.seller_id == entry.seller_id && t.idempotency_key.as_ref() == Some(key));
            if let Some(transaction) = existing {
                return Ok(LedgerPosting {
                    wallet,
                    transaction: transaction.clone(),
                    duplicate: true,
                });
            }
        }

        let mut wallet = wallet;
        wallet.apply(&entry)?;
        Ok(LedgerPosting {
            wallet,
            transaction: entry.into_transaction(Uuid::new_v4()),
            duplicate: false,
        })
    }

    fn commit_entry(&mut self, posting: &LedgerPosting) {
        if posting.duplicate {
            return;
        }
        self.wallets
            .insert(posting.wallet.seller_id.clone(), posting.wallet.clone());
        self.transactions.push(posting.transaction.clone());
    }
}

/// Faults that tests can switch on to exercise error isolation.
#[derive(Default)]
struct Faults {
    ledger: bool,
    /// Sellers whose order copies refuse writes.
    seller_orders: HashSet<String>,
    withdrawals: bool,
}

#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<Collections>,
    faults: RwLock<Faults>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every `post_ledger_entry` call fail.
    pub async fn set_fail_on_ledger(&self, fail: bool) {
        self.faults.write().await.ledger = fail;
    }

    /// Makes `modify_seller_order` fail for one seller's copies.
    pub async fn set_fail_on_seller_orders(&self, seller_id: &str, fail: bool) {
        let mut faults = self.faults.write().await;
        if fail {
            faults.seller_orders.insert(seller_id.to_string());
        } else {
            faults.seller_orders.remove(seller_id);
        }
    }

    /// Makes every withdrawal write fail once its other effects are staged.
    pub async fn set_fail_on_withdrawals(&self, fail: bool) {
        self.faults.write().await.withdrawals = fail;
    }

    /// Removes one seller copy, simulating a missing denormalized record.
    pub async fn remove_seller_order(&self, seller_id: &str, order_id: &str) {
        self.data
            .write()
            .await
            .seller_orders
            .remove(&(seller_id.to_string(), order_id.to_string()));
    }
}

fn injected(what: &str) -> AppError {
    AppError::Storage(format!("injected {what} failure"))
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(
        &self,
        order: &Order,
        seller_orders: &[SellerOrder],
    ) -> Result<(), AppError> {
        let mut data = self.data.write().await;
        if data.orders.contains_key(&order.id) {
            return Err(AppError::invalid_state(format!(
                "Order {} already exists",
                order.id
            )));
        }
        data.orders.insert(order.id.clone(), order.clone());
        for copy in seller_orders {
            data.seller_orders.insert(
                (copy.seller_id.clone(), copy.order_id.clone()),
                copy.clone(),
            );
        }
        Ok(())
    }

    async fn fetch_order(&self, order_id: &str) -> Result<Option<Order>, AppError> {
        Ok(self.data.read().await.orders.get(order_id).cloned())
    }

    async fn modify_order(
        &self,
        order_id: &str,
        mutate: &mut Mutator<'_, Order>,
    ) -> Result<Option<Order>, AppError> {
        let mut data = self.data.write().await;
        let Some(stored) = data.orders.get_mut(order_id) else {
            return Ok(None);
        };
        let mut order = stored.clone();
        mutate(&mut order)?;
        *stored = order.clone();
        Ok(Some(order))
    }

    async fn fetch_seller_order(
        &self,
        seller_id: &str,
        order_id: &str,
    ) -> Result<Option<SellerOrder>, AppError> {
        let key = (seller_id.to_string(), order_id.to_string());
        Ok(self.data.read().await.seller_orders.get(&key).cloned())
    }

    async fn modify_seller_order(
        &self,
        seller_id: &str,
        order_id: &str,
        mutate: &mut Mutator<'_, SellerOrder>,
    ) -> Result<Option<SellerOrder>, AppError> {
        if self.faults.read().await.seller_orders.contains(seller_id) {
            return Err(injected("seller order"));
        }
        let key = (seller_id.to_string(), order_id.to_string());
        let mut data = self.data.write().await;
        let Some(stored) = data.seller_orders.get_mut(&key) else {
            return Ok(None);
        };
        let mut copy = stored.clone();
        mutate(&mut copy)?;
        *stored = copy.clone();
        Ok(Some(copy))
    }

    async fn list_seller_orders(
        &self,
        seller_id: &str,
        status: Option<OrderStatus>,
    ) -> Result<Vec<SellerOrder>, AppError> {
        let data = self.data.read().await;
        let mut orders: Vec<SellerOrder> = data
            .seller_orders
            .values()
            .filter(|o| o.seller_id == seller_id)
            .filter(|o| status.is_none_or(|s| s == o.status))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}

#[async_trait]
impl WalletStore for MemoryStore {
    async fn fetch_wallet(&self, seller_id: &str) -> Result<Option<Wallet>, AppError> {
        Ok(self.data.read().await.wallets.get(seller_id).cloned())
    }

    async fn post_ledger_entry(
        &self,
        entry: NewWalletTransaction,
    ) -> Result<LedgerPosting, AppError> {
        if self.faults.read().await.ledger {
            return Err(injected("ledger"));
        }
        let mut data = self.data.write().await;
        let posting = data.stage_entry(entry)?;
        data.commit_entry(&posting);
        Ok(posting)
    }

    async fn list_wallet_transactions(
        &self,
        seller_id: &str,
    ) -> Result<Vec<WalletTransaction>, AppError> {
        let data = self.data.read().await;
        // Appended in posting order, so reversing gives newest first.
        Ok(data
            .transactions
            .iter()
            .rev()
            .filter(|t| t.seller_id == seller_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl WithdrawalStore for MemoryStore {
    async fn insert_withdrawal(&self, request: &WithdrawalRequest) -> Result<(), AppError> {
        let mut data = self.data.write().await;
        let has_pending = data
            .withdrawals
            .values()
            .any(|w| w.seller_id == request.seller_id && w.status == WithdrawalStatus::Pending);
        if has_pending {
            return Err(AppError::invalid_state(
                "Seller already has a pending withdrawal request",
            ));
        }
        data.withdrawals.insert(request.id, request.clone());
        Ok(())
    }

    async fn fetch_withdrawal(&self, id: Uuid) -> Result<Option<WithdrawalRequest>, AppError> {
        Ok(self.data.read().await.withdrawals.get(&id).cloned())
    }

    async fn find_pending_withdrawal(
        &self,
        seller_id: &str,
    ) -> Result<Option<WithdrawalRequest>, AppError> {
        let data = self.data.read().await;
        Ok(data
            .withdrawals
            .values()
            .find(|w| w.seller_id == seller_id && w.status == WithdrawalStatus::Pending)
            .cloned())
    }

    async fn list_withdrawals(
        &self,
        filter: &WithdrawalFilter,
    ) -> Result<Vec<WithdrawalRequest>, AppError> {
        let data = self.data.read().await;
        let mut requests: Vec<WithdrawalRequest> = data
            .withdrawals
            .values()
            .filter(|w| filter.matches(w))
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn modify_withdrawal(
        &self,
        id: Uuid,
        mutate: &mut Mutator<'_, WithdrawalRequest>,
    ) -> Result<Option<WithdrawalRequest>, AppError> {
        let fail_write = self.faults.read().await.withdrawals;
        let mut data = self.data.write().await;
        let Some(stored) = data.withdrawals.get_mut(&id) else {
            return Ok(None);
        };
        let mut request = stored.clone();
        mutate(&mut request)?;
        if fail_write {
            return Err(injected("withdrawal"));
        }
        *stored = request.clone();
        Ok(Some(request))
    }

    async fn modify_withdrawal_with_ledger(
        &self,
        id: Uuid,
        mutate: &mut LedgerMutator<'_, WithdrawalRequest>,
    ) -> Result<Option<(WithdrawalRequest, Option<LedgerPosting>)>, AppError> {
        let (fail_ledger, fail_write) = {
            let faults = self.faults.read().await;
            (faults.ledger, faults.withdrawals)
        };
        let mut data = self.data.write().await;
        let Some(mut request) = data.withdrawals.get(&id).cloned() else {
            return Ok(None);
        };

        let posting = match mutate(&mut request)? {
            Some(_) if fail_ledger => return Err(injected("ledger")),
            Some(entry) => Some(data.stage_entry(entry)?),
            None => None,
        };
        if fail_write {
            return Err(injected("withdrawal"));
        }

        if let Some(posting) = &posting {
            data.commit_entry(posting);
        }
        data.withdrawals.insert(id, request.clone());
        Ok(Some((request, posting)))
    }
}

#[async_trait]
impl SellerStore for MemoryStore {
    async fn fetch_seller(&self, seller_id: &str) -> Result<Option<SellerProfile>, AppError> {
        Ok(self.data.read().await.sellers.get(seller_id).cloned())
    }

    async fn upsert_seller(&self, profile: &SellerProfile) -> Result<(), AppError> {
        self.data
            .write()
            .await
            .sellers
            .insert(profile.id.clone(), profile.clone());
        Ok(())
    }
}

#[async_trait]
impl ActorStore for MemoryStore {
    async fn find_api_key(&self, key_hash: &str) -> Result<Option<ApiKey>, AppError> {
        Ok(self
            .data
            .read()
            .await
            .api_keys
            .get(key_hash)
            .filter(|k| k.is_active)
            .cloned())
    }

    async fn insert_api_key(&self, key: &ApiKey) -> Result<(), AppError> {
        self.data
            .write()
            .await
            .api_keys
            .insert(key.key_hash.clone(), key.clone());
        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn duplicate_idempotency_key_changes_nothing() {
        let store = MemoryStore::new();
        let first = store
            .post_ledger_entry(NewWalletTransaction::earning("s-1", "o-1", Decimal::from(500)))
            .await
            .unwrap();
        assert!(!first.duplicate);

        let second = store
            .post_ledger_entry(NewWalletTransaction::earning("s-1", "o-1", Decimal::from(500)))
            .await
            .unwrap();
        assert!(second.duplicate);
        assert_eq!(second.transaction.id, first.transaction.id);
        assert_eq!(second.wallet.available_balance, Decimal::from(500));
        assert_eq!(store.list_wallet_transactions("s-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_mutation_leaves_document_untouched() {
        let store = MemoryStore::new();
        store
            .post_ledger_entry(NewWalletTransaction::earning("s-1", "o-1", Decimal::from(10)))
            .await
            .unwrap();
        let err = store
            .post_ledger_entry(NewWalletTransaction::adjustment(
                "s-1",
                Decimal::from(-11),
                None,
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InsufficientBalance));
        let wallet = store.fetch_wallet("s-1").await.unwrap().unwrap();
        assert_eq!(wallet.available_balance, Decimal::from(10));
        assert_eq!(store.list_wallet_transactions("s-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn inactive_keys_are_not_found() {
        let store = MemoryStore::new();
        store
            .insert_api_key(&ApiKey {
                key_hash: "abc".into(),
                actor_id: "admin-1".into(),
                role: crate::models::api_key::ActorRole::Admin,
                seller_id: None,
                is_active: false,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        assert!(store.find_api_key("abc").await.unwrap().is_none());
    }
}
