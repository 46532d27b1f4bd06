//! Seller wallet counters and the append-only ledger.
//!
//! This module defines:
//! - `Wallet`: the four counters stored at `sellerWallet/{sellerId}`
//! - `WalletTransaction`: one immutable ledger entry
//! - `NewWalletTransaction`: a ledger entry about to be posted, and the
//!   counter deltas it implies
//!
//! Counter effects per entry type:
//!
//! | type         | total_earnings | total_withdrawn | available_balance | lifetime_revenue |
//! |--------------|----------------|-----------------|-------------------|------------------|
//! | `earning`    | +amount        |                 | +amount           | +amount          |
//! | `withdrawal` |                | +net            | -gross            |                  |
//! | `refund`     |                | -net            | +gross            |                  |
//! | `adjustment` | +amount        |                 | +amount           |                  |

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Wallet {
    pub seller_id: String,
    pub total_earnings: Decimal,
    pub total_withdrawn: Decimal,
    /// Never negative.
    pub available_balance: Decimal,
    pub lifetime_revenue: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// The default-zero wallet a seller starts with.
    pub fn empty(seller_id: &str, at: DateTime<Utc>) -> Self {
        Self {
            seller_id: seller_id.to_string(),
            total_earnings: Decimal::ZERO,
            total_withdrawn: Decimal::ZERO,
            available_balance: Decimal::ZERO,
            lifetime_revenue: Decimal::ZERO,
            updated_at: at,
        }
    }

    /// Applies the counter deltas of `entry`, refusing anything that would
    /// leave the available balance negative.
    pub fn apply(&mut self, entry: &NewWalletTransaction) -> Result<(), AppError> {
        let delta = entry.delta();
        if self.available_balance + delta.available_balance < Decimal::ZERO {
            return Err(AppError::InsufficientBalance);
        }
        self.total_earnings += delta.total_earnings;
        self.total_withdrawn += delta.total_withdrawn;
        self.available_balance += delta.available_balance;
        self.lifetime_revenue += delta.lifetime_revenue;
        self.updated_at = entry.created_at;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Earning,
    Withdrawal,
    Refund,
    Adjustment,
}

string_enum!(TransactionType {
    Earning => "earning",
    Withdrawal => "withdrawal",
    Refund => "refund",
    Adjustment => "adjustment",
});

/// Signed change to each wallet counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalletDelta {
    pub total_earnings: Decimal,
    pub total_withdrawn: Decimal,
    pub available_balance: Decimal,
    pub lifetime_revenue: Decimal,
}

/// A ledger entry that has been posted. Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: Uuid,
    pub seller_id: String,
    pub transaction_type: TransactionType,
    /// Gross amount moved (signed for adjustments).
    pub amount: Decimal,
    /// Net payout for withdrawals and refunds.
    pub net_amount: Option<Decimal>,
    /// Order id or withdrawal request id this entry came from.
    pub reference_id: Option<String>,
    pub description: Option<String>,
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A ledger entry waiting to be posted together with its counter update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWalletTransaction {
    pub seller_id: String,
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub net_amount: Option<Decimal>,
    pub reference_id: Option<String>,
    pub description: Option<String>,
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewWalletTransaction {
    fn base(seller_id: &str, transaction_type: TransactionType, amount: Decimal) -> Self {
        Self {
            seller_id: seller_id.to_string(),
            transaction_type,
            amount,
            net_amount: None,
            reference_id: None,
            description: None,
            idempotency_key: None,
            created_at: Utc::now(),
        }
    }

    /// Sale proceeds for a delivered order.
    pub fn earning(seller_id: &str, order_id: &str, amount: Decimal) -> Self {
        let mut entry = Self::base(seller_id, TransactionType::Earning, amount);
        entry.reference_id = Some(order_id.to_string());
        entry.idempotency_key = Some(format!("earning:{order_id}"));
        entry.description = Some(format!("Earnings for order {order_id}"));
        entry
    }

    /// Payout of an approved withdrawal: `gross` leaves the balance, `net`
    /// is what the seller receives.
    pub fn withdrawal(seller_id: &str, request_id: Uuid, gross: Decimal, net: Decimal) -> Self {
        let mut entry = Self::base(seller_id, TransactionType::Withdrawal, gross);
        entry.net_amount = Some(net);
        entry.reference_id = Some(request_id.to_string());
        entry.idempotency_key = Some(format!("withdrawal:{request_id}"));
        entry.description = Some(format!("Withdrawal {request_id}"));
        entry
    }

    /// Compensates a withdrawal that was debited and then rejected.
    pub fn refund(seller_id: &str, request_id: Uuid, gross: Decimal, net: Decimal) -> Self {
        let mut entry = Self::base(seller_id, TransactionType::Refund, gross);
        entry.net_amount = Some(net);
        entry.reference_id = Some(request_id.to_string());
        entry.idempotency_key = Some(format!("refund:{request_id}"));
        entry.description = Some(format!("Refund of rejected withdrawal {request_id}"));
        entry
    }

    /// Manual correction by an admin; `amount` may be negative.
    pub fn adjustment(seller_id: &str, amount: Decimal, description: Option<String>) -> Self {
        let mut entry = Self::base(seller_id, TransactionType::Adjustment, amount);
        entry.description = description;
        entry
    }

    pub fn delta(&self) -> WalletDelta {
        let net = self.net_amount.unwrap_or(self.amount);
        match self.transaction_type {
            TransactionType::Earning => WalletDelta {
                total_earnings: self.amount,
                available_balance: self.amount,
                lifetime_revenue: self.amount,
                ..Default::default()
            },
            TransactionType::Withdrawal => WalletDelta {
                total_withdrawn: net,
                available_balance: -self.amount,
                ..Default::default()
            },
            TransactionType::Refund => WalletDelta {
                total_withdrawn: -net,
                available_balance: self.amount,
                ..Default::default()
            },
            TransactionType::Adjustment => WalletDelta {
                total_earnings: self.amount,
                available_balance: self.amount,
                ..Default::default()
            },
        }
    }

    pub fn into_transaction(self, id: Uuid) -> WalletTransaction {
        WalletTransaction {
            id,
            seller_id: self.seller_id,
            transaction_type: self.transaction_type,
            amount: self.amount,
            net_amount: self.net_amount,
            reference_id: self.reference_id,
            description: self.description,
            idempotency_key: self.idempotency_key,
            created_at: self.created_at,
        }
    }
}

/// Result of posting a ledger entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerPosting {
    pub wallet: Wallet,
    pub transaction: WalletTransaction,
    /// The idempotency key had already been used; nothing was changed.
    pub duplicate: bool,
}

/// Request body for an admin wallet adjustment.
#[derive(Debug, Clone, Deserialize)]
pub struct AdjustmentRequest {
    pub amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn earning_moves_three_counters() {
        let mut wallet = Wallet::empty("s-1", Utc::now());
        wallet
            .apply(&NewWalletTransaction::earning("s-1", "o-1", Decimal::from(500)))
            .unwrap();
        assert_eq!(wallet.total_earnings, Decimal::from(500));
        assert_eq!(wallet.available_balance, Decimal::from(500));
        assert_eq!(wallet.lifetime_revenue, Decimal::from(500));
        assert_eq!(wallet.total_withdrawn, Decimal::ZERO);
    }

    #[test]
    fn withdrawal_then_refund_restores_the_wallet() {
        let mut wallet = Wallet::empty("s-1", Utc::now());
        wallet
            .apply(&NewWalletTransaction::earning("s-1", "o-1", Decimal::from(1000)))
            .unwrap();
        let before = wallet.clone();
        let id = Uuid::new_v4();

        wallet
            .apply(&NewWalletTransaction::withdrawal(
                "s-1",
                id,
                Decimal::from(1000),
                Decimal::from(882),
            ))
            .unwrap();
        assert_eq!(wallet.available_balance, Decimal::ZERO);
        assert_eq!(wallet.total_withdrawn, Decimal::from(882));

        wallet
            .apply(&NewWalletTransaction::refund(
                "s-1",
                id,
                Decimal::from(1000),
                Decimal::from(882),
            ))
            .unwrap();
        assert_eq!(wallet.available_balance, before.available_balance);
        assert_eq!(wallet.total_withdrawn, before.total_withdrawn);
    }

    #[test]
    fn overdraft_is_refused_without_side_effects() {
        let mut wallet = Wallet::empty("s-1", Utc::now());
        let snapshot = wallet.clone();
        let err = wallet
            .apply(&NewWalletTransaction::adjustment(
                "s-1",
                Decimal::from(-1),
                None,
            ))
            .unwrap_err();
        assert!(matches!(err, AppError::InsufficientBalance));
        assert_eq!(wallet, snapshot);
    }
}
