//! Wallet service - settlement credits and ledger operations.
//!
//! Counter changes always go through `WalletStore::post_ledger_entry`, which
//! applies the increments and appends the ledger entry in one atomic unit.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    error::AppError,
    models::{
        money::round_money,
        order::{OrderStatus, money_collected},
        seller_order::SellerOrder,
        wallet::{AdjustmentRequest, LedgerPosting, NewWalletTransaction, Wallet, WalletTransaction},
    },
    store::Store,
};

/// Why a settlement did not credit the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The transition is not the first one into `delivered`.
    NotFirstDelivery,
    /// The seller sub-total is missing or not positive.
    NoSubTotal,
    /// The buyer's money has not been received yet.
    PaymentNotCollected,
    /// An earning for this order was already posted.
    AlreadyCredited,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SettlementOutcome {
    Credited { amount: Decimal },
    Skipped { reason: SkipReason },
}

impl SettlementOutcome {
    fn skipped(reason: SkipReason) -> Self {
        SettlementOutcome::Skipped { reason }
    }
}

/// Credits a seller's wallet for an order that just reached `delivered`.
///
/// Returns `Skipped` unless all of these hold:
/// - `new_status` is `delivered` and `previous_status` is not
/// - the seller copy carries a positive sub-total
/// - the order's money has been collected (`prepaid`+`paid` or `cod`+`collected`)
///
/// The earning is posted under the key `earning:{order_id}`, so a second
/// call for the same order never credits twice even if the status guard is
/// bypassed.
pub async fn settle_delivered_order(
    store: &dyn Store,
    seller_id: &str,
    order_id: &str,
    new_status: OrderStatus,
    previous_status: OrderStatus,
    seller_order: &SellerOrder,
) -> Result<SettlementOutcome, AppError> {
    if new_status != OrderStatus::Delivered || previous_status == OrderStatus::Delivered {
        return Ok(SettlementOutcome::skipped(SkipReason::NotFirstDelivery));
    }

    let amount = match seller_order.seller_total {
        Some(total) if total > Decimal::ZERO => round_money(total),
        _ => {
            tracing::warn!(
                seller_id,
                order_id,
                "delivered order has no seller sub-total, skipping wallet credit"
            );
            return Ok(SettlementOutcome::skipped(SkipReason::NoSubTotal));
        }
    };

    if !money_collected(seller_order.payment_mode, seller_order.payment_status) {
        tracing::info!(
            seller_id,
            order_id,
            payment_mode = %seller_order.payment_mode,
            payment_status = %seller_order.payment_status,
            "payment not collected yet, skipping wallet credit"
        );
        return Ok(SettlementOutcome::skipped(SkipReason::PaymentNotCollected));
    }

    let posting = store
        .post_ledger_entry(NewWalletTransaction::earning(seller_id, order_id, amount))
        .await?;

    if posting.duplicate {
        tracing::info!(seller_id, order_id, "order already credited");
        return Ok(SettlementOutcome::skipped(SkipReason::AlreadyCredited));
    }

    tracing::info!(
        seller_id,
        order_id,
        %amount,
        available_balance = %posting.wallet.available_balance,
        "wallet credited"
    );
    Ok(SettlementOutcome::Credited { amount })
}

/// The seller's counters, or an all-zero wallet if nothing was posted yet.
pub async fn get_wallet(store: &dyn Store, seller_id: &str) -> Result<Wallet, AppError> {
    Ok(store
        .fetch_wallet(seller_id)
        .await?
        .unwrap_or_else(|| Wallet::empty(seller_id, chrono::Utc::now())))
}

/// Ledger entries, newest first.
pub async fn list_transactions(
    store: &dyn Store,
    seller_id: &str,
) -> Result<Vec<WalletTransaction>, AppError> {
    store.list_wallet_transactions(seller_id).await
}

/// Posts a signed manual correction.
///
/// # Errors
///
/// - `InvalidArgument`: the amount is zero after rounding
/// - `InsufficientBalance`: a negative amount would overdraw the wallet
pub async fn post_adjustment(
    store: &dyn Store,
    seller_id: &str,
    request: AdjustmentRequest,
) -> Result<LedgerPosting, AppError> {
    let amount = round_money(request.amount);
    if amount.is_zero() {
        return Err(AppError::invalid_argument(
            "Adjustment amount must not be zero",
        ));
    }

    let posting = store
        .post_ledger_entry(NewWalletTransaction::adjustment(
            seller_id,
            amount,
            request.description,
        ))
        .await?;

    tracing::info!(
        seller_id,
        %amount,
        available_balance = %posting.wallet.available_balance,
        "wallet adjusted"
    );
    Ok(posting)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::order::{PaymentMode, PaymentStatus, StatusHistory},
        store::{MemoryStore, WalletStore},
    };
    use chrono::Utc;

    fn seller_order(mode: PaymentMode, status: PaymentStatus, total: Option<i64>) -> SellerOrder {
        let now = Utc::now();
        SellerOrder {
            order_id: "o-1".into(),
            seller_id: "s-1".into(),
            buyer_id: "b-1".into(),
            items: vec![],
            seller_total: total.map(Decimal::from),
            payment_mode: mode,
            payment_status: status,
            status: OrderStatus::Delivered,
            status_history: StatusHistory::starting_with(OrderStatus::Delivered, now),
            cancellation_reason: None,
            note: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn prepaid_paid_delivery_credits_once() {
        let store = MemoryStore::new();
        let copy = seller_order(PaymentMode::Prepaid, PaymentStatus::Paid, Some(750));

        let first = settle_delivered_order(
            &store,
            "s-1",
            "o-1",
            OrderStatus::Delivered,
            OrderStatus::OutForDelivery,
            &copy,
        )
        .await
        .unwrap();
        assert_eq!(
            first,
            SettlementOutcome::Credited {
                amount: Decimal::from(750)
            }
        );

        let again = settle_delivered_order(
            &store,
            "s-1",
            "o-1",
            OrderStatus::Delivered,
            OrderStatus::Delivered,
            &copy,
        )
        .await
        .unwrap();
        assert_eq!(again, SettlementOutcome::skipped(SkipReason::NotFirstDelivery));

        let wallet = get_wallet(&store, "s-1").await.unwrap();
        assert_eq!(wallet.available_balance, Decimal::from(750));
        assert_eq!(wallet.lifetime_revenue, Decimal::from(750));
    }

    #[tokio::test]
    async fn cod_pending_is_not_credited() {
        let store = MemoryStore::new();
        let copy = seller_order(PaymentMode::Cod, PaymentStatus::Pending, Some(300));
        let outcome = settle_delivered_order(
            &store,
            "s-1",
            "o-1",
            OrderStatus::Delivered,
            OrderStatus::Shipped,
            &copy,
        )
        .await
        .unwrap();
        assert_eq!(outcome, SettlementOutcome::skipped(SkipReason::PaymentNotCollected));
        assert!(store.fetch_wallet("s-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_sub_total_is_skipped() {
        let store = MemoryStore::new();
        let copy = seller_order(PaymentMode::Prepaid, PaymentStatus::Paid, None);
        let outcome = settle_delivered_order(
            &store,
            "s-1",
            "o-1",
            OrderStatus::Delivered,
            OrderStatus::Shipped,
            &copy,
        )
        .await
        .unwrap();
        assert_eq!(outcome, SettlementOutcome::skipped(SkipReason::NoSubTotal));
    }

    #[tokio::test]
    async fn bypassing_the_status_guard_still_credits_once() {
        let store = MemoryStore::new();
        let copy = seller_order(PaymentMode::Cod, PaymentStatus::Collected, Some(200));
        for _ in 0..2 {
            settle_delivered_order(
                &store,
                "s-1",
                "o-1",
                OrderStatus::Delivered,
                OrderStatus::Shipped,
                &copy,
            )
            .await
            .unwrap();
        }
        let wallet = get_wallet(&store, "s-1").await.unwrap();
        assert_eq!(wallet.total_earnings, Decimal::from(200));
        assert_eq!(list_transactions(&store, "s-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn zero_adjustment_is_rejected() {
        let store = MemoryStore::new();
        let err = post_adjustment(
            &store,
            "s-1",
            AdjustmentRequest {
                amount: Decimal::new(1, 3),
                description: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn negative_adjustment_cannot_overdraw() {
        let store = MemoryStore::new();
        post_adjustment(
            &store,
            "s-1",
            AdjustmentRequest {
                amount: Decimal::from(40),
                description: Some("goodwill".into()),
            },
        )
        .await
        .unwrap();
        let err = post_adjustment(
            &store,
            "s-1",
            AdjustmentRequest {
                amount: Decimal::from(-41),
                description: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::InsufficientBalance));
        assert_eq!(
            get_wallet(&store, "s-1").await.unwrap().available_balance,
            Decimal::from(40)
        );
    }
}
