//! Order service - checkout and status transitions.
//!
//! The canonical order is always written first. Seller copies and wallet
//! settlement follow as side effects: a missing or failing seller copy is
//! logged and skipped, and a failed settlement never undoes the status
//! change. Settlement is idempotent per order, so it can be re-driven.

use std::collections::BTreeMap;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        money::round_money,
        order::{
            LineItem, Order, OrderStatus, PaymentStatus, PlaceOrderRequest, SellerGroup,
            StatusChange, StatusHistory,
        },
        seller_order::SellerOrder,
    },
    services::wallet_service::{self, SettlementOutcome},
    store::Store,
};

/// What happened to one seller while a status change was propagated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "sync", rename_all = "snake_case")]
pub enum SellerSync {
    /// The seller has no denormalized copy of the order.
    Missing,
    /// Writing the seller copy failed.
    CopyFailed,
    /// The copy was updated and settlement ran.
    Synced { settlement: SettlementOutcome },
    /// The copy was updated but settlement failed.
    SettlementFailed,
}

#[derive(Debug, Clone, Serialize)]
pub struct SellerSyncReport {
    pub seller_id: String,
    #[serde(flatten)]
    pub sync: SellerSync,
}

/// Result of a status transition.
#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdate {
    pub order: Order,
    /// Status before the transition (the seller group's, for per-seller moves).
    pub previous_status: OrderStatus,
    pub sellers: Vec<SellerSyncReport>,
}

/// Validates a checkout request and writes the order with one copy per seller.
///
/// # Errors
///
/// - `InvalidArgument`: no items, a zero quantity, a negative price, or a
///   missing buyer/product/seller id
pub async fn place_order(
    store: &dyn Store,
    buyer_id: &str,
    request: PlaceOrderRequest,
) -> Result<Order, AppError> {
    if buyer_id.trim().is_empty() {
        return Err(AppError::invalid_argument("Buyer ID is required"));
    }
    if request.items.is_empty() {
        return Err(AppError::invalid_argument(
            "An order needs at least one item",
        ));
    }

    let mut items = Vec::with_capacity(request.items.len());
    for item in request.items {
        if item.product_id.trim().is_empty() || item.seller_id.trim().is_empty() {
            return Err(AppError::invalid_argument(
                "Every item needs a product ID and a seller ID",
            ));
        }
        if item.quantity == 0 {
            return Err(AppError::invalid_argument(format!(
                "Quantity for product {} must be at least 1",
                item.product_id
            )));
        }
        if item.unit_price < Decimal::ZERO {
            return Err(AppError::invalid_argument(format!(
                "Price for product {} must not be negative",
                item.product_id
            )));
        }
        items.push(LineItem {
            product_id: item.product_id,
            seller_id: item.seller_id,
            title: item.title,
            quantity: item.quantity,
            unit_price: round_money(item.unit_price),
        });
    }

    let mut sub_totals: BTreeMap<String, Decimal> = BTreeMap::new();
    for item in &items {
        *sub_totals.entry(item.seller_id.clone()).or_default() += item.line_total();
    }
    let total = round_money(sub_totals.values().copied().sum());

    let now = Utc::now();
    let seller_ids: Vec<String> = sub_totals.keys().cloned().collect();
    let is_multi_seller = seller_ids.len() > 1;
    let seller_groups = sub_totals
        .into_iter()
        .map(|(seller_id, sub_total)| {
            let group = SellerGroup {
                sub_total: round_money(sub_total),
                status: OrderStatus::Pending,
                status_history: StatusHistory::starting_with(OrderStatus::Pending, now),
            };
            (seller_id, group)
        })
        .collect();

    let order = Order {
        id: Uuid::new_v4().to_string(),
        buyer_id: buyer_id.to_string(),
        items,
        shipping_address: request.shipping_address,
        total,
        payment_mode: request.payment_mode,
        payment_status: request.payment_status.unwrap_or(PaymentStatus::Pending),
        status: OrderStatus::Pending,
        is_multi_seller,
        seller_id: if is_multi_seller {
            None
        } else {
            seller_ids.first().cloned()
        },
        seller_ids,
        seller_groups,
        status_history: StatusHistory::starting_with(OrderStatus::Pending, now),
        cancellation_reason: None,
        note: None,
        created_at: now,
        updated_at: now,
    };

    let copies: Vec<SellerOrder> = order
        .resolve_sellers()
        .iter()
        .map(|seller_id| SellerOrder::from_order(&order, seller_id))
        .collect();
    store.insert_order(&order, &copies).await?;

    tracing::info!(
        order_id = %order.id,
        buyer_id = %order.buyer_id,
        total = %order.total,
        sellers = order.seller_ids.len(),
        "order placed"
    );
    Ok(order)
}

pub async fn fetch_order(store: &dyn Store, order_id: &str) -> Result<Order, AppError> {
    store
        .fetch_order(order_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {order_id}")))
}

/// A seller's copies, newest first.
pub async fn list_seller_orders(
    store: &dyn Store,
    seller_id: &str,
    status: Option<OrderStatus>,
) -> Result<Vec<SellerOrder>, AppError> {
    store.list_seller_orders(seller_id, status).await
}

/// Moves the whole order (and every seller group) to `change.status`, then
/// syncs each seller copy and runs wallet settlement for it.
pub async fn update_order_status(
    store: &dyn Store,
    order_id: &str,
    change: StatusChange,
) -> Result<StatusUpdate, AppError> {
    let mut previous = None;
    let order = store
        .modify_order(order_id, &mut |order| {
            previous = Some(order.status);
            order.apply_status(&change);
            Ok(())
        })
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {order_id}")))?;
    let previous_status = previous.unwrap_or(order.status);

    tracing::info!(
        order_id,
        from = %previous_status,
        to = %change.status,
        "order status updated"
    );

    let sellers = order.resolve_sellers();
    let reports = sync_and_settle(store, &order, &sellers, &change, previous_status).await;

    Ok(StatusUpdate {
        order,
        previous_status,
        sellers: reports,
    })
}

/// Moves one seller's group of a (usually multi-seller) order.
///
/// The order's top-level status follows once every group has reached the
/// same status. Settlement uses the group's previous status.
pub async fn update_seller_status(
    store: &dyn Store,
    order_id: &str,
    seller_id: &str,
    change: StatusChange,
) -> Result<StatusUpdate, AppError> {
    let mut previous = None;
    let order = store
        .modify_order(order_id, &mut |order| {
            previous = order.apply_seller_status(seller_id, &change);
            if previous.is_none() {
                return Err(AppError::not_found(format!(
                    "Seller {seller_id} on order {order_id}"
                )));
            }
            Ok(())
        })
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {order_id}")))?;
    let previous_status = previous.unwrap_or(change.status);

    tracing::info!(
        order_id,
        seller_id,
        from = %previous_status,
        to = %change.status,
        order_status = %order.status,
        "seller group status updated"
    );

    let sellers = [seller_id.to_string()];
    let reports = sync_and_settle(store, &order, &sellers, &change, previous_status).await;

    Ok(StatusUpdate {
        order,
        previous_status,
        sellers: reports,
    })
}

/// Records a payment status change on the order and every seller copy.
///
/// Never credits a wallet by itself; settlement only runs on a transition
/// into `delivered`.
pub async fn update_payment_status(
    store: &dyn Store,
    order_id: &str,
    payment_status: PaymentStatus,
) -> Result<Order, AppError> {
    let now = Utc::now();
    let order = store
        .modify_order(order_id, &mut |order| {
            order.payment_status = payment_status;
            order.updated_at = now;
            Ok(())
        })
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {order_id}")))?;

    tracing::info!(order_id, %payment_status, "payment status updated");

    let sellers = order.resolve_sellers();
    write_seller_copies(store, order_id, &sellers, |copy| {
        copy.apply_payment_status(payment_status, now)
    })
    .await;

    Ok(order)
}

/// Writes the same change into each seller's copy of an order.
///
/// One store call per seller; failures are logged and reported, never
/// propagated.
async fn write_seller_copies<F>(
    store: &dyn Store,
    order_id: &str,
    sellers: &[String],
    apply: F,
) -> Vec<(String, Result<SellerOrder, SellerSync>)>
where
    F: Fn(&mut SellerOrder) + Send + Sync,
{
    let mut results = Vec::with_capacity(sellers.len());
    for seller_id in sellers {
        let written = store
            .modify_seller_order(seller_id, order_id, &mut |copy| {
                apply(copy);
                Ok(())
            })
            .await;

        let result = match written {
            Ok(Some(copy)) => Ok(copy),
            Ok(None) => {
                tracing::warn!(order_id, seller_id = %seller_id, "seller order copy missing, skipping");
                Err(SellerSync::Missing)
            }
            Err(err) => {
                tracing::error!(
                    order_id,
                    seller_id = %seller_id,
                    error = %err,
                    "failed to update seller order copy"
                );
                Err(SellerSync::CopyFailed)
            }
        };
        results.push((seller_id.clone(), result));
    }
    results
}

async fn sync_and_settle(
    store: &dyn Store,
    order: &Order,
    sellers: &[String],
    change: &StatusChange,
    previous_status: OrderStatus,
) -> Vec<SellerSyncReport> {
    let written = write_seller_copies(store, &order.id, sellers, |copy| copy.apply_status(change)).await;

    let mut reports = Vec::with_capacity(written.len());
    for (seller_id, result) in written {
        let sync = match result {
            Ok(copy) => match wallet_service::settle_delivered_order(
                store,
                &seller_id,
                &order.id,
                change.status,
                previous_status,
                &copy,
            )
            .await
            {
                Ok(settlement) => SellerSync::Synced { settlement },
                Err(err) => {
                    tracing::error!(
                        order_id = %order.id,
                        seller_id = %seller_id,
                        error = %err,
                        "wallet settlement failed"
                    );
                    SellerSync::SettlementFailed
                }
            },
            Err(sync) => sync,
        };
        reports.push(SellerSyncReport { seller_id, sync });
    }
    reports
}
