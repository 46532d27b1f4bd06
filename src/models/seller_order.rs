//! Denormalized per-seller order copy (`sellerOrders/{sellerId}/orders/{orderId}`).
//!
//! The copy exists so a seller's "my orders" view needs no join against the
//! canonical `orders` collection. It carries only that seller's line items and
//! sub-total.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::order::{
    LineItem, Order, OrderStatus, PaymentMode, PaymentStatus, StatusChange, StatusHistory,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerOrder {
    pub order_id: String,
    pub seller_id: String,
    pub buyer_id: String,
    pub items: Vec<LineItem>,
    /// The seller's share of the order total; the wallet credit amount.
    pub seller_total: Option<Decimal>,
    pub payment_mode: PaymentMode,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    pub status_history: StatusHistory,
    pub cancellation_reason: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SellerOrder {
    /// Builds the copy for `seller_id` from a freshly placed order.
    pub fn from_order(order: &Order, seller_id: &str) -> Self {
        let items = order
            .items
            .iter()
            .filter(|item| item.seller_id == seller_id)
            .cloned()
            .collect();
        let (status, status_history) = match order.seller_groups.get(seller_id) {
            Some(group) => (group.status, group.status_history.clone()),
            None => (order.status, order.status_history.clone()),
        };
        Self {
            order_id: order.id.clone(),
            seller_id: seller_id.to_string(),
            buyer_id: order.buyer_id.clone(),
            items,
            seller_total: order.seller_sub_total(seller_id),
            payment_mode: order.payment_mode,
            payment_status: order.payment_status,
            status,
            status_history,
            cancellation_reason: order.cancellation_reason.clone(),
            note: order.note.clone(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }

    pub fn apply_status(&mut self, change: &StatusChange) {
        self.status = change.status;
        self.status_history.record(change.status, change.at);
        if change.cancellation_reason.is_some() {
            self.cancellation_reason = change.cancellation_reason.clone();
        }
        if change.note.is_some() {
            self.note = change.note.clone();
        }
        self.updated_at = change.at;
    }

    pub fn apply_payment_status(&mut self, payment_status: PaymentStatus, at: DateTime<Utc>) {
        self.payment_status = payment_status;
        self.updated_at = at;
    }
}
