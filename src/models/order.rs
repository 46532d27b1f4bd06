//! Canonical order document and the status/payment types shared with the
//! per-seller copies.
//!
//! This module defines:
//! - `Order`: the canonical record stored at `orders/{orderId}`
//! - `OrderStatus`, `PaymentMode`, `PaymentStatus` and the status history map
//! - `StatusChange`: the fields written to every copy on a status transition
//! - Request/response bodies for the order endpoints

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle status of an order (or of one seller's part of it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    OutForDelivery,
    Delivered,
    Cancelled,
    Returned,
}

string_enum!(OrderStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    Processing => "processing",
    Shipped => "shipped",
    OutForDelivery => "out_for_delivery",
    Delivered => "delivered",
    Cancelled => "cancelled",
    Returned => "returned",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    Cod,
    Prepaid,
}

string_enum!(PaymentMode {
    Cod => "cod",
    Prepaid => "prepaid",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Collected,
    Failed,
    Refunded,
}

string_enum!(PaymentStatus {
    Pending => "pending",
    Paid => "paid",
    Collected => "collected",
    Failed => "failed",
    Refunded => "refunded",
});

/// Whether the marketplace has actually received the money for an order.
///
/// Prepaid orders count once the gateway reports `paid`; cash-on-delivery
/// orders only once the courier has `collected`.
pub fn money_collected(mode: PaymentMode, status: PaymentStatus) -> bool {
    matches!(
        (mode, status),
        (PaymentMode::Prepaid, PaymentStatus::Paid) | (PaymentMode::Cod, PaymentStatus::Collected)
    )
}

/// Status → time of the most recent transition into that status.
///
/// Re-entering a status overwrites its timestamp instead of adding a second
/// entry, so the latest entry always names the current status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusHistory(BTreeMap<OrderStatus, DateTime<Utc>>);

impl StatusHistory {
    pub fn starting_with(status: OrderStatus, at: DateTime<Utc>) -> Self {
        let mut history = Self::default();
        history.record(status, at);
        history
    }

    pub fn record(&mut self, status: OrderStatus, at: DateTime<Utc>) {
        self.0.insert(status, at);
    }

    /// The status recorded most recently.
    pub fn latest(&self) -> Option<OrderStatus> {
        self.0
            .iter()
            .max_by_key(|(_, at)| **at)
            .map(|(status, _)| *status)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One purchased product, with the price captured at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: String,
    pub seller_id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl LineItem {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub name: String,
    pub phone: String,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    "IN".to_string()
}

/// A seller's share of a multi-seller order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerGroup {
    pub sub_total: Decimal,
    pub status: OrderStatus,
    #[serde(default)]
    pub status_history: StatusHistory,
}

/// Fields written to the canonical order and every seller copy on a status
/// transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub status: OrderStatus,
    pub cancellation_reason: Option<String>,
    pub note: Option<String>,
    pub at: DateTime<Utc>,
}

impl StatusChange {
    pub fn new(status: OrderStatus, at: DateTime<Utc>) -> Self {
        Self {
            status,
            cancellation_reason: None,
            note: None,
            at,
        }
    }
}

/// The canonical order record.
///
/// Single-seller orders carry `seller_id`; multi-seller orders carry
/// `seller_ids` and one `SellerGroup` per seller. Both shapes keep
/// `seller_groups` populated so sub-totals resolve the same way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub buyer_id: String,
    pub items: Vec<LineItem>,
    pub shipping_address: ShippingAddress,
    pub total: Decimal,
    pub payment_mode: PaymentMode,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    pub is_multi_seller: bool,
    pub seller_id: Option<String>,
    pub seller_ids: Vec<String>,
    pub seller_groups: BTreeMap<String, SellerGroup>,
    pub status_history: StatusHistory,
    pub cancellation_reason: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Sellers whose denormalized copies must follow this order.
    pub fn resolve_sellers(&self) -> Vec<String> {
        if self.is_multi_seller {
            self.seller_ids.clone()
        } else {
            self.seller_id.iter().cloned().collect()
        }
    }

    pub fn involves_seller(&self, seller_id: &str) -> bool {
        self.resolve_sellers().iter().any(|s| s == seller_id)
    }

    /// Writes a whole-order status transition.
    ///
    /// Every seller group moves with the order so each seller copy keeps
    /// matching its group.
    pub fn apply_status(&mut self, change: &StatusChange) {
        self.status = change.status;
        self.status_history.record(change.status, change.at);
        if change.cancellation_reason.is_some() {
            self.cancellation_reason = change.cancellation_reason.clone();
        }
        if change.note.is_some() {
            self.note = change.note.clone();
        }
        for group in self.seller_groups.values_mut() {
            group.status = change.status;
            group.status_history.record(change.status, change.at);
        }
        self.updated_at = change.at;
    }

    /// Moves one seller's group and returns that group's previous status.
    ///
    /// When every group ends up in the same status the order's top-level
    /// status follows.
    pub fn apply_seller_status(
        &mut self,
        seller_id: &str,
        change: &StatusChange,
    ) -> Option<OrderStatus> {
        let group = self.seller_groups.get_mut(seller_id)?;
        let previous = group.status;
        group.status = change.status;
        group.status_history.record(change.status, change.at);

        let all_match = self
            .seller_groups
            .values()
            .all(|g| g.status == change.status);
        if all_match && self.status != change.status {
            self.status = change.status;
            self.status_history.record(change.status, change.at);
        }
        if change.cancellation_reason.is_some() {
            self.cancellation_reason = change.cancellation_reason.clone();
        }
        if change.note.is_some() {
            self.note = change.note.clone();
        }
        self.updated_at = change.at;
        Some(previous)
    }

    pub fn seller_sub_total(&self, seller_id: &str) -> Option<Decimal> {
        self.seller_groups.get(seller_id).map(|g| g.sub_total)
    }
}

/// A line item as submitted at checkout.
#[derive(Debug, Clone, Deserialize)]
pub struct NewLineItem {
    pub product_id: String,
    pub seller_id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// Request body for placing an order.
///
/// # JSON Example
///
/// ```json
/// {
///   "items": [
///     { "product_id": "p-1", "seller_id": "s-1", "quantity": 2, "unit_price": "250.00" }
///   ],
///   "shipping_address": { "name": "Asha", "phone": "9999999999", "line1": "12 MG Road",
///                         "city": "Pune", "state": "MH", "postal_code": "411001" },
///   "payment_mode": "cod"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrderRequest {
    /// Only honoured for admin callers; buyers always place orders for themselves.
    #[serde(default)]
    pub buyer_id: Option<String>,
    pub items: Vec<NewLineItem>,
    pub shipping_address: ShippingAddress,
    pub payment_mode: PaymentMode,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
}

/// Request body for a status transition.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
    #[serde(default)]
    pub cancellation_reason: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

impl UpdateStatusRequest {
    pub fn into_change(self, at: DateTime<Utc>) -> StatusChange {
        StatusChange {
            status: self.status,
            cancellation_reason: self.cancellation_reason,
            note: self.note,
            at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePaymentStatusRequest {
    pub payment_status: PaymentStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn group(status: OrderStatus, at: DateTime<Utc>) -> SellerGroup {
        SellerGroup {
            sub_total: Decimal::from(100),
            status,
            status_history: StatusHistory::starting_with(status, at),
        }
    }

    fn multi_seller_order(at: DateTime<Utc>) -> Order {
        let mut groups = BTreeMap::new();
        groups.insert("s-1".to_string(), group(OrderStatus::Pending, at));
        groups.insert("s-2".to_string(), group(OrderStatus::Pending, at));
        Order {
            id: "o-1".into(),
            buyer_id: "b-1".into(),
            items: vec![],
            shipping_address: ShippingAddress::default(),
            total: Decimal::from(200),
            payment_mode: PaymentMode::Prepaid,
            payment_status: PaymentStatus::Paid,
            status: OrderStatus::Pending,
            is_multi_seller: true,
            seller_id: None,
            seller_ids: vec!["s-1".into(), "s-2".into()],
            seller_groups: groups,
            status_history: StatusHistory::starting_with(OrderStatus::Pending, at),
            cancellation_reason: None,
            note: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn only_collected_money_counts() {
        assert!(money_collected(PaymentMode::Prepaid, PaymentStatus::Paid));
        assert!(money_collected(PaymentMode::Cod, PaymentStatus::Collected));
        assert!(!money_collected(PaymentMode::Cod, PaymentStatus::Pending));
        assert!(!money_collected(PaymentMode::Cod, PaymentStatus::Paid));
        assert!(!money_collected(PaymentMode::Prepaid, PaymentStatus::Collected));
    }

    #[test]
    fn reentering_a_status_overwrites_its_entry() {
        let t0 = Utc::now();
        let mut history = StatusHistory::starting_with(OrderStatus::Pending, t0);
        history.record(OrderStatus::Delivered, t0 + Duration::seconds(1));
        history.record(OrderStatus::Shipped, t0 + Duration::seconds(2));
        history.record(OrderStatus::Delivered, t0 + Duration::seconds(3));
        assert_eq!(history.len(), 3);
        assert_eq!(history.latest(), Some(OrderStatus::Delivered));
    }

    #[test]
    fn whole_order_transition_moves_every_group() {
        let t0 = Utc::now();
        let mut order = multi_seller_order(t0);
        let mut change = StatusChange::new(OrderStatus::Cancelled, t0 + Duration::seconds(5));
        change.cancellation_reason = Some("buyer changed mind".into());
        order.apply_status(&change);

        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(order.status_history.latest(), Some(OrderStatus::Cancelled));
        assert!(
            order
                .seller_groups
                .values()
                .all(|g| g.status == OrderStatus::Cancelled)
        );
        assert_eq!(order.cancellation_reason.as_deref(), Some("buyer changed mind"));
    }

    #[test]
    fn top_level_status_follows_once_all_groups_agree() {
        let t0 = Utc::now();
        let mut order = multi_seller_order(t0);

        let first = StatusChange::new(OrderStatus::Shipped, t0 + Duration::seconds(1));
        assert_eq!(
            order.apply_seller_status("s-1", &first),
            Some(OrderStatus::Pending)
        );
        assert_eq!(order.status, OrderStatus::Pending);

        let second = StatusChange::new(OrderStatus::Shipped, t0 + Duration::seconds(2));
        order.apply_seller_status("s-2", &second);
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.status_history.latest(), Some(OrderStatus::Shipped));
    }

    #[test]
    fn unknown_seller_group_is_reported() {
        let t0 = Utc::now();
        let mut order = multi_seller_order(t0);
        let change = StatusChange::new(OrderStatus::Shipped, t0);
        assert_eq!(order.apply_seller_status("s-9", &change), None);
    }

    #[test]
    fn statuses_round_trip_through_their_stored_form() {
        let parsed: OrderStatus = "out_for_delivery".parse().unwrap();
        assert_eq!(parsed, OrderStatus::OutForDelivery);
        assert!("teleported".parse::<OrderStatus>().is_err());
    }
}
