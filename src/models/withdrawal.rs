//! Withdrawal request documents (`withdrawalRequests/{requestId}`).
//!
//! # Lifecycle
//!
//! ```text
//! pending ──► approved ──► processing ──► paid
//!    │            │             │
//!    │            └─────────────┴──► rejected
//!    ├──► rejected
//!    └──► cancelled   (seller, while pending)
//! ```
//!
//! `rejected`, `paid` and `cancelled` are terminal.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::seller::{BankDetails, SellerProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Rejected,
    Processing,
    Paid,
    Cancelled,
}

string_enum!(WithdrawalStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
    Processing => "processing",
    Paid => "paid",
    Cancelled => "cancelled",
});

impl WithdrawalStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WithdrawalStatus::Rejected | WithdrawalStatus::Paid | WithdrawalStatus::Cancelled
        )
    }

    pub fn can_transition_to(&self, next: WithdrawalStatus) -> bool {
        use WithdrawalStatus::*;
        matches!(
            (self, next),
            (Pending, Approved)
                | (Pending, Rejected)
                | (Pending, Cancelled)
                | (Approved, Processing)
                | (Approved, Rejected)
                | (Processing, Paid)
                | (Processing, Rejected)
        )
    }
}

/// Commission and GST deducted from a withdrawal. All amounts are rounded to 2 dp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionBreakdown {
    pub gross_amount: Decimal,
    pub commission_rate: Decimal,
    pub commission_amount: Decimal,
    pub gst_on_commission: Decimal,
    pub total_deduction: Decimal,
    pub net_payable: Decimal,
}

/// Seller display info captured when the request is created, so later
/// profile edits don't rewrite an in-flight request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerSnapshot {
    pub display_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub store_name: Option<String>,
}

impl From<&SellerProfile> for SellerSnapshot {
    fn from(profile: &SellerProfile) -> Self {
        Self {
            display_name: profile.display_name.clone(),
            email: profile.email.clone(),
            phone: profile.phone.clone(),
            store_name: profile.store_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub id: Uuid,
    pub seller_id: String,
    pub breakdown: CommissionBreakdown,
    pub bank_details: BankDetails,
    pub seller: SellerSnapshot,
    pub status: WithdrawalStatus,
    /// The gross amount is currently held against the seller's wallet.
    pub wallet_debited: bool,
    pub rejection_reason: Option<String>,
    pub admin_note: Option<String>,
    pub payout_reference: Option<String>,
    pub processed_by: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WithdrawalRequest {
    pub fn amount(&self) -> Decimal {
        self.breakdown.gross_amount
    }
}

/// Fields written by an admin (or seller-cancel) transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalTransition {
    pub to: WithdrawalStatus,
    pub processed_by: Option<String>,
    pub wallet_debited: Option<bool>,
    pub rejection_reason: Option<String>,
    pub admin_note: Option<String>,
    pub payout_reference: Option<String>,
    pub at: DateTime<Utc>,
}

impl WithdrawalTransition {
    pub fn to(status: WithdrawalStatus, at: DateTime<Utc>) -> Self {
        Self {
            to: status,
            processed_by: None,
            wallet_debited: None,
            rejection_reason: None,
            admin_note: None,
            payout_reference: None,
            at,
        }
    }

    pub fn by(mut self, actor_id: &str) -> Self {
        self.processed_by = Some(actor_id.to_string());
        self
    }
}

impl WithdrawalRequest {
    pub fn apply_transition(&mut self, transition: &WithdrawalTransition) {
        self.status = transition.to;
        if let Some(actor) = &transition.processed_by {
            self.processed_by = Some(actor.clone());
            self.processed_at = Some(transition.at);
        }
        if let Some(debited) = transition.wallet_debited {
            self.wallet_debited = debited;
        }
        if transition.rejection_reason.is_some() {
            self.rejection_reason = transition.rejection_reason.clone();
        }
        if transition.admin_note.is_some() {
            self.admin_note = transition.admin_note.clone();
        }
        if transition.payout_reference.is_some() {
            self.payout_reference = transition.payout_reference.clone();
        }
        self.updated_at = transition.at;
    }
}

/// Optional filters for listing requests.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WithdrawalFilter {
    #[serde(default)]
    pub seller_id: Option<String>,
    #[serde(default)]
    pub status: Option<WithdrawalStatus>,
}

impl WithdrawalFilter {
    pub fn matches(&self, request: &WithdrawalRequest) -> bool {
        self.seller_id
            .as_deref()
            .is_none_or(|seller| seller == request.seller_id)
            && self.status.is_none_or(|status| status == request.status)
    }
}

/// Request body for creating a withdrawal (or previewing its breakdown).
#[derive(Debug, Clone, Deserialize)]
pub struct CreateWithdrawalRequest {
    #[serde(default)]
    pub amount: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminActionRequest {
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RejectWithdrawalRequest {
    pub reason: String,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarkPaidRequest {
    #[serde(default)]
    pub payout_reference: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use WithdrawalStatus::*;

    #[test]
    fn terminal_states_accept_no_transitions() {
        let all = [Pending, Approved, Rejected, Processing, Paid, Cancelled];
        for from in [Rejected, Paid, Cancelled] {
            assert!(from.is_terminal());
            for to in all {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn only_pending_requests_can_be_cancelled() {
        assert!(Pending.can_transition_to(Cancelled));
        assert!(!Approved.can_transition_to(Cancelled));
        assert!(!Processing.can_transition_to(Cancelled));
    }

    #[test]
    fn payment_requires_processing_first() {
        assert!(!Pending.can_transition_to(Paid));
        assert!(!Approved.can_transition_to(Paid));
        assert!(Processing.can_transition_to(Paid));
    }
}
