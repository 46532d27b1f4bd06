//! Withdrawal service - request creation and the admin settlement lifecycle.
//!
//! # Wallet effects
//!
//! - **approve**: debits the gross amount (`withdrawal:{id}` ledger entry)
//! - **reject** after approval: credits it back (`refund:{id}` ledger entry)
//!
//! Every transition re-checks the current status inside the store's atomic
//! section, so two admins acting on the same request cannot both succeed.

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    config::SettlementPolicy,
    error::AppError,
    models::{
        seller::SellerProfile,
        wallet::NewWalletTransaction,
        withdrawal::{
            AdminActionRequest, CommissionBreakdown, CreateWithdrawalRequest, MarkPaidRequest,
            RejectWithdrawalRequest, SellerSnapshot, WithdrawalFilter, WithdrawalRequest,
            WithdrawalStatus, WithdrawalTransition,
        },
    },
    services::{commission, wallet_service},
    store::Store,
};

fn request_not_found(id: Uuid) -> AppError {
    AppError::not_found(format!("Withdrawal request {id}"))
}

fn ensure_transition(from: WithdrawalStatus, to: WithdrawalStatus) -> Result<(), AppError> {
    if from.can_transition_to(to) {
        Ok(())
    } else if from.is_terminal() {
        Err(AppError::invalid_state(format!(
            "Withdrawal request is already {from}"
        )))
    } else {
        Err(AppError::invalid_state(format!(
            "Cannot move a {from} withdrawal request to {to}"
        )))
    }
}

/// Applies `transition` if the request's current status allows it.
async fn transition(
    store: &dyn Store,
    id: Uuid,
    step: &WithdrawalTransition,
) -> Result<WithdrawalRequest, AppError> {
    store
        .modify_withdrawal(id, &mut |request| {
            ensure_transition(request.status, step.to)?;
            request.apply_transition(step);
            Ok(())
        })
        .await?
        .ok_or_else(|| request_not_found(id))
}

async fn commission_rate(
    store: &dyn Store,
    policy: &SettlementPolicy,
    seller_id: &str,
) -> Result<(SellerProfile, Decimal), AppError> {
    let seller = store
        .fetch_seller(seller_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Seller {seller_id}")))?;
    let rate = seller.commission.unwrap_or(policy.default_commission_rate);
    Ok((seller, rate))
}

/// Breakdown for a prospective amount at the seller's own commission rate.
/// Nothing is written.
pub async fn preview(
    store: &dyn Store,
    policy: &SettlementPolicy,
    seller_id: &str,
    amount: Option<Decimal>,
) -> Result<CommissionBreakdown, AppError> {
    let (_, rate) = commission_rate(store, policy, seller_id).await?;
    let amount = amount.ok_or_else(|| AppError::invalid_argument("Amount is required"))?;
    commission::calculate_commission(amount, rate)
}

/// Creates a pending request.
///
/// # Errors
///
/// - `NotFound`: no seller profile
/// - `InvalidArgument`: validation failed or the profile has no bank details
/// - `InsufficientBalance`: the amount exceeds the available balance
/// - `InvalidState`: the seller already has a pending request
pub async fn create(
    store: &dyn Store,
    policy: &SettlementPolicy,
    seller_id: &str,
    request: CreateWithdrawalRequest,
) -> Result<WithdrawalRequest, AppError> {
    let (seller, rate) = commission_rate(store, policy, seller_id).await?;
    let wallet = wallet_service::get_wallet(store, seller_id).await?;

    let amount = commission::validate_withdrawal_request(
        Some(seller_id),
        request.amount,
        wallet.available_balance,
        policy.min_withdrawal_amount,
    )?;

    if store.find_pending_withdrawal(seller_id).await?.is_some() {
        return Err(AppError::invalid_state(
            "Seller already has a pending withdrawal request",
        ));
    }

    let bank_details = seller.bank_details.clone().ok_or_else(|| {
        AppError::invalid_argument("Add bank details before requesting a withdrawal")
    })?;
    let breakdown = commission::calculate_commission(amount, rate)?;

    let now = Utc::now();
    let withdrawal = WithdrawalRequest {
        id: Uuid::new_v4(),
        seller_id: seller_id.to_string(),
        breakdown,
        bank_details,
        seller: SellerSnapshot::from(&seller),
        status: WithdrawalStatus::Pending,
        wallet_debited: false,
        rejection_reason: None,
        admin_note: None,
        payout_reference: None,
        processed_by: None,
        processed_at: None,
        created_at: now,
        updated_at: now,
    };
    // The store re-checks the pending condition at write time.
    store.insert_withdrawal(&withdrawal).await?;

    tracing::info!(
        withdrawal_id = %withdrawal.id,
        seller_id,
        gross = %breakdown.gross_amount,
        net = %breakdown.net_payable,
        "withdrawal requested"
    );
    Ok(withdrawal)
}

/// Seller self-cancel, only while pending.
pub async fn cancel(
    store: &dyn Store,
    seller_id: &str,
    id: Uuid,
) -> Result<WithdrawalRequest, AppError> {
    let cancellation = WithdrawalTransition::to(WithdrawalStatus::Cancelled, Utc::now());
    let request = store
        .modify_withdrawal(id, &mut |request| {
            if request.seller_id != seller_id {
                return Err(AppError::Unauthorized);
            }
            if request.status != WithdrawalStatus::Pending {
                return Err(AppError::invalid_state(
                    "Only pending withdrawal requests can be cancelled",
                ));
            }
            request.apply_transition(&cancellation);
            Ok(())
        })
        .await?
        .ok_or_else(|| request_not_found(id))?;

    tracing::info!(withdrawal_id = %id, seller_id, "withdrawal cancelled");
    Ok(request)
}

/// `pending -> approved`, debiting the gross amount from the wallet.
///
/// The status change and the debit are one atomic store operation: if the
/// balance no longer covers the amount, or either write fails, nothing
/// changes.
pub async fn approve(
    store: &dyn Store,
    id: Uuid,
    admin_id: &str,
    action: AdminActionRequest,
) -> Result<WithdrawalRequest, AppError> {
    let mut approval = WithdrawalTransition::to(WithdrawalStatus::Approved, Utc::now()).by(admin_id);
    approval.wallet_debited = Some(true);
    approval.admin_note = action.note;

    let (request, posting) = store
        .modify_withdrawal_with_ledger(id, &mut |request| {
            ensure_transition(request.status, WithdrawalStatus::Approved)?;
            request.apply_transition(&approval);
            Ok(Some(NewWalletTransaction::withdrawal(
                &request.seller_id,
                id,
                request.breakdown.gross_amount,
                request.breakdown.net_payable,
            )))
        })
        .await?
        .ok_or_else(|| request_not_found(id))?;

    tracing::info!(
        withdrawal_id = %id,
        seller_id = %request.seller_id,
        admin_id,
        debited = %request.amount(),
        available_balance = ?posting.map(|p| p.wallet.available_balance),
        "withdrawal approved"
    );
    Ok(request)
}

/// `approved -> processing`.
pub async fn process(
    store: &dyn Store,
    id: Uuid,
    admin_id: &str,
    action: AdminActionRequest,
) -> Result<WithdrawalRequest, AppError> {
    let mut step = WithdrawalTransition::to(WithdrawalStatus::Processing, Utc::now()).by(admin_id);
    step.admin_note = action.note;
    let request = transition(store, id, &step).await?;
    tracing::info!(withdrawal_id = %id, admin_id, "withdrawal processing");
    Ok(request)
}

/// `processing -> paid`.
pub async fn mark_paid(
    store: &dyn Store,
    id: Uuid,
    admin_id: &str,
    action: MarkPaidRequest,
) -> Result<WithdrawalRequest, AppError> {
    let mut step = WithdrawalTransition::to(WithdrawalStatus::Paid, Utc::now()).by(admin_id);
    step.payout_reference = action.payout_reference;
    step.admin_note = action.note;
    let request = transition(store, id, &step).await?;
    tracing::info!(
        withdrawal_id = %id,
        admin_id,
        payout_reference = request.payout_reference.as_deref().unwrap_or("-"),
        "withdrawal paid"
    );
    Ok(request)
}

/// Rejects a pending, approved or processing request, refunding the wallet
/// if it had been debited.
///
/// The status change and the refund are one atomic store operation, so a
/// failed refund leaves the request as it was and the rejection can be
/// retried.
pub async fn reject(
    store: &dyn Store,
    id: Uuid,
    admin_id: &str,
    action: RejectWithdrawalRequest,
) -> Result<WithdrawalRequest, AppError> {
    let reason = action.reason.trim();
    if reason.is_empty() {
        return Err(AppError::invalid_argument("A rejection reason is required"));
    }

    let mut rejection = WithdrawalTransition::to(WithdrawalStatus::Rejected, Utc::now()).by(admin_id);
    rejection.rejection_reason = Some(reason.to_string());
    rejection.admin_note = action.note;
    rejection.wallet_debited = Some(false);

    let (request, refund) = store
        .modify_withdrawal_with_ledger(id, &mut |request| {
            ensure_transition(request.status, WithdrawalStatus::Rejected)?;
            let refund = request.wallet_debited.then(|| {
                NewWalletTransaction::refund(
                    &request.seller_id,
                    id,
                    request.breakdown.gross_amount,
                    request.breakdown.net_payable,
                )
            });
            request.apply_transition(&rejection);
            Ok(refund)
        })
        .await?
        .ok_or_else(|| request_not_found(id))?;

    tracing::info!(
        withdrawal_id = %id,
        seller_id = %request.seller_id,
        admin_id,
        refunded = refund.is_some(),
        "withdrawal rejected"
    );
    Ok(request)
}

pub async fn fetch(store: &dyn Store, id: Uuid) -> Result<WithdrawalRequest, AppError> {
    store
        .fetch_withdrawal(id)
        .await?
        .ok_or_else(|| request_not_found(id))
}

/// Newest first.
pub async fn list(
    store: &dyn Store,
    filter: &WithdrawalFilter,
) -> Result<Vec<WithdrawalRequest>, AppError> {
    store.list_withdrawals(filter).await
}
