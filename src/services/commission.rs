//! Withdrawal commission calculator and request validation.
//!
//! Both functions are pure: no store access, no clock.

use rust_decimal::Decimal;

use crate::{
    error::AppError,
    models::{
        money::{percent_of, round_money},
        withdrawal::CommissionBreakdown,
    },
};

/// GST charged on the commission portion only, in percent.
pub const GST_RATE: Decimal = Decimal::from_parts(18, 0, 0, false, 0);

/// Splits a gross withdrawal into commission, GST on commission, and the net
/// amount paid out.
///
/// Each step works from the rounded value of the step before it, so the
/// four outputs always satisfy `commission + gst == total_deduction` and
/// `total_deduction + net_payable == gross`.
///
/// # Errors
///
/// - `InvalidArgument`: `gross_amount <= 0` or `commission_rate` outside `[0, 100]`
pub fn calculate_commission(
    gross_amount: Decimal,
    commission_rate: Decimal,
) -> Result<CommissionBreakdown, AppError> {
    if gross_amount <= Decimal::ZERO {
        return Err(AppError::invalid_argument(
            "Withdrawal amount must be greater than zero",
        ));
    }
    if commission_rate < Decimal::ZERO || commission_rate > Decimal::ONE_HUNDRED {
        return Err(AppError::invalid_argument(format!(
            "Commission rate must be between 0 and 100, got {commission_rate}"
        )));
    }

    let gross_amount = round_money(gross_amount);
    let commission_amount = percent_of(gross_amount, commission_rate);
    let gst_on_commission = percent_of(commission_amount, GST_RATE);
    let total_deduction = round_money(commission_amount + gst_on_commission);
    let net_payable = round_money(gross_amount - total_deduction);

    Ok(CommissionBreakdown {
        gross_amount,
        commission_rate,
        commission_amount,
        gst_on_commission,
        total_deduction,
        net_payable,
    })
}

/// Checks a withdrawal request before anything is written.
///
/// Every failing rule contributes one reason; the reasons are joined with
/// `"; "`. When the balance is the only problem the error is
/// `InsufficientBalance`, otherwise `InvalidArgument`.
///
/// Returns the validated amount.
pub fn validate_withdrawal_request(
    seller_id: Option<&str>,
    amount: Option<Decimal>,
    available_balance: Decimal,
    minimum_amount: Decimal,
) -> Result<Decimal, AppError> {
    let mut reasons = Vec::new();
    let mut over_balance = false;

    if seller_id.is_none_or(|id| id.trim().is_empty()) {
        reasons.push("Seller ID is required".to_string());
    }

    match amount {
        Some(value) if value > Decimal::ZERO => {
            // Trailing zeros don't count: 100.50 and 100.500 are the same amount.
            if value.normalize().scale() > 2 {
                reasons.push("Amount can have at most 2 decimal places".to_string());
            }
            if value < minimum_amount {
                reasons.push(format!("Minimum withdrawal amount is ₹{minimum_amount}"));
            }
            if value > available_balance {
                over_balance = true;
                reasons.push(format!(
                    "Amount exceeds available balance of ₹{available_balance}"
                ));
            }
        }
        _ => reasons.push("Withdrawal amount must be greater than zero".to_string()),
    }

    match (amount, reasons.len()) {
        (Some(value), 0) => Ok(value),
        (_, 1) if over_balance => Err(AppError::InsufficientBalance),
        _ => Err(AppError::invalid_argument(reasons.join("; "))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn ten_percent_of_a_thousand() {
        let b = calculate_commission(d("1000"), d("10")).unwrap();
        assert_eq!(b.commission_amount, d("100.00"));
        assert_eq!(b.gst_on_commission, d("18.00"));
        assert_eq!(b.total_deduction, d("118.00"));
        assert_eq!(b.net_payable, d("882.00"));
    }

    #[test]
    fn zero_rate_pays_out_everything() {
        let b = calculate_commission(d("250.50"), Decimal::ZERO).unwrap();
        assert_eq!(b.total_deduction, Decimal::ZERO);
        assert_eq!(b.net_payable, d("250.50"));
    }

    #[test]
    fn rounding_uses_the_rounded_commission() {
        // 333.33 * 7.5% = 24.99975 -> 25.00; GST 4.50
        let b = calculate_commission(d("333.33"), d("7.5")).unwrap();
        assert_eq!(b.commission_amount, d("25.00"));
        assert_eq!(b.gst_on_commission, d("4.50"));
        assert_eq!(b.net_payable, d("303.83"));
    }

    #[test]
    fn rejects_bad_inputs() {
        for (gross, rate) in [("0", "10"), ("-5", "10"), ("100", "-1"), ("100", "100.01")] {
            let err = calculate_commission(d(gross), d(rate)).unwrap_err();
            assert!(matches!(err, AppError::InvalidArgument(_)), "{gross} @ {rate}");
        }
    }

    #[test]
    fn below_minimum_names_the_minimum() {
        let err =
            validate_withdrawal_request(Some("s-1"), Some(d("50")), d("1000"), d("100")).unwrap_err();
        match err {
            AppError::InvalidArgument(msg) => assert!(msg.contains("₹100"), "{msg}"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn balance_alone_is_insufficient_balance() {
        let err =
            validate_withdrawal_request(Some("s-1"), Some(d("500")), d("499.99"), d("100"))
                .unwrap_err();
        assert!(matches!(err, AppError::InsufficientBalance));
    }

    #[test]
    fn reasons_are_joined() {
        let err = validate_withdrawal_request(None, Some(d("50")), d("10"), d("100")).unwrap_err();
        match err {
            AppError::InvalidArgument(msg) => {
                assert_eq!(msg.split("; ").count(), 3, "{msg}");
                assert!(msg.starts_with("Seller ID is required"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn fractions_of_a_paisa_are_rejected() {
        let err = validate_withdrawal_request(Some("s-1"), Some(d("150.005")), d("1000"), d("100"))
            .unwrap_err();
        match err {
            AppError::InvalidArgument(msg) => assert!(msg.contains("2 decimal places"), "{msg}"),
            other => panic!("unexpected {other:?}"),
        }

        let amount =
            validate_withdrawal_request(Some("s-1"), Some(d("150.500")), d("1000"), d("100"))
                .unwrap();
        assert_eq!(amount, d("150.5"));
    }

    #[test]
    fn missing_amount_is_rejected() {
        let err = validate_withdrawal_request(Some("s-1"), None, d("1000"), d("100")).unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[test]
    fn exact_balance_at_minimum_passes() {
        let amount =
            validate_withdrawal_request(Some("s-1"), Some(d("100")), d("100"), d("100")).unwrap();
        assert_eq!(amount, d("100"));
    }

    proptest! {
        #[test]
        fn deductions_and_net_sum_to_gross(
            paise in 1i64..100_000_000,
            rate_bp in 0u32..=10_000,
        ) {
            let gross = Decimal::new(paise, 2);
            let rate = Decimal::new(rate_bp as i64, 2);
            let b = calculate_commission(gross, rate).unwrap();

            prop_assert_eq!(b.commission_amount + b.gst_on_commission, b.total_deduction);
            prop_assert_eq!(b.total_deduction + b.net_payable, b.gross_amount);
            prop_assert_eq!(b.gst_on_commission, percent_of(b.commission_amount, GST_RATE));
        }
    }
}
