//! # Fee Policy
//!
//! Pure rules: smart defaults and how fees combine into a quote.

use super::entities::{FeeQuote, SmartDefaults, BLOCKED_FEE, NOTIFICATIONS_BOX};
use super::errors::PermissionError;

/// Reason given when a quote had to fail closed.
pub const LOOKUP_FAILED_REASON: &str = "fee lookup failed";

/// Fee provisioned for a box nobody has configured yet.
pub fn smart_default(message_box: &str, defaults: &SmartDefaults) -> i64 {
    if message_box == NOTIFICATIONS_BOX {
        defaults.notifications_fee
    } else {
        defaults.standard_fee
    }
}

pub fn validate_recipient_fee(fee: i64) -> Result<(), PermissionError> {
    if fee < BLOCKED_FEE {
        return Err(PermissionError::InvalidFee(fee));
    }
    Ok(())
}

pub fn validate_delivery_fee(fee: i64) -> Result<(), PermissionError> {
    if fee < 0 {
        return Err(PermissionError::InvalidDeliveryFee(fee));
    }
    Ok(())
}

/// Cost of one delivery: the server fee plus the recipient fee, unless the
/// recipient blocks the sender.
pub fn total_cost(delivery_fee: i64, recipient_fee: i64) -> i64 {
    delivery_fee.saturating_add(recipient_fee.max(0))
}

/// Combine fees into a quote. With `payment_offered = None` only the block
/// status decides `allowed`.
pub fn evaluate(delivery_fee: i64, recipient_fee: i64, payment_offered: Option<u64>) -> FeeQuote {
    let total_cost = total_cost(delivery_fee, recipient_fee);
    let requires_payment = total_cost > 0;

    let blocked_reason = if recipient_fee == BLOCKED_FEE {
        Some("sender is blocked by recipient".to_string())
    } else {
        match payment_offered {
            Some(offered) if !covers(offered, total_cost) => Some(format!(
                "insufficient payment: {total_cost} required, {offered} offered"
            )),
            _ => None,
        }
    };

    FeeQuote {
        delivery_fee,
        recipient_fee,
        total_cost,
        allowed: blocked_reason.is_none(),
        requires_payment,
        blocked_reason,
    }
}

/// The most restrictive quote, used when fees could not be read.
pub fn fail_closed() -> FeeQuote {
    FeeQuote {
        delivery_fee: 0,
        recipient_fee: BLOCKED_FEE,
        total_cost: 0,
        allowed: false,
        requires_payment: false,
        blocked_reason: Some(LOOKUP_FAILED_REASON.to_string()),
    }
}

pub fn covers(offered: u64, total_cost: i64) -> bool {
    i64::try_from(offered).unwrap_or(i64::MAX) >= total_cost
}
