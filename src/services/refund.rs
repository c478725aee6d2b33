use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::days::days_between_ceil;
use crate::models::{BookingStatus, PaymentStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefundQuote {
    pub days_before: i64,
    pub percentage: u32,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefundRejection {
    #[error("booking has not been paid")]
    NotPaid,

    #[error("booking has already been refunded")]
    AlreadyRefunded,

    #[error("refund amount {amount} must be between 0 and {max}")]
    AmountOutOfRange { amount: Decimal, max: Decimal },
}

impl RefundRejection {
    pub fn tag(&self) -> &'static str {
        match self {
            RefundRejection::NotPaid => "NotPaid",
            RefundRejection::AlreadyRefunded => "AlreadyRefunded",
            RefundRejection::AmountOutOfRange { .. } => "AmountOutOfRange",
        }
    }
}

/// Percentage returned for a given notice period in whole days.
pub fn refund_percentage(days_before: i64) -> u32 {
    match days_before {
        d if d >= 5 => 95,
        4 => 90,
        3 => 85,
        2 => 80,
        1 => 75,
        _ => 0,
    }
}

pub fn compute_refund(
    pickup_date: &NaiveDateTime,
    now: &NaiveDateTime,
    original_amount: Decimal,
) -> RefundQuote {
    let days_before = days_between_ceil(now, pickup_date);
    let percentage = refund_percentage(days_before);
    // factor is at most 0.95, so the product never leaves Decimal's range
    let amount = original_amount * Decimal::new(i64::from(percentage), 2);

    RefundQuote {
        days_before,
        percentage,
        amount,
    }
}

pub fn ensure_refundable(
    payment_status: PaymentStatus,
    booking_status: BookingStatus,
) -> Result<(), RefundRejection> {
    if booking_status == BookingStatus::Refunded {
        return Err(RefundRejection::AlreadyRefunded);
    }
    if payment_status != PaymentStatus::Paid {
        return Err(RefundRejection::NotPaid);
    }
    Ok(())
}

/// Staff may replace the suggested amount with anything up to what was charged.
pub fn validate_override(amount: Decimal, final_total: Decimal) -> Result<(), RefundRejection> {
    if amount < Decimal::ZERO || amount > final_total {
        return Err(RefundRejection::AmountOutOfRange {
            amount,
            max: final_total,
        });
    }
    Ok(())
}
