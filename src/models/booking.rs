use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::services::booking_status::StatusError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub kind: BookingKind,
    pub customer_name: String,
    pub final_total: Decimal,
    pub pickup_date: NaiveDateTime,
    pub booking_status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub payment_deadline: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Booking {
    /// A pending booking whose payment deadline has passed.
    pub fn is_expired(&self, now: &NaiveDateTime) -> bool {
        self.booking_status == BookingStatus::Pending
            && self.payment_deadline.is_some_and(|deadline| *now > deadline)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingKind {
    Tour,
    Car,
}

impl BookingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingKind::Tour => "tour",
            BookingKind::Car => "car",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "tour" => Some(BookingKind::Tour),
            "car" => Some(BookingKind::Car),
            _ => None,
        }
    }
}

/// Lifecycle stage, stored and transported as its integer code.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(into = "i64", try_from = "i64")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    AutoCancelled,
    Refunded,
}

impl BookingStatus {
    pub fn code(&self) -> i64 {
        match self {
            BookingStatus::Pending => 0,
            BookingStatus::Confirmed => 1,
            BookingStatus::InProgress => 2,
            BookingStatus::Completed => 3,
            BookingStatus::AutoCancelled => 4,
            BookingStatus::Refunded => 5,
        }
    }
}

impl From<BookingStatus> for i64 {
    fn from(status: BookingStatus) -> Self {
        status.code()
    }
}

impl TryFrom<i64> for BookingStatus {
    type Error = StatusError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(BookingStatus::Pending),
            1 => Ok(BookingStatus::Confirmed),
            2 => Ok(BookingStatus::InProgress),
            3 => Ok(BookingStatus::Completed),
            4 => Ok(BookingStatus::AutoCancelled),
            5 => Ok(BookingStatus::Refunded),
            other => Err(StatusError::UnrecognizedStatus(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(into = "i64", try_from = "i64")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

impl PaymentStatus {
    pub fn code(&self) -> i64 {
        match self {
            PaymentStatus::Unpaid => 0,
            PaymentStatus::Paid => 1,
        }
    }
}

impl From<PaymentStatus> for i64 {
    fn from(status: PaymentStatus) -> Self {
        status.code()
    }
}

impl TryFrom<i64> for PaymentStatus {
    type Error = StatusError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(PaymentStatus::Unpaid),
            1 => Ok(PaymentStatus::Paid),
            other => Err(StatusError::UnrecognizedPaymentStatus(other)),
        }
    }
}
