use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::{Booking, BookingKind, BookingStatus, PaymentStatus};
use crate::services::refund::ensure_refundable;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatusError {
    #[error("unrecognized booking status code {0}")]
    UnrecognizedStatus(i64),

    #[error("unrecognized payment status code {0}")]
    UnrecognizedPaymentStatus(i64),

    #[error("{action:?} is not permitted while the booking is {label}")]
    ActionNotPermitted { action: Action, label: &'static str },
}

impl StatusError {
    pub fn tag(&self) -> &'static str {
        match self {
            StatusError::UnrecognizedStatus(_) => "UnrecognizedStatus",
            StatusError::UnrecognizedPaymentStatus(_) => "UnrecognizedPaymentStatus",
            StatusError::ActionNotPermitted { .. } => "ActionNotPermitted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Pay,
    ViewDetails,
    Refund,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusProjection {
    pub code: i64,
    pub label: &'static str,
    pub badge: &'static str,
    pub permitted_actions: BTreeSet<Action>,
}

impl StatusProjection {
    pub fn permits(&self, action: Action) -> bool {
        self.permitted_actions.contains(&action)
    }

    /// Fails with `ActionNotPermitted` unless `action` is available.
    pub fn require(&self, action: Action) -> Result<(), StatusError> {
        if self.permits(action) {
            Ok(())
        } else {
            Err(StatusError::ActionNotPermitted {
                action,
                label: self.label,
            })
        }
    }
}

/// Tour booking projection for a raw status code.
pub fn project(code: i64) -> Result<StatusProjection, StatusError> {
    project_for(BookingKind::Tour, code)
}

pub fn project_for(kind: BookingKind, code: i64) -> Result<StatusProjection, StatusError> {
    let status = BookingStatus::try_from(code)?;
    Ok(projection(kind, status))
}

/// Projection with booking context applied: payment closes once paid or past the
/// deadline, and staff may refund any paid booking not yet refunded.
pub fn project_booking(booking: &Booking, now: &NaiveDateTime) -> StatusProjection {
    let mut projected = projection(booking.kind, booking.booking_status);

    if booking.payment_status == PaymentStatus::Paid || booking.is_expired(now) {
        projected.permitted_actions.remove(&Action::Pay);
    }
    if ensure_refundable(booking.payment_status, booking.booking_status).is_ok() {
        projected.permitted_actions.insert(Action::Refund);
    }

    projected
}

fn projection(kind: BookingKind, status: BookingStatus) -> StatusProjection {
    let mut permitted_actions = BTreeSet::from([Action::ViewDetails]);
    if status == BookingStatus::Pending {
        permitted_actions.insert(Action::Pay);
    }

    StatusProjection {
        code: status.code(),
        label: label(kind, status),
        badge: badge(status),
        permitted_actions,
    }
}

pub fn label(kind: BookingKind, status: BookingStatus) -> &'static str {
    match (kind, status) {
        (BookingKind::Tour, BookingStatus::Pending) => "Pending Processing",
        (BookingKind::Tour, BookingStatus::Confirmed) => "Confirmed",
        (BookingKind::Tour, BookingStatus::InProgress) => "On-going",
        (BookingKind::Car, BookingStatus::Pending) => "Pending",
        (BookingKind::Car, BookingStatus::Confirmed) => "Booked",
        (BookingKind::Car, BookingStatus::InProgress) => "In Progress",
        (_, BookingStatus::Completed) => "Completed",
        (_, BookingStatus::AutoCancelled) => "Auto Cancelled",
        (_, BookingStatus::Refunded) => "Refunded",
    }
}

fn badge(status: BookingStatus) -> &'static str {
    match status {
        BookingStatus::Pending => "warning",
        BookingStatus::Confirmed => "info",
        BookingStatus::InProgress => "primary",
        BookingStatus::Completed => "success",
        BookingStatus::AutoCancelled => "secondary",
        BookingStatus::Refunded => "dark",
    }
}
