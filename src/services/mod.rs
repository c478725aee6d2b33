pub mod booking_status;
pub mod refund;
pub mod rules;
pub mod scheduling;
