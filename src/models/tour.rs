use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::days::days_between_ceil;

/// A scheduled departure of a tour package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourDetail {
    pub id: String,
    pub tour_name: String,
    pub departure_date: NaiveDateTime,
    pub arrival_date: NaiveDateTime,
    pub price: Decimal,
    pub capacity: i64,
    pub created_at: NaiveDateTime,
}

impl TourDetail {
    pub fn trip_length_days(&self) -> i64 {
        trip_length_days(&self.departure_date, &self.arrival_date)
    }
}

/// Calendar days covered by a trip, counting both the departure and arrival day.
pub fn trip_length_days(departure: &NaiveDateTime, arrival: &NaiveDateTime) -> i64 {
    days_between_ceil(departure, arrival) + 1
}
