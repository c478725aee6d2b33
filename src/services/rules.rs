//! Field rules per entity, shared by every endpoint that writes that entity.

use rust_decimal::Decimal;

use crate::models::{Booking, ScheduleItem, TourDetail};

const MAX_NAME_LEN: usize = 200;
const MAX_BOOKING_TOTAL: i64 = 1_000_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: &'static str,
}

pub struct FieldRule<T> {
    pub field: &'static str,
    pub message: &'static str,
    pub check: fn(&T) -> bool,
}

pub fn validate<T>(value: &T, rules: &[FieldRule<T>]) -> Result<(), ValidationError> {
    match rules.iter().find(|rule| !(rule.check)(value)) {
        Some(rule) => Err(ValidationError {
            field: rule.field,
            message: rule.message,
        }),
        None => Ok(()),
    }
}

fn is_name(s: &str) -> bool {
    let s = s.trim();
    !s.is_empty() && s.chars().count() <= MAX_NAME_LEN
}

fn tour_name_ok(t: &TourDetail) -> bool {
    is_name(&t.tour_name)
}

fn dates_ordered(t: &TourDetail) -> bool {
    t.arrival_date >= t.departure_date
}

fn price_positive(t: &TourDetail) -> bool {
    t.price > Decimal::ZERO
}

fn capacity_positive(t: &TourDetail) -> bool {
    t.capacity >= 1
}

fn sort_order_positive(i: &ScheduleItem) -> bool {
    i.sort_order >= 1
}

fn activity_ok(i: &ScheduleItem) -> bool {
    is_name(&i.activity)
}

fn time_info_present(i: &ScheduleItem) -> bool {
    !i.time_info.trim().is_empty()
}

fn customer_name_ok(b: &Booking) -> bool {
    is_name(&b.customer_name)
}

fn total_in_range(b: &Booking) -> bool {
    b.final_total >= Decimal::ZERO && b.final_total <= Decimal::from(MAX_BOOKING_TOTAL)
}

pub const TOUR_DETAIL_RULES: &[FieldRule<TourDetail>] = &[
    FieldRule {
        field: "tour_name",
        message: "must be 1-200 characters",
        check: tour_name_ok,
    },
    FieldRule {
        field: "arrival_date",
        message: "must not be before the departure date",
        check: dates_ordered,
    },
    FieldRule {
        field: "price",
        message: "must be greater than zero",
        check: price_positive,
    },
    FieldRule {
        field: "capacity",
        message: "must be at least 1",
        check: capacity_positive,
    },
];

pub const SCHEDULE_ITEM_RULES: &[FieldRule<ScheduleItem>] = &[
    FieldRule {
        field: "sort_order",
        message: "must be at least 1",
        check: sort_order_positive,
    },
    FieldRule {
        field: "activity",
        message: "must be 1-200 characters",
        check: activity_ok,
    },
    FieldRule {
        field: "time_info",
        message: "must not be empty",
        check: time_info_present,
    },
];

pub const BOOKING_RULES: &[FieldRule<Booking>] = &[
    FieldRule {
        field: "customer_name",
        message: "must be 1-200 characters",
        check: customer_name_ok,
    },
    FieldRule {
        field: "final_total",
        message: "must be between 0 and 1000000000000",
        check: total_in_range,
    },
];
