use chrono::{Duration, NaiveDateTime};

/// Whole days from `from` to `to`, rounding any partial day up.
/// Negative when `to` is before `from`.
pub fn days_between_ceil(from: &NaiveDateTime, to: &NaiveDateTime) -> i64 {
    let delta = *to - *from;
    let days = delta.num_days();
    if delta > Duration::days(days) {
        days + 1
    } else {
        days
    }
}
