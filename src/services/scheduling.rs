use crate::models::{ScheduleItem, TimeInfo, TourSchedule};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleRejection {
    #[error("day {missing} has not been created yet")]
    PreviousDayMissing { missing: i64 },

    #[error("day {day} has no activities yet; add one before creating the next day")]
    PreviousDayEmpty { day: i64 },

    #[error("day {day} exceeds the trip length of {trip_length} days")]
    ExceedsTripLength { day: i64, trip_length: i64 },

    #[error("sort order {sort_order} is already used in this day")]
    DuplicateSortOrder { sort_order: i64 },

    #[error("time slot '{time_info}' is already used in this day")]
    DuplicateTimeSlot { time_info: String },

    #[error("'{time_info}' is not a named slot or an HH:mm - HH:mm range")]
    InvalidTimeInfo { time_info: String },

    #[error("activity at order {sort_order} is out of chronological order with order {conflicting}")]
    TimeOrderViolation { sort_order: i64, conflicting: i64 },

    #[error("only the last day ({last}) can be deleted")]
    NotLastDay { last: i64 },
}

impl ScheduleRejection {
    pub fn tag(&self) -> &'static str {
        match self {
            ScheduleRejection::PreviousDayMissing { .. } => "PreviousDayMissing",
            ScheduleRejection::PreviousDayEmpty { .. } => "PreviousDayEmpty",
            ScheduleRejection::ExceedsTripLength { .. } => "ExceedsTripLength",
            ScheduleRejection::DuplicateSortOrder { .. } => "DuplicateSortOrder",
            ScheduleRejection::DuplicateTimeSlot { .. } => "DuplicateTimeSlot",
            ScheduleRejection::InvalidTimeInfo { .. } => "InvalidTimeInfo",
            ScheduleRejection::TimeOrderViolation { .. } => "TimeOrderViolation",
            ScheduleRejection::NotLastDay { .. } => "NotLastDay",
        }
    }
}

/// Decides which day number may be created next for a departure.
///
/// Days are created strictly in order: the previous day must exist and hold at
/// least one activity, and the new day may not run past the trip length.
pub fn can_create_next_day(
    existing: &[TourSchedule],
    trip_length_days: Option<i64>,
) -> Result<i64, ScheduleRejection> {
    let max_day = existing.iter().map(|s| s.day_number).max().unwrap_or(0);
    let next_day = max_day + 1;

    if next_day > 1 {
        // previous is the highest stored day, so this lookup only fails on
        // callers that derive next_day some other way
        let previous = next_day - 1;
        let prev = existing
            .iter()
            .find(|s| s.day_number == previous)
            .ok_or(ScheduleRejection::PreviousDayMissing { missing: previous })?;
        if prev.items.is_empty() {
            return Err(ScheduleRejection::PreviousDayEmpty { day: previous });
        }
    }

    if let Some(trip_length) = trip_length_days {
        if next_day > trip_length {
            return Err(ScheduleRejection::ExceedsTripLength {
                day: next_day,
                trip_length,
            });
        }
    }

    Ok(next_day)
}

/// Only the highest day may be removed so the remaining days stay contiguous.
pub fn can_delete_day(existing: &[TourSchedule], day_number: i64) -> Result<(), ScheduleRejection> {
    let last = existing.iter().map(|s| s.day_number).max().unwrap_or(0);
    if day_number != last {
        return Err(ScheduleRejection::NotLastDay { last });
    }
    Ok(())
}

/// A new or edited activity, checked against the rest of its day.
#[derive(Debug, Clone)]
pub struct ItemCandidate<'a> {
    /// Set when editing so the stored copy of the item is skipped.
    pub id: Option<&'a str>,
    pub sort_order: i64,
    pub time_info: &'a str,
}

pub fn validate_item_time(
    candidate: &ItemCandidate<'_>,
    siblings: &[ScheduleItem],
) -> Result<(), ScheduleRejection> {
    let others: Vec<&ScheduleItem> = siblings
        .iter()
        .filter(|s| candidate.id != Some(s.id.as_str()))
        .collect();

    if others.iter().any(|s| s.sort_order == candidate.sort_order) {
        return Err(ScheduleRejection::DuplicateSortOrder {
            sort_order: candidate.sort_order,
        });
    }

    let wanted = candidate.time_info.trim();
    if others
        .iter()
        .any(|s| s.time_info.trim().eq_ignore_ascii_case(wanted))
    {
        return Err(ScheduleRejection::DuplicateTimeSlot {
            time_info: wanted.to_string(),
        });
    }

    let minute = TimeInfo::parse(wanted)
        .map_err(|_| ScheduleRejection::InvalidTimeInfo {
            time_info: wanted.to_string(),
        })?
        .minute_of_day();

    for sibling in others {
        // Legacy rows with free-form text take no part in ordering.
        let Ok(info) = TimeInfo::parse(&sibling.time_info) else {
            continue;
        };
        let sibling_minute = info.minute_of_day();
        let out_of_order = (sibling.sort_order < candidate.sort_order && sibling_minute > minute)
            || (sibling.sort_order > candidate.sort_order && sibling_minute < minute);
        if out_of_order {
            return Err(ScheduleRejection::TimeOrderViolation {
                sort_order: candidate.sort_order,
                conflicting: sibling.sort_order,
            });
        }
    }

    Ok(())
}
