use serde::{Deserialize, Serialize};

/// One day of a departure's itinerary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourSchedule {
    pub id: String,
    pub tour_detail_id: String,
    pub day_number: i64,
    pub title: Option<String>,
    pub items: Vec<ScheduleItem>,
}

/// One timed activity within a schedule day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleItem {
    pub id: String,
    pub schedule_id: String,
    pub sort_order: i64,
    pub time_info: String,
    pub activity: String,
    pub description: Option<String>,
}
