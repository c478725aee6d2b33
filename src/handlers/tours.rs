use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::check_auth;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{ScheduleItem, TourDetail, TourSchedule};
use crate::services::rules::{validate, SCHEDULE_ITEM_RULES, TOUR_DETAIL_RULES};
use crate::services::scheduling::{
    can_create_next_day, can_delete_day, validate_item_time, ItemCandidate,
};
use crate::state::AppState;

// ── Tour details ──

#[derive(Deserialize)]
pub struct TourDetailRequest {
    #[serde(alias = "TourName", alias = "tourName")]
    pub tour_name: String,
    #[serde(alias = "DepartureDate", alias = "departureDate")]
    pub departure_date: NaiveDateTime,
    #[serde(alias = "ArrivalDate", alias = "arrivalDate")]
    pub arrival_date: NaiveDateTime,
    #[serde(alias = "Price")]
    pub price: Decimal,
    #[serde(alias = "Capacity")]
    pub capacity: i64,
}

#[derive(Serialize)]
pub struct TourDetailResponse {
    #[serde(flatten)]
    detail: TourDetail,
    trip_length_days: i64,
}

impl From<TourDetail> for TourDetailResponse {
    fn from(detail: TourDetail) -> Self {
        let trip_length_days = detail.trip_length_days();
        Self {
            detail,
            trip_length_days,
        }
    }
}

// POST /staff/tour-details
pub async fn create_tour_detail(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<TourDetailRequest>,
) -> Result<(StatusCode, Json<TourDetailResponse>), AppError> {
    check_auth(&headers, &state.config.staff_token)?;

    let detail = TourDetail {
        id: uuid::Uuid::new_v4().to_string(),
        tour_name: body.tour_name.trim().to_string(),
        departure_date: body.departure_date,
        arrival_date: body.arrival_date,
        price: body.price,
        capacity: body.capacity,
        created_at: Utc::now().naive_utc(),
    };
    validate(&detail, TOUR_DETAIL_RULES)?;

    {
        let db = state.db()?;
        queries::create_tour_detail(&db, &detail)?;
    }
    tracing::info!(tour_detail_id = %detail.id, days = detail.trip_length_days(), "tour detail created");

    Ok((StatusCode::CREATED, Json(detail.into())))
}

// GET /staff/tour-details/:id
pub async fn get_tour_detail(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<TourDetailResponse>, AppError> {
    check_auth(&headers, &state.config.staff_token)?;

    let db = state.db()?;
    let detail = queries::get_tour_detail(&db, &id)?
        .ok_or_else(|| AppError::NotFound(format!("tour detail {id}")))?;
    Ok(Json(detail.into()))
}

// ── Schedules ──

#[derive(Deserialize)]
pub struct SchedulesQuery {
    #[serde(alias = "tourDetailId")]
    pub tour_detail_id: String,
}

#[derive(Serialize)]
pub struct ScheduleListResponse {
    tour_detail_id: String,
    trip_length_days: i64,
    days: Vec<TourSchedule>,
    /// Day number the "Add Day" control would create, when allowed.
    next_day: Option<i64>,
    /// Why adding a day is currently blocked.
    blocked_reason: Option<&'static str>,
}

// GET /staff/tour-schedules
pub async fn list_schedules(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<SchedulesQuery>,
) -> Result<Json<ScheduleListResponse>, AppError> {
    check_auth(&headers, &state.config.staff_token)?;

    let db = state.db()?;
    let detail = queries::get_tour_detail(&db, &query.tour_detail_id)?
        .ok_or_else(|| AppError::NotFound(format!("tour detail {}", query.tour_detail_id)))?;
    let days = queries::list_schedules(&db, &detail.id)?;

    let trip_length_days = detail.trip_length_days();
    let (next_day, blocked_reason) = match can_create_next_day(&days, Some(trip_length_days)) {
        Ok(day) => (Some(day), None),
        Err(rejection) => (None, Some(rejection.tag())),
    };

    Ok(Json(ScheduleListResponse {
        tour_detail_id: detail.id,
        trip_length_days,
        days,
        next_day,
        blocked_reason,
    }))
}

#[derive(Deserialize)]
pub struct CreateScheduleRequest {
    #[serde(alias = "tourDetailId", alias = "TourDetailId")]
    pub tour_detail_id: String,
    #[serde(default, alias = "Title")]
    pub title: Option<String>,
}

// POST /staff/tour-schedules
pub async fn create_schedule(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateScheduleRequest>,
) -> Result<(StatusCode, Json<TourSchedule>), AppError> {
    check_auth(&headers, &state.config.staff_token)?;

    let db = state.db()?;
    let detail = queries::get_tour_detail(&db, &body.tour_detail_id)?
        .ok_or_else(|| AppError::NotFound(format!("tour detail {}", body.tour_detail_id)))?;
    let existing = queries::list_schedules(&db, &detail.id)?;

    let day_number = can_create_next_day(&existing, Some(detail.trip_length_days()))?;

    let schedule = TourSchedule {
        id: uuid::Uuid::new_v4().to_string(),
        tour_detail_id: detail.id,
        day_number,
        title: body.title.filter(|t| !t.trim().is_empty()),
        items: vec![],
    };
    queries::create_schedule(&db, &schedule)?;
    tracing::info!(
        tour_detail_id = %schedule.tour_detail_id,
        day_number,
        "schedule day created"
    );

    Ok((StatusCode::CREATED, Json(schedule)))
}

#[derive(Deserialize)]
pub struct UpdateScheduleRequest {
    #[serde(default, alias = "Title")]
    pub title: Option<String>,
}

// PUT /staff/tour-schedules/:id
pub async fn update_schedule(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdateScheduleRequest>,
) -> Result<Json<TourSchedule>, AppError> {
    check_auth(&headers, &state.config.staff_token)?;

    let db = state.db()?;
    let title = body.title.as_deref().map(str::trim).filter(|t| !t.is_empty());
    if !queries::update_schedule_title(&db, &id, title)? {
        return Err(AppError::NotFound(format!("schedule {id}")));
    }
    let schedule = queries::get_schedule(&db, &id)?
        .ok_or_else(|| AppError::NotFound(format!("schedule {id}")))?;
    Ok(Json(schedule))
}

// DELETE /staff/tour-schedules/:id
pub async fn delete_schedule(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.staff_token)?;

    let db = state.db()?;
    let schedule = queries::get_schedule(&db, &id)?
        .ok_or_else(|| AppError::NotFound(format!("schedule {id}")))?;
    let existing = queries::list_schedules(&db, &schedule.tour_detail_id)?;
    can_delete_day(&existing, schedule.day_number)?;

    queries::delete_schedule(&db, &id)?;
    tracing::info!(schedule_id = %id, day_number = schedule.day_number, "schedule day deleted");

    Ok(Json(serde_json::json!({"ok": true})))
}

// ── Schedule items ──

#[derive(Deserialize)]
pub struct ItemRequest {
    #[serde(alias = "sortOrder", alias = "SortOrder")]
    pub sort_order: i64,
    #[serde(alias = "timeInfo", alias = "TimeInfo")]
    pub time_info: String,
    #[serde(alias = "Activity")]
    pub activity: String,
    #[serde(default, alias = "Description")]
    pub description: Option<String>,
}

fn build_item(id: String, schedule_id: String, body: ItemRequest) -> ScheduleItem {
    ScheduleItem {
        id,
        schedule_id,
        sort_order: body.sort_order,
        time_info: body.time_info.trim().to_string(),
        activity: body.activity.trim().to_string(),
        description: body.description.filter(|d| !d.trim().is_empty()),
    }
}

fn check_item(item: &ScheduleItem, siblings: &[ScheduleItem], editing: bool) -> Result<(), AppError> {
    validate(item, SCHEDULE_ITEM_RULES)?;
    let candidate = ItemCandidate {
        id: editing.then_some(item.id.as_str()),
        sort_order: item.sort_order,
        time_info: &item.time_info,
    };
    validate_item_time(&candidate, siblings)?;
    Ok(())
}

// POST /staff/tour-schedules/:id/items
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(schedule_id): Path<String>,
    Json(body): Json<ItemRequest>,
) -> Result<(StatusCode, Json<ScheduleItem>), AppError> {
    check_auth(&headers, &state.config.staff_token)?;

    let db = state.db()?;
    let schedule = queries::get_schedule(&db, &schedule_id)?
        .ok_or_else(|| AppError::NotFound(format!("schedule {schedule_id}")))?;

    let item = build_item(uuid::Uuid::new_v4().to_string(), schedule.id, body);
    check_item(&item, &schedule.items, false)?;

    queries::create_item(&db, &item)?;
    tracing::info!(schedule_id = %item.schedule_id, sort_order = item.sort_order, "schedule item created");

    Ok((StatusCode::CREATED, Json(item)))
}

// PUT /staff/tour-schedule-items/:id
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<ItemRequest>,
) -> Result<Json<ScheduleItem>, AppError> {
    check_auth(&headers, &state.config.staff_token)?;

    let db = state.db()?;
    let existing = queries::get_item(&db, &id)?
        .ok_or_else(|| AppError::NotFound(format!("schedule item {id}")))?;
    let siblings = queries::list_items(&db, &existing.schedule_id)?;

    let item = build_item(existing.id, existing.schedule_id, body);
    check_item(&item, &siblings, true)?;

    queries::update_item(&db, &item)?;
    Ok(Json(item))
}

// DELETE /staff/tour-schedule-items/:id
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.staff_token)?;

    let removed = {
        let db = state.db()?;
        queries::delete_item(&db, &id)?
    };

    if removed {
        Ok(Json(serde_json::json!({"ok": true})))
    } else {
        Err(AppError::NotFound(format!("schedule item {id}")))
    }
}
