use std::str::FromStr;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use tower::ServiceExt;

use travelbook::config::AppConfig;
use travelbook::db::{self, queries};
use travelbook::handlers;
use travelbook::models::{Booking, BookingKind, BookingStatus, PaymentStatus};
use travelbook::state::AppState;

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        staff_token: "test-token".to_string(),
    }
}

fn test_state() -> Arc<AppState> {
    let conn = db::init_db(":memory:").unwrap();
    Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: test_config(),
    })
}

fn test_app(state: Arc<AppState>) -> Router {
    handlers::router(state)
}

fn iso(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}

fn decimal(v: &serde_json::Value) -> Decimal {
    Decimal::from_str(v.as_str().unwrap()).unwrap()
}

async fn send(
    state: &Arc<AppState>,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
    token: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let res = test_app(state.clone()).oneshot(request).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}

async fn staff(
    state: &Arc<AppState>,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    send(state, method, uri, body, Some("test-token")).await
}

fn seed_booking(
    state: &Arc<AppState>,
    id: &str,
    kind: BookingKind,
    pickup_in: Duration,
    status: BookingStatus,
    payment: PaymentStatus,
) {
    let now = Utc::now().naive_utc();
    let booking = Booking {
        id: id.to_string(),
        kind,
        customer_name: "Minh Tran".to_string(),
        final_total: Decimal::from(1000),
        pickup_date: now + pickup_in,
        booking_status: status,
        payment_status: payment,
        payment_deadline: None,
        created_at: now,
        updated_at: now,
    };
    let db = state.db.lock().unwrap();
    queries::create_booking(&db, &booking).unwrap();
}

// ── Health & auth ──

#[tokio::test]
async fn test_health() {
    let state = test_state();
    let (status, json) = send(&state, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_staff_requires_auth() {
    let state = test_state();
    let (status, _) = send(&state, "GET", "/staff/bookings", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, json) = send(&state, "GET", "/staff/bookings", None, Some("wrong-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "unauthorized");
}

// ── Bookings ──

#[tokio::test]
async fn test_create_booking_projects_pending_status() {
    let state = test_state();
    let pickup = Utc::now().naive_utc() + Duration::days(7);

    let (status, json) = staff(
        &state,
        "POST",
        "/staff/bookings",
        Some(serde_json::json!({
            "kind": "tour",
            "customer_name": "Minh Tran",
            "final_total": "1500.00",
            "pickup_date": iso(&pickup),
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["booking_status"], 0);
    assert_eq!(json["payment_status"], 0);
    assert_eq!(json["status"]["label"], "Pending Processing");
    assert_eq!(json["status"]["permitted_actions"], serde_json::json!(["pay", "view_details"]));
}

#[tokio::test]
async fn test_create_booking_accepts_legacy_field_names() {
    let state = test_state();
    let pickup = Utc::now().naive_utc() + Duration::days(2);

    let (status, json) = staff(
        &state,
        "POST",
        "/staff/bookings",
        Some(serde_json::json!({
            "Kind": "car",
            "CustomerName": "Lan Pham",
            "FinalTotal": "80",
            "PickupDate": iso(&pickup),
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["kind"], "car");
    assert_eq!(json["status"]["label"], "Pending");
}

#[tokio::test]
async fn test_create_booking_validates_fields() {
    let state = test_state();
    let pickup = Utc::now().naive_utc() + Duration::days(2);

    let (status, json) = staff(
        &state,
        "POST",
        "/staff/bookings",
        Some(serde_json::json!({
            "kind": "car",
            "customer_name": "  ",
            "final_total": "80",
            "pickup_date": iso(&pickup),
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("customer_name"));
}

#[tokio::test]
async fn test_list_bookings_filters_by_status_and_kind() {
    let state = test_state();
    seed_booking(&state, "t-1", BookingKind::Tour, Duration::days(3), BookingStatus::Confirmed, PaymentStatus::Paid);
    seed_booking(&state, "t-2", BookingKind::Tour, Duration::days(4), BookingStatus::Pending, PaymentStatus::Unpaid);
    seed_booking(&state, "c-1", BookingKind::Car, Duration::days(5), BookingStatus::Confirmed, PaymentStatus::Paid);

    let (status, json) = staff(&state, "GET", "/staff/bookings?status=1&kind=tour", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 1);
    assert_eq!(json["items"][0]["id"], "t-1");
    assert_eq!(
        json["items"][0]["status"]["permitted_actions"],
        serde_json::json!(["view_details", "refund"])
    );

    let (_, json) = staff(&state, "GET", "/staff/bookings?limit=2&page=2", None).await;
    assert_eq!(json["total"], 3);
    assert_eq!(json["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_booking_rejects_oversized_total() {
    let state = test_state();
    let pickup = Utc::now().naive_utc() + Duration::days(10);

    let (status, json) = staff(
        &state,
        "POST",
        "/staff/bookings",
        Some(serde_json::json!({
            "kind": "tour",
            "customer_name": "Minh Tran",
            "final_total": "79228162514264337593543950335",
            "pickup_date": iso(&pickup),
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("final_total"));
}

#[tokio::test]
async fn test_list_bookings_rejects_page_past_range() {
    let state = test_state();
    let (status, _) = staff(
        &state,
        "GET",
        "/staff/bookings?page=9223372036854775807&limit=100",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = staff(&state, "GET", "/staff/bookings?page=1000&limit=100", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_list_bookings_rejects_unknown_status() {
    let state = test_state();
    let (status, json) = staff(&state, "GET", "/staff/bookings?status=99", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["reason"], "UnrecognizedStatus");
}

#[tokio::test]
async fn test_get_missing_booking() {
    let state = test_state();
    let (status, _) = staff(&state, "GET", "/staff/bookings/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Refunds ──

#[tokio::test]
async fn test_refund_quote_uses_notice_tiers() {
    let state = test_state();
    seed_booking(&state, "far", BookingKind::Car, Duration::days(10), BookingStatus::Confirmed, PaymentStatus::Paid);
    seed_booking(
        &state,
        "near",
        BookingKind::Car,
        Duration::days(3) + Duration::hours(12),
        BookingStatus::Confirmed,
        PaymentStatus::Paid,
    );

    let (status, json) = staff(&state, "GET", "/staff/bookings/far/refund-quote", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["percentage"], 95);
    assert_eq!(decimal(&json["amount"]), Decimal::from(950));

    let (_, json) = staff(&state, "GET", "/staff/bookings/near/refund-quote", None).await;
    assert_eq!(json["days_before"], 4);
    assert_eq!(json["percentage"], 90);
    assert_eq!(decimal(&json["amount"]), Decimal::from(900));
}

#[tokio::test]
async fn test_refund_rejected_when_unpaid() {
    let state = test_state();
    seed_booking(&state, "c-1", BookingKind::Car, Duration::days(10), BookingStatus::Pending, PaymentStatus::Unpaid);

    let (status, json) = staff(
        &state,
        "POST",
        "/staff/car-bookings/c-1/refund",
        Some(serde_json::json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["reason"], "NotPaid");
}

#[tokio::test]
async fn test_car_refund_marks_booking_refunded() {
    let state = test_state();
    seed_booking(&state, "c-1", BookingKind::Car, Duration::days(10), BookingStatus::Confirmed, PaymentStatus::Paid);

    let (status, json) = staff(
        &state,
        "POST",
        "/staff/car-bookings/c-1/refund",
        Some(serde_json::json!({"reason": "flight cancelled"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["refund"]["percentage"], 95);
    assert_eq!(decimal(&json["refund"]["amount"]), Decimal::from(950));
    assert_eq!(json["refund"]["reason"], "flight cancelled");

    let (_, json) = staff(&state, "GET", "/staff/bookings/c-1", None).await;
    assert_eq!(json["booking_status"], 5);
    assert_eq!(json["status"]["label"], "Refunded");
    assert_eq!(json["status"]["permitted_actions"], serde_json::json!(["view_details"]));

    let (status, json) = staff(
        &state,
        "POST",
        "/staff/car-bookings/c-1/refund",
        Some(serde_json::json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["reason"], "AlreadyRefunded");
}

#[tokio::test]
async fn test_car_refund_route_ignores_tour_bookings() {
    let state = test_state();
    seed_booking(&state, "t-1", BookingKind::Tour, Duration::days(10), BookingStatus::Confirmed, PaymentStatus::Paid);

    let (status, _) = staff(
        &state,
        "POST",
        "/staff/car-bookings/t-1/refund",
        Some(serde_json::json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_refund_override_amount() {
    let state = test_state();
    seed_booking(&state, "t-1", BookingKind::Tour, Duration::hours(-2), BookingStatus::InProgress, PaymentStatus::Paid);

    let (status, json) = staff(
        &state,
        "POST",
        "/staff/refunds",
        Some(serde_json::json!({"booking_id": "t-1", "amount": "1200"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["reason"], "AmountOutOfRange");

    let (status, json) = staff(
        &state,
        "POST",
        "/staff/refunds",
        Some(serde_json::json!({"booking_id": "t-1", "amount": "250.50"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["quote"]["percentage"], 0);
    assert_eq!(decimal(&json["refund"]["suggested_amount"]), Decimal::ZERO);
    assert_eq!(decimal(&json["refund"]["amount"]), Decimal::new(25050, 2));
}

// ── Payment ──

#[tokio::test]
async fn test_pay_pending_booking() {
    let state = test_state();
    seed_booking(&state, "t-1", BookingKind::Tour, Duration::days(10), BookingStatus::Pending, PaymentStatus::Unpaid);

    let (status, json) = send(&state, "POST", "/bookings/t-1/pay", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["payment_status"], 1);
    assert_eq!(json["booking_status"], 1);
    assert_eq!(json["status"]["label"], "Confirmed");

    let (status, json) = send(&state, "POST", "/bookings/t-1/pay", None, None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["reason"], "ActionNotPermitted");
}

#[tokio::test]
async fn test_pay_refused_after_deadline() {
    let state = test_state();
    let now = Utc::now().naive_utc();
    let booking = Booking {
        id: "t-late".to_string(),
        kind: BookingKind::Tour,
        customer_name: "Minh Tran".to_string(),
        final_total: Decimal::from(1000),
        pickup_date: now + Duration::days(10),
        booking_status: BookingStatus::Pending,
        payment_status: PaymentStatus::Unpaid,
        payment_deadline: Some(now - Duration::hours(1)),
        created_at: now - Duration::days(1),
        updated_at: now - Duration::days(1),
    };
    {
        let db = state.db.lock().unwrap();
        queries::create_booking(&db, &booking).unwrap();
    }

    let (status, json) = send(&state, "POST", "/bookings/t-late/pay", None, None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["reason"], "ActionNotPermitted");
}

// ── Tour schedules ──

async fn create_two_day_tour(state: &Arc<AppState>) -> String {
    let (status, json) = staff(
        state,
        "POST",
        "/staff/tour-details",
        Some(serde_json::json!({
            "tour_name": "Mekong Delta",
            "departure_date": "2025-07-01T08:00:00",
            "arrival_date": "2025-07-02T08:00:00",
            "price": "450",
            "capacity": 16,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["trip_length_days"], 2);
    json["id"].as_str().unwrap().to_string()
}

async fn add_day(state: &Arc<AppState>, detail_id: &str) -> (StatusCode, serde_json::Value) {
    staff(
        state,
        "POST",
        "/staff/tour-schedules",
        Some(serde_json::json!({ "tour_detail_id": detail_id })),
    )
    .await
}

async fn add_item(
    state: &Arc<AppState>,
    schedule_id: &str,
    sort_order: i64,
    time_info: &str,
) -> (StatusCode, serde_json::Value) {
    staff(
        state,
        "POST",
        &format!("/staff/tour-schedules/{schedule_id}/items"),
        Some(serde_json::json!({
            "sort_order": sort_order,
            "time_info": time_info,
            "activity": "Boat ride",
        })),
    )
    .await
}

#[tokio::test]
async fn test_tour_detail_rejects_reversed_dates() {
    let state = test_state();
    let (status, json) = staff(
        &state,
        "POST",
        "/staff/tour-details",
        Some(serde_json::json!({
            "tourName": "Backwards",
            "departureDate": "2025-07-05T08:00:00",
            "arrivalDate": "2025-07-01T08:00:00",
            "price": "100",
            "capacity": 4,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("arrival_date"));
}

#[tokio::test]
async fn test_days_are_created_in_sequence() {
    let state = test_state();
    let detail_id = create_two_day_tour(&state).await;

    let (status, day1) = add_day(&state, &detail_id).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(day1["day_number"], 1);
    let day1_id = day1["id"].as_str().unwrap().to_string();

    let (status, json) = add_day(&state, &detail_id).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["reason"], "PreviousDayEmpty");

    let (status, _) = add_item(&state, &day1_id, 1, "Morning").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, day2) = add_day(&state, &detail_id).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(day2["day_number"], 2);
    let day2_id = day2["id"].as_str().unwrap().to_string();
    add_item(&state, &day2_id, 1, "Full Day").await;

    let (status, json) = add_day(&state, &detail_id).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["reason"], "ExceedsTripLength");

    let (status, json) = staff(
        &state,
        "GET",
        &format!("/staff/tour-schedules?tour_detail_id={detail_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["days"].as_array().unwrap().len(), 2);
    assert_eq!(json["next_day"], serde_json::Value::Null);
    assert_eq!(json["blocked_reason"], "ExceedsTripLength");
}

#[tokio::test]
async fn test_only_last_day_can_be_deleted() {
    let state = test_state();
    let detail_id = create_two_day_tour(&state).await;

    let (_, day1) = add_day(&state, &detail_id).await;
    let day1_id = day1["id"].as_str().unwrap().to_string();
    add_item(&state, &day1_id, 1, "Morning").await;
    let (_, day2) = add_day(&state, &detail_id).await;
    let day2_id = day2["id"].as_str().unwrap().to_string();

    let (status, json) = staff(&state, "DELETE", &format!("/staff/tour-schedules/{day1_id}"), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["reason"], "NotLastDay");

    let (status, _) = staff(&state, "DELETE", &format!("/staff/tour-schedules/{day2_id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = staff(
        &state,
        "GET",
        &format!("/staff/tour-schedules?tour_detail_id={detail_id}"),
        None,
    )
    .await;
    assert_eq!(json["next_day"], 2);
}

#[tokio::test]
async fn test_item_time_rules() {
    let state = test_state();
    let detail_id = create_two_day_tour(&state).await;
    let (_, day1) = add_day(&state, &detail_id).await;
    let day1_id = day1["id"].as_str().unwrap().to_string();

    let (status, morning) = add_item(&state, &day1_id, 1, "Morning").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = add_item(&state, &day1_id, 2, "05:00 - 07:00").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["reason"], "TimeOrderViolation");

    let (_, json) = add_item(&state, &day1_id, 1, "Evening").await;
    assert_eq!(json["reason"], "DuplicateSortOrder");

    let (_, json) = add_item(&state, &day1_id, 2, "morning").await;
    assert_eq!(json["reason"], "DuplicateTimeSlot");

    let (_, json) = add_item(&state, &day1_id, 2, "after lunch").await;
    assert_eq!(json["reason"], "InvalidTimeInfo");

    let (status, _) = add_item(&state, &day1_id, 2, "14:00 - 16:30").await;
    assert_eq!(status, StatusCode::CREATED);

    // Editing an item may keep its own slot and order
    let morning_id = morning["id"].as_str().unwrap();
    let (status, json) = staff(
        &state,
        "PUT",
        &format!("/staff/tour-schedule-items/{morning_id}"),
        Some(serde_json::json!({
            "sortOrder": 1,
            "timeInfo": "Morning",
            "activity": "Floating market",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["activity"], "Floating market");

    let (status, json) = staff(
        &state,
        "PUT",
        &format!("/staff/tour-schedule-items/{morning_id}"),
        Some(serde_json::json!({
            "sort_order": 1,
            "time_info": "Night",
            "activity": "Floating market",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["reason"], "TimeOrderViolation");
}

#[tokio::test]
async fn test_schedule_title_update_and_item_delete() {
    let state = test_state();
    let detail_id = create_two_day_tour(&state).await;
    let (_, day1) = add_day(&state, &detail_id).await;
    let day1_id = day1["id"].as_str().unwrap().to_string();

    let (status, json) = staff(
        &state,
        "PUT",
        &format!("/staff/tour-schedules/{day1_id}"),
        Some(serde_json::json!({"title": "Arrival in Can Tho"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "Arrival in Can Tho");

    let (_, item) = add_item(&state, &day1_id, 1, "Afternoon").await;
    let item_id = item["id"].as_str().unwrap();

    let (status, _) = staff(&state, "DELETE", &format!("/staff/tour-schedule-items/{item_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = staff(&state, "DELETE", &format!("/staff/tour-schedule-items/{item_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
