pub mod bookings;
pub mod health;
pub mod tours;

use std::sync::Arc;

use axum::http::HeaderMap;
use axum::routing::{get, post, put};
use axum::Router;

use crate::errors::AppError;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/staff/bookings",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route("/staff/bookings/:id", get(bookings::get_booking))
        .route(
            "/staff/bookings/:id/refund-quote",
            get(bookings::refund_quote),
        )
        .route(
            "/staff/car-bookings/:id/refund",
            post(bookings::refund_car_booking),
        )
        .route("/staff/refunds", post(bookings::create_refund))
        .route("/bookings/:id/pay", post(bookings::pay_booking))
        .route("/staff/tour-details", post(tours::create_tour_detail))
        .route("/staff/tour-details/:id", get(tours::get_tour_detail))
        .route(
            "/staff/tour-schedules",
            get(tours::list_schedules).post(tours::create_schedule),
        )
        .route(
            "/staff/tour-schedules/:id",
            put(tours::update_schedule).delete(tours::delete_schedule),
        )
        .route("/staff/tour-schedules/:id/items", post(tours::create_item))
        .route(
            "/staff/tour-schedule-items/:id",
            put(tours::update_item).delete(tours::delete_item),
        )
        .with_state(state)
}

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() || token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}
