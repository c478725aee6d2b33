use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::check_auth;
use crate::db::queries::{self, BookingFilter};
use crate::errors::AppError;
use crate::models::{Booking, BookingKind, BookingStatus, PaymentStatus, Refund};
use crate::services::booking_status::{project_booking, Action, StatusProjection};
use crate::services::refund::{compute_refund, ensure_refundable, validate_override, RefundQuote};
use crate::services::rules::{validate, BOOKING_RULES};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Serialize)]
pub struct BookingResponse {
    #[serde(flatten)]
    booking: Booking,
    status: StatusProjection,
}

impl BookingResponse {
    fn new(booking: Booking, now: &NaiveDateTime) -> Self {
        let status = project_booking(&booking, now);
        Self { booking, status }
    }
}

// POST /staff/bookings
#[derive(Deserialize)]
pub struct CreateBookingRequest {
    #[serde(alias = "Kind")]
    pub kind: BookingKind,
    #[serde(alias = "CustomerName")]
    pub customer_name: String,
    #[serde(alias = "FinalTotal")]
    pub final_total: Decimal,
    #[serde(alias = "PickupDate", alias = "departure_date", alias = "DepartureDate")]
    pub pickup_date: NaiveDateTime,
    #[serde(default, alias = "PaymentDeadline")]
    pub payment_deadline: Option<NaiveDateTime>,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    check_auth(&headers, &state.config.staff_token)?;

    let now = Utc::now().naive_utc();
    let booking = Booking {
        id: uuid::Uuid::new_v4().to_string(),
        kind: body.kind,
        customer_name: body.customer_name.trim().to_string(),
        final_total: body.final_total,
        pickup_date: body.pickup_date,
        booking_status: BookingStatus::Pending,
        payment_status: PaymentStatus::Unpaid,
        payment_deadline: body.payment_deadline,
        created_at: now,
        updated_at: now,
    };
    validate(&booking, BOOKING_RULES)?;

    {
        let db = state.db()?;
        queries::create_booking(&db, &booking)?;
    }
    tracing::info!(booking_id = %booking.id, kind = booking.kind.as_str(), "booking created");

    Ok((StatusCode::CREATED, Json(BookingResponse::new(booking, &now))))
}

// GET /staff/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<i64>,
    pub kind: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct BookingPage {
    items: Vec<BookingResponse>,
    page: i64,
    limit: i64,
    total: i64,
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<BookingPage>, AppError> {
    check_auth(&headers, &state.config.staff_token)?;

    let status = query.status.map(BookingStatus::try_from).transpose()?;
    let kind = match query.kind.as_deref() {
        Some(k) => Some(
            BookingKind::parse(k)
                .ok_or_else(|| AppError::BadRequest(format!("unknown booking kind: {k}")))?,
        ),
        None => None,
    };
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1)
        .checked_mul(limit)
        .ok_or_else(|| AppError::BadRequest(format!("page {page} is out of range")))?;

    let filter = BookingFilter {
        status,
        kind,
        limit,
        offset,
    };

    let (bookings, total) = {
        let db = state.db()?;
        (
            queries::list_bookings(&db, &filter)?,
            queries::count_bookings(&db, &filter)?,
        )
    };

    let now = Utc::now().naive_utc();
    let items = bookings
        .into_iter()
        .map(|b| BookingResponse::new(b, &now))
        .collect();

    Ok(Json(BookingPage {
        items,
        page,
        limit,
        total,
    }))
}

fn load_booking(state: &AppState, id: &str) -> Result<Booking, AppError> {
    let db = state.db()?;
    queries::get_booking_by_id(&db, id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))
}

// GET /staff/bookings/:id
#[derive(Serialize)]
pub struct BookingDetailResponse {
    #[serde(flatten)]
    booking: BookingResponse,
    refunds: Vec<Refund>,
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<BookingDetailResponse>, AppError> {
    check_auth(&headers, &state.config.staff_token)?;

    let (booking, refunds) = {
        let db = state.db()?;
        let booking = queries::get_booking_by_id(&db, &id)?
            .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;
        let refunds = queries::get_refunds_for_booking(&db, &id)?;
        (booking, refunds)
    };

    Ok(Json(BookingDetailResponse {
        booking: BookingResponse::new(booking, &Utc::now().naive_utc()),
        refunds,
    }))
}

// GET /staff/bookings/:id/refund-quote
#[derive(Serialize)]
pub struct QuoteResponse {
    booking_id: String,
    final_total: Decimal,
    #[serde(flatten)]
    quote: RefundQuote,
}

pub async fn refund_quote(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<QuoteResponse>, AppError> {
    check_auth(&headers, &state.config.staff_token)?;

    let booking = load_booking(&state, &id)?;
    ensure_refundable(booking.payment_status, booking.booking_status)?;

    let quote = compute_refund(
        &booking.pickup_date,
        &Utc::now().naive_utc(),
        booking.final_total,
    );
    Ok(Json(QuoteResponse {
        booking_id: booking.id,
        final_total: booking.final_total,
        quote,
    }))
}

// POST /staff/car-bookings/:id/refund
#[derive(Deserialize, Default)]
pub struct RefundOverride {
    /// Replaces the computed amount when staff agree on a different figure.
    #[serde(default, alias = "Amount", alias = "refundAmount")]
    pub amount: Option<Decimal>,
    #[serde(default, alias = "Reason")]
    pub reason: Option<String>,
}

#[derive(Serialize)]
pub struct RefundResponse {
    refund: Refund,
    quote: RefundQuote,
}

pub async fn refund_car_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<RefundOverride>,
) -> Result<(StatusCode, Json<RefundResponse>), AppError> {
    check_auth(&headers, &state.config.staff_token)?;
    process_refund(&state, &id, Some(BookingKind::Car), body)
}

// POST /staff/refunds
#[derive(Deserialize)]
pub struct RefundRequest {
    #[serde(alias = "BookingId", alias = "bookingId")]
    pub booking_id: String,
    #[serde(flatten)]
    pub details: RefundOverride,
}

pub async fn create_refund(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<RefundRequest>,
) -> Result<(StatusCode, Json<RefundResponse>), AppError> {
    check_auth(&headers, &state.config.staff_token)?;
    process_refund(&state, &body.booking_id, None, body.details)
}

fn process_refund(
    state: &AppState,
    booking_id: &str,
    required_kind: Option<BookingKind>,
    body: RefundOverride,
) -> Result<(StatusCode, Json<RefundResponse>), AppError> {
    let now = Utc::now().naive_utc();
    let db = state.db()?;

    let booking = queries::get_booking_by_id(&db, booking_id)?
        .filter(|b| required_kind.map_or(true, |kind| b.kind == kind))
        .ok_or_else(|| AppError::NotFound(format!("booking {booking_id}")))?;

    ensure_refundable(booking.payment_status, booking.booking_status)?;

    let quote = compute_refund(&booking.pickup_date, &now, booking.final_total);
    let amount = match body.amount {
        Some(amount) => {
            validate_override(amount, booking.final_total)?;
            amount
        }
        None => quote.amount,
    };

    let refund = Refund {
        id: uuid::Uuid::new_v4().to_string(),
        booking_id: booking.id.clone(),
        percentage: quote.percentage,
        suggested_amount: quote.amount,
        amount,
        reason: body.reason.filter(|r| !r.trim().is_empty()),
        created_at: now,
    };
    queries::record_refund(&db, &refund)?;

    tracing::info!(
        booking_id = %booking.id,
        days_before = quote.days_before,
        percentage = quote.percentage,
        amount = %refund.amount,
        overridden = body.amount.is_some(),
        "refund recorded"
    );

    Ok((StatusCode::CREATED, Json(RefundResponse { refund, quote })))
}

// POST /bookings/:id/pay
pub async fn pay_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, AppError> {
    let now = Utc::now().naive_utc();
    let db = state.db()?;

    let booking = queries::get_booking_by_id(&db, &id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;
    project_booking(&booking, &now).require(Action::Pay)?;

    queries::mark_booking_paid(&db, &id)?;
    let booking = queries::get_booking_by_id(&db, &id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;
    tracing::info!(booking_id = %id, "booking paid");

    Ok(Json(BookingResponse::new(booking, &now)))
}
