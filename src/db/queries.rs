use std::str::FromStr;

use anyhow::Context;
use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::models::{
    Booking, BookingKind, BookingStatus, PaymentStatus, Refund, ScheduleItem, TourDetail,
    TourSchedule,
};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn fmt_ts(ts: &NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

fn parse_ts(s: &str) -> anyhow::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TS_FORMAT).with_context(|| format!("bad timestamp: {s}"))
}

fn parse_decimal(s: &str) -> anyhow::Result<Decimal> {
    Decimal::from_str(s).with_context(|| format!("bad decimal: {s}"))
}

// ── Bookings ──

const BOOKING_COLUMNS: &str = "id, kind, customer_name, final_total, pickup_date, booking_status, \
     payment_status, payment_deadline, created_at, updated_at";

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, kind, customer_name, final_total, pickup_date, booking_status,
             payment_status, payment_deadline, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            booking.id,
            booking.kind.as_str(),
            booking.customer_name,
            booking.final_total.to_string(),
            fmt_ts(&booking.pickup_date),
            booking.booking_status.code(),
            booking.payment_status.code(),
            booking.payment_deadline.as_ref().map(fmt_ts),
            fmt_ts(&booking.created_at),
            fmt_ts(&booking.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1");
    let row = conn
        .query_row(&sql, params![id], |row| Ok(parse_booking_row(row)))
        .optional()?;
    row.transpose()
}

#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub kind: Option<BookingKind>,
    pub limit: i64,
    pub offset: i64,
}

fn filter_clause(filter: &BookingFilter) -> (String, Vec<Box<dyn rusqlite::types::ToSql>>) {
    let mut clauses = vec![];
    let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![];

    if let Some(status) = filter.status {
        values.push(Box::new(status.code()));
        clauses.push(format!("booking_status = ?{}", values.len()));
    }
    if let Some(kind) = filter.kind {
        values.push(Box::new(kind.as_str()));
        clauses.push(format!("kind = ?{}", values.len()));
    }

    let clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    (clause, values)
}

pub fn list_bookings(conn: &Connection, filter: &BookingFilter) -> anyhow::Result<Vec<Booking>> {
    let (clause, mut values) = filter_clause(filter);
    values.push(Box::new(filter.limit));
    let limit_idx = values.len();
    values.push(Box::new(filter.offset));
    let offset_idx = values.len();

    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings {clause} \
         ORDER BY pickup_date DESC, id ASC LIMIT ?{limit_idx} OFFSET ?{offset_idx}"
    );
    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn count_bookings(conn: &Connection, filter: &BookingFilter) -> anyhow::Result<i64> {
    let (clause, values) = filter_clause(filter);
    let sql = format!("SELECT COUNT(*) FROM bookings {clause}");
    let params_refs: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|p| p.as_ref()).collect();
    let count = conn.query_row(&sql, params_refs.as_slice(), |row| row.get(0))?;
    Ok(count)
}

/// Marks a booking paid and confirmed. Returns false when no row matched.
pub fn mark_booking_paid(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let now = fmt_ts(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE bookings SET payment_status = ?1, booking_status = ?2, updated_at = ?3 WHERE id = ?4",
        params![
            PaymentStatus::Paid.code(),
            BookingStatus::Confirmed.code(),
            now,
            id
        ],
    )?;
    Ok(count > 0)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let kind_str: String = row.get(1)?;
    let final_total_str: String = row.get(3)?;
    let pickup_str: String = row.get(4)?;
    let status_code: i64 = row.get(5)?;
    let payment_code: i64 = row.get(6)?;
    let deadline_str: Option<String> = row.get(7)?;
    let created_at_str: String = row.get(8)?;
    let updated_at_str: String = row.get(9)?;

    Ok(Booking {
        id: row.get(0)?,
        kind: BookingKind::parse(&kind_str)
            .ok_or_else(|| anyhow::anyhow!("unknown booking kind: {kind_str}"))?,
        customer_name: row.get(2)?,
        final_total: parse_decimal(&final_total_str)?,
        pickup_date: parse_ts(&pickup_str)?,
        booking_status: BookingStatus::try_from(status_code)?,
        payment_status: PaymentStatus::try_from(payment_code)?,
        payment_deadline: deadline_str.as_deref().map(parse_ts).transpose()?,
        created_at: parse_ts(&created_at_str)?,
        updated_at: parse_ts(&updated_at_str)?,
    })
}

// ── Refunds ──

/// Stores the refund and flips the booking to Refunded in one transaction.
pub fn record_refund(conn: &Connection, refund: &Refund) -> anyhow::Result<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute(
        "INSERT INTO refunds (id, booking_id, percentage, suggested_amount, amount, reason, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            refund.id,
            refund.booking_id,
            refund.percentage,
            refund.suggested_amount.to_string(),
            refund.amount.to_string(),
            refund.reason,
            fmt_ts(&refund.created_at),
        ],
    )?;

    let updated = tx.execute(
        "UPDATE bookings SET booking_status = ?1, updated_at = ?2 WHERE id = ?3",
        params![
            BookingStatus::Refunded.code(),
            fmt_ts(&refund.created_at),
            refund.booking_id
        ],
    )?;
    anyhow::ensure!(updated == 1, "booking {} vanished during refund", refund.booking_id);

    tx.commit()?;
    Ok(())
}

pub fn get_refunds_for_booking(conn: &Connection, booking_id: &str) -> anyhow::Result<Vec<Refund>> {
    let mut stmt = conn.prepare(
        "SELECT id, booking_id, percentage, suggested_amount, amount, reason, created_at
         FROM refunds WHERE booking_id = ?1 ORDER BY created_at ASC",
    )?;

    let rows = stmt.query_map(params![booking_id], |row| Ok(parse_refund_row(row)))?;

    let mut refunds = vec![];
    for row in rows {
        refunds.push(row??);
    }
    Ok(refunds)
}

fn parse_refund_row(row: &rusqlite::Row) -> anyhow::Result<Refund> {
    let suggested_str: String = row.get(3)?;
    let amount_str: String = row.get(4)?;
    let created_at_str: String = row.get(6)?;

    Ok(Refund {
        id: row.get(0)?,
        booking_id: row.get(1)?,
        percentage: row.get(2)?,
        suggested_amount: parse_decimal(&suggested_str)?,
        amount: parse_decimal(&amount_str)?,
        reason: row.get(5)?,
        created_at: parse_ts(&created_at_str)?,
    })
}

// ── Tour details ──

pub fn create_tour_detail(conn: &Connection, detail: &TourDetail) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO tour_details (id, tour_name, departure_date, arrival_date, price, capacity, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            detail.id,
            detail.tour_name,
            fmt_ts(&detail.departure_date),
            fmt_ts(&detail.arrival_date),
            detail.price.to_string(),
            detail.capacity,
            fmt_ts(&detail.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_tour_detail(conn: &Connection, id: &str) -> anyhow::Result<Option<TourDetail>> {
    let row = conn
        .query_row(
            "SELECT id, tour_name, departure_date, arrival_date, price, capacity, created_at
             FROM tour_details WHERE id = ?1",
            params![id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, String>(6)?,
                ))
            },
        )
        .optional()?;

    let Some((id, tour_name, departure, arrival, price, capacity, created_at)) = row else {
        return Ok(None);
    };
    Ok(Some(TourDetail {
        id,
        tour_name,
        departure_date: parse_ts(&departure)?,
        arrival_date: parse_ts(&arrival)?,
        price: parse_decimal(&price)?,
        capacity,
        created_at: parse_ts(&created_at)?,
    }))
}

// ── Schedules ──

pub fn list_schedules(conn: &Connection, tour_detail_id: &str) -> anyhow::Result<Vec<TourSchedule>> {
    let mut stmt = conn.prepare(
        "SELECT id, tour_detail_id, day_number, title FROM tour_schedules
         WHERE tour_detail_id = ?1 ORDER BY day_number ASC",
    )?;
    let rows = stmt.query_map(params![tour_detail_id], |row| {
        Ok(TourSchedule {
            id: row.get(0)?,
            tour_detail_id: row.get(1)?,
            day_number: row.get(2)?,
            title: row.get(3)?,
            items: vec![],
        })
    })?;

    let mut schedules = vec![];
    for row in rows {
        let mut schedule = row?;
        schedule.items = list_items(conn, &schedule.id)?;
        schedules.push(schedule);
    }
    Ok(schedules)
}

pub fn get_schedule(conn: &Connection, id: &str) -> anyhow::Result<Option<TourSchedule>> {
    let schedule = conn
        .query_row(
            "SELECT id, tour_detail_id, day_number, title FROM tour_schedules WHERE id = ?1",
            params![id],
            |row| {
                Ok(TourSchedule {
                    id: row.get(0)?,
                    tour_detail_id: row.get(1)?,
                    day_number: row.get(2)?,
                    title: row.get(3)?,
                    items: vec![],
                })
            },
        )
        .optional()?;

    match schedule {
        Some(mut schedule) => {
            schedule.items = list_items(conn, &schedule.id)?;
            Ok(Some(schedule))
        }
        None => Ok(None),
    }
}

pub fn create_schedule(conn: &Connection, schedule: &TourSchedule) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO tour_schedules (id, tour_detail_id, day_number, title) VALUES (?1, ?2, ?3, ?4)",
        params![
            schedule.id,
            schedule.tour_detail_id,
            schedule.day_number,
            schedule.title
        ],
    )?;
    Ok(())
}

pub fn update_schedule_title(conn: &Connection, id: &str, title: Option<&str>) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE tour_schedules SET title = ?1 WHERE id = ?2",
        params![title, id],
    )?;
    Ok(count > 0)
}

/// Deletes a day; its items go with it through the cascade.
pub fn delete_schedule(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM tour_schedules WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

// ── Schedule items ──

const ITEM_COLUMNS: &str = "id, schedule_id, sort_order, time_info, activity, description";

fn item_from_row(row: &rusqlite::Row) -> rusqlite::Result<ScheduleItem> {
    Ok(ScheduleItem {
        id: row.get(0)?,
        schedule_id: row.get(1)?,
        sort_order: row.get(2)?,
        time_info: row.get(3)?,
        activity: row.get(4)?,
        description: row.get(5)?,
    })
}

pub fn list_items(conn: &Connection, schedule_id: &str) -> anyhow::Result<Vec<ScheduleItem>> {
    let sql = format!(
        "SELECT {ITEM_COLUMNS} FROM schedule_items WHERE schedule_id = ?1 ORDER BY sort_order ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let items = stmt
        .query_map(params![schedule_id], item_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(items)
}

pub fn get_item(conn: &Connection, id: &str) -> anyhow::Result<Option<ScheduleItem>> {
    let sql = format!("SELECT {ITEM_COLUMNS} FROM schedule_items WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id], item_from_row).optional()?)
}

pub fn create_item(conn: &Connection, item: &ScheduleItem) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO schedule_items (id, schedule_id, sort_order, time_info, activity, description)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            item.id,
            item.schedule_id,
            item.sort_order,
            item.time_info,
            item.activity,
            item.description
        ],
    )?;
    Ok(())
}

pub fn update_item(conn: &Connection, item: &ScheduleItem) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE schedule_items SET sort_order = ?1, time_info = ?2, activity = ?3, description = ?4
         WHERE id = ?5",
        params![
            item.sort_order,
            item.time_info,
            item.activity,
            item.description,
            item.id
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_item(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM schedule_items WHERE id = ?1", params![id])?;
    Ok(count > 0)
}
