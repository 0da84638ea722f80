// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Durable booking records, payment reports and the booking event
//! trail.

use rusqlite::{Connection, OptionalExtension, Transaction, params};
use seatwise_domain::{
    Booking, BookingId, BookingStatus, HolderId, PaymentStatus, PaymentUpdate, SeatId, TripId,
};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::debug;

use crate::error::PersistenceError;

/// Inserts a booking and its seat rows within a transaction.
///
/// # Arguments
///
/// * `tx` - The active database transaction
/// * `booking` - The booking to persist
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_booking(tx: &Transaction<'_>, booking: &Booking) -> Result<(), PersistenceError> {
    let cancelled_at: Option<String> = match booking.cancelled_at {
        Some(ts) => Some(ts.format(&Rfc3339)?),
        None => None,
    };

    tx.execute(
        "INSERT INTO bookings (
            booking_id, trip_id, holder, total_amount, status, booked_at, cancelled_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            booking.booking_id.to_string(),
            booking.trip_id.value(),
            booking.holder.value(),
            booking.total_amount,
            booking.status.as_str(),
            booking.booked_at.format(&Rfc3339)?,
            cancelled_at,
        ],
    )?;

    for seat_id in &booking.seat_ids {
        tx.execute(
            "INSERT INTO booking_seats (booking_id, trip_id, seat_id) VALUES (?1, ?2, ?3)",
            params![
                booking.booking_id.to_string(),
                booking.trip_id.value(),
                seat_id.value(),
            ],
        )?;
    }

    debug!(
        booking_id = %booking.booking_id,
        trip_id = %booking.trip_id,
        seat_count = booking.seat_ids.len(),
        "Inserted booking"
    );

    Ok(())
}

/// Updates a booking's status and cancellation timestamp.
///
/// # Errors
///
/// Returns `BookingNotFound` if no row was updated.
pub fn update_booking_status(
    conn: &Connection,
    booking_id: BookingId,
    status: BookingStatus,
    cancelled_at: Option<OffsetDateTime>,
) -> Result<(), PersistenceError> {
    let cancelled_at: Option<String> = match cancelled_at {
        Some(ts) => Some(ts.format(&Rfc3339)?),
        None => None,
    };

    let updated: usize = conn.execute(
        "UPDATE bookings SET status = ?2, cancelled_at = ?3 WHERE booking_id = ?1",
        params![booking_id.to_string(), status.as_str(), cancelled_at],
    )?;

    if updated == 0 {
        return Err(PersistenceError::BookingNotFound(booking_id.to_string()));
    }

    debug!(booking_id = %booking_id, status = %status, "Updated booking status");

    Ok(())
}

/// Upserts the latest payment report for a booking.
///
/// Only the most recent report per booking is retained; the event
/// trail keeps the history.
///
/// # Errors
///
/// Returns an error if the upsert fails.
pub fn upsert_payment_update(
    conn: &Connection,
    update: &PaymentUpdate,
) -> Result<(), PersistenceError> {
    conn.execute(
        "INSERT INTO payment_updates (
            booking_id, status, amount, method, transaction_id, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(booking_id) DO UPDATE SET
            status = excluded.status,
            amount = excluded.amount,
            method = excluded.method,
            transaction_id = excluded.transaction_id,
            updated_at = excluded.updated_at",
        params![
            update.booking_id.to_string(),
            update.status.as_str(),
            update.amount,
            update.method,
            update.transaction_id,
            update.updated_at.format(&Rfc3339)?,
        ],
    )?;

    Ok(())
}

/// Retrieves the latest payment report for a booking, if any.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is invalid.
pub fn latest_payment_update(
    conn: &Connection,
    booking_id: BookingId,
) -> Result<Option<PaymentUpdate>, PersistenceError> {
    let row: Option<(String, Option<i64>, Option<String>, Option<String>, String)> = conn
        .query_row(
            "SELECT status, amount, method, transaction_id, updated_at
             FROM payment_updates
             WHERE booking_id = ?1",
            params![booking_id.to_string()],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            },
        )
        .optional()?;

    match row {
        Some((status, amount, method, transaction_id, updated_at)) => {
            let status: PaymentStatus = status.parse()?;
            Ok(Some(PaymentUpdate {
                booking_id,
                status,
                amount,
                method,
                transaction_id,
                updated_at: OffsetDateTime::parse(&updated_at, &Rfc3339)?,
            }))
        }
        None => Ok(None),
    }
}

/// Appends an entry to the booking event trail.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `booking_id` - The booking the event belongs to
/// * `trip_id` - The trip the booking belongs to
/// * `kind` - A short event kind label (e.g. `booking_created`)
/// * `detail` - Structured event detail, stored as JSON
/// * `now` - The event timestamp
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn append_booking_event(
    conn: &Connection,
    booking_id: BookingId,
    trip_id: &TripId,
    kind: &str,
    detail: &serde_json::Value,
    now: OffsetDateTime,
) -> Result<(), PersistenceError> {
    conn.execute(
        "INSERT INTO booking_events (booking_id, trip_id, kind, detail_json, recorded_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            booking_id.to_string(),
            trip_id.value(),
            kind,
            serde_json::to_string(detail)?,
            now.format(&Rfc3339)?,
        ],
    )?;

    Ok(())
}

/// Retrieves the event trail for a booking in insertion order.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is invalid.
pub fn booking_event_trail(
    conn: &Connection,
    booking_id: BookingId,
) -> Result<Vec<(String, serde_json::Value)>, PersistenceError> {
    let mut stmt = conn.prepare(
        "SELECT kind, detail_json
         FROM booking_events
         WHERE booking_id = ?1
         ORDER BY event_id ASC",
    )?;

    let rows: Vec<(String, String)> = stmt
        .query_map(params![booking_id.to_string()], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?
        .collect::<Result<Vec<(String, String)>, rusqlite::Error>>()?;

    let mut trail: Vec<(String, serde_json::Value)> = Vec::with_capacity(rows.len());
    for (kind, detail_json) in rows {
        trail.push((kind, serde_json::from_str(&detail_json)?));
    }
    Ok(trail)
}

/// Loads all bookings for a trip, newest last.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row cannot be
/// converted back into a booking.
pub fn load_bookings(conn: &Connection, trip_id: &TripId) -> Result<Vec<Booking>, PersistenceError> {
    let mut stmt = conn.prepare(
        "SELECT booking_id, holder, total_amount, status, booked_at, cancelled_at
         FROM bookings
         WHERE trip_id = ?1
         ORDER BY booked_at ASC, booking_id ASC",
    )?;

    let rows: Vec<(String, String, i64, String, String, Option<String>)> = stmt
        .query_map(params![trip_id.value()], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
            ))
        })?
        .collect::<Result<Vec<(String, String, i64, String, String, Option<String>)>, rusqlite::Error>>()?;

    let mut bookings: Vec<Booking> = Vec::with_capacity(rows.len());
    for (booking_id, holder, total_amount, status, booked_at, cancelled_at) in rows {
        let booking_id: BookingId = booking_id.parse()?;
        let status: BookingStatus = status.parse()?;
        let cancelled_at: Option<OffsetDateTime> = match cancelled_at {
            Some(raw) => Some(OffsetDateTime::parse(&raw, &Rfc3339)?),
            None => None,
        };
        let seat_ids: Vec<SeatId> = load_booking_seats(conn, booking_id)?;

        bookings.push(Booking {
            booking_id,
            trip_id: trip_id.clone(),
            holder: HolderId::new(&holder)?,
            seat_ids,
            total_amount,
            status,
            booked_at: OffsetDateTime::parse(&booked_at, &Rfc3339)?,
            cancelled_at,
        });
    }
    Ok(bookings)
}

fn load_booking_seats(
    conn: &Connection,
    booking_id: BookingId,
) -> Result<Vec<SeatId>, PersistenceError> {
    let mut stmt = conn.prepare(
        "SELECT seat_id FROM booking_seats WHERE booking_id = ?1 ORDER BY seat_id ASC",
    )?;

    let rows: Vec<String> = stmt
        .query_map(params![booking_id.to_string()], |row| {
            row.get::<_, String>(0)
        })?
        .collect::<Result<Vec<String>, rusqlite::Error>>()?;

    let mut seat_ids: Vec<SeatId> = Vec::with_capacity(rows.len());
    for raw in rows {
        seat_ids.push(SeatId::new(&raw)?);
    }
    Ok(seat_ids)
}
