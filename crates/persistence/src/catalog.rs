// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Trip catalog storage: trips and their configured seat layouts.

use rusqlite::{Connection, Transaction, params};
use seatwise_domain::{Seat, SeatClass, SeatId, TripId};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::debug;

use crate::error::PersistenceError;

/// Inserts a trip and its seat layout within a transaction.
///
/// # Arguments
///
/// * `tx` - The active database transaction
/// * `trip_id` - The trip to insert
/// * `seats` - The configured seat layout
/// * `now` - The creation timestamp
///
/// # Errors
///
/// Returns an error if the trip already exists or the insert fails.
pub fn insert_trip(
    tx: &Transaction<'_>,
    trip_id: &TripId,
    seats: &[Seat],
    now: OffsetDateTime,
) -> Result<(), PersistenceError> {
    tx.execute(
        "INSERT INTO trips (trip_id, created_at) VALUES (?1, ?2)",
        params![trip_id.value(), now.format(&Rfc3339)?],
    )?;

    for seat in seats {
        tx.execute(
            "INSERT INTO seats (trip_id, seat_id, code, class, active)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                trip_id.value(),
                seat.seat_id.value(),
                seat.code,
                seat.class.as_str(),
                i32::from(seat.active),
            ],
        )?;
    }

    debug!(trip_id = %trip_id, seat_count = seats.len(), "Inserted trip catalog");

    Ok(())
}

/// Returns true if the trip exists in the catalog.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn trip_exists(conn: &Connection, trip_id: &TripId) -> Result<bool, PersistenceError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM trips WHERE trip_id = ?1",
        params![trip_id.value()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Lists all trip identifiers in the catalog.
///
/// # Errors
///
/// Returns an error if the query fails or a stored id is invalid.
pub fn list_trips(conn: &Connection) -> Result<Vec<TripId>, PersistenceError> {
    let mut stmt = conn.prepare("SELECT trip_id FROM trips ORDER BY trip_id ASC")?;
    let rows: Vec<String> = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<String>, rusqlite::Error>>()?;

    let mut trips: Vec<TripId> = Vec::with_capacity(rows.len());
    for raw in rows {
        trips.push(TripId::new(&raw)?);
    }
    Ok(trips)
}

/// Loads the seat layout for a trip.
///
/// # Errors
///
/// Returns `TripNotFound` if the trip does not exist, or an error if a
/// stored row cannot be converted back into a seat.
pub fn load_seats(conn: &Connection, trip_id: &TripId) -> Result<Vec<Seat>, PersistenceError> {
    if !trip_exists(conn, trip_id)? {
        return Err(PersistenceError::TripNotFound(trip_id.value().to_string()));
    }

    let mut stmt = conn.prepare(
        "SELECT seat_id, code, class, active
         FROM seats
         WHERE trip_id = ?1
         ORDER BY seat_id ASC",
    )?;

    let rows: Vec<(String, String, String, i64)> = stmt
        .query_map(params![trip_id.value()], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })?
        .collect::<Result<Vec<(String, String, String, i64)>, rusqlite::Error>>()?;

    let mut seats: Vec<Seat> = Vec::with_capacity(rows.len());
    for (seat_id, code, class, active) in rows {
        let class: SeatClass = class.parse()?;
        seats.push(Seat::new(SeatId::new(&seat_id)?, &code, class, active != 0)?);
    }
    Ok(seats)
}
