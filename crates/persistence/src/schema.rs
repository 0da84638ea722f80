// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use rusqlite::Connection;
use tracing::info;

use crate::error::PersistenceError;

/// Initializes the database schema.
///
/// Seat locks are deliberately absent: locks are volatile and live only
/// in memory, so a restart clears them.
///
/// # Arguments
///
/// * `conn` - The database connection to initialize
///
/// # Errors
///
/// Returns an error if schema creation fails.
pub fn initialize_schema(conn: &Connection) -> Result<(), PersistenceError> {
    info!("Initializing database schema");

    // Enable foreign key enforcement
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute_batch(
        "
        -- Trip catalog
        CREATE TABLE IF NOT EXISTS trips (
            trip_id TEXT PRIMARY KEY NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS seats (
            trip_id TEXT NOT NULL,
            seat_id TEXT NOT NULL,
            code TEXT NOT NULL,
            class TEXT NOT NULL CHECK(class IN ('normal', 'vip', 'business')),
            active INTEGER NOT NULL DEFAULT 1 CHECK(active IN (0, 1)),
            PRIMARY KEY (trip_id, seat_id),
            FOREIGN KEY(trip_id) REFERENCES trips(trip_id)
        );

        -- Durable booking records
        CREATE TABLE IF NOT EXISTS bookings (
            booking_id TEXT PRIMARY KEY NOT NULL,
            trip_id TEXT NOT NULL,
            holder TEXT NOT NULL,
            total_amount INTEGER NOT NULL CHECK(total_amount >= 0),
            status TEXT NOT NULL
                CHECK(status IN ('pending', 'paid', 'cancelled', 'expired')),
            booked_at TEXT NOT NULL,
            cancelled_at TEXT,
            FOREIGN KEY(trip_id) REFERENCES trips(trip_id)
        );

        CREATE INDEX IF NOT EXISTS idx_bookings_trip
            ON bookings(trip_id);

        CREATE TABLE IF NOT EXISTS booking_seats (
            booking_id TEXT NOT NULL,
            trip_id TEXT NOT NULL,
            seat_id TEXT NOT NULL,
            PRIMARY KEY (booking_id, seat_id),
            FOREIGN KEY(booking_id) REFERENCES bookings(booking_id),
            FOREIGN KEY(trip_id, seat_id) REFERENCES seats(trip_id, seat_id)
        );

        -- Latest payment report per booking (upserted)
        CREATE TABLE IF NOT EXISTS payment_updates (
            booking_id TEXT PRIMARY KEY NOT NULL,
            status TEXT NOT NULL
                CHECK(status IN ('pending', 'completed', 'failed', 'refunded')),
            amount INTEGER,
            method TEXT,
            transaction_id TEXT,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(booking_id) REFERENCES bookings(booking_id)
        );

        -- Append-only booking lifecycle trail
        CREATE TABLE IF NOT EXISTS booking_events (
            event_id INTEGER PRIMARY KEY AUTOINCREMENT,
            booking_id TEXT NOT NULL,
            trip_id TEXT NOT NULL,
            kind TEXT NOT NULL,
            detail_json TEXT NOT NULL,
            recorded_at TEXT NOT NULL,
            FOREIGN KEY(booking_id) REFERENCES bookings(booking_id)
        );

        CREATE INDEX IF NOT EXISTS idx_booking_events_booking
            ON booking_events(booking_id, event_id);
        ",
    )?;

    Ok(())
}
