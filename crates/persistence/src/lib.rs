// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for the Seatwise reservation engine.
//!
//! Built on `SQLite` via `rusqlite`. Durable state is the trip catalog,
//! booking records, the latest payment report per booking and an
//! append-only booking event trail. Seat locks are deliberately never
//! persisted: they are volatile session state and a restart clears
//! them.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use rusqlite::{Connection, Transaction};
use seatwise_domain::{Booking, BookingId, PaymentUpdate, Seat, TripId};
use std::path::Path;
use time::OffsetDateTime;

mod bookings;
mod catalog;
mod error;
mod schema;

#[cfg(test)]
mod tests;

pub use error::PersistenceError;

/// Persistence adapter backed by a single `SQLite` connection.
pub struct SqlitePersistence {
    conn: Connection,
}

impl SqlitePersistence {
    /// Creates a new persistence adapter with an in-memory `SQLite`
    /// database.
    ///
    /// Each call receives a private database instance, which keeps
    /// tests isolated.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let conn: Connection = Connection::open_in_memory()
            .map_err(|e| PersistenceError::InitializationError(e.to_string()))?;
        schema::initialize_schema(&conn)?;

        let adapter: Self = Self { conn };
        adapter.verify_foreign_key_enforcement()?;
        Ok(adapter)
    }

    /// Creates a new persistence adapter with a file-based `SQLite`
    /// database.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the `SQLite` database file
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or
    /// initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let conn: Connection = Connection::open(path)
            .map_err(|e| PersistenceError::InitializationError(e.to_string()))?;

        // WAL mode for better read concurrency
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| PersistenceError::InitializationError(e.to_string()))?;

        schema::initialize_schema(&conn)?;

        let adapter: Self = Self { conn };
        adapter.verify_foreign_key_enforcement()?;
        Ok(adapter)
    }

    /// Verifies that foreign key enforcement is enabled.
    ///
    /// This is a startup-time check required to ensure referential
    /// integrity constraints are enforced.
    ///
    /// # Errors
    ///
    /// Returns an error if foreign key enforcement is not enabled.
    pub fn verify_foreign_key_enforcement(&self) -> Result<(), PersistenceError> {
        let enabled: i64 =
            self.conn
                .query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
        if enabled == 1 {
            Ok(())
        } else {
            Err(PersistenceError::ForeignKeyEnforcementNotEnabled)
        }
    }

    // ========================================================================
    // Trip catalog
    // ========================================================================

    /// Inserts a trip and its seat layout atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the trip already exists or the insert fails.
    pub fn insert_trip(
        &mut self,
        trip_id: &TripId,
        seats: &[Seat],
        now: OffsetDateTime,
    ) -> Result<(), PersistenceError> {
        let tx: Transaction<'_> = self.conn.transaction()?;
        catalog::insert_trip(&tx, trip_id, seats, now)?;
        tx.commit()?;
        Ok(())
    }

    /// Returns true if the trip exists in the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn trip_exists(&self, trip_id: &TripId) -> Result<bool, PersistenceError> {
        catalog::trip_exists(&self.conn, trip_id)
    }

    /// Lists all trip identifiers in the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_trips(&self) -> Result<Vec<TripId>, PersistenceError> {
        catalog::list_trips(&self.conn)
    }

    /// Loads the seat layout for a trip.
    ///
    /// # Errors
    ///
    /// Returns `TripNotFound` if the trip does not exist.
    pub fn load_seats(&self, trip_id: &TripId) -> Result<Vec<Seat>, PersistenceError> {
        catalog::load_seats(&self.conn, trip_id)
    }

    // ========================================================================
    // Bookings
    // ========================================================================

    /// Inserts a booking, its seat rows and a `booking_created` trail
    /// entry atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_booking(&mut self, booking: &Booking) -> Result<(), PersistenceError> {
        let tx: Transaction<'_> = self.conn.transaction()?;
        bookings::insert_booking(&tx, booking)?;
        bookings::append_booking_event(
            &tx,
            booking.booking_id,
            &booking.trip_id,
            "booking_created",
            &serde_json::json!({
                "holder": booking.holder.value(),
                "seat_count": booking.seat_ids.len(),
                "total_amount": booking.total_amount,
            }),
            booking.booked_at,
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Updates a booking's status and records a trail entry.
    ///
    /// # Arguments
    ///
    /// * `booking` - The booking after the transition
    /// * `kind` - The trail entry kind (e.g. `status_updated`,
    ///   `admin_cancelled`)
    /// * `detail` - Structured detail recorded with the trail entry
    /// * `now` - The transition timestamp
    ///
    /// # Errors
    ///
    /// Returns `BookingNotFound` if the booking does not exist.
    pub fn update_booking_status(
        &mut self,
        booking: &Booking,
        kind: &str,
        detail: &serde_json::Value,
        now: OffsetDateTime,
    ) -> Result<(), PersistenceError> {
        let tx: Transaction<'_> = self.conn.transaction()?;
        bookings::update_booking_status(
            &tx,
            booking.booking_id,
            booking.status,
            booking.cancelled_at,
        )?;
        bookings::append_booking_event(
            &tx,
            booking.booking_id,
            &booking.trip_id,
            kind,
            detail,
            now,
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Loads all bookings for a trip.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored row is invalid.
    pub fn load_bookings(&self, trip_id: &TripId) -> Result<Vec<Booking>, PersistenceError> {
        bookings::load_bookings(&self.conn, trip_id)
    }

    // ========================================================================
    // Payments
    // ========================================================================

    /// Records a payment report: upserts the latest-wins row and
    /// appends a trail entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn record_payment_update(
        &mut self,
        trip_id: &TripId,
        update: &PaymentUpdate,
    ) -> Result<(), PersistenceError> {
        let tx: Transaction<'_> = self.conn.transaction()?;
        bookings::upsert_payment_update(&tx, update)?;
        bookings::append_booking_event(
            &tx,
            update.booking_id,
            trip_id,
            "payment_recorded",
            &serde_json::json!({
                "status": update.status.as_str(),
                "transaction_id": update.transaction_id,
            }),
            update.updated_at,
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Retrieves the latest payment report for a booking, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored row is invalid.
    pub fn latest_payment_update(
        &self,
        booking_id: BookingId,
    ) -> Result<Option<PaymentUpdate>, PersistenceError> {
        bookings::latest_payment_update(&self.conn, booking_id)
    }

    /// Retrieves the event trail for a booking in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn booking_event_trail(
        &self,
        booking_id: BookingId,
    ) -> Result<Vec<(String, serde_json::Value)>, PersistenceError> {
        bookings::booking_event_trail(&self.conn, booking_id)
    }
}

impl std::fmt::Debug for SqlitePersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlitePersistence").finish_non_exhaustive()
    }
}
