// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Request and response types for the engine API boundary.

use seatwise_domain::{Booking, BookingStatus, Seat, SeatClass, SeatStatus};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A seat entry in a catalog bootstrap request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatSpec {
    /// Stable seat identifier.
    pub seat_id: String,
    /// Human-readable seat code (e.g. "12A").
    pub code: String,
    /// Seat class: `normal`, `vip` or `business`.
    pub class: String,
    /// Whether the seat is sellable. Defaults to true.
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

/// Request to register a trip and its seat layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTripRequest {
    /// The trip identifier.
    pub trip_id: String,
    /// The configured seat layout.
    pub seats: Vec<SeatSpec>,
}

/// A seat with its derived per-trip status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatStatusInfo {
    /// Stable seat identifier.
    pub seat_id: String,
    /// Human-readable seat code.
    pub code: String,
    /// Seat class.
    pub class: SeatClass,
    /// Whether the seat is sellable.
    pub active: bool,
    /// Derived status at the time of the query.
    pub status: SeatStatus,
}

/// A booking as exposed at the API boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingInfo {
    /// Booking identifier.
    pub booking_id: String,
    /// The session or user that created the booking.
    pub holder: String,
    /// The committed seats.
    pub seat_ids: Vec<String>,
    /// Total amount in minor currency units.
    pub total_amount: i64,
    /// Current lifecycle status.
    pub status: BookingStatus,
    /// When the booking was created.
    #[serde(with = "time::serde::rfc3339")]
    pub booked_at: OffsetDateTime,
    /// When the booking was cancelled or expired, if it was.
    #[serde(with = "time::serde::rfc3339::option")]
    pub cancelled_at: Option<OffsetDateTime>,
}

impl BookingInfo {
    /// Builds the API view of a booking.
    #[must_use]
    pub fn from_booking(booking: &Booking) -> Self {
        Self {
            booking_id: booking.booking_id.to_string(),
            holder: booking.holder.value().to_string(),
            seat_ids: booking
                .seat_ids
                .iter()
                .map(|s| s.value().to_string())
                .collect(),
            total_amount: booking.total_amount,
            status: booking.status,
            booked_at: booking.booked_at,
            cancelled_at: booking.cancelled_at,
        }
    }
}

/// A consistent point-in-time view of one trip, delivered to clients
/// joining the trip's room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripSnapshot {
    /// The trip the snapshot describes.
    pub trip_id: String,
    /// Every seat with its derived status.
    pub seats: Vec<SeatStatusInfo>,
    /// Bookings whose seats are out of the sellable pool.
    pub bookings: Vec<BookingInfo>,
}

/// Acknowledgment for a lock acquisition or refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockAck {
    /// The locked seat.
    pub seat_id: String,
    /// When the lock expires.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

/// Builds the seat status listing from a layout and derived statuses.
#[must_use]
pub fn seat_status_listing(seats: &[Seat], statuses: &[(seatwise_domain::SeatId, SeatStatus)]) -> Vec<SeatStatusInfo> {
    seats
        .iter()
        .map(|seat| {
            let status: SeatStatus = statuses
                .iter()
                .find(|(seat_id, _)| seat_id == &seat.seat_id)
                .map_or(SeatStatus::Available, |(_, status)| *status);
            SeatStatusInfo {
                seat_id: seat.seat_id.value().to_string(),
                code: seat.code.clone(),
                class: seat.class,
                active: seat.active,
                status,
            }
        })
        .collect()
}
