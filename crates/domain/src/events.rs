// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Broadcast events for trip rooms.
//!
//! Events are facts about completed state transitions, emitted by the
//! engine and fanned out to every member of the affected trip's room.
//! They are informational; the acknowledgment a requester receives is
//! the authoritative outcome of its own request.

use crate::booking::BookingStatus;
use crate::ids::{BookingId, HolderId, SeatId};
use crate::payment::PaymentStatus;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A state-change event scoped to one trip.
///
/// Events for the same seat or booking are emitted in causal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TripEvent {
    /// A seat was locked or its lock was refreshed.
    SeatLocked {
        /// The locked seat.
        seat_id: SeatId,
        /// The lock holder.
        holder: HolderId,
        /// When the lock expires.
        #[serde(with = "time::serde::rfc3339")]
        expires_at: OffsetDateTime,
    },
    /// A lock was released by its holder (or by disconnect cleanup).
    SeatUnlocked {
        /// The released seat.
        seat_id: SeatId,
    },
    /// A seat returned to the sellable pool (lock expiry or booking
    /// cancellation).
    SeatAvailable {
        /// The freed seat.
        seat_id: SeatId,
    },
    /// A seat was committed to a booking.
    SeatBooked {
        /// The booked seat.
        seat_id: SeatId,
        /// The booking that committed it.
        booking_id: BookingId,
    },
    /// A booking was created.
    BookingCreated {
        /// The new booking.
        booking_id: BookingId,
        /// The holder that created it.
        holder: HolderId,
        /// The committed seats.
        seat_ids: Vec<SeatId>,
        /// Total amount in minor currency units.
        total_amount: i64,
        /// Initial status (always pending).
        status: BookingStatus,
        /// Creation time.
        #[serde(with = "time::serde::rfc3339")]
        booked_at: OffsetDateTime,
    },
    /// A booking moved to a status that keeps its seats (paid).
    BookingStatusUpdated {
        /// The booking.
        booking_id: BookingId,
        /// The new status.
        status: BookingStatus,
    },
    /// A booking was cancelled or expired and its seats were freed.
    BookingCancelled {
        /// The booking.
        booking_id: BookingId,
        /// The terminal status (cancelled or expired).
        status: BookingStatus,
        /// The freed seats.
        seat_ids: Vec<SeatId>,
    },
    /// A payment status was recorded for a booking.
    PaymentStatusUpdated {
        /// The booking.
        booking_id: BookingId,
        /// The reported payment status.
        status: PaymentStatus,
    },
}
