// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use seatwise_domain::{
    Booking, BookingId, HolderId, Seat, SeatId, SeatLock, SeatStatus, TripEvent, TripId,
};
use std::collections::HashMap;
use time::OffsetDateTime;

/// The complete reservation state scoped to a single trip.
///
/// Seat status is derived, never stored: a seat is booked if an
/// occupying booking references it, locked if an unexpired lock exists
/// and it is not booked, otherwise available. Expired locks are
/// treated as absent by every read.
///
/// All mutating operations on one trip's seat set flow through
/// [`crate::apply`] while the caller holds that trip's lock; this is
/// what makes seat acquisition linearizable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripState {
    /// The trip this state is scoped to.
    pub trip_id: TripId,
    /// The trip's bus seat layout.
    pub seats: Vec<Seat>,
    /// Current locks keyed by seat. May contain expired entries until
    /// the next sweep; reads ignore them.
    pub locks: HashMap<SeatId, SeatLock>,
    /// All bookings for this trip, including terminal ones.
    pub bookings: Vec<Booking>,
}

impl TripState {
    /// Creates a new state for a trip with the given seat layout.
    #[must_use]
    pub fn new(trip_id: TripId, seats: Vec<Seat>) -> Self {
        Self {
            trip_id,
            seats,
            locks: HashMap::new(),
            bookings: Vec::new(),
        }
    }

    /// Looks up a seat in the layout.
    #[must_use]
    pub fn seat(&self, seat_id: &SeatId) -> Option<&Seat> {
        self.seats.iter().find(|s| &s.seat_id == seat_id)
    }

    /// Returns the unexpired lock on a seat, if any.
    #[must_use]
    pub fn live_lock(&self, seat_id: &SeatId, now: OffsetDateTime) -> Option<&SeatLock> {
        self.locks.get(seat_id).filter(|lock| !lock.is_expired(now))
    }

    /// Returns the occupying (pending or paid) booking that includes a
    /// seat, if any.
    #[must_use]
    pub fn occupying_booking(&self, seat_id: &SeatId) -> Option<&Booking> {
        self.bookings
            .iter()
            .find(|b| b.occupies_seats() && b.contains_seat(seat_id))
    }

    /// Derives a seat's current status.
    ///
    /// Booked wins over locked; an unexpired lock wins over available.
    #[must_use]
    pub fn seat_status(&self, seat_id: &SeatId, now: OffsetDateTime) -> SeatStatus {
        if self.occupying_booking(seat_id).is_some() {
            return SeatStatus::Booked;
        }
        if self.live_lock(seat_id, now).is_some() {
            return SeatStatus::Locked;
        }
        SeatStatus::Available
    }

    /// Derives the status of every seat in the layout.
    #[must_use]
    pub fn seat_statuses(&self, now: OffsetDateTime) -> Vec<(SeatId, SeatStatus)> {
        self.seats
            .iter()
            .map(|seat| (seat.seat_id.clone(), self.seat_status(&seat.seat_id, now)))
            .collect()
    }

    /// Returns the bookings whose seats are out of the sellable pool.
    ///
    /// This is the snapshot delivered to clients joining a trip room
    /// late.
    #[must_use]
    pub fn active_bookings(&self) -> Vec<&Booking> {
        self.bookings.iter().filter(|b| b.occupies_seats()).collect()
    }

    /// Looks up a booking by identifier.
    #[must_use]
    pub fn find_booking(&self, booking_id: BookingId) -> Option<&Booking> {
        self.bookings.iter().find(|b| b.booking_id == booking_id)
    }

    /// Returns the seats the holder currently has live locks on,
    /// sorted for deterministic iteration.
    #[must_use]
    pub fn holder_locks(&self, holder: &HolderId, now: OffsetDateTime) -> Vec<SeatId> {
        let mut seats: Vec<SeatId> = self
            .locks
            .values()
            .filter(|lock| &lock.holder == holder && !lock.is_expired(now))
            .map(|lock| lock.seat_id.clone())
            .collect();
        seats.sort();
        seats
    }
}

/// The result of a successful state transition.
///
/// Transitions are atomic: they either succeed completely or fail
/// without side effects. The events describe what changed and are
/// broadcast to the trip's room by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    /// The new state after the transition.
    pub new_state: TripState,
    /// Events describing the transition, in causal order per seat and
    /// booking.
    pub events: Vec<TripEvent>,
}
