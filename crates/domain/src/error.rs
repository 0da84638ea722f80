// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::booking::BookingStatus;
use crate::ids::{HolderId, SeatId};

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Trip identifier is empty or invalid.
    InvalidTripId(String),
    /// Seat identifier is empty or invalid.
    InvalidSeatId(String),
    /// Holder identifier is empty or invalid.
    InvalidHolderId(String),
    /// Booking identifier is not a valid UUID.
    InvalidBookingId(String),
    /// Seat code is empty or invalid.
    InvalidSeatCode(String),
    /// Amount is negative.
    InvalidAmount {
        /// The rejected amount.
        amount: i64,
    },
    /// Seat class string is not recognized.
    InvalidSeatClass(String),
    /// Booking status string is not recognized.
    InvalidBookingStatus(String),
    /// Payment status string is not recognized.
    InvalidPaymentStatus(String),
    /// Payment failure policy string is not recognized.
    InvalidPaymentPolicy(String),
    /// Trip does not exist.
    TripNotFound(String),
    /// Seat does not exist on the trip's bus.
    SeatNotFound {
        /// The unknown seat.
        seat_id: SeatId,
    },
    /// Seat exists but is not sellable.
    SeatInactive {
        /// The inactive seat.
        seat_id: SeatId,
    },
    /// Seat is locked by a different holder.
    SeatAlreadyLocked {
        /// The contested seat.
        seat_id: SeatId,
        /// The current lock holder.
        holder: HolderId,
    },
    /// Seat is committed to an occupying booking.
    SeatAlreadyBooked {
        /// The booked seat.
        seat_id: SeatId,
    },
    /// Caller does not hold the lock it tried to refresh.
    NotLockHolder {
        /// The seat in question.
        seat_id: SeatId,
    },
    /// Booking creation requires every seat to be locked by the
    /// requester.
    SeatNotLockedByHolder {
        /// The first offending seat.
        seat_id: SeatId,
    },
    /// Booking requested with no seats.
    EmptySeatSelection,
    /// The same seat appears twice in one booking request.
    DuplicateSeatSelection {
        /// The duplicated seat.
        seat_id: SeatId,
    },
    /// Booking does not exist.
    BookingNotFound(String),
    /// The requested booking status transition is not permitted.
    InvalidBookingTransition {
        /// Current status.
        from: BookingStatus,
        /// Requested status.
        to: BookingStatus,
    },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTripId(msg) => write!(f, "Invalid trip id: {msg}"),
            Self::InvalidSeatId(msg) => write!(f, "Invalid seat id: {msg}"),
            Self::InvalidHolderId(msg) => write!(f, "Invalid holder id: {msg}"),
            Self::InvalidBookingId(msg) => write!(f, "Invalid booking id: {msg}"),
            Self::InvalidSeatCode(msg) => write!(f, "Invalid seat code: {msg}"),
            Self::InvalidAmount { amount } => {
                write!(f, "Invalid amount: {amount}. Must not be negative")
            }
            Self::InvalidSeatClass(s) => write!(f, "Invalid seat class: '{s}'"),
            Self::InvalidBookingStatus(s) => write!(f, "Invalid booking status: '{s}'"),
            Self::InvalidPaymentStatus(s) => write!(f, "Invalid payment status: '{s}'"),
            Self::InvalidPaymentPolicy(s) => write!(f, "Invalid payment failure policy: '{s}'"),
            Self::TripNotFound(trip_id) => write!(f, "Trip '{trip_id}' not found"),
            Self::SeatNotFound { seat_id } => write!(f, "Seat '{seat_id}' not found on this trip"),
            Self::SeatInactive { seat_id } => write!(f, "Seat '{seat_id}' is not sellable"),
            Self::SeatAlreadyLocked { seat_id, holder } => {
                write!(f, "Seat '{seat_id}' is already locked by '{holder}'")
            }
            Self::SeatAlreadyBooked { seat_id } => {
                write!(f, "Seat '{seat_id}' is already booked")
            }
            Self::NotLockHolder { seat_id } => {
                write!(f, "Caller does not hold the lock on seat '{seat_id}'")
            }
            Self::SeatNotLockedByHolder { seat_id } => {
                write!(f, "Seat '{seat_id}' is not locked by the requesting holder")
            }
            Self::EmptySeatSelection => write!(f, "Booking must include at least one seat"),
            Self::DuplicateSeatSelection { seat_id } => {
                write!(f, "Seat '{seat_id}' appears more than once in the selection")
            }
            Self::BookingNotFound(booking_id) => {
                write!(f, "Booking '{booking_id}' not found")
            }
            Self::InvalidBookingTransition { from, to } => {
                write!(f, "Invalid booking transition: {from} -> {to}")
            }
        }
    }
}

impl std::error::Error for DomainError {}
