// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use seatwise::CoreError;
use seatwise_domain::DomainError;
use seatwise_persistence::PersistenceError;

/// API-level errors.
///
/// These are distinct from domain/core errors and represent the API
/// contract. Every variant carries a stable machine-readable reason
/// code used by both the HTTP and the realtime surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The seat is held by a different session.
    SeatAlreadyLocked {
        /// The contested seat.
        seat_id: String,
        /// The current lock holder.
        holder: String,
    },
    /// The seat is committed to an occupying booking.
    SeatAlreadyBooked {
        /// The booked seat.
        seat_id: String,
    },
    /// The caller does not hold the lock it tried to release or
    /// refresh.
    NotLockHolder {
        /// The seat in question.
        seat_id: String,
    },
    /// Booking creation requires every seat to be locked by the
    /// requester.
    SeatNotLockedByHolder {
        /// The first offending seat.
        seat_id: String,
    },
    /// The requested booking status transition is not permitted.
    InvalidTransition {
        /// A human-readable description of the rejected transition.
        message: String,
    },
    /// The requested trip does not exist.
    TripNotFound {
        /// The unknown trip.
        trip_id: String,
    },
    /// The requested booking does not exist.
    BookingNotFound {
        /// The unknown booking.
        booking_id: String,
    },
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
}

impl ApiError {
    /// Returns the stable machine-readable reason code for this error.
    #[must_use]
    pub const fn reason_code(&self) -> &'static str {
        match self {
            Self::SeatAlreadyLocked { .. } => "seat_already_locked",
            Self::SeatAlreadyBooked { .. } => "seat_already_booked",
            Self::NotLockHolder { .. } => "not_lock_holder",
            Self::SeatNotLockedByHolder { .. } => "seat_not_locked_by_holder",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::TripNotFound { .. } => "trip_not_found",
            Self::BookingNotFound { .. } => "booking_not_found",
            Self::InvalidInput { .. } => "invalid_input",
            Self::Internal { .. } => "internal",
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
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
            Self::InvalidTransition { message } => {
                write!(f, "Invalid transition: {message}")
            }
            Self::TripNotFound { trip_id } => write!(f, "Trip '{trip_id}' not found"),
            Self::BookingNotFound { booking_id } => {
                write!(f, "Booking '{booking_id}' not found")
            }
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::Internal { message } => write!(f, "Internal error: {message}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Translates a domain error into an API error.
///
/// This translation is explicit and ensures domain errors are not
/// leaked directly.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    match err {
        DomainError::InvalidTripId(msg) => ApiError::InvalidInput {
            field: String::from("trip_id"),
            message: msg,
        },
        DomainError::InvalidSeatId(msg) => ApiError::InvalidInput {
            field: String::from("seat_id"),
            message: msg,
        },
        DomainError::InvalidHolderId(msg) => ApiError::InvalidInput {
            field: String::from("holder"),
            message: msg,
        },
        DomainError::InvalidBookingId(msg) => ApiError::InvalidInput {
            field: String::from("booking_id"),
            message: msg,
        },
        DomainError::InvalidSeatCode(msg) => ApiError::InvalidInput {
            field: String::from("code"),
            message: msg,
        },
        DomainError::InvalidAmount { amount } => ApiError::InvalidInput {
            field: String::from("total_amount"),
            message: format!("Invalid amount: {amount}. Must not be negative"),
        },
        DomainError::InvalidSeatClass(s) => ApiError::InvalidInput {
            field: String::from("class"),
            message: format!("Invalid seat class: '{s}'"),
        },
        DomainError::InvalidBookingStatus(s) => ApiError::InvalidInput {
            field: String::from("status"),
            message: format!("Invalid booking status: '{s}'"),
        },
        DomainError::InvalidPaymentStatus(s) => ApiError::InvalidInput {
            field: String::from("status"),
            message: format!("Invalid payment status: '{s}'"),
        },
        DomainError::InvalidPaymentPolicy(s) => ApiError::InvalidInput {
            field: String::from("on_payment_failure"),
            message: format!("Invalid payment failure policy: '{s}'"),
        },
        DomainError::TripNotFound(trip_id) => ApiError::TripNotFound { trip_id },
        DomainError::SeatNotFound { seat_id } => ApiError::InvalidInput {
            field: String::from("seat_id"),
            message: format!("Seat '{seat_id}' not found on this trip"),
        },
        DomainError::SeatInactive { seat_id } => ApiError::InvalidInput {
            field: String::from("seat_id"),
            message: format!("Seat '{seat_id}' is not sellable"),
        },
        DomainError::SeatAlreadyLocked { seat_id, holder } => ApiError::SeatAlreadyLocked {
            seat_id: seat_id.value().to_string(),
            holder: holder.value().to_string(),
        },
        DomainError::SeatAlreadyBooked { seat_id } => ApiError::SeatAlreadyBooked {
            seat_id: seat_id.value().to_string(),
        },
        DomainError::NotLockHolder { seat_id } => ApiError::NotLockHolder {
            seat_id: seat_id.value().to_string(),
        },
        DomainError::SeatNotLockedByHolder { seat_id } => ApiError::SeatNotLockedByHolder {
            seat_id: seat_id.value().to_string(),
        },
        DomainError::EmptySeatSelection => ApiError::InvalidInput {
            field: String::from("seat_ids"),
            message: String::from("Booking must include at least one seat"),
        },
        DomainError::DuplicateSeatSelection { seat_id } => ApiError::InvalidInput {
            field: String::from("seat_ids"),
            message: format!("Seat '{seat_id}' appears more than once in the selection"),
        },
        DomainError::BookingNotFound(booking_id) => ApiError::BookingNotFound { booking_id },
        DomainError::InvalidBookingTransition { from, to } => ApiError::InvalidTransition {
            message: format!("booking may not move from {from} to {to}"),
        },
    }
}

/// Translates a core error into an API error.
///
/// This translation is explicit and ensures core errors are not leaked
/// directly.
#[must_use]
pub fn translate_core_error(err: CoreError) -> ApiError {
    match err {
        CoreError::DomainViolation(domain_err) => translate_domain_error(domain_err),
    }
}

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::TripNotFound(trip_id) => Self::TripNotFound { trip_id },
            PersistenceError::BookingNotFound(booking_id) => Self::BookingNotFound { booking_id },
            _ => Self::Internal {
                message: err.to_string(),
            },
        }
    }
}
