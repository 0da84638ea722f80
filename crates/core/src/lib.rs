// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

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

mod apply;
mod command;
mod error;
mod state;

#[cfg(test)]
mod tests;

use seatwise_domain::{DomainError, Seat, SeatId};

// Re-export public types and functions
pub use apply::apply;
pub use command::Command;
pub use error::CoreError;
pub use state::{TransitionResult, TripState};

/// Validates that a seat exists on the trip's bus.
///
/// This is a read-only validation with no side effects.
///
/// # Errors
///
/// Returns `DomainError::SeatNotFound` if the seat is not part of the
/// trip's layout.
pub fn validate_seat_exists<'a>(
    state: &'a TripState,
    seat_id: &SeatId,
) -> Result<&'a Seat, DomainError> {
    state.seat(seat_id).ok_or_else(|| DomainError::SeatNotFound {
        seat_id: seat_id.clone(),
    })
}

/// Validates that a seat exists and is sellable.
///
/// This function also validates that the seat exists.
///
/// # Errors
///
/// Returns `DomainError::SeatNotFound` if the seat does not exist, or
/// `DomainError::SeatInactive` if it is not sellable.
pub fn validate_seat_sellable<'a>(
    state: &'a TripState,
    seat_id: &SeatId,
) -> Result<&'a Seat, DomainError> {
    let seat: &Seat = validate_seat_exists(state, seat_id)?;
    if !seat.active {
        return Err(DomainError::SeatInactive {
            seat_id: seat_id.clone(),
        });
    }
    Ok(seat)
}
