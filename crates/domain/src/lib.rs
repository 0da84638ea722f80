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

mod booking;
mod error;
mod events;
mod ids;
mod payment;
mod seat;

#[cfg(test)]
mod tests;

pub use booking::{Booking, BookingStatus};
pub use error::DomainError;
pub use events::TripEvent;
pub use ids::{BookingId, HolderId, SeatId, TripId};
pub use payment::{PaymentFailurePolicy, PaymentStatus, PaymentUpdate};
pub use seat::{Seat, SeatClass, SeatLock, SeatStatus};
