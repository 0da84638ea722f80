// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API boundary layer for the Seatwise reservation engine.
//!
//! The [`Engine`] owns the per-trip state table and serializes all
//! mutating operations per trip. Committed events are published to the
//! attached [`EventPublisher`] while the trip's mutex is still held,
//! which keeps the room feed in commit order; callers receive response
//! structs. Domain and core errors never cross this boundary directly:
//! they are translated into [`ApiError`] values with stable wire
//! reason codes.

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

mod config;
mod engine;
mod error;
mod request_response;

#[cfg(test)]
mod tests;

pub use config::{ConfigError, DEFAULT_LOCK_TTL_SECS, DEFAULT_SWEEP_INTERVAL_SECS, EngineConfig};
pub use engine::{Engine, EventPublisher, TripEventBatches};
pub use error::{ApiError, translate_core_error, translate_domain_error};
pub use request_response::{
    BookingInfo, CreateTripRequest, LockAck, SeatSpec, SeatStatusInfo, TripSnapshot,
    seat_status_listing,
};
