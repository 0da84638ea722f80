// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Seat catalog types and the ephemeral seat lock.
//!
//! A seat's identity (id, code, class) is fixed when the bus layout is
//! configured. Its per-trip status is derived from live locks and
//! occupying bookings, never stored on the seat itself.

use crate::error::DomainError;
use crate::ids::{HolderId, SeatId};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;

/// Seat class within a bus layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatClass {
    /// Standard seat.
    Normal,
    /// VIP seat.
    Vip,
    /// Business-class seat.
    Business,
}

impl SeatClass {
    /// Returns the string representation of the class.
    ///
    /// This is used for persistence and API serialization.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Vip => "vip",
            Self::Business => "business",
        }
    }

    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "normal" => Ok(Self::Normal),
            "vip" => Ok(Self::Vip),
            "business" => Ok(Self::Business),
            _ => Err(DomainError::InvalidSeatClass(s.to_string())),
        }
    }
}

impl FromStr for SeatClass {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for SeatClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A seat as configured in a bus layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    /// Stable seat identifier.
    pub seat_id: SeatId,
    /// Human-readable seat code (e.g. "12A").
    pub code: String,
    /// Seat class.
    pub class: SeatClass,
    /// Whether the seat is sellable. Inactive seats are listed but
    /// never lockable or bookable.
    pub active: bool,
}

impl Seat {
    /// Creates a seat with a validated code.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidSeatCode` if the code is empty.
    pub fn new(
        seat_id: SeatId,
        code: &str,
        class: SeatClass,
        active: bool,
    ) -> Result<Self, DomainError> {
        let trimmed: &str = code.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidSeatCode(String::from(
                "seat code must not be empty",
            )));
        }
        Ok(Self {
            seat_id,
            code: trimmed.to_string(),
            class,
            active,
        })
    }
}

/// Derived per-trip status of a seat.
///
/// Booked wins over locked; an unexpired lock wins over available.
/// A seat is never simultaneously locked and booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatStatus {
    /// No live lock and no occupying booking.
    Available,
    /// An unexpired lock exists and the seat is not booked.
    Locked,
    /// An occupying (pending or paid) booking references the seat.
    Booked,
}

impl SeatStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Locked => "locked",
            Self::Booked => "booked",
        }
    }
}

impl std::fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An ephemeral exclusive hold on one seat for one trip.
///
/// Exactly one lock may exist per (trip, seat) at any time. A lock
/// whose expiry has passed is treated as absent for all purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatLock {
    /// The locked seat.
    pub seat_id: SeatId,
    /// The session or user holding the lock.
    pub holder: HolderId,
    /// When the lock was acquired or last refreshed.
    #[serde(with = "time::serde::rfc3339")]
    pub locked_at: OffsetDateTime,
    /// When the lock expires.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl SeatLock {
    /// Creates a lock expiring `ttl` after `now`.
    #[must_use]
    pub fn new(seat_id: SeatId, holder: HolderId, now: OffsetDateTime, ttl: time::Duration) -> Self {
        Self {
            seat_id,
            holder,
            locked_at: now,
            expires_at: now + ttl,
        }
    }

    /// Returns true if the lock is expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }
}
