// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Identifier for a trip (one scheduled departure of a bus on a route).
///
/// Trip identity is supplied by the catalog collaborator; this engine
/// only requires it to be non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TripId(String);

impl TripId {
    /// Creates a validated trip identifier.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTripId` if the identifier is empty
    /// or whitespace-only.
    pub fn new(id: &str) -> Result<Self, DomainError> {
        let trimmed: &str = id.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidTripId(String::from(
                "trip id must not be empty",
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the identifier value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TripId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for a seat within a bus layout.
///
/// Seat identity is stable across trips; only the per-trip status
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatId(String);

impl SeatId {
    /// Creates a validated seat identifier.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidSeatId` if the identifier is empty
    /// or whitespace-only.
    pub fn new(id: &str) -> Result<Self, DomainError> {
        let trimmed: &str = id.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidSeatId(String::from(
                "seat id must not be empty",
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the identifier value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SeatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for the session or user holding a lock or booking.
///
/// Holder identity is supplied by the collaborator that owns
/// authentication; this engine treats it as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HolderId(String);

impl HolderId {
    /// Creates a validated holder identifier.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidHolderId` if the identifier is
    /// empty or whitespace-only.
    pub fn new(id: &str) -> Result<Self, DomainError> {
        let trimmed: &str = id.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidHolderId(String::from(
                "holder id must not be empty",
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the identifier value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HolderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for a booking, generated at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(Uuid);

impl BookingId {
    /// Generates a fresh booking identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID as a booking identifier.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BookingId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for BookingId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| DomainError::InvalidBookingId(format!("'{s}': {e}")))
    }
}

impl std::fmt::Display for BookingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
