// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Booking lifecycle and transition logic.
//!
//! Bookings are durable records committing a seat set to a holder.
//! Status transitions are validated here; the administrative cancel of
//! a paid booking is an explicit exception path handled by the engine,
//! never a normal transition.

use crate::error::DomainError;
use crate::ids::{BookingId, HolderId, SeatId, TripId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;
use time::OffsetDateTime;

/// Booking lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Created, awaiting payment.
    Pending,
    /// Payment completed.
    Paid,
    /// Cancelled; seats released.
    Cancelled,
    /// Expired without payment; seats released.
    Expired,
}

impl BookingStatus {
    /// Returns the string representation of the status.
    ///
    /// This is used for persistence and API serialization.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }

    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "cancelled" => Ok(Self::Cancelled),
            "expired" => Ok(Self::Expired),
            _ => Err(DomainError::InvalidBookingStatus(s.to_string())),
        }
    }

    /// Returns true if this status is terminal for normal lifecycle
    /// purposes.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::Cancelled | Self::Expired)
    }

    /// Returns true if a booking in this status keeps its seats out of
    /// the sellable pool.
    #[must_use]
    pub const fn occupies_seats(&self) -> bool {
        matches!(self, Self::Pending | Self::Paid)
    }

    /// Validates a normal lifecycle transition from this status.
    ///
    /// Valid transitions are pending → paid, pending → cancelled and
    /// pending → expired. Everything else is rejected, including
    /// paid → cancelled, which is only reachable through the audited
    /// administrative cancel.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidBookingTransition` if the
    /// transition is not permitted.
    pub const fn validate_transition(&self, new_status: Self) -> Result<(), DomainError> {
        match (self, new_status) {
            (Self::Pending, Self::Paid | Self::Cancelled | Self::Expired) => Ok(()),
            _ => Err(DomainError::InvalidBookingTransition {
                from: *self,
                to: new_status,
            }),
        }
    }
}

impl FromStr for BookingStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A durable booking committing a seat set to a holder.
///
/// The seat set is immutable after creation; seat swaps are modeled as
/// new records by collaborators, never a silent mutation here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Booking identifier.
    pub booking_id: BookingId,
    /// The trip the seats belong to.
    pub trip_id: TripId,
    /// The session or user that created the booking.
    pub holder: HolderId,
    /// The committed seats.
    pub seat_ids: Vec<SeatId>,
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

impl Booking {
    /// Creates a pending booking with a fresh identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the seat set is empty, contains duplicates,
    /// or the amount is negative.
    pub fn new(
        trip_id: TripId,
        holder: HolderId,
        seat_ids: Vec<SeatId>,
        total_amount: i64,
        booked_at: OffsetDateTime,
    ) -> Result<Self, DomainError> {
        if seat_ids.is_empty() {
            return Err(DomainError::EmptySeatSelection);
        }
        let mut seen: HashSet<&SeatId> = HashSet::new();
        for seat_id in &seat_ids {
            if !seen.insert(seat_id) {
                return Err(DomainError::DuplicateSeatSelection {
                    seat_id: seat_id.clone(),
                });
            }
        }
        if total_amount < 0 {
            return Err(DomainError::InvalidAmount {
                amount: total_amount,
            });
        }
        Ok(Self {
            booking_id: BookingId::new(),
            trip_id,
            holder,
            seat_ids,
            total_amount,
            status: BookingStatus::Pending,
            booked_at,
            cancelled_at: None,
        })
    }

    /// Returns true if the booking's seats are out of the sellable
    /// pool.
    #[must_use]
    pub const fn occupies_seats(&self) -> bool {
        self.status.occupies_seats()
    }

    /// Returns true if the booking includes the given seat.
    #[must_use]
    pub fn contains_seat(&self, seat_id: &SeatId) -> bool {
        self.seat_ids.contains(seat_id)
    }
}
