// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Payment status reporting and the configurable failure policy.
//!
//! Payment processing itself is owned by a collaborator; this engine
//! only consumes confirmed status signals and maps them onto booking
//! transitions.

use crate::error::DomainError;
use crate::ids::BookingId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;

/// Payment status reported by the payment collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Payment initiated, not yet confirmed.
    Pending,
    /// Payment confirmed.
    Completed,
    /// Payment failed.
    Failed,
    /// Payment refunded.
    Refunded,
}

impl PaymentStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }

    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            _ => Err(DomainError::InvalidPaymentStatus(s.to_string())),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The latest payment state for a booking (latest-wins, 1:1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentUpdate {
    /// The booking this update applies to.
    pub booking_id: BookingId,
    /// Reported payment status.
    pub status: PaymentStatus,
    /// Amount in minor currency units, if reported.
    pub amount: Option<i64>,
    /// Payment method, if reported.
    pub method: Option<String>,
    /// Gateway transaction identifier, if reported.
    pub transaction_id: Option<String>,
    /// When the update was received.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// How a failed or refunded payment maps onto the booking lifecycle.
///
/// This is deployment configuration, not a hardcoded rule: some
/// operators want failed payments to free seats immediately, others
/// want to hold the booking pending so the customer can retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentFailurePolicy {
    /// Leave the booking pending; seats stay committed for retry.
    #[default]
    KeepPending,
    /// Cancel the booking immediately and release its seats.
    CancelBooking,
}

impl PaymentFailurePolicy {
    /// Returns the string representation of the policy.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::KeepPending => "keep_pending",
            Self::CancelBooking => "cancel_booking",
        }
    }

    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "keep_pending" => Ok(Self::KeepPending),
            "cancel_booking" => Ok(Self::CancelBooking),
            _ => Err(DomainError::InvalidPaymentPolicy(s.to_string())),
        }
    }
}

impl FromStr for PaymentFailurePolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for PaymentFailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
