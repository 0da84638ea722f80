// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use seatwise_domain::{
    BookingId, BookingStatus, HolderId, PaymentFailurePolicy, PaymentUpdate, SeatId,
};
use time::Duration;

/// A command represents client or system intent as data only.
///
/// Commands are the only way to request state changes on a trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Acquire an exclusive time-bounded hold on a seat.
    ///
    /// Re-locking a seat already held by the same holder is an
    /// idempotent success that refreshes the expiry.
    LockSeat {
        /// The seat to lock.
        seat_id: SeatId,
        /// The requesting holder.
        holder: HolderId,
        /// Lock time-to-live.
        ttl: Duration,
    },
    /// Release a held lock.
    ///
    /// Releasing an absent or expired lock is a no-op success.
    UnlockSeat {
        /// The seat to release.
        seat_id: SeatId,
        /// The requesting holder.
        holder: HolderId,
    },
    /// Extend the expiry of a held lock.
    RefreshLock {
        /// The locked seat.
        seat_id: SeatId,
        /// The requesting holder.
        holder: HolderId,
        /// Renewed time-to-live.
        ttl: Duration,
    },
    /// Release every live lock held by a holder (disconnect cleanup).
    ReleaseHolder {
        /// The departing holder.
        holder: HolderId,
    },
    /// Drop all expired locks (background sweep).
    ExpireLocks,
    /// Promote the holder's locked seats into a pending booking.
    ///
    /// All-or-nothing: every seat must be live-locked by the holder or
    /// nothing is committed.
    CreateBooking {
        /// The requesting holder.
        holder: HolderId,
        /// The seats to commit.
        seat_ids: Vec<SeatId>,
        /// Total amount in minor currency units.
        total_amount: i64,
    },
    /// Apply a validated booking status transition.
    UpdateBookingStatus {
        /// The booking to update.
        booking_id: BookingId,
        /// The requested status.
        status: BookingStatus,
    },
    /// Cancel a booking regardless of status (audited exception path;
    /// the only way to cancel a paid booking).
    AdminCancelBooking {
        /// The booking to cancel.
        booking_id: BookingId,
    },
    /// Record a payment status report and apply the configured policy.
    RecordPayment {
        /// The reported payment state.
        update: PaymentUpdate,
        /// How failed/refunded payments map onto the booking.
        policy: PaymentFailurePolicy,
    },
}
