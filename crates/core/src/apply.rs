// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::command::Command;
use crate::error::CoreError;
use crate::state::{TransitionResult, TripState};
use crate::{validate_seat_exists, validate_seat_sellable};
use seatwise_domain::{
    Booking, BookingId, BookingStatus, DomainError, HolderId, PaymentFailurePolicy, PaymentStatus,
    PaymentUpdate, SeatId, SeatLock, TripEvent,
};
use time::{Duration, OffsetDateTime};

/// Applies a command to the current trip state, producing a new state
/// and the events to broadcast.
///
/// This function is pure: it performs no I/O and never partially
/// commits. The caller must hold the trip's lock across the apply and
/// the subsequent publication of the new state, which makes every
/// conflicting seat mutation resolve to exactly one winner.
///
/// # Arguments
///
/// * `state` - The current state (immutable)
/// * `command` - The command to apply
/// * `now` - The current instant; expiry is evaluated against it
///
/// # Returns
///
/// * `Ok(TransitionResult)` containing the new state and events
/// * `Err(CoreError)` if the command violates a domain rule
///
/// # Errors
///
/// Returns an error if the command violates domain rules (seat
/// unknown or inactive, lock held by another holder, invalid booking
/// transition, and so on).
#[allow(clippy::too_many_lines)]
pub fn apply(
    state: &TripState,
    command: Command,
    now: OffsetDateTime,
) -> Result<TransitionResult, CoreError> {
    match command {
        Command::LockSeat {
            seat_id,
            holder,
            ttl,
        } => lock_seat(state, &seat_id, holder, ttl, now),
        Command::UnlockSeat { seat_id, holder } => unlock_seat(state, &seat_id, &holder, now),
        Command::RefreshLock {
            seat_id,
            holder,
            ttl,
        } => refresh_lock(state, &seat_id, &holder, ttl, now),
        Command::ReleaseHolder { holder } => Ok(release_holder(state, &holder, now)),
        Command::ExpireLocks => Ok(expire_locks(state, now)),
        Command::CreateBooking {
            holder,
            seat_ids,
            total_amount,
        } => create_booking(state, holder, seat_ids, total_amount, now),
        Command::UpdateBookingStatus { booking_id, status } => {
            update_booking_status(state, booking_id, status, now)
        }
        Command::AdminCancelBooking { booking_id } => admin_cancel(state, booking_id, now),
        Command::RecordPayment { update, policy } => record_payment(state, &update, policy, now),
    }
}

fn lock_seat(
    state: &TripState,
    seat_id: &SeatId,
    holder: HolderId,
    ttl: Duration,
    now: OffsetDateTime,
) -> Result<TransitionResult, CoreError> {
    validate_seat_sellable(state, seat_id)?;

    if state.occupying_booking(seat_id).is_some() {
        return Err(CoreError::DomainViolation(DomainError::SeatAlreadyBooked {
            seat_id: seat_id.clone(),
        }));
    }

    // An expired lock is absent for all purposes; only a live lock by
    // a different holder blocks acquisition.
    if let Some(existing) = state.live_lock(seat_id, now)
        && existing.holder != holder
    {
        return Err(CoreError::DomainViolation(DomainError::SeatAlreadyLocked {
            seat_id: seat_id.clone(),
            holder: existing.holder.clone(),
        }));
    }

    let lock: SeatLock = SeatLock::new(seat_id.clone(), holder.clone(), now, ttl);
    let expires_at: OffsetDateTime = lock.expires_at;

    let mut new_state: TripState = state.clone();
    new_state.locks.insert(seat_id.clone(), lock);

    Ok(TransitionResult {
        new_state,
        events: vec![TripEvent::SeatLocked {
            seat_id: seat_id.clone(),
            holder,
            expires_at,
        }],
    })
}

fn unlock_seat(
    state: &TripState,
    seat_id: &SeatId,
    holder: &HolderId,
    now: OffsetDateTime,
) -> Result<TransitionResult, CoreError> {
    validate_seat_exists(state, seat_id)?;

    match state.live_lock(seat_id, now) {
        Some(lock) if &lock.holder != holder => Err(CoreError::DomainViolation(
            DomainError::NotLockHolder {
                seat_id: seat_id.clone(),
            },
        )),
        Some(_) => {
            let mut new_state: TripState = state.clone();
            new_state.locks.remove(seat_id);
            Ok(TransitionResult {
                new_state,
                events: vec![TripEvent::SeatUnlocked {
                    seat_id: seat_id.clone(),
                }],
            })
        }
        None => {
            // Absent or already-expired lock: no-op success. An expired
            // entry stays in place so the sweep still announces the
            // seat when it removes it.
            Ok(TransitionResult {
                new_state: state.clone(),
                events: Vec::new(),
            })
        }
    }
}

fn refresh_lock(
    state: &TripState,
    seat_id: &SeatId,
    holder: &HolderId,
    ttl: Duration,
    now: OffsetDateTime,
) -> Result<TransitionResult, CoreError> {
    validate_seat_exists(state, seat_id)?;

    let Some(lock) = state.live_lock(seat_id, now) else {
        return Err(CoreError::DomainViolation(DomainError::NotLockHolder {
            seat_id: seat_id.clone(),
        }));
    };
    if &lock.holder != holder {
        return Err(CoreError::DomainViolation(DomainError::NotLockHolder {
            seat_id: seat_id.clone(),
        }));
    }

    let mut refreshed: SeatLock = lock.clone();
    refreshed.expires_at = now + ttl;
    let expires_at: OffsetDateTime = refreshed.expires_at;

    let mut new_state: TripState = state.clone();
    new_state.locks.insert(seat_id.clone(), refreshed);

    Ok(TransitionResult {
        new_state,
        events: vec![TripEvent::SeatLocked {
            seat_id: seat_id.clone(),
            holder: holder.clone(),
            expires_at,
        }],
    })
}

fn release_holder(state: &TripState, holder: &HolderId, now: OffsetDateTime) -> TransitionResult {
    let released: Vec<SeatId> = state.holder_locks(holder, now);

    // Only this holder's live locks are removed. Expired entries,
    // whoever holds them, are left for the sweep, which is the one
    // place that announces an expiry to the room.
    let mut new_state: TripState = state.clone();
    new_state
        .locks
        .retain(|_, lock| &lock.holder != holder || lock.is_expired(now));

    let events: Vec<TripEvent> = released
        .into_iter()
        .map(|seat_id| TripEvent::SeatUnlocked { seat_id })
        .collect();

    TransitionResult { new_state, events }
}

fn expire_locks(state: &TripState, now: OffsetDateTime) -> TransitionResult {
    let mut expired: Vec<SeatId> = state
        .locks
        .values()
        .filter(|lock| lock.is_expired(now))
        .map(|lock| lock.seat_id.clone())
        .collect();
    expired.sort();

    let mut new_state: TripState = state.clone();
    new_state.locks.retain(|_, lock| !lock.is_expired(now));

    let events: Vec<TripEvent> = expired
        .into_iter()
        .map(|seat_id| TripEvent::SeatAvailable { seat_id })
        .collect();

    TransitionResult { new_state, events }
}

fn create_booking(
    state: &TripState,
    holder: HolderId,
    seat_ids: Vec<SeatId>,
    total_amount: i64,
    now: OffsetDateTime,
) -> Result<TransitionResult, CoreError> {
    // Input validation (empty set, duplicates, amount) happens before
    // any lock checks so rejects are cheap and consistent.
    let booking: Booking = Booking::new(
        state.trip_id.clone(),
        holder.clone(),
        seat_ids,
        total_amount,
        now,
    )?;

    // Every seat must be live-locked by the requesting holder. The
    // whole set is verified before anything is committed, so a single
    // offending seat fails the entire request with no partial effects.
    for seat_id in &booking.seat_ids {
        validate_seat_sellable(state, seat_id)?;
        if state.occupying_booking(seat_id).is_some() {
            return Err(CoreError::DomainViolation(DomainError::SeatAlreadyBooked {
                seat_id: seat_id.clone(),
            }));
        }
        match state.live_lock(seat_id, now) {
            Some(lock) if lock.holder == holder => {}
            _ => {
                return Err(CoreError::DomainViolation(
                    DomainError::SeatNotLockedByHolder {
                        seat_id: seat_id.clone(),
                    },
                ));
            }
        }
    }

    // Locks are consumed in the same atomic step that commits the
    // booking: a seat is never simultaneously locked and booked.
    let mut new_state: TripState = state.clone();
    for seat_id in &booking.seat_ids {
        new_state.locks.remove(seat_id);
    }
    new_state.bookings.push(booking.clone());

    let mut events: Vec<TripEvent> = booking
        .seat_ids
        .iter()
        .map(|seat_id| TripEvent::SeatBooked {
            seat_id: seat_id.clone(),
            booking_id: booking.booking_id,
        })
        .collect();
    events.push(TripEvent::BookingCreated {
        booking_id: booking.booking_id,
        holder,
        seat_ids: booking.seat_ids.clone(),
        total_amount: booking.total_amount,
        status: booking.status,
        booked_at: booking.booked_at,
    });

    Ok(TransitionResult { new_state, events })
}

fn update_booking_status(
    state: &TripState,
    booking_id: BookingId,
    status: BookingStatus,
    now: OffsetDateTime,
) -> Result<TransitionResult, CoreError> {
    let booking: &Booking = state.find_booking(booking_id).ok_or_else(|| {
        CoreError::DomainViolation(DomainError::BookingNotFound(booking_id.to_string()))
    })?;

    booking.status.validate_transition(status)?;

    Ok(transition_booking(state, booking_id, status, now))
}

fn admin_cancel(
    state: &TripState,
    booking_id: BookingId,
    now: OffsetDateTime,
) -> Result<TransitionResult, CoreError> {
    let booking: &Booking = state.find_booking(booking_id).ok_or_else(|| {
        CoreError::DomainViolation(DomainError::BookingNotFound(booking_id.to_string()))
    })?;

    // The administrative cancel reaches paid bookings, but a booking
    // that has already released its seats has nothing left to cancel.
    if !booking.occupies_seats() {
        return Err(CoreError::DomainViolation(
            DomainError::InvalidBookingTransition {
                from: booking.status,
                to: BookingStatus::Cancelled,
            },
        ));
    }

    Ok(transition_booking(
        state,
        booking_id,
        BookingStatus::Cancelled,
        now,
    ))
}

fn record_payment(
    state: &TripState,
    update: &PaymentUpdate,
    policy: PaymentFailurePolicy,
    now: OffsetDateTime,
) -> Result<TransitionResult, CoreError> {
    let booking: &Booking = state.find_booking(update.booking_id).ok_or_else(|| {
        CoreError::DomainViolation(DomainError::BookingNotFound(update.booking_id.to_string()))
    })?;

    let payment_event: TripEvent = TripEvent::PaymentStatusUpdated {
        booking_id: update.booking_id,
        status: update.status,
    };

    let follow_on: Option<BookingStatus> = match update.status {
        PaymentStatus::Completed if booking.status == BookingStatus::Pending => {
            Some(BookingStatus::Paid)
        }
        PaymentStatus::Failed | PaymentStatus::Refunded
            if policy == PaymentFailurePolicy::CancelBooking
                && booking.status == BookingStatus::Pending =>
        {
            Some(BookingStatus::Cancelled)
        }
        // Pending reports, completed reports for non-pending bookings,
        // and failures under keep_pending leave the booking untouched.
        _ => None,
    };

    match follow_on {
        Some(status) => {
            let mut result: TransitionResult = transition_booking(state, update.booking_id, status, now);
            result.events.insert(0, payment_event);
            Ok(result)
        }
        None => Ok(TransitionResult {
            new_state: state.clone(),
            events: vec![payment_event],
        }),
    }
}

/// Applies an already-validated booking status change, reverting seats
/// when the new status releases them.
fn transition_booking(
    state: &TripState,
    booking_id: BookingId,
    status: BookingStatus,
    now: OffsetDateTime,
) -> TransitionResult {
    let mut new_state: TripState = state.clone();
    let mut events: Vec<TripEvent> = Vec::new();

    for booking in &mut new_state.bookings {
        if booking.booking_id != booking_id {
            continue;
        }
        booking.status = status;
        if status.occupies_seats() {
            events.push(TripEvent::BookingStatusUpdated { booking_id, status });
        } else {
            booking.cancelled_at = Some(now);
            for seat_id in &booking.seat_ids {
                events.push(TripEvent::SeatAvailable {
                    seat_id: seat_id.clone(),
                });
            }
            events.push(TripEvent::BookingCancelled {
                booking_id,
                status,
                seat_ids: booking.seat_ids.clone(),
            });
        }
        break;
    }

    TransitionResult { new_state, events }
}
