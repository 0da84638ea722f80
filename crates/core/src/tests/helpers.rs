// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{Command, TripState, apply};
use seatwise_domain::{HolderId, Seat, SeatClass, SeatId, TripId};
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

pub const TTL: Duration = Duration::minutes(5);

pub fn test_now() -> OffsetDateTime {
    datetime!(2026-03-01 12:00:00 UTC)
}

pub fn seat_id(id: &str) -> SeatId {
    SeatId::new(id).unwrap()
}

pub fn holder(id: &str) -> HolderId {
    HolderId::new(id).unwrap()
}

/// A trip with three sellable seats and one inactive seat.
pub fn test_state() -> TripState {
    let trip_id: TripId = TripId::new("trip-1").unwrap();
    let seats: Vec<Seat> = vec![
        Seat::new(seat_id("12A"), "12A", SeatClass::Normal, true).unwrap(),
        Seat::new(seat_id("12B"), "12B", SeatClass::Normal, true).unwrap(),
        Seat::new(seat_id("1A"), "1A", SeatClass::Vip, true).unwrap(),
        Seat::new(seat_id("0X"), "0X", SeatClass::Normal, false).unwrap(),
    ];
    TripState::new(trip_id, seats)
}

/// Applies a lock command and returns the new state, panicking on
/// failure.
pub fn locked(state: &TripState, seat: &str, by: &str, now: OffsetDateTime) -> TripState {
    apply(
        state,
        Command::LockSeat {
            seat_id: seat_id(seat),
            holder: holder(by),
            ttl: TTL,
        },
        now,
    )
    .expect("lock should succeed")
    .new_state
}
