// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::SqlitePersistence;
use seatwise_domain::{Booking, HolderId, Seat, SeatClass, SeatId, TripId};
use time::OffsetDateTime;
use time::macros::datetime;

pub fn test_now() -> OffsetDateTime {
    datetime!(2026-03-01 12:00:00 UTC)
}

pub fn trip_id(raw: &str) -> TripId {
    TripId::new(raw).expect("valid trip id")
}

pub fn seat_id(raw: &str) -> SeatId {
    SeatId::new(raw).expect("valid seat id")
}

pub fn holder(raw: &str) -> HolderId {
    HolderId::new(raw).expect("valid holder id")
}

pub fn layout() -> Vec<Seat> {
    vec![
        Seat::new(seat_id("12A"), "12A", SeatClass::Normal, true).expect("valid seat"),
        Seat::new(seat_id("12B"), "12B", SeatClass::Normal, true).expect("valid seat"),
        Seat::new(seat_id("1A"), "1A", SeatClass::Vip, false).expect("valid seat"),
    ]
}

/// An in-memory store seeded with the standard test trip.
pub fn seeded_store() -> SqlitePersistence {
    let mut store: SqlitePersistence =
        SqlitePersistence::new_in_memory().expect("in-memory database");
    store
        .insert_trip(&trip_id("trip-1"), &layout(), test_now())
        .expect("trip insert");
    store
}

pub fn test_booking(seats: &[&str]) -> Booking {
    Booking::new(
        trip_id("trip-1"),
        holder("session-a"),
        seats.iter().map(|s| seat_id(s)).collect(),
        4200,
        test_now(),
    )
    .expect("valid booking")
}
