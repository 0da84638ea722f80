// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::helpers::{seat_id, seeded_store, test_booking, test_now, trip_id};
use crate::{PersistenceError, SqlitePersistence};
use seatwise_domain::{Booking, BookingStatus, PaymentStatus, PaymentUpdate};
use time::Duration;

#[test]
fn test_insert_and_load_booking() {
    let mut store: SqlitePersistence = seeded_store();
    let booking: Booking = test_booking(&["12A", "12B"]);
    store.insert_booking(&booking).unwrap();

    let loaded: Vec<Booking> = store.load_bookings(&trip_id("trip-1")).unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].booking_id, booking.booking_id);
    assert_eq!(loaded[0].status, BookingStatus::Pending);
    assert_eq!(loaded[0].total_amount, 4200);
    assert_eq!(loaded[0].seat_ids, vec![seat_id("12A"), seat_id("12B")]);
    assert_eq!(loaded[0].booked_at, test_now());
    assert!(loaded[0].cancelled_at.is_none());
}

#[test]
fn test_insert_booking_writes_trail_entry() {
    let mut store: SqlitePersistence = seeded_store();
    let booking: Booking = test_booking(&["12A"]);
    store.insert_booking(&booking).unwrap();

    let trail = store.booking_event_trail(booking.booking_id).unwrap();
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].0, "booking_created");
    assert_eq!(trail[0].1["seat_count"], 1);
}

#[test]
fn test_booking_for_unknown_seat_is_rejected() {
    let mut store: SqlitePersistence = seeded_store();
    let booking: Booking = test_booking(&["99Z"]);
    let result = store.insert_booking(&booking);
    assert!(matches!(result, Err(PersistenceError::DatabaseError(_))));

    // The whole transaction rolls back, including the booking row.
    assert!(store.load_bookings(&trip_id("trip-1")).unwrap().is_empty());
}

#[test]
fn test_status_update_persists_and_appends_trail() {
    let mut store: SqlitePersistence = seeded_store();
    let mut booking: Booking = test_booking(&["12A"]);
    store.insert_booking(&booking).unwrap();

    let later = test_now() + Duration::minutes(2);
    booking.status = BookingStatus::Cancelled;
    booking.cancelled_at = Some(later);
    store
        .update_booking_status(
            &booking,
            "status_updated",
            &serde_json::json!({ "status": "cancelled" }),
            later,
        )
        .unwrap();

    let loaded: Vec<Booking> = store.load_bookings(&trip_id("trip-1")).unwrap();
    assert_eq!(loaded[0].status, BookingStatus::Cancelled);
    assert_eq!(loaded[0].cancelled_at, Some(later));

    let trail = store.booking_event_trail(booking.booking_id).unwrap();
    assert_eq!(trail.len(), 2);
    assert_eq!(trail[1].0, "status_updated");
    assert_eq!(trail[1].1["status"], "cancelled");
}

#[test]
fn test_status_update_for_unknown_booking_fails() {
    let mut store: SqlitePersistence = seeded_store();
    let booking: Booking = test_booking(&["12A"]);
    let result = store.update_booking_status(
        &booking,
        "status_updated",
        &serde_json::json!({ "status": "paid" }),
        test_now(),
    );
    assert!(matches!(result, Err(PersistenceError::BookingNotFound(_))));
}

#[test]
fn test_payment_updates_are_latest_wins() {
    let mut store: SqlitePersistence = seeded_store();
    let booking: Booking = test_booking(&["12A"]);
    store.insert_booking(&booking).unwrap();

    let first = PaymentUpdate {
        booking_id: booking.booking_id,
        status: PaymentStatus::Pending,
        amount: Some(4200),
        method: Some(String::from("card")),
        transaction_id: Some(String::from("tx-1")),
        updated_at: test_now(),
    };
    store
        .record_payment_update(&trip_id("trip-1"), &first)
        .unwrap();

    let second = PaymentUpdate {
        status: PaymentStatus::Completed,
        updated_at: test_now() + Duration::seconds(30),
        ..first.clone()
    };
    store
        .record_payment_update(&trip_id("trip-1"), &second)
        .unwrap();

    let latest = store
        .latest_payment_update(booking.booking_id)
        .unwrap()
        .unwrap();
    assert_eq!(latest, second);

    // Both reports remain visible in the trail.
    let trail = store.booking_event_trail(booking.booking_id).unwrap();
    let payment_entries: Vec<_> = trail
        .iter()
        .filter(|(kind, _)| kind == "payment_recorded")
        .collect();
    assert_eq!(payment_entries.len(), 2);
}

#[test]
fn test_latest_payment_update_is_none_without_reports() {
    let mut store: SqlitePersistence = seeded_store();
    let booking: Booking = test_booking(&["12A"]);
    store.insert_booking(&booking).unwrap();

    assert!(
        store
            .latest_payment_update(booking.booking_id)
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_bookings_are_scoped_to_their_trip() {
    let mut store: SqlitePersistence = seeded_store();
    store
        .insert_trip(
            &trip_id("trip-2"),
            &crate::tests::helpers::layout(),
            test_now(),
        )
        .unwrap();

    let booking: Booking = test_booking(&["12A"]);
    store.insert_booking(&booking).unwrap();

    assert_eq!(store.load_bookings(&trip_id("trip-1")).unwrap().len(), 1);
    assert!(store.load_bookings(&trip_id("trip-2")).unwrap().is_empty());
}
