// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{
    DomainError, HolderId, PaymentFailurePolicy, PaymentStatus, Seat, SeatClass, SeatId, SeatLock,
    TripId,
};
use time::{Duration, OffsetDateTime};

#[test]
fn test_trip_id_rejects_empty() {
    assert!(matches!(
        TripId::new(""),
        Err(DomainError::InvalidTripId(_))
    ));
    assert!(matches!(
        TripId::new("   "),
        Err(DomainError::InvalidTripId(_))
    ));
}

#[test]
fn test_trip_id_trims_whitespace() {
    let trip_id: TripId = TripId::new("  trip-42  ").unwrap();
    assert_eq!(trip_id.value(), "trip-42");
}

#[test]
fn test_seat_id_rejects_empty() {
    assert!(matches!(
        SeatId::new(""),
        Err(DomainError::InvalidSeatId(_))
    ));
}

#[test]
fn test_holder_id_rejects_empty() {
    assert!(matches!(
        HolderId::new("\t"),
        Err(DomainError::InvalidHolderId(_))
    ));
}

#[test]
fn test_seat_class_string_round_trip() {
    let classes = vec![SeatClass::Normal, SeatClass::Vip, SeatClass::Business];

    for class in classes {
        let s: &str = class.as_str();
        match s.parse::<SeatClass>() {
            Ok(parsed) => assert_eq!(class, parsed),
            Err(e) => panic!("Failed to parse seat class string: {s}: {e}"),
        }
    }
}

#[test]
fn test_invalid_seat_class_string() {
    let result = "first_class".parse::<SeatClass>();
    assert!(matches!(result, Err(DomainError::InvalidSeatClass(_))));
}

#[test]
fn test_seat_rejects_empty_code() {
    let seat_id: SeatId = SeatId::new("s1").unwrap();
    let result = Seat::new(seat_id, "  ", SeatClass::Normal, true);
    assert!(matches!(result, Err(DomainError::InvalidSeatCode(_))));
}

#[test]
fn test_seat_lock_expiry_predicate() {
    let now: OffsetDateTime = OffsetDateTime::now_utc();
    let lock: SeatLock = SeatLock::new(
        SeatId::new("s1").unwrap(),
        HolderId::new("session-a").unwrap(),
        now,
        Duration::minutes(5),
    );

    assert!(!lock.is_expired(now));
    assert!(!lock.is_expired(now + Duration::minutes(4)));
    // Expiry boundary is inclusive: a lock at exactly expires_at is gone.
    assert!(lock.is_expired(now + Duration::minutes(5)));
    assert!(lock.is_expired(now + Duration::minutes(6)));
}

#[test]
fn test_payment_status_round_trip() {
    let statuses = vec![
        PaymentStatus::Pending,
        PaymentStatus::Completed,
        PaymentStatus::Failed,
        PaymentStatus::Refunded,
    ];

    for status in statuses {
        let s: &str = status.as_str();
        assert_eq!(s.parse::<PaymentStatus>().unwrap(), status);
    }
}

#[test]
fn test_payment_failure_policy_parsing() {
    assert_eq!(
        "keep_pending".parse::<PaymentFailurePolicy>().unwrap(),
        PaymentFailurePolicy::KeepPending
    );
    assert_eq!(
        "cancel_booking".parse::<PaymentFailurePolicy>().unwrap(),
        PaymentFailurePolicy::CancelBooking
    );
    assert!("retry".parse::<PaymentFailurePolicy>().is_err());
}

#[test]
fn test_payment_failure_policy_default_keeps_pending() {
    assert_eq!(
        PaymentFailurePolicy::default(),
        PaymentFailurePolicy::KeepPending
    );
}
