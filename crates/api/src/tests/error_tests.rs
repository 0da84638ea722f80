// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{ApiError, ConfigError, EngineConfig, translate_core_error, translate_domain_error};
use seatwise::CoreError;
use seatwise_domain::{DomainError, HolderId, PaymentFailurePolicy, SeatId};
use seatwise_persistence::PersistenceError;

#[test]
fn test_reason_codes_are_stable() {
    let cases: Vec<(ApiError, &str)> = vec![
        (
            ApiError::SeatAlreadyLocked {
                seat_id: String::from("12A"),
                holder: String::from("session-b"),
            },
            "seat_already_locked",
        ),
        (
            ApiError::SeatAlreadyBooked {
                seat_id: String::from("12A"),
            },
            "seat_already_booked",
        ),
        (
            ApiError::NotLockHolder {
                seat_id: String::from("12A"),
            },
            "not_lock_holder",
        ),
        (
            ApiError::SeatNotLockedByHolder {
                seat_id: String::from("12A"),
            },
            "seat_not_locked_by_holder",
        ),
        (
            ApiError::InvalidTransition {
                message: String::from("paid to pending"),
            },
            "invalid_transition",
        ),
        (
            ApiError::TripNotFound {
                trip_id: String::from("trip-9"),
            },
            "trip_not_found",
        ),
        (
            ApiError::BookingNotFound {
                booking_id: String::from("b-1"),
            },
            "booking_not_found",
        ),
        (
            ApiError::InvalidInput {
                field: String::from("seat_ids"),
                message: String::from("empty"),
            },
            "invalid_input",
        ),
        (
            ApiError::Internal {
                message: String::from("boom"),
            },
            "internal",
        ),
    ];

    for (err, expected) in cases {
        assert_eq!(err.reason_code(), expected);
    }
}

#[test]
fn test_domain_conflicts_translate_to_their_reason_codes() {
    let seat: SeatId = SeatId::new("12A").unwrap();
    let holder: HolderId = HolderId::new("session-b").unwrap();

    let locked: ApiError = translate_domain_error(DomainError::SeatAlreadyLocked {
        seat_id: seat.clone(),
        holder,
    });
    assert_eq!(locked.reason_code(), "seat_already_locked");

    let booked: ApiError =
        translate_domain_error(DomainError::SeatAlreadyBooked { seat_id: seat.clone() });
    assert_eq!(booked.reason_code(), "seat_already_booked");

    let not_holder: ApiError =
        translate_domain_error(DomainError::NotLockHolder { seat_id: seat });
    assert_eq!(not_holder.reason_code(), "not_lock_holder");
}

#[test]
fn test_domain_input_errors_translate_to_invalid_input() {
    let err: ApiError = translate_domain_error(DomainError::EmptySeatSelection);
    match err {
        ApiError::InvalidInput { field, .. } => assert_eq!(field, "seat_ids"),
        other => panic!("unexpected translation: {other:?}"),
    }

    let err: ApiError =
        translate_domain_error(DomainError::InvalidAmount { amount: -5 });
    match err {
        ApiError::InvalidInput { field, message } => {
            assert_eq!(field, "total_amount");
            assert!(message.contains("-5"));
        }
        other => panic!("unexpected translation: {other:?}"),
    }
}

#[test]
fn test_core_errors_unwrap_to_their_domain_translation() {
    let err: ApiError = translate_core_error(CoreError::DomainViolation(
        DomainError::TripNotFound(String::from("trip-9")),
    ));
    assert_eq!(err.reason_code(), "trip_not_found");
}

#[test]
fn test_persistence_errors_map_to_api_errors() {
    let err: ApiError = PersistenceError::TripNotFound(String::from("trip-9")).into();
    assert_eq!(err.reason_code(), "trip_not_found");

    let err: ApiError = PersistenceError::BookingNotFound(String::from("b-1")).into();
    assert_eq!(err.reason_code(), "booking_not_found");

    let err: ApiError = PersistenceError::DatabaseError(String::from("disk I/O error")).into();
    assert_eq!(err.reason_code(), "internal");
}

#[test]
fn test_display_messages_name_the_subject() {
    let err: ApiError = ApiError::SeatAlreadyLocked {
        seat_id: String::from("12A"),
        holder: String::from("session-b"),
    };
    assert_eq!(err.to_string(), "Seat '12A' is already locked by 'session-b'");

    let err: ApiError = ApiError::TripNotFound {
        trip_id: String::from("trip-9"),
    };
    assert_eq!(err.to_string(), "Trip 'trip-9' not found");
}

#[test]
fn test_config_rejects_non_positive_intervals() {
    let err: ConfigError =
        EngineConfig::new(0, 5, PaymentFailurePolicy::KeepPending).unwrap_err();
    assert_eq!(err, ConfigError::InvalidLockTtl(0));

    let err: ConfigError =
        EngineConfig::new(300, -1, PaymentFailurePolicy::KeepPending).unwrap_err();
    assert_eq!(err, ConfigError::InvalidSweepInterval(-1));

    let config: EngineConfig =
        EngineConfig::new(300, 5, PaymentFailurePolicy::CancelBooking).unwrap();
    assert_eq!(config.lock_ttl, time::Duration::seconds(300));
}
