// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{BookingId, BookingStatus, HolderId, SeatId, TripEvent};
use time::OffsetDateTime;

#[test]
fn test_event_serialization_is_tagged_snake_case() {
    let event: TripEvent = TripEvent::SeatLocked {
        seat_id: SeatId::new("12A").unwrap(),
        holder: HolderId::new("session-a").unwrap(),
        expires_at: OffsetDateTime::UNIX_EPOCH,
    };

    let json: String = serde_json::to_string(&event).expect("Failed to serialize");
    assert!(json.contains("\"type\":\"seat_locked\""));
    assert!(json.contains("\"seat_id\":\"12A\""));

    let deserialized: TripEvent = serde_json::from_str(&json).expect("Failed to deserialize");
    assert_eq!(event, deserialized);
}

#[test]
fn test_booking_created_round_trip() {
    let event: TripEvent = TripEvent::BookingCreated {
        booking_id: BookingId::new(),
        holder: HolderId::new("session-b").unwrap(),
        seat_ids: vec![SeatId::new("1A").unwrap(), SeatId::new("1B").unwrap()],
        total_amount: 5900,
        status: BookingStatus::Pending,
        booked_at: OffsetDateTime::UNIX_EPOCH,
    };

    let json: String = serde_json::to_string(&event).expect("Failed to serialize");
    assert!(json.contains("\"type\":\"booking_created\""));
    assert!(json.contains("\"status\":\"pending\""));

    let deserialized: TripEvent = serde_json::from_str(&json).expect("Failed to deserialize");
    assert_eq!(event, deserialized);
}

#[test]
fn test_booking_cancelled_carries_freed_seats() {
    let event: TripEvent = TripEvent::BookingCancelled {
        booking_id: BookingId::new(),
        status: BookingStatus::Expired,
        seat_ids: vec![SeatId::new("7C").unwrap()],
    };

    let json: String = serde_json::to_string(&event).expect("Failed to serialize");
    assert!(json.contains("\"type\":\"booking_cancelled\""));
    assert!(json.contains("\"status\":\"expired\""));
    assert!(json.contains("\"7C\""));
}
