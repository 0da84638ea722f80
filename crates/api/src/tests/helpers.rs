// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{CreateTripRequest, Engine, EngineConfig, SeatSpec};
use seatwise_domain::{PaymentFailurePolicy, TripId};
use seatwise_persistence::SqlitePersistence;
use std::sync::Arc;
use time::OffsetDateTime;
use time::macros::datetime;

pub fn test_now() -> OffsetDateTime {
    datetime!(2026-03-01 12:00:00 UTC)
}

pub fn trip_id(raw: &str) -> TripId {
    TripId::new(raw).expect("valid trip id")
}

pub fn spec(seat_id: &str, class: &str) -> SeatSpec {
    SeatSpec {
        seat_id: seat_id.to_string(),
        code: seat_id.to_string(),
        class: class.to_string(),
        active: true,
    }
}

pub fn trip_request(raw_trip_id: &str) -> CreateTripRequest {
    CreateTripRequest {
        trip_id: raw_trip_id.to_string(),
        seats: vec![
            spec("12A", "normal"),
            spec("12B", "normal"),
            spec("1A", "vip"),
        ],
    }
}

pub fn test_config() -> EngineConfig {
    EngineConfig::new(300, 5, PaymentFailurePolicy::KeepPending).expect("valid config")
}

/// An engine on in-memory persistence with `trip-1` and `trip-2`
/// registered.
pub async fn seeded_engine() -> Arc<Engine> {
    seeded_engine_with_config(test_config()).await
}

pub async fn seeded_engine_with_config(config: EngineConfig) -> Arc<Engine> {
    let persistence: SqlitePersistence =
        SqlitePersistence::new_in_memory().expect("in-memory database");
    let engine: Engine = Engine::new(persistence, config).expect("engine");
    engine
        .register_trip(trip_request("trip-1"), test_now())
        .await
        .expect("register trip-1");
    engine
        .register_trip(trip_request("trip-2"), test_now())
        .await
        .expect("register trip-2");
    Arc::new(engine)
}
