// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

use axum::{
    Json, Router,
    extract::{Path, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use seatwise_api::{
    ApiError, BookingInfo, CreateTripRequest, DEFAULT_LOCK_TTL_SECS, DEFAULT_SWEEP_INTERVAL_SECS,
    Engine, EngineConfig, SeatStatusInfo, TripSnapshot,
};
use seatwise_domain::{PaymentFailurePolicy, TripId};
use seatwise_persistence::SqlitePersistence;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{error, info};

mod live;
mod rooms;

use live::live_handler;
use rooms::TripRooms;

/// Seatwise Server - realtime seat reservation gateway
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long)]
    database: Option<String>,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3080)]
    port: u16,

    /// Seat lock time-to-live in seconds
    #[arg(long, default_value_t = DEFAULT_LOCK_TTL_SECS)]
    lock_ttl_secs: i64,

    /// Interval between expired-lock sweeps in seconds
    #[arg(long, default_value_t = DEFAULT_SWEEP_INTERVAL_SECS)]
    sweep_interval_secs: i64,

    /// How failed or refunded payments map onto the booking lifecycle:
    /// `keep_pending` or `cancel_booking`
    #[arg(long, default_value = "keep_pending")]
    on_payment_failure: String,
}

/// Application state shared across handlers: the reservation engine
/// and the per-trip broadcast rooms.
#[derive(Clone)]
struct AppState {
    /// The reservation engine.
    engine: Arc<Engine>,
    /// Per-trip broadcast rooms for realtime fan-out.
    rooms: TripRooms,
}

/// API response for the health endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct HealthResponse {
    /// Service status indicator.
    status: String,
}

/// API response for listing a trip's seats.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SeatListingResponse {
    /// The trip.
    trip_id: String,
    /// Every seat with its derived status.
    seats: Vec<SeatStatusInfo>,
}

/// API response for listing a trip's occupying bookings.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BookingListingResponse {
    /// The trip.
    trip_id: String,
    /// Bookings whose seats are out of the sellable pool.
    bookings: Vec<BookingInfo>,
}

/// API request for the administrative cancel endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AdminCancelRequest {
    /// Free-text reason recorded in the booking event trail.
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

/// API response for the administrative cancel endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AdminCancelResponse {
    /// Success indicator.
    success: bool,
    /// The trip the booking belonged to.
    trip_id: String,
    /// The booking after cancellation.
    booking: BookingInfo,
}

/// Error response type.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    /// Error indicator.
    error: bool,
    /// Stable machine-readable reason code.
    reason_code: String,
    /// Error message.
    message: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// Stable machine-readable reason code.
    reason_code: &'static str,
    /// The error message.
    message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            reason_code: self.reason_code.to_string(),
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let status: StatusCode = match &err {
            ApiError::TripNotFound { .. } | ApiError::BookingNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            ApiError::SeatAlreadyLocked { .. }
            | ApiError::SeatAlreadyBooked { .. }
            | ApiError::NotLockHolder { .. }
            | ApiError::SeatNotLockedByHolder { .. }
            | ApiError::InvalidTransition { .. } => StatusCode::CONFLICT,
            ApiError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            ApiError::Internal { .. } => {
                error!(error = %err, "Internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            reason_code: err.reason_code(),
            message: err.to_string(),
        }
    }
}

/// Parses a path segment into a trip id.
fn parse_trip_id(raw: &str) -> Result<TripId, HttpError> {
    TripId::new(raw).map_err(|e| HttpError {
        status: StatusCode::BAD_REQUEST,
        reason_code: "invalid_input",
        message: e.to_string(),
    })
}

/// Handler for GET `/health` endpoint.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: String::from("ok"),
    })
}

/// Handler for POST `/trips` endpoint.
///
/// Registers a trip and its seat layout from the collaborator catalog.
async fn handle_create_trip(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<CreateTripRequest>,
) -> Result<(StatusCode, Json<TripSnapshot>), HttpError> {
    info!(trip_id = %req.trip_id, seat_count = req.seats.len(), "Handling create_trip request");

    let snapshot: TripSnapshot = app_state
        .engine
        .register_trip(req, OffsetDateTime::now_utc())
        .await?;

    Ok((StatusCode::CREATED, Json(snapshot)))
}

/// Handler for GET `/trips/{trip_id}/seats` endpoint.
async fn handle_list_seats(
    AxumState(app_state): AxumState<AppState>,
    Path(trip_id): Path<String>,
) -> Result<Json<SeatListingResponse>, HttpError> {
    let trip_id: TripId = parse_trip_id(&trip_id)?;
    let seats: Vec<SeatStatusInfo> = app_state
        .engine
        .seat_statuses(&trip_id, OffsetDateTime::now_utc())
        .await?;

    Ok(Json(SeatListingResponse {
        trip_id: trip_id.value().to_string(),
        seats,
    }))
}

/// Handler for GET `/trips/{trip_id}/bookings` endpoint.
async fn handle_list_bookings(
    AxumState(app_state): AxumState<AppState>,
    Path(trip_id): Path<String>,
) -> Result<Json<BookingListingResponse>, HttpError> {
    let trip_id: TripId = parse_trip_id(&trip_id)?;
    let bookings: Vec<BookingInfo> = app_state.engine.current_bookings(&trip_id).await?;

    Ok(Json(BookingListingResponse {
        trip_id: trip_id.value().to_string(),
        bookings,
    }))
}

/// Handler for POST `/bookings/{booking_id}/admin_cancel` endpoint.
///
/// The administrative exception path: may cancel even a paid booking,
/// and the recorded reason lands in the booking event trail. The
/// engine publishes the freed seats to the trip's room.
async fn handle_admin_cancel(
    AxumState(app_state): AxumState<AppState>,
    Path(booking_id): Path<String>,
    Json(req): Json<AdminCancelRequest>,
) -> Result<Json<AdminCancelResponse>, HttpError> {
    info!(booking_id = %booking_id, "Handling admin_cancel request");

    let (trip_id, booking, _) = app_state
        .engine
        .admin_cancel_booking(&booking_id, req.reason.as_deref(), OffsetDateTime::now_utc())
        .await?;

    Ok(Json(AdminCancelResponse {
        success: true,
        trip_id: trip_id.value().to_string(),
        booking,
    }))
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/trips", post(handle_create_trip))
        .route("/trips/{trip_id}/seats", get(handle_list_seats))
        .route("/trips/{trip_id}/bookings", get(handle_list_bookings))
        .route(
            "/bookings/{booking_id}/admin_cancel",
            post(handle_admin_cancel),
        )
        .route("/live", get(live_handler))
        .with_state(app_state)
}

/// Spawns the background sweep that expires stale locks. The engine
/// publishes the freed seats to each affected room as it sweeps.
fn spawn_expiry_sweep(engine: Arc<Engine>, interval_secs: i64) {
    let period: std::time::Duration =
        std::time::Duration::from_secs(interval_secs.unsigned_abs());
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = engine.expire_locks(OffsetDateTime::now_utc()).await {
                error!(error = %e, "Expiry sweep failed");
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args: Args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Seatwise Server");

    let policy: PaymentFailurePolicy = args.on_payment_failure.parse()?;
    let config: EngineConfig =
        EngineConfig::new(args.lock_ttl_secs, args.sweep_interval_secs, policy)?;

    // Initialize persistence (in-memory or file-based based on CLI argument)
    let persistence: SqlitePersistence = if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        SqlitePersistence::new_with_file(db_path)?
    } else {
        info!("Using in-memory database");
        SqlitePersistence::new_in_memory()?
    };

    // The engine publishes committed events into the rooms while it
    // still holds the trip's mutex, so each room's feed stays in
    // commit order.
    let rooms: TripRooms = TripRooms::new();
    let engine: Arc<Engine> = Arc::new(
        Engine::new(persistence, config)?.with_publisher(Arc::new(rooms.clone())),
    );
    spawn_expiry_sweep(Arc::clone(&engine), args.sweep_interval_secs);

    let app_state: AppState = AppState { engine, rooms };

    // Build router
    let app: Router = build_router(app_state);

    // Bind to address
    let addr: std::net::SocketAddr = format!("127.0.0.1:{}", args.port).parse()?;
    info!("Server listening on {}", addr);

    // Run server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode as HttpStatusCode},
    };
    use seatwise_api::SeatSpec;
    use tower::ServiceExt;

    /// Helper to create test app state with in-memory persistence.
    fn create_test_app_state() -> AppState {
        let persistence: SqlitePersistence =
            SqlitePersistence::new_in_memory().expect("Failed to create in-memory persistence");
        let config: EngineConfig = EngineConfig::default();
        let rooms: TripRooms = TripRooms::new();
        let engine: Engine = Engine::new(persistence, config)
            .expect("Failed to create engine")
            .with_publisher(Arc::new(rooms.clone()));
        AppState {
            engine: Arc::new(engine),
            rooms,
        }
    }

    /// Helper to create a trip registration request body.
    fn create_trip_request(trip_id: &str) -> CreateTripRequest {
        CreateTripRequest {
            trip_id: trip_id.to_string(),
            seats: vec![
                SeatSpec {
                    seat_id: String::from("12A"),
                    code: String::from("12A"),
                    class: String::from("normal"),
                    active: true,
                },
                SeatSpec {
                    seat_id: String::from("12B"),
                    code: String::from("12B"),
                    class: String::from("normal"),
                    active: true,
                },
                SeatSpec {
                    seat_id: String::from("1A"),
                    code: String::from("1A"),
                    class: String::from("vip"),
                    active: true,
                },
            ],
        }
    }

    fn post_trip(trip_id: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/trips")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::to_string(&create_trip_request(trip_id)).unwrap(),
            ))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_returns_ok() {
        let app: Router = build_router(create_test_app_state());

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), HttpStatusCode::OK);
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let health: HealthResponse = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(health.status, "ok");
    }

    #[tokio::test]
    async fn test_create_trip_then_list_seats() {
        let app: Router = build_router(create_test_app_state());

        let response = app.clone().oneshot(post_trip("trip-1")).await.unwrap();
        assert_eq!(response.status(), HttpStatusCode::CREATED);

        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let snapshot: TripSnapshot = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(snapshot.trip_id, "trip-1");
        assert_eq!(snapshot.seats.len(), 3);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/trips/trip-1/seats")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), HttpStatusCode::OK);
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let listing: SeatListingResponse = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(listing.trip_id, "trip-1");
        assert_eq!(listing.seats.len(), 3);
        assert!(
            listing
                .seats
                .iter()
                .all(|s| s.status == seatwise_domain::SeatStatus::Available)
        );
    }

    #[tokio::test]
    async fn test_duplicate_trip_registration_returns_bad_request() {
        let app: Router = build_router(create_test_app_state());

        let response = app.clone().oneshot(post_trip("trip-1")).await.unwrap();
        assert_eq!(response.status(), HttpStatusCode::CREATED);

        let response = app.oneshot(post_trip("trip-1")).await.unwrap();
        assert_eq!(response.status(), HttpStatusCode::BAD_REQUEST);

        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let err: ErrorResponse = serde_json::from_slice(&body_bytes).unwrap();
        assert!(err.error);
        assert_eq!(err.reason_code, "invalid_input");
    }

    #[tokio::test]
    async fn test_unknown_trip_seats_returns_not_found() {
        let app: Router = build_router(create_test_app_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/trips/trip-9/seats")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), HttpStatusCode::NOT_FOUND);
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let err: ErrorResponse = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(err.reason_code, "trip_not_found");
    }

    #[tokio::test]
    async fn test_unknown_trip_bookings_returns_not_found() {
        let app: Router = build_router(create_test_app_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/trips/trip-9/bookings")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), HttpStatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_admin_cancel_of_unknown_booking_returns_not_found() {
        let app: Router = build_router(create_test_app_state());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/bookings/00000000-0000-4000-8000-000000000000/admin_cancel")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"reason": "test"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), HttpStatusCode::NOT_FOUND);
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let err: ErrorResponse = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(err.reason_code, "booking_not_found");
    }

    #[tokio::test]
    async fn test_new_trip_has_no_bookings() {
        let app: Router = build_router(create_test_app_state());

        app.clone().oneshot(post_trip("trip-1")).await.unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/trips/trip-1/bookings")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), HttpStatusCode::OK);
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let listing: BookingListingResponse = serde_json::from_slice(&body_bytes).unwrap();
        assert!(listing.bookings.is_empty());
    }
}
