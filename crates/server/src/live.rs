// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The realtime WebSocket surface.
//!
//! Clients connect to `/live?holder=<id>` and drive seat selection
//! through tagged JSON messages. Every client request carries a
//! `request_id` and resolves to exactly one `ack`; state-change
//! events reach clients through the trip rooms they have joined.
//!
//! A connection's holder identity is fixed at upgrade time. When the
//! socket closes, for any reason, every room subscription is dropped
//! and all of the holder's live locks are released.

use axum::{
    extract::{
        Query, State as AxumState, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, stream::StreamExt};
use seatwise_api::{ApiError, BookingInfo, SeatStatusInfo, TripSnapshot, translate_domain_error};
use seatwise_domain::{
    BookingId, BookingStatus, HolderId, PaymentStatus, PaymentUpdate, TripEvent, TripId,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::AppState;
use crate::rooms::RoomSubscription;

/// Outgoing message buffer per connection.
const OUTBOUND_BUFFER_SIZE: usize = 64;

/// Query parameters for the live endpoint.
#[derive(Debug, Deserialize)]
pub struct LiveQuery {
    /// The holder identity for this connection.
    holder: String,
}

/// Messages a client sends over the live socket.
///
/// Every variant carries a client-chosen `request_id` that is echoed
/// in the matching acknowledgment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Join a trip's room and receive a snapshot.
    JoinTrip {
        /// Client request correlation id.
        request_id: String,
        /// The trip to join.
        trip_id: String,
    },
    /// Leave a trip's room.
    LeaveTrip {
        /// Client request correlation id.
        request_id: String,
        /// The trip to leave.
        trip_id: String,
    },
    /// Acquire (or refresh, same holder) a seat lock.
    LockSeat {
        /// Client request correlation id.
        request_id: String,
        /// The trip.
        trip_id: String,
        /// The seat to lock.
        seat_id: String,
    },
    /// Release a held seat lock.
    UnlockSeat {
        /// Client request correlation id.
        request_id: String,
        /// The trip.
        trip_id: String,
        /// The seat to unlock.
        seat_id: String,
    },
    /// Extend a held seat lock.
    RefreshLock {
        /// Client request correlation id.
        request_id: String,
        /// The trip.
        trip_id: String,
        /// The seat whose lock to extend.
        seat_id: String,
    },
    /// Commit a booking over locked seats.
    CreateBooking {
        /// Client request correlation id.
        request_id: String,
        /// The trip.
        trip_id: String,
        /// The seats to commit. All must be locked by this holder.
        seat_ids: Vec<String>,
        /// Total amount in minor currency units.
        total_amount: i64,
    },
    /// Apply a booking status transition.
    UpdateBookingStatus {
        /// Client request correlation id.
        request_id: String,
        /// The trip.
        trip_id: String,
        /// The booking.
        booking_id: String,
        /// The target status.
        status: String,
    },
    /// Report a payment status for a booking.
    RecordPayment {
        /// Client request correlation id.
        request_id: String,
        /// The booking.
        booking_id: String,
        /// The reported payment status.
        status: String,
        /// Paid amount in minor currency units, if known.
        amount: Option<i64>,
        /// Payment method, if known.
        method: Option<String>,
        /// Processor transaction reference, if known.
        transaction_id: Option<String>,
    },
}

/// Messages the server sends over the live socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection confirmation, sent once after upgrade.
    Connected {
        /// The holder identity bound to this connection.
        holder: String,
        /// Server timestamp (RFC 3339).
        timestamp: String,
    },
    /// The outcome of one client request.
    Ack {
        /// Echo of the client's `request_id`.
        request_id: String,
        /// Whether the request succeeded.
        success: bool,
        /// Stable machine-readable failure code.
        #[serde(skip_serializing_if = "Option::is_none")]
        reason_code: Option<String>,
        /// Human-readable failure description.
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        /// Operation-specific result data.
        #[serde(skip_serializing_if = "serde_json::Value::is_null", default)]
        payload: serde_json::Value,
    },
    /// Point-in-time trip state, sent on every room join.
    Snapshot {
        /// The trip.
        trip_id: String,
        /// Every seat with its derived status.
        seats: Vec<SeatStatusInfo>,
        /// Bookings whose seats are out of the sellable pool.
        bookings: Vec<BookingInfo>,
    },
    /// A state-change event fanned out to a joined room.
    Event {
        /// The trip the event belongs to.
        trip_id: String,
        /// The event.
        event: TripEvent,
    },
}

/// Handles WebSocket upgrade requests for the live endpoint.
///
/// The holder identity is validated before the upgrade; an invalid
/// holder is rejected with 400 and no socket is opened.
pub async fn live_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<LiveQuery>,
    AxumState(state): AxumState<AppState>,
) -> Response {
    match HolderId::new(&query.holder) {
        Ok(holder) => ws.on_upgrade(move |socket| handle_socket(socket, holder, state)),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

/// Per-connection session state: the holder identity and the forwarder
/// task for each joined room.
struct Session {
    holder: HolderId,
    joined: HashMap<TripId, JoinHandle<()>>,
}

async fn handle_socket(socket: WebSocket, holder: HolderId, state: AppState) {
    info!(holder = %holder, "Client connected to live endpoint");

    let (mut sink, mut stream) = socket.split();
    let (out_tx, mut out_rx) = mpsc::channel::<ServerMessage>(OUTBOUND_BUFFER_SIZE);

    // Single writer: every outgoing message funnels through one task,
    // so acks and room events interleave without contending for the
    // sink.
    let mut writer = tokio::spawn(async move {
        while let Some(message) = out_rx.recv().await {
            match serde_json::to_string(&message) {
                Ok(json) => {
                    if sink.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!(?e, "Failed to serialize server message");
                }
            }
        }
    });

    let connected: ServerMessage = ServerMessage::Connected {
        holder: holder.value().to_string(),
        timestamp: rfc3339_now(),
    };
    if out_tx.send(connected).await.is_err() {
        warn!("Failed to send connection confirmation");
        writer.abort();
        return;
    }

    let mut session: Session = Session {
        holder: holder.clone(),
        joined: HashMap::new(),
    };

    loop {
        tokio::select! {
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_text(&state, &mut session, &out_tx, text.as_str()).await;
                    }
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                    Some(Ok(Message::Binary(_))) => {
                        warn!(holder = %holder, "Ignoring binary message");
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                }
            }
            _ = &mut writer => break,
        }
    }

    // Disconnect cleanup: drop all room subscriptions, then release
    // every live lock this holder had, anywhere. The engine publishes
    // the resulting unlock events to each trip's room itself.
    for (_, forwarder) in session.joined.drain() {
        forwarder.abort();
    }
    if let Err(e) = state.engine.release_holder(holder.value(), now()).await {
        error!(holder = %holder, error = %e, "Disconnect cleanup failed");
    }
    writer.abort();

    info!(holder = %holder, "Client disconnected from live endpoint");
}

async fn handle_text(
    state: &AppState,
    session: &mut Session,
    out_tx: &mpsc::Sender<ServerMessage>,
    text: &str,
) {
    // The request_id is recovered from the raw JSON first so even a
    // malformed request gets a correlatable failure ack.
    let raw: serde_json::Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            send(out_tx, invalid_input_ack(String::new(), &e.to_string())).await;
            return;
        }
    };
    let request_id: String = raw
        .get("request_id")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string();

    let message: ClientMessage = match serde_json::from_value(raw) {
        Ok(message) => message,
        Err(e) => {
            send(out_tx, invalid_input_ack(request_id, &e.to_string())).await;
            return;
        }
    };

    let ack: ServerMessage = dispatch(state, session, out_tx, message).await;
    send(out_tx, ack).await;
}

#[allow(clippy::too_many_lines)]
async fn dispatch(
    state: &AppState,
    session: &mut Session,
    out_tx: &mpsc::Sender<ServerMessage>,
    message: ClientMessage,
) -> ServerMessage {
    match message {
        ClientMessage::JoinTrip {
            request_id,
            trip_id,
        } => join_trip(state, session, out_tx, request_id, &trip_id).await,
        ClientMessage::LeaveTrip {
            request_id,
            trip_id,
        } => {
            let parsed: TripId = match TripId::new(&trip_id) {
                Ok(id) => id,
                Err(e) => return failure_ack(request_id, &translate_domain_error(e)),
            };
            if let Some(forwarder) = session.joined.remove(&parsed) {
                forwarder.abort();
                debug!(holder = %session.holder, trip = %parsed, "Left trip room");
            }
            success_ack(request_id, serde_json::Value::Null)
        }
        ClientMessage::LockSeat {
            request_id,
            trip_id,
            seat_id,
        } => {
            let parsed: TripId = match TripId::new(&trip_id) {
                Ok(id) => id,
                Err(e) => return failure_ack(request_id, &translate_domain_error(e)),
            };
            match state
                .engine
                .lock_seat(&parsed, &seat_id, session.holder.value(), now())
                .await
            {
                Ok((ack, _)) => success_ack(request_id, payload_of(&ack)),
                Err(e) => failure_ack(request_id, &e),
            }
        }
        ClientMessage::UnlockSeat {
            request_id,
            trip_id,
            seat_id,
        } => {
            let parsed: TripId = match TripId::new(&trip_id) {
                Ok(id) => id,
                Err(e) => return failure_ack(request_id, &translate_domain_error(e)),
            };
            match state
                .engine
                .unlock_seat(&parsed, &seat_id, session.holder.value(), now())
                .await
            {
                Ok(_) => success_ack(request_id, serde_json::Value::Null),
                Err(e) => failure_ack(request_id, &e),
            }
        }
        ClientMessage::RefreshLock {
            request_id,
            trip_id,
            seat_id,
        } => {
            let parsed: TripId = match TripId::new(&trip_id) {
                Ok(id) => id,
                Err(e) => return failure_ack(request_id, &translate_domain_error(e)),
            };
            match state
                .engine
                .refresh_lock(&parsed, &seat_id, session.holder.value(), now())
                .await
            {
                Ok((ack, _)) => success_ack(request_id, payload_of(&ack)),
                Err(e) => failure_ack(request_id, &e),
            }
        }
        ClientMessage::CreateBooking {
            request_id,
            trip_id,
            seat_ids,
            total_amount,
        } => {
            let parsed: TripId = match TripId::new(&trip_id) {
                Ok(id) => id,
                Err(e) => return failure_ack(request_id, &translate_domain_error(e)),
            };
            match state
                .engine
                .create_booking(
                    &parsed,
                    session.holder.value(),
                    &seat_ids,
                    total_amount,
                    now(),
                )
                .await
            {
                Ok((booking, _)) => success_ack(request_id, payload_of(&booking)),
                Err(e) => failure_ack(request_id, &e),
            }
        }
        ClientMessage::UpdateBookingStatus {
            request_id,
            trip_id,
            booking_id,
            status,
        } => {
            let parsed: TripId = match TripId::new(&trip_id) {
                Ok(id) => id,
                Err(e) => return failure_ack(request_id, &translate_domain_error(e)),
            };
            let status: BookingStatus = match status.parse() {
                Ok(status) => status,
                Err(e) => return failure_ack(request_id, &translate_domain_error(e)),
            };
            match state
                .engine
                .update_booking_status(&parsed, &booking_id, status, now())
                .await
            {
                Ok((booking, _)) => success_ack(request_id, payload_of(&booking)),
                Err(e) => failure_ack(request_id, &e),
            }
        }
        ClientMessage::RecordPayment {
            request_id,
            booking_id,
            status,
            amount,
            method,
            transaction_id,
        } => {
            let booking_id: BookingId = match booking_id.parse() {
                Ok(id) => id,
                Err(e) => return failure_ack(request_id, &translate_domain_error(e)),
            };
            let status: PaymentStatus = match status.parse() {
                Ok(status) => status,
                Err(e) => return failure_ack(request_id, &translate_domain_error(e)),
            };
            let update: PaymentUpdate = PaymentUpdate {
                booking_id,
                status,
                amount,
                method,
                transaction_id,
                updated_at: now(),
            };
            match state.engine.record_payment(update, now()).await {
                Ok((_, booking, _)) => success_ack(request_id, payload_of(&booking)),
                Err(e) => failure_ack(request_id, &e),
            }
        }
    }
}

/// Joins a trip room: subscribes, starts the event forwarder, and
/// sends the snapshot the late joiner needs to catch up.
async fn join_trip(
    state: &AppState,
    session: &mut Session,
    out_tx: &mpsc::Sender<ServerMessage>,
    request_id: String,
    trip_id: &str,
) -> ServerMessage {
    let parsed: TripId = match TripId::new(trip_id) {
        Ok(id) => id,
        Err(e) => return failure_ack(request_id, &translate_domain_error(e)),
    };

    let (subscription, snapshot): (Option<RoomSubscription>, TripSnapshot) =
        if session.joined.contains_key(&parsed) {
            match state.engine.trip_snapshot(&parsed, now()).await {
                Ok(snapshot) => (None, snapshot),
                Err(e) => return failure_ack(request_id, &e),
            }
        } else {
            match subscribe_then_snapshot(state, &parsed).await {
                Ok((subscription, snapshot)) => (Some(subscription), snapshot),
                Err(e) => return failure_ack(request_id, &e),
            }
        };

    if let Some(mut subscription) = subscription {
        let forward_tx: mpsc::Sender<ServerMessage> = out_tx.clone();
        let forward_trip: String = parsed.value().to_string();
        let forwarder: JoinHandle<()> = tokio::spawn(async move {
            while let Ok(event) = subscription.recv().await {
                let message: ServerMessage = ServerMessage::Event {
                    trip_id: forward_trip.clone(),
                    event,
                };
                if forward_tx.send(message).await.is_err() {
                    break;
                }
            }
        });
        session.joined.insert(parsed.clone(), forwarder);
        debug!(holder = %session.holder, trip = %parsed, "Joined trip room");
    }

    send(
        out_tx,
        ServerMessage::Snapshot {
            trip_id: snapshot.trip_id,
            seats: snapshot.seats,
            bookings: snapshot.bookings,
        },
    )
    .await;

    success_ack(request_id, serde_json::Value::Null)
}

/// Subscribes to the trip's room before reading the snapshot, so an
/// event committed between the two waits in the subscription instead
/// of being lost. An event older than the snapshot is a harmless
/// duplicate; a missed one would leave the joiner stale until the
/// seat next changes.
///
/// On an unknown trip the fresh subscription is dropped with the
/// error, so a failed join never keeps a room open.
async fn subscribe_then_snapshot(
    state: &AppState,
    trip_id: &TripId,
) -> Result<(RoomSubscription, TripSnapshot), ApiError> {
    let subscription: RoomSubscription = state.rooms.join(trip_id);
    let snapshot: TripSnapshot = state.engine.trip_snapshot(trip_id, now()).await?;
    Ok((subscription, snapshot))
}

async fn send(out_tx: &mpsc::Sender<ServerMessage>, message: ServerMessage) {
    if out_tx.send(message).await.is_err() {
        debug!("Outbound channel closed, dropping message");
    }
}

fn success_ack(request_id: String, payload: serde_json::Value) -> ServerMessage {
    ServerMessage::Ack {
        request_id,
        success: true,
        reason_code: None,
        message: None,
        payload,
    }
}

fn failure_ack(request_id: String, err: &ApiError) -> ServerMessage {
    if matches!(err, ApiError::Internal { .. }) {
        error!(error = %err, "Internal error on live request");
    }
    ServerMessage::Ack {
        request_id,
        success: false,
        reason_code: Some(err.reason_code().to_string()),
        message: Some(err.to_string()),
        payload: serde_json::Value::Null,
    }
}

fn invalid_input_ack(request_id: String, detail: &str) -> ServerMessage {
    failure_ack(
        request_id,
        &ApiError::InvalidInput {
            field: String::from("message"),
            message: format!("Malformed request: {detail}"),
        },
    )
}

fn payload_of<T: Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

fn rfc3339_now() -> String {
    now()
        .format(&Rfc3339)
        .unwrap_or_else(|_| String::from("unknown"))
}
