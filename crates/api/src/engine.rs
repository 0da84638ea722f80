// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The reservation engine service layer.
//!
//! Owns the per-trip state table and serializes every mutating
//! operation on one trip through that trip's mutex and the pure core
//! `apply`. This is what makes seat acquisition linearizable: two
//! concurrent lock attempts on the same seat resolve to exactly one
//! winner, decided by mutex acquisition order.

use seatwise::{Command, TransitionResult, TripState, apply};
use seatwise_domain::{
    Booking, BookingId, BookingStatus, HolderId, PaymentUpdate, Seat, SeatClass, SeatId, TripEvent,
    TripId,
};
use seatwise_persistence::SqlitePersistence;
use std::collections::HashMap;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{ApiError, translate_core_error, translate_domain_error};
use crate::request_response::{
    BookingInfo, CreateTripRequest, LockAck, SeatStatusInfo, TripSnapshot, seat_status_listing,
};

/// Events produced by an operation, grouped by the trip they belong
/// to. Mutating operations return them so callers and tests can see
/// what was emitted; publication to the rooms happens inside the
/// engine, not from these.
pub type TripEventBatches = Vec<(TripId, Vec<TripEvent>)>;

/// Sink for committed trip events, implemented by the gateway's room
/// registry.
///
/// The engine calls `publish` while it still holds the trip's mutex,
/// so events for one seat or booking reach the sink in commit order.
/// Implementations must not block.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, trip_id: &TripId, events: &[TripEvent]);
}

/// The reservation engine.
///
/// Lock order is fixed: trip table read/write lock, then a single
/// trip's mutex, then the persistence mutex. No operation holds two
/// trip mutexes at once.
pub struct Engine {
    config: EngineConfig,
    persistence: Mutex<SqlitePersistence>,
    trips: RwLock<HashMap<TripId, Arc<Mutex<TripState>>>>,
    publisher: Option<Arc<dyn EventPublisher>>,
}

impl Engine {
    /// Builds an engine on top of a persistence handle, reloading all
    /// persisted trips and bookings into memory.
    ///
    /// Locks are not reloaded: they are ephemeral session state and a
    /// restart clears them.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read.
    pub fn new(
        persistence: SqlitePersistence,
        config: EngineConfig,
    ) -> Result<Self, ApiError> {
        let mut trips: HashMap<TripId, Arc<Mutex<TripState>>> = HashMap::new();

        for trip_id in persistence.list_trips()? {
            let seats: Vec<Seat> = persistence.load_seats(&trip_id)?;
            let bookings: Vec<Booking> = persistence.load_bookings(&trip_id)?;

            let mut state: TripState = TripState::new(trip_id.clone(), seats);
            state.bookings = bookings;

            info!(
                trip = %trip_id,
                seat_count = state.seats.len(),
                booking_count = state.bookings.len(),
                "Recovered trip state"
            );
            trips.insert(trip_id, Arc::new(Mutex::new(state)));
        }

        Ok(Self {
            config,
            persistence: Mutex::new(persistence),
            trips: RwLock::new(trips),
            publisher: None,
        })
    }

    /// Attaches the event sink that committed events are published to.
    ///
    /// Without one the engine still returns events to its callers; it
    /// just has nowhere to fan them out.
    #[must_use]
    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Must be called while the trip's mutex is held: that is what
    /// orders two operations on the same seat onto the channel the
    /// same way they committed.
    fn publish(&self, trip_id: &TripId, events: &[TripEvent]) {
        if events.is_empty() {
            return;
        }
        if let Some(publisher) = &self.publisher {
            publisher.publish(trip_id, events);
        }
    }

    /// Returns the engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Lists all registered trip ids, sorted.
    pub async fn trip_ids(&self) -> Vec<TripId> {
        let trips = self.trips.read().await;
        let mut ids: Vec<TripId> = trips.keys().cloned().collect();
        ids.sort();
        ids
    }

    async fn room(&self, trip_id: &TripId) -> Result<Arc<Mutex<TripState>>, ApiError> {
        let trips = self.trips.read().await;
        trips
            .get(trip_id)
            .cloned()
            .ok_or_else(|| ApiError::TripNotFound {
                trip_id: trip_id.value().to_string(),
            })
    }

    // ========================================================================
    // Catalog
    // ========================================================================

    /// Registers a trip and its seat layout from a collaborator-
    /// supplied catalog entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the trip already exists, the layout is
    /// invalid, or persistence fails.
    pub async fn register_trip(
        &self,
        request: CreateTripRequest,
        now: OffsetDateTime,
    ) -> Result<TripSnapshot, ApiError> {
        let trip_id: TripId = TripId::new(&request.trip_id).map_err(translate_domain_error)?;

        let mut seats: Vec<Seat> = Vec::with_capacity(request.seats.len());
        for spec in &request.seats {
            let seat_id: SeatId = SeatId::new(&spec.seat_id).map_err(translate_domain_error)?;
            if seats.iter().any(|s| s.seat_id == seat_id) {
                return Err(ApiError::InvalidInput {
                    field: String::from("seats"),
                    message: format!("Seat '{seat_id}' appears more than once in the layout"),
                });
            }
            let class: SeatClass = spec.class.parse().map_err(translate_domain_error)?;
            seats.push(
                Seat::new(seat_id, &spec.code, class, spec.active)
                    .map_err(translate_domain_error)?,
            );
        }
        if seats.is_empty() {
            return Err(ApiError::InvalidInput {
                field: String::from("seats"),
                message: String::from("A trip needs at least one seat"),
            });
        }

        // Hold the table write lock across the persistence insert so a
        // duplicate registration cannot race past the existence check.
        let mut trips = self.trips.write().await;
        if trips.contains_key(&trip_id) {
            return Err(ApiError::InvalidInput {
                field: String::from("trip_id"),
                message: format!("Trip '{trip_id}' already exists"),
            });
        }

        {
            let mut persistence = self.persistence.lock().await;
            persistence.insert_trip(&trip_id, &seats, now)?;
        }

        let state: TripState = TripState::new(trip_id.clone(), seats);
        let snapshot: TripSnapshot = snapshot_of(&state, now);
        trips.insert(trip_id.clone(), Arc::new(Mutex::new(state)));

        info!(trip = %trip_id, "Registered trip");

        Ok(snapshot)
    }

    // ========================================================================
    // Read side
    // ========================================================================

    /// Returns every seat of a trip with its derived status.
    ///
    /// # Errors
    ///
    /// Returns `TripNotFound` if the trip is not registered.
    pub async fn seat_statuses(
        &self,
        trip_id: &TripId,
        now: OffsetDateTime,
    ) -> Result<Vec<SeatStatusInfo>, ApiError> {
        let room = self.room(trip_id).await?;
        let state = room.lock().await;
        Ok(seat_status_listing(&state.seats, &state.seat_statuses(now)))
    }

    /// Returns the bookings currently occupying seats on a trip.
    ///
    /// # Errors
    ///
    /// Returns `TripNotFound` if the trip is not registered.
    pub async fn current_bookings(&self, trip_id: &TripId) -> Result<Vec<BookingInfo>, ApiError> {
        let room = self.room(trip_id).await?;
        let state = room.lock().await;
        Ok(state
            .active_bookings()
            .into_iter()
            .map(BookingInfo::from_booking)
            .collect())
    }

    /// Returns a consistent point-in-time snapshot of a trip: seat
    /// statuses and occupying bookings read under one lock hold.
    ///
    /// # Errors
    ///
    /// Returns `TripNotFound` if the trip is not registered.
    pub async fn trip_snapshot(
        &self,
        trip_id: &TripId,
        now: OffsetDateTime,
    ) -> Result<TripSnapshot, ApiError> {
        let room = self.room(trip_id).await?;
        let state = room.lock().await;
        Ok(snapshot_of(&state, now))
    }

    // ========================================================================
    // Locks
    // ========================================================================

    /// Acquires or refreshes (same holder) an exclusive lock on a
    /// seat.
    ///
    /// # Errors
    ///
    /// Returns `seat_already_locked` if another holder has a live
    /// lock, `seat_already_booked` if the seat is committed, or an
    /// input error for unknown seats.
    pub async fn lock_seat(
        &self,
        trip_id: &TripId,
        seat_id: &str,
        holder: &str,
        now: OffsetDateTime,
    ) -> Result<(LockAck, Vec<TripEvent>), ApiError> {
        let seat_id: SeatId = SeatId::new(seat_id).map_err(translate_domain_error)?;
        let holder: HolderId = HolderId::new(holder).map_err(translate_domain_error)?;

        let room = self.room(trip_id).await?;
        let mut state = room.lock().await;
        let result: TransitionResult = apply(
            &state,
            Command::LockSeat {
                seat_id: seat_id.clone(),
                holder,
                ttl: self.config.lock_ttl,
            },
            now,
        )
        .map_err(translate_core_error)?;

        let expires_at: OffsetDateTime = lock_expiry(&result.events)?;
        *state = result.new_state;
        self.publish(trip_id, &result.events);

        debug!(trip = %trip_id, seat = %seat_id, "Locked seat");

        Ok((
            LockAck {
                seat_id: seat_id.value().to_string(),
                expires_at,
            },
            result.events,
        ))
    }

    /// Releases the caller's lock on a seat. Releasing an absent or
    /// expired lock is a no-op success.
    ///
    /// # Errors
    ///
    /// Returns `not_lock_holder` if another holder has a live lock.
    pub async fn unlock_seat(
        &self,
        trip_id: &TripId,
        seat_id: &str,
        holder: &str,
        now: OffsetDateTime,
    ) -> Result<Vec<TripEvent>, ApiError> {
        let seat_id: SeatId = SeatId::new(seat_id).map_err(translate_domain_error)?;
        let holder: HolderId = HolderId::new(holder).map_err(translate_domain_error)?;

        let room = self.room(trip_id).await?;
        let mut state = room.lock().await;
        let result: TransitionResult = apply(
            &state,
            Command::UnlockSeat { seat_id, holder },
            now,
        )
        .map_err(translate_core_error)?;
        *state = result.new_state;
        self.publish(trip_id, &result.events);
        Ok(result.events)
    }

    /// Extends the caller's live lock on a seat.
    ///
    /// # Errors
    ///
    /// Returns `not_lock_holder` if the caller holds no live lock.
    pub async fn refresh_lock(
        &self,
        trip_id: &TripId,
        seat_id: &str,
        holder: &str,
        now: OffsetDateTime,
    ) -> Result<(LockAck, Vec<TripEvent>), ApiError> {
        let seat_id: SeatId = SeatId::new(seat_id).map_err(translate_domain_error)?;
        let holder: HolderId = HolderId::new(holder).map_err(translate_domain_error)?;

        let room = self.room(trip_id).await?;
        let mut state = room.lock().await;
        let result: TransitionResult = apply(
            &state,
            Command::RefreshLock {
                seat_id: seat_id.clone(),
                holder,
                ttl: self.config.lock_ttl,
            },
            now,
        )
        .map_err(translate_core_error)?;

        let expires_at: OffsetDateTime = lock_expiry(&result.events)?;
        *state = result.new_state;
        self.publish(trip_id, &result.events);

        Ok((
            LockAck {
                seat_id: seat_id.value().to_string(),
                expires_at,
            },
            result.events,
        ))
    }

    /// Releases every live lock a holder has, across all trips.
    ///
    /// This is the disconnect cleanup path. Events are published to
    /// each trip's room as that trip commits; the returned batches
    /// report what was released.
    ///
    /// # Errors
    ///
    /// Returns an input error if the holder id is invalid.
    pub async fn release_holder(
        &self,
        holder: &str,
        now: OffsetDateTime,
    ) -> Result<TripEventBatches, ApiError> {
        let holder: HolderId = HolderId::new(holder).map_err(translate_domain_error)?;

        let rooms: Vec<(TripId, Arc<Mutex<TripState>>)> = {
            let trips = self.trips.read().await;
            trips
                .iter()
                .map(|(id, room)| (id.clone(), Arc::clone(room)))
                .collect()
        };

        let mut batches: TripEventBatches = Vec::new();
        for (trip_id, room) in rooms {
            let mut state = room.lock().await;
            let result: TransitionResult = apply(
                &state,
                Command::ReleaseHolder {
                    holder: holder.clone(),
                },
                now,
            )
            .map_err(translate_core_error)?;
            *state = result.new_state;
            self.publish(&trip_id, &result.events);
            if !result.events.is_empty() {
                batches.push((trip_id, result.events));
            }
        }

        if !batches.is_empty() {
            info!(holder = %holder, trip_count = batches.len(), "Released holder locks");
        }

        Ok(batches)
    }

    /// Sweeps expired locks across all trips, publishing the
    /// `seat_available` events to each trip's room. The returned
    /// batches report what was freed.
    ///
    /// # Errors
    ///
    /// Never fails for valid state; errors propagate from the core.
    pub async fn expire_locks(&self, now: OffsetDateTime) -> Result<TripEventBatches, ApiError> {
        let rooms: Vec<(TripId, Arc<Mutex<TripState>>)> = {
            let trips = self.trips.read().await;
            trips
                .iter()
                .map(|(id, room)| (id.clone(), Arc::clone(room)))
                .collect()
        };

        let mut batches: TripEventBatches = Vec::new();
        for (trip_id, room) in rooms {
            let mut state = room.lock().await;
            let result: TransitionResult =
                apply(&state, Command::ExpireLocks, now).map_err(translate_core_error)?;
            *state = result.new_state;
            self.publish(&trip_id, &result.events);
            if !result.events.is_empty() {
                debug!(trip = %trip_id, expired = result.events.len(), "Expired locks");
                batches.push((trip_id, result.events));
            }
        }
        Ok(batches)
    }

    // ========================================================================
    // Bookings
    // ========================================================================

    /// Commits a booking: all seats must be live-locked by the holder.
    ///
    /// The booking is applied and durably persisted in the same step;
    /// the in-memory state is only replaced once the persistence
    /// transaction commits.
    ///
    /// # Errors
    ///
    /// Returns `seat_not_locked_by_holder` (nothing committed) if any
    /// seat is not locked by the holder, or an input error.
    pub async fn create_booking(
        &self,
        trip_id: &TripId,
        holder: &str,
        seat_ids: &[String],
        total_amount: i64,
        now: OffsetDateTime,
    ) -> Result<(BookingInfo, Vec<TripEvent>), ApiError> {
        let holder: HolderId = HolderId::new(holder).map_err(translate_domain_error)?;
        let mut parsed_seats: Vec<SeatId> = Vec::with_capacity(seat_ids.len());
        for raw in seat_ids {
            parsed_seats.push(SeatId::new(raw).map_err(translate_domain_error)?);
        }

        let room = self.room(trip_id).await?;
        let mut state = room.lock().await;
        let result: TransitionResult = apply(
            &state,
            Command::CreateBooking {
                holder,
                seat_ids: parsed_seats,
                total_amount,
            },
            now,
        )
        .map_err(translate_core_error)?;

        let booking_id: BookingId = created_booking_id(&result.events)?;
        let booking: Booking = result
            .new_state
            .find_booking(booking_id)
            .cloned()
            .ok_or_else(|| ApiError::Internal {
                message: String::from("committed booking missing from new state"),
            })?;

        {
            let mut persistence = self.persistence.lock().await;
            persistence.insert_booking(&booking)?;
        }
        *state = result.new_state;
        self.publish(trip_id, &result.events);

        info!(
            trip = %trip_id,
            booking = %booking.booking_id,
            seat_count = booking.seat_ids.len(),
            "Created booking"
        );

        Ok((BookingInfo::from_booking(&booking), result.events))
    }

    /// Applies a validated booking status transition.
    ///
    /// # Errors
    ///
    /// Returns `invalid_transition` for anything other than
    /// pending → paid/cancelled/expired, or `booking_not_found`.
    pub async fn update_booking_status(
        &self,
        trip_id: &TripId,
        booking_id: &str,
        status: BookingStatus,
        now: OffsetDateTime,
    ) -> Result<(BookingInfo, Vec<TripEvent>), ApiError> {
        let booking_id: BookingId = booking_id.parse().map_err(translate_domain_error)?;

        let room = self.room(trip_id).await?;
        let mut state = room.lock().await;
        let result: TransitionResult = apply(
            &state,
            Command::UpdateBookingStatus { booking_id, status },
            now,
        )
        .map_err(translate_core_error)?;

        let booking: Booking = result
            .new_state
            .find_booking(booking_id)
            .cloned()
            .ok_or_else(|| ApiError::Internal {
                message: String::from("updated booking missing from new state"),
            })?;

        {
            let mut persistence = self.persistence.lock().await;
            persistence.update_booking_status(
                &booking,
                "status_updated",
                &serde_json::json!({ "status": booking.status.as_str() }),
                now,
            )?;
        }
        *state = result.new_state;
        self.publish(trip_id, &result.events);

        info!(trip = %trip_id, booking = %booking.booking_id, status = %booking.status, "Updated booking status");

        Ok((BookingInfo::from_booking(&booking), result.events))
    }

    /// Cancels a booking through the audited administrative exception
    /// path, which may cancel even a paid booking.
    ///
    /// The trip is resolved from the booking id; the reason is written
    /// to the booking event trail.
    ///
    /// # Errors
    ///
    /// Returns `booking_not_found` if no trip holds the booking, or
    /// `invalid_transition` if it is already released.
    pub async fn admin_cancel_booking(
        &self,
        booking_id: &str,
        reason: Option<&str>,
        now: OffsetDateTime,
    ) -> Result<(TripId, BookingInfo, Vec<TripEvent>), ApiError> {
        let booking_id: BookingId = booking_id.parse().map_err(translate_domain_error)?;
        let (trip_id, room) = self.room_with_booking(booking_id).await?;

        let mut state = room.lock().await;
        // Rechecked under the mutex: the booking may have moved on
        // between lookup and lock acquisition.
        let result: TransitionResult = apply(
            &state,
            Command::AdminCancelBooking { booking_id },
            now,
        )
        .map_err(translate_core_error)?;

        let booking: Booking = result
            .new_state
            .find_booking(booking_id)
            .cloned()
            .ok_or_else(|| ApiError::Internal {
                message: String::from("cancelled booking missing from new state"),
            })?;

        {
            let mut persistence = self.persistence.lock().await;
            persistence.update_booking_status(
                &booking,
                "admin_cancelled",
                &serde_json::json!({
                    "status": booking.status.as_str(),
                    "reason": reason,
                }),
                now,
            )?;
        }
        *state = result.new_state;
        self.publish(&trip_id, &result.events);

        warn!(trip = %trip_id, booking = %booking.booking_id, reason, "Admin-cancelled booking");

        Ok((trip_id, BookingInfo::from_booking(&booking), result.events))
    }

    /// Records a payment status report and applies the configured
    /// lifecycle mapping.
    ///
    /// # Errors
    ///
    /// Returns `booking_not_found` if no trip holds the booking.
    pub async fn record_payment(
        &self,
        update: PaymentUpdate,
        now: OffsetDateTime,
    ) -> Result<(TripId, BookingInfo, Vec<TripEvent>), ApiError> {
        let booking_id: BookingId = update.booking_id;
        let (trip_id, room) = self.room_with_booking(booking_id).await?;

        let mut state = room.lock().await;
        let previous_status: BookingStatus = state
            .find_booking(booking_id)
            .map(|b| b.status)
            .ok_or_else(|| ApiError::BookingNotFound {
                booking_id: booking_id.to_string(),
            })?;

        let result: TransitionResult = apply(
            &state,
            Command::RecordPayment {
                update: update.clone(),
                policy: self.config.payment_failure_policy,
            },
            now,
        )
        .map_err(translate_core_error)?;

        let booking: Booking = result
            .new_state
            .find_booking(booking_id)
            .cloned()
            .ok_or_else(|| ApiError::Internal {
                message: String::from("paid booking missing from new state"),
            })?;

        {
            let mut persistence = self.persistence.lock().await;
            persistence.record_payment_update(&trip_id, &update)?;
            if booking.status != previous_status {
                persistence.update_booking_status(
                    &booking,
                    "status_updated",
                    &serde_json::json!({ "status": booking.status.as_str() }),
                    now,
                )?;
            }
        }
        *state = result.new_state;
        self.publish(&trip_id, &result.events);

        info!(
            trip = %trip_id,
            booking = %booking.booking_id,
            payment = %update.status,
            "Recorded payment update"
        );

        Ok((trip_id, BookingInfo::from_booking(&booking), result.events))
    }

    async fn room_with_booking(
        &self,
        booking_id: BookingId,
    ) -> Result<(TripId, Arc<Mutex<TripState>>), ApiError> {
        let rooms: Vec<(TripId, Arc<Mutex<TripState>>)> = {
            let trips = self.trips.read().await;
            trips
                .iter()
                .map(|(id, room)| (id.clone(), Arc::clone(room)))
                .collect()
        };

        for (trip_id, room) in rooms {
            let state = room.lock().await;
            if state.find_booking(booking_id).is_some() {
                drop(state);
                return Ok((trip_id, room));
            }
        }
        Err(ApiError::BookingNotFound {
            booking_id: booking_id.to_string(),
        })
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn snapshot_of(state: &TripState, now: OffsetDateTime) -> TripSnapshot {
    TripSnapshot {
        trip_id: state.trip_id.value().to_string(),
        seats: seat_status_listing(&state.seats, &state.seat_statuses(now)),
        bookings: state
            .active_bookings()
            .into_iter()
            .map(BookingInfo::from_booking)
            .collect(),
    }
}

fn lock_expiry(events: &[TripEvent]) -> Result<OffsetDateTime, ApiError> {
    events
        .iter()
        .find_map(|event| match event {
            TripEvent::SeatLocked { expires_at, .. } => Some(*expires_at),
            _ => None,
        })
        .ok_or_else(|| ApiError::Internal {
            message: String::from("lock transition produced no seat_locked event"),
        })
}

fn created_booking_id(events: &[TripEvent]) -> Result<BookingId, ApiError> {
    events
        .iter()
        .find_map(|event| match event {
            TripEvent::BookingCreated { booking_id, .. } => Some(*booking_id),
            _ => None,
        })
        .ok_or_else(|| ApiError::Internal {
            message: String::from("booking transition produced no booking_created event"),
        })
}
