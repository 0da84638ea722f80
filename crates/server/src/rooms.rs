// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Per-trip broadcast rooms.
//!
//! Every trip has at most one broadcast channel. Clients join a trip's
//! room to receive the stream of state-change events for that trip;
//! membership is tied to the lifetime of the [`RoomSubscription`] a
//! join returns, so a dropped subscription always leaves the room and
//! no listener can leak.
//!
//! Events are informational fan-out. The acknowledgment a requester
//! receives for its own request is the authoritative outcome.

use seatwise_api::EventPublisher;
use seatwise_domain::{TripEvent, TripId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::debug;

/// Maximum number of events to buffer per room channel. A member that
/// cannot keep up loses the oldest events.
const EVENT_BUFFER_SIZE: usize = 100;

struct Room {
    tx: broadcast::Sender<TripEvent>,
    members: usize,
}

/// Registry of per-trip broadcast rooms.
///
/// Cloning is cheap; all clones share one registry.
#[derive(Clone)]
pub struct TripRooms {
    rooms: Arc<Mutex<HashMap<TripId, Room>>>,
}

impl TripRooms {
    /// Creates an empty room registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rooms: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Joins a trip's room, creating the room on first join.
    ///
    /// The returned subscription receives every event broadcast to the
    /// room from this point on. Dropping it leaves the room.
    #[must_use]
    pub fn join(&self, trip_id: &TripId) -> RoomSubscription {
        let mut rooms = lock_rooms(&self.rooms);
        let room: &mut Room = rooms.entry(trip_id.clone()).or_insert_with(|| {
            debug!(trip = %trip_id, "Opened trip room");
            let (tx, _rx) = broadcast::channel(EVENT_BUFFER_SIZE);
            Room { tx, members: 0 }
        });
        room.members += 1;
        let rx: broadcast::Receiver<TripEvent> = room.tx.subscribe();

        RoomSubscription {
            rooms: Arc::clone(&self.rooms),
            trip_id: trip_id.clone(),
            rx,
        }
    }

    /// Broadcasts a batch of events to a trip's room, in order.
    ///
    /// Events for a trip with no open room are dropped: nobody is
    /// listening, and late joiners receive a snapshot instead.
    pub fn broadcast(&self, trip_id: &TripId, events: &[TripEvent]) {
        let rooms = lock_rooms(&self.rooms);
        let Some(room) = rooms.get(trip_id) else {
            return;
        };
        for event in events {
            if room.tx.send(event.clone()).is_err() {
                debug!(trip = %trip_id, "No receivers for trip event");
            }
        }
    }

    /// Returns the number of members currently in a trip's room.
    #[must_use]
    pub fn member_count(&self, trip_id: &TripId) -> usize {
        let rooms = lock_rooms(&self.rooms);
        rooms.get(trip_id).map_or(0, |room| room.members)
    }
}

impl Default for TripRooms {
    fn default() -> Self {
        Self::new()
    }
}

/// The engine publishes into the rooms while it still holds the
/// trip's mutex, so each room's channel carries events in commit
/// order.
impl EventPublisher for TripRooms {
    fn publish(&self, trip_id: &TripId, events: &[TripEvent]) {
        self.broadcast(trip_id, events);
    }
}

/// Membership in one trip's room.
///
/// Receives the room's event stream; dropping it leaves the room, and
/// the room itself is closed when its last member leaves.
pub struct RoomSubscription {
    rooms: Arc<Mutex<HashMap<TripId, Room>>>,
    trip_id: TripId,
    rx: broadcast::Receiver<TripEvent>,
}

impl RoomSubscription {
    /// The trip this subscription belongs to.
    #[must_use]
    pub const fn trip_id(&self) -> &TripId {
        &self.trip_id
    }

    /// Receives the next event broadcast to the room.
    ///
    /// # Errors
    ///
    /// Returns `Lagged` if the member fell behind the buffer, or
    /// `Closed` if the room was closed.
    pub async fn recv(&mut self) -> Result<TripEvent, broadcast::error::RecvError> {
        self.rx.recv().await
    }

    /// Receives an already-buffered event without waiting.
    ///
    /// # Errors
    ///
    /// Returns `Empty` if no event is buffered.
    pub fn try_recv(&mut self) -> Result<TripEvent, broadcast::error::TryRecvError> {
        self.rx.try_recv()
    }
}

impl Drop for RoomSubscription {
    fn drop(&mut self) {
        let mut rooms = lock_rooms(&self.rooms);
        if let Some(room) = rooms.get_mut(&self.trip_id) {
            room.members = room.members.saturating_sub(1);
            if room.members == 0 {
                rooms.remove(&self.trip_id);
                debug!(trip = %self.trip_id, "Closed trip room");
            }
        }
    }
}

fn lock_rooms(
    rooms: &Mutex<HashMap<TripId, Room>>,
) -> std::sync::MutexGuard<'_, HashMap<TripId, Room>> {
    // The map is only ever touched under this lock and no panic can
    // occur while it is held, so poisoning is unreachable.
    match rooms.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
