mod availability;
mod error;
mod mutations;
mod queries;

pub use availability::{is_available, merge_ranges, open_ranges, subtract_ranges};
pub use error::EngineError;
pub use queries::ReservationQuery;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{RwLock, mpsc, oneshot};

use crate::audit::AuditLog;
use crate::model::*;
use crate::wal::Wal;

pub type SharedRoomState = Arc<RwLock<RoomState>>;

// ── Group-commit WAL channel ─────────────────────────────

pub(super) struct WalAppend {
    event: Event,
    response: oneshot::Sender<io::Result<()>>,
}

/// Background task that owns the WAL and batches appends for group commit.
/// 1. Block until the first append arrives.
/// 2. Buffer it (no fsync).
/// 3. Drain all immediately available appends (the batch window).
/// 4. Single flush_sync for the whole batch.
/// 5. Answer each sender with its own event's outcome.
///
/// A sender must be told Ok exactly when its event will be seen by replay.
/// A failed append can leave partial bytes in the file and a failed fsync
/// leaves the durable tail unknown, so on any write failure the writer
/// answers what it knows and stops: pending and future appends all fail,
/// and nothing is ever appended after a possibly corrupt tail.
async fn wal_writer_loop(mut wal: Wal, mut rx: mpsc::Receiver<WalAppend>) {
    while let Some(first) = rx.recv().await {
        let mut batch = vec![first];

        // Drain all immediately available appends
        while let Ok(next) = rx.try_recv() {
            batch.push(next);
        }

        metrics::histogram!(crate::observability::WAL_FLUSH_BATCH_SIZE)
            .record(batch.len() as f64);
        let flush_start = std::time::Instant::now();

        // Buffer until the first append failure; events past it are never
        // written. The file then holds a prefix of the batch plus at most
        // one partial entry, which replay discards.
        let mut failed_from = batch.len();
        let mut append_err: Option<io::Error> = None;
        for (i, WalAppend { event, .. }) in batch.iter().enumerate() {
            if let Err(e) = wal.append_buffered(event) {
                failed_from = i;
                append_err = Some(e);
                break;
            }
        }
        let flush_err = wal.flush_sync().err();

        metrics::histogram!(crate::observability::WAL_FLUSH_DURATION_SECONDS)
            .record(flush_start.elapsed().as_secs_f64());

        for (i, WalAppend { response, .. }) in batch.into_iter().enumerate() {
            let result = if let Some(e) = &flush_err {
                // Nothing in this batch is known durable
                Err(io::Error::new(e.kind(), e.to_string()))
            } else if i < failed_from {
                // Appended before the failure point and fsynced
                Ok(())
            } else {
                match &append_err {
                    Some(e) => Err(io::Error::new(e.kind(), e.to_string())),
                    None => Ok(()),
                }
            };
            let _ = response.send(result);
        }

        if let Some(e) = append_err.as_ref().or(flush_err.as_ref()) {
            tracing::error!("WAL writer stopping after write failure: {e}");
            return;
        }
    }
}

/// The booking engine: every room's state behind its own lock, plus the WAL
/// writer and the best-effort audit channel.
///
/// The no-double-booking invariant is enforced here: a confirm holds the
/// room's write lock across the availability re-check, the WAL append, and
/// the in-memory insert, so concurrent confirms on one room serialize and
/// exactly one of any overlapping pair can commit.
pub struct Engine {
    pub(super) rooms: DashMap<RoomId, SharedRoomState>,
    pub(super) wal_tx: mpsc::Sender<WalAppend>,
    pub(super) audit: Arc<AuditLog>,
    /// Reverse lookup: reservation id → room id.
    pub(super) reservation_rooms: DashMap<ReservationId, RoomId>,
}

/// Apply an event directly to a RoomState (no locking — caller holds the lock).
fn apply_to_room(rs: &mut RoomState, event: &Event, index: &DashMap<ReservationId, RoomId>) {
    match event {
        Event::ReservationConfirmed {
            id,
            room_id,
            customer_id,
            range,
            guests,
            created_at,
        } => {
            rs.insert_reservation(Reservation {
                id: *id,
                customer_id: *customer_id,
                room_id: *room_id,
                range: *range,
                guests: *guests,
                status: ReservationStatus::Confirmed,
                created_at: *created_at,
            });
            index.insert(*id, *room_id);
        }
        Event::ReservationCancelled { id, .. } => {
            if let Some(reservation) = rs.find_reservation_mut(*id) {
                reservation.status = ReservationStatus::Cancelled;
            }
        }
        // RoomAdded is handled at the DashMap level, not here
        Event::RoomAdded { .. } => {}
    }
}

impl Engine {
    pub fn new(wal_path: PathBuf, audit: Arc<AuditLog>) -> io::Result<Self> {
        let events = Wal::replay(&wal_path)?;
        let wal = Wal::open(&wal_path)?;
        let (wal_tx, wal_rx) = mpsc::channel(4096);
        tokio::spawn(wal_writer_loop(wal, wal_rx));

        let engine = Self {
            rooms: DashMap::new(),
            wal_tx,
            audit,
            reservation_rooms: DashMap::new(),
        };

        // Replay events — we're the sole owner of these Arcs, so try_write
        // always succeeds instantly (no contention). Never use blocking_write
        // here because this may run inside an async context.
        for event in &events {
            match event {
                Event::RoomAdded { room, room_type } => {
                    let rs = RoomState::new(room.clone(), room_type.clone());
                    engine.rooms.insert(room.id, Arc::new(RwLock::new(rs)));
                }
                other => {
                    let room_id = match other {
                        Event::ReservationConfirmed { room_id, .. }
                        | Event::ReservationCancelled { room_id, .. } => *room_id,
                        Event::RoomAdded { .. } => unreachable!(),
                    };
                    if let Some(entry) = engine.rooms.get(&room_id) {
                        let rs_arc = entry.value().clone();
                        let mut guard = rs_arc.try_write().expect("replay: uncontended write");
                        apply_to_room(&mut guard, other, &engine.reservation_rooms);
                    }
                }
            }
        }

        Ok(engine)
    }

    /// Write event to WAL via the background group-commit writer.
    pub(super) async fn wal_append(&self, event: &Event) -> Result<(), EngineError> {
        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalAppend {
                event: event.clone(),
                response: tx,
            })
            .await
            .map_err(|_| EngineError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::WalError(e.to_string()))
    }

    pub fn get_room(&self, id: RoomId) -> Option<SharedRoomState> {
        self.rooms.get(&id).map(|e| e.value().clone())
    }

    pub fn room_for_reservation(&self, id: ReservationId) -> Option<RoomId> {
        self.reservation_rooms.get(&id).map(|e| *e.value())
    }

    /// WAL-append + apply in one call. The caller holds the room's write
    /// lock, so the durable write and the in-memory insert are one atomic
    /// step as seen by any other confirm on the same room.
    pub(super) async fn persist_and_apply(
        &self,
        rs: &mut RoomState,
        event: &Event,
    ) -> Result<(), EngineError> {
        self.wal_append(event).await?;
        apply_to_room(rs, event, &self.reservation_rooms);
        Ok(())
    }
}
