use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::limits::*;
use crate::model::*;
use crate::observability;

use super::availability::check_available;
use super::{Engine, EngineError};

fn validate_range(range: &StayRange) -> Result<(), EngineError> {
    if range.check_in >= range.check_out {
        return Err(EngineError::InvalidStayRange);
    }
    if range.nights() > MAX_STAY_NIGHTS {
        return Err(EngineError::LimitExceeded("stay too long"));
    }
    Ok(())
}

impl Engine {
    pub async fn add_room(&self, room: Room, room_type: RoomType) -> Result<(), EngineError> {
        if self.rooms.len() >= MAX_ROOMS {
            return Err(EngineError::LimitExceeded("too many rooms"));
        }
        if room.room_number.len() > MAX_NAME_LEN
            || room_type.name.len() > MAX_NAME_LEN
            || room_type.bed_configuration.len() > MAX_NAME_LEN
        {
            return Err(EngineError::LimitExceeded("name too long"));
        }
        if room.description.len() > MAX_DESCRIPTION_LEN {
            return Err(EngineError::LimitExceeded("description too long"));
        }
        if room_type.max_occupancy == 0 {
            return Err(EngineError::LimitExceeded("max occupancy must be at least 1"));
        }
        if self.rooms.contains_key(&room.id) {
            return Err(EngineError::RoomExists(room.id));
        }

        let event = Event::RoomAdded {
            room: room.clone(),
            room_type: room_type.clone(),
        };
        self.wal_append(&event).await?;
        let rs = RoomState::new(room.clone(), room_type);
        self.rooms.insert(room.id, Arc::new(RwLock::new(rs)));
        info!("added room {} ({})", room.id, room.room_number);
        Ok(())
    }

    /// The commit step. Holds the room's write lock across the availability
    /// re-check, the WAL append, and the insert — the check-then-insert race
    /// cannot happen because no other confirm can enter for this room until
    /// the lock is released.
    ///
    /// The audit write happens after the commit succeeds and its failure is
    /// invisible to the caller.
    pub async fn confirm_reservation(
        &self,
        id: ReservationId,
        room_id: RoomId,
        customer_id: CustomerId,
        range: StayRange,
        guests: u32,
    ) -> Result<ReservationId, EngineError> {
        validate_range(&range)?;
        let rs = self
            .get_room(room_id)
            .ok_or(EngineError::RoomNotFound(room_id))?;
        let mut guard = rs.write().await;

        if guests == 0 || guests > guard.room_type.max_occupancy {
            return Err(EngineError::OccupancyExceeded {
                guests,
                max: guard.room_type.max_occupancy,
            });
        }

        check_available(&guard, &range).inspect_err(|_| {
            metrics::counter!(observability::CONFIRM_CONFLICTS_TOTAL).increment(1);
        })?;

        let event = Event::ReservationConfirmed {
            id,
            room_id,
            customer_id,
            range,
            guests,
            created_at: now_ms(),
        };
        self.persist_and_apply(&mut guard, &event).await?;

        metrics::counter!(observability::RESERVATIONS_CONFIRMED_TOTAL).increment(1);
        info!("confirmed reservation {id} for room {room_id}, {range}");

        self.audit
            .record(customer_id, &guard.room.room_number, &range);

        Ok(id)
    }

    pub async fn cancel_reservation(&self, id: ReservationId) -> Result<RoomId, EngineError> {
        let room_id = self
            .room_for_reservation(id)
            .ok_or(EngineError::ReservationNotFound(id))?;
        let rs = self
            .get_room(room_id)
            .ok_or(EngineError::RoomNotFound(room_id))?;
        let mut guard = rs.write().await;

        match guard.find_reservation(id) {
            None => return Err(EngineError::ReservationNotFound(id)),
            Some(r) if r.status == ReservationStatus::Cancelled => {
                return Err(EngineError::AlreadyCancelled(id));
            }
            Some(_) => {}
        }

        let event = Event::ReservationCancelled { id, room_id };
        self.persist_and_apply(&mut guard, &event).await?;

        metrics::counter!(observability::RESERVATIONS_CANCELLED_TOTAL).increment(1);
        info!("cancelled reservation {id} for room {room_id}");
        Ok(room_id)
    }
}
