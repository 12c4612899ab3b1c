use crate::model::*;

use super::availability::{is_available, open_ranges};
use super::{Engine, EngineError};

/// Reservation lookup filter. The lookup page resolves a raw query string to
/// one of these before calling in: a parseable ULID means an id lookup,
/// anything else falls back to the signed-in customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationQuery {
    ById(ReservationId),
    ByCustomer(CustomerId),
}

fn clamp_paging(page: usize, per_page: usize) -> (usize, usize) {
    (page.max(1), per_page.max(1))
}

fn total_pages(total: usize, per_page: usize) -> usize {
    total.div_ceil(per_page).max(1)
}

impl Engine {
    /// Pure read of the availability test. Reflects the state of confirmed
    /// reservations at the instant of the check — a confirm must re-check
    /// under the room's write lock, never rely on this answer.
    pub async fn is_room_available(
        &self,
        room_id: RoomId,
        range: &StayRange,
    ) -> Result<bool, EngineError> {
        let rs = self
            .get_room(room_id)
            .ok_or(EngineError::RoomNotFound(room_id))?;
        let guard = rs.read().await;
        Ok(is_available(&guard, range))
    }

    /// Free date ranges for a room within a window.
    pub async fn compute_open_ranges(
        &self,
        room_id: RoomId,
        window: &StayRange,
    ) -> Result<Vec<StayRange>, EngineError> {
        let rs = self
            .get_room(room_id)
            .ok_or(EngineError::RoomNotFound(room_id))?;
        let guard = rs.read().await;
        Ok(open_ranges(&guard, window))
    }

    pub async fn room_info(&self, room_id: RoomId) -> Option<RoomInfo> {
        let rs = self.get_room(room_id)?;
        let guard = rs.read().await;
        Some(RoomInfo::from_state(&guard))
    }

    /// Room listing ordered by room number, paginated. Page and per_page are
    /// clamped to at least 1; total_pages is at least 1 even when empty.
    pub async fn list_rooms(&self, page: usize, per_page: usize) -> (Vec<RoomInfo>, usize) {
        let (page, per_page) = clamp_paging(page, per_page);

        // Snapshot the Arcs first: awaiting a room lock while iterating the
        // map would hold its shard lock across the await.
        let states: Vec<_> = self.rooms.iter().map(|e| e.value().clone()).collect();
        let mut rooms = Vec::with_capacity(states.len());
        for rs in states {
            let guard = rs.read().await;
            rooms.push(RoomInfo::from_state(&guard));
        }
        rooms.sort_by(|a, b| a.room_number.cmp(&b.room_number));

        let pages = total_pages(rooms.len(), per_page);
        let offset = (page - 1) * per_page;
        let rows = rooms.into_iter().skip(offset).take(per_page).collect();
        (rows, pages)
    }

    pub async fn find_reservation(&self, id: ReservationId) -> Option<ReservationInfo> {
        let room_id = self.room_for_reservation(id)?;
        let rs = self.get_room(room_id)?;
        let guard = rs.read().await;
        guard
            .find_reservation(id)
            .map(|r| reservation_info(&guard, r))
    }

    /// Reservation lookup, newest first, paginated like the room listing.
    /// Returns `(rows, total, total_pages)`.
    pub async fn list_reservations(
        &self,
        query: ReservationQuery,
        page: usize,
        per_page: usize,
    ) -> (Vec<ReservationInfo>, usize, usize) {
        let (page, per_page) = clamp_paging(page, per_page);

        let mut rows: Vec<ReservationInfo> = Vec::new();
        match query {
            ReservationQuery::ById(id) => {
                if let Some(info) = self.find_reservation(id).await {
                    rows.push(info);
                }
            }
            ReservationQuery::ByCustomer(customer_id) => {
                let states: Vec<_> = self.rooms.iter().map(|e| e.value().clone()).collect();
                for rs in states {
                    let guard = rs.read().await;
                    for r in &guard.reservations {
                        if r.customer_id == customer_id {
                            rows.push(reservation_info(&guard, r));
                        }
                    }
                }
            }
        }
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = rows.len();
        let pages = total_pages(total, per_page);
        let offset = (page - 1) * per_page;
        let rows = rows.into_iter().skip(offset).take(per_page).collect();
        (rows, total, pages)
    }
}

fn reservation_info(rs: &RoomState, r: &Reservation) -> ReservationInfo {
    ReservationInfo {
        id: r.id,
        customer_id: r.customer_id,
        room_id: r.room_id,
        room_number: rs.room.room_number.clone(),
        type_name: rs.room_type.name.clone(),
        bed_configuration: rs.room_type.bed_configuration.clone(),
        range: r.range,
        guests: r.guests,
        status: r.status,
        created_at: r.created_at,
    }
}
