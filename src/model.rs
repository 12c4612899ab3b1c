use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Calendar-date wire format for stay boundaries. No time-of-day component.
pub const DATE_FMT: &str = "%Y-%m-%d";

/// Unix milliseconds — the only instant type.
pub type Ms = i64;

/// Stable numeric room identifier.
pub type RoomId = u32;

/// Opaque customer identity supplied by the auth collaborator.
pub type CustomerId = i64;

pub type ReservationId = Ulid;

pub fn now_ms() -> Ms {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as Ms
}

/// Parse a raw form value as a stay date. Leading/trailing whitespace is
/// tolerated; anything else that doesn't match `DATE_FMT` is rejected.
pub fn parse_stay_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FMT).ok()
}

/// Half-open stay interval `[check_in, check_out)`. A stay ending on day D
/// and another beginning on day D do not overlap (back-to-back turnover).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayRange {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl StayRange {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Self {
        debug_assert!(check_in < check_out, "check_in must precede check_out");
        Self { check_in, check_out }
    }

    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    pub fn overlaps(&self, other: &StayRange) -> bool {
        self.check_in < other.check_out && other.check_in < self.check_out
    }
}

impl std::fmt::Display for StayRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to {}",
            self.check_in.format(DATE_FMT),
            self.check_out.format(DATE_FMT)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationStatus {
    Confirmed,
    Cancelled,
}

/// Rate card shared by every room of the same type. Immutable once a
/// reservation has priced against it — repricing happens by staging
/// snapshots, never by rewriting history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomType {
    pub name: String,
    pub nightly_rate: Decimal,
    pub max_occupancy: u32,
    pub bed_configuration: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub room_number: String,
    pub accessible: bool,
    pub description: String,
    pub image_ref: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub customer_id: CustomerId,
    pub room_id: RoomId,
    pub range: StayRange,
    pub guests: u32,
    pub status: ReservationStatus,
    pub created_at: Ms,
}

impl Reservation {
    /// Only Confirmed reservations block availability.
    pub fn blocks_availability(&self) -> bool {
        self.status == ReservationStatus::Confirmed
    }
}

/// Per-room state: the room, its rate card, and every reservation ever made
/// against it, sorted by `range.check_in`.
#[derive(Debug, Clone)]
pub struct RoomState {
    pub room: Room,
    pub room_type: RoomType,
    pub reservations: Vec<Reservation>,
}

impl RoomState {
    pub fn new(room: Room, room_type: RoomType) -> Self {
        Self {
            room,
            room_type,
            reservations: Vec::new(),
        }
    }

    /// Insert a reservation maintaining sort order by check-in.
    pub fn insert_reservation(&mut self, reservation: Reservation) {
        let pos = self
            .reservations
            .binary_search_by_key(&reservation.range.check_in, |r| r.range.check_in)
            .unwrap_or_else(|e| e);
        self.reservations.insert(pos, reservation);
    }

    pub fn find_reservation(&self, id: ReservationId) -> Option<&Reservation> {
        self.reservations.iter().find(|r| r.id == id)
    }

    pub fn find_reservation_mut(&mut self, id: ReservationId) -> Option<&mut Reservation> {
        self.reservations.iter_mut().find(|r| r.id == id)
    }

    /// Reservations whose range overlaps the query window, regardless of
    /// status. Uses binary search to skip reservations checking in at or
    /// after `query.check_out`.
    pub fn overlapping(&self, query: &StayRange) -> impl Iterator<Item = &Reservation> {
        // Everything at index >= right_bound checks in at or after the
        // proposed check-out → can't overlap.
        let right_bound = self
            .reservations
            .partition_point(|r| r.range.check_in < query.check_out);
        self.reservations[..right_bound]
            .iter()
            .filter(move |r| r.range.check_out > query.check_in)
    }
}

/// The event types — flat, no nesting. This is the WAL record format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    RoomAdded {
        room: Room,
        room_type: RoomType,
    },
    ReservationConfirmed {
        id: ReservationId,
        room_id: RoomId,
        customer_id: CustomerId,
        range: StayRange,
        guests: u32,
        created_at: Ms,
    },
    ReservationCancelled {
        id: ReservationId,
        room_id: RoomId,
    },
}

// ── Query result types ───────────────────────────────────────────

/// One row of the room listing: the room joined with its rate card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub id: RoomId,
    pub room_number: String,
    pub accessible: bool,
    pub description: String,
    pub image_ref: String,
    pub type_name: String,
    pub nightly_rate: Decimal,
    pub max_occupancy: u32,
    pub bed_configuration: String,
}

impl RoomInfo {
    pub fn from_state(rs: &RoomState) -> Self {
        Self {
            id: rs.room.id,
            room_number: rs.room.room_number.clone(),
            accessible: rs.room.accessible,
            description: rs.room.description.clone(),
            image_ref: rs.room.image_ref.clone(),
            type_name: rs.room_type.name.clone(),
            nightly_rate: rs.room_type.nightly_rate,
            max_occupancy: rs.room_type.max_occupancy,
            bed_configuration: rs.room_type.bed_configuration.clone(),
        }
    }
}

/// One row of the reservation lookup: the reservation joined with its room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationInfo {
    pub id: ReservationId,
    pub customer_id: CustomerId,
    pub room_id: RoomId,
    pub room_number: String,
    pub type_name: String,
    pub bed_configuration: String,
    pub range: StayRange,
    pub guests: u32,
    pub status: ReservationStatus,
    pub created_at: Ms,
}
