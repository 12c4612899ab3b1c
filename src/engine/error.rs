use crate::model::{ReservationId, RoomId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    RoomNotFound(RoomId),
    RoomExists(RoomId),
    ReservationNotFound(ReservationId),
    /// The proposed range overlaps this confirmed reservation.
    Conflict(ReservationId),
    AlreadyCancelled(ReservationId),
    InvalidStayRange,
    OccupancyExceeded { guests: u32, max: u32 },
    LimitExceeded(&'static str),
    WalError(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::RoomNotFound(id) => write!(f, "room not found: {id}"),
            EngineError::RoomExists(id) => write!(f, "room already exists: {id}"),
            EngineError::ReservationNotFound(id) => {
                write!(f, "reservation not found: {id}")
            }
            EngineError::Conflict(id) => {
                write!(f, "dates conflict with confirmed reservation: {id}")
            }
            EngineError::AlreadyCancelled(id) => {
                write!(f, "reservation already cancelled: {id}")
            }
            EngineError::InvalidStayRange => {
                write!(f, "check-out must be after check-in")
            }
            EngineError::OccupancyExceeded { guests, max } => {
                write!(f, "{guests} guests exceeds room occupancy of {max}")
            }
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            EngineError::WalError(e) => write!(f, "WAL error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}
