//! The guest-facing booking flow: stage a stay for a session, show the
//! summary (with an auth detour), confirm or walk away.
//!
//! Staging is per-session scratch state in the [`StageStore`]; nothing
//! touches the [`Engine`] until confirm. Totals shown at the summary step
//! are recomputed from the staged snapshot on every call and again implied
//! at confirm time — figures a client once saw are never trusted.

use std::io;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;
use ulid::Ulid;

use crate::audit::AuditLog;
use crate::booking::{self, ValidationError};
use crate::config::Config;
use crate::engine::{Engine, EngineError};
use crate::model::{CustomerId, ReservationId, RoomId, now_ms};
use crate::observability;
use crate::stage::{StageStore, StagedStay};
use crate::sweeper::run_stage_sweeper;

/// Raw stay inputs as submitted, before any validation.
#[derive(Debug, Clone, Default)]
pub struct StayForm {
    pub check_in: String,
    pub check_out: String,
    pub guests: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    RoomNotFound(RoomId),
    BadSession,
    Validation(ValidationError),
}

impl std::fmt::Display for StageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageError::RoomNotFound(id) => write!(f, "room {id} not found"),
            StageError::BadSession => write!(f, "invalid session id"),
            StageError::Validation(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for StageError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryError {
    /// No staged stay for this session: send the guest back to room selection.
    NothingStaged,
    /// Staged data no longer parses. The stage has been cleared.
    CorruptStage,
    /// A stay is staged but the session has no signed-in customer. The stage
    /// is kept: after sign-in the summary picks up where it left off.
    AuthRequired,
}

impl std::fmt::Display for SummaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryError::NothingStaged => write!(f, "no reservation in progress"),
            SummaryError::CorruptStage => write!(f, "staged reservation data is corrupt"),
            SummaryError::AuthRequired => write!(f, "sign-in required to review the reservation"),
        }
    }
}

impl std::error::Error for SummaryError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmError {
    NothingStaged,
    /// Staged data no longer parses or no longer fits the room. Cleared.
    CorruptStage,
    /// The room was taken between staging and confirm. The stage is kept so
    /// the guest can pick new dates without re-entering everything.
    Unavailable,
    /// The durable write failed. The stage is kept; retrying is safe because
    /// nothing was recorded.
    Persistence(String),
}

impl std::fmt::Display for ConfirmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfirmError::NothingStaged => write!(f, "no reservation in progress"),
            ConfirmError::CorruptStage => write!(f, "staged reservation data is corrupt"),
            ConfirmError::Unavailable => {
                write!(f, "the room is no longer available for those dates")
            }
            ConfirmError::Persistence(e) => write!(f, "could not record the reservation: {e}"),
        }
    }
}

impl std::error::Error for ConfirmError {}

/// Everything the summary page renders: the staged snapshot plus totals
/// recomputed server-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaySummary {
    pub room_id: RoomId,
    pub room_number: String,
    pub type_name: String,
    pub description: String,
    pub image_ref: String,
    pub check_in: String,
    pub check_out: String,
    pub guests: u32,
    pub nights: i64,
    pub nightly_rate: Decimal,
    pub subtotal: Decimal,
}

/// The booking flow over an [`Engine`] and a [`StageStore`].
pub struct BookingService {
    engine: Arc<Engine>,
    stages: Arc<StageStore>,
}

impl BookingService {
    pub fn new(engine: Arc<Engine>, stages: Arc<StageStore>) -> Self {
        Self { engine, stages }
    }

    /// Build a service from config: open the audit log and WAL under
    /// `data_dir`, start the stage sweeper. Must run inside a tokio runtime.
    pub fn open(config: &Config) -> io::Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        let audit = Arc::new(AuditLog::open(config.audit_path()));
        let engine = Arc::new(Engine::new(config.wal_path(), audit)?);
        let stages = Arc::new(StageStore::new(config.stage_ttl_ms));
        tokio::spawn(run_stage_sweeper(stages.clone()));
        Ok(Self::new(engine, stages))
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Validate the form against the room and hold the stay for this session.
    /// Replaces any previously staged stay. Nothing is written durably.
    /// Returns the summary of what was staged.
    pub async fn stage(
        &self,
        session: &str,
        room_id: RoomId,
        form: &StayForm,
    ) -> Result<StaySummary, StageError> {
        let rs = self
            .engine
            .get_room(room_id)
            .ok_or(StageError::RoomNotFound(room_id))?;
        let guard = rs.read().await;

        let request = booking::validate_stay(
            &form.check_in,
            &form.check_out,
            &form.guests,
            guard.room_type.max_occupancy,
            booking::date_today(),
        )
        .map_err(StageError::Validation)?;

        // Snapshot rate and display fields; store dates re-serialized in the
        // canonical format, not the raw form text.
        let staged = StagedStay {
            room_id,
            room_number: guard.room.room_number.clone(),
            type_name: guard.room_type.name.clone(),
            nightly_rate: guard.room_type.nightly_rate,
            max_occupancy: guard.room_type.max_occupancy,
            check_in: booking::format_stay_date(request.range.check_in),
            check_out: booking::format_stay_date(request.range.check_out),
            guests: request.guests,
            nights: request.nights,
            description: guard.room.description.clone(),
            image_ref: guard.room.image_ref.clone(),
            staged_at: now_ms(),
        };
        drop(guard);

        let summary = StaySummary {
            room_id,
            room_number: staged.room_number.clone(),
            type_name: staged.type_name.clone(),
            description: staged.description.clone(),
            image_ref: staged.image_ref.clone(),
            check_in: staged.check_in.clone(),
            check_out: staged.check_out.clone(),
            guests: staged.guests,
            nights: staged.nights,
            nightly_rate: staged.nightly_rate,
            subtotal: staged.nightly_rate * Decimal::from(staged.nights),
        };

        if !self.stages.stage(session, staged) {
            return Err(StageError::BadSession);
        }
        metrics::counter!(observability::STAYS_STAGED_TOTAL).increment(1);
        info!("staged stay for room {room_id}, {} nights", request.nights);
        Ok(summary)
    }

    /// The summary step. `identity` is the signed-in customer, if any: with
    /// no identity the staged stay survives and the caller gets
    /// [`SummaryError::AuthRequired`] — the sign-in detour must not lose the
    /// stay.
    pub async fn summary(
        &self,
        session: &str,
        identity: Option<CustomerId>,
    ) -> Result<StaySummary, SummaryError> {
        let staged = self
            .stages
            .peek(session)
            .ok_or(SummaryError::NothingStaged)?;
        if identity.is_none() {
            return Err(SummaryError::AuthRequired);
        }

        let totals = booking::compute_totals(&staged).map_err(|_| {
            self.stages.clear(session);
            SummaryError::CorruptStage
        })?;

        Ok(StaySummary {
            room_id: staged.room_id,
            room_number: staged.room_number,
            type_name: staged.type_name,
            description: staged.description,
            image_ref: staged.image_ref,
            check_in: staged.check_in,
            check_out: staged.check_out,
            guests: staged.guests,
            nights: totals.nights,
            nightly_rate: staged.nightly_rate,
            subtotal: totals.subtotal,
        })
    }

    /// The commit step. Re-derives the stay from the staged snapshot and
    /// hands it to the engine, which re-checks availability under the room's
    /// write lock. On success the stage is cleared; on a conflict it is kept.
    pub async fn confirm(
        &self,
        session: &str,
        customer_id: CustomerId,
    ) -> Result<ReservationId, ConfirmError> {
        let staged = self
            .stages
            .peek(session)
            .ok_or(ConfirmError::NothingStaged)?;
        let Some(range) = staged.range() else {
            self.stages.clear(session);
            return Err(ConfirmError::CorruptStage);
        };

        let result = self
            .engine
            .confirm_reservation(Ulid::new(), staged.room_id, customer_id, range, staged.guests)
            .await;

        match result {
            Ok(id) => {
                self.stages.clear(session);
                Ok(id)
            }
            Err(EngineError::Conflict(_)) | Err(EngineError::RoomNotFound(_)) => {
                Err(ConfirmError::Unavailable)
            }
            Err(
                EngineError::OccupancyExceeded { .. }
                | EngineError::InvalidStayRange
                | EngineError::LimitExceeded(_),
            ) => {
                // The staged stay can't have passed validation for this room
                self.stages.clear(session);
                Err(ConfirmError::CorruptStage)
            }
            Err(EngineError::WalError(e)) => Err(ConfirmError::Persistence(e)),
            Err(other) => Err(ConfirmError::Persistence(other.to_string())),
        }
    }

    /// Walk away: drop the session's staged stay. Returns whether one existed.
    pub fn cancel(&self, session: &str) -> bool {
        self.stages.clear(session)
    }
}
