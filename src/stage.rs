use dashmap::DashMap;
use rust_decimal::Decimal;

use crate::limits::MAX_SESSION_ID_LEN;
use crate::model::{Ms, RoomId, StayRange, now_ms, parse_stay_date};

/// A tentative stay held per session between room selection and final
/// confirmation. Rate, occupancy, and display fields are snapshots taken at
/// staging time — later repricing of the room type must not change an
/// in-flight stay.
///
/// Dates are kept as the raw calendar strings that validation accepted;
/// every consumer re-parses them, which is how corrupted or foreign session
/// state gets detected. Money totals are never stored here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedStay {
    pub room_id: RoomId,
    pub room_number: String,
    pub type_name: String,
    pub nightly_rate: Decimal,
    pub max_occupancy: u32,
    pub check_in: String,
    pub check_out: String,
    pub guests: u32,
    pub nights: i64,
    pub description: String,
    pub image_ref: String,
    pub staged_at: Ms,
}

impl StagedStay {
    /// Re-parse the staged dates. `None` means the stage is corrupt and the
    /// flow must restart.
    pub fn range(&self) -> Option<StayRange> {
        let check_in = parse_stay_date(&self.check_in)?;
        let check_out = parse_stay_date(&self.check_out)?;
        if check_in >= check_out {
            return None;
        }
        Some(StayRange::new(check_in, check_out))
    }
}

/// Session-scoped holding area: at most one staged stay per session, no
/// cross-session sharing. The store owns the lifecycle rules — overwrite on
/// restage, removal on cancel/confirm/corruption, expiry after `ttl_ms`
/// idle — so callers never have to remember to clean up.
pub struct StageStore {
    stages: DashMap<String, StagedStay>,
    ttl_ms: Ms,
}

impl StageStore {
    pub fn new(ttl_ms: Ms) -> Self {
        Self {
            stages: DashMap::new(),
            ttl_ms,
        }
    }

    /// Stage a stay for a session, overwriting any previous one. Oversized
    /// session ids are rejected rather than stored.
    pub fn stage(&self, session: &str, staged: StagedStay) -> bool {
        if session.is_empty() || session.len() > MAX_SESSION_ID_LEN {
            return false;
        }
        self.stages.insert(session.to_string(), staged);
        true
    }

    /// The session's staged stay, if one exists and hasn't expired. An
    /// expired stage is removed on sight.
    pub fn peek(&self, session: &str) -> Option<StagedStay> {
        let staged = self.stages.get(session).map(|e| e.value().clone())?;
        if self.expired(&staged, now_ms()) {
            self.stages.remove(session);
            return None;
        }
        Some(staged)
    }

    /// Remove the session's staged stay. Returns whether one existed.
    pub fn clear(&self, session: &str) -> bool {
        self.stages.remove(session).is_some()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    fn expired(&self, staged: &StagedStay, now: Ms) -> bool {
        now.saturating_sub(staged.staged_at) >= self.ttl_ms
    }

    /// Sessions whose stage has passed its idle lifetime, for the sweeper.
    pub fn collect_expired(&self, now: Ms) -> Vec<String> {
        self.stages
            .iter()
            .filter(|e| self.expired(e.value(), now))
            .map(|e| e.key().clone())
            .collect()
    }
}
