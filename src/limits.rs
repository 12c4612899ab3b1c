//! Hard caps that keep a single misbehaving caller from exhausting memory
//! or producing nonsense rows. All are generous for a real lodge.

use crate::model::Ms;

/// Longest bookable stay in nights.
pub const MAX_STAY_NIGHTS: i64 = 90;

/// Furthest ahead a check-in may be staged, in days.
pub const MAX_ADVANCE_DAYS: i64 = 730;

/// Rooms per engine.
pub const MAX_ROOMS: usize = 10_000;

/// Room numbers, type names, bed configurations.
pub const MAX_NAME_LEN: usize = 120;

/// Room descriptions.
pub const MAX_DESCRIPTION_LEN: usize = 4_000;

/// Session identifiers accepted by the stage store.
pub const MAX_SESSION_ID_LEN: usize = 256;

/// Default idle lifetime of a staged stay before the sweeper clears it.
pub const DEFAULT_STAGE_TTL_MS: Ms = 30 * 60 * 1000;
