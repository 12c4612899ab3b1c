//! Stay validation and totals — pure functions, no I/O.
//!
//! Everything downstream of [`validate_stay`] works with typed values; raw
//! form strings stop here.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::limits::{MAX_ADVANCE_DAYS, MAX_STAY_NIGHTS};
use crate::model::{DATE_FMT, StayRange, parse_stay_date};
use crate::stage::StagedStay;

/// A validated stay proposal, ready to be staged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StayRequest {
    pub range: StayRange,
    pub guests: u32,
    pub nights: i64,
}

/// Malformed or out-of-range stay input. Always recoverable: the guest
/// corrects the form and resubmits; nothing is staged on failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    InvalidDates,
    DateInPast,
    TooFarAhead { days: i64 },
    CheckOutNotAfterCheckIn,
    StayTooLong { max: i64 },
    GuestsNotANumber,
    GuestsOutOfRange { max: u32 },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidDates => {
                write!(f, "please provide valid check-in and check-out dates")
            }
            ValidationError::DateInPast => {
                write!(f, "check-in and check-out cannot be in the past")
            }
            ValidationError::TooFarAhead { days } => {
                write!(f, "check-in cannot be more than {days} days ahead")
            }
            ValidationError::CheckOutNotAfterCheckIn => {
                write!(f, "check-out must be after check-in")
            }
            ValidationError::StayTooLong { max } => {
                write!(f, "stays are limited to {max} nights")
            }
            ValidationError::GuestsNotANumber => {
                write!(f, "guests must be a whole number")
            }
            ValidationError::GuestsOutOfRange { max } => {
                write!(f, "guests must be between 1 and {max}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Parse and validate raw stay inputs against a room's occupancy limit and
/// the current date. Deterministic: `today` is an argument, not a clock read.
pub fn validate_stay(
    check_in_raw: &str,
    check_out_raw: &str,
    guests_raw: &str,
    max_occupancy: u32,
    today: NaiveDate,
) -> Result<StayRequest, ValidationError> {
    let check_in = parse_stay_date(check_in_raw).ok_or(ValidationError::InvalidDates)?;
    let check_out = parse_stay_date(check_out_raw).ok_or(ValidationError::InvalidDates)?;

    if check_in < today || check_out < today {
        return Err(ValidationError::DateInPast);
    }
    if (check_in - today).num_days() > MAX_ADVANCE_DAYS
        || (check_out - today).num_days() > MAX_ADVANCE_DAYS
    {
        return Err(ValidationError::TooFarAhead {
            days: MAX_ADVANCE_DAYS,
        });
    }
    if check_in >= check_out {
        return Err(ValidationError::CheckOutNotAfterCheckIn);
    }
    let range = StayRange::new(check_in, check_out);
    // Everything accepted here must also pass the engine's own range checks
    // at confirm, or a staged stay would die at the last step.
    if range.nights() > MAX_STAY_NIGHTS {
        return Err(ValidationError::StayTooLong {
            max: MAX_STAY_NIGHTS,
        });
    }

    let guests: u32 = guests_raw
        .trim()
        .parse()
        .map_err(|_| ValidationError::GuestsNotANumber)?;
    if guests < 1 || guests > max_occupancy {
        return Err(ValidationError::GuestsOutOfRange { max: max_occupancy });
    }

    Ok(StayRequest {
        range,
        guests,
        nights: range.nights(),
    })
}

// ── Totals ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub nights: i64,
    pub subtotal: Decimal,
}

/// Staged data no longer parses — the stage must be cleared and the flow
/// restarted from room selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorruptStagedStay;

impl std::fmt::Display for CorruptStagedStay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "staged reservation data is corrupt")
    }
}

impl std::error::Error for CorruptStagedStay {}

/// Re-derive nights and subtotal from staged data and the rate snapshot.
/// Runs on every summary render; client-visible totals are never trusted or
/// stored. Idempotent: same staged stay, same answer.
pub fn compute_totals(staged: &StagedStay) -> Result<Totals, CorruptStagedStay> {
    let range = staged.range().ok_or(CorruptStagedStay)?;
    let nights = range.nights();
    debug_assert!(nights > 0);
    Ok(Totals {
        nights,
        subtotal: staged.nightly_rate * Decimal::from(nights),
    })
}

/// Today per the system clock, the reference point for "date in the past".
pub fn date_today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

/// Format a date in the fixed calendar wire format.
pub fn format_stay_date(date: NaiveDate) -> String {
    date.format(DATE_FMT).to_string()
}
