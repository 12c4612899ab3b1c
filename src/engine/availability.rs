use crate::model::*;

use super::EngineError;

// ── Overlap check ────────────────────────────────────────────────

/// A room is free for `proposed` iff no Confirmed reservation satisfies
/// `existing.check_in < proposed.check_out && existing.check_out >
/// proposed.check_in`. Half-open semantics: touching stays never conflict.
pub fn is_available(rs: &RoomState, proposed: &StayRange) -> bool {
    check_available(rs, proposed).is_ok()
}

/// Same test, but surfaces the blocking reservation's id on conflict.
pub(crate) fn check_available(rs: &RoomState, proposed: &StayRange) -> Result<(), EngineError> {
    for reservation in rs.overlapping(proposed) {
        if reservation.blocks_availability() {
            return Err(EngineError::Conflict(reservation.id));
        }
    }
    Ok(())
}

// ── Open-range computation ───────────────────────────────────────

/// Date ranges within `window` with no confirmed reservation, for rendering
/// a booking calendar. Starts from the whole window and punches out every
/// confirmed stay that overlaps it.
pub fn open_ranges(rs: &RoomState, window: &StayRange) -> Vec<StayRange> {
    let mut booked: Vec<StayRange> = rs
        .overlapping(window)
        .filter(|r| r.blocks_availability())
        .map(|r| {
            StayRange::new(
                r.range.check_in.max(window.check_in),
                r.range.check_out.min(window.check_out),
            )
        })
        .collect();
    booked.sort_by_key(|r| r.check_in);
    let booked = merge_ranges(&booked);

    subtract_ranges(&[*window], &booked)
}

/// Merge sorted overlapping/adjacent ranges into disjoint ranges.
pub fn merge_ranges(sorted: &[StayRange]) -> Vec<StayRange> {
    let mut merged: Vec<StayRange> = Vec::new();
    for &range in sorted {
        if let Some(last) = merged.last_mut()
            && range.check_in <= last.check_out {
                last.check_out = last.check_out.max(range.check_out);
                continue;
            }
        merged.push(range);
    }
    merged
}

pub fn subtract_ranges(base: &[StayRange], to_remove: &[StayRange]) -> Vec<StayRange> {
    let mut result = Vec::new();
    let mut ri = 0;

    for &b in base {
        let mut current_start = b.check_in;
        let current_end = b.check_out;

        while ri < to_remove.len() && to_remove[ri].check_out <= current_start {
            ri += 1;
        }

        let mut j = ri;
        while j < to_remove.len() && to_remove[j].check_in < current_end {
            let r = &to_remove[j];
            if r.check_in > current_start {
                result.push(StayRange::new(current_start, r.check_in));
            }
            current_start = current_start.max(r.check_out);
            j += 1;
        }

        if current_start < current_end {
            result.push(StayRange::new(current_start, current_end));
        }
    }

    result
}
