//! Detect overlapping sessions and overlapping availability rules.
//!
//! Adjacent intervals (where one ends exactly when another starts) are NOT
//! conflicts anywhere in this module.

use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::expander::expand_unbounded;
use crate::interval::TimeSpan;
use crate::model::{BookedOccurrence, BookingId, RawOccurrence, RecurrenceRule};

/// A detected conflict between two intervals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub a: TimeSpan,
    pub b: TimeSpan,
    pub overlap_minutes: i64,
}

/// Two booked sessions that claim the same time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingConflict {
    pub a: BookingId,
    pub b: BookingId,
    pub overlap_minutes: i64,
}

fn overlap_minutes(a: &TimeSpan, b: &TimeSpan) -> Option<i64> {
    a.clip(b).map(|overlap| overlap.duration_minutes())
}

/// Find all pairwise conflicts (overlapping time ranges) between two lists.
///
/// The overlap duration is `min(a.end, b.end) - max(a.start, b.start)`.
pub fn find_conflicts(a: &[TimeSpan], b: &[TimeSpan]) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    for x in a {
        for y in b {
            if let Some(overlap_minutes) = overlap_minutes(x, y) {
                conflicts.push(Conflict {
                    a: *x,
                    b: *y,
                    overlap_minutes,
                });
            }
        }
    }

    conflicts
}

/// True if `target` overlaps at least one of `others`. Boundaries are excluded.
pub fn intersects_any(target: &TimeSpan, others: &[TimeSpan]) -> bool {
    others.iter().any(|other| target.overlaps(other))
}

/// Pairwise conflicts between two booking lists, e.g. an interviewer's
/// interviews against the same person's lessons and demo sessions.
///
/// Canceled and malformed bookings never conflict.
pub fn find_booking_conflicts(
    a: &[BookedOccurrence],
    b: &[BookedOccurrence],
) -> Vec<BookingConflict> {
    let live = |list: &[BookedOccurrence]| -> Vec<(BookingId, TimeSpan)> {
        list.iter()
            .filter(|booking| !booking.canceled)
            .filter_map(|booking| booking.live_span().map(|span| (booking.id, span)))
            .collect()
    };

    let (a, b) = (live(a), live(b));
    let mut conflicts = Vec::new();

    for (id_a, span_a) in &a {
        for (id_b, span_b) in &b {
            if let Some(overlap_minutes) = overlap_minutes(span_a, span_b) {
                conflicts.push(BookingConflict {
                    a: *id_a,
                    b: *id_b,
                    overlap_minutes,
                });
            }
        }
    }

    conflicts
}

/// Whether two rules would ever produce overlapping occurrences.
///
/// Both rules are expanded across the union of their validity ranges, so the
/// result is independent of any query window.
///
/// # Errors
/// Returns `SlotError::InvalidRuleDefinition` if either rule is invalid.
pub fn rules_intersect(a: &RecurrenceRule, b: &RecurrenceRule) -> Result<bool> {
    a.validate()?;
    b.validate()?;

    // Validity ranges that never meet, even counting an overnight tail.
    let tail_days = a.duration_minutes.max(b.duration_minutes) / (24 * 60) + 1;
    let reach = Duration::days(tail_days);
    let reaches = |until: NaiveDate, from: NaiveDate| {
        until.checked_add_signed(reach).map_or(true, |end| end >= from)
    };
    if !reaches(a.valid_until, b.valid_from) || !reaches(b.valid_until, a.valid_from) {
        return Ok(false);
    }

    let from = a.valid_from.min(b.valid_from);
    let until = a
        .valid_until
        .max(b.valid_until)
        .checked_add_signed(reach + Duration::days(1))
        .unwrap_or(NaiveDate::MAX);
    let window = TimeSpan::new(
        from.and_time(NaiveTime::MIN).and_utc(),
        until.and_time(NaiveTime::MIN).and_utc(),
    );

    let first = expand_unbounded(a, &window)?;
    let second = expand_unbounded(b, &window)?;

    Ok(sorted_lists_overlap(&first, &second))
}

/// Two-pointer sweep over occurrence lists that are each sorted by start and
/// whose members share one duration, so start order is also end order.
fn sorted_lists_overlap(a: &[RawOccurrence], b: &[RawOccurrence]) -> bool {
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i].span().overlaps(&b[j].span()) {
            return true;
        }
        if a[i].end <= b[j].end {
            i += 1;
        } else {
            j += 1;
        }
    }
    false
}
