//! Day-boundary splitting and fixed-length slot division.

use chrono::{DateTime, Duration, NaiveTime, Utc};

use crate::interval::TimeSpan;
use crate::model::FreeInterval;

/// Midnight UTC following `instant`, or `None` at the end of representable time.
fn next_midnight(instant: DateTime<Utc>) -> Option<DateTime<Utc>> {
    instant
        .date_naive()
        .succ_opt()
        .map(|day| day.and_time(NaiveTime::MIN).and_utc())
}

/// Split `interval` so that no piece crosses a UTC calendar-day boundary.
///
/// Pieces are returned in order and concatenate back to `interval` exactly.
/// An empty interval yields no pieces.
pub fn split_by_day(interval: &TimeSpan) -> Vec<TimeSpan> {
    let mut pieces = Vec::new();
    let mut rest = *interval;

    while !rest.is_empty() {
        let Some(boundary) = next_midnight(rest.start) else {
            pieces.push(rest);
            break;
        };

        let (head, tail) = rest.split_at(boundary);
        pieces.extend(head);
        match tail {
            Some(tail) => rest = tail,
            None => break,
        }
    }

    pieces
}

/// [`split_by_day`] for a free interval, keeping its rule id on every piece.
pub fn split_across_days(interval: &FreeInterval) -> Vec<FreeInterval> {
    split_by_day(&interval.span())
        .into_iter()
        .map(|piece| FreeInterval::new(interval.rule_id, piece))
        .collect()
}

/// Divide a free interval into consecutive bookable slots of `slot_minutes`.
///
/// e.g. 08:00-10:00 split by 30 gives 08:00-08:30, 08:30-09:00, 09:00-09:30,
/// 09:30-10:00. A trailing remainder shorter than one slot is dropped.
pub fn sub_slots(interval: &FreeInterval, slot_minutes: i64) -> Vec<FreeInterval> {
    let step = match Duration::try_minutes(slot_minutes) {
        Some(step) if slot_minutes > 0 => step,
        _ => return Vec::new(),
    };
    let mut slots = Vec::new();
    let mut start = interval.start;

    while let Some(end) = start.checked_add_signed(step) {
        if end > interval.end {
            break;
        }
        slots.push(FreeInterval::new(interval.rule_id, TimeSpan::new(start, end)));
        start = end;
    }

    slots
}

/// [`sub_slots`] over a list of free intervals, preserving their order.
pub fn sub_slots_batch(intervals: &[FreeInterval], slot_minutes: i64) -> Vec<FreeInterval> {
    intervals
        .iter()
        .flat_map(|interval| sub_slots(interval, slot_minutes))
        .collect()
}
