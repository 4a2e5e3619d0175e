//! Subtract booked sessions from raw occurrences.
//!
//! Non-canceled bookings are sorted by start, clipped to the occurrence, and
//! walked with a cursor; the gaps the cursor skips over are the free intervals.
//! Overlapping or touching bookings are absorbed by advancing the cursor to the
//! furthest end seen so far.

use std::collections::BTreeSet;

use crate::error::SlotError;
use crate::interval::TimeSpan;
use crate::model::{BookedOccurrence, FreeInterval, RawOccurrence};

/// Free time left in one occurrence, plus any bookings that had to be skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Masked {
    /// Sorted, non-overlapping, never empty.
    pub free: Vec<FreeInterval>,
    /// `SlotError::MalformedBookedOccurrence` for every skipped booking.
    pub warnings: Vec<SlotError>,
}

/// Live bookings as holes, plus one warning per malformed booking id.
///
/// A booking is malformed when `end <= start` or when its end cannot be
/// represented at all.
fn partition_bookings(booked: &[BookedOccurrence]) -> (Vec<TimeSpan>, Vec<SlotError>) {
    let mut holes = Vec::new();
    let mut warnings = Vec::new();
    let mut reported = BTreeSet::new();

    for b in booked.iter().filter(|b| !b.canceled) {
        match b.live_span() {
            Some(span) => holes.push(span),
            None => {
                if !reported.insert(b.id) {
                    continue;
                }
                tracing::warn!(
                    "Skipping malformed booked occurrence {}: {} minutes from {}",
                    b.id,
                    b.duration_minutes,
                    b.start
                );
                warnings.push(SlotError::MalformedBookedOccurrence {
                    id: b.id,
                    start: b.start,
                    duration_minutes: b.duration_minutes,
                });
            }
        }
    }

    holes.sort_by_key(|h| (h.start, h.end));
    (holes, warnings)
}

fn free_in(occurrence: &RawOccurrence, holes: &[TimeSpan]) -> Vec<FreeInterval> {
    let span = occurrence.span();
    // Holes are sorted by start, so only those before the occurrence end matter.
    let upto = holes.partition_point(|h| h.start < span.end);
    span.subtract(&holes[..upto])
        .into_iter()
        .map(|s| FreeInterval::new(occurrence.rule_id, s))
        .collect()
}

/// Subtract the non-canceled entries of `booked` from `occurrence`.
///
/// Malformed bookings are skipped and reported in [`Masked::warnings`]; they
/// never fail the pass.
pub fn mask(occurrence: &RawOccurrence, booked: &[BookedOccurrence]) -> Masked {
    let (holes, warnings) = partition_bookings(booked);
    Masked {
        free: free_in(occurrence, &holes),
        warnings,
    }
}

/// Mask every occurrence against the same booking snapshot.
///
/// Output keeps the order of `occurrences`. Bookings are checked once per
/// call, so a corrupt entry is reported once no matter how many occurrences
/// it would have touched.
pub fn mask_all(occurrences: &[RawOccurrence], booked: &[BookedOccurrence]) -> Masked {
    let (holes, warnings) = partition_bookings(booked);
    let free = occurrences
        .iter()
        .flat_map(|occurrence| free_in(occurrence, &holes))
        .collect();
    Masked { free, warnings }
}
