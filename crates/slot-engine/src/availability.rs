//! Unpack an owner's rules into bookable free time.
//!
//! Composes the expander and the masker across every rule an owner has: each
//! rule is expanded over the query window, every occurrence has the owner's
//! booked sessions subtracted, and the free intervals from all rules are merged
//! into one deterministic, start-ordered list.
//!
//! Failures are isolated per rule. One malformed rule shows up in
//! [`Availability::rejected`] while the rest of the calendar is still returned.

use crate::config::ExpansionLimits;
use crate::error::{Result, SlotError};
use crate::expander;
use crate::interval::TimeSpan;
use crate::mask;
use crate::model::{BookedOccurrence, FreeInterval, OwnerId, RecurrenceRule};

/// Free time across all of an owner's rules within a query window.
#[derive(Debug, Clone, PartialEq)]
pub struct Availability {
    /// Sorted by `start`, then `rule_id`, then `end`.
    pub free: Vec<FreeInterval>,
    /// One `SlotError::InvalidRuleDefinition` (or expansion error) per skipped rule.
    pub rejected: Vec<SlotError>,
    /// One `SlotError::MalformedBookedOccurrence` per skipped booking.
    pub warnings: Vec<SlotError>,
    /// The query window.
    pub window: TimeSpan,
}

/// Read-only access to the rules and bookings an owner has stored.
///
/// Implemented by the persistence layer; the engine never writes through it.
pub trait AvailabilitySource {
    fn find_rules_by_owner(&self, owner_id: OwnerId) -> Result<Vec<RecurrenceRule>>;

    /// Lessons, interviews and demo sessions of `owner_id` overlapping `window`.
    fn find_booked_occurrences(
        &self,
        owner_id: OwnerId,
        window: &TimeSpan,
    ) -> Result<Vec<BookedOccurrence>>;
}

/// An in-memory snapshot, handy for batch tools and tests.
#[derive(Debug, Clone, Default)]
pub struct SnapshotSource {
    pub rules: Vec<RecurrenceRule>,
    pub booked: Vec<BookedOccurrence>,
}

impl AvailabilitySource for SnapshotSource {
    fn find_rules_by_owner(&self, owner_id: OwnerId) -> Result<Vec<RecurrenceRule>> {
        Ok(self
            .rules
            .iter()
            .filter(|rule| rule.owner_id == owner_id)
            .cloned()
            .collect())
    }

    fn find_booked_occurrences(
        &self,
        owner_id: OwnerId,
        window: &TimeSpan,
    ) -> Result<Vec<BookedOccurrence>> {
        // Malformed entries are passed through so the masker can report them.
        Ok(self
            .booked
            .iter()
            .filter(|b| b.owner_id == owner_id)
            .filter(|b| b.live_span().map_or(true, |span| span.overlaps(window)))
            .cloned()
            .collect())
    }
}

/// Expand and mask `rules` against `booked` within `window`.
///
/// # Errors
/// Returns `SlotError::WindowTooLarge` if the window exceeds `limits`; this is
/// checked before any rule is touched. Per-rule problems never fail the call.
pub fn unpack_availability(
    rules: &[RecurrenceRule],
    booked: &[BookedOccurrence],
    window: &TimeSpan,
    limits: &ExpansionLimits,
) -> Result<Availability> {
    let expansion = expander::expand_all(rules, window, limits)?;
    let masked = mask::mask_all(&expansion.occurrences, booked);

    let mut free = masked.free;
    free.sort_by_key(|f| (f.start, f.rule_id, f.end));

    tracing::debug!(
        "Unpacked {} rules into {} free intervals ({} rejected, {} warnings)",
        rules.len(),
        free.len(),
        expansion.rejected.len(),
        masked.warnings.len()
    );

    Ok(Availability {
        free,
        rejected: expansion.rejected,
        warnings: masked.warnings,
        window: *window,
    })
}

/// Fetch an owner's rules and bookings from `source` and unpack them.
///
/// # Errors
/// Returns `SlotError::WindowTooLarge` before querying the source, and
/// propagates any error the source reports.
pub fn unpack_for_owner<S: AvailabilitySource + ?Sized>(
    source: &S,
    owner_id: OwnerId,
    window: &TimeSpan,
    limits: &ExpansionLimits,
) -> Result<Availability> {
    limits.check_window(window)?;
    let rules = source.find_rules_by_owner(owner_id)?;
    let booked = source.find_booked_occurrences(owner_id, window)?;
    unpack_availability(&rules, &booked, window, limits)
}
