//! Recurrence expansion -- turns availability rules into concrete occurrences.
//!
//! Date generation is delegated to the `rrule` crate (RFC 5545). Every rule is
//! expanded in UTC; the caller normalizes timezones before anything reaches the
//! engine. Monthly rules use `BYMONTHDAY`, so a month without the requested day
//! (e.g. the 31st in April) produces no occurrence at all rather than being
//! clamped to the last day of the month.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rrule::RRuleSet;

use crate::config::ExpansionLimits;
use crate::error::{Result, SlotError};
use crate::interval::TimeSpan;
use crate::model::{RawOccurrence, RecurrenceRule};

const ICAL_DATETIME: &str = "%Y%m%dT%H%M%S";

/// Days handed to the recurrence backend per call, below its `u16` limit.
const CHUNK_DAYS: i64 = 30_000;

/// Expand a single rule into the occurrences that intersect `window`.
///
/// Occurrences partially outside the window are truncated to it, never dropped.
/// The result is sorted by `start`.
///
/// # Errors
/// Returns `SlotError::WindowTooLarge` if the window exceeds `limits`, checked
/// before anything else.
/// Returns `SlotError::InvalidRuleDefinition` if the rule is structurally invalid.
/// Returns `SlotError::Expansion` if the recurrence backend rejects the rule.
pub fn expand(
    rule: &RecurrenceRule,
    window: &TimeSpan,
    limits: &ExpansionLimits,
) -> Result<Vec<RawOccurrence>> {
    limits.check_window(window)?;
    rule.validate()?;
    expand_unbounded(rule, window)
}

/// Expansion without the window cap. Callers must have validated the rule.
pub(crate) fn expand_unbounded(
    rule: &RecurrenceRule,
    window: &TimeSpan,
) -> Result<Vec<RawOccurrence>> {
    if window.is_empty() {
        return Ok(Vec::new());
    }

    // An occurrence that started before the window can still run into it.
    let first_candidate = window
        .start
        .checked_sub_signed(rule.duration())
        .map_or(NaiveDate::MIN, |earliest| earliest.date_naive());
    let last_candidate = window.end.date_naive();

    let first_day = first_candidate.max(rule.valid_from);
    let last_day = last_candidate.min(rule.valid_until);
    if first_day > last_day {
        return Ok(Vec::new());
    }

    let mut occurrences: Vec<RawOccurrence> = occurrence_dates(rule, first_day, last_day)?
        .into_iter()
        .filter_map(|date| rule.occurrence_on(date)?.clip(window))
        .map(|span| RawOccurrence {
            rule_id: rule.id,
            start: span.start,
            end: span.end,
        })
        .collect();

    occurrences.sort_by_key(|o| (o.start, o.end));

    tracing::debug!(
        "Expanded rule {} into {} occurrences",
        rule.id,
        occurrences.len()
    );

    Ok(occurrences)
}

/// Occurrence dates of `rule` between `first_day` and `last_day` inclusive.
///
/// Long ranges are expanded in chunks so the backend's `u16` instance limit
/// never truncates the result.
fn occurrence_dates(
    rule: &RecurrenceRule,
    first_day: NaiveDate,
    last_day: NaiveDate,
) -> Result<Vec<NaiveDate>> {
    let mut dates = Vec::new();
    let mut chunk_start = first_day;

    loop {
        let chunk_end = chunk_start
            .checked_add_signed(Duration::days(CHUNK_DAYS - 1))
            .map_or(last_day, |end| end.min(last_day));
        dates.extend(chunk_dates(rule, chunk_start, chunk_end)?);

        match chunk_end.succ_opt() {
            Some(next) if chunk_end < last_day => chunk_start = next,
            _ => break,
        }
    }

    Ok(dates)
}

/// Occurrence dates within one chunk of at most [`CHUNK_DAYS`] days.
fn chunk_dates(
    rule: &RecurrenceRule,
    first_day: NaiveDate,
    last_day: NaiveDate,
) -> Result<Vec<NaiveDate>> {
    let dtstart = first_day.and_time(rule.time_of_day_start);
    let until = last_day.and_time(rule.time_of_day_start);

    // UNTIL must share DTSTART's timezone; for UTC that means a trailing "Z".
    let rrule_text = format!(
        "DTSTART;TZID=UTC:{}\nRRULE:{};UNTIL={}Z",
        dtstart.format(ICAL_DATETIME),
        rule.frequency.rrule_parts(),
        until.format(ICAL_DATETIME),
    );

    let rrule_set: RRuleSet = rrule_text
        .parse()
        .map_err(|e| SlotError::Expansion(format!("rule {}: {}", rule.id, e)))?;

    // At most one occurrence per day; one extra makes `limited` mean truncation.
    let max_count = u16::try_from((last_day - first_day).num_days() + 2)
        .map_err(|_| SlotError::Expansion(format!("rule {}: chunk too long", rule.id)))?;

    let instances = rrule_set.all(max_count);
    if instances.limited {
        return Err(SlotError::Expansion(format!(
            "rule {} hit the expansion limit of {} instances",
            rule.id, max_count
        )));
    }

    // DTSTART is not guaranteed to match the pattern, so re-check every date.
    let dates = instances
        .dates
        .into_iter()
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .filter(|date| *date >= first_day && *date <= last_day)
        .filter(|date| rule.frequency.matches(*date))
        .collect();

    Ok(dates)
}

/// Result of expanding many rules at once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expansion {
    /// All occurrences, ordered by `start` then `rule_id`.
    pub occurrences: Vec<RawOccurrence>,
    /// Rules that could not be expanded. Their siblings are unaffected.
    pub rejected: Vec<SlotError>,
}

/// Expand every rule over the same window.
///
/// The window cap is checked once for the whole batch. A rule that fails
/// validation is recorded in [`Expansion::rejected`] and skipped.
///
/// # Errors
/// Returns `SlotError::WindowTooLarge` if the window exceeds `limits`.
pub fn expand_all(
    rules: &[RecurrenceRule],
    window: &TimeSpan,
    limits: &ExpansionLimits,
) -> Result<Expansion> {
    limits.check_window(window)?;

    let mut expansion = Expansion::default();
    for rule in rules {
        match rule.validate().and_then(|()| expand_unbounded(rule, window)) {
            Ok(occurrences) => expansion.occurrences.extend(occurrences),
            Err(err) => {
                tracing::warn!("Skipping rule {}: {}", rule.id, err);
                expansion.rejected.push(err);
            }
        }
    }

    expansion
        .occurrences
        .sort_by_key(|o| (o.start, o.rule_id, o.end));

    Ok(expansion)
}

/// Convenience for callers holding a start instant and a day count.
///
/// # Errors
/// Returns `SlotError::InvalidInstant` if the window end is not representable.
pub fn window_of_days(start: DateTime<Utc>, days: i64) -> Result<TimeSpan> {
    Duration::try_days(days)
        .and_then(|length| start.checked_add_signed(length))
        .map(|end| TimeSpan::new(start, end))
        .ok_or_else(|| {
            SlotError::InvalidInstant(format!("{} plus {} days", start.to_rfc3339(), days))
        })
}
