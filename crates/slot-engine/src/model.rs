//! Value types shared by every stage of the engine.
//!
//! Rules and booked occurrences come from the persistence layer as immutable
//! snapshots; raw occurrences and free intervals are computed per call.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlotError};
use crate::interval::TimeSpan;

pub type RuleId = u64;
pub type BookingId = u64;
pub type OwnerId = u64;

/// Longest occurrence a rule may produce. Anything longer would overlap the
/// next day's occurrence of a daily rule.
pub const MAX_RULE_DURATION_MINUTES: i64 = 24 * 60;

/// Recurrence pattern of a rule.
///
/// Weekdays are numbered `0..=6` starting from Sunday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly { weekdays: BTreeSet<u8> },
    Monthly { day_of_month: u32 },
}

impl Frequency {
    /// Whether `date` is an occurrence day for this pattern.
    pub fn matches(&self, date: NaiveDate) -> bool {
        match self {
            Frequency::Daily => true,
            Frequency::Weekly { weekdays } => {
                weekdays.contains(&(date.weekday().num_days_from_sunday() as u8))
            }
            Frequency::Monthly { day_of_month } => date.day() == *day_of_month,
        }
    }

    /// RFC 5545 `FREQ`/`BY*` parts for this pattern (no DTSTART/UNTIL).
    pub(crate) fn rrule_parts(&self) -> String {
        match self {
            Frequency::Daily => "FREQ=DAILY".to_string(),
            Frequency::Weekly { weekdays } => {
                let days: Vec<&str> = weekdays.iter().map(|d| weekday_code(*d)).collect();
                format!("FREQ=WEEKLY;BYDAY={}", days.join(","))
            }
            Frequency::Monthly { day_of_month } => {
                format!("FREQ=MONTHLY;BYMONTHDAY={}", day_of_month)
            }
        }
    }
}

fn weekday_code(day: u8) -> &'static str {
    match day {
        0 => "SU",
        1 => "MO",
        2 => "TU",
        3 => "WE",
        4 => "TH",
        5 => "FR",
        _ => "SA",
    }
}

/// A tutor's or interviewer's recurring availability definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub id: RuleId,
    pub owner_id: OwnerId,
    #[serde(default)]
    pub title: String,
    pub frequency: Frequency,
    /// First calendar date (inclusive) an occurrence may start on.
    pub valid_from: NaiveDate,
    /// Last calendar date (inclusive) an occurrence may start on.
    pub valid_until: NaiveDate,
    #[serde(with = "hhmm")]
    pub time_of_day_start: NaiveTime,
    pub duration_minutes: i64,
}

impl RecurrenceRule {
    /// Check the structural invariants of the rule.
    ///
    /// # Errors
    /// Returns `SlotError::InvalidRuleDefinition` naming the first violation.
    pub fn validate(&self) -> Result<()> {
        match &self.frequency {
            Frequency::Daily => {}
            Frequency::Weekly { weekdays } => {
                if weekdays.is_empty() {
                    return Err(SlotError::invalid_rule(self.id, "weekly rule has no weekdays"));
                }
                if let Some(bad) = weekdays.iter().find(|d| **d > 6) {
                    return Err(SlotError::invalid_rule(
                        self.id,
                        format!("weekday {} is outside 0..=6", bad),
                    ));
                }
            }
            Frequency::Monthly { day_of_month } => {
                if !(1..=31).contains(day_of_month) {
                    return Err(SlotError::invalid_rule(
                        self.id,
                        format!("day of month {} is outside 1..=31", day_of_month),
                    ));
                }
            }
        }

        if self.valid_from > self.valid_until {
            return Err(SlotError::invalid_rule(
                self.id,
                format!(
                    "valid_from {} is after valid_until {}",
                    self.valid_from, self.valid_until
                ),
            ));
        }

        if self.duration_minutes <= 0 {
            return Err(SlotError::invalid_rule(
                self.id,
                format!("duration {} minutes is not positive", self.duration_minutes),
            ));
        }
        if self.duration_minutes > MAX_RULE_DURATION_MINUTES {
            return Err(SlotError::invalid_rule(
                self.id,
                format!(
                    "duration {} minutes exceeds {} minutes",
                    self.duration_minutes, MAX_RULE_DURATION_MINUTES
                ),
            ));
        }

        Ok(())
    }

    /// Occurrence length, saturating for durations chrono cannot represent.
    pub fn duration(&self) -> Duration {
        Duration::try_minutes(self.duration_minutes).unwrap_or(Duration::MAX)
    }

    /// The unclipped occurrence this rule would produce on `date`, or `None`
    /// if it would end past the last representable instant.
    pub fn occurrence_on(&self, date: NaiveDate) -> Option<TimeSpan> {
        let start = date.and_time(self.time_of_day_start).and_utc();
        TimeSpan::from_minutes(start, self.duration_minutes)
    }
}

/// What kind of session consumes the availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingKind {
    Lesson,
    Interview,
    DemoSession,
}

/// A lesson, interview or demo session already scheduled against an owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookedOccurrence {
    pub id: BookingId,
    pub kind: BookingKind,
    pub owner_id: OwnerId,
    pub start: DateTime<Utc>,
    /// Signed so corrupt upstream durations survive deserialization and can be
    /// reported instead of rejected wholesale.
    pub duration_minutes: i64,
    #[serde(default)]
    pub canceled: bool,
}

impl BookedOccurrence {
    /// The booked time, or `None` when the duration runs past the representable
    /// range.
    pub fn span(&self) -> Option<TimeSpan> {
        TimeSpan::from_minutes(self.start, self.duration_minutes)
    }

    /// The booked time if it is a usable, non-empty interval.
    pub fn live_span(&self) -> Option<TimeSpan> {
        self.span().filter(|span| !span.is_empty())
    }
}

/// One concrete instance of a rule, clipped to the query window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawOccurrence {
    pub rule_id: RuleId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl RawOccurrence {
    pub fn span(&self) -> TimeSpan {
        TimeSpan::new(self.start, self.end)
    }
}

/// Unbooked remainder of a raw occurrence. Always `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FreeInterval {
    pub rule_id: RuleId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl FreeInterval {
    pub fn new(rule_id: RuleId, span: TimeSpan) -> Self {
        Self {
            rule_id,
            start: span.start,
            end: span.end,
        }
    }

    pub fn span(&self) -> TimeSpan {
        TimeSpan::new(self.start, self.end)
    }

    pub fn duration_minutes(&self) -> i64 {
        self.span().duration_minutes()
    }
}

/// A proposed lesson or interview to check against free time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub proposed_start: DateTime<Utc>,
    pub duration_minutes: i64,
}

impl BookingRequest {
    pub fn new(proposed_start: DateTime<Utc>, duration_minutes: i64) -> Self {
        Self {
            proposed_start,
            duration_minutes,
        }
    }

    /// The requested time, or `None` when the duration runs past the
    /// representable range.
    pub fn span(&self) -> Option<TimeSpan> {
        TimeSpan::from_minutes(self.proposed_start, self.duration_minutes)
    }
}

/// `HH:mm` time-of-day (de)serialization.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}
