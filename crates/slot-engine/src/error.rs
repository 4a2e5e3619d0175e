//! Error types for slot-engine operations.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{BookingId, RuleId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SlotError {
    #[error("Invalid rule definition for rule {rule_id}: {reason}")]
    InvalidRuleDefinition { rule_id: RuleId, reason: String },

    #[error("Query window of {requested_minutes} minutes exceeds the cap of {max_minutes} minutes")]
    WindowTooLarge {
        requested_minutes: i64,
        max_minutes: i64,
    },

    #[error("Malformed booked occurrence {id}: {duration_minutes} minutes from {start}")]
    MalformedBookedOccurrence {
        id: BookingId,
        start: DateTime<Utc>,
        duration_minutes: i64,
    },

    #[error("Booking of {duration_minutes} minutes at {start} does not fit inside a single free interval")]
    BookingOutsideAvailability {
        start: DateTime<Utc>,
        duration_minutes: i64,
    },

    #[error("Expansion error: {0}")]
    Expansion(String),

    #[error("Invalid instant '{0}': expected RFC 3339")]
    InvalidInstant(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Availability source error: {0}")]
    Source(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl SlotError {
    pub(crate) fn invalid_rule(rule_id: RuleId, reason: impl Into<String>) -> Self {
        SlotError::InvalidRuleDefinition {
            rule_id,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SlotError>;
