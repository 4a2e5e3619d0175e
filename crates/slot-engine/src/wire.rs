//! The slot wire format shared with calendar clients and slot storage.
//!
//! A slot is `{ "id": number, "start": "...Z", "end": "...Z" }` where both
//! instants are ISO-8601 UTC with millisecond precision and a trailing `Z`,
//! e.g. `2024-01-08T10:30:00.000Z`. Slots are emitted in the order the engine
//! produced them and must not be reordered by consumers.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlotError};
use crate::interval::TimeSpan;
use crate::model::{FreeInterval, RuleId};

/// One discrete slot on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireSlot {
    pub id: RuleId,
    #[serde(with = "iso_millis")]
    pub start: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub end: DateTime<Utc>,
}

impl From<&FreeInterval> for WireSlot {
    fn from(interval: &FreeInterval) -> Self {
        Self {
            id: interval.rule_id,
            start: interval.start,
            end: interval.end,
        }
    }
}

impl From<&WireSlot> for FreeInterval {
    fn from(slot: &WireSlot) -> Self {
        FreeInterval::new(slot.id, TimeSpan::new(slot.start, slot.end))
    }
}

pub fn to_wire(intervals: &[FreeInterval]) -> Vec<WireSlot> {
    intervals.iter().map(WireSlot::from).collect()
}

/// Serialize free intervals as a JSON array of wire slots.
pub fn to_json(intervals: &[FreeInterval]) -> Result<String> {
    serde_json::to_string(&to_wire(intervals)).map_err(|e| SlotError::Serialization(e.to_string()))
}

/// Parse a JSON array of wire slots back into free intervals.
///
/// Slots with `end <= start` are rejected, since free intervals are never empty.
pub fn from_json(json: &str) -> Result<Vec<FreeInterval>> {
    let slots: Vec<WireSlot> =
        serde_json::from_str(json).map_err(|e| SlotError::Serialization(e.to_string()))?;

    slots
        .iter()
        .map(|slot| {
            if slot.end <= slot.start {
                return Err(SlotError::Serialization(format!(
                    "slot {} ends at {} before it starts at {}",
                    slot.id,
                    format_instant(&slot.end),
                    format_instant(&slot.start)
                )));
            }
            Ok(FreeInterval::from(slot))
        })
        .collect()
}

/// Render an instant in wire form.
pub fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Parse an instant given on the command line or across the WASM boundary.
///
/// Accepts RFC 3339 with any offset (normalized to UTC), and naive
/// `YYYY-MM-DDTHH:MM:SS` which is interpreted as UTC.
pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .map(|ndt| ndt.and_utc())
        .map_err(|_| SlotError::InvalidInstant(raw.to_string()))
}

/// Serde adapter for wire instants.
pub mod iso_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        instant: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_instant(instant))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
