//! WASM bindings for slot-engine.
//!
//! Exposes availability unpacking, booking validation and day splitting to
//! JavaScript via `wasm-bindgen`. All complex types cross the boundary as JSON
//! strings; free slots use the `{id, start, end}` wire format from
//! [`slot_engine::wire`].
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p slot-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target nodejs --out-dir packages/slot-engine-js/wasm/ \
//!   target/wasm32-unknown-unknown/release/slot_engine_wasm.wasm
//! ```

use slot_engine::conflict::find_booking_conflicts;
use slot_engine::split::sub_slots_batch;
use slot_engine::wire::{self, parse_instant, WireSlot};
use slot_engine::{
    split_across_days, unpack_availability, validate, BookedOccurrence, BookingRequest,
    ExpansionLimits, FreeInterval, RecurrenceRule, SlotError, TimeSpan,
};
use wasm_bindgen::prelude::*;

type EngineResult<T> = slot_engine::error::Result<T>;

fn to_js(err: SlotError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn parse_json<T: serde::de::DeserializeOwned>(json: &str, what: &str) -> EngineResult<T> {
    serde_json::from_str(json).map_err(|e| SlotError::Serialization(format!("{}: {}", what, e)))
}

// ---------------------------------------------------------------------------
// JSON-in, JSON-out implementations (native-testable)
// ---------------------------------------------------------------------------

fn unpack_json(
    rules_json: &str,
    booked_json: &str,
    window_start: &str,
    window_end: &str,
    max_window_days: Option<u32>,
) -> EngineResult<String> {
    let rules: Vec<RecurrenceRule> = parse_json(rules_json, "Invalid rules JSON")?;
    let booked: Vec<BookedOccurrence> = parse_json(booked_json, "Invalid bookings JSON")?;
    let window = TimeSpan::new(parse_instant(window_start)?, parse_instant(window_end)?);
    let limits = max_window_days
        .map(ExpansionLimits::days)
        .unwrap_or_default();

    let availability = unpack_availability(&rules, &booked, &window, &limits)?;
    wire::to_json(&availability.free)
}

fn validate_json(free_json: &str, proposed_start: &str, duration_minutes: i64) -> EngineResult<bool> {
    let free = wire::from_json(free_json)?;
    let request = BookingRequest::new(parse_instant(proposed_start)?, duration_minutes);
    Ok(validate::fits(&request, &free))
}

fn split_json(slot_json: &str) -> EngineResult<String> {
    let slot: WireSlot = parse_json(slot_json, "Invalid slot JSON")?;
    wire::to_json(&split_across_days(&FreeInterval::from(&slot)))
}

fn sub_slots_json(free_json: &str, slot_minutes: i64) -> EngineResult<String> {
    let free = wire::from_json(free_json)?;
    wire::to_json(&sub_slots_batch(&free, slot_minutes))
}

fn conflicts_json(a_json: &str, b_json: &str) -> EngineResult<String> {
    let a: Vec<BookedOccurrence> = parse_json(a_json, "Invalid bookings JSON")?;
    let b: Vec<BookedOccurrence> = parse_json(b_json, "Invalid bookings JSON")?;
    serde_json::to_string(&find_booking_conflicts(&a, &b))
        .map_err(|e| SlotError::Serialization(e.to_string()))
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Expand availability rules over a window and subtract booked sessions.
///
/// Returns a JSON array of `{id, start, end}` free slots ordered by `start`,
/// then rule id. Rules that fail validation are skipped; the call only fails
/// for malformed input or a window longer than the cap.
///
/// # Arguments
/// - `rules_json` -- JSON array of availability rules
/// - `booked_json` -- JSON array of booked lessons, interviews and demo sessions
/// - `window_start`, `window_end` -- ISO 8601 instants, naive values are UTC
/// - `max_window_days` -- Optional override of the 92 day window cap
#[wasm_bindgen(js_name = "unpackAvailability")]
pub fn unpack_availability_wasm(
    rules_json: &str,
    booked_json: &str,
    window_start: &str,
    window_end: &str,
    max_window_days: Option<u32>,
) -> Result<String, JsValue> {
    unpack_json(rules_json, booked_json, window_start, window_end, max_window_days).map_err(to_js)
}

/// Whether a booking of `duration_minutes` starting at `proposed_start` fits
/// entirely inside one of the free slots in `free_json`.
#[wasm_bindgen(js_name = "validateBooking")]
pub fn validate_booking_wasm(
    free_json: &str,
    proposed_start: &str,
    duration_minutes: i64,
) -> Result<bool, JsValue> {
    validate_json(free_json, proposed_start, duration_minutes).map_err(to_js)
}

/// Split one `{id, start, end}` slot at every UTC midnight it crosses.
#[wasm_bindgen(js_name = "splitAcrossDays")]
pub fn split_across_days_wasm(slot_json: &str) -> Result<String, JsValue> {
    split_json(slot_json).map_err(to_js)
}

/// Divide free slots into consecutive bookable slots of `slot_minutes`.
#[wasm_bindgen(js_name = "subSlots")]
pub fn sub_slots_wasm(free_json: &str, slot_minutes: i64) -> Result<String, JsValue> {
    sub_slots_json(free_json, slot_minutes).map_err(to_js)
}

/// Pairwise overlaps between two booking lists, as `{a, b, overlap_minutes}`.
#[wasm_bindgen(js_name = "findBookingConflicts")]
pub fn find_booking_conflicts_wasm(a_json: &str, b_json: &str) -> Result<String, JsValue> {
    conflicts_json(a_json, b_json).map_err(to_js)
}
