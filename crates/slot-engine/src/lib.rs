//! # slot-engine
//!
//! Recurring availability expansion and booking-conflict checks for tutor and
//! interviewer calendars.
//!
//! A tutor publishes recurring availability rules (daily, on chosen weekdays,
//! or on a fixed day of the month). The engine turns those rules into concrete
//! windows, subtracts the lessons, interviews and demo sessions already booked
//! against them, and answers whether a proposed booking fits in what is left.
//! Every instant is UTC; every function is pure and deterministic.
//!
//! ## Modules
//!
//! - [`interval`] -- generic half-open interval algebra (clip, subtract, split)
//! - [`expander`] -- availability rule → concrete occurrences within a window
//! - [`mask`] -- subtract booked sessions from occurrences
//! - [`split`] -- split intervals at UTC midnight, divide into fixed slots
//! - [`validate`] -- does a booking request fit one free interval
//! - [`conflict`] -- overlapping sessions and overlapping rules
//! - [`availability`] -- expand + mask across all of an owner's rules
//! - [`wire`] -- `{id, start, end}` slot JSON
//! - [`config`] -- engine limits loaded from TOML
//! - [`error`] -- Error types

pub mod availability;
pub mod config;
pub mod conflict;
pub mod error;
pub mod expander;
pub mod interval;
pub mod mask;
pub mod model;
pub mod split;
pub mod validate;
pub mod wire;

pub use availability::{unpack_availability, unpack_for_owner, Availability, AvailabilitySource};
pub use config::{EngineConfig, ExpansionLimits};
pub use conflict::{find_conflicts, rules_intersect};
pub use error::SlotError;
pub use expander::{expand, expand_all};
pub use interval::{Interval, TimeSpan};
pub use mask::mask;
pub use model::{
    BookedOccurrence, BookingKind, BookingRequest, FreeInterval, Frequency, RawOccurrence,
    RecurrenceRule,
};
pub use split::{split_across_days, split_by_day, sub_slots};
pub use validate::{fits, validate_booking};
pub use wire::WireSlot;
