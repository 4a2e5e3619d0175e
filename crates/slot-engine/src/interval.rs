//! Half-open interval algebra.
//!
//! [`Interval<T>`] is generic over any totally ordered instant so the masking and
//! splitting math can be exercised with plain integers in tests and used with
//! `DateTime<Utc>` everywhere else. All intervals are `[start, end)`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval<T> {
    pub start: T,
    pub end: T,
}

/// An interval of UTC instants.
pub type TimeSpan = Interval<DateTime<Utc>>;

impl<T: Ord + Copy> Interval<T> {
    pub fn new(start: T, end: T) -> Self {
        Self { start, end }
    }

    /// True when the interval covers nothing (`start >= end`).
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Two intervals overlap iff `a.start < b.end && b.start < a.end`.
    ///
    /// Touching intervals (`a.end == b.start`) do NOT overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// True when `other` lies entirely within `self` (bounds inclusive).
    pub fn contains(&self, other: &Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Intersection with `bounds`, or `None` if nothing is left.
    pub fn clip(&self, bounds: &Self) -> Option<Self> {
        let clipped = Self::new(self.start.max(bounds.start), self.end.min(bounds.end));
        (!clipped.is_empty()).then_some(clipped)
    }

    /// Split at `point` into the part before and the part from `point` on.
    ///
    /// Either side is `None` when it would be empty.
    pub fn split_at(&self, point: T) -> (Option<Self>, Option<Self>) {
        let point = point.max(self.start).min(self.end);
        let left = Self::new(self.start, point);
        let right = Self::new(point, self.end);
        (
            (!left.is_empty()).then_some(left),
            (!right.is_empty()).then_some(right),
        )
    }

    /// Remove every hole from `self`, returning the sorted remainder.
    ///
    /// Holes may overlap, touch, or extend past `self`; they are clipped first.
    /// Never returns an empty interval.
    pub fn subtract(&self, holes: &[Self]) -> Vec<Self> {
        if self.is_empty() {
            return Vec::new();
        }

        let mut clipped: Vec<Self> = holes.iter().filter_map(|h| h.clip(self)).collect();
        clipped.sort_by_key(|h| (h.start, h.end));

        let mut remainder = Vec::new();
        let mut cursor = self.start;

        for hole in &clipped {
            if hole.start > cursor {
                remainder.push(Self::new(cursor, hole.start));
            }
            cursor = cursor.max(hole.end);
        }

        if cursor < self.end {
            remainder.push(Self::new(cursor, self.end));
        }

        remainder
    }
}

impl Interval<DateTime<Utc>> {
    /// Build `[start, start + minutes)`, or `None` if the end is not representable.
    pub fn from_minutes(start: DateTime<Utc>, minutes: i64) -> Option<Self> {
        let end = start.checked_add_signed(Duration::try_minutes(minutes)?)?;
        Some(Self::new(start, end))
    }

    /// Length of the interval in whole minutes (negative if inverted).
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}
