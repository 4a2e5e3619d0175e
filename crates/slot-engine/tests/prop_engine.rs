//! Property-based tests using proptest.
//!
//! These verify invariants that must hold for *any* input, not just the
//! hand-picked cases in the other test files.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use proptest::prelude::*;
use slot_engine::mask::mask;
use slot_engine::{
    expand, split_by_day, unpack_availability, BookedOccurrence, BookingKind, ExpansionLimits,
    Frequency, RawOccurrence, RecurrenceRule, TimeSpan,
};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn minutes(m: i64) -> DateTime<Utc> {
    base() + Duration::minutes(m)
}

/// Bookings as (offset from occurrence start, duration, canceled). Offsets and
/// durations may fall outside the occurrence or be non-positive.
fn arb_bookings() -> impl Strategy<Value = Vec<(i64, i64, bool)>> {
    prop::collection::vec((-60i64..360, -30i64..180, prop::bool::weighted(0.2)), 0..8)
}

fn arb_weekdays() -> impl Strategy<Value = BTreeSet<u8>> {
    prop::collection::btree_set(0u8..=6, 1..=7)
}

fn arb_frequency() -> impl Strategy<Value = Frequency> {
    prop_oneof![
        Just(Frequency::Daily),
        arb_weekdays().prop_map(|weekdays| Frequency::Weekly { weekdays }),
        (1u32..=31).prop_map(|day_of_month| Frequency::Monthly { day_of_month }),
    ]
}

fn arb_rule(id: u64) -> impl Strategy<Value = RecurrenceRule> {
    (
        arb_frequency(),
        0u32..24,
        prop::sample::select(vec![0u32, 15, 30, 45]),
        15i64..=600,
        0i64..60,
        0i64..90,
    )
        .prop_map(move |(frequency, hour, minute, duration, from_offset, length)| {
            let valid_from =
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(from_offset);
            RecurrenceRule {
                id,
                owner_id: 1,
                title: String::new(),
                frequency,
                valid_from,
                valid_until: valid_from + Duration::days(length),
                time_of_day_start: NaiveTime::from_hms_opt(hour, minute, 0).unwrap(),
                duration_minutes: duration,
            }
        })
}

fn arb_window() -> impl Strategy<Value = TimeSpan> {
    (0i64..60 * 24 * 60, 1i64..30 * 24 * 60)
        .prop_map(|(offset, length)| TimeSpan::new(minutes(offset), minutes(offset + length)))
}

fn to_booked(specs: &[(i64, i64, bool)], origin: DateTime<Utc>) -> Vec<BookedOccurrence> {
    specs
        .iter()
        .enumerate()
        .map(|(i, (offset, duration, canceled))| BookedOccurrence {
            id: i as u64,
            kind: BookingKind::Lesson,
            owner_id: 1,
            start: origin + Duration::minutes(*offset),
            duration_minutes: *duration,
            canceled: *canceled,
        })
        .collect()
}

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Property 1: free intervals and live bookings partition the occurrence
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn free_and_booked_partition_occurrence(
        length in 1i64..=300,
        specs in arb_bookings(),
    ) {
        let occurrence = RawOccurrence { rule_id: 1, start: minutes(0), end: minutes(length) };
        let booked = to_booked(&specs, occurrence.start);

        let masked = mask(&occurrence, &booked);

        let live: Vec<TimeSpan> = booked
            .iter()
            .filter(|b| !b.canceled)
            .filter_map(|b| b.live_span()?.clip(&occurrence.span()))
            .collect();

        // Every minute of the occurrence is free XOR booked.
        for m in 0..length {
            let minute = TimeSpan::new(minutes(m), minutes(m + 1));
            let free = masked.free.iter().filter(|f| f.span().contains(&minute)).count();
            let busy = live.iter().any(|b| b.contains(&minute));
            prop_assert!(free <= 1, "minute {} covered by {} free intervals", m, free);
            prop_assert!((free == 1) != busy, "minute {} free={} busy={}", m, free, busy);
        }

        for f in &masked.free {
            prop_assert!(f.start < f.end, "degenerate free interval {:?}", f);
            prop_assert!(occurrence.span().contains(&f.span()));
        }
        for pair in masked.free.windows(2) {
            prop_assert!(pair[0].end <= pair[1].start, "unsorted or overlapping: {:?}", pair);
        }

        let malformed = booked.iter().filter(|b| !b.canceled && b.live_span().is_none()).count();
        prop_assert_eq!(masked.warnings.len(), malformed);
    }
}

// ---------------------------------------------------------------------------
// Property 2: day splitting reconstructs the interval
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn split_by_day_reconstructs_interval(
        offset in 0i64..400 * 24 * 60,
        length in 0i64..6 * 24 * 60,
    ) {
        let interval = TimeSpan::new(minutes(offset), minutes(offset + length));

        let pieces = split_by_day(&interval);

        if length == 0 {
            prop_assert!(pieces.is_empty());
        } else {
            prop_assert_eq!(pieces.first().unwrap().start, interval.start);
            prop_assert_eq!(pieces.last().unwrap().end, interval.end);
            for pair in pieces.windows(2) {
                prop_assert_eq!(pair[0].end, pair[1].start);
            }
            let total: i64 = pieces.iter().map(|p| p.duration_minutes()).sum();
            prop_assert_eq!(total, length);
            for piece in &pieces {
                prop_assert!(piece.start < piece.end);
                let last_instant = piece.end - Duration::nanoseconds(1);
                prop_assert_eq!(piece.start.date_naive(), last_instant.date_naive());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Property 3: expansion stays inside the window, ordered and non-degenerate
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn expansion_is_clipped_and_sorted(
        rule in arb_rule(1),
        window in arb_window(),
    ) {
        let occurrences = expand(&rule, &window, &ExpansionLimits::default()).unwrap();

        for o in &occurrences {
            prop_assert!(o.start < o.end);
            prop_assert!(window.contains(&o.span()), "{:?} outside {:?}", o, window);
            prop_assert!((o.end - o.start).num_minutes() <= rule.duration_minutes);
        }
        for pair in occurrences.windows(2) {
            prop_assert!(pair[0].start < pair[1].start);
        }
    }
}

// ---------------------------------------------------------------------------
// Property 4: unpacking is deterministic and globally ordered
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn unpack_is_deterministic_and_ordered(
        rules in (arb_rule(1), arb_rule(2), arb_rule(3)).prop_map(|(a, b, c)| vec![c, a, b]),
        window in arb_window(),
        specs in arb_bookings(),
    ) {
        let booked = to_booked(&specs, window.start);
        let limits = ExpansionLimits::default();

        let first = unpack_availability(&rules, &booked, &window, &limits).unwrap();
        let second = unpack_availability(&rules, &booked, &window, &limits).unwrap();

        prop_assert_eq!(&first, &second);
        prop_assert!(first.rejected.is_empty());
        for pair in first.free.windows(2) {
            prop_assert!(
                (pair[0].start, pair[0].rule_id) <= (pair[1].start, pair[1].rule_id),
                "out of order: {:?}",
                pair
            );
        }
        for f in &first.free {
            prop_assert!(f.start < f.end);
        }
    }
}

// ---------------------------------------------------------------------------
// Property 5: monthly rules skip months that lack the day
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn monthly_rule_emits_once_per_month_that_has_the_day(
        day_of_month in 28u32..=31,
        year in 2023i32..=2028,
        start_month in 1u32..=9,
    ) {
        let first = NaiveDate::from_ymd_opt(year, start_month, 1).unwrap();
        let last = NaiveDate::from_ymd_opt(year, start_month + 3, 1).unwrap().pred_opt().unwrap();
        let rule = RecurrenceRule {
            id: 1,
            owner_id: 1,
            title: String::new(),
            frequency: Frequency::Monthly { day_of_month },
            valid_from: first,
            valid_until: last,
            time_of_day_start: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            duration_minutes: 60,
        };
        let window = TimeSpan::new(
            first.and_time(NaiveTime::MIN).and_utc(),
            (last + Duration::days(1)).and_time(NaiveTime::MIN).and_utc(),
        );

        let occurrences = expand(&rule, &window, &ExpansionLimits::default()).unwrap();

        let expected: Vec<NaiveDate> = (start_month..start_month + 3)
            .filter_map(|m| NaiveDate::from_ymd_opt(year, m, day_of_month))
            .collect();
        let actual: Vec<NaiveDate> = occurrences.iter().map(|o| o.start.date_naive()).collect();
        prop_assert_eq!(actual, expected);
        for o in &occurrences {
            prop_assert_eq!(o.start.day(), day_of_month);
        }
    }
}
