//! `slots` CLI -- unpack availability rules and check bookings from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Free slots for the first ten days of January (stdout: wire JSON)
//! slots unpack -r rules.json -b booked.json --from 2024-01-01T00:00:00Z --to 2024-01-11T00:00:00Z
//!
//! # Same, one slot per calendar day for day views
//! slots unpack -r rules.json --from 2024-01-01T00:00:00Z --days 7 --by-day
//!
//! # Does a 30 minute lesson at 10:30 fit? (exit code 1 if not)
//! slots unpack -r rules.json --from 2024-01-08T00:00:00Z --days 1 | \
//!     slots validate --start 2024-01-08T10:30:00Z --duration 30
//!
//! # Split an interval at UTC midnight
//! slots split --start 2024-01-08T22:00:00Z --end 2024-01-09T02:00:00Z
//!
//! # Cut free slots into a 30 minute booking grid
//! slots subslots -i free.json --minutes 30
//!
//! # Overlapping sessions between two booking lists
//! slots conflicts -a lessons.json -b interviews.json
//!
//! # Rules of the same owner that overlap each other
//! slots check-rules -r rules.json
//! ```

mod logging;

use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use slot_engine::conflict::find_booking_conflicts;
use slot_engine::expander::window_of_days;
use slot_engine::split::sub_slots_batch;
use slot_engine::validate::find_host;
use slot_engine::wire::{self, parse_instant};
use slot_engine::{
    rules_intersect, split_across_days, unpack_availability, BookedOccurrence, BookingRequest,
    EngineConfig, ExpansionLimits, FreeInterval, RecurrenceRule, TimeSpan,
};

#[derive(Parser)]
#[command(
    name = "slots",
    version,
    about = "Recurring availability and booking-conflict engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML config file with [limits] and [booking] sections
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the maximum query window in days
    #[arg(long, global = true)]
    max_window_days: Option<u32>,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand rules, subtract bookings, print free slots
    Unpack {
        /// JSON array of rules
        #[arg(short, long)]
        rules: String,
        /// JSON array of booked lessons/interviews/demo sessions
        #[arg(short, long)]
        booked: Option<String>,
        /// Window start (RFC 3339)
        #[arg(long)]
        from: String,
        /// Window end (RFC 3339); conflicts with --days
        #[arg(long, conflicts_with = "days")]
        to: Option<String>,
        /// Window length in days from --from
        #[arg(long)]
        days: Option<i64>,
        /// Only rules and bookings of this owner
        #[arg(long)]
        owner: Option<u64>,
        /// Split slots that cross midnight UTC
        #[arg(long)]
        by_day: bool,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Check a booking request against free slots (exit code 1 if it does not fit)
    Validate {
        /// Free slots JSON (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Proposed start (RFC 3339)
        #[arg(long)]
        start: String,
        /// Duration in minutes
        #[arg(long)]
        duration: i64,
    },
    /// Split an interval at UTC midnight
    Split {
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        /// Slot id attached to every piece
        #[arg(long, default_value_t = 0)]
        id: u64,
    },
    /// Divide free slots into fixed-length bookable slots
    Subslots {
        /// Free slots JSON (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Slot length in minutes (defaults to booking.slot_minutes from config)
        #[arg(long)]
        minutes: Option<i64>,
    },
    /// Report overlapping sessions between two booking lists
    Conflicts {
        #[arg(short)]
        a: String,
        #[arg(short)]
        b: String,
    },
    /// Report pairs of rules of the same owner that overlap
    CheckRules {
        #[arg(short, long)]
        rules: String,
    },
}

#[derive(Serialize)]
struct ValidateOutput {
    fits: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    slot: Option<wire::WireSlot>,
}

#[derive(Serialize)]
struct RuleOverlap {
    owner_id: u64,
    a: u64,
    b: u64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(if cli.verbose { "debug" } else { "warn" });

    let config = match &cli.config {
        Some(path) => EngineConfig::load_from(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let limits = match cli.max_window_days {
        Some(days) => ExpansionLimits::days(days),
        None => config.limits(),
    };

    match cli.command {
        Commands::Unpack {
            rules,
            booked,
            from,
            to,
            days,
            owner,
            by_day,
            output,
        } => {
            let mut rules: Vec<RecurrenceRule> = read_json(Some(&rules))?;
            let mut booked: Vec<BookedOccurrence> = match booked {
                Some(path) => read_json(Some(&path))?,
                None => Vec::new(),
            };
            if let Some(owner) = owner {
                rules.retain(|r| r.owner_id == owner);
                booked.retain(|b| b.owner_id == owner);
            }

            let window = parse_window(&from, to.as_deref(), days)?;
            let availability = unpack_availability(&rules, &booked, &window, &limits)
                .context("Failed to unpack availability")?;

            let free: Vec<FreeInterval> = if by_day {
                availability.free.iter().flat_map(split_across_days).collect()
            } else {
                availability.free
            };

            let json = wire::to_json(&free).context("Failed to serialize slots")?;
            write_output(output.as_deref(), &json)?;
        }
        Commands::Validate {
            input,
            start,
            duration,
        } => {
            let free = read_slots(input.as_deref())?;
            let request = BookingRequest::new(parse_instant(&start)?, duration);
            let host = find_host(&request, &free);

            let result = ValidateOutput {
                fits: host.is_some(),
                slot: host.map(wire::WireSlot::from),
            };
            println!("{}", serde_json::to_string(&result)?);

            if host.is_none() {
                process::exit(1);
            }
        }
        Commands::Split { start, end, id } => {
            let span = TimeSpan::new(parse_instant(&start)?, parse_instant(&end)?);
            let pieces = split_across_days(&FreeInterval::new(id, span));
            println!("{}", wire::to_json(&pieces)?);
        }
        Commands::Subslots { input, minutes } => {
            let free = read_slots(input.as_deref())?;
            let minutes = minutes.unwrap_or(config.booking.slot_minutes);
            if minutes <= 0 {
                anyhow::bail!("--minutes must be positive, got {}", minutes);
            }
            println!("{}", wire::to_json(&sub_slots_batch(&free, minutes))?);
        }
        Commands::Conflicts { a, b } => {
            let a: Vec<BookedOccurrence> = read_json(Some(&a))?;
            let b: Vec<BookedOccurrence> = read_json(Some(&b))?;
            let conflicts = find_booking_conflicts(&a, &b);
            println!("{}", serde_json::to_string(&conflicts)?);
        }
        Commands::CheckRules { rules } => {
            let rules: Vec<RecurrenceRule> = read_json(Some(&rules))?;
            println!("{}", serde_json::to_string(&overlapping_rules(&rules))?);
        }
    }

    Ok(())
}

/// Every pair of same-owner rules that would produce overlapping occurrences.
///
/// Invalid rules are logged and left out.
fn overlapping_rules(rules: &[RecurrenceRule]) -> Vec<RuleOverlap> {
    let mut overlaps = Vec::new();
    for (i, a) in rules.iter().enumerate() {
        for b in rules.iter().skip(i + 1) {
            if a.owner_id != b.owner_id {
                continue;
            }
            match rules_intersect(a, b) {
                Ok(true) => overlaps.push(RuleOverlap {
                    owner_id: a.owner_id,
                    a: a.id,
                    b: b.id,
                }),
                Ok(false) => {}
                Err(err) => tracing::warn!("Cannot compare rules {} and {}: {}", a.id, b.id, err),
            }
        }
    }
    overlaps
}

fn parse_window(from: &str, to: Option<&str>, days: Option<i64>) -> Result<TimeSpan> {
    let start = parse_instant(from)?;
    match (to, days) {
        (Some(to), _) => Ok(TimeSpan::new(start, parse_instant(to)?)),
        (None, Some(days)) => Ok(window_of_days(start, days)?),
        (None, None) => anyhow::bail!("Either --to or --days is required"),
    }
}

fn read_slots(path: Option<&str>) -> Result<Vec<FreeInterval>> {
    let json = read_input(path)?;
    wire::from_json(&json).context("Failed to parse slots JSON")
}

fn read_json<T: serde::de::DeserializeOwned>(path: Option<&str>) -> Result<T> {
    let json = read_input(path)?;
    serde_json::from_str(&json).with_context(|| {
        format!("Failed to parse JSON from {}", path.unwrap_or("stdin"))
    })
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
