//! Engine configuration.
//!
//! Loaded from TOML, every field optional:
//!
//! ```toml
//! [limits]
//! max_window_days = 92
//!
//! [booking]
//! slot_minutes = 30
//! ```

use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlotError};
use crate::interval::TimeSpan;

/// Bounds on how much work one expansion call may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionLimits {
    /// Longest query window accepted by the expander.
    pub max_window: Duration,
}

impl ExpansionLimits {
    pub fn new(max_window: Duration) -> Self {
        Self { max_window }
    }

    pub fn days(days: u32) -> Self {
        Self::new(Duration::days(days as i64))
    }

    /// Reject windows longer than [`Self::max_window`].
    ///
    /// # Errors
    /// Returns `SlotError::WindowTooLarge`.
    pub fn check_window(&self, window: &TimeSpan) -> Result<()> {
        let requested = window.end - window.start;
        if requested > self.max_window {
            return Err(SlotError::WindowTooLarge {
                requested_minutes: requested.num_minutes(),
                max_minutes: self.max_window.num_minutes(),
            });
        }
        Ok(())
    }
}

impl Default for ExpansionLimits {
    fn default() -> Self {
        Self::days(default_max_window_days())
    }
}

/// Top-level configuration file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub booking: BookingConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_window_days")]
    pub max_window_days: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_window_days: default_max_window_days(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BookingConfig {
    /// Length of the bookable grid cells produced by [`crate::split::sub_slots`].
    #[serde(default = "default_slot_minutes")]
    pub slot_minutes: i64,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            slot_minutes: default_slot_minutes(),
        }
    }
}

fn default_max_window_days() -> u32 {
    92
}

fn default_slot_minutes() -> i64 {
    30
}

impl EngineConfig {
    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `SlotError::Config` on malformed TOML or out-of-range values.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(contents).map_err(|e| SlotError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SlotError::Config(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_toml_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn limits(&self) -> ExpansionLimits {
        ExpansionLimits::days(self.limits.max_window_days)
    }

    fn validate(&self) -> Result<()> {
        if self.limits.max_window_days == 0 {
            return Err(SlotError::Config("limits.max_window_days must be at least 1".into()));
        }
        if self.booking.slot_minutes <= 0 {
            return Err(SlotError::Config("booking.slot_minutes must be positive".into()));
        }
        Ok(())
    }
}
