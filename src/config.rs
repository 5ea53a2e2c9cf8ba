//! Engine configuration parameters.
//!
//! All tunable parameters for the cover automation engine. Values are
//! resolved by the host (options UI, stored settings) and handed to the
//! engine as plain data; a hot-reload replaces the configuration without
//! touching per-cover runtime state.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Error, Result};

/// Fully closed position on the 0–100 scale.
pub const FULLY_CLOSED: u8 = 0;
/// Fully open position on the 0–100 scale.
pub const FULLY_OPEN: u8 = 100;

/// Length of the evening-closure activation window (seconds).
pub const EVENING_CLOSURE_WINDOW_SECS: u32 = 600;

// ---------------------------------------------------------------------------
// Time-of-day range
// ---------------------------------------------------------------------------

/// A half-open `[start, end)` wall-clock range. Ranges that wrap past
/// midnight (e.g. 22:00–06:00) are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeRange {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Whether `t` falls inside the range.
    pub fn contains(&self, t: NaiveTime) -> bool {
        if self.start <= self.end {
            // Same-day range, e.g. 09:00..17:00
            t >= self.start && t < self.end
        } else {
            // Overnight range, e.g. 22:00..06:00 — wraps around midnight
            t >= self.start || t < self.end
        }
    }
}

// ---------------------------------------------------------------------------
// Evening closure
// ---------------------------------------------------------------------------

/// One-time forced close of member covers shortly after sunset.
///
/// The action fires within a fixed 10-minute window starting at
/// `sunset + delay_secs`. A cover evaluated inside the window is driven to
/// fully closed once; a cover that was never evaluated during the window
/// (engine inactive) is not closed retroactively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EveningClosure {
    pub enabled: bool,
    /// Delay after sunset before the activation window opens (seconds).
    pub delay_secs: u32,
}

impl Default for EveningClosure {
    fn default() -> Self {
        Self {
            enabled: false,
            delay_secs: 1800,
        }
    }
}

// ---------------------------------------------------------------------------
// Global configuration
// ---------------------------------------------------------------------------

/// Global engine configuration, immutable within a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationConfig {
    // --- Policies ---
    /// Heat-protection policy (forecast temperature) configured.
    pub temperature_policy: bool,
    /// Sun-geometry policy (elevation/azimuth) configured.
    pub sun_policy: bool,

    // --- Temperature ---
    /// Forecast temperature at which heat protection engages (°C).
    pub temp_threshold: f64,
    /// Deadband around the threshold to prevent flapping (°C).
    pub temp_hysteresis: f64,
    /// Wall-clock time at which the forecast day switches from today to
    /// tomorrow.
    pub forecast_cutover: NaiveTime,

    // --- Sun ---
    /// Minimum sun elevation before the sun policy acts (degrees).
    pub sun_elevation_threshold: f64,
    /// Maximum sun/cover azimuth difference for a hit (degrees).
    pub sun_azimuth_tolerance: f64,

    // --- Positions ---
    /// Global closing floor: automation never drives below this position.
    pub covers_min_position: u8,
    /// Global opening ceiling: automation never drives above this position.
    pub covers_max_position: u8,
    /// Ignore position changes smaller than this (percentage points).
    pub min_position_delta: u8,

    // --- Overrides and windows ---
    /// How long a detected manual move suppresses automation (seconds);
    /// 0 disables skipping.
    pub manual_override_cooldown_secs: u32,
    /// Suppress automated opening while the sun is below the horizon.
    pub night_open_block: bool,
    /// Wall-clock range during which automation is fully suppressed.
    pub disabled_range: Option<TimeRange>,
    /// Forced close of member covers shortly after sunset.
    pub evening_closure: EveningClosure,

    // --- Timing ---
    /// Cycle cadence driven by the host (seconds).
    pub cycle_interval_secs: u32,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            temperature_policy: true,
            sun_policy: true,

            temp_threshold: 24.0,
            temp_hysteresis: 0.5,
            forecast_cutover: NaiveTime::from_hms_opt(16, 0, 0).expect("static time"),

            sun_elevation_threshold: 20.0,
            sun_azimuth_tolerance: 90.0,

            covers_min_position: FULLY_CLOSED,
            covers_max_position: FULLY_OPEN,
            min_position_delta: 5,

            manual_override_cooldown_secs: 1800,
            night_open_block: true,
            disabled_range: None,
            evening_closure: EveningClosure::default(),

            cycle_interval_secs: 60,
        }
    }
}

impl AutomationConfig {
    /// Validate global settings. Called once at load and on hot-reload;
    /// a failure leaves the previous configuration in effect.
    pub fn validate(&self) -> Result<()> {
        if self.temp_hysteresis < 0.0 {
            return Err(ConfigError::NegativeHysteresis.into());
        }
        if !(0.0..=180.0).contains(&self.sun_azimuth_tolerance) || self.sun_azimuth_tolerance == 0.0
        {
            return Err(ConfigError::InvalidAzimuthTolerance.into());
        }
        if self.covers_min_position > self.covers_max_position
            || self.covers_max_position > FULLY_OPEN
        {
            return Err(ConfigError::InvalidPositionBounds.into());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Per-cover configuration
// ---------------------------------------------------------------------------

/// Per-cover configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverConfig {
    /// Host entity identifier of the cover device.
    pub id: String,
    /// Compass direction the window faces (0–359°, 0 = north). Missing or
    /// invalid azimuth excludes the cover from the sun policy.
    pub azimuth: Option<f64>,
    /// Per-cover closing floor, overrides the global one when present.
    pub min_position: Option<u8>,
    /// Per-cover opening ceiling, overrides the global one when present.
    pub max_position: Option<u8>,
    /// Window/door sensors whose open state blocks closing moves.
    pub lockout_sensors: Vec<String>,
    /// Member of the evening-closure set.
    pub evening_closure: bool,
}

impl CoverConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            azimuth: None,
            min_position: None,
            max_position: None,
            lockout_sensors: Vec::new(),
            evening_closure: false,
        }
    }

    /// Azimuth usable by the sun policy, `None` when missing or invalid.
    pub fn effective_azimuth(&self) -> Option<f64> {
        self.azimuth.filter(|a| (0.0..360.0).contains(a))
    }

    /// Effective `(min, max)` position bounds: per-cover overrides win over
    /// the global settings.
    pub fn effective_bounds(&self, global: &AutomationConfig) -> (u8, u8) {
        (
            self.min_position.unwrap_or(global.covers_min_position),
            self.max_position.unwrap_or(global.covers_max_position),
        )
    }

    /// Validate per-cover settings against the global configuration.
    pub fn validate(&self, global: &AutomationConfig) -> Result<()> {
        if self.id.is_empty() {
            return Err(ConfigError::EmptyCoverId.into());
        }
        if let Some(a) = self.azimuth {
            if !(0.0..360.0).contains(&a) {
                return Err(ConfigError::AzimuthOutOfRange.into());
            }
        }
        let (min, max) = self.effective_bounds(global);
        if min > max || max > FULLY_OPEN {
            return Err(ConfigError::InvalidPositionBounds.into());
        }
        Ok(())
    }
}

/// Validate a whole cover set, including id uniqueness.
///
/// An out-of-range azimuth is deliberately tolerated here: it only
/// excludes the affected cover from the sun policy, it must not reject
/// the rest of the configuration.
pub fn validate_covers(covers: &[CoverConfig], global: &AutomationConfig) -> Result<()> {
    for (i, cover) in covers.iter().enumerate() {
        match cover.validate(global) {
            Err(Error::Config(ConfigError::AzimuthOutOfRange)) => {}
            other => other?,
        }
        if covers[..i].iter().any(|c| c.id == cover.id) {
            return Err(ConfigError::DuplicateCoverId.into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, Error};

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn default_config_is_sane() {
        let c = AutomationConfig::default();
        assert!(c.validate().is_ok());
        assert!(c.temp_threshold > 0.0);
        assert!(c.temp_hysteresis >= 0.0);
        assert!(c.covers_min_position <= c.covers_max_position);
        assert!(c.min_position_delta <= FULLY_OPEN);
        assert!(c.cycle_interval_secs > 0);
    }

    #[test]
    fn serde_roundtrip() {
        let c = AutomationConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2: AutomationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c, c2);
    }

    #[test]
    fn postcard_roundtrip() {
        let c = AutomationConfig::default();
        let bytes = postcard::to_allocvec(&c).unwrap();
        let c2: AutomationConfig = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(c, c2);
    }

    #[test]
    fn same_day_range() {
        let r = TimeRange::new(t(9, 0), t(17, 0));
        assert!(r.contains(t(9, 0)));
        assert!(r.contains(t(12, 30)));
        assert!(!r.contains(t(17, 0)));
        assert!(!r.contains(t(8, 59)));
    }

    #[test]
    fn overnight_range_wraps_midnight() {
        let r = TimeRange::new(t(22, 0), t(6, 0));
        assert!(r.contains(t(23, 0)));
        assert!(r.contains(t(0, 30)));
        assert!(r.contains(t(5, 59)));
        assert!(!r.contains(t(6, 0)));
        assert!(!r.contains(t(12, 0)));
    }

    #[test]
    fn empty_range_contains_nothing() {
        let r = TimeRange::new(t(8, 0), t(8, 0));
        assert!(!r.contains(t(8, 0)));
        assert!(!r.contains(t(20, 0)));
    }

    #[test]
    fn per_cover_bounds_override_global() {
        let mut global = AutomationConfig::default();
        global.covers_min_position = 10;
        global.covers_max_position = 90;

        let mut cover = CoverConfig::new("cover.living_room");
        assert_eq!(cover.effective_bounds(&global), (10, 90));

        cover.min_position = Some(20);
        assert_eq!(cover.effective_bounds(&global), (20, 90));

        cover.max_position = Some(80);
        assert_eq!(cover.effective_bounds(&global), (20, 80));
    }

    #[test]
    fn invalid_azimuth_is_rejected_and_excluded() {
        let global = AutomationConfig::default();
        let mut cover = CoverConfig::new("cover.office");
        cover.azimuth = Some(420.0);
        assert_eq!(
            cover.validate(&global),
            Err(Error::Config(ConfigError::AzimuthOutOfRange))
        );
        assert_eq!(cover.effective_azimuth(), None);

        cover.azimuth = Some(359.9);
        assert!(cover.validate(&global).is_ok());
        assert_eq!(cover.effective_azimuth(), Some(359.9));
    }

    #[test]
    fn inverted_effective_bounds_rejected() {
        let global = AutomationConfig::default();
        let mut cover = CoverConfig::new("cover.office");
        cover.min_position = Some(80);
        cover.max_position = Some(20);
        assert_eq!(
            cover.validate(&global),
            Err(Error::Config(ConfigError::InvalidPositionBounds))
        );
    }

    #[test]
    fn cover_set_tolerates_invalid_azimuth() {
        // The cover is excluded from the sun policy instead.
        let global = AutomationConfig::default();
        let mut cover = CoverConfig::new("cover.odd");
        cover.azimuth = Some(500.0);
        assert!(validate_covers(&[cover], &global).is_ok());
    }

    #[test]
    fn duplicate_cover_ids_rejected() {
        let global = AutomationConfig::default();
        let covers = vec![
            CoverConfig::new("cover.kitchen"),
            CoverConfig::new("cover.kitchen"),
        ];
        assert_eq!(
            validate_covers(&covers, &global),
            Err(Error::Config(ConfigError::DuplicateCoverId))
        );
    }

    #[test]
    fn zero_tolerance_rejected() {
        let mut c = AutomationConfig::default();
        c.sun_azimuth_tolerance = 0.0;
        assert_eq!(
            c.validate(),
            Err(Error::Config(ConfigError::InvalidAzimuthTolerance))
        );
    }
}
