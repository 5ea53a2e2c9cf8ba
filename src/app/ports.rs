//! Port traits — the hexagonal boundary between the decision engine and the
//! host platform.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AutomationService (domain)
//! ```
//!
//! Driven adapters (device registry, weather/astronomy feeds, activity log)
//! implement these traits. The [`AutomationService`](super::service::AutomationService)
//! consumes them via generics, so the decision core never touches the host
//! platform directly.
//!
//! All port errors are typed — callers must handle every variant explicitly.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use super::events::CycleSummary;
use crate::decision::{CoverCommand, Decision};
use crate::sun::SunPosition;

// ───────────────────────────────────────────────────────────────
// Cover port (driven adapter: devices ↔ domain)
// ───────────────────────────────────────────────────────────────

/// Snapshot of one cover device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverState {
    /// Reported position (0 = closed, 100 = open). `None` when the device
    /// exposes no numeric position; the engine then assumes fully open.
    pub position: Option<u8>,
    /// The device is currently opening or closing.
    pub moving: bool,
    /// The device accepts absolute position commands.
    pub supports_position: bool,
}

/// Read cover state and deliver move commands.
pub trait CoverPort {
    /// Read the current state of one cover.
    fn read_state(&mut self, id: &str) -> Result<CoverState, PortError>;

    /// Deliver a command to one cover. Returns once accepted by the
    /// device transport; completion is observed on later cycles.
    fn issue_command(&mut self, id: &str, command: CoverCommand) -> Result<(), PortError>;
}

// ───────────────────────────────────────────────────────────────
// Environment port (driven adapter: weather/astronomy → domain)
// ───────────────────────────────────────────────────────────────

/// Which day's forecast maximum to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastDay {
    Today,
    Tomorrow,
}

/// Read-only weather and sun feed.
pub trait EnvironmentPort {
    /// Current sun elevation and azimuth.
    fn sun_position(&mut self) -> Result<SunPosition, PortError>;

    /// Forecast maximum temperature for the given day (°C).
    fn forecast_max_temp(&mut self, day: ForecastDay) -> Result<f64, PortError>;

    /// Current weather condition identifier (e.g. "sunny", "rainy").
    fn weather_condition(&mut self) -> Result<String, PortError>;
}

// ───────────────────────────────────────────────────────────────
// Lockout port (driven adapter: window sensors → domain)
// ───────────────────────────────────────────────────────────────

/// Read lockout window/door sensors.
pub trait LockoutPort {
    /// Whether the sensor reports open.
    fn is_open(&mut self, id: &str) -> Result<bool, PortError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: clock/astronomy → domain)
// ───────────────────────────────────────────────────────────────

/// Wall clock and astronomy abstraction. Injected so cycles are
/// deterministic under test.
pub trait Clock {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Current local wall-clock time, used for time-of-day windows.
    fn local_time(&self) -> NaiveTime;

    /// Current local calendar date.
    fn today(&self) -> NaiveDate;

    /// Sunset instant for the given date, when known.
    fn sunset(&self, day: NaiveDate) -> Option<DateTime<Utc>>;
}

// ───────────────────────────────────────────────────────────────
// Decision sink port (driven adapter: domain → reporting)
// ───────────────────────────────────────────────────────────────

/// The engine emits per-cover decisions and cycle summaries through this
/// port. Adapters decide where they go (activity log, host attributes,
/// metrics pipeline).
pub trait DecisionSink {
    fn decision(&mut self, decision: &Decision);

    fn cycle_completed(&mut self, summary: &CycleSummary);
}

// ───────────────────────────────────────────────────────────────
// Error type
// ───────────────────────────────────────────────────────────────

/// Errors from port operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortError {
    /// The entity does not exist or is offline.
    Unavailable,
    /// The entity returned non-numeric or out-of-range data.
    InvalidReading,
    /// The device refused the command.
    CommandRejected,
    /// Generic transport/I/O error.
    Io,
}

impl core::fmt::Display for PortError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Unavailable => write!(f, "entity unavailable"),
            Self::InvalidReading => write!(f, "invalid reading"),
            Self::CommandRejected => write!(f, "command rejected"),
            Self::Io => write!(f, "I/O error"),
        }
    }
}
