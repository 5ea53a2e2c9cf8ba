//! Unified error types for the smartshade engine.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! cycle orchestrator's error handling uniform. All variants are `Copy` so
//! they can be cheaply passed through per-cover decision paths without
//! allocation.
//!
//! Severity contract:
//! - `Sensor` errors are non-fatal: the policy relying on the reading is
//!   skipped for the affected cover for one cycle.
//! - `Command` errors are isolated per cover: the decision is marked failed
//!   and runtime state is left untouched so the move retries next cycle.
//! - `Invariant` errors abort the current cycle only; the next scheduled
//!   cycle proceeds normally.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level engine error
// ---------------------------------------------------------------------------

/// Every fallible operation in the engine funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A configuration value failed validation at load time.
    Config(ConfigError),
    /// A sensor could not be read or returned unusable data.
    Sensor(SensorError),
    /// A cover command could not be delivered to the device.
    Command(CommandError),
    /// The engine reached a state that violates an internal invariant.
    Invariant(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Command(e) => write!(f, "command: {e}"),
            Self::Invariant(msg) => write!(f, "invariant: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// A configuration field failed range or consistency validation.
/// Surfaced once at load; the affected cover or feature stays excluded
/// from the corresponding policy until corrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Cover azimuth outside [0, 360).
    AzimuthOutOfRange,
    /// A position bound outside 0–100, or min above max.
    InvalidPositionBounds,
    /// Hysteresis band must not be negative.
    NegativeHysteresis,
    /// Azimuth tolerance must lie in (0, 180].
    InvalidAzimuthTolerance,
    /// Two covers share the same entity identifier.
    DuplicateCoverId,
    /// A cover entity identifier is empty.
    EmptyCoverId,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AzimuthOutOfRange => write!(f, "azimuth outside [0, 360)"),
            Self::InvalidPositionBounds => write!(f, "position bounds invalid"),
            Self::NegativeHysteresis => write!(f, "hysteresis is negative"),
            Self::InvalidAzimuthTolerance => write!(f, "azimuth tolerance outside (0, 180]"),
            Self::DuplicateCoverId => write!(f, "duplicate cover id"),
            Self::EmptyCoverId => write!(f, "empty cover id"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// Sun elevation/azimuth unavailable this cycle.
    SunUnavailable,
    /// Forecast temperature unavailable or non-numeric.
    TemperatureUnavailable,
    /// Weather condition unavailable.
    WeatherUnavailable,
    /// A lockout window sensor could not be read.
    LockoutUnavailable,
    /// A reading is outside its physically plausible range.
    OutOfRange,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SunUnavailable => write!(f, "sun data unavailable"),
            Self::TemperatureUnavailable => write!(f, "forecast temperature unavailable"),
            Self::WeatherUnavailable => write!(f, "weather condition unavailable"),
            Self::LockoutUnavailable => write!(f, "lockout sensor unavailable"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Command errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// The device is not reachable.
    DeviceUnavailable,
    /// The device rejected the command.
    Rejected,
    /// The command transport failed mid-flight.
    Transport,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceUnavailable => write!(f, "device unavailable"),
            Self::Rejected => write!(f, "command rejected"),
            Self::Transport => write!(f, "transport failure"),
        }
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Engine-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_prefixed_by_subsystem() {
        let e = Error::from(ConfigError::AzimuthOutOfRange);
        assert_eq!(e.to_string(), "config: azimuth outside [0, 360)");
        let e = Error::from(SensorError::SunUnavailable);
        assert_eq!(e.to_string(), "sensor: sun data unavailable");
        let e = Error::from(CommandError::Rejected);
        assert_eq!(e.to_string(), "command: command rejected");
    }

    #[test]
    fn invariant_carries_message() {
        let e = Error::Invariant("inverted bounds");
        assert_eq!(e.to_string(), "invariant: inverted bounds");
    }
}
