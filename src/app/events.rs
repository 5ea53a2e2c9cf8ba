//! Outbound cycle reporting.
//!
//! The [`AutomationService`](super::service::AutomationService) emits one
//! [`CycleSummary`] per cycle through the
//! [`DecisionSink`](super::ports::DecisionSink) port, alongside the
//! per-cover [`Decision`](crate::decision::Decision)s. Adapters decide what
//! to do with them — activity log, host entity attributes, metrics.

use serde::Serialize;

use crate::lock::LockMode;

/// Aggregate result of one cycle, suitable for logging or transmission.
#[derive(Debug, Clone, Serialize)]
pub struct CycleSummary {
    /// Monotonic cycle counter.
    pub cycle: u64,
    pub lock_mode: LockMode,

    /// Covers evaluated this cycle.
    pub covers_total: usize,
    /// Covers that received a move command.
    pub covers_moved: usize,
    /// Covers skipped (moving, unavailable, cooldown, disabled range).
    pub covers_skipped: usize,

    // Headline inputs the decisions were based on.
    pub sun_elevation: Option<f64>,
    pub sun_azimuth: Option<f64>,
    pub forecast_max: Option<f64>,
    pub temp_hot: Option<bool>,
    pub weather_sunny: Option<bool>,
    pub automation_disabled: bool,
}
