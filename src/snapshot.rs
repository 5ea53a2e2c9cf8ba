//! Per-cycle context snapshot.
//!
//! All environment reads for a cycle are gathered up front into one
//! immutable [`CycleContext`] so that within-cycle decisions stay
//! consistent even if the underlying sensors update mid-cycle. Missing or
//! non-numeric readings become `None`; covers depending on them fall back
//! to the remaining policy.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use log::warn;

use crate::app::ports::{Clock, EnvironmentPort, ForecastDay};
use crate::config::AutomationConfig;
use crate::sun::SunPosition;

/// Weather condition identifiers classified as sunny.
pub const WEATHER_SUNNY_CONDITIONS: &[&str] = &["sunny", "partlycloudy"];

// ---------------------------------------------------------------------------
// Thermal latch
// ---------------------------------------------------------------------------

/// Latched hot/cold state with state-dependent hysteresis.
///
/// Cold → hot when `temp > threshold + hysteresis`; hot → cold when
/// `temp < threshold - hysteresis`. Between the two edges the previous
/// state holds, which is what prevents flapping near the threshold.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThermalLatch {
    hot: bool,
}

impl ThermalLatch {
    pub fn new() -> Self {
        Self { hot: false }
    }

    /// Feed a forecast temperature and return the latched state.
    pub fn update(&mut self, temp: f64, threshold: f64, hysteresis: f64) -> bool {
        if self.hot {
            if temp < threshold - hysteresis {
                self.hot = false;
            }
        } else if temp > threshold + hysteresis {
            self.hot = true;
        }
        self.hot
    }

    pub fn is_hot(&self) -> bool {
        self.hot
    }
}

// ---------------------------------------------------------------------------
// CycleContext
// ---------------------------------------------------------------------------

/// A point-in-time snapshot of everything a cycle's decisions read.
/// Created fresh each cycle, never mutated afterwards.
#[derive(Debug, Clone, Copy)]
pub struct CycleContext {
    /// Sun elevation/azimuth, `None` when the feed is unavailable.
    pub sun: Option<SunPosition>,
    /// Forecast maximum temperature for the cutover-selected day (°C).
    pub forecast_max: Option<f64>,
    /// Latched heat state; `None` while the forecast is unknown.
    pub temp_hot: Option<bool>,
    /// Weather classified as sunny; `None` when the condition is unknown.
    pub weather_sunny: Option<bool>,
    /// Current instant.
    pub now: DateTime<Utc>,
    /// Current local wall-clock time.
    pub local_time: NaiveTime,
    /// Current local date.
    pub today: NaiveDate,
    /// Sunset instant for today, when known.
    pub sunset: Option<DateTime<Utc>>,
}

impl CycleContext {
    /// Gather every environment reading for one cycle.
    ///
    /// The thermal latch lives in the engine and carries its state across
    /// cycles; an unknown forecast leaves it untouched.
    pub fn capture(
        config: &AutomationConfig,
        env: &mut impl EnvironmentPort,
        clock: &impl Clock,
        latch: &mut ThermalLatch,
    ) -> Self {
        let now = clock.now();
        let local_time = clock.local_time();
        let today = clock.today();
        let sunset = clock.sunset(today);

        let sun = match env.sun_position() {
            Ok(sun) => Some(sun),
            Err(e) => {
                warn!("sun data unavailable: {e}");
                None
            }
        };

        // From the cutover time onward tomorrow's maximum drives the
        // heat decision.
        let day = if local_time >= config.forecast_cutover {
            ForecastDay::Tomorrow
        } else {
            ForecastDay::Today
        };
        let forecast_max = match env.forecast_max_temp(day) {
            Ok(t) => Some(t),
            Err(e) => {
                warn!("forecast temperature unavailable: {e}");
                None
            }
        };
        let temp_hot = forecast_max
            .map(|t| latch.update(t, config.temp_threshold, config.temp_hysteresis));

        let weather_sunny = match env.weather_condition() {
            Ok(cond) => {
                let lower = cond.to_ascii_lowercase();
                Some(WEATHER_SUNNY_CONDITIONS.contains(&lower.as_str()))
            }
            Err(e) => {
                warn!("weather condition unavailable: {e}");
                None
            }
        };

        Self {
            sun,
            forecast_max,
            temp_hot,
            weather_sunny,
            now,
            local_time,
            today,
            sunset,
        }
    }
}
