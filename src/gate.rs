//! Time-window gate: cycle-wide conditions evaluated once per cycle,
//! independent of any cover.

use chrono::Duration;

use crate::config::{AutomationConfig, EVENING_CLOSURE_WINDOW_SECS};
use crate::snapshot::CycleContext;

/// Result of the per-cycle gate evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateState {
    /// Current time falls inside the disabled range: automation is fully
    /// suppressed this cycle. Lock-mode enforcement still applies.
    pub automation_disabled: bool,
    /// Sun below the horizon with the night block enabled: automated
    /// opening is suppressed, closing protection stays allowed.
    pub night_block: bool,
    /// Inside the evening-closure activation window.
    pub evening_window: bool,
}

/// Evaluate all time-window conditions for this cycle.
pub fn evaluate(config: &AutomationConfig, ctx: &CycleContext) -> GateState {
    let automation_disabled = config
        .disabled_range
        .is_some_and(|range| range.contains(ctx.local_time));

    let night_block =
        config.night_open_block && ctx.sun.is_some_and(|sun| sun.elevation <= 0.0);

    let evening_window = config.evening_closure.enabled
        && ctx.sunset.is_some_and(|sunset| {
            let opens = sunset + Duration::seconds(i64::from(config.evening_closure.delay_secs));
            let closes = opens + Duration::seconds(i64::from(EVENING_CLOSURE_WINDOW_SECS));
            ctx.now >= opens && ctx.now < closes
        });

    GateState {
        automation_disabled,
        night_block,
        evening_window,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimeRange;
    use crate::sun::SunPosition;
    use chrono::{DateTime, NaiveTime, TimeZone, Utc};

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn instant(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn ctx_at(local: NaiveTime) -> CycleContext {
        CycleContext {
            sun: Some(SunPosition {
                elevation: 30.0,
                azimuth: 180.0,
            }),
            forecast_max: Some(20.0),
            temp_hot: Some(false),
            weather_sunny: Some(true),
            now: instant(0),
            local_time: local,
            today: instant(0).date_naive(),
            sunset: None,
        }
    }

    #[test]
    fn disabled_range_suppresses_inside_only() {
        let mut config = AutomationConfig::default();
        config.disabled_range = Some(TimeRange::new(t(22, 0), t(6, 0)));

        assert!(evaluate(&config, &ctx_at(t(23, 0))).automation_disabled);
        assert!(evaluate(&config, &ctx_at(t(5, 30))).automation_disabled);
        assert!(!evaluate(&config, &ctx_at(t(12, 0))).automation_disabled);
    }

    #[test]
    fn no_range_means_never_disabled() {
        let config = AutomationConfig::default();
        assert!(!evaluate(&config, &ctx_at(t(3, 0))).automation_disabled);
    }

    #[test]
    fn night_block_tracks_sun_elevation() {
        let config = AutomationConfig::default();
        let mut ctx = ctx_at(t(22, 0));
        ctx.sun = Some(SunPosition {
            elevation: -3.0,
            azimuth: 300.0,
        });
        assert!(evaluate(&config, &ctx).night_block);

        ctx.sun = Some(SunPosition {
            elevation: 0.5,
            azimuth: 300.0,
        });
        assert!(!evaluate(&config, &ctx).night_block);
    }

    #[test]
    fn night_block_disabled_by_config() {
        let mut config = AutomationConfig::default();
        config.night_open_block = false;
        let mut ctx = ctx_at(t(22, 0));
        ctx.sun = Some(SunPosition {
            elevation: -10.0,
            azimuth: 300.0,
        });
        assert!(!evaluate(&config, &ctx).night_block);
    }

    #[test]
    fn night_block_needs_sun_data() {
        let config = AutomationConfig::default();
        let mut ctx = ctx_at(t(22, 0));
        ctx.sun = None;
        assert!(!evaluate(&config, &ctx).night_block);
    }

    #[test]
    fn evening_window_opens_after_sunset_plus_delay() {
        let mut config = AutomationConfig::default();
        config.evening_closure.enabled = true;
        config.evening_closure.delay_secs = 1800;

        let sunset = instant(0);
        let mut ctx = ctx_at(t(21, 0));
        ctx.sunset = Some(sunset);

        // Before the window.
        ctx.now = instant(1799);
        assert!(!evaluate(&config, &ctx).evening_window);
        // Inside the 10-minute window.
        ctx.now = instant(1800);
        assert!(evaluate(&config, &ctx).evening_window);
        ctx.now = instant(1800 + 599);
        assert!(evaluate(&config, &ctx).evening_window);
        // Window closed; no retroactive activation.
        ctx.now = instant(1800 + 600);
        assert!(!evaluate(&config, &ctx).evening_window);
    }

    #[test]
    fn evening_window_requires_enable_and_sunset() {
        let mut config = AutomationConfig::default();
        let mut ctx = ctx_at(t(21, 0));
        ctx.sunset = Some(instant(0));
        ctx.now = instant(1800);
        config.evening_closure.delay_secs = 1800;

        config.evening_closure.enabled = false;
        assert!(!evaluate(&config, &ctx).evening_window);

        config.evening_closure.enabled = true;
        ctx.sunset = None;
        assert!(!evaluate(&config, &ctx).evening_window);
    }
}
