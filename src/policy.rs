//! Temperature + sun policy combiner.
//!
//! Computes the per-cover desired action from the cycle context. Only runs
//! when the lock mode is `Unlocked`, the cover is not in a manual-override
//! cooldown, and the disabled time range does not apply — the service
//! handles those gates before calling in here.
//!
//! Combination rule with both policies configured and valid sun data:
//! close only when the forecast is hot AND the sun is hitting the window;
//! a cold forecast opens; hot without a hit keeps the current position.
//! With one policy missing (or sun data invalid for the cover) the single
//! available policy decides alone.

use crate::config::{AutomationConfig, CoverConfig};
use crate::decision::DecisionReason;
use crate::snapshot::CycleContext;
use crate::sun;

/// What the combiner wants for a cover, before position resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyAction {
    /// Drive toward fully closed (subject to clamping).
    Close,
    /// Drive toward fully open (subject to clamping).
    Open,
    /// Keep the current position.
    Maintain,
}

/// Combiner result for one cover.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolicyOutcome {
    pub action: PolicyAction,
    pub reason: DecisionReason,
    /// Sun/cover azimuth difference when the geometry was evaluated.
    pub azimuth_difference: Option<f64>,
}

impl PolicyOutcome {
    fn new(action: PolicyAction, reason: DecisionReason) -> Self {
        Self {
            action,
            reason,
            azimuth_difference: None,
        }
    }

    fn with_difference(mut self, difference: f64) -> Self {
        self.azimuth_difference = Some(difference);
        self
    }
}

/// Sun-policy evaluation for one cover, when possible.
enum SunVerdict {
    /// Geometry evaluated; `hitting` folds in the sunny-condition gate.
    Evaluated { hitting: bool, difference: f64 },
    /// Cover has no valid azimuth; excluded from the sun policy.
    NoAzimuth,
    /// Sun or weather data unavailable this cycle.
    NoData,
    /// Sun policy not configured.
    Disabled,
}

fn sun_verdict(config: &AutomationConfig, cover: &CoverConfig, ctx: &CycleContext) -> SunVerdict {
    if !config.sun_policy {
        return SunVerdict::Disabled;
    }
    let Some(azimuth) = cover.effective_azimuth() else {
        return SunVerdict::NoAzimuth;
    };
    let Some(sun) = ctx.sun else {
        return SunVerdict::NoData;
    };
    let hit = sun::evaluate_hit(config, sun, azimuth);
    // Below the elevation threshold the sun never hits, whatever the
    // sky looks like.
    if sun.elevation < config.sun_elevation_threshold {
        return SunVerdict::Evaluated {
            hitting: false,
            difference: hit.azimuth_difference,
        };
    }
    match ctx.weather_sunny {
        Some(sunny) => SunVerdict::Evaluated {
            hitting: hit.hitting && sunny,
            difference: hit.azimuth_difference,
        },
        None => SunVerdict::NoData,
    }
}

/// Evaluate the combined temperature + sun policy for one cover.
pub fn evaluate(
    config: &AutomationConfig,
    cover: &CoverConfig,
    ctx: &CycleContext,
) -> PolicyOutcome {
    let hot = if config.temperature_policy {
        ctx.temp_hot
    } else {
        None
    };
    let verdict = sun_verdict(config, cover, ctx);

    match (config.temperature_policy, config.sun_policy) {
        (false, false) => PolicyOutcome::new(PolicyAction::Maintain, DecisionReason::Maintain),

        // Temperature only.
        (true, false) => temperature_only(hot),

        // Sun only.
        (false, true) => match verdict {
            SunVerdict::Evaluated { hitting, difference } => {
                let out = if hitting {
                    PolicyOutcome::new(PolicyAction::Close, DecisionReason::SunShieldClose)
                } else {
                    PolicyOutcome::new(PolicyAction::Open, DecisionReason::LetLightIn)
                };
                out.with_difference(difference)
            }
            SunVerdict::NoAzimuth => {
                PolicyOutcome::new(PolicyAction::Maintain, DecisionReason::AzimuthMissing)
            }
            SunVerdict::NoData | SunVerdict::Disabled => {
                PolicyOutcome::new(PolicyAction::Maintain, DecisionReason::SensorUnavailable)
            }
        },

        // Both configured.
        (true, true) => match verdict {
            SunVerdict::Evaluated { hitting, difference } => match hot {
                Some(true) if hitting => {
                    PolicyOutcome::new(PolicyAction::Close, DecisionReason::HeatProtectionClose)
                        .with_difference(difference)
                }
                // Hot but the sun is not on this window: leave it be.
                Some(true) => PolicyOutcome::new(PolicyAction::Maintain, DecisionReason::Maintain)
                    .with_difference(difference),
                Some(false) => {
                    PolicyOutcome::new(PolicyAction::Open, DecisionReason::LetLightIn)
                        .with_difference(difference)
                }
                // Forecast unknown: the sun policy decides alone.
                None => {
                    let out = if hitting {
                        PolicyOutcome::new(PolicyAction::Close, DecisionReason::SunShieldClose)
                    } else {
                        PolicyOutcome::new(PolicyAction::Open, DecisionReason::LetLightIn)
                    };
                    out.with_difference(difference)
                }
            },
            // Sun data invalid for this cover: temperature decides alone.
            SunVerdict::NoAzimuth | SunVerdict::NoData | SunVerdict::Disabled => {
                temperature_only(hot)
            }
        },
    }
}

fn temperature_only(hot: Option<bool>) -> PolicyOutcome {
    match hot {
        Some(true) => PolicyOutcome::new(PolicyAction::Close, DecisionReason::HeatProtectionClose),
        Some(false) => PolicyOutcome::new(PolicyAction::Open, DecisionReason::LetLightIn),
        None => PolicyOutcome::new(PolicyAction::Maintain, DecisionReason::SensorUnavailable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sun::SunPosition;
    use chrono::{NaiveTime, TimeZone, Utc};

    fn ctx() -> CycleContext {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        CycleContext {
            sun: Some(SunPosition {
                elevation: 35.0,
                azimuth: 180.0,
            }),
            forecast_max: Some(26.0),
            temp_hot: Some(true),
            weather_sunny: Some(true),
            now,
            local_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            today: now.date_naive(),
            sunset: None,
        }
    }

    fn south_cover() -> CoverConfig {
        let mut c = CoverConfig::new("cover.south");
        c.azimuth = Some(180.0);
        c
    }

    #[test]
    fn hot_and_hitting_closes() {
        let config = AutomationConfig::default();
        let out = evaluate(&config, &south_cover(), &ctx());
        assert_eq!(out.action, PolicyAction::Close);
        assert_eq!(out.reason, DecisionReason::HeatProtectionClose);
        assert_eq!(out.azimuth_difference, Some(0.0));
    }

    #[test]
    fn cold_opens() {
        let config = AutomationConfig::default();
        let mut ctx = ctx();
        ctx.temp_hot = Some(false);
        let out = evaluate(&config, &south_cover(), &ctx);
        assert_eq!(out.action, PolicyAction::Open);
        assert_eq!(out.reason, DecisionReason::LetLightIn);
    }

    #[test]
    fn hot_without_hit_maintains() {
        let config = AutomationConfig::default();
        let mut cover = south_cover();
        cover.azimuth = Some(0.0); // north-facing, sun due south
        let out = evaluate(&config, &cover, &ctx());
        assert_eq!(out.action, PolicyAction::Maintain);
        assert_eq!(out.azimuth_difference, Some(180.0));
    }

    #[test]
    fn cloudy_sky_never_hits() {
        let config = AutomationConfig::default();
        let mut ctx = ctx();
        ctx.weather_sunny = Some(false);
        let out = evaluate(&config, &south_cover(), &ctx);
        assert_eq!(out.action, PolicyAction::Maintain);
    }

    #[test]
    fn low_sun_opens_when_cold_and_maintains_when_hot() {
        let config = AutomationConfig::default();
        let mut ctx = ctx();
        ctx.sun = Some(SunPosition {
            elevation: config.sun_elevation_threshold - 5.0,
            azimuth: 180.0,
        });
        assert_eq!(
            evaluate(&config, &south_cover(), &ctx).action,
            PolicyAction::Maintain
        );
        ctx.temp_hot = Some(false);
        assert_eq!(
            evaluate(&config, &south_cover(), &ctx).action,
            PolicyAction::Open
        );
    }

    #[test]
    fn missing_azimuth_falls_back_to_temperature() {
        let config = AutomationConfig::default();
        let cover = CoverConfig::new("cover.no_azimuth");
        let out = evaluate(&config, &cover, &ctx());
        assert_eq!(out.action, PolicyAction::Close);
        assert_eq!(out.reason, DecisionReason::HeatProtectionClose);
        assert_eq!(out.azimuth_difference, None);
    }

    #[test]
    fn unknown_forecast_lets_sun_decide() {
        let config = AutomationConfig::default();
        let mut ctx = ctx();
        ctx.temp_hot = None;
        let out = evaluate(&config, &south_cover(), &ctx);
        assert_eq!(out.action, PolicyAction::Close);
        assert_eq!(out.reason, DecisionReason::SunShieldClose);
    }

    #[test]
    fn everything_unknown_maintains() {
        let config = AutomationConfig::default();
        let mut ctx = ctx();
        ctx.temp_hot = None;
        ctx.sun = None;
        let out = evaluate(&config, &south_cover(), &ctx);
        assert_eq!(out.action, PolicyAction::Maintain);
        assert_eq!(out.reason, DecisionReason::SensorUnavailable);
    }

    #[test]
    fn sun_only_mode_shields_on_hit() {
        let mut config = AutomationConfig::default();
        config.temperature_policy = false;
        let mut ctx = ctx();
        ctx.temp_hot = None;
        let out = evaluate(&config, &south_cover(), &ctx);
        assert_eq!(out.action, PolicyAction::Close);
        assert_eq!(out.reason, DecisionReason::SunShieldClose);
    }

    #[test]
    fn sun_only_without_azimuth_reports_exclusion() {
        let mut config = AutomationConfig::default();
        config.temperature_policy = false;
        let cover = CoverConfig::new("cover.no_azimuth");
        let out = evaluate(&config, &cover, &ctx());
        assert_eq!(out.action, PolicyAction::Maintain);
        assert_eq!(out.reason, DecisionReason::AzimuthMissing);
    }

    #[test]
    fn no_policies_maintains() {
        let mut config = AutomationConfig::default();
        config.temperature_policy = false;
        config.sun_policy = false;
        let out = evaluate(&config, &south_cover(), &ctx());
        assert_eq!(out.action, PolicyAction::Maintain);
        assert_eq!(out.reason, DecisionReason::Maintain);
    }
}
