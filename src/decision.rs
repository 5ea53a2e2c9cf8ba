//! Per-cover decision records produced by each cycle.
//!
//! A [`Decision`] is the engine's externally visible verdict for one cover:
//! what it wanted, what it settled on after policy resolution, whether a
//! command went out, and a reason tag suitable for activity-log reporting.

use serde::Serialize;

/// Whether the device accepts arbitrary positions or only open/close.
/// Selected once per cover from the device-read capability and dispatched
/// explicitly in the command-issuing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CoverCapability {
    PositionCapable,
    BinaryOnly,
}

/// Command issued to a cover device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CoverCommand {
    /// Move to an absolute position (0 = closed, 100 = open).
    SetPosition(u8),
    Open,
    Close,
}

/// Why the engine settled on a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecisionReason {
    /// Heat protection: hot forecast and sun hitting the window.
    HeatProtectionClose,
    /// Sun shielding without temperature confirmation (sun-only policy).
    SunShieldClose,
    /// Conditions call for letting light in.
    LetLightIn,
    /// Policies agreed to keep the current position.
    Maintain,
    /// Forced close within the evening-closure window.
    EveningClosure,
    /// Lock mode holds the current position.
    LockedHold,
    /// Lock mode forces fully open.
    LockedForceOpen,
    /// Lock mode forces fully closed.
    LockedForceClose,
    /// Cover suppressed by the manual-override cooldown.
    ManualOverrideSkip,
    /// Automation suppressed by the disabled time range.
    TimeRangeDisabled,
    /// Closing move blocked by an open lockout window sensor.
    LockoutBlockedClose,
    /// Opening move blocked while the sun is below the horizon.
    NightBlockedOpen,
    /// Change smaller than the configured minimum delta.
    NoChangeBelowDelta,
    /// Device reported in motion; never interrupted.
    CoverMoving,
    /// Device state could not be read.
    CoverUnavailable,
    /// A sensor the policy depends on was unavailable.
    SensorUnavailable,
    /// Cover excluded from the sun policy: no valid azimuth.
    AzimuthMissing,
    /// The move command failed; retried next cycle.
    CommandFailed,
}

impl DecisionReason {
    /// Stable kebab-case tag for logs and activity reporting.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HeatProtectionClose => "heat-protection-close",
            Self::SunShieldClose => "sun-shield-close",
            Self::LetLightIn => "let-light-in",
            Self::Maintain => "maintain",
            Self::EveningClosure => "evening-closure",
            Self::LockedHold => "locked-hold",
            Self::LockedForceOpen => "locked-force-open",
            Self::LockedForceClose => "locked-force-close",
            Self::ManualOverrideSkip => "manual-override-skip",
            Self::TimeRangeDisabled => "time-range-disabled",
            Self::LockoutBlockedClose => "lockout-blocked-close",
            Self::NightBlockedOpen => "night-blocked-open",
            Self::NoChangeBelowDelta => "no-change-below-delta",
            Self::CoverMoving => "cover-moving",
            Self::CoverUnavailable => "cover-unavailable",
            Self::SensorUnavailable => "sensor-unavailable",
            Self::AzimuthMissing => "azimuth-missing",
            Self::CommandFailed => "command-failed",
        }
    }
}

impl core::fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The engine's verdict for one cover in one cycle.
#[derive(Debug, Clone, Serialize)]
pub struct Decision {
    /// Cover entity identifier.
    pub cover: String,
    /// Position reported by the device at evaluation time, when readable.
    pub current: Option<u8>,
    /// Desired position before clamping, when a policy produced one.
    pub desired: Option<u8>,
    /// Final position after the full policy chain.
    pub target: Option<u8>,
    /// Command issued this cycle, if any.
    pub command: Option<CoverCommand>,
    /// Whether a move was actually issued.
    pub moved: bool,
    /// Reason tag for this outcome.
    pub reason: DecisionReason,
    /// Sun/cover azimuth difference evaluated this cycle, if applicable.
    pub azimuth_difference: Option<f64>,
    /// Recent engine-recorded positions, newest first.
    pub position_history: Vec<u8>,
}

impl Decision {
    /// A no-op decision that keeps the reported position.
    pub fn skip(cover: &str, current: Option<u8>, reason: DecisionReason) -> Self {
        Self {
            cover: cover.to_owned(),
            current,
            desired: None,
            target: current,
            command: None,
            moved: false,
            reason,
            azimuth_difference: None,
            position_history: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_tags_are_kebab_case() {
        assert_eq!(
            DecisionReason::ManualOverrideSkip.as_str(),
            "manual-override-skip"
        );
        assert_eq!(
            DecisionReason::LockedForceOpen.to_string(),
            "locked-force-open"
        );
        assert_eq!(
            DecisionReason::NoChangeBelowDelta.as_str(),
            "no-change-below-delta"
        );
    }

    #[test]
    fn skip_keeps_current_position() {
        let d = Decision::skip("cover.kitchen", Some(40), DecisionReason::CoverMoving);
        assert_eq!(d.target, Some(40));
        assert!(!d.moved);
        assert!(d.command.is_none());
    }

    #[test]
    fn decision_serializes_with_kebab_reason() {
        let d = Decision::skip("cover.kitchen", Some(40), DecisionReason::TimeRangeDisabled);
        let json = serde_json::to_string(&d).unwrap();
        assert!(json.contains("\"time-range-disabled\""));
    }
}
