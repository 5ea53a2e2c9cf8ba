//! Position resolver: turns a desired position into a final position and an
//! optional device command.
//!
//! Applied in order after the combiner (or a lock-mode override) produced a
//! desired position:
//!
//! 1. lockout protection — an open window sensor suppresses closing moves
//! 2. clamp into the cover's effective min/max bounds
//! 3. min-delta suppression against chatter
//! 4. command selection for position-capable vs binary devices

use log::debug;

use crate::config::{AutomationConfig, CoverConfig, FULLY_CLOSED, FULLY_OPEN};
use crate::decision::{CoverCapability, CoverCommand, DecisionReason};
use crate::error::{Error, Result};

/// Input to one resolution step.
#[derive(Debug, Clone, Copy)]
pub struct ResolveRequest {
    /// Position reported by the device this cycle.
    pub current: u8,
    /// Desired position before clamping.
    pub desired: u8,
    /// Reason the desired position was chosen.
    pub reason: DecisionReason,
    pub capability: CoverCapability,
    /// Any lockout window sensor associated with the cover reports open.
    pub lockout_open: bool,
    /// Lock-mode target: bypasses lockout protection and min-delta
    /// suppression, moving whenever not already at the target.
    pub forced: bool,
}

/// Outcome of a resolution step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Final position after the full chain.
    pub target: u8,
    /// Command to issue, `None` for a no-op cycle.
    pub command: Option<CoverCommand>,
    pub reason: DecisionReason,
}

/// Resolve a desired position against lockout, bounds, and delta rules.
///
/// Returns an invariant error when the cover's effective bounds are
/// inverted — configuration validation prevents this, so hitting it means
/// engine state is corrupt and the cycle must be abandoned.
pub fn resolve(
    config: &AutomationConfig,
    cover: &CoverConfig,
    request: ResolveRequest,
) -> Result<Resolution> {
    let (min, max) = cover.effective_bounds(config);
    if min > max || max > FULLY_OPEN {
        return Err(Error::Invariant("inverted effective position bounds"));
    }

    // Lockout protection: never close over an open window/door. Lock-mode
    // targets bypass this (forced closure wins over an open sensor).
    if !request.forced && request.lockout_open && request.desired < request.current {
        debug!(
            "[{}] closing move {} -> {} blocked by open lockout sensor",
            cover.id, request.current, request.desired
        );
        return Ok(Resolution {
            target: request.current,
            command: None,
            reason: DecisionReason::LockoutBlockedClose,
        });
    }

    let clamped = request.desired.clamp(min, max);

    if clamped == request.current {
        return Ok(Resolution {
            target: request.current,
            command: None,
            reason: request.reason,
        });
    }

    let delta = request.current.abs_diff(clamped);
    if !request.forced && delta < config.min_position_delta {
        debug!(
            "[{}] suppressing minor adjustment {} -> {} (delta {} < {})",
            cover.id, request.current, clamped, delta, config.min_position_delta
        );
        return Ok(Resolution {
            target: request.current,
            command: None,
            reason: DecisionReason::NoChangeBelowDelta,
        });
    }

    let (target, command) = match request.capability {
        CoverCapability::PositionCapable => (clamped, CoverCommand::SetPosition(clamped)),
        CoverCapability::BinaryOnly => nearest_endpoint(clamped),
    };

    if target == request.current {
        // Binary cover already sitting at the nearer endpoint.
        return Ok(Resolution {
            target,
            command: None,
            reason: request.reason,
        });
    }

    Ok(Resolution {
        target,
        command: Some(command),
        reason: request.reason,
    })
}

/// Pick the endpoint nearer to `desired` for an open/close-only device.
fn nearest_endpoint(desired: u8) -> (u8, CoverCommand) {
    if FULLY_OPEN - desired <= desired - FULLY_CLOSED {
        (FULLY_OPEN, CoverCommand::Open)
    } else {
        (FULLY_CLOSED, CoverCommand::Close)
    }
}
