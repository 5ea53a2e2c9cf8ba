//! Lock-mode state machine.
//!
//! An operator-forced override that bypasses normal policy evaluation:
//!
//! ```text
//!            ┌──────────────┐
//!   ┌───────▶│   Unlocked   │◀───────┐
//!   │        └──────┬───────┘        │
//!   │    request(mode)│              │ request(Unlocked)
//!   │                ▼               │
//!   │  HoldPosition · ForceOpen · ForceClose
//!   └────────(any → any, staged)─────┘
//! ```
//!
//! Transitions are externally requested and take effect at the start of the
//! next cycle; there is no automatic timeout. While not `Unlocked`, the
//! forced target is re-evaluated every cycle so a manually moved cover is
//! corrected back on the next tick.

use log::info;
use serde::{Deserialize, Serialize};

use crate::config::{FULLY_CLOSED, FULLY_OPEN};
use crate::decision::DecisionReason;

/// Operator lock modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockMode {
    /// Normal policy evaluation (initial state).
    Unlocked,
    /// Freeze every cover at its current position.
    HoldPosition,
    /// Drive every cover fully open.
    ForceOpen,
    /// Drive every cover fully closed.
    ForceClose,
}

impl LockMode {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unlocked => "unlocked",
            Self::HoldPosition => "hold_position",
            Self::ForceOpen => "force_open",
            Self::ForceClose => "force_close",
        }
    }
}

impl core::fmt::Display for LockMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Target a lock mode forces on every cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForcedTarget {
    /// Position the cover must sit at (pre-clamp).
    pub position: u8,
    pub reason: DecisionReason,
}

/// Tracks the active lock mode and stages requested transitions.
///
/// Requests are staged and applied at the start of the next cycle so that a
/// cycle in flight never observes a mode change mid-run.
#[derive(Debug)]
pub struct LockController {
    current: LockMode,
    pending: Option<LockMode>,
}

impl LockController {
    pub fn new() -> Self {
        Self {
            current: LockMode::Unlocked,
            pending: None,
        }
    }

    /// Stage a mode change for the next cycle.
    pub fn request(&mut self, mode: LockMode) {
        if mode != self.current {
            info!("lock mode requested: {} -> {}", self.current, mode);
        }
        self.pending = Some(mode);
    }

    /// Apply a staged transition. Called once at the start of each cycle.
    pub fn apply_pending(&mut self) -> LockMode {
        if let Some(next) = self.pending.take() {
            if next != self.current {
                info!("lock mode transition: {} -> {}", self.current, next);
                self.current = next;
            }
        }
        self.current
    }

    /// The mode in effect for the current cycle.
    pub fn current(&self) -> LockMode {
        self.current
    }

    /// Forced target for a cover at `current_pos`, `None` when unlocked.
    pub fn forced_target(&self, current_pos: u8) -> Option<ForcedTarget> {
        match self.current {
            LockMode::Unlocked => None,
            LockMode::HoldPosition => Some(ForcedTarget {
                position: current_pos,
                reason: DecisionReason::LockedHold,
            }),
            LockMode::ForceOpen => Some(ForcedTarget {
                position: FULLY_OPEN,
                reason: DecisionReason::LockedForceOpen,
            }),
            LockMode::ForceClose => Some(ForcedTarget {
                position: FULLY_CLOSED,
                reason: DecisionReason::LockedForceClose,
            }),
        }
    }
}

impl Default for LockController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unlocked() {
        let lock = LockController::new();
        assert_eq!(lock.current(), LockMode::Unlocked);
        assert_eq!(lock.forced_target(40), None);
    }

    #[test]
    fn request_takes_effect_on_next_cycle_only() {
        let mut lock = LockController::new();
        lock.request(LockMode::ForceOpen);
        // Still unlocked until the next cycle boundary.
        assert_eq!(lock.current(), LockMode::Unlocked);
        assert_eq!(lock.apply_pending(), LockMode::ForceOpen);
        assert_eq!(lock.current(), LockMode::ForceOpen);
    }

    #[test]
    fn hold_targets_current_position() {
        let mut lock = LockController::new();
        lock.request(LockMode::HoldPosition);
        lock.apply_pending();
        let forced = lock.forced_target(37).unwrap();
        assert_eq!(forced.position, 37);
        assert_eq!(forced.reason, DecisionReason::LockedHold);
    }

    #[test]
    fn force_open_and_close_target_endpoints() {
        let mut lock = LockController::new();
        lock.request(LockMode::ForceOpen);
        lock.apply_pending();
        assert_eq!(lock.forced_target(10).unwrap().position, FULLY_OPEN);

        lock.request(LockMode::ForceClose);
        lock.apply_pending();
        assert_eq!(lock.forced_target(90).unwrap().position, FULLY_CLOSED);
    }

    #[test]
    fn unlock_is_manual_only() {
        let mut lock = LockController::new();
        lock.request(LockMode::ForceClose);
        lock.apply_pending();
        // Many cycles pass; no automatic timeout.
        for _ in 0..100 {
            assert_eq!(lock.apply_pending(), LockMode::ForceClose);
        }
        lock.request(LockMode::Unlocked);
        assert_eq!(lock.apply_pending(), LockMode::Unlocked);
    }

    #[test]
    fn latest_request_wins_within_a_cycle() {
        let mut lock = LockController::new();
        lock.request(LockMode::ForceOpen);
        lock.request(LockMode::HoldPosition);
        assert_eq!(lock.apply_pending(), LockMode::HoldPosition);
    }
}
