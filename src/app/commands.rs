//! Inbound commands to the automation service.
//!
//! These represent actions requested by the outside world (control surface,
//! host automations, config UI) that the
//! [`AutomationService`](super::service::AutomationService) interprets and
//! acts upon. Every command takes effect no later than the next cycle.

use crate::config::{AutomationConfig, CoverConfig};
use crate::lock::LockMode;

/// Commands that external adapters can send into the decision core.
#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// Change the lock mode; applied at the next cycle boundary.
    SetLockMode(LockMode),

    /// Request an out-of-band cycle. Coalesced: at most one extra cycle
    /// runs after the current one completes.
    RefreshNow,

    /// Hot-reload the global configuration. Validated before adoption;
    /// never resets per-cover runtime state.
    UpdateConfig(AutomationConfig),

    /// Replace the cover set. Runtime state of surviving covers is kept.
    UpdateCovers(Vec<CoverConfig>),

    /// Fast-path hint that a cover was just moved by hand, starting the
    /// manual-override cooldown without waiting for the next detection.
    ManualMoveHint { cover: String },
}
