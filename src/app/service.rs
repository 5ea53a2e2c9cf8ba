//! Automation service — the hexagonal core.
//!
//! [`AutomationService`] owns the lock controller, thermal latch, and
//! per-cover runtime state. It exposes a clean, host-agnostic API. All I/O
//! flows through port traits injected at call sites, making the entire
//! service testable with mock adapters.
//!
//! ```text
//!  CoverPort ───▶ ┌──────────────────────────────┐ ───▶ DecisionSink
//!  EnvironmentPort│      AutomationService       │
//!  LockoutPort ──▶│  Gate · Lock · Policy ·      │
//!  Clock ────────▶│  Override · Resolver         │
//!  CoverPort ◀─── └──────────────────────────────┘
//! ```
//!
//! One cycle runs to completion before the next is triggered by the host's
//! fixed-interval timer; no cover's decision suspends waiting on another.

use std::collections::{HashMap, HashSet};

use log::{debug, error, info, warn};

use crate::config::{
    validate_covers, AutomationConfig, CoverConfig, FULLY_CLOSED, FULLY_OPEN,
};
use crate::decision::{CoverCapability, Decision, DecisionReason};
use crate::error::Result;
use crate::gate::{self, GateState};
use crate::history::CoverRuntime;
use crate::lock::{LockController, LockMode};
use crate::policy::{self, PolicyAction};
use crate::resolver::{self, ResolveRequest};
use crate::snapshot::{CycleContext, ThermalLatch};

use super::commands::EngineCommand;
use super::events::CycleSummary;
use super::ports::{Clock, CoverPort, CoverState, DecisionSink, EnvironmentPort, LockoutPort};

// ───────────────────────────────────────────────────────────────
// AutomationService
// ───────────────────────────────────────────────────────────────

/// The automation service orchestrates all decision logic.
pub struct AutomationService {
    config: AutomationConfig,
    covers: Vec<CoverConfig>,
    lock: LockController,
    latch: ThermalLatch,
    /// Engine-owned per-cover state. Never reset by configuration reloads.
    runtime: HashMap<String, CoverRuntime>,
    /// Covers flagged by a manual-move hint, consumed next cycle.
    pending_hints: HashSet<String>,
    cycle_count: u64,
    refresh_pending: bool,
}

impl AutomationService {
    /// Construct the service. Configuration problems are surfaced here,
    /// once, before the first cycle runs.
    pub fn new(config: AutomationConfig, covers: Vec<CoverConfig>) -> Result<Self> {
        config.validate()?;
        validate_covers(&covers, &config)?;
        warn_azimuth_exclusions(&covers);
        Ok(Self {
            config,
            covers,
            lock: LockController::new(),
            latch: ThermalLatch::new(),
            runtime: HashMap::new(),
            pending_hints: HashSet::new(),
            cycle_count: 0,
            refresh_pending: false,
        })
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// Run one full cycle: snapshot → lock staging → gate → per-cover
    /// decisions → summary.
    ///
    /// A single cover's port failure is logged and isolated; an invariant
    /// violation aborts this cycle only, and the next scheduled cycle
    /// proceeds normally.
    pub fn run_cycle(
        &mut self,
        covers_port: &mut impl CoverPort,
        env: &mut impl EnvironmentPort,
        lockouts: &mut impl LockoutPort,
        clock: &impl Clock,
        sink: &mut impl DecisionSink,
    ) -> Result<CycleSummary> {
        self.cycle_count += 1;
        let mode = self.lock.apply_pending();
        let ctx = CycleContext::capture(&self.config, env, clock, &mut self.latch);
        let gate = gate::evaluate(&self.config, &ctx);
        let hints = std::mem::take(&mut self.pending_hints);

        debug!(
            "cycle {} starting: lock={mode} hot={:?} sunny={:?} elevation={:?}",
            self.cycle_count,
            ctx.temp_hot,
            ctx.weather_sunny,
            ctx.sun.map(|s| s.elevation)
        );

        // Gather all device reads up front so within-cycle decisions stay
        // consistent even if sensors update mid-cycle.
        let states = read_cover_states(&self.covers, covers_port);
        let lockout_open = read_lockout_sensors(&self.covers, lockouts);

        let mut moved = 0usize;
        let mut skipped = 0usize;

        for (cover, state) in self.covers.iter().zip(&states) {
            let runtime = self.runtime.entry(cover.id.clone()).or_default();
            let decision = process_cover(
                &self.config,
                &self.lock,
                gate,
                &ctx,
                hints.contains(&cover.id),
                cover,
                *state,
                runtime,
                &lockout_open,
                covers_port,
            )?;

            if decision.moved {
                moved += 1;
            }
            if is_skip(decision.reason) {
                skipped += 1;
            }
            sink.decision(&decision);
        }

        let summary = CycleSummary {
            cycle: self.cycle_count,
            lock_mode: mode,
            covers_total: self.covers.len(),
            covers_moved: moved,
            covers_skipped: skipped,
            sun_elevation: ctx.sun.map(|s| s.elevation),
            sun_azimuth: ctx.sun.map(|s| s.azimuth),
            forecast_max: ctx.forecast_max,
            temp_hot: ctx.temp_hot,
            weather_sunny: ctx.weather_sunny,
            automation_disabled: gate.automation_disabled,
        };
        info!(
            "cycle {} complete: {}/{} covers moved, {} skipped",
            summary.cycle, summary.covers_moved, summary.covers_total, summary.covers_skipped
        );
        sink.cycle_completed(&summary);
        Ok(summary)
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command (control surface, host automation).
    pub fn handle_command(&mut self, command: EngineCommand) -> Result<()> {
        match command {
            EngineCommand::SetLockMode(mode) => {
                self.lock.request(mode);
                self.refresh_pending = true;
            }
            EngineCommand::RefreshNow => {
                self.refresh_pending = true;
            }
            EngineCommand::UpdateConfig(config) => {
                config.validate()?;
                validate_covers(&self.covers, &config)?;
                self.config = config;
                info!("configuration updated at runtime");
            }
            EngineCommand::UpdateCovers(covers) => {
                validate_covers(&covers, &self.config)?;
                warn_azimuth_exclusions(&covers);
                self.covers = covers;
                info!("cover set updated at runtime ({} covers)", self.covers.len());
            }
            EngineCommand::ManualMoveHint { cover } => {
                if self.covers.iter().any(|c| c.id == cover) {
                    self.pending_hints.insert(cover);
                } else {
                    warn!("manual-move hint for unknown cover '{cover}'");
                }
            }
        }
        Ok(())
    }

    /// Whether an out-of-band cycle was requested. Clears the flag; the
    /// host runs at most one extra cycle per request burst.
    pub fn take_refresh_request(&mut self) -> bool {
        std::mem::take(&mut self.refresh_pending)
    }

    // ── Queries ───────────────────────────────────────────────

    /// Lock mode currently in effect (staged requests not yet applied).
    pub fn lock_mode(&self) -> LockMode {
        self.lock.current()
    }

    /// Total cycles executed since startup.
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    /// Live configuration.
    pub fn config(&self) -> &AutomationConfig {
        &self.config
    }

    /// Engine-owned runtime state for one cover, if it was ever evaluated.
    pub fn cover_runtime(&self, id: &str) -> Option<&CoverRuntime> {
        self.runtime.get(id)
    }
}

// ───────────────────────────────────────────────────────────────
// Cycle internals
// ───────────────────────────────────────────────────────────────

/// Surface azimuth problems once at load; the affected covers simply run
/// without the sun policy.
fn warn_azimuth_exclusions(covers: &[CoverConfig]) {
    for cover in covers {
        if cover.azimuth.is_some() && cover.effective_azimuth().is_none() {
            warn!(
                "[{}] azimuth outside [0, 360), cover excluded from the sun policy",
                cover.id
            );
        }
    }
}

fn read_cover_states(
    covers: &[CoverConfig],
    port: &mut impl CoverPort,
) -> Vec<Option<CoverState>> {
    covers
        .iter()
        .map(|cover| match port.read_state(&cover.id) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!("[{}] cover state unavailable: {e}", cover.id);
                None
            }
        })
        .collect()
}

fn read_lockout_sensors(
    covers: &[CoverConfig],
    port: &mut impl LockoutPort,
) -> HashMap<String, bool> {
    let mut readings = HashMap::new();
    for cover in covers {
        for sensor in &cover.lockout_sensors {
            if readings.contains_key(sensor) {
                continue;
            }
            let open = match port.is_open(sensor) {
                Ok(open) => open,
                Err(e) => {
                    // Unknown reading counts as closed.
                    warn!("lockout sensor '{sensor}' unavailable: {e}; assuming closed");
                    false
                }
            };
            readings.insert(sensor.clone(), open);
        }
    }
    readings
}

/// Decide and (when needed) command a single cover.
#[allow(clippy::too_many_arguments)]
fn process_cover(
    config: &AutomationConfig,
    lock: &LockController,
    gate: GateState,
    ctx: &CycleContext,
    hinted: bool,
    cover: &CoverConfig,
    state: Option<CoverState>,
    runtime: &mut CoverRuntime,
    lockout_open: &HashMap<String, bool>,
    port: &mut impl CoverPort,
) -> Result<Decision> {
    let Some(state) = state else {
        return Ok(Decision::skip(&cover.id, None, DecisionReason::CoverUnavailable));
    };

    let current = match state.position {
        Some(p) if p <= FULLY_OPEN => p,
        Some(p) => {
            warn!("[{}] reported position {p} out of range, skipping", cover.id);
            return Ok(Decision::skip(
                &cover.id,
                None,
                DecisionReason::SensorUnavailable,
            ));
        }
        // No numeric position reported: assume fully open.
        None => FULLY_OPEN,
    };

    // Never interrupt in-flight motion, whatever the lock mode.
    if state.moving {
        debug!("[{}] currently moving, skipping", cover.id);
        return Ok(Decision::skip(
            &cover.id,
            Some(current),
            DecisionReason::CoverMoving,
        ));
    }

    let capability = if state.supports_position {
        CoverCapability::PositionCapable
    } else {
        CoverCapability::BinaryOnly
    };
    let any_lockout_open = cover
        .lockout_sensors
        .iter()
        .any(|s| lockout_open.get(s).copied().unwrap_or(false));

    // Lock-mode enforcement bypasses the policy combiner entirely and
    // takes precedence over the manual-override cooldown.
    if let Some(forced) = lock.forced_target(current) {
        runtime.lock_forced = true;
        if forced.position == current {
            runtime.record_observed(current, ctx.now);
            let mut decision = Decision::skip(&cover.id, Some(current), forced.reason);
            decision.desired = Some(forced.position);
            decision.position_history = runtime.log.positions().collect();
            return Ok(decision);
        }
        let resolution = resolver::resolve(
            config,
            cover,
            ResolveRequest {
                current,
                desired: forced.position,
                reason: forced.reason,
                capability,
                lockout_open: any_lockout_open,
                forced: true,
            },
        )?;
        return Ok(issue(
            port,
            cover,
            runtime,
            ctx,
            current,
            Some(forced.position),
            None,
            resolution,
        ));
    }

    runtime.lock_forced = false;

    // Disabled time range: automation fully suppressed for this cycle.
    if gate.automation_disabled {
        return Ok(Decision::skip(
            &cover.id,
            Some(current),
            DecisionReason::TimeRangeDisabled,
        ));
    }

    // Manual-override tracking: a position that drifted from the engine's
    // last record, with no automation move since, was a human.
    if hinted {
        info!("[{}] manual move hinted, starting cooldown", cover.id);
        runtime.note_manual_move(current, ctx.now, config.manual_override_cooldown_secs);
    } else if runtime.manual_move_detected(current) {
        info!(
            "[{}] manual move detected (position changed externally to {current}%)",
            cover.id
        );
        runtime.note_manual_move(current, ctx.now, config.manual_override_cooldown_secs);
    }
    if runtime.override_active(ctx.now) {
        debug!(
            "[{}] manual override active for another {} s, skipping",
            cover.id,
            runtime.override_remaining_secs(ctx.now)
        );
        let mut decision = Decision::skip(&cover.id, Some(current), DecisionReason::ManualOverrideSkip);
        decision.position_history = runtime.log.positions().collect();
        return Ok(decision);
    }

    // Policy combiner.
    let outcome = policy::evaluate(config, cover, ctx);
    let mut desired = match outcome.action {
        PolicyAction::Close => FULLY_CLOSED,
        PolicyAction::Open => FULLY_OPEN,
        PolicyAction::Maintain => current,
    };
    let mut reason = outcome.reason;

    // Evening closure: one forced close per activation window, idempotent.
    if gate.evening_window
        && cover.evening_closure
        && runtime.evening_closed_on != Some(ctx.today)
    {
        info!("[{}] evening closure window active, closing", cover.id);
        runtime.evening_closed_on = Some(ctx.today);
        desired = FULLY_CLOSED;
        reason = DecisionReason::EveningClosure;
    }

    // Night-opening block: closing protection stays allowed, opening waits
    // for daylight.
    if gate.night_block && desired > current {
        debug!("[{}] opening blocked at night", cover.id);
        runtime.record_observed(current, ctx.now);
        let mut decision = Decision::skip(&cover.id, Some(current), DecisionReason::NightBlockedOpen);
        decision.desired = Some(desired);
        decision.azimuth_difference = outcome.azimuth_difference;
        decision.position_history = runtime.log.positions().collect();
        return Ok(decision);
    }

    let resolution = resolver::resolve(
        config,
        cover,
        ResolveRequest {
            current,
            desired,
            reason,
            capability,
            lockout_open: any_lockout_open,
            forced: false,
        },
    )?;
    Ok(issue(
        port,
        cover,
        runtime,
        ctx,
        current,
        Some(desired),
        outcome.azimuth_difference,
        resolution,
    ))
}

/// Issue the resolved command (if any) and record runtime state.
/// A failed command leaves runtime state untouched so the move is retried
/// naturally on the next cycle.
#[allow(clippy::too_many_arguments)]
fn issue(
    port: &mut impl CoverPort,
    cover: &CoverConfig,
    runtime: &mut CoverRuntime,
    ctx: &CycleContext,
    current: u8,
    desired: Option<u8>,
    azimuth_difference: Option<f64>,
    resolution: resolver::Resolution,
) -> Decision {
    let mut decision = Decision {
        cover: cover.id.clone(),
        current: Some(current),
        desired,
        target: Some(resolution.target),
        command: resolution.command,
        moved: false,
        reason: resolution.reason,
        azimuth_difference,
        position_history: Vec::new(),
    };

    match resolution.command {
        Some(command) => match port.issue_command(&cover.id, command) {
            Ok(()) => {
                info!(
                    "[{}] moved {} -> {} ({})",
                    cover.id, current, resolution.target, resolution.reason
                );
                runtime.record_auto_move(resolution.target, ctx.now);
                decision.moved = true;
            }
            Err(e) => {
                error!("[{}] failed to control cover: {e}", cover.id);
                decision.reason = DecisionReason::CommandFailed;
                decision.target = Some(current);
            }
        },
        None => {
            runtime.record_observed(current, ctx.now);
        }
    }

    decision.position_history = runtime.log.positions().collect();
    decision
}

const fn is_skip(reason: DecisionReason) -> bool {
    matches!(
        reason,
        DecisionReason::CoverMoving
            | DecisionReason::CoverUnavailable
            | DecisionReason::ManualOverrideSkip
            | DecisionReason::TimeRangeDisabled
            | DecisionReason::SensorUnavailable
    )
}
