//! Per-cover runtime state: position history and manual-override tracking.
//!
//! The engine keeps a small newest-first ring of positions it has recorded
//! for each cover. A reported position that differs from the last recorded
//! one, with no automation move in between, is attributed to a human and
//! starts the manual-override cooldown.
//!
//! This state is owned exclusively by the orchestrator and survives
//! configuration reloads untouched.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use heapless::Deque;

/// Ring capacity of the per-cover position history.
pub const POSITION_HISTORY_SIZE: usize = 5;

/// One recorded position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionRecord {
    pub position: u8,
    /// Whether the engine actually moved the cover in that cycle.
    pub moved: bool,
    pub at: DateTime<Utc>,
}

/// Fixed-capacity newest-first position ring for one cover.
#[derive(Debug, Default)]
pub struct PositionLog {
    entries: Deque<PositionRecord, POSITION_HISTORY_SIZE>,
}

impl PositionLog {
    pub fn new() -> Self {
        Self {
            entries: Deque::new(),
        }
    }

    /// Record a position, evicting the oldest entry when full.
    pub fn push(&mut self, position: u8, moved: bool, at: DateTime<Utc>) {
        if self.entries.is_full() {
            self.entries.pop_back();
        }
        // Cannot fail: an element was just evicted if the ring was full.
        let _ = self.entries.push_front(PositionRecord {
            position,
            moved,
            at,
        });
    }

    /// Most recent record, if any.
    pub fn newest(&self) -> Option<&PositionRecord> {
        self.entries.front()
    }

    /// Recorded positions, newest first.
    pub fn positions(&self) -> impl Iterator<Item = u8> + '_ {
        self.entries.iter().map(|e| e.position)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Engine-owned state for one cover, persisting across cycles.
#[derive(Debug, Default)]
pub struct CoverRuntime {
    /// Last position the engine recorded (commanded or observed).
    pub last_position: Option<u8>,
    /// When the engine last issued a move for this cover.
    pub last_auto_move_at: Option<DateTime<Utc>>,
    /// When a manual move was last detected.
    pub last_manual_at: Option<DateTime<Utc>>,
    /// Automation suppressed until this instant (`None` = not skipping).
    pub skip_until: Option<DateTime<Utc>>,
    /// The cover's position is currently dictated by a lock mode.
    pub lock_forced: bool,
    /// Date the evening closure last fired for this cover.
    pub evening_closed_on: Option<NaiveDate>,
    /// Recent positions, newest first.
    pub log: PositionLog,
}

impl CoverRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// The reported position differs from the engine's last record:
    /// somebody moved the cover behind the engine's back.
    pub fn manual_move_detected(&self, reported: u8) -> bool {
        matches!(self.last_position, Some(p) if p != reported)
    }

    /// Register a detected manual move and start the cooldown.
    /// A zero cooldown records the move but never skips.
    pub fn note_manual_move(&mut self, position: u8, now: DateTime<Utc>, cooldown_secs: u32) {
        self.last_manual_at = Some(now);
        if cooldown_secs > 0 {
            self.skip_until = Some(now + Duration::seconds(i64::from(cooldown_secs)));
        }
        self.last_position = Some(position);
        self.log.push(position, false, now);
    }

    /// Whether the manual-override cooldown is active.
    pub fn override_active(&self, now: DateTime<Utc>) -> bool {
        matches!(self.skip_until, Some(until) if now < until)
    }

    /// Seconds of cooldown remaining at `now`, zero when inactive.
    pub fn override_remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        self.skip_until
            .map_or(0, |until| (until - now).num_seconds().max(0))
    }

    /// Record a successful automation move. Clears any manual-override
    /// skip for this cover.
    pub fn record_auto_move(&mut self, position: u8, at: DateTime<Utc>) {
        self.last_position = Some(position);
        self.last_auto_move_at = Some(at);
        self.skip_until = None;
        self.log.push(position, true, at);
    }

    /// Record the observed position of a cycle that issued no move.
    pub fn record_observed(&mut self, position: u8, at: DateTime<Utc>) {
        self.last_position = Some(position);
        self.log.push(position, false, at);
    }
}
