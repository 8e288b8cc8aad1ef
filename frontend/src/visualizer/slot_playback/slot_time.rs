//! Slot time domain: conversions between wall-clock time and slot progress
//!
//! Slot progress is plain `i64` milliseconds relative to the slot start so
//! that early (negative) and late (past the slot end) observations survive.

use shared::SlotNumber;
use shared::config::ChainSection;
use std::fmt;

pub const MS_PER_SECOND: f64 = 1_000.0;

/// Maps wall-clock milliseconds onto the slot grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotSchedule {
    pub genesis_time_ms: i64,
    pub slot_duration_ms: i64,
}

impl SlotSchedule {
    pub fn new(genesis_time_ms: i64, slot_duration_ms: i64) -> Self {
        Self {
            genesis_time_ms,
            slot_duration_ms: slot_duration_ms.max(1),
        }
    }

    pub fn from_chain(chain: &ChainSection) -> Self {
        Self::new(chain.genesis_time_ms, chain.slot_duration_ms)
    }

    pub fn slot_start_ms(&self, slot: SlotNumber) -> i64 {
        let offset = (slot as i64).saturating_mul(self.slot_duration_ms);
        self.genesis_time_ms.saturating_add(offset)
    }

    /// Slot containing `now_ms`; slot 0 before genesis.
    pub fn slot_at(&self, now_ms: i64) -> SlotNumber {
        let since_genesis = now_ms.saturating_sub(self.genesis_time_ms);
        if since_genesis <= 0 {
            return 0;
        }
        (since_genesis / self.slot_duration_ms) as SlotNumber
    }

    /// Elapsed milliseconds since `slot` started, negative if it has not.
    pub fn offset_in_slot(&self, slot: SlotNumber, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.slot_start_ms(slot))
    }

    pub fn clamp_progress(&self, progress_ms: i64) -> i64 {
        progress_ms.clamp(0, self.slot_duration_ms)
    }
}

/// The three consensus duties of a slot, each owning a third of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotPhase {
    BlockProposal,
    Attestation,
    Aggregation,
}

impl SlotPhase {
    pub fn at(progress_ms: i64, slot_duration_ms: i64) -> Self {
        let third = (slot_duration_ms / 3).max(1);
        match progress_ms {
            ms if ms < third => SlotPhase::BlockProposal,
            ms if ms < third * 2 => SlotPhase::Attestation,
            _ => SlotPhase::Aggregation,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SlotPhase::BlockProposal => "Block proposal",
            SlotPhase::Attestation => "Attestation",
            SlotPhase::Aggregation => "Aggregation",
        }
    }
}

impl fmt::Display for SlotPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Display wrapper for slot progress, e.g. `4.250s` or `-120ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SlotProgress(pub i64);

impl fmt::Display for SlotProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.abs() >= 1_000 {
            write!(f, "{:.3}s", self.0 as f64 / MS_PER_SECOND)
        } else {
            write!(f, "{}ms", self.0)
        }
    }
}
