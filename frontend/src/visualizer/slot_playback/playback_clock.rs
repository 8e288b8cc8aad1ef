//! Playback clock: the single source of slot progress
//!
//! Static mode replays a fixed historical slot driven by synthetic ticks.
//! Live mode is tethered to the wall clock: progress is the real time elapsed
//! since the viewed slot started, and the slot pointer follows the chain head
//! (optionally a fixed number of slots behind it).

use super::slot_time::{SlotPhase, SlotSchedule};
use serde::{Deserialize, Serialize};
use shared::SlotNumber;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    Static,
    Live,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub slot: SlotNumber,
    pub progress_ms: i64,
    pub is_playing: bool,
    pub mode: PlaybackMode,
}

/// What an operation did to the clock, so the owner knows whether the
/// window coordinator must be reset before the next evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockUpdate {
    Unchanged,
    /// Same slot; progress, play state or mode moved.
    Moved,
    SlotChanged { from: SlotNumber, to: SlotNumber },
}

#[derive(Debug, Clone)]
pub struct PlaybackClock {
    state: PlaybackState,
    schedule: SlotSchedule,
    /// Slots behind the wall-clock head while in live mode.
    live_lag: u64,
}

impl PlaybackClock {
    /// Paused at the start of `slot`.
    pub fn new_static(slot: SlotNumber, schedule: SlotSchedule) -> Self {
        Self {
            state: PlaybackState {
                slot,
                progress_ms: 0,
                is_playing: false,
                mode: PlaybackMode::Static,
            },
            schedule,
            live_lag: 0,
        }
    }

    /// Playing the wall-clock head slot.
    pub fn new_live(schedule: SlotSchedule, now_ms: i64) -> Self {
        let slot = schedule.slot_at(now_ms);
        Self {
            state: PlaybackState {
                slot,
                progress_ms: schedule.clamp_progress(schedule.offset_in_slot(slot, now_ms)),
                is_playing: true,
                mode: PlaybackMode::Live,
            },
            schedule,
            live_lag: 0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn slot(&self) -> SlotNumber {
        self.state.slot
    }

    pub fn progress_ms(&self) -> i64 {
        self.state.progress_ms
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    pub fn mode(&self) -> PlaybackMode {
        self.state.mode
    }

    pub fn schedule(&self) -> SlotSchedule {
        self.schedule
    }

    pub fn phase(&self) -> SlotPhase {
        SlotPhase::at(self.state.progress_ms, self.schedule.slot_duration_ms)
    }

    /// Paused ⇄ Playing. Pausing a live view untethers it from the wall clock;
    /// playing a finished static slot restarts it.
    pub fn toggle(&mut self) -> ClockUpdate {
        let previous = self.state;
        if self.state.is_playing {
            self.state.is_playing = false;
            self.state.mode = PlaybackMode::Static;
        } else {
            if self.state.progress_ms >= self.schedule.slot_duration_ms {
                self.state.progress_ms = 0;
            }
            self.state.is_playing = true;
        }
        self.moved_from(previous)
    }

    /// Advances a playing clock. `slot` is the slot the tick was scheduled
    /// for; ticks for any other slot are stale and ignored.
    pub fn tick(&mut self, slot: SlotNumber, delta_ms: i64, now_ms: i64) -> ClockUpdate {
        if !self.state.is_playing {
            return ClockUpdate::Unchanged;
        }
        if slot != self.state.slot {
            log::debug!("dropping stale tick for slot {slot}, active slot is {}", self.state.slot);
            return ClockUpdate::Unchanged;
        }

        match self.state.mode {
            PlaybackMode::Live => self.sync_live(now_ms),
            PlaybackMode::Static => {
                let previous = self.state;
                let duration = self.schedule.slot_duration_ms;
                self.state.progress_ms = self
                    .schedule
                    .clamp_progress(self.state.progress_ms.saturating_add(delta_ms.max(0)));
                if self.state.progress_ms >= duration {
                    self.state.is_playing = false;
                }
                self.moved_from(previous)
            }
        }
    }

    /// Scrubs to `ms` (clamped to the slot) in any play state. A live view
    /// becomes a static one at the same slot.
    pub fn seek(&mut self, ms: i64) -> ClockUpdate {
        let previous = self.state;
        self.state.progress_ms = self.schedule.clamp_progress(ms);
        self.state.mode = PlaybackMode::Static;
        self.moved_from(previous)
    }

    pub fn previous_slot(&mut self, now_ms: i64) -> ClockUpdate {
        match self.state.mode {
            PlaybackMode::Static => match self.state.slot.checked_sub(1) {
                Some(slot) => self.select_slot(slot),
                None => ClockUpdate::Unchanged,
            },
            PlaybackMode::Live => {
                let head = self.schedule.slot_at(now_ms);
                if self.live_lag >= head {
                    return ClockUpdate::Unchanged;
                }
                self.live_lag += 1;
                self.sync_live(now_ms)
            }
        }
    }

    pub fn next_slot(&mut self, now_ms: i64) -> ClockUpdate {
        match self.state.mode {
            PlaybackMode::Static => match self.state.slot.checked_add(1) {
                Some(slot) => self.select_slot(slot),
                None => ClockUpdate::Unchanged,
            },
            PlaybackMode::Live => {
                if self.live_lag == 0 {
                    return ClockUpdate::Unchanged;
                }
                self.live_lag -= 1;
                self.sync_live(now_ms)
            }
        }
    }

    /// Jumps to the start of `slot` in static mode, keeping the play state.
    pub fn select_slot(&mut self, slot: SlotNumber) -> ClockUpdate {
        let previous = self.state;
        let from = previous.slot;
        self.state.mode = PlaybackMode::Static;
        self.state.slot = slot;
        self.state.progress_ms = 0;
        if from == slot {
            return self.moved_from(previous);
        }
        log::info!("slot playback: slot {from} -> {slot}");
        ClockUpdate::SlotChanged { from, to: slot }
    }

    /// Tethers the clock to the wall-clock head slot and starts playing.
    pub fn go_live(&mut self, now_ms: i64) -> ClockUpdate {
        log::info!("slot playback: switching to live mode");
        let previous = self.state;
        self.state.mode = PlaybackMode::Live;
        self.state.is_playing = true;
        self.live_lag = 0;
        match self.sync_live(now_ms) {
            ClockUpdate::Unchanged => self.moved_from(previous),
            update => update,
        }
    }

    /// Stops following the wall clock; slot, progress and play state stay.
    pub fn go_static(&mut self) -> ClockUpdate {
        if self.state.mode == PlaybackMode::Static {
            return ClockUpdate::Unchanged;
        }
        log::info!("slot playback: switching to static mode");
        self.state.mode = PlaybackMode::Static;
        ClockUpdate::Moved
    }

    fn sync_live(&mut self, now_ms: i64) -> ClockUpdate {
        let previous = self.state;
        let head = self.schedule.slot_at(now_ms);
        let slot = head.saturating_sub(self.live_lag);
        self.state.slot = slot;
        self.state.progress_ms = self
            .schedule
            .clamp_progress(self.schedule.offset_in_slot(slot, now_ms));
        if previous.slot != slot {
            log::info!("slot playback: live slot {} -> {slot}", previous.slot);
            return ClockUpdate::SlotChanged {
                from: previous.slot,
                to: slot,
            };
        }
        self.moved_from(previous)
    }

    fn moved_from(&self, previous: PlaybackState) -> ClockUpdate {
        if previous == self.state {
            ClockUpdate::Unchanged
        } else {
            ClockUpdate::Moved
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_serializes_for_the_view_layer() {
        let clock = PlaybackClock::new_static(9, schedule());
        let json = serde_json::to_value(clock.state()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "slot": 9, "progress_ms": 0, "is_playing": false, "mode": "static" })
        );
    }

    const GENESIS: i64 = 1_000_000;

    fn schedule() -> SlotSchedule {
        SlotSchedule::new(GENESIS, 12_000)
    }

    fn at(slot: SlotNumber, offset_ms: i64) -> i64 {
        schedule().slot_start_ms(slot) + offset_ms
    }

    #[test]
    fn ticks_only_advance_while_playing() {
        let mut clock = PlaybackClock::new_static(10, schedule());
        assert_eq!(clock.tick(10, 100, 0), ClockUpdate::Unchanged);
        assert_eq!(clock.progress_ms(), 0);

        clock.toggle();
        assert_eq!(clock.tick(10, 100, 0), ClockUpdate::Moved);
        assert_eq!(clock.tick(10, 100, 0), ClockUpdate::Moved);
        assert_eq!(clock.progress_ms(), 200);
    }

    #[test]
    fn static_playback_stops_at_slot_end() {
        let mut clock = PlaybackClock::new_static(10, schedule());
        clock.seek(11_950);
        clock.toggle();
        clock.tick(10, 100, 0);
        assert_eq!(clock.progress_ms(), 12_000);
        assert!(!clock.is_playing());
        assert_eq!(clock.tick(10, 100, 0), ClockUpdate::Unchanged);

        clock.toggle();
        assert_eq!(clock.progress_ms(), 0);
        assert!(clock.is_playing());
    }

    #[test]
    fn stale_ticks_are_dropped() {
        let mut clock = PlaybackClock::new_static(10, schedule());
        clock.toggle();
        clock.next_slot(0);
        assert_eq!(clock.slot(), 11);
        assert_eq!(clock.tick(10, 100, 0), ClockUpdate::Unchanged);
        assert_eq!(clock.progress_ms(), 0);
        assert_eq!(clock.tick(11, 100, 0), ClockUpdate::Moved);
    }

    #[test]
    fn seek_clamps_in_any_state() {
        let mut clock = PlaybackClock::new_static(10, schedule());
        assert_eq!(clock.seek(-50), ClockUpdate::Unchanged);
        assert_eq!(clock.seek(4_321), ClockUpdate::Moved);
        assert_eq!(clock.progress_ms(), 4_321);
        clock.toggle();
        clock.seek(99_000);
        assert_eq!(clock.progress_ms(), 12_000);
        assert_eq!(clock.phase(), SlotPhase::Aggregation);
    }

    #[test]
    fn static_navigation_resets_progress() {
        let mut clock = PlaybackClock::new_static(10, schedule());
        clock.seek(5_000);
        assert_eq!(clock.previous_slot(0), ClockUpdate::SlotChanged { from: 10, to: 9 });
        assert_eq!(clock.progress_ms(), 0);
        assert_eq!(clock.next_slot(0), ClockUpdate::SlotChanged { from: 9, to: 10 });

        let mut genesis = PlaybackClock::new_static(0, schedule());
        assert_eq!(genesis.previous_slot(0), ClockUpdate::Unchanged);
    }

    #[test]
    fn reselecting_active_slot_only_rewinds() {
        let mut clock = PlaybackClock::new_static(10, schedule());
        assert_eq!(clock.select_slot(10), ClockUpdate::Unchanged);

        clock.seek(4_000);
        assert_eq!(clock.select_slot(10), ClockUpdate::Moved);
        assert_eq!(clock.progress_ms(), 0);
        assert_eq!(clock.select_slot(10), ClockUpdate::Unchanged);

        let mut live = PlaybackClock::new_live(schedule(), at(10, 0));
        assert_eq!(live.select_slot(10), ClockUpdate::Moved);
        assert_eq!(live.mode(), PlaybackMode::Static);
    }

    #[test]
    fn live_mode_follows_wall_clock_and_advances_slot() {
        let mut clock = PlaybackClock::new_live(schedule(), at(50, 3_000));
        assert_eq!(clock.slot(), 50);
        assert_eq!(clock.progress_ms(), 3_000);
        assert!(clock.is_playing());

        assert_eq!(clock.tick(50, 100, at(50, 3_150)), ClockUpdate::Moved);
        assert_eq!(clock.progress_ms(), 3_150);

        assert_eq!(
            clock.tick(50, 100, at(51, 40)),
            ClockUpdate::SlotChanged { from: 50, to: 51 }
        );
        assert_eq!(clock.progress_ms(), 40);
    }

    #[test]
    fn live_navigation_keeps_real_time_offset() {
        let mut clock = PlaybackClock::new_live(schedule(), at(50, 3_000));
        assert_eq!(clock.next_slot(at(50, 3_000)), ClockUpdate::Unchanged);

        assert_eq!(
            clock.previous_slot(at(50, 3_000)),
            ClockUpdate::SlotChanged { from: 50, to: 49 }
        );
        assert_eq!(clock.progress_ms(), 12_000);
        assert_eq!(clock.mode(), PlaybackMode::Live);

        // The lagging view moves on with the head.
        clock.tick(49, 100, at(51, 500));
        assert_eq!(clock.slot(), 50);
        assert_eq!(clock.progress_ms(), 12_000);

        assert_eq!(
            clock.next_slot(at(51, 600)),
            ClockUpdate::SlotChanged { from: 50, to: 51 }
        );
        assert_eq!(clock.progress_ms(), 600);
    }

    #[test]
    fn seeking_or_pausing_untethers_live_view() {
        let mut clock = PlaybackClock::new_live(schedule(), at(50, 3_000));
        clock.seek(1_000);
        assert_eq!(clock.mode(), PlaybackMode::Static);
        assert!(clock.is_playing());

        assert_eq!(clock.go_live(at(50, 3_500)), ClockUpdate::Moved);
        assert_eq!(clock.progress_ms(), 3_500);

        clock.toggle();
        assert_eq!(clock.mode(), PlaybackMode::Static);
        assert!(!clock.is_playing());
        assert_eq!(clock.tick(50, 100, at(50, 4_000)), ClockUpdate::Unchanged);
    }

    #[test]
    fn going_live_from_old_slot_changes_slot() {
        let mut clock = PlaybackClock::new_static(3, schedule());
        assert_eq!(
            clock.go_live(at(80, 10)),
            ClockUpdate::SlotChanged { from: 3, to: 80 }
        );
        assert!(clock.is_playing());
        assert_eq!(clock.go_static(), ClockUpdate::Moved);
        assert_eq!(clock.go_static(), ClockUpdate::Unchanged);
    }
}
