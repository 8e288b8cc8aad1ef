//! Slot playback actor
//!
//! Owns the [`PlaybackClock`] and the [`MultiSeriesWindowCoordinator`] of the
//! viewed slot. UI controls, the ticker and the data loader talk to it only
//! through relays; views subscribe to `state` and `snapshot`.
//!
//! All relays funnel into one queue, so clock updates and window evaluations
//! happen strictly in emission order (a seek is never overtaken by a tick that
//! was emitted after it).

use crate::dataflow::{Actor, Relay, WeakRelay};
use crate::visualizer::slot_playback::{
    BucketGrid, ClockUpdate, MultiSeriesWindowCoordinator, PlaybackClock, PlaybackMode,
    PlaybackState, PreparedSlot, SlotSchedule, WindowSnapshot,
};
use futures::channel::mpsc::{UnboundedReceiver, unbounded};
use futures::stream::{Stream, StreamExt};
use futures_signals::signal::Mutable;
use shared::config::{SlotViewerConfig, StartMode};
use shared::{SlotData, SlotNumber};
use std::future::Future;
use std::sync::Arc;

/// Source of wall-clock milliseconds since the Unix epoch.
pub trait WallClock: Send + Sync + 'static {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemWallClock;

impl WallClock for SystemWallClock {
    #[cfg(target_arch = "wasm32")]
    fn now_ms(&self) -> i64 {
        js_sys::Date::now() as i64
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn now_ms(&self) -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// One ticker interval, tagged with the slot that was active when it fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotTick {
    pub slot: SlotNumber,
    pub delta_ms: i64,
}

#[derive(Debug)]
enum PlaybackEvent {
    PlayToggled,
    SeekRequested(i64),
    PreviousSlotPressed,
    NextSlotPressed,
    SlotSelected(SlotNumber),
    ModeSwitched(PlaybackMode),
    SlotDataLoaded(SlotData),
    TickerFired(SlotTick),
}

#[derive(Clone, Debug)]
pub struct SlotPlayback {
    pub state: Actor<PlaybackState>,
    pub snapshot: Actor<Arc<WindowSnapshot>>,

    pub play_toggled_relay: Relay<()>,
    pub seek_requested_relay: Relay<i64>,
    pub previous_slot_pressed_relay: Relay<()>,
    pub next_slot_pressed_relay: Relay<()>,
    pub slot_selected_relay: Relay<SlotNumber>,
    pub mode_switched_relay: Relay<PlaybackMode>,
    pub slot_data_loaded_relay: Relay<SlotData>,
    pub ticker_fired_relay: Relay<SlotTick>,

    tick_interval_ms: u32,
}

impl SlotPlayback {
    /// Playback actor plus its processing task. Spawn the task on the
    /// executor at hand; it ends once every clone of the actor is dropped.
    ///
    /// `initial_slot` is used in static start mode; live mode starts at the
    /// wall-clock head.
    pub fn new<C: WallClock>(
        config: &SlotViewerConfig,
        initial_slot: SlotNumber,
        wall_clock: C,
    ) -> (Self, impl Future<Output = ()> + Send + use<C>) {
        let schedule = SlotSchedule::from_chain(&config.chain);
        let clock = match config.playback.start_mode {
            StartMode::Static => PlaybackClock::new_static(initial_slot, schedule),
            StartMode::Live => PlaybackClock::new_live(schedule, wall_clock.now_ms()),
        };
        let grid = BucketGrid::new(config.charts.attestation_bucket_ms, schedule.slot_duration_ms);
        let mut coordinator = MultiSeriesWindowCoordinator::new(PreparedSlot::empty(clock.slot()), grid);
        let initial_snapshot = coordinator.evaluate(clock.progress_ms());

        let (state, state_writer) = Actor::cell(clock.state());
        let (snapshot, snapshot_writer) = Actor::cell(initial_snapshot);

        let (sender, events) = unbounded();
        let playback = SlotPlayback {
            state,
            snapshot,
            play_toggled_relay: Relay::funnel(sender.clone(), |()| PlaybackEvent::PlayToggled),
            seek_requested_relay: Relay::funnel(sender.clone(), PlaybackEvent::SeekRequested),
            previous_slot_pressed_relay: Relay::funnel(sender.clone(), |()| {
                PlaybackEvent::PreviousSlotPressed
            }),
            next_slot_pressed_relay: Relay::funnel(sender.clone(), |()| PlaybackEvent::NextSlotPressed),
            slot_selected_relay: Relay::funnel(sender.clone(), PlaybackEvent::SlotSelected),
            mode_switched_relay: Relay::funnel(sender.clone(), PlaybackEvent::ModeSwitched),
            slot_data_loaded_relay: Relay::funnel(sender.clone(), PlaybackEvent::SlotDataLoaded),
            ticker_fired_relay: Relay::funnel(sender, PlaybackEvent::TickerFired),
            tick_interval_ms: config.playback.tick_interval_ms,
        };

        let playback_loop = PlaybackLoop {
            clock,
            coordinator,
            wall_clock,
            state: state_writer,
            snapshot: snapshot_writer,
        };
        (playback, playback_loop.run(events))
    }

    pub fn tick_interval_ms(&self) -> u32 {
        self.tick_interval_ms
    }

    /// Handle for a ticker task. It does not keep the playback actor alive.
    pub fn ticker(&self) -> SlotTicker {
        SlotTicker {
            state: self.state.clone(),
            ticker_fired: self.ticker_fired_relay.downgrade(),
            delta_ms: i64::from(self.tick_interval_ms),
        }
    }
}

/// What a ticker needs from [`SlotPlayback`]: the play state and a
/// non-owning `ticker_fired_relay`. Once the view drops its `SlotPlayback`,
/// the ticker sees a disconnected relay and stops.
#[derive(Clone, Debug)]
pub struct SlotTicker {
    state: Actor<PlaybackState>,
    ticker_fired: WeakRelay<SlotTick>,
    delta_ms: i64,
}

struct PlaybackLoop<C: WallClock> {
    clock: PlaybackClock,
    coordinator: MultiSeriesWindowCoordinator,
    wall_clock: C,
    state: Mutable<PlaybackState>,
    snapshot: Mutable<Arc<WindowSnapshot>>,
}

impl<C: WallClock> PlaybackLoop<C> {
    async fn run(mut self, mut events: UnboundedReceiver<PlaybackEvent>) {
        while let Some(event) = events.next().await {
            self.handle(event);
        }
        log::debug!("slot playback stopped at slot {}", self.clock.slot());
    }

    fn handle(&mut self, event: PlaybackEvent) {
        let update = match event {
            PlaybackEvent::PlayToggled => self.clock.toggle(),
            PlaybackEvent::SeekRequested(ms) => self.clock.seek(ms),
            PlaybackEvent::PreviousSlotPressed => self.clock.previous_slot(self.wall_clock.now_ms()),
            PlaybackEvent::NextSlotPressed => self.clock.next_slot(self.wall_clock.now_ms()),
            PlaybackEvent::SlotSelected(slot) => self.clock.select_slot(slot),
            PlaybackEvent::ModeSwitched(PlaybackMode::Live) => self.clock.go_live(self.wall_clock.now_ms()),
            PlaybackEvent::ModeSwitched(PlaybackMode::Static) => self.clock.go_static(),
            PlaybackEvent::TickerFired(tick) => {
                self.clock.tick(tick.slot, tick.delta_ms, self.wall_clock.now_ms())
            }
            PlaybackEvent::SlotDataLoaded(data) => {
                self.adopt_slot_data(&data);
                return;
            }
        };
        self.apply(update);
    }

    fn apply(&mut self, update: ClockUpdate) {
        match update {
            ClockUpdate::Unchanged => {}
            ClockUpdate::Moved => self.publish(),
            ClockUpdate::SlotChanged { to, .. } => {
                self.coordinator.reset(PreparedSlot::empty(to));
                self.publish();
            }
        }
    }

    fn adopt_slot_data(&mut self, data: &SlotData) {
        if data.slot != self.clock.slot() {
            log::debug!(
                "dropping data for slot {}, active slot is {}",
                data.slot,
                self.clock.slot()
            );
            return;
        }
        log::debug!(
            "slot {} data loaded: {} block, {} blob, {} column, {} attestation arrivals",
            data.slot,
            data.block_arrivals.len(),
            data.blob_arrivals.len(),
            data.column_arrivals.len(),
            data.attestation_arrivals.len()
        );
        self.coordinator.reset(PreparedSlot::from_slot_data(data));
        self.publish();
    }

    /// Windows first, then the clock state, so a new slot id never shows up
    /// next to the previous slot's windows.
    fn publish(&mut self) {
        let snapshot = self.coordinator.evaluate(self.clock.progress_ms());
        let unchanged = Arc::ptr_eq(&self.snapshot.lock_ref(), &snapshot);
        if !unchanged {
            self.snapshot.set(snapshot);
        }
        self.state.set_neq(self.clock.state());
    }
}

/// Emits one [`SlotTick`] per item of `intervals` while playback is running.
/// Finishes when `intervals` ends or the playback actor is gone.
pub async fn drive_ticks<S>(ticker: SlotTicker, intervals: S)
where
    S: Stream<Item = ()>,
{
    let mut intervals = std::pin::pin!(intervals);
    while intervals.next().await.is_some() {
        if !ticker.ticker_fired.is_connected() {
            log::debug!("slot playback gone, stopping ticker");
            break;
        }
        let state = ticker.state.current();
        if !state.is_playing {
            continue;
        }
        let tick = SlotTick {
            slot: state.slot,
            delta_ms: ticker.delta_ms,
        };
        if ticker.ticker_fired.try_send(tick).is_err() {
            log::debug!("slot playback gone, stopping ticker");
            break;
        }
    }
}

/// Starts the playback task and its `gloo-timers` ticker on the browser
/// event loop. Dropping every clone of the returned actor stops both.
#[cfg(target_arch = "wasm32")]
pub fn spawn_slot_playback(config: &SlotViewerConfig, initial_slot: SlotNumber) -> SlotPlayback {
    let (playback, task) = SlotPlayback::new(config, initial_slot, SystemWallClock);
    wasm_bindgen_futures::spawn_local(task);
    let intervals = gloo_timers::future::IntervalStream::new(playback.tick_interval_ms());
    wasm_bindgen_futures::spawn_local(drive_ticks(playback.ticker(), intervals));
    playback
}
