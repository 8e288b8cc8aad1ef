//! Domain actors built on the dataflow primitives
//!
//! - **SlotPlayback** - playback clock and windowed views of the viewed slot

pub mod slot_playback;

pub use slot_playback::{
    SlotPlayback, SlotTick, SlotTicker, SystemWallClock, WallClock, drive_ticks,
};
#[cfg(target_arch = "wasm32")]
pub use slot_playback::spawn_slot_playback;
