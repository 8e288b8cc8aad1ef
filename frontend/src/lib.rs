//! Slot viewer frontend core: slot playback engine and its actors.
//!
//! Rendering is left to the embedding UI, which binds to the
//! [`actors::SlotPlayback`] signals.

pub mod actors;
pub mod config;
pub mod dataflow;
pub mod visualizer;

pub use actors::SlotPlayback;
pub use config::load_config;
