// Visualizer Module - slot playback and the windowed data views it feeds

// Time-windowed datasets, playback clock and chart bucketing
pub mod slot_playback;
