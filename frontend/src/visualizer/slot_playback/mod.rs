//! Slot playback domain entry point.
//!
//! Per-slot datasets are prepared once, then revealed progressively as the
//! playback clock moves through the slot.

pub mod bucketed_counter;
pub mod playback_clock;
pub mod slot_datasets;
pub mod slot_time;
pub mod sorted_series;
pub mod window_coordinator;
pub mod window_index;

pub use bucketed_counter::{BucketGrid, FillPolicy, Reducer, bucketize};
pub use playback_clock::{ClockUpdate, PlaybackClock, PlaybackMode, PlaybackState};
pub use slot_datasets::{BlobMarker, ColumnMarker, MapPoint, PreparedSlot, blob_color};
pub use slot_time::{SlotPhase, SlotProgress, SlotSchedule};
pub use sorted_series::{
    DeduplicatedEntityTimeline, FirstSeen, SeriesId, SortedSeries, TimedEvent, build_deduped,
    build_sorted, build_sorted_map,
};
pub use window_coordinator::{MultiSeriesWindowCoordinator, SnapshotSummary, WindowSnapshot};
pub use window_index::{SeriesPrefix, TimeWindowIndex};
