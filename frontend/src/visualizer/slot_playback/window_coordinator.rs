//! Multi-series window coordinator
//!
//! Owns one [`TimeWindowIndex`] per tracked dataset of the active slot and
//! re-slices all of them against the playback clock. The result is published
//! as an `Arc<WindowSnapshot>`; renderers treat an unchanged `Arc` (and an
//! unchanged `Arc` field inside it) as "nothing to redraw", so a field is only
//! replaced when its own window moved.

use super::bucketed_counter::{BucketGrid, FillPolicy, Reducer, bucketize};
use super::slot_datasets::{BlobMarker, ColumnMarker, MapPoint, PreparedSlot};
use super::sorted_series::{FirstSeen, SortedSeries};
use super::window_index::{SeriesPrefix, TimeWindowIndex};
use indexmap::IndexMap;
use shared::SlotNumber;
use std::sync::Arc;

pub type VisibleBlobs = SeriesPrefix<FirstSeen<u64, BlobMarker>>;
pub type VisibleColumns = SeriesPrefix<FirstSeen<u64, ColumnMarker>>;
pub type VisiblePropagation = IndexMap<String, Arc<VisibleColumns>>;

/// Everything that has happened in the slot up to the evaluated clock value.
#[derive(Debug)]
pub struct WindowSnapshot {
    pub slot: SlotNumber,
    pub visible_points: Arc<SeriesPrefix<MapPoint>>,
    pub visible_entity_timeline: Arc<VisibleBlobs>,
    /// One sub-window per continent; unchanged entries keep their `Arc`.
    pub visible_propagation_series: Arc<VisiblePropagation>,
    pub visible_attestations: Arc<SeriesPrefix<u64>>,
    /// Validators attested per bucket; `None` for buckets not yet elapsed.
    pub bucketed_counts: Arc<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct SnapshotSummary {
    pub nodes_seen_block: usize,
    pub first_block_seen_ms: Option<i64>,
    pub blobs_seen: usize,
    pub columns_seen: usize,
    pub attesting_validators: u64,
}

impl WindowSnapshot {
    pub fn empty(slot: SlotNumber) -> Self {
        Self {
            slot,
            visible_points: Arc::new(SeriesPrefix::empty()),
            visible_entity_timeline: Arc::new(SeriesPrefix::empty()),
            visible_propagation_series: Arc::new(IndexMap::new()),
            visible_attestations: Arc::new(SeriesPrefix::empty()),
            bucketed_counts: Arc::new(Vec::new()),
        }
    }

    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            nodes_seen_block: self.visible_points.len(),
            first_block_seen_ms: self.visible_points.first().map(|event| event.time_ms),
            blobs_seen: self.visible_entity_timeline.len(),
            columns_seen: self
                .visible_propagation_series
                .values()
                .map(|columns| columns.len())
                .sum(),
            attesting_validators: self.visible_attestations.iter().map(|event| event.payload).sum(),
        }
    }
}

/// One dataset plus its index and the prefix most recently published for it.
#[derive(Debug)]
struct TrackedWindow<T> {
    series: SortedSeries<T>,
    index: TimeWindowIndex,
    published: Option<Arc<SeriesPrefix<T>>>,
}

impl<T> TrackedWindow<T> {
    fn new(series: SortedSeries<T>) -> Self {
        Self {
            series,
            index: TimeWindowIndex::new(),
            published: None,
        }
    }

    /// Returns the prefix visible at `clock_ms` and whether it replaced the
    /// previously published one.
    fn advance(&mut self, clock_ms: i64) -> (Arc<SeriesPrefix<T>>, bool) {
        let end_index = self.index.end_index_at(&self.series, clock_ms);
        if let Some(published) = &self.published {
            if published.end_index() == end_index {
                return (Arc::clone(published), false);
            }
        }
        let prefix = Arc::new(SeriesPrefix::with_end_index(self.series.clone(), end_index));
        self.published = Some(Arc::clone(&prefix));
        (prefix, true)
    }
}

#[derive(Debug)]
pub struct MultiSeriesWindowCoordinator {
    slot: SlotNumber,
    grid: BucketGrid,
    points: TrackedWindow<MapPoint>,
    entity_timeline: TrackedWindow<FirstSeen<u64, BlobMarker>>,
    propagation: IndexMap<String, TrackedWindow<FirstSeen<u64, ColumnMarker>>>,
    attestations: TrackedWindow<u64>,
    revealed_buckets: usize,
    published: Option<Arc<WindowSnapshot>>,
}

impl MultiSeriesWindowCoordinator {
    pub fn new(prepared: PreparedSlot, grid: BucketGrid) -> Self {
        let PreparedSlot {
            slot,
            map_points,
            blob_timeline,
            column_propagation,
            attestations,
        } = prepared;
        Self {
            slot,
            grid,
            points: TrackedWindow::new(map_points),
            entity_timeline: TrackedWindow::new(blob_timeline),
            propagation: column_propagation
                .into_iter()
                .map(|(continent, timeline)| (continent, TrackedWindow::new(timeline)))
                .collect(),
            attestations: TrackedWindow::new(attestations),
            revealed_buckets: 0,
            published: None,
        }
    }

    pub fn slot(&self) -> SlotNumber {
        self.slot
    }

    /// Most recently published snapshot, if `evaluate` ran since the last reset.
    pub fn latest(&self) -> Option<&Arc<WindowSnapshot>> {
        self.published.as_ref()
    }

    /// Drops every cursor and published result and adopts `prepared`.
    pub fn reset(&mut self, prepared: PreparedSlot) {
        log::debug!("window coordinator reset: slot {} -> {}", self.slot, prepared.slot);
        *self = Self::new(prepared, self.grid);
    }

    pub fn evaluate(&mut self, clock_ms: i64) -> Arc<WindowSnapshot> {
        let (visible_points, points_changed) = self.points.advance(clock_ms);
        let (visible_entity_timeline, entity_changed) = self.entity_timeline.advance(clock_ms);

        let mut propagation_changed = false;
        let propagation: Vec<(&String, Arc<VisibleColumns>)> = self
            .propagation
            .iter_mut()
            .map(|(continent, window)| {
                let (prefix, changed) = window.advance(clock_ms);
                propagation_changed |= changed;
                (continent, prefix)
            })
            .collect();

        let (visible_attestations, attestations_changed) = self.attestations.advance(clock_ms);
        let revealed_buckets = self.grid.elapsed_buckets(clock_ms);
        let buckets_changed = attestations_changed || revealed_buckets != self.revealed_buckets;

        let snapshot = match self.published.clone() {
            Some(previous)
                if !(points_changed
                    || entity_changed
                    || propagation_changed
                    || buckets_changed) =>
            {
                return previous;
            }
            Some(previous) => WindowSnapshot {
                slot: self.slot,
                visible_points,
                visible_entity_timeline,
                visible_propagation_series: if propagation_changed {
                    Arc::new(collect_propagation(propagation))
                } else {
                    Arc::clone(&previous.visible_propagation_series)
                },
                bucketed_counts: if buckets_changed {
                    Arc::new(attestation_histogram(&visible_attestations, self.grid, clock_ms))
                } else {
                    Arc::clone(&previous.bucketed_counts)
                },
                visible_attestations,
            },
            None => WindowSnapshot {
                slot: self.slot,
                visible_points,
                visible_entity_timeline,
                visible_propagation_series: Arc::new(collect_propagation(propagation)),
                bucketed_counts: Arc::new(attestation_histogram(&visible_attestations, self.grid, clock_ms)),
                visible_attestations,
            },
        };

        let snapshot = Arc::new(snapshot);
        self.revealed_buckets = revealed_buckets;
        self.published = Some(Arc::clone(&snapshot));
        snapshot
    }
}

fn collect_propagation(propagation: Vec<(&String, Arc<VisibleColumns>)>) -> VisiblePropagation {
    propagation
        .into_iter()
        .map(|(continent, prefix)| (continent.clone(), prefix))
        .collect()
}

fn attestation_histogram(
    visible_attestations: &SeriesPrefix<u64>,
    grid: BucketGrid,
    clock_ms: i64,
) -> Vec<Option<f64>> {
    bucketize(
        visible_attestations,
        |validators| *validators as f64,
        grid,
        Reducer::Sum,
        FillPolicy::Counter {
            reveal_until_ms: Some(clock_ms),
        },
    )
}
