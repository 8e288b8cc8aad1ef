//! "What is visible at time T" over one [`SortedSeries`]
//!
//! [`TimeWindowIndex::slice_at`] answers with the prefix of entries whose
//! time is `<= T`. A private cursor remembers the last answer so a clock that
//! keeps moving forward only pays for the entries it newly reveals.

use super::sorted_series::{SeriesId, SortedSeries, TimedEvent};
use std::ops::Deref;
use std::sync::Arc;

/// Visible prefix of a series. Shares the series storage, never copies it.
#[derive(Debug)]
pub struct SeriesPrefix<T> {
    series: SortedSeries<T>,
    end_index: usize,
}

impl<T> Clone for SeriesPrefix<T> {
    fn clone(&self) -> Self {
        Self {
            series: self.series.clone(),
            end_index: self.end_index,
        }
    }
}

impl<T> SeriesPrefix<T> {
    pub(crate) fn with_end_index(series: SortedSeries<T>, end_index: usize) -> Self {
        debug_assert!(end_index <= series.len());
        Self { series, end_index }
    }

    pub fn empty() -> Self {
        Self {
            series: SortedSeries::empty(),
            end_index: 0,
        }
    }

    pub fn end_index(&self) -> usize {
        self.end_index
    }

    pub fn as_slice(&self) -> &[TimedEvent<T>] {
        &self.series.events()[..self.end_index]
    }

    /// Every entry of the underlying series is revealed.
    pub fn is_complete(&self) -> bool {
        self.end_index == self.series.len()
    }

    /// True when this prefix is the whole of `series`, storage included.
    pub fn shares_storage_with(&self, series: &SortedSeries<T>) -> bool {
        self.is_complete() && Arc::ptr_eq(self.series.storage(), series.storage())
    }
}

impl<T> Default for SeriesPrefix<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> Deref for SeriesPrefix<T> {
    type Target = [TimedEvent<T>];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WindowCursor {
    series_id: SeriesId,
    last_query_ms: i64,
    last_index: usize,
}

#[derive(Debug, Clone, Default)]
pub struct TimeWindowIndex {
    cursor: Option<WindowCursor>,
}

impl TimeWindowIndex {
    pub fn new() -> Self {
        Self { cursor: None }
    }

    pub fn slice_at<T>(&mut self, series: &SortedSeries<T>, query_ms: i64) -> SeriesPrefix<T> {
        let end_index = self.end_index_at(series, query_ms);
        SeriesPrefix::with_end_index(series.clone(), end_index)
    }

    /// Number of entries with `time_ms <= query_ms`; zero for negative queries.
    pub fn end_index_at<T>(&mut self, series: &SortedSeries<T>, query_ms: i64) -> usize {
        let events = series.events();
        let end_index = if query_ms < 0 || events.is_empty() {
            0
        } else {
            match self.cursor {
                Some(cursor) if cursor.series_id == series.id() => {
                    if query_ms >= cursor.last_query_ms {
                        gallop_upper_bound(events, cursor.last_index, query_ms)
                    } else {
                        upper_bound(&events[..cursor.last_index], query_ms)
                    }
                }
                _ => upper_bound(events, query_ms),
            }
        };

        self.cursor = Some(WindowCursor {
            series_id: series.id(),
            last_query_ms: query_ms,
            last_index: end_index,
        });
        end_index
    }

    pub fn invalidate(&mut self) {
        self.cursor = None;
    }
}

fn upper_bound<T>(events: &[TimedEvent<T>], query_ms: i64) -> usize {
    events.partition_point(|event| event.time_ms <= query_ms)
}

/// Upper bound searched forward from `start`, which must already be <= the
/// answer. Doubles the step until it overshoots, then bisects.
fn gallop_upper_bound<T>(events: &[TimedEvent<T>], start: usize, query_ms: i64) -> usize {
    let len = events.len();
    if start >= len || events[start].time_ms > query_ms {
        return start;
    }

    // Everything before `low` is visible; `high` is past the end or hidden.
    let mut low = start + 1;
    let mut high = low;
    let mut step = 1;
    while high < len && events[high].time_ms <= query_ms {
        low = high + 1;
        high = low + step;
        step *= 2;
    }
    let high = high.min(len);
    low + upper_bound(&events[low..high], query_ms)
}
