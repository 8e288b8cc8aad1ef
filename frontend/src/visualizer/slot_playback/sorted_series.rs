//! Sorted, immutable per-slot event sequences
//!
//! Raw per-slot records are normalized once into [`SortedSeries`] (stable sort
//! by slot-relative time) or into a [`DeduplicatedEntityTimeline`] (first-seen
//! entry per entity). Both are shared by reference and carry a [`SeriesId`]
//! so window cursors can tell a rebuilt series from the one they indexed.

use indexmap::IndexMap;
use indexmap::map::Entry;
use std::hash::Hash;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SERIES_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one built series. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeriesId(u64);

impl SeriesId {
    fn next() -> Self {
        SeriesId(NEXT_SERIES_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimedEvent<T> {
    pub time_ms: i64,
    pub payload: T,
}

impl<T> TimedEvent<T> {
    pub fn new(time_ms: i64, payload: T) -> Self {
        Self { time_ms, payload }
    }
}

/// Events ascending by `time_ms`, ties in arrival order.
#[derive(Debug)]
pub struct SortedSeries<T> {
    id: SeriesId,
    events: Arc<[TimedEvent<T>]>,
}

impl<T> Clone for SortedSeries<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            events: Arc::clone(&self.events),
        }
    }
}

impl<T> SortedSeries<T> {
    pub fn empty() -> Self {
        Self::from_sorted_events(Vec::new())
    }

    /// Callers must hand over events already ordered by `time_ms`.
    fn from_sorted_events(events: Vec<TimedEvent<T>>) -> Self {
        debug_assert!(events.windows(2).all(|pair| pair[0].time_ms <= pair[1].time_ms));
        Self {
            id: SeriesId::next(),
            events: Arc::from(events),
        }
    }

    pub fn id(&self) -> SeriesId {
        self.id
    }

    pub fn events(&self) -> &[TimedEvent<T>] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn is_same_series(&self, other: &SortedSeries<T>) -> bool {
        self.id == other.id
    }

    pub(crate) fn storage(&self) -> &Arc<[TimedEvent<T>]> {
        &self.events
    }
}

impl<T> Default for SortedSeries<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> Deref for SortedSeries<T> {
    type Target = [TimedEvent<T>];

    fn deref(&self) -> &Self::Target {
        &self.events
    }
}

/// Stable-sorts `raw` by `time_of`. Empty input yields an empty series.
pub fn build_sorted<T>(raw: Vec<T>, time_of: impl Fn(&T) -> i64) -> SortedSeries<T> {
    build_sorted_map(raw, time_of, |item| item)
}

/// [`build_sorted`] for records that only contribute part of themselves to
/// the series payload.
pub fn build_sorted_map<R, T>(
    raw: impl IntoIterator<Item = R>,
    time_of: impl Fn(&R) -> i64,
    payload_of: impl Fn(R) -> T,
) -> SortedSeries<T> {
    let mut events: Vec<TimedEvent<T>> = raw
        .into_iter()
        .map(|record| {
            let time_ms = time_of(&record);
            TimedEvent::new(time_ms, payload_of(record))
        })
        .collect();
    events.sort_by_key(|event| event.time_ms);
    SortedSeries::from_sorted_events(events)
}

/// First sighting of an entity together with its display attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct FirstSeen<K, A> {
    pub key: K,
    pub attribute: A,
}

/// One entry per distinct entity key, sorted by its earliest time.
pub type DeduplicatedEntityTimeline<K, A> = SortedSeries<FirstSeen<K, A>>;

/// Keeps the minimum-time record per entity key (first-encountered on ties)
/// and sorts the survivors by that time.
///
/// Always a full recompute over `raw`: an entity's earliest time is only
/// known once every observation of it has been seen.
pub fn build_deduped<R, K, A>(
    raw: &[R],
    key_of: impl Fn(&R) -> K,
    time_of: impl Fn(&R) -> i64,
    attribute_of: impl Fn(&K, &R) -> A,
) -> DeduplicatedEntityTimeline<K, A>
where
    K: Eq + Hash,
{
    let mut earliest: IndexMap<K, (i64, &R)> = IndexMap::with_capacity(raw.len());

    for record in raw {
        let time_ms = time_of(record);
        match earliest.entry(key_of(record)) {
            Entry::Occupied(mut retained) => {
                if time_ms < retained.get().0 {
                    *retained.get_mut() = (time_ms, record);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert((time_ms, record));
            }
        }
    }

    let mut events: Vec<TimedEvent<FirstSeen<K, A>>> = earliest
        .into_iter()
        .map(|(key, (time_ms, record))| {
            let attribute = attribute_of(&key, record);
            TimedEvent::new(time_ms, FirstSeen { key, attribute })
        })
        .collect();
    events.sort_by_key(|event| event.time_ms);
    SortedSeries::from_sorted_events(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Sighting {
        id: &'static str,
        t: i64,
        observer: &'static str,
    }

    fn sighting(id: &'static str, t: i64, observer: &'static str) -> Sighting {
        Sighting { id, t, observer }
    }

    #[test]
    fn sorts_stably_by_time() {
        let series = build_sorted(vec![(300, 'a'), (100, 'b'), (300, 'c'), (-20, 'd')], |e| e.0);
        let order: Vec<char> = series.iter().map(|event| event.payload.1).collect();
        assert_eq!(order, vec!['d', 'b', 'a', 'c']);
    }

    #[test]
    fn empty_input_builds_empty_series() {
        let series = build_sorted(Vec::<i64>::new(), |t| *t);
        assert!(series.is_empty());
        assert_eq!(series.len(), 0);
    }

    #[test]
    fn every_build_gets_a_new_identity() {
        let first = build_sorted(vec![1, 2], |t| *t);
        let second = build_sorted(vec![1, 2], |t| *t);
        assert!(!first.is_same_series(&second));
        assert!(first.is_same_series(&first.clone()));
    }

    #[test]
    fn dedup_keeps_minimum_time() {
        let raw = vec![sighting("a", 5, "x"), sighting("a", 2, "y"), sighting("a", 9, "z")];
        let timeline = build_deduped(&raw, |s| s.id, |s| s.t, |_, s| s.observer);
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline[0].time_ms, 2);
        assert_eq!(timeline[0].payload.attribute, "y");
    }

    #[test]
    fn dedup_output_is_sorted_by_retained_time() {
        let raw = vec![sighting("a", 500, "x"), sighting("b", 100, "x"), sighting("a", 200, "y")];
        let timeline = build_deduped(&raw, |s| s.id, |s| s.t, |_, _| ());
        let entries: Vec<(&str, i64)> = timeline
            .iter()
            .map(|event| (event.payload.key, event.time_ms))
            .collect();
        assert_eq!(entries, vec![("b", 100), ("a", 200)]);
    }

    #[test]
    fn dedup_entities_with_equal_times_keep_first_seen_order() {
        let raw = vec![
            sighting("c", 300, "x"),
            sighting("a", 100, "x"),
            sighting("b", 300, "x"),
            sighting("c", 900, "y"),
            sighting("a", 100, "z"),
        ];
        let timeline = build_deduped(&raw, |s| s.id, |s| s.t, |_, s| s.observer);
        let entries: Vec<(&str, i64, &str)> = timeline
            .iter()
            .map(|event| (event.payload.key, event.time_ms, event.payload.attribute))
            .collect();
        assert_eq!(entries, vec![("a", 100, "x"), ("c", 300, "x"), ("b", 300, "x")]);
    }

    #[test]
    fn dedup_ties_keep_first_encountered() {
        let raw = vec![sighting("a", 200, "first"), sighting("a", 200, "second")];
        let timeline = build_deduped(&raw, |s| s.id, |s| s.t, |_, s| s.observer);
        assert_eq!(timeline[0].payload.attribute, "first");
    }
}
