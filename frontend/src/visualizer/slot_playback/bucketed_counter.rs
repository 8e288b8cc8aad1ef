//! Resampling point events onto a fixed-width slot grid for charts

use super::sorted_series::TimedEvent;

/// Buckets at `0, size, 2*size, ..` up to and including `grid_length_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketGrid {
    bucket_size_ms: i64,
    grid_length_ms: i64,
}

impl BucketGrid {
    pub fn new(bucket_size_ms: i64, grid_length_ms: i64) -> Self {
        Self {
            bucket_size_ms: bucket_size_ms.max(1),
            grid_length_ms: grid_length_ms.max(0),
        }
    }

    pub fn bucket_size_ms(&self) -> i64 {
        self.bucket_size_ms
    }

    pub fn grid_length_ms(&self) -> i64 {
        self.grid_length_ms
    }

    pub fn bucket_count(&self) -> usize {
        (self.grid_length_ms / self.bucket_size_ms) as usize + 1
    }

    pub fn bucket_start_ms(&self, bucket: usize) -> i64 {
        bucket as i64 * self.bucket_size_ms
    }

    /// Nearest bucket (halves round up), `None` when it falls off the grid.
    pub fn bucket_of(&self, time_ms: i64) -> Option<usize> {
        let bucket = time_ms
            .saturating_add(self.bucket_size_ms / 2)
            .div_euclid(self.bucket_size_ms);
        if bucket < 0 || bucket >= self.bucket_count() as i64 {
            return None;
        }
        Some(bucket as usize)
    }

    /// Buckets whose start is at or before `progress_ms`.
    pub fn elapsed_buckets(&self, progress_ms: i64) -> usize {
        if progress_ms < 0 {
            return 0;
        }
        (progress_ms / self.bucket_size_ms)
            .saturating_add(1)
            .min(self.bucket_count() as i64) as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    Mean,
    Sum,
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillPolicy {
    /// Sampled metrics (CPU %, memory): empty buckets carry the last known
    /// value forward; leading empty buckets take the first known value.
    Gauge,
    /// Event counts: elapsed empty buckets are `0`, buckets starting after
    /// `reveal_until_ms` are `None` so a chart does not draw them yet.
    Counter { reveal_until_ms: Option<i64> },
}

#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    sum: f64,
    count: usize,
}

impl Accumulator {
    fn reduce(self, reducer: Reducer) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        Some(match reducer {
            Reducer::Mean => self.sum / self.count as f64,
            Reducer::Sum => self.sum,
            Reducer::Count => self.count as f64,
        })
    }
}

pub fn bucketize<T>(
    points: &[TimedEvent<T>],
    value_of: impl Fn(&T) -> f64,
    grid: BucketGrid,
    reducer: Reducer,
    fill: FillPolicy,
) -> Vec<Option<f64>> {
    let mut accumulators = vec![Accumulator::default(); grid.bucket_count()];
    for point in points {
        if let Some(bucket) = grid.bucket_of(point.time_ms) {
            let accumulator = &mut accumulators[bucket];
            accumulator.sum += value_of(&point.payload);
            accumulator.count += 1;
        }
    }

    let reduced: Vec<Option<f64>> = accumulators
        .into_iter()
        .map(|accumulator| accumulator.reduce(reducer))
        .collect();

    match fill {
        FillPolicy::Gauge => fill_gauge(reduced),
        FillPolicy::Counter { reveal_until_ms } => reduced
            .into_iter()
            .enumerate()
            .map(|(bucket, value)| match reveal_until_ms {
                Some(until) if grid.bucket_start_ms(bucket) > until => None,
                _ => Some(value.unwrap_or(0.0)),
            })
            .collect(),
    }
}

fn fill_gauge(mut values: Vec<Option<f64>>) -> Vec<Option<f64>> {
    let Some(first_known) = values.iter().flatten().next().copied() else {
        return values;
    };
    let mut last_known = first_known;
    for value in values.iter_mut() {
        match value {
            Some(known) => last_known = *known,
            None => *value = Some(last_known),
        }
    }
    values
}
