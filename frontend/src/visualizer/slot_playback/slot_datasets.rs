//! Per-slot dataset preparation
//!
//! Turns the raw [`SlotData`] bundle into the sorted and deduplicated series
//! the window coordinator indexes. Runs once per slot (or data refresh).

use super::sorted_series::{DeduplicatedEntityTimeline, SortedSeries, build_deduped, build_sorted_map};
use indexmap::IndexMap;
use palette::{FromColor, Hsl, Srgb};
use shared::records::{continent_key, slot_relative_ms};
use shared::{AttestationArrival, BlobArrival, BlockArrival, DataColumnArrival, SlotData, SlotNumber};

/// A node that saw the block, placed on the world map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapPoint {
    pub node_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub city: Option<String>,
    pub country: Option<String>,
    pub continent: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlobMarker {
    pub first_seen_by: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMarker {
    pub first_seen_by: String,
}

pub type BlobTimeline = DeduplicatedEntityTimeline<u64, BlobMarker>;
pub type ColumnTimeline = DeduplicatedEntityTimeline<u64, ColumnMarker>;

#[derive(Debug, Clone)]
pub struct PreparedSlot {
    pub slot: SlotNumber,
    pub map_points: SortedSeries<MapPoint>,
    pub blob_timeline: BlobTimeline,
    /// Keyed by continent code, in order of first appearance.
    pub column_propagation: IndexMap<String, ColumnTimeline>,
    /// Payload is the number of validators covered by the attestation.
    pub attestations: SortedSeries<u64>,
}

impl PreparedSlot {
    /// Placeholder for a slot whose data has not arrived yet.
    pub fn empty(slot: SlotNumber) -> Self {
        Self {
            slot,
            map_points: SortedSeries::empty(),
            blob_timeline: SortedSeries::empty(),
            column_propagation: IndexMap::new(),
            attestations: SortedSeries::empty(),
        }
    }

    pub fn from_slot_data(data: &SlotData) -> Self {
        let map_points = build_sorted_map(
            &data.block_arrivals,
            |arrival: &&BlockArrival| slot_relative_ms(arrival.seen_slot_start_diff),
            |arrival| MapPoint {
                node_id: arrival.node_id.clone(),
                latitude: arrival.latitude,
                longitude: arrival.longitude,
                city: arrival.city.clone(),
                country: arrival.country.clone(),
                continent: continent_key(arrival.continent_code.as_deref()),
            },
        );

        let blob_timeline = build_deduped(
            &data.blob_arrivals,
            |arrival: &BlobArrival| arrival.blob_index,
            |arrival| slot_relative_ms(arrival.seen_slot_start_diff),
            |blob_index, arrival| BlobMarker {
                first_seen_by: arrival.node_id.clone(),
                color: blob_color(*blob_index),
            },
        );

        let mut columns_by_continent: IndexMap<String, Vec<&DataColumnArrival>> = IndexMap::new();
        for arrival in &data.column_arrivals {
            columns_by_continent
                .entry(continent_key(arrival.continent_code.as_deref()))
                .or_default()
                .push(arrival);
        }
        let column_propagation = columns_by_continent
            .into_iter()
            .map(|(continent, arrivals)| {
                let timeline = build_deduped(
                    &arrivals,
                    |arrival: &&DataColumnArrival| arrival.column_index,
                    |arrival| slot_relative_ms(arrival.seen_slot_start_diff),
                    |_, arrival| ColumnMarker {
                        first_seen_by: arrival.node_id.clone(),
                    },
                );
                (continent, timeline)
            })
            .collect();

        let attestations = build_sorted_map(
            &data.attestation_arrivals,
            |arrival: &&AttestationArrival| slot_relative_ms(arrival.seen_slot_start_diff),
            |arrival| arrival.validator_count,
        );

        Self {
            slot: data.slot,
            map_points,
            blob_timeline,
            column_propagation,
            attestations,
        }
    }
}

/// Distinct, stable colour per blob index (golden-angle hue walk).
pub fn blob_color(blob_index: u64) -> String {
    let hue = (blob_index as f32 * 137.508) % 360.0;
    let hsl: Hsl = Hsl::new(hue, 0.7, 0.55);
    let rgb: Srgb = Srgb::from_color(hsl);
    let rgb: Srgb<u8> = rgb.into_format();
    format!("#{:02x}{:02x}{:02x}", rgb.red, rgb.green, rgb.blue)
}
