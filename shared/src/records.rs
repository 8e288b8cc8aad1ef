use serde::{Deserialize, Serialize};

pub type SlotNumber = u64;

// ===== RAW PER-SLOT RECORDS =====
//
// Every record carries `seen_slot_start_diff`: milliseconds between the slot
// start and the moment an observer saw the item. It may be negative (clock
// skew) or exceed the slot duration (late arrivals).

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BlockArrival {
    pub node_id: String,
    #[serde(default)]
    pub seen_slot_start_diff: Option<i64>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub continent_code: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BlobArrival {
    pub blob_index: u64,
    pub node_id: String,
    #[serde(default)]
    pub seen_slot_start_diff: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DataColumnArrival {
    pub column_index: u64,
    pub node_id: String,
    #[serde(default)]
    pub continent_code: Option<String>,
    #[serde(default)]
    pub seen_slot_start_diff: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AttestationArrival {
    #[serde(default)]
    pub seen_slot_start_diff: Option<i64>,
    #[serde(default = "default_validator_count")]
    pub validator_count: u64,
}

fn default_validator_count() -> u64 {
    1
}

/// Everything the data-fetching layer delivers for a single slot.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SlotData {
    pub slot: SlotNumber,
    #[serde(default)]
    pub block_arrivals: Vec<BlockArrival>,
    #[serde(default)]
    pub blob_arrivals: Vec<BlobArrival>,
    #[serde(default)]
    pub column_arrivals: Vec<DataColumnArrival>,
    #[serde(default)]
    pub attestation_arrivals: Vec<AttestationArrival>,
}

impl SlotData {
    pub fn is_empty(&self) -> bool {
        self.block_arrivals.is_empty()
            && self.blob_arrivals.is_empty()
            && self.column_arrivals.is_empty()
            && self.attestation_arrivals.is_empty()
    }
}

/// Slot-relative arrival time with the "absent means zero" rule applied.
pub fn slot_relative_ms(seen_slot_start_diff: Option<i64>) -> i64 {
    seen_slot_start_diff.unwrap_or(0)
}

pub const UNKNOWN_CONTINENT: &str = "unknown";

/// Continent bucket for a record, normalized to upper case.
pub fn continent_key(continent_code: Option<&str>) -> String {
    match continent_code.map(str::trim) {
        Some(code) if !code.is_empty() => code.to_uppercase(),
        _ => UNKNOWN_CONTINENT.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_arrays_deserialize_as_empty() {
        let data: SlotData = serde_json::from_str(r#"{ "slot": 42 }"#).unwrap();
        assert_eq!(data.slot, 42);
        assert!(data.is_empty());
    }

    #[test]
    fn missing_time_defaults_to_zero() {
        let json = r#"{
            "slot": 7,
            "attestation_arrivals": [
                { "seen_slot_start_diff": 3100, "validator_count": 12 },
                { }
            ]
        }"#;
        let data: SlotData = serde_json::from_str(json).unwrap();
        let times: Vec<i64> = data
            .attestation_arrivals
            .iter()
            .map(|arrival| slot_relative_ms(arrival.seen_slot_start_diff))
            .collect();
        assert_eq!(times, vec![3100, 0]);
        assert_eq!(data.attestation_arrivals[1].validator_count, 1);
    }

    #[test]
    fn continent_key_normalizes_codes() {
        assert_eq!(continent_key(Some("eu")), "EU");
        assert_eq!(continent_key(Some("  ")), UNKNOWN_CONTINENT);
        assert_eq!(continent_key(None), UNKNOWN_CONTINENT);
    }
}
