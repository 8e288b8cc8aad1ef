//! Types shared between the slot viewer frontend and whatever feeds it data.

pub mod config;
pub mod records;

pub use config::{ConfigError, SlotViewerConfig, StartMode};
pub use records::{
    AttestationArrival, BlobArrival, BlockArrival, DataColumnArrival, SlotData, SlotNumber,
};
