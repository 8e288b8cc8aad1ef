use serde::{Deserialize, Serialize};

pub const DEFAULT_SLOT_DURATION_MS: i64 = 12_000;
pub const DEFAULT_TICK_INTERVAL_MS: u32 = 100;
pub const DEFAULT_ATTESTATION_BUCKET_MS: i64 = 50;
/// Mainnet beacon chain genesis.
pub const DEFAULT_GENESIS_TIME_MS: i64 = 1_606_824_023_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse slot viewer config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize slot viewer config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("unsupported config version '{0}'")]
    UnsupportedVersion(String),
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

// ===== CONFIG TYPES =====

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SlotViewerConfig {
    pub app: AppSection,
    pub chain: ChainSection,
    pub playback: PlaybackSection,
    pub charts: ChartsSection,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppSection {
    pub version: String,
}

impl AppSection {
    pub const CURRENT_VERSION: &'static str = "1.0.0";

    pub fn is_supported_version(&self) -> bool {
        matches!(self.version.as_str(), "1.0.0")
    }
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ChainSection {
    pub genesis_time_ms: i64,
    pub slot_duration_ms: i64,
}

impl Default for ChainSection {
    fn default() -> Self {
        Self {
            genesis_time_ms: DEFAULT_GENESIS_TIME_MS,
            slot_duration_ms: DEFAULT_SLOT_DURATION_MS,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StartMode {
    #[default]
    Static,
    Live,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PlaybackSection {
    pub tick_interval_ms: u32,
    pub start_mode: StartMode,
}

impl Default for PlaybackSection {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            start_mode: StartMode::Static,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ChartsSection {
    pub attestation_bucket_ms: i64,
}

impl Default for ChartsSection {
    fn default() -> Self {
        Self {
            attestation_bucket_ms: DEFAULT_ATTESTATION_BUCKET_MS,
        }
    }
}

impl SlotViewerConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: SlotViewerConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.app.is_supported_version() {
            return Err(ConfigError::UnsupportedVersion(self.app.version.clone()));
        }
        if self.chain.slot_duration_ms <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "chain.slot_duration_ms",
                reason: format!("must be positive, got {}", self.chain.slot_duration_ms),
            });
        }
        if self.playback.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "playback.tick_interval_ms",
                reason: "must be positive".to_string(),
            });
        }
        if self.charts.attestation_bucket_ms <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "charts.attestation_bucket_ms",
                reason: format!("must be positive, got {}", self.charts.attestation_bucket_ms),
            });
        }
        Ok(())
    }
}
