use shared::config::{ConfigError, SlotViewerConfig};

/// Viewer configuration from an optional TOML document. A missing document
/// means defaults; a broken one is reported and replaced by defaults so the
/// viewer still starts.
pub fn load_config(source: Option<&str>) -> SlotViewerConfig {
    let Some(source) = source else {
        log::info!("slot viewer config: using defaults");
        return SlotViewerConfig::default();
    };
    match SlotViewerConfig::from_toml_str(source) {
        Ok(config) => config,
        Err(error) => {
            log_config_error(&error);
            SlotViewerConfig::default()
        }
    }
}

fn log_config_error(error: &ConfigError) {
    match error {
        ConfigError::InvalidValue { field, .. } => {
            log::warn!("slot viewer config: invalid `{field}`, using defaults: {error}")
        }
        _ => log::warn!("slot viewer config: {error}, using defaults"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::config::StartMode;

    #[test]
    fn missing_source_is_default() {
        assert_eq!(load_config(None), SlotViewerConfig::default());
    }

    #[test]
    fn valid_source_is_used() {
        let config = load_config(Some("[playback]\nstart_mode = \"live\"\ntick_interval_ms = 250\n"));
        assert_eq!(config.playback.start_mode, StartMode::Live);
        assert_eq!(config.playback.tick_interval_ms, 250);
    }

    #[test]
    fn broken_source_falls_back_to_defaults() {
        let _ = env_logger::builder().is_test(true).try_init();
        assert_eq!(load_config(Some("[chain\nslot_duration_ms =")), SlotViewerConfig::default());
        assert_eq!(
            load_config(Some("[chain]\nslot_duration_ms = 0\n")),
            SlotViewerConfig::default()
        );
    }
}
