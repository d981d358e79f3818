use std::path::Path;

use config::Config;
use config::ConfigError;
use config::File;
use encore_engine::RegistryConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct EngineConfigFile {
    /// Display name for the event, used in logs only
    pub venue_name: Option<String>,

    #[serde(default)]
    pub registry: RegistryConfig,
}

pub fn load_engine_config<P: AsRef<Path>>(path: P) -> Result<EngineConfigFile, ConfigError> {
    let config = Config::builder().add_source(File::from(path.as_ref())).build()?;

    config.try_deserialize()
}

/// Load engine config with fallback to default
pub fn load_engine_config_or_default(path: &str) -> EngineConfigFile {
    match load_engine_config(path) {
        Ok(config) => {
            tracing::info!("Loaded engine config from {path}");
            config
        }
        Err(err) => {
            tracing::warn!("Failed to load engine config from {}: {}. Using defaults.", path, err);
            EngineConfigFile { venue_name: None, registry: RegistryConfig::default() }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let file = EngineConfigFile { venue_name: None, registry: RegistryConfig::default() };

        assert_eq!(file.registry.code_length, 6);
        assert_eq!(file.registry.vote_floor, 0);
        assert_eq!(file.registry.quota.add.limit, 3);
        assert_eq!(file.registry.quota.downvote.limit, 1);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let file = load_engine_config_or_default("config/does_not_exist.toml");
        assert_eq!(file.registry.quota.upvote.limit, 3);
    }
}
