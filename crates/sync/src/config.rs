use serde::{Deserialize, Serialize};
use std::path::Path;
use viewport_common::DEFAULT_MAX_PIXEL_RATIO;

/// Errors from loading a [`SyncConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Tunables for the resize pipeline.
///
/// ```yaml
/// max_pixel_ratio: 2.0
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Ceiling applied to the device pixel ratio before it reaches the target.
    pub max_pixel_ratio: f64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_pixel_ratio: DEFAULT_MAX_PIXEL_RATIO,
        }
    }
}

impl SyncConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_caps_at_two() {
        assert_eq!(SyncConfig::default().max_pixel_ratio, 2.0);
    }

    #[test]
    fn parses_yaml() {
        let config = SyncConfig::from_yaml_str("max_pixel_ratio: 1.5\n").unwrap();
        assert_eq!(config.max_pixel_ratio, 1.5);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = SyncConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, SyncConfig::default());
    }

    #[test]
    fn rejects_malformed_yaml() {
        let err = SyncConfig::from_yaml_str("max_pixel_ratio: [oops").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = SyncConfig::load("/nonexistent/viewport-sync.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
