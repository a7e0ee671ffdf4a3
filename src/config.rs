//! Editor configuration loaded from a JSON file
//!
//! Every field has a default, so a partial file only overrides what it names.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants;
use crate::editor::ReleaseScan;
use crate::nodes::EvaluationOrder;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "PULSEGRAPH_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("connect radius {connect} must exceed detect radius {detect}")]
    RadiusOrder { detect: f32, connect: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub window_size: [f32; 2],
    pub socket_detect_radius: f32,
    pub socket_connect_radius: f32,
    pub grid_spacing: f32,
    pub release_scan: ReleaseScan,
    pub evaluation_order: EvaluationOrder,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            window_size: constants::DEFAULT_WINDOW_SIZE,
            socket_detect_radius: constants::socket::DETECT_RADIUS,
            socket_connect_radius: constants::socket::CONNECT_RADIUS,
            grid_spacing: constants::canvas::GRID_SPACING,
            release_scan: ReleaseScan::default(),
            evaluation_order: EvaluationOrder::default(),
        }
    }
}

impl EditorConfig {
    /// Parses and validates a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads from `$PULSEGRAPH_CONFIG` or the user config dir. A missing
    /// file is silent; an unreadable or invalid one falls back with a warning.
    pub fn load_or_default() -> Self {
        let Some(path) = config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Failed to load {}, using defaults: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.socket_connect_radius <= self.socket_detect_radius {
            return Err(ConfigError::RadiusOrder {
                detect: self.socket_detect_radius,
                connect: self.socket_connect_radius,
            });
        }
        Ok(())
    }
}

fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("pulsegraph").join("config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EditorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.release_scan, ReleaseScan::Exhaustive);
        assert_eq!(config.evaluation_order, EvaluationOrder::Storage);
    }

    #[test]
    fn test_partial_json_overrides() {
        let config = EditorConfig::from_json(
            r#"{ "release_scan": "first_match", "evaluation_order": "topological" }"#,
        )
        .unwrap();
        assert_eq!(config.release_scan, ReleaseScan::FirstMatch);
        assert_eq!(config.evaluation_order, EvaluationOrder::Topological);
        assert_eq!(config.socket_connect_radius, constants::socket::CONNECT_RADIUS);
    }

    #[test]
    fn test_radius_order_rejected() {
        let err = EditorConfig::from_json(r#"{ "socket_detect_radius": 20.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::RadiusOrder { .. }));
    }

    #[test]
    fn test_bad_json_and_missing_file() {
        assert!(matches!(EditorConfig::from_json("{"), Err(ConfigError::Json(_))));
        let missing = std::env::temp_dir().join("pulsegraph-no-such-config.json");
        assert!(matches!(EditorConfig::load(&missing), Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("pulsegraph-config-{}.json", std::process::id()));
        fs::write(&path, r#"{ "grid_spacing": 25.0 }"#).unwrap();
        let config = EditorConfig::load(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(config.grid_spacing, 25.0);
    }
}
