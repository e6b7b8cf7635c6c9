//! Configuration schema for vres
//!
//! Configuration is stored at `~/.config/variant-resolve/config.toml`

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Local artifact repository
    pub repository: RepositoryConfig,

    /// Resolution tunables
    pub resolution: ResolutionConfig,

    /// Extra artifact types: extension -> attribute defaults
    pub artifact_types: HashMap<String, HashMap<String, String>>,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Local repository settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Root directory of a Maven-style repository layout
    pub root: PathBuf,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            root: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".m2")
                .join("repository"),
        }
    }
}

/// Resolution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Maximum resolver calls in flight at once
    pub max_concurrent_artifacts: usize,

    /// Compute SHA-256 checksums of resolved files
    pub checksums: bool,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            max_concurrent_artifacts: 8,
            checksums: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[resolution]"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.resolution.max_concurrent_artifacts, 8);
        assert!(config.artifact_types.is_empty());
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [repository]
            root = "/srv/maven"

            [artifact_types.aar]
            "org.gradle.usage" = "android"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.repository.root, PathBuf::from("/srv/maven"));
        assert_eq!(config.artifact_types["aar"]["org.gradle.usage"], "android");
        assert_eq!(config.general.log_format, "text"); // default preserved
    }
}
