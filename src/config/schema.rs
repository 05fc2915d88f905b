//! Configuration schema for cairn
//!
//! Configuration is stored at `~/.config/cairn/config.toml`

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache settings
    pub cache: CacheConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl GeneralConfig {
    /// Whether logs should be emitted as JSON lines
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable build caching (default: true). Disabling never restores but
    /// still saves, so re-enabling picks up a fresh cache.
    pub enabled: bool,

    /// Cache format marker. Bumping it invalidates every existing cache.
    pub format_version: u32,

    /// Sub-directory of the store root that holds cached trees
    pub namespace: String,

    /// Directory cached when the project declares none
    pub default_directory: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            format_version: 1,
            namespace: "node".to_string(),
            default_directory: "node_modules".to_string(),
        }
    }
}
