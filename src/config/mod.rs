/// Configuration management for the flowvault CLI
///
/// Handles remote service connection settings and local snapshot paths.

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Remote automation service connection settings
    pub remote: RemoteConfig,
    /// Local snapshot and backing-store paths
    pub snapshot: SnapshotConfig,
}

/// Remote automation service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the service (e.g., "http://localhost:5678")
    pub base_url: String,
    /// API credential passed through on every request
    pub api_key: String,
    /// Network timeout in seconds for every remote call
    pub timeout_secs: u64,
}

/// Local snapshot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Directory holding the workflow snapshot files (default: "workflows")
    pub snapshot_dir: String,
    /// Path to the service's sqlite backing store, used only by the
    /// identifier-preserving import path (default: "database.sqlite")
    pub service_db_path: String,
}

impl Default for Config {
    /// Default configuration with ENV_VAR support for scripted/container use
    fn default() -> Self {
        Self {
            remote: RemoteConfig {
                base_url: std::env::var("FLOWVAULT_URL")
                    .unwrap_or_else(|_| "http://localhost:5678".to_string()),
                api_key: std::env::var("FLOWVAULT_API_KEY").unwrap_or_default(),
                timeout_secs: std::env::var("FLOWVAULT_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "120".to_string())
                    .parse()
                    .unwrap_or(120),
            },
            snapshot: SnapshotConfig {
                snapshot_dir: std::env::var("FLOWVAULT_DIR")
                    .unwrap_or_else(|_| "workflows".to_string()),
                service_db_path: std::env::var("FLOWVAULT_DB")
                    .unwrap_or_else(|_| "database.sqlite".to_string()),
            },
        }
    }
}
