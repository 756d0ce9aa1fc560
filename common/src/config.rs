// Configuration management with layered configuration (defaults, files, env)

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_DIR: &str = "config";
pub const LOCAL_CONFIG_FILE: &str = "local.toml";
pub const ENV_PREFIX: &str = "LITOURNEY";

/// Main settings structure containing all configuration options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub lichess: LichessConfig,
    pub scheduling: SchedulingConfig,
    pub storage: StorageConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LichessConfig {
    /// Personal API token; empty until `setup` has been run
    pub api_key: String,
    pub base_url: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    /// How many days ahead occurrences are created
    pub horizon_days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Settings {
    /// Load configuration from `config_dir` with layered precedence:
    /// defaults, default.toml, local.toml, then environment
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Missing keys fall back to the serde defaults below
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Written by `setup`, not committed
            .add_source(File::from(config_dir.join(LOCAL_CONFIG_FILE)).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Persist these settings as `<config_dir>/local.toml`
    pub fn write_local<P: AsRef<Path>>(&self, config_dir: P) -> Result<PathBuf, ConfigError> {
        let config_dir = config_dir.as_ref();
        fs::create_dir_all(config_dir).map_err(|e| ConfigError::Foreign(Box::new(e)))?;

        let rendered =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Foreign(Box::new(e)))?;
        let path = config_dir.join(LOCAL_CONFIG_FILE);
        fs::write(&path, rendered).map_err(|e| ConfigError::Foreign(Box::new(e)))?;
        Ok(path)
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), String> {
        if self.lichess.base_url.trim().is_empty() {
            return Err("Lichess base_url cannot be empty".to_string());
        }
        if self.lichess.timeout_seconds == 0 {
            return Err("Lichess timeout_seconds must be greater than 0".to_string());
        }

        if self.scheduling.horizon_days == 0 {
            return Err("Scheduling horizon_days must be greater than 0".to_string());
        }

        Ok(())
    }

    pub fn has_api_key(&self) -> bool {
        !self.lichess.api_key.trim().is_empty()
    }
}

impl Default for LichessConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://lichess.org".to_string(),
            timeout_seconds: 30,
            max_retries: 3,
            retry_delay_seconds: 60,
        }
    }
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self { horizon_days: 7 }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}
