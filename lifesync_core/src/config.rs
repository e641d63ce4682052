//! Configuration file support for LifeSync.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/lifesync/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub workout: WorkoutConfig,

    #[serde(default)]
    pub habits: HabitsConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl DataConfig {
    pub fn templates_path(&self) -> PathBuf {
        self.data_dir.join("workout_templates.json")
    }

    pub fn sessions_path(&self) -> PathBuf {
        self.data_dir.join("completed_workout_sessions.json")
    }

    pub fn habits_path(&self) -> PathBuf {
        self.data_dir.join("habits.json")
    }
}

/// Guided workout parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkoutConfig {
    /// Rest between sets, in seconds
    #[serde(default = "default_rest_seconds")]
    pub rest_seconds: u32,
}

impl Default for WorkoutConfig {
    fn default() -> Self {
        Self {
            rest_seconds: default_rest_seconds(),
        }
    }
}

/// Defaults offered when creating habits
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HabitsConfig {
    #[serde(default = "default_target_count")]
    pub default_target_count: u32,

    /// Minutes
    #[serde(default = "default_target_time")]
    pub default_target_time: u32,
}

impl Default for HabitsConfig {
    fn default() -> Self {
        Self {
            default_target_count: default_target_count(),
            default_target_time: default_target_time(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("lifesync")
}

fn default_rest_seconds() -> u32 {
    60
}

fn default_target_count() -> u32 {
    1
}

fn default_target_time() -> u32 {
    15
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject values the trackers cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.habits.default_target_count == 0 {
            return Err(Error::Config(
                "habits.default_target_count must be at least 1".into(),
            ));
        }
        if self.habits.default_target_time == 0 {
            return Err(Error::Config(
                "habits.default_target_time must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("lifesync").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
