//! Configuration file support for the workout tools.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/workout/config.toml`.

use crate::engine::WorkoutRequest;
use crate::pattern::PatternSettings;
use crate::types::{CueSettings, FitnessLevel, TrainingPattern, BODYWEIGHT};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub cues: CueSettings,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Custom exercise catalog (JSON); the built-in catalog is used when unset
    #[serde(default)]
    pub catalog: Option<PathBuf>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            catalog: None,
        }
    }
}

/// Defaults for newly generated sessions
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_level")]
    pub level: FitnessLevel,

    #[serde(default = "default_duration_minutes")]
    pub duration_minutes: u32,

    #[serde(default = "default_work_seconds")]
    pub work_seconds: u32,

    #[serde(default = "default_rest_seconds")]
    pub rest_seconds: u32,

    #[serde(default = "default_equipment")]
    pub equipment: Vec<String>,

    #[serde(default)]
    pub pattern: TrainingPattern,

    /// Explicit circuit/tabata rounds
    #[serde(default)]
    pub rounds: Option<u32>,

    /// Explicit pyramid levels
    #[serde(default)]
    pub levels: Option<u32>,

    /// Explicit rest between rounds, sets or levels
    #[serde(default)]
    pub pattern_rest: Option<u32>,

    /// Distinct exercises in each circuit round
    #[serde(default)]
    pub exercises_per_round: Option<u32>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            duration_minutes: default_duration_minutes(),
            work_seconds: default_work_seconds(),
            rest_seconds: default_rest_seconds(),
            equipment: default_equipment(),
            pattern: TrainingPattern::default(),
            rounds: None,
            levels: None,
            pattern_rest: None,
            exercises_per_round: None,
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("workout")
}

fn default_level() -> FitnessLevel {
    FitnessLevel::Intermediate
}

fn default_duration_minutes() -> u32 {
    30
}

fn default_work_seconds() -> u32 {
    45
}

fn default_rest_seconds() -> u32 {
    15
}

fn default_equipment() -> Vec<String> {
    vec![BODYWEIGHT.into()]
}

impl SessionConfig {
    pub fn pattern_settings(&self) -> PatternSettings {
        PatternSettings {
            pattern: self.pattern,
            rounds: self.rounds,
            levels: self.levels,
            rest_seconds: self.pattern_rest,
            exercises_per_round: self.exercises_per_round,
        }
    }
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("workout").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// A generation request built from the configured session defaults
    pub fn request(&self) -> WorkoutRequest {
        WorkoutRequest {
            level: self.session.level,
            duration_minutes: self.session.duration_minutes,
            work_seconds: self.session.work_seconds,
            rest_seconds: self.session.rest_seconds,
            equipment: self.session.equipment.clone(),
            pattern: self.session.pattern_settings(),
            cues: self.cues,
        }
    }
}
