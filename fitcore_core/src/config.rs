//! Configuration file support for FitCore.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/fitcore/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub budget: BudgetConfig,

    #[serde(default)]
    pub steps: StepsConfig,
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

/// Daily budget configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Budget used when the profile cannot produce one (kcal/day)
    #[serde(default = "default_budget_kcal")]
    pub default_kcal: f64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            default_kcal: default_budget_kcal(),
        }
    }
}

/// Step tracking parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StepsConfig {
    #[serde(default = "default_kcal_per_step")]
    pub kcal_per_step: f64,

    #[serde(default = "default_daily_burn_goal_kcal")]
    pub daily_burn_goal_kcal: f64,

    #[serde(default = "default_daily_step_goal")]
    pub daily_step_goal: u32,
}

impl Default for StepsConfig {
    fn default() -> Self {
        Self {
            kcal_per_step: default_kcal_per_step(),
            daily_burn_goal_kcal: default_daily_burn_goal_kcal(),
            daily_step_goal: default_daily_step_goal(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("fitcore")
}

fn default_budget_kcal() -> f64 {
    2000.0
}

fn default_kcal_per_step() -> f64 {
    0.04
}

fn default_daily_burn_goal_kcal() -> f64 {
    1000.0
}

fn default_daily_step_goal() -> u32 {
    10_000
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
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("fitcore").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
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

    fn validate(&self) -> Result<()> {
        if !self.budget.default_kcal.is_finite() || self.budget.default_kcal < 0.0 {
            return Err(Error::Config(format!(
                "budget.default_kcal must be a non-negative number, got {}",
                self.budget.default_kcal
            )));
        }
        if !self.steps.kcal_per_step.is_finite() || self.steps.kcal_per_step < 0.0 {
            return Err(Error::Config(format!(
                "steps.kcal_per_step must be a non-negative number, got {}",
                self.steps.kcal_per_step
            )));
        }
        Ok(())
    }
}
