use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use energytrack_core::insights::InsightThresholds;
use energytrack_core::party_meter::Sex;
use energytrack_core::Goals;
use serde::Deserialize;

static CONFIG: OnceLock<EnergyTrackConfig> = OnceLock::new();

/// Contents of `~/.energytrack.toml`. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnergyTrackConfig {
    #[serde(default)]
    pub profile: ProfileConfig,
    #[serde(default)]
    pub goals: GoalsConfig,
    #[serde(default)]
    pub thresholds: InsightThresholds,
}

/// Defaults for the party meter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileConfig {
    pub weight_kg: Option<f64>,
    pub sex: Option<Sex>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GoalsConfig {
    pub enable_daily_limit: bool,
    pub daily_limit: f64,
    pub enable_notifications: bool,
}

impl Default for GoalsConfig {
    fn default() -> Self {
        let goals = Goals::default();
        Self {
            enable_daily_limit: goals.enable_daily_limit,
            daily_limit: goals.daily_limit,
            enable_notifications: goals.enable_notifications,
        }
    }
}

impl GoalsConfig {
    pub fn to_goals(&self) -> Goals {
        Goals {
            enable_daily_limit: self.enable_daily_limit,
            daily_limit: self.daily_limit,
            enable_notifications: self.enable_notifications,
            ..Goals::default()
        }
    }
}

impl EnergyTrackConfig {
    fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".energytrack.toml"))
    }

    /// Load once per process. An explicit path must exist and parse; the
    /// default file is optional and ignored when unreadable.
    pub fn load(explicit: Option<&Path>) -> Result<&'static EnergyTrackConfig> {
        if let Some(config) = CONFIG.get() {
            return Ok(config);
        }

        let config = match explicit {
            Some(path) => {
                let content = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                Self::parse(&content)
                    .with_context(|| format!("Invalid config file {}", path.display()))?
            }
            None => Self::default_path()
                .and_then(|path| fs::read_to_string(path).ok())
                .and_then(|content| Self::parse(&content).ok())
                .unwrap_or_default(),
        };

        Ok(CONFIG.get_or_init(|| config))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
