use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::alarm::{AlarmCategory, AlarmSound};

/// Default snooze deferral applied when a draft does not set one.
pub const DEFAULT_SNOOZE_MINUTES: u32 = 10;

/// Top-level config (rouse.toml + ROUSE_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouseConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub alarms: AlarmDefaults,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Defaults applied to new alarms created without explicit settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmDefaults {
    #[serde(default = "default_snooze_minutes")]
    pub snooze_minutes: u32,
    #[serde(default)]
    pub sound: AlarmSound,
    #[serde(default)]
    pub category: AlarmCategory,
}

impl Default for AlarmDefaults {
    fn default() -> Self {
        Self {
            snooze_minutes: DEFAULT_SNOOZE_MINUTES,
            sound: AlarmSound::default(),
            category: AlarmCategory::default(),
        }
    }
}

impl RouseConfig {
    /// Load config: explicit path > `~/.rouse/rouse.toml`, with `ROUSE_*`
    /// env overrides merged on top.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        tracing::debug!(%path, "loading config");
        let config: RouseConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("ROUSE_").split("_"))
            .extract()
            .map_err(|e| crate::error::CoreError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.rouse/rouse.toml", home)
}

fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.rouse/rouse.db3", home)
}

fn default_snooze_minutes() -> u32 {
    DEFAULT_SNOOZE_MINUTES
}
