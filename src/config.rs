//! Application configuration
//!
//! Settings are layered: built-in defaults, then an optional
//! `salessight.toml` in the working directory, then `SALESSIGHT_*`
//! environment variables. The database path additionally honors a CLI
//! flag and falls back to the platform data directory.

use crate::error::Result;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::debug;

/// Top-level application settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Database file path; resolved via [`resolve_db_path`] when unset
    #[serde(default)]
    pub db_path: Option<String>,

    #[serde(default)]
    pub forecast: ForecastSettings,
}

/// Tuning knobs for the forecasting step
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastSettings {
    /// Maximum allowed deviation of projected values from the last actual,
    /// as a fraction (0.3 = clamp to 70%..130% of the last actual)
    #[serde(default = "default_max_deviation")]
    pub max_deviation: f64,

    /// Width of the moving-average window applied to projected values
    #[serde(default = "default_smoothing_window")]
    pub smoothing_window: usize,
}

fn default_max_deviation() -> f64 {
    0.3
}

fn default_smoothing_window() -> usize {
    5
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            max_deviation: default_max_deviation(),
            smoothing_window: default_smoothing_window(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: None,
            forecast: ForecastSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from defaults, optional `salessight.toml`, and
    /// `SALESSIGHT_*` environment variables (e.g. `SALESSIGHT_DB_PATH`)
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("salessight").required(false))
            .add_source(config::Environment::with_prefix("SALESSIGHT").separator("__"))
            .build()?
            .try_deserialize::<Settings>()?;

        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }
}

/// Default database location under the platform data directory
fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("salessight")
        .join("salessight.db")
}

/// Resolve the database path from CLI flag, settings, or the default
pub fn resolve_db_path(cli_path: Option<String>, settings: &Settings) -> String {
    cli_path
        .or_else(|| settings.db_path.clone())
        .unwrap_or_else(|| default_db_path().to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.db_path.is_none());
        assert_eq!(settings.forecast.max_deviation, 0.3);
        assert_eq!(settings.forecast.smoothing_window, 5);
    }

    #[test]
    fn test_cli_path_wins() {
        let settings = Settings {
            db_path: Some("from-config.db".to_string()),
            ..Settings::default()
        };
        let resolved = resolve_db_path(Some("from-cli.db".to_string()), &settings);
        assert_eq!(resolved, "from-cli.db");
    }

    #[test]
    fn test_settings_path_when_no_cli() {
        let settings = Settings {
            db_path: Some("from-config.db".to_string()),
            ..Settings::default()
        };
        assert_eq!(resolve_db_path(None, &settings), "from-config.db");
    }

    #[test]
    fn test_default_path_mentions_app_dir() {
        let settings = Settings::default();
        let resolved = resolve_db_path(None, &settings);
        assert!(resolved.contains("salessight"));
    }
}
