use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs, io};

use heatsync_api::models::{TemperatureUnit, ThresholdSettings};
use serde::{Deserialize, Serialize};

use crate::errors::SettingsError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    pub refresh_interval_secs: u64,
    pub progress_interval_secs: u64,
    pub battery_interval_secs: u64,
    pub latency_ms: u64,
    pub range_delay_ms: u64,
    #[serde(default)]
    pub seed_days: u32,
    #[serde(default)]
    pub unit: TemperatureUnit,
}

impl Simulation {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_secs(self.progress_interval_secs)
    }

    pub fn battery_interval(&self) -> Duration {
        Duration::from_secs(self.battery_interval_secs)
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }

    pub fn range_delay(&self) -> Duration {
        Duration::from_millis(self.range_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thresholds {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feed {
    pub base_url: String,
    pub channel_id: u64,
    pub api_key: Option<String>,
    #[serde(default = "Feed::default_field")]
    pub field: String,
    #[serde(default = "Feed::default_results")]
    pub results: u32,
}

impl Feed {
    fn default_field() -> String {
        String::from("field1")
    }

    fn default_results() -> u32 {
        100
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub logger: Logger,
    pub simulation: Simulation,
    pub thresholds: Thresholds,
    pub feed: Option<Feed>,
}

impl Settings {
    /// Loads the embedded defaults, or the file named by `HEATSYNC_CONFIG`.
    pub fn new() -> Result<Self, SettingsError> {
        match env::var("HEATSYNC_CONFIG") {
            Ok(path) => Self::from_path(normalize_path(&path)?),
            Err(_) => Self::parse(include_str!(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/../",
                "configs/default.toml"
            ))),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        Self::parse(&fs::read_to_string(path)?)
    }

    pub fn parse(raw: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn threshold_settings(&self) -> ThresholdSettings {
        ThresholdSettings {
            min: self.thresholds.min,
            max: self.thresholds.max,
            unit: self.simulation.unit,
        }
    }
}

fn normalize_path(path: &str) -> io::Result<PathBuf> {
    let path_buf = PathBuf::from(path);

    Ok(if path_buf.is_absolute() {
        path_buf
    } else {
        env::current_dir()?.join(path_buf)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_defaults_parse() {
        let settings = Settings::parse(include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../",
            "configs/default.toml"
        )))
        .unwrap();

        assert_eq!(settings.simulation.refresh_interval(), Duration::from_secs(15));
        assert_eq!(settings.simulation.battery_interval(), Duration::from_secs(30));
        assert_eq!(settings.threshold_settings(), ThresholdSettings::default());
        assert!(settings.feed.is_none());
    }

    #[test]
    fn test_feed_section_defaults() {
        let settings = Settings::parse(
            r#"
            [logger]
            level = "debug"

            [simulation]
            refresh_interval_secs = 5
            progress_interval_secs = 1
            battery_interval_secs = 30
            latency_ms = 0
            range_delay_ms = 0
            unit = "fahrenheit"

            [thresholds]
            min = 60.0
            max = 80.0

            [feed]
            base_url = "http://localhost:8080"
            channel_id = 42
            "#,
        )
        .unwrap();

        let feed = settings.feed.as_ref().unwrap();
        assert_eq!(feed.field, "field1");
        assert_eq!(feed.results, 100);
        assert_eq!(feed.api_key, None);
        assert_eq!(settings.simulation.seed_days, 0);
        assert_eq!(settings.threshold_settings().unit, TemperatureUnit::Fahrenheit);
    }

    #[test]
    fn test_parse_rejects_missing_sections() {
        assert!(matches!(Settings::parse("[logger]\nlevel = \"info\"\n"), Err(SettingsError::Parse(_))));
    }
}
