use std::io;

use heatsync_api::models::ControlMode;

#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("Power is off")]
    PowerOff,

    #[error("Heater must be active to use the sprayer")]
    HeaterInactive,
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("Feed request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed returned status {0}")]
    Status(u16),

    #[error("Feed body could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Feed contained no usable readings")]
    NoReadings,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read settings: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Control rejected in {mode:?}: {source}")]
    Control {
        mode: ControlMode,
        source: ControlError,
    },

    #[error("Engine loop has stopped")]
    Closed,
}
