use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatus {
    /// Mirrors the power switch
    pub is_online: bool,
    /// Last heartbeat time
    #[serde(with = "time::serde::rfc3339")]
    pub last_seen: OffsetDateTime,
    /// Battery level percentage (0-100)
    pub battery_level: f64,
}

impl Default for DeviceStatus {
    fn default() -> Self {
        Self {
            is_online: true,
            last_seen: OffsetDateTime::now_utc(),
            battery_level: 75.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    /// Cloud link state
    pub is_connected: bool,
    /// Cloud provider name
    pub provider: String,
    /// Last successful connection
    #[serde(with = "time::serde::rfc3339")]
    pub last_connected: OffsetDateTime,
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self {
            is_connected: true,
            provider: String::from("ThingSpeak"),
            last_connected: OffsetDateTime::now_utc(),
        }
    }
}
