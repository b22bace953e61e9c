use serde::{Deserialize, Serialize};
use time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlState {
    /// Main power switch
    pub is_power_on: bool,
    /// Heater running
    pub is_heater_active: bool,
    /// Water sprayer running, only while the heater runs
    pub is_sprayer_active: bool,
    /// Heater fan speed, the slider covers 1000-5000
    pub heater_rpm: u32,
    /// Safety warning gate
    pub show_warning_popup: bool,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            is_power_on: true,
            is_heater_active: false,
            is_sprayer_active: false,
            heater_rpm: 3000,
            show_warning_popup: false,
        }
    }
}

impl ControlState {
    pub fn mode(&self) -> ControlMode {
        match (self.is_power_on, self.is_heater_active, self.is_sprayer_active) {
            (false, _, _) => ControlMode::Off,
            (true, false, _) => ControlMode::Standby,
            (true, true, false) => ControlMode::HeaterOnly,
            (true, true, true) => ControlMode::HeaterAndSprayer,
        }
    }
}

/// States of the thermal control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlMode {
    Off,
    Standby,
    HeaterOnly,
    HeaterAndSprayer,
}

/// Chart window over the temperature history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeRange {
    #[default]
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
}

impl TimeRange {
    /// Maximum age of a visible reading; `None` shows the whole history.
    pub fn window(&self) -> Option<Duration> {
        match self {
            TimeRange::Day => Some(Duration::hours(24)),
            TimeRange::Week => None,
        }
    }
}
