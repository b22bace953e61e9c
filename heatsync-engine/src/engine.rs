use std::collections::VecDeque;

use heatsync_api::models::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::errors::ControlError;
use crate::settings::Settings;
use crate::simulate::{self, GenerationBounds};

/// Fixed limit that raises the heater warning, independent of thresholds.
pub const SAFETY_LIMIT_CELSIUS: f64 = 25.0;

/// Progress ticks per refresh cycle.
const PROGRESS_STEPS: u32 = 15;
const BATTERY_DRAIN: f64 = 0.1;

/// Everything the dashboard shows. Only [`Engine`] writes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardState {
    /// All readings of the session, oldest first
    pub temperature_history: Vec<TemperatureReading>,
    pub threshold_settings: ThresholdSettings,
    /// Newest first
    pub alerts: VecDeque<Alert>,
    pub device_status: DeviceStatus,
    pub connection_status: ConnectionStatus,
    pub control: ControlState,
    /// Unit new readings are recorded in
    pub unit: TemperatureUnit,
    pub time_range: TimeRange,
    /// A refresh is in flight
    pub is_loading: bool,
    /// The chart is switching time range
    pub is_range_loading: bool,
    /// Countdown to the next refresh, 0-100
    pub refresh_progress: f64,
}

impl DashboardState {
    pub fn mode(&self) -> ControlMode {
        self.control.mode()
    }

    pub fn current_temperature(&self) -> Option<&TemperatureReading> {
        self.temperature_history.last()
    }

    /// Readings inside the selected time range, relative to `now`.
    pub fn visible_history(&self, now: OffsetDateTime) -> Vec<&TemperatureReading> {
        match self.time_range.window() {
            Some(window) => self
                .temperature_history
                .iter()
                .filter(|reading| now - reading.timestamp <= window)
                .collect(),
            None => self.temperature_history.iter().collect(),
        }
    }

    pub fn alerts(&self, filter: AlertFilter) -> Vec<&Alert> {
        self.alerts.iter().filter(|alert| filter.matches(alert)).collect()
    }

    pub fn unresolved_alert_count(&self) -> usize {
        self.alerts.iter().filter(|alert| !alert.resolved).count()
    }
}

pub struct Engine {
    state: DashboardState,
    next_alert_id: u64,
    progress_ticks: u32,
    rng: StdRng,
}

impl Engine {
    pub fn new(threshold_settings: ThresholdSettings, unit: TemperatureUnit) -> Self {
        Self::with_rng(threshold_settings, unit, StdRng::from_os_rng())
    }

    pub fn with_rng(threshold_settings: ThresholdSettings, unit: TemperatureUnit, rng: StdRng) -> Self {
        Self {
            state: DashboardState {
                temperature_history: Vec::new(),
                threshold_settings,
                alerts: VecDeque::new(),
                device_status: DeviceStatus::default(),
                connection_status: ConnectionStatus::default(),
                control: ControlState::default(),
                unit,
                time_range: TimeRange::default(),
                is_loading: false,
                is_range_loading: false,
                refresh_progress: 0.0,
            },
            next_alert_id: 1,
            progress_ticks: 0,
            rng,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.threshold_settings(), settings.simulation.unit)
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn snapshot(&self) -> DashboardState {
        self.state.clone()
    }

    /// Backfills the history with simulated hourly readings.
    pub fn seed_history(&mut self, days: u32) {
        let seeded = simulate::seed_history(days, self.state.unit, OffsetDateTime::now_utc(), &mut self.rng);
        self.load_history(seeded);
    }

    /// Places `readings` before the current history, in the display unit.
    /// Nothing is evaluated.
    pub fn load_history(&mut self, readings: Vec<TemperatureReading>) {
        debug!("Loaded {} historical readings", readings.len());

        let unit = self.state.unit;
        let mut readings: Vec<_> = readings.iter().map(|reading| reading.converted(unit)).collect();
        readings.append(&mut self.state.temperature_history);
        self.state.temperature_history = readings;
    }

    /// Enters the loading state. Returns false, changing nothing, while power is off.
    pub fn begin_refresh(&mut self) -> bool {
        if !self.state.control.is_power_on {
            return false;
        }

        self.state.is_loading = true;
        self.set_progress(0);

        true
    }

    /// Records a new reading and leaves the loading state.
    ///
    /// `external` comes from the feed; without it the simulator draws from
    /// the bounds of the current control state. Completes even if power went
    /// off since [`Engine::begin_refresh`]. Returns `None` when the feed
    /// repeats the sample already at the end of the history.
    pub fn complete_refresh(&mut self, external: Option<TemperatureReading>) -> Option<TemperatureReading> {
        self.state.is_loading = false;

        let source = match external {
            Some(external) if self.is_latest(&external) => {
                debug!("Feed sample at {} already recorded", external.timestamp);
                return None;
            }
            Some(external) => external,
            None => {
                let bounds = GenerationBounds::for_control(&self.state.control);
                TemperatureReading::celsius(simulate::draw(bounds, &mut self.rng))
            }
        };

        let reading = source.converted(self.state.unit);
        self.record_reading(source);

        Some(reading)
    }

    /// Refresh without simulated latency. `None` while power is off.
    pub fn refresh_now(&mut self) -> Option<TemperatureReading> {
        if self.begin_refresh() {
            self.complete_refresh(None)
        } else {
            None
        }
    }

    /// Appends `reading` in the display unit and evaluates it at full precision.
    pub fn record_reading(&mut self, reading: TemperatureReading) -> Option<Alert> {
        debug!("Reading {}{}", reading.value, reading.unit.symbol());

        self.state.temperature_history.push(reading.converted(self.state.unit));
        self.evaluate(&reading)
    }

    fn is_latest(&self, reading: &TemperatureReading) -> bool {
        self.state
            .current_temperature()
            .is_some_and(|last| last.timestamp == reading.timestamp)
    }

    fn evaluate(&mut self, reading: &TemperatureReading) -> Option<Alert> {
        let celsius = reading.exact_in(TemperatureUnit::Celsius);
        let thresholds = &self.state.threshold_settings;
        let value = reading.exact_in(thresholds.unit);
        let symbol = thresholds.unit.symbol();
        let control = &self.state.control;

        let message = if celsius > SAFETY_LIMIT_CELSIUS && !control.show_warning_popup && !control.is_heater_active {
            self.state.control.show_warning_popup = true;
            format!("Temperature exceeded {SAFETY_LIMIT_CELSIUS}°C! Consider activating heater control.")
        } else if value > thresholds.max {
            format!("Temperature exceeded maximum threshold ({}{symbol})", thresholds.max)
        } else if value < thresholds.min {
            format!("Temperature below minimum threshold ({}{symbol})", thresholds.min)
        } else {
            return None;
        };

        Some(self.push_alert(message, AlertKind::Critical))
    }

    fn push_alert(&mut self, message: String, kind: AlertKind) -> Alert {
        let alert = Alert {
            id: AlertId(self.next_alert_id),
            timestamp: OffsetDateTime::now_utc(),
            message,
            kind,
            resolved: false,
        };
        self.next_alert_id += 1;

        warn!(id = %alert.id, "{}", alert.message);

        self.state.alerts.push_front(alert.clone());
        alert
    }

    pub fn set_power(&mut self, on: bool) {
        let control = &mut self.state.control;
        let changed = control.is_power_on != on;
        control.is_power_on = on;

        if !on {
            control.is_heater_active = false;
            control.is_sprayer_active = false;
        }

        self.state.device_status.is_online = on;
        if changed {
            self.set_progress(0);
        }

        info!("Power {}", if on { "on" } else { "off" });
    }

    /// Flips the heater. Turning it on clears the warning; turning it off stops the sprayer.
    pub fn toggle_heater(&mut self) -> Result<bool, ControlError> {
        let control = &mut self.state.control;
        if !control.is_power_on {
            return Err(ControlError::PowerOff);
        }

        control.is_heater_active = !control.is_heater_active;

        if control.is_heater_active {
            control.show_warning_popup = false;
        } else {
            control.is_sprayer_active = false;
        }

        info!("Heater {} ({:?})", if control.is_heater_active { "on" } else { "off" }, control.mode());

        Ok(control.is_heater_active)
    }

    pub fn toggle_sprayer(&mut self) -> Result<bool, ControlError> {
        let control = &mut self.state.control;
        if !control.is_power_on {
            return Err(ControlError::PowerOff);
        }
        if !control.is_heater_active {
            return Err(ControlError::HeaterInactive);
        }

        control.is_sprayer_active = !control.is_sprayer_active;

        info!("Sprayer {} ({:?})", if control.is_sprayer_active { "on" } else { "off" }, control.mode());

        Ok(control.is_sprayer_active)
    }

    pub fn set_heater_rpm(&mut self, rpm: u32) {
        self.state.control.heater_rpm = rpm;

        debug!("Heater RPM {}", rpm);
    }

    pub fn dismiss_warning(&mut self) {
        self.state.control.show_warning_popup = false;
    }

    pub fn update_threshold_settings(&mut self, update: &ThresholdUpdate) {
        let merged = self.state.threshold_settings.merge(update);

        if !merged.is_ordered() {
            warn!("Threshold minimum {} is above maximum {}", merged.min, merged.max);
        }

        self.state.threshold_settings = merged;
    }

    /// Switches the display unit, converting the history and the thresholds.
    pub fn change_temperature_unit(&mut self, unit: TemperatureUnit) {
        self.state.unit = unit;
        for reading in &mut self.state.temperature_history {
            *reading = reading.converted(unit);
        }
        self.update_threshold_settings(&ThresholdUpdate {
            unit: Some(unit),
            ..ThresholdUpdate::default()
        });
    }

    /// Marks one alert resolved. Returns false when the id is unknown.
    pub fn resolve_alert(&mut self, id: AlertId) -> bool {
        match self.state.alerts.iter_mut().find(|alert| alert.id == id) {
            Some(alert) => {
                alert.resolved = true;
                true
            }
            None => false,
        }
    }

    /// Marks every alert resolved and returns how many were still open.
    pub fn resolve_all_alerts(&mut self) -> usize {
        let open = self.state.unresolved_alert_count();
        self.state.alerts.iter_mut().for_each(|alert| alert.resolved = true);
        open
    }

    pub fn change_time_range(&mut self, range: TimeRange) {
        self.state.time_range = range;
        self.state.is_range_loading = true;
    }

    pub fn finish_time_range_change(&mut self) {
        self.state.is_range_loading = false;
    }

    pub fn tick_progress(&mut self) {
        let ticks = if self.progress_ticks >= PROGRESS_STEPS {
            0
        } else {
            self.progress_ticks + 1
        };
        self.set_progress(ticks);
    }

    pub fn tick_battery(&mut self) {
        let status = &mut self.state.device_status;
        status.battery_level = round_tenth((status.battery_level - BATTERY_DRAIN).max(0.0));
        status.last_seen = OffsetDateTime::now_utc();
    }

    fn set_progress(&mut self, ticks: u32) {
        self.progress_ticks = ticks;
        self.state.refresh_progress = ticks as f64 * 100.0 / PROGRESS_STEPS as f64;
    }
}
