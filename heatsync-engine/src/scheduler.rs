use std::future;
use std::sync::Arc;
use std::time::Duration;

use heatsync_api::models::{AlertId, ControlMode, TemperatureReading, TemperatureUnit, ThresholdUpdate, TimeRange};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::engine::{DashboardState, Engine};
use crate::errors::{ControlError, EngineError};
use crate::feed::FeedClient;
use crate::settings::Simulation;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Refresh,
    SetPower(bool),
    ToggleHeater,
    ToggleSprayer,
    SetHeaterRpm(u32),
    DismissWarning,
    UpdateThresholds(ThresholdUpdate),
    ChangeUnit(TemperatureUnit),
    ResolveAlert(AlertId),
    ResolveAllAlerts,
    ChangeTimeRange(TimeRange),
    Shutdown,
}

struct Request {
    command: Command,
    reply: oneshot::Sender<Result<(), EngineError>>,
}

/// Work that finishes after a delay and re-enters the loop.
#[derive(Debug)]
enum Deferred {
    Refresh(Option<TemperatureReading>),
    TimeRangeSettled,
}

/// Cloneable front of the engine loop. Writes go through commands, reads
/// through the published state.
#[derive(Clone)]
pub struct DashboardHandle {
    requests: mpsc::Sender<Request>,
    state: watch::Receiver<DashboardState>,
}

impl DashboardHandle {
    /// Sends `command` and waits until the loop has applied and published it.
    pub async fn send(&self, command: Command) -> Result<(), EngineError> {
        let (reply, response) = oneshot::channel();

        self.requests
            .send(Request { command, reply })
            .await
            .map_err(|_| EngineError::Closed)?;

        response.await.map_err(|_| EngineError::Closed)?
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.clone()
    }

    pub fn state(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    pub async fn refresh(&self) -> Result<(), EngineError> {
        self.send(Command::Refresh).await
    }

    pub async fn set_power(&self, on: bool) -> Result<(), EngineError> {
        self.send(Command::SetPower(on)).await
    }

    pub async fn toggle_heater(&self) -> Result<(), EngineError> {
        self.send(Command::ToggleHeater).await
    }

    pub async fn toggle_sprayer(&self) -> Result<(), EngineError> {
        self.send(Command::ToggleSprayer).await
    }

    pub async fn set_heater_rpm(&self, rpm: u32) -> Result<(), EngineError> {
        self.send(Command::SetHeaterRpm(rpm)).await
    }

    pub async fn dismiss_warning(&self) -> Result<(), EngineError> {
        self.send(Command::DismissWarning).await
    }

    pub async fn update_threshold_settings(&self, update: ThresholdUpdate) -> Result<(), EngineError> {
        self.send(Command::UpdateThresholds(update)).await
    }

    pub async fn change_temperature_unit(&self, unit: TemperatureUnit) -> Result<(), EngineError> {
        self.send(Command::ChangeUnit(unit)).await
    }

    pub async fn resolve_alert(&self, id: AlertId) -> Result<(), EngineError> {
        self.send(Command::ResolveAlert(id)).await
    }

    pub async fn resolve_all_alerts(&self) -> Result<(), EngineError> {
        self.send(Command::ResolveAllAlerts).await
    }

    pub async fn change_time_range(&self, range: TimeRange) -> Result<(), EngineError> {
        self.send(Command::ChangeTimeRange(range)).await
    }

    pub async fn shutdown(&self) -> Result<(), EngineError> {
        self.send(Command::Shutdown).await
    }
}

/// Starts the loop owning `engine` on the current runtime.
pub fn spawn(engine: Engine, simulation: Simulation, feed: Option<FeedClient>) -> (DashboardHandle, JoinHandle<()>) {
    let (requests_tx, requests_rx) = mpsc::channel(32);
    let (deferred_tx, deferred_rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(engine.snapshot());

    let scheduler = Scheduler {
        engine,
        simulation,
        feed: feed.map(Arc::new),
        state_tx,
        deferred_tx,
        refresh_timer: None,
        progress_timer: None,
    };

    let task = tokio::spawn(scheduler.run(requests_rx, deferred_rx));

    (
        DashboardHandle {
            requests: requests_tx,
            state: state_rx,
        },
        task,
    )
}

struct Scheduler {
    engine: Engine,
    simulation: Simulation,
    feed: Option<Arc<FeedClient>>,
    state_tx: watch::Sender<DashboardState>,
    deferred_tx: mpsc::UnboundedSender<Deferred>,
    /// Armed only while power is on
    refresh_timer: Option<Interval>,
    /// Armed only while power is on
    progress_timer: Option<Interval>,
}

impl Scheduler {
    async fn run(mut self, mut requests: mpsc::Receiver<Request>, mut deferred: mpsc::UnboundedReceiver<Deferred>) {
        let mut battery_timer = periodic(self.simulation.battery_interval());

        if self.engine.state().control.is_power_on {
            self.arm_timers();
        }

        loop {
            tokio::select! {
                request = requests.recv() => match request {
                    Some(Request { command: Command::Shutdown, reply }) => {
                        let _ = reply.send(Ok(()));
                        break;
                    }
                    Some(Request { command, reply }) => {
                        let result = self.apply(command);
                        self.publish();
                        let _ = reply.send(result);
                    }
                    None => break,
                },
                Some(event) = deferred.recv() => {
                    match event {
                        Deferred::Refresh(external) => {
                            self.engine.complete_refresh(external);
                        }
                        Deferred::TimeRangeSettled => self.engine.finish_time_range_change(),
                    }
                    self.publish();
                }
                _ = tick(&mut self.refresh_timer) => {
                    self.start_refresh();
                    self.publish();
                }
                _ = tick(&mut self.progress_timer) => {
                    self.engine.tick_progress();
                    self.publish();
                }
                _ = battery_timer.tick() => {
                    self.engine.tick_battery();
                    self.publish();
                }
            }
        }

        tracing::debug!("Engine loop stopped");
    }

    fn apply(&mut self, command: Command) -> Result<(), EngineError> {
        match command {
            Command::Refresh => self.start_refresh(),
            Command::SetPower(on) => {
                let was_on = self.engine.state().control.is_power_on;
                self.engine.set_power(on);

                match (was_on, on) {
                    (false, true) => self.arm_timers(),
                    (_, false) => self.disarm_timers(),
                    _ => {}
                }
            }
            Command::ToggleHeater => {
                let mode = self.engine.state().mode();
                self.engine.toggle_heater().map_err(|source| rejected(mode, source))?;
            }
            Command::ToggleSprayer => {
                let mode = self.engine.state().mode();
                self.engine.toggle_sprayer().map_err(|source| rejected(mode, source))?;
            }
            Command::SetHeaterRpm(rpm) => self.engine.set_heater_rpm(rpm),
            Command::DismissWarning => self.engine.dismiss_warning(),
            Command::UpdateThresholds(update) => self.engine.update_threshold_settings(&update),
            Command::ChangeUnit(unit) => self.engine.change_temperature_unit(unit),
            Command::ResolveAlert(id) => {
                if !self.engine.resolve_alert(id) {
                    tracing::debug!("Alert {} not found", id);
                }
            }
            Command::ResolveAllAlerts => {
                self.engine.resolve_all_alerts();
            }
            Command::ChangeTimeRange(range) => {
                self.engine.change_time_range(range);
                self.defer(self.simulation.range_delay(), Deferred::TimeRangeSettled);
            }
            Command::Shutdown => {}
        }

        Ok(())
    }

    /// Enters the loading state and completes the refresh off-loop.
    /// An in-flight refresh is never cancelled, not even by power off.
    fn start_refresh(&mut self) {
        if !self.engine.begin_refresh() {
            tracing::debug!("Refresh skipped, power is off");
            return;
        }

        let deferred_tx = self.deferred_tx.clone();
        let latency = self.simulation.latency();
        let feed = self.feed.clone();

        tokio::spawn(async move {
            let external = match feed {
                Some(feed) => match feed.fetch_latest().await {
                    Ok(reading) => Some(reading),
                    Err(e) => {
                        tracing::warn!("Feed unavailable, simulating reading: {}", e);
                        None
                    }
                },
                None => {
                    time::sleep(latency).await;
                    None
                }
            };

            let _ = deferred_tx.send(Deferred::Refresh(external));
        });
    }

    fn defer(&self, delay: Duration, event: Deferred) {
        let deferred_tx = self.deferred_tx.clone();

        tokio::spawn(async move {
            time::sleep(delay).await;
            let _ = deferred_tx.send(event);
        });
    }

    fn arm_timers(&mut self) {
        self.refresh_timer = Some(periodic(self.simulation.refresh_interval()));
        self.progress_timer = Some(periodic(self.simulation.progress_interval()));
    }

    fn disarm_timers(&mut self) {
        self.refresh_timer = None;
        self.progress_timer = None;
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.engine.snapshot());
    }
}

fn rejected(mode: ControlMode, source: ControlError) -> EngineError {
    tracing::warn!("Rejected in {:?}: {}", mode, source);

    EngineError::Control { mode, source }
}

/// Interval whose first tick is one full period away.
fn periodic(period: Duration) -> Interval {
    let period = period.max(Duration::from_millis(1));
    let mut timer = time::interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    timer
}

async fn tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => future::pending().await,
    }
}
