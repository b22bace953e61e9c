use heatsync_api::models::{TemperatureUnit, ThresholdSettings};
use heatsync_engine::engine::Engine;
use heatsync_engine::feed::FeedClient;
use heatsync_engine::scheduler::{self, DashboardHandle};
use heatsync_engine::settings::{Feed, Simulation};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::task::JoinHandle;

pub struct MockEngine {
    pub handle: DashboardHandle,
    pub task: JoinHandle<()>,
}

impl MockEngine {
    /// Engine with thresholds 19-24°C and the default timer layout.
    pub fn new() -> Self {
        Self::with_thresholds(19.0, 24.0)
    }

    pub fn with_thresholds(min: f64, max: f64) -> Self {
        let (handle, task) = scheduler::spawn(engine(min, max), simulation(), None);

        Self { handle, task }
    }

    /// Engine completing refreshes from `base_url` with no extra latency.
    pub fn with_feed(base_url: &str) -> Self {
        let feed = FeedClient::new(feed(base_url)).unwrap();
        let simulation = Simulation {
            latency_ms: 0,
            ..simulation()
        };
        let (handle, task) = scheduler::spawn(engine(19.0, 24.0), simulation, Some(feed));

        Self { handle, task }
    }
}

pub fn engine(min: f64, max: f64) -> Engine {
    let thresholds = ThresholdSettings {
        min,
        max,
        unit: TemperatureUnit::Celsius,
    };

    Engine::with_rng(thresholds, TemperatureUnit::Celsius, StdRng::seed_from_u64(7))
}

pub fn simulation() -> Simulation {
    Simulation {
        refresh_interval_secs: 15,
        progress_interval_secs: 1,
        battery_interval_secs: 30,
        latency_ms: 1000,
        range_delay_ms: 500,
        seed_days: 0,
        unit: TemperatureUnit::Celsius,
    }
}

pub fn feed(base_url: &str) -> Feed {
    Feed {
        base_url: base_url.to_string(),
        channel_id: 42,
        api_key: Some(String::from("read-key")),
        field: String::from("field1"),
        results: 10,
    }
}
