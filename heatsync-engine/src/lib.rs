use std::error::Error;
use std::sync::Arc;

use heatsync_api::format::{format_battery_percentage, format_temperature, format_time_ago};
use time::OffsetDateTime;

use crate::engine::Engine;
use crate::feed::FeedClient;
use crate::settings::Settings;

pub mod engine;
pub mod errors;
pub mod feed;
pub mod scheduler;
pub mod settings;
pub mod simulate;

/// Runs the engine headless until Ctrl-C, logging every new reading.
pub async fn run(settings: &Arc<Settings>) -> Result<(), Box<dyn Error>> {
    let mut engine = Engine::from_settings(settings);

    let feed = settings.feed.clone().map(FeedClient::new).transpose()?;
    match &feed {
        Some(client) => match client.fetch_recent().await {
            Ok(readings) => engine.load_history(readings),
            Err(e) => tracing::warn!("Feed history unavailable: {}", e),
        },
        None if settings.simulation.seed_days > 0 => engine.seed_history(settings.simulation.seed_days),
        None => {}
    }

    let (handle, task) = scheduler::spawn(engine, settings.simulation.clone(), feed);
    let mut state = handle.subscribe();
    let mut seen = state.borrow().temperature_history.len();

    tracing::info!("Engine started with {} readings", seen);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }

                let snapshot = state.borrow_and_update().clone();
                for reading in snapshot.temperature_history.iter().skip(seen) {
                    tracing::info!(
                        mode = ?snapshot.mode(),
                        open_alerts = snapshot.unresolved_alert_count(),
                        battery = %format_battery_percentage(snapshot.device_status.battery_level),
                        "Temperature {}",
                        format_temperature(reading.value, reading.unit)
                    );
                }
                seen = snapshot.temperature_history.len();
            }
            _ = &mut shutdown => {
                handle.shutdown().await?;
                break;
            }
        }
    }

    task.await?;

    let last_seen = handle.state().device_status.last_seen;
    tracing::info!("Device last seen {}", format_time_ago(last_seen, OffsetDateTime::now_utc()));

    Ok(())
}
