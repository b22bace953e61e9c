use std::collections::HashMap;
use std::time::Duration;

use heatsync_api::models::{TemperatureReading, TemperatureUnit};
use serde::Deserialize;
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::errors::FeedError;
use crate::settings::Feed;

#[derive(Debug, Deserialize)]
struct ChannelFeed {
    feeds: Vec<FeedEntry>,
}

#[derive(Debug, Deserialize)]
struct FeedEntry {
    created_at: String,
    #[serde(flatten)]
    fields: HashMap<String, Value>,
}

impl FeedEntry {
    /// `None` when the timestamp or the temperature field does not parse.
    fn to_reading(&self, field: &str) -> Option<TemperatureReading> {
        let timestamp = OffsetDateTime::parse(&self.created_at, &Rfc3339).ok()?;
        let value = match self.fields.get(field)? {
            Value::String(raw) => raw.trim().parse::<f64>().ok()?,
            Value::Number(number) => number.as_f64()?,
            _ => return None,
        };

        value
            .is_finite()
            .then(|| TemperatureReading::new(timestamp, value, TemperatureUnit::Celsius))
    }
}

/// Client for a ThingSpeak style channel publishing Celsius readings.
pub struct FeedClient {
    client: reqwest::Client,
    feed: Feed,
}

impl FeedClient {
    pub fn new(feed: Feed) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { client, feed })
    }

    pub async fn fetch_recent(&self) -> Result<Vec<TemperatureReading>, FeedError> {
        let body = self
            .get("feeds.json", &[("results", self.feed.results.to_string())])
            .await?;

        parse_recent(&body, &self.feed.field)
    }

    pub async fn fetch_latest(&self) -> Result<TemperatureReading, FeedError> {
        let body = self.get("feeds/last.json", &[]).await?;

        parse_latest(&body, &self.feed.field)
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<u8>, FeedError> {
        let url = format!(
            "{}/channels/{}/{}",
            self.feed.base_url.trim_end_matches('/'),
            self.feed.channel_id,
            path
        );

        let mut request = self.client.get(&url).query(query);
        if let Some(api_key) = &self.feed.api_key {
            request = request.query(&[("api_key", api_key)]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(FeedError::Status(response.status().as_u16()));
        }

        tracing::debug!("Fetched {}", url);

        Ok(response.bytes().await?.to_vec())
    }
}

/// Parses a channel listing, discarding entries that do not parse.
pub fn parse_recent(body: &[u8], field: &str) -> Result<Vec<TemperatureReading>, FeedError> {
    let channel: ChannelFeed = serde_json::from_slice(body)?;

    Ok(channel
        .feeds
        .iter()
        .filter_map(|entry| entry.to_reading(field))
        .collect())
}

pub fn parse_latest(body: &[u8], field: &str) -> Result<TemperatureReading, FeedError> {
    let entry: FeedEntry = serde_json::from_slice(body)?;

    entry.to_reading(field).ok_or(FeedError::NoReadings)
}
