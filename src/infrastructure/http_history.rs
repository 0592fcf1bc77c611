// HTTP history provider implementation
use crate::application::history_provider::HistoryProvider;
use crate::domain::channel::{parse_timestamp, ChannelId, MetricSample};
use crate::infrastructure::config::history_url;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpHistoryProvider {
    client: reqwest::Client,
    urls: HashMap<ChannelId, String>,
}

impl HttpHistoryProvider {
    pub fn new<'a>(
        base_url: &str,
        resources: impl IntoIterator<Item = (ChannelId, &'a str)>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build history HTTP client")?;

        let urls = resources
            .into_iter()
            .map(|(id, resource)| (id, history_url(base_url, resource)))
            .collect();

        Ok(Self { client, urls })
    }

    fn url_for(&self, channel: ChannelId) -> Result<&str> {
        self.urls
            .get(&channel)
            .map(String::as_str)
            .with_context(|| format!("No history resource configured for {}", channel))
    }
}

#[async_trait]
impl HistoryProvider for HttpHistoryProvider {
    async fn fetch_history(&self, channel: ChannelId) -> Result<Vec<MetricSample>> {
        let url = self.url_for(channel)?;
        tracing::debug!(channel = %channel, %url, "fetching history");

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send history request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("History request failed with status {}: {}", status, body);
        }

        let payload = response
            .json::<Value>()
            .await
            .context("Failed to parse history response")?;

        parse_history(&payload)
    }
}

/// Decode a history payload: an array of records, each with an ISO-8601
/// `timestamp` and any number of numeric fields. Other fields are ignored.
pub fn parse_history(payload: &Value) -> Result<Vec<MetricSample>> {
    let records = payload
        .as_array()
        .context("History payload is not an array")?;

    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            parse_record(record)
                .with_context(|| format!("Malformed history record at index {}", index))
        })
        .collect()
}

fn parse_record(record: &Value) -> Result<MetricSample> {
    let object = record.as_object().context("record is not an object")?;

    let raw = object
        .get("timestamp")
        .and_then(Value::as_str)
        .context("missing timestamp")?;
    let timestamp =
        parse_timestamp(raw).with_context(|| format!("unparseable timestamp {:?}", raw))?;

    let fields: BTreeMap<String, f64> = object
        .iter()
        .filter(|(key, _)| key.as_str() != "timestamp")
        .filter_map(|(key, value)| value.as_f64().map(|v| (key.clone(), v)))
        .collect();

    Ok(MetricSample::new(timestamp, fields))
}
