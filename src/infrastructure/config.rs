use crate::application::attitude_animator::SMOOTHING_FACTOR;
use crate::application::history_sync::DEFAULT_SYNC_INTERVAL;
use crate::domain::channel::ChannelId;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    #[serde(default)]
    pub server: ServerSettings,
    pub telemetry: TelemetrySettings,
    #[serde(default)]
    pub animation: AnimationSettings,
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelemetrySettings {
    pub base_url: String,
    #[serde(default = "default_events_path")]
    pub events_path: String,
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl TelemetrySettings {
    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnimationSettings {
    #[serde(default = "default_frame_rate_hz")]
    pub frame_rate_hz: u32,
    #[serde(default = "default_smoothing")]
    pub smoothing: f64,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            frame_rate_hz: default_frame_rate_hz(),
            smoothing: default_smoothing(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ChannelConfig {
    pub id: ChannelId,
    /// History resource, e.g. "power/battery"
    pub resource: Option<String>,
    #[serde(default = "default_max_length")]
    pub max_length: usize,
}

impl ChannelConfig {
    pub fn resource(&self) -> &str {
        self.resource
            .as_deref()
            .unwrap_or_else(|| self.id.default_resource())
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_events_path() -> String {
    "/events".to_string()
}

fn default_sync_interval_secs() -> u64 {
    DEFAULT_SYNC_INTERVAL.as_secs()
}

fn default_reconnect_delay_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    5
}

fn default_frame_rate_hz() -> u32 {
    60
}

fn default_smoothing() -> f64 {
    SMOOTHING_FACTOR
}

fn default_max_length() -> usize {
    100
}

impl DashboardConfig {
    /// Configured channels; all known channels when none are listed
    pub fn channels(&self) -> Vec<ChannelConfig> {
        if self.channels.is_empty() {
            return ChannelId::ALL
                .into_iter()
                .map(|id| ChannelConfig {
                    id,
                    resource: None,
                    max_length: default_max_length(),
                })
                .collect();
        }
        self.channels.clone()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.animation.frame_rate_hz == 0 {
            anyhow::bail!("animation.frame_rate_hz must be greater than zero");
        }
        if !(self.animation.smoothing > 0.0 && self.animation.smoothing <= 1.0) {
            anyhow::bail!("animation.smoothing must be in (0, 1]");
        }
        if self.telemetry.sync_interval_secs == 0 {
            anyhow::bail!("telemetry.sync_interval_secs must be greater than zero");
        }
        let mut seen = BTreeSet::new();
        for channel in &self.channels {
            if channel.max_length == 0 {
                anyhow::bail!("channel {} has max_length 0", channel.id);
            }
            if !seen.insert(channel.id) {
                anyhow::bail!("channel {} is configured more than once", channel.id);
            }
        }
        Ok(())
    }
}

pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard"))
        .add_source(config::Environment::with_prefix("GS").separator("__"))
        .build()?;

    let config: DashboardConfig = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

/// History endpoint for a resource, each path segment percent-encoded
pub fn history_url(base_url: &str, resource: &str) -> String {
    let path: Vec<String> = resource
        .trim_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    format!("{}/api/history/{}.json", base_url.trim_end_matches('/'), path.join("/"))
}
