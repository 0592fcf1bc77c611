// Channel and sample domain models
use super::error::DashboardError;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::str::FromStr;

/// The telemetry channels the dashboard knows how to display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelId {
    Thermal,
    Battery,
    Attitude,
    Power,
}

impl ChannelId {
    pub const ALL: [ChannelId; 4] = [
        ChannelId::Thermal,
        ChannelId::Battery,
        ChannelId::Attitude,
        ChannelId::Power,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelId::Thermal => "thermal",
            ChannelId::Battery => "battery",
            ChannelId::Attitude => "attitude",
            ChannelId::Power => "power",
        }
    }

    /// History resource served by the telemetry history provider
    pub fn default_resource(&self) -> &'static str {
        match self {
            ChannelId::Thermal => "thermal/temperatures",
            ChannelId::Battery => "power/battery",
            ChannelId::Attitude => "adcs/attitude",
            ChannelId::Power => "power/consumption",
        }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelId {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChannelId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| DashboardError::UnknownChannel(s.to_string()))
    }
}

/// Options of the focus-surface selection control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusOption {
    Temperature,
    Power,
    Battery,
}

impl FocusOption {
    pub const ALL: [FocusOption; 3] = [
        FocusOption::Temperature,
        FocusOption::Power,
        FocusOption::Battery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FocusOption::Temperature => "temperature",
            FocusOption::Power => "power",
            FocusOption::Battery => "battery",
        }
    }

    pub fn channel(&self) -> ChannelId {
        match self {
            FocusOption::Temperature => ChannelId::Thermal,
            FocusOption::Power => ChannelId::Power,
            FocusOption::Battery => ChannelId::Battery,
        }
    }

    pub fn for_channel(channel: ChannelId) -> Option<FocusOption> {
        FocusOption::ALL.into_iter().find(|o| o.channel() == channel)
    }

    /// Candidate fields tried in order when reading the plotted value.
    pub fn value_fields(&self) -> &'static [&'static str] {
        match self {
            FocusOption::Temperature => &["internal", "processor"],
            FocusOption::Power => &["total_watts"],
            FocusOption::Battery => &["level"],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FocusOption::Temperature => "Temperature (°C)",
            FocusOption::Power => "Power Consumption (W)",
            FocusOption::Battery => "Battery Level (%)",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            FocusOption::Temperature => "#f44336",
            FocusOption::Power => "#ff9800",
            FocusOption::Battery => "#2196f3",
        }
    }

    pub fn fill(&self) -> &'static str {
        match self {
            FocusOption::Temperature => "rgba(244, 67, 54, 0.2)",
            FocusOption::Power => "rgba(255, 152, 0, 0.2)",
            FocusOption::Battery => "rgba(33, 150, 243, 0.2)",
        }
    }
}

impl fmt::Display for FocusOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FocusOption {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FocusOption::ALL
            .into_iter()
            .find(|o| o.as_str() == s)
            .ok_or_else(|| DashboardError::UnknownFocusOption(s.to_string()))
    }
}

/// One discrete observation from the spacecraft.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSample {
    pub timestamp: DateTime<Utc>,
    pub fields: BTreeMap<String, f64>,
}

impl MetricSample {
    pub fn new(timestamp: DateTime<Utc>, fields: BTreeMap<String, f64>) -> Self {
        Self { timestamp, fields }
    }

    pub fn field(&self, name: &str) -> Option<f64> {
        self.fields.get(name).copied()
    }

    /// First candidate holding a truthy value (present, non-zero, not NaN), else 0.
    ///
    /// A genuine reading of 0 is indistinguishable from a missing one here.
    pub fn first_truthy(&self, candidates: &[&str]) -> f64 {
        candidates
            .iter()
            .filter_map(|name| self.field(name))
            .find(|v| *v != 0.0 && !v.is_nan())
            .unwrap_or(0.0)
    }

    /// Axis label, e.g. "10:01:00"
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

/// Parse an ISO-8601 timestamp; values without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// A named, bounded time series. Samples are kept in arrival order.
#[derive(Debug, Clone)]
pub struct Channel {
    samples: VecDeque<MetricSample>,
    max_length: usize,
}

impl Channel {
    pub fn new(max_length: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(max_length),
            max_length,
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Append, evicting from the front once the bound is reached
    pub fn push(&mut self, sample: MetricSample) {
        if self.max_length == 0 {
            return;
        }
        while self.samples.len() >= self.max_length {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn samples(&self) -> impl Iterator<Item = &MetricSample> {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&MetricSample> {
        self.samples.back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(secs: i64, fields: &[(&str, f64)]) -> MetricSample {
        MetricSample::new(
            DateTime::from_timestamp(secs, 0).unwrap(),
            fields.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        )
    }

    #[test]
    fn test_first_truthy_follows_candidate_order() {
        let both = sample(0, &[("internal", 21.5), ("processor", 40.0)]);
        assert_eq!(both.first_truthy(&["internal", "processor"]), 21.5);

        let processor_only = sample(0, &[("processor", 40.0)]);
        assert_eq!(processor_only.first_truthy(&["internal", "processor"]), 40.0);

        let neither = sample(0, &[("level", 80.0)]);
        assert_eq!(neither.first_truthy(&["internal", "processor"]), 0.0);
    }

    #[test]
    fn test_first_truthy_treats_zero_as_missing() {
        let zero_internal = sample(0, &[("internal", 0.0), ("processor", 38.0)]);
        assert_eq!(zero_internal.first_truthy(&["internal", "processor"]), 38.0);

        let nan_level = sample(0, &[("level", f64::NAN)]);
        assert_eq!(nan_level.first_truthy(&["level"]), 0.0);
    }

    #[test]
    fn test_parse_timestamp() {
        let naive = parse_timestamp("2025-06-05T10:00:00").unwrap();
        assert_eq!(naive.to_rfc3339(), "2025-06-05T10:00:00+00:00");

        let offset = parse_timestamp("2025-06-05T12:00:00+02:00").unwrap();
        assert_eq!(offset, naive);

        let fractional = parse_timestamp("2025-06-05T10:00:00.250").unwrap();
        assert_eq!(fractional.timestamp_subsec_millis(), 250);

        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_time_label() {
        let s = MetricSample::new(parse_timestamp("2025-06-05T10:01:07").unwrap(), BTreeMap::new());
        assert_eq!(s.time_label(), "10:01:07");
    }

    #[test]
    fn test_channel_evicts_oldest() {
        let mut channel = Channel::new(2);
        for secs in 0..5 {
            channel.push(sample(secs, &[("level", secs as f64)]));
        }
        let kept: Vec<f64> = channel.samples().map(|s| s.field("level").unwrap()).collect();
        assert_eq!(kept, vec![3.0, 4.0]);
        assert_eq!(channel.latest().unwrap().field("level"), Some(4.0));
    }

    #[test]
    fn test_names_round_trip() {
        for id in ChannelId::ALL {
            assert_eq!(id.as_str().parse::<ChannelId>().unwrap(), id);
        }
        assert_eq!(
            "adcs".parse::<ChannelId>(),
            Err(DashboardError::UnknownChannel("adcs".to_string()))
        );
        assert_eq!("battery".parse::<FocusOption>().unwrap(), FocusOption::Battery);
        assert!("attitude".parse::<FocusOption>().is_err());
        assert_eq!(FocusOption::for_channel(ChannelId::Attitude), None);
        assert_eq!(FocusOption::for_channel(ChannelId::Thermal), Some(FocusOption::Temperature));
    }
}
