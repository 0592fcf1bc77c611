// Chart and tile view models derived from channel history
use super::channel::{ChannelId, FocusOption, MetricSample};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesData {
    pub name: String,
    pub color: String,
    pub fill: Option<String>,
    pub values: Vec<f64>,
}

impl SeriesData {
    pub fn new(name: &str, color: &str, fill: Option<&str>, values: Vec<f64>) -> Self {
        Self {
            name: name.to_string(),
            color: color.to_string(),
            fill: fill.map(str::to_string),
            values,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub id: String,
    pub labels: Vec<String>,
    pub series: Vec<SeriesData>,
}

impl ChartData {
    pub fn new(id: String, labels: Vec<String>, series: Vec<SeriesData>) -> Self {
        Self { id, labels, series }
    }

    /// Focus chart for `option` over the retained samples, in buffer order
    pub fn focus<'a>(
        option: FocusOption,
        samples: impl IntoIterator<Item = &'a MetricSample>,
    ) -> Self {
        let (labels, values): (Vec<String>, Vec<f64>) = samples
            .into_iter()
            .map(|s| (s.time_label(), s.first_truthy(option.value_fields())))
            .unzip();

        let series = SeriesData::new(option.label(), option.color(), Some(option.fill()), values);
        Self::new("focus".to_string(), labels, vec![series])
    }

    /// Dedicated chart for one channel; attitude plots all three axes
    pub fn for_channel<'a>(
        channel: ChannelId,
        samples: impl IntoIterator<Item = &'a MetricSample>,
    ) -> Self {
        let samples: Vec<&MetricSample> = samples.into_iter().collect();
        let labels = samples.iter().map(|s| s.time_label()).collect();

        let series = channel_series(channel)
            .iter()
            .map(|spec| {
                let values = samples.iter().map(|s| s.first_truthy(spec.fields)).collect();
                SeriesData::new(spec.name, spec.color, spec.fill, values)
            })
            .collect();

        Self::new(channel.to_string(), labels, series)
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

struct SeriesSpec {
    name: &'static str,
    color: &'static str,
    fill: Option<&'static str>,
    fields: &'static [&'static str],
}

fn channel_series(channel: ChannelId) -> &'static [SeriesSpec] {
    match channel {
        ChannelId::Thermal => &[SeriesSpec {
            name: "Temperature (°C)",
            color: "#f44336",
            fill: None,
            fields: &["internal", "processor"],
        }],
        ChannelId::Battery => &[SeriesSpec {
            name: "Battery Level (%)",
            color: "#2196f3",
            fill: Some("rgba(33, 150, 243, 0.2)"),
            fields: &["level"],
        }],
        ChannelId::Power => &[SeriesSpec {
            name: "Consumption (W)",
            color: "#ff9800",
            fill: Some("rgba(255, 152, 0, 0.2)"),
            fields: &["total_watts"],
        }],
        ChannelId::Attitude => &[
            SeriesSpec {
                name: "Roll (°)",
                color: "#4caf50",
                fill: None,
                fields: &["roll"],
            },
            SeriesSpec {
                name: "Pitch (°)",
                color: "#9c27b0",
                fill: None,
                fields: &["pitch"],
            },
            SeriesSpec {
                name: "Yaw (°)",
                color: "#ff5722",
                fill: None,
                fields: &["yaw"],
            },
        ],
    }
}

/// Latest-reading tile shown in the status panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileData {
    pub id: String,
    pub value: f64,
    pub display: String,
}

impl TileData {
    pub fn latest_reading(channel: ChannelId, sample: &MetricSample) -> Option<Self> {
        let (value, display) = match channel {
            ChannelId::Thermal => {
                let temp = sample.first_truthy(&["internal", "processor"]);
                (temp, format!("{:.1}°C", temp))
            }
            ChannelId::Battery => {
                let level = sample.field("level")?;
                (level, format!("{:.1}%", level))
            }
            ChannelId::Power => {
                let watts = sample.field("total_watts")?;
                (watts, format!("{:.2}W", watts))
            }
            ChannelId::Attitude => return None,
        };

        Some(Self {
            id: channel.to_string(),
            value,
            display,
        })
    }
}
