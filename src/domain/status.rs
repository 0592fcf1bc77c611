// Link status and operator log models
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::VecDeque;

pub const LOG_CAPACITY: usize = 100;

/// Status-widget text extracted from push payloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusSummary {
    pub latency: Option<String>,
    pub packet_loss: Option<String>,
    pub adcs_mode: Option<String>,
}

impl StatusSummary {
    /// Merge a `telemetry_update` payload. Fields the payload lacks keep their
    /// previous text.
    pub fn apply_payload(&mut self, payload: &Value) {
        let radio = &payload["communication"]["radio"];

        if let Some(latency) = radio["latency"].as_f64() {
            self.latency = Some(format!("{:.2}", latency));
        }

        let sent = radio["packets_sent"].as_f64().filter(|v| *v != 0.0);
        let received = radio["packets_received"].as_f64().filter(|v| *v != 0.0);
        if let (Some(sent), Some(received)) = (sent, received) {
            let loss = 100.0 - (received / sent) * 100.0;
            self.packet_loss = Some(format!("{:.1}", loss));
        }

        if let Some(mode) = payload["system"]["status"]["mode"].as_str().filter(|m| !m.is_empty()) {
            self.adcs_mode = Some(mode.to_string());
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkState {
    pub connected: bool,
    pub summary: StatusSummary,
    pub last_update: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub message: String,
}

/// Bounded operator log, oldest entries dropped first.
#[derive(Debug, Clone)]
pub struct EventLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::with_capacity(LOG_CAPACITY)
    }
}

impl EventLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.push_at(Utc::now(), message);
    }

    pub fn push_at(&mut self, at: DateTime<Utc>, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(target: "dashboard::log", "{}", message);
        self.entries.push_back(LogEntry { at, message });
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.push("Log cleared");
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Everything the status panel shows
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusView {
    pub connected: bool,
    pub summary: StatusSummary,
    pub last_update: Option<DateTime<Utc>>,
    pub log: Vec<LogEntry>,
}

impl StatusView {
    pub fn new(link: &LinkState, log: &EventLog) -> Self {
        Self {
            connected: link.connected,
            summary: link.summary.clone(),
            last_update: link.last_update,
            log: log.entries().cloned().collect(),
        }
    }
}
