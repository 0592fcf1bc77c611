// Push notifications: connection indicator, status summary and operator log
use crate::application::dashboard::DashboardEvent;
use crate::application::surfaces::{draw, StatusSink};
use crate::domain::status::{EventLog, LinkState, StatusView};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Inbound notification from the push channel
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    Connected,
    Disconnected,
    /// Opaque status payload. Carries no per-channel samples.
    TelemetryUpdate(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRequest {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub parameters: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultInjection {
    #[serde(rename = "type")]
    pub kind: String,
    /// Milliseconds
    pub duration: i64,
    /// Percent
    pub probability: i64,
}

/// Fire-and-forget event sent to the ground segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum OutboundEvent {
    SendCommand(CommandRequest),
    InjectFault(FaultInjection),
}

#[async_trait]
pub trait PushChannel: Send + Sync {
    /// Keep the inbound side alive, forwarding notifications to the dashboard.
    /// Returns once the dashboard stops listening.
    async fn run(&self, tx: mpsc::Sender<DashboardEvent>);

    /// Send an outbound event. There is no acknowledgement.
    async fn emit(&self, event: OutboundEvent) -> anyhow::Result<()>;
}

pub struct LiveEventBridge {
    status_sink: Option<Arc<dyn StatusSink>>,
}

impl LiveEventBridge {
    pub fn new(status_sink: Option<Arc<dyn StatusSink>>) -> Self {
        Self { status_sink }
    }

    pub fn handle(&self, event: PushEvent, link: &mut LinkState, log: &mut EventLog) {
        self.handle_at(Utc::now(), event, link, log);
    }

    pub fn handle_at(
        &self,
        now: DateTime<Utc>,
        event: PushEvent,
        link: &mut LinkState,
        log: &mut EventLog,
    ) {
        match event {
            PushEvent::Connected => {
                link.connected = true;
                log.push_at(now, "Connected");
            }
            PushEvent::Disconnected => {
                link.connected = false;
                log.push_at(now, "Disconnected");
            }
            PushEvent::TelemetryUpdate(payload) => {
                log.push_at(now, format!("Telemetry received: {}", now.format("%H:%M:%S")));
                link.summary.apply_payload(&payload);
                link.last_update = Some(now);
            }
        }

        self.publish(link, log);
    }

    /// Log an operator-initiated outbound event.
    ///
    /// Returns false for events that must not be sent at all (fault type `NONE`).
    pub fn record_outbound(
        &self,
        event: &OutboundEvent,
        link: &LinkState,
        log: &mut EventLog,
    ) -> bool {
        match event {
            OutboundEvent::SendCommand(command) => {
                log.push(format!("Command {} sent to satellite", command.kind));
            }
            OutboundEvent::InjectFault(fault) if fault.kind == "NONE" => return false,
            OutboundEvent::InjectFault(fault) => {
                log.push(format!(
                    "Injecting fault: {} (duration: {}ms, probability: {}%)",
                    fault.kind, fault.duration, fault.probability
                ));
            }
        }

        self.publish(link, log);
        true
    }

    pub fn clear_log(&self, link: &LinkState, log: &mut EventLog) {
        log.clear();
        self.publish(link, log);
    }

    pub fn publish(&self, link: &LinkState, log: &EventLog) {
        let view = StatusView::new(link, log);
        draw(self.status_sink.as_ref(), "status", |s| s.publish_status(&view));
    }
}
