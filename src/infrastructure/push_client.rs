// Push channel over a newline-delimited JSON event stream
use crate::application::dashboard::DashboardEvent;
use crate::application::live_event_bridge::{OutboundEvent, PushChannel, PushEvent};
use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::stream::Stream;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;

const TELEMETRY_UPDATE: &str = "telemetry_update";

/// Longest pending line accepted before the stream is dropped
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// One line of the event stream
#[derive(Debug, Deserialize)]
struct WireEvent {
    event: String,
    #[serde(default)]
    data: Value,
}

pub struct HttpPushChannel {
    client: reqwest::Client,
    events_url: String,
    request_timeout: Duration,
    reconnect_delay: Duration,
}

impl HttpPushChannel {
    pub fn new(
        base_url: &str,
        events_path: &str,
        request_timeout: Duration,
        reconnect_delay: Duration,
    ) -> Result<Self> {
        // No client-wide timeout: the inbound stream stays open indefinitely
        let client = reqwest::Client::builder()
            .connect_timeout(request_timeout)
            .build()
            .context("Failed to build push channel HTTP client")?;

        Ok(Self {
            client,
            events_url: format!(
                "{}/{}",
                base_url.trim_end_matches('/'),
                events_path.trim_start_matches('/')
            ),
            request_timeout,
            reconnect_delay,
        })
    }

    /// Hold one connection open until it ends.
    /// Returns `Ok(false)` once the dashboard has stopped listening.
    async fn stream_once(&self, tx: &mpsc::Sender<DashboardEvent>) -> Result<bool> {
        let response = self
            .client
            .get(&self.events_url)
            .header("Accept", "application/x-ndjson")
            .send()
            .await
            .context("Failed to open event stream")?;

        if !response.status().is_success() {
            anyhow::bail!("Event stream refused with status {}", response.status());
        }

        if tx.send(DashboardEvent::Push(PushEvent::Connected)).await.is_err() {
            return Ok(false);
        }

        let events = decode_events(response.bytes_stream());
        futures::pin_mut!(events);

        let outcome = loop {
            match events.next().await {
                Some(Ok(event)) => {
                    if tx.send(DashboardEvent::Push(event)).await.is_err() {
                        return Ok(false);
                    }
                }
                Some(Err(e)) => break Err(e),
                None => break Ok(true),
            }
        };

        if tx.send(DashboardEvent::Push(PushEvent::Disconnected)).await.is_err() {
            return Ok(false);
        }
        outcome
    }
}

#[async_trait]
impl PushChannel for HttpPushChannel {
    async fn run(&self, tx: mpsc::Sender<DashboardEvent>) {
        loop {
            match self.stream_once(&tx).await {
                Ok(false) => return,
                Ok(true) => tracing::info!(url = %self.events_url, "event stream closed"),
                Err(e) => tracing::warn!(url = %self.events_url, "event stream failed: {:#}", e),
            }

            if tx.is_closed() {
                return;
            }
            tokio::time::sleep(self.reconnect_delay).await;
        }
    }

    async fn emit(&self, event: OutboundEvent) -> Result<()> {
        let response = self
            .client
            .post(&self.events_url)
            .timeout(self.request_timeout)
            .json(&event)
            .send()
            .await
            .context("Failed to send outbound event")?;

        if !response.status().is_success() {
            anyhow::bail!("Outbound event rejected with status {}", response.status());
        }
        Ok(())
    }
}

/// Split a byte stream into push events, one JSON object per line
pub fn decode_events<S, E>(body: S) -> impl Stream<Item = Result<PushEvent>>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    async_stream::try_stream! {
        futures::pin_mut!(body);
        let mut buffer = BytesMut::new();
        // Bytes of `buffer` already known to hold no newline
        let mut scanned = 0;

        while let Some(chunk) = body.next().await {
            buffer.extend_from_slice(&chunk?);

            while let Some(offset) = buffer[scanned..].iter().position(|b| *b == b'\n') {
                let pos = scanned + offset;
                let line = buffer.split_to(pos + 1);
                scanned = 0;
                if let Some(event) = decode_line(&line[..pos]) {
                    yield event;
                }
            }
            scanned = buffer.len();

            if buffer.len() > MAX_LINE_BYTES {
                Err::<(), _>(anyhow::anyhow!(
                    "push event line exceeds {} bytes without a newline",
                    MAX_LINE_BYTES
                ))?;
            }
        }

        if let Some(event) = decode_line(&buffer) {
            yield event;
        }
    }
}

/// Blank keep-alive lines, unknown event names and malformed lines yield nothing
fn decode_line(line: &[u8]) -> Option<PushEvent> {
    let line = line.trim_ascii();
    if line.is_empty() {
        return None;
    }

    match serde_json::from_slice::<WireEvent>(line) {
        Ok(wire) if wire.event == TELEMETRY_UPDATE => Some(PushEvent::TelemetryUpdate(wire.data)),
        Ok(wire) => {
            tracing::debug!(event = %wire.event, "ignoring push event");
            None
        }
        Err(e) => {
            tracing::warn!("malformed push event: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::live_event_bridge::CommandRequest;
    use serde_json::json;

    async fn decode(chunks: &[&'static [u8]]) -> Vec<PushEvent> {
        let body = futures::stream::iter(
            chunks
                .iter()
                .map(|c| Ok::<_, std::io::Error>(Bytes::from_static(*c)))
                .collect::<Vec<_>>(),
        );
        decode_events(body)
            .map(|event| event.unwrap())
            .collect()
            .await
    }

    #[tokio::test]
    async fn test_events_split_across_chunks() {
        let events = decode(&[
            b"{\"event\":\"telemetry_update\",\"data\":{\"system\":",
            b"{\"status\":{\"mode\":\"SAFE\"}}}}\n\n{\"event\":\"status\",\"data\":{\"connected\":true}}\r\n",
            b"{\"event\":\"telemetry_update\",\"data\":{}}",
        ])
        .await;

        assert_eq!(
            events,
            vec![
                PushEvent::TelemetryUpdate(json!({"system": {"status": {"mode": "SAFE"}}})),
                PushEvent::TelemetryUpdate(json!({})),
            ]
        );
    }

    #[tokio::test]
    async fn test_malformed_lines_are_skipped() {
        let events = decode(&[b"not json\n{\"event\":\"telemetry_update\"}\n"]).await;
        assert_eq!(events, vec![PushEvent::TelemetryUpdate(Value::Null)]);
    }

    #[tokio::test]
    async fn test_transport_error_ends_stream() {
        let body = futures::stream::iter(vec![
            Ok(Bytes::from_static(b"{\"event\":\"telemetry_update\",\"data\":1}\n")),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ]);
        let results: Vec<Result<PushEvent>> = decode_events(body).collect().await;

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }

    #[tokio::test]
    async fn test_unterminated_line_is_bounded() {
        let filler = Bytes::from(vec![b'x'; 64 * 1024]);
        let chunks = std::iter::repeat(filler)
            .take(MAX_LINE_BYTES / (64 * 1024) + 1)
            .chain(std::iter::once(Bytes::from_static(
                b"\n{\"event\":\"telemetry_update\",\"data\":{}}\n",
            )))
            .map(Ok::<_, std::io::Error>);
        let results: Vec<Result<PushEvent>> =
            decode_events(futures::stream::iter(chunks)).collect().await;

        assert_eq!(results.len(), 1);
        let err = results[0].as_ref().unwrap_err();
        assert!(err.to_string().contains("without a newline"));
    }

    #[tokio::test]
    async fn test_long_line_across_many_chunks() {
        let mut line = br#"{"event":"telemetry_update","data":{"pad":""#.to_vec();
        line.extend(std::iter::repeat(b'x').take(10_000));
        line.extend_from_slice(b"\"}}\n");
        let chunks: Vec<_> = line
            .chunks(7)
            .map(|c| Ok::<_, std::io::Error>(Bytes::copy_from_slice(c)))
            .collect();

        let events: Vec<PushEvent> = decode_events(futures::stream::iter(chunks))
            .map(|event| event.unwrap())
            .collect()
            .await;

        assert_eq!(events.len(), 1);
        let PushEvent::TelemetryUpdate(data) = &events[0] else {
            panic!("expected a telemetry update");
        };
        assert_eq!(data["pad"].as_str().unwrap().len(), 10_000);
    }

    #[tokio::test]
    async fn test_emit_times_out_on_silent_server() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept connections and never answer
        let silent = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let channel = HttpPushChannel::new(
            &format!("http://{}", addr),
            "/events",
            Duration::from_millis(200),
            Duration::from_secs(5),
        )
        .unwrap();
        let command = OutboundEvent::SendCommand(CommandRequest {
            kind: "PING".to_string(),
            parameters: String::new(),
        });

        let outcome = tokio::time::timeout(Duration::from_secs(5), channel.emit(command))
            .await
            .expect("emit should give up on its own");
        assert!(outcome.is_err());

        silent.abort();
    }

    #[test]
    fn test_events_url() {
        let channel = HttpPushChannel::new(
            "http://localhost:5000/",
            "/events",
            Duration::from_secs(1),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(channel.events_url, "http://localhost:5000/events");
    }
}
