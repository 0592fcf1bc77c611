// Periodic bulk refresh of channel history
use crate::application::dashboard::DashboardEvent;
use crate::application::history_provider::HistoryProvider;
use crate::application::time_series_store::TimeSeriesStore;
use crate::domain::channel::{ChannelId, MetricSample};
use crate::domain::error::DashboardError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, Interval, MissedTickBehavior};

pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(10);

/// Outcome of one channel fetch, delivered back to the event loop
#[derive(Debug, Clone)]
pub struct HistoryFetch {
    pub channel: ChannelId,
    pub outcome: Result<Vec<MetricSample>, DashboardError>,
}

#[derive(Clone)]
pub struct HistorySync {
    provider: Arc<dyn HistoryProvider>,
    channels: Vec<ChannelId>,
    period: Duration,
}

impl HistorySync {
    pub fn new(
        provider: Arc<dyn HistoryProvider>,
        channels: Vec<ChannelId>,
        period: Duration,
    ) -> Self {
        Self {
            provider,
            channels,
            period,
        }
    }

    pub fn channels(&self) -> &[ChannelId] {
        &self.channels
    }

    /// Sync clock. The first tick fires immediately, which is the startup fetch.
    pub fn ticker(&self) -> Interval {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker
    }

    /// Start one cycle: an isolated fetch task per channel.
    ///
    /// Fetches still in flight from an earlier cycle are not deduplicated;
    /// results reach `tx` in completion order.
    pub fn spawn_cycle(&self, tx: &mpsc::Sender<DashboardEvent>) {
        tracing::debug!(channels = self.channels.len(), "starting history sync cycle");

        for &channel in &self.channels {
            let provider = self.provider.clone();
            let tx = tx.clone();

            tokio::spawn(async move {
                let fetch = Self::fetch(provider.as_ref(), channel).await;
                if tx.send(DashboardEvent::History(fetch)).await.is_err() {
                    tracing::debug!(
                        channel = %channel,
                        "dashboard stopped, dropping history result"
                    );
                }
            });
        }
    }

    pub async fn fetch(provider: &dyn HistoryProvider, channel: ChannelId) -> HistoryFetch {
        let outcome = provider
            .fetch_history(channel)
            .await
            .map_err(|e| DashboardError::FetchFailure {
                channel,
                reason: format!("{:#}", e),
            });

        HistoryFetch { channel, outcome }
    }

    /// Apply a completed fetch. Returns whether the channel buffer changed.
    ///
    /// Failures and empty histories leave the buffer as it was.
    pub fn apply(fetch: HistoryFetch, store: &mut TimeSeriesStore) -> Result<bool, DashboardError> {
        let HistoryFetch { channel, outcome } = fetch;

        match outcome {
            Ok(samples) if samples.is_empty() => {
                tracing::debug!(channel = %channel, "empty history, no update");
                Ok(false)
            }
            Ok(samples) => {
                let received = samples.len();
                store.replace_recent(channel, samples)?;
                let buffer = store.channel(channel)?;
                tracing::debug!(
                    channel = %channel,
                    received,
                    kept = buffer.len(),
                    max_length = buffer.max_length(),
                    "history replaced"
                );
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(channel = %channel, "{}", e);
                Ok(false)
            }
        }
    }
}
