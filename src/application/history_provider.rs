// Provider trait for authoritative channel history
use crate::domain::channel::{ChannelId, MetricSample};
use async_trait::async_trait;

#[async_trait]
pub trait HistoryProvider: Send + Sync {
    /// Fetch the recent history of one channel, oldest record first.
    /// An empty vector means the provider has nothing yet.
    async fn fetch_history(&self, channel: ChannelId) -> anyhow::Result<Vec<MetricSample>>;
}
