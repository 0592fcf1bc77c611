// Per-channel bounded history buffers
use crate::domain::channel::{Channel, ChannelId, MetricSample};
use crate::domain::error::DashboardError;
use std::collections::BTreeMap;

/// Owns every registered channel. Mutated only from the dashboard event loop.
#[derive(Debug, Default)]
pub struct TimeSeriesStore {
    channels: BTreeMap<ChannelId, Channel>,
}

impl TimeSeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a channel. Registering an existing id keeps its buffer.
    pub fn register(&mut self, id: ChannelId, max_length: usize) {
        self.channels
            .entry(id)
            .or_insert_with(|| Channel::new(max_length));
    }

    #[cfg(test)]
    pub fn channel_ids(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.channels.keys().copied()
    }

    pub fn channel(&self, id: ChannelId) -> Result<&Channel, DashboardError> {
        self.channels
            .get(&id)
            .ok_or_else(|| DashboardError::UnknownChannel(id.to_string()))
    }

    fn channel_mut(&mut self, id: ChannelId) -> Result<&mut Channel, DashboardError> {
        self.channels
            .get_mut(&id)
            .ok_or_else(|| DashboardError::UnknownChannel(id.to_string()))
    }

    pub fn append(&mut self, id: ChannelId, sample: MetricSample) -> Result<(), DashboardError> {
        self.channel_mut(id)?.push(sample);
        Ok(())
    }

    /// Replace the buffer wholesale with an authoritative history.
    ///
    /// Anything appended since the fetch was issued is dropped. Only the newest
    /// `max_length` samples of `samples` survive, in input order.
    pub fn replace_recent(
        &mut self,
        id: ChannelId,
        samples: impl IntoIterator<Item = MetricSample>,
    ) -> Result<(), DashboardError> {
        let channel = self.channel_mut(id)?;
        channel.clear();
        for sample in samples {
            channel.push(sample);
        }
        Ok(())
    }

    pub fn latest(&self, id: ChannelId) -> Result<Option<&MetricSample>, DashboardError> {
        Ok(self.channel(id)?.latest())
    }
}
