// Domain error taxonomy
use super::channel::ChannelId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DashboardError {
    /// A channel id that was never registered. Indicates a wiring bug.
    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    #[error("unknown focus option: {0}")]
    UnknownFocusOption(String),

    #[error("history fetch failed for {channel}: {reason}")]
    FetchFailure { channel: ChannelId, reason: String },

    /// The surface a component draws into is absent or has been torn down.
    #[error("render target {0} is not available")]
    MissingRenderTarget(&'static str),

    #[error("invalid attitude sample: roll={roll}, pitch={pitch}, yaw={yaw}")]
    InvalidAttitudeSample { roll: f64, pitch: f64, yaw: f64 },
}
