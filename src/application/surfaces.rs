// Render targets the dashboard draws into
use crate::domain::attitude::Rotation;
use crate::domain::channel::ChannelId;
use crate::domain::error::DashboardError;
use crate::domain::status::StatusView;
use crate::domain::telemetry::{ChartData, TileData};
use std::sync::Arc;

/// The shared chart bound to the current focus selection
pub trait FocusSurface: Send + Sync {
    fn render_focus(&self, chart: &ChartData) -> Result<(), DashboardError>;
}

/// Per-channel charts and latest-reading tiles
pub trait ChannelSurface: Send + Sync {
    fn render_channel(
        &self,
        channel: ChannelId,
        chart: &ChartData,
        tile: Option<&TileData>,
    ) -> Result<(), DashboardError>;
}

/// The 3D orientation indicator
pub trait AttitudeSurface: Send + Sync {
    fn render_rotation(&self, rotation: Rotation) -> Result<(), DashboardError>;
}

/// Consumer of connection state, status summary and log
pub trait StatusSink: Send + Sync {
    fn publish_status(&self, status: &StatusView) -> Result<(), DashboardError>;
}

/// Surfaces present on the current page variant. Any of them may be absent.
#[derive(Clone, Default)]
pub struct Surfaces {
    pub focus: Option<Arc<dyn FocusSurface>>,
    pub channels: Option<Arc<dyn ChannelSurface>>,
    pub attitude: Option<Arc<dyn AttitudeSurface>>,
    pub status: Option<Arc<dyn StatusSink>>,
}

/// Draw into an optional surface. A missing target is a no-op.
pub(crate) fn draw<S: ?Sized>(
    surface: Option<&Arc<S>>,
    target: &'static str,
    render: impl FnOnce(&S) -> Result<(), DashboardError>,
) {
    let result = match surface {
        Some(surface) => render(&**surface),
        None => Err(DashboardError::MissingRenderTarget(target)),
    };

    match result {
        Ok(()) => {}
        Err(DashboardError::MissingRenderTarget(target)) => {
            tracing::trace!(target_surface = target, "render target missing, skipping draw");
        }
        Err(e) => tracing::warn!(target_surface = target, "draw failed: {}", e),
    }
}
