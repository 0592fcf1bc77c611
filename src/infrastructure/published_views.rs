// Render targets backed by watch channels, read by the HTTP layer
use crate::application::surfaces::{
    AttitudeSurface, ChannelSurface, FocusSurface, StatusSink, Surfaces,
};
use crate::domain::attitude::{AttitudeSample, Rotation};
use crate::domain::channel::{ChannelId, FocusOption, MetricSample};
use crate::domain::error::DashboardError;
use crate::domain::status::StatusView;
use crate::domain::telemetry::{ChartData, TileData};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelView {
    pub chart: ChartData,
    pub tile: Option<TileData>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AttitudeView {
    /// Radians, renderer axes
    pub rotation: Rotation,
    pub degrees: AttitudeSample,
}

pub struct PublishedViews {
    focus: watch::Sender<ChartData>,
    channels: watch::Sender<BTreeMap<ChannelId, ChannelView>>,
    attitude: watch::Sender<AttitudeView>,
    status: watch::Sender<StatusView>,
}

/// Read side handed to the presentation layer
#[derive(Clone)]
pub struct ViewReceivers {
    pub focus: watch::Receiver<ChartData>,
    pub channels: watch::Receiver<BTreeMap<ChannelId, ChannelView>>,
    pub attitude: watch::Receiver<AttitudeView>,
    pub status: watch::Receiver<StatusView>,
}

impl PublishedViews {
    pub fn new() -> (Arc<Self>, ViewReceivers) {
        let empty_focus = ChartData::focus(FocusOption::Power, std::iter::empty::<&MetricSample>());
        let (focus, focus_rx) = watch::channel(empty_focus);
        let (channels, channels_rx) = watch::channel(BTreeMap::new());
        let (attitude, attitude_rx) = watch::channel(AttitudeView::default());
        let (status, status_rx) = watch::channel(StatusView::default());

        let views = Arc::new(Self {
            focus,
            channels,
            attitude,
            status,
        });
        let receivers = ViewReceivers {
            focus: focus_rx,
            channels: channels_rx,
            attitude: attitude_rx,
            status: status_rx,
        };
        (views, receivers)
    }

    pub fn surfaces(self: &Arc<Self>) -> Surfaces {
        Surfaces {
            focus: Some(self.clone()),
            channels: Some(self.clone()),
            attitude: Some(self.clone()),
            status: Some(self.clone()),
        }
    }
}

/// A view nobody reads any more counts as torn down
fn ensure_open<T>(tx: &watch::Sender<T>, target: &'static str) -> Result<(), DashboardError> {
    if tx.is_closed() {
        return Err(DashboardError::MissingRenderTarget(target));
    }
    Ok(())
}

impl FocusSurface for PublishedViews {
    fn render_focus(&self, chart: &ChartData) -> Result<(), DashboardError> {
        ensure_open(&self.focus, "focus")?;
        self.focus.send_replace(chart.clone());
        Ok(())
    }
}

impl ChannelSurface for PublishedViews {
    fn render_channel(
        &self,
        channel: ChannelId,
        chart: &ChartData,
        tile: Option<&TileData>,
    ) -> Result<(), DashboardError> {
        ensure_open(&self.channels, "channel")?;
        let view = ChannelView {
            chart: chart.clone(),
            tile: tile.cloned(),
        };
        self.channels.send_modify(|views| {
            views.insert(channel, view);
        });
        Ok(())
    }
}

impl AttitudeSurface for PublishedViews {
    fn render_rotation(&self, rotation: Rotation) -> Result<(), DashboardError> {
        ensure_open(&self.attitude, "attitude")?;
        // Idle frames repeat the same rotation; don't wake readers for those
        self.attitude.send_if_modified(|view| {
            if view.rotation == rotation {
                return false;
            }
            *view = AttitudeView {
                rotation,
                degrees: rotation.to_attitude(),
            };
            true
        });
        Ok(())
    }
}

impl StatusSink for PublishedViews {
    fn publish_status(&self, status: &StatusView) -> Result<(), DashboardError> {
        ensure_open(&self.status, "status")?;
        self.status.send_replace(status.clone());
        Ok(())
    }
}
