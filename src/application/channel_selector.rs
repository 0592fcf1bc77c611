// Focus-surface channel selection
use crate::application::surfaces::{draw, FocusSurface};
use crate::application::time_series_store::TimeSeriesStore;
use crate::domain::channel::{ChannelId, FocusOption};
use crate::domain::error::DashboardError;
use crate::domain::telemetry::ChartData;
use std::sync::Arc;

/// Which channel is bound to the focus surface. Exactly one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusSelection {
    active: FocusOption,
}

impl Default for FocusSelection {
    fn default() -> Self {
        Self {
            active: FocusOption::Power,
        }
    }
}

impl FocusSelection {
    #[cfg(test)]
    pub fn new(active: FocusOption) -> Self {
        Self { active }
    }

    pub fn active(&self) -> FocusOption {
        self.active
    }

    pub fn is_selected(&self, channel: ChannelId) -> bool {
        FocusOption::for_channel(channel) == Some(self.active)
    }
}

pub struct ActiveChannelSelector {
    surface: Option<Arc<dyn FocusSurface>>,
}

impl ActiveChannelSelector {
    pub fn new(surface: Option<Arc<dyn FocusSurface>>) -> Self {
        Self { surface }
    }

    /// Switch the focus surface to `option` and redraw it.
    pub fn select(
        &self,
        selection: &mut FocusSelection,
        option: FocusOption,
        store: &TimeSeriesStore,
    ) -> Result<ChartData, DashboardError> {
        store.channel(option.channel())?;
        if selection.active != option {
            tracing::info!(from = %selection.active, to = %option, "focus selection changed");
        }
        selection.active = option;
        self.refresh(selection, store)
    }

    /// Redraw only if `channel` is the one in focus.
    pub fn on_channel_updated(
        &self,
        selection: &FocusSelection,
        channel: ChannelId,
        store: &TimeSeriesStore,
    ) -> Result<Option<ChartData>, DashboardError> {
        if !selection.is_selected(channel) {
            return Ok(None);
        }
        self.refresh(selection, store).map(Some)
    }

    /// Rebuild the focus series from a snapshot of the store and draw it.
    pub fn refresh(
        &self,
        selection: &FocusSelection,
        store: &TimeSeriesStore,
    ) -> Result<ChartData, DashboardError> {
        let option = selection.active;
        let channel = store.channel(option.channel())?;
        let chart = ChartData::focus(option, channel.samples());

        if chart.is_empty() {
            tracing::debug!(focus = %option, "focus channel has no samples yet");
        }
        tracing::debug!(focus = %option, points = chart.labels.len(), "rendering focus surface");
        draw(self.surface.as_ref(), "focus", |s| s.render_focus(&chart));
        Ok(chart)
    }
}
