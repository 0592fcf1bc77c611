// Dashboard state and event handlers
use crate::application::attitude_animator::AttitudeAnimator;
use crate::application::channel_selector::{ActiveChannelSelector, FocusSelection};
use crate::application::history_sync::{HistoryFetch, HistorySync};
use crate::application::live_event_bridge::{LiveEventBridge, OutboundEvent, PushEvent};
use crate::application::surfaces::{draw, ChannelSurface, Surfaces};
use crate::application::time_series_store::TimeSeriesStore;
use crate::domain::attitude::AttitudeSample;
use crate::domain::channel::{ChannelId, FocusOption};
use crate::domain::error::DashboardError;
use crate::domain::status::{EventLog, LinkState};
use crate::domain::telemetry::{ChartData, TileData};
use std::sync::Arc;

/// Everything that mutates the dashboard, funnelled through one event loop
#[derive(Debug)]
pub enum DashboardEvent {
    History(HistoryFetch),
    Push(PushEvent),
    SelectFocus(FocusOption),
    Outbound(OutboundEvent),
    ClearLog,
}

/// State shared by the dashboard components
pub struct DashboardContext {
    pub store: TimeSeriesStore,
    pub focus: FocusSelection,
    pub animator: AttitudeAnimator,
    pub link: LinkState,
    pub log: EventLog,
}

pub struct Dashboard {
    context: DashboardContext,
    selector: ActiveChannelSelector,
    bridge: LiveEventBridge,
    channel_surface: Option<Arc<dyn ChannelSurface>>,
}

impl Dashboard {
    pub fn new(
        channels: impl IntoIterator<Item = (ChannelId, usize)>,
        smoothing: f64,
        surfaces: Surfaces,
    ) -> Self {
        let mut store = TimeSeriesStore::new();
        for (id, max_length) in channels {
            store.register(id, max_length);
        }

        let context = DashboardContext {
            store,
            focus: FocusSelection::default(),
            animator: AttitudeAnimator::with_smoothing(surfaces.attitude, smoothing),
            link: LinkState::default(),
            log: EventLog::default(),
        };

        Self {
            context,
            selector: ActiveChannelSelector::new(surfaces.focus),
            bridge: LiveEventBridge::new(surfaces.status),
            channel_surface: surfaces.channels,
        }
    }

    pub fn context(&self) -> &DashboardContext {
        &self.context
    }

    /// Initial draw of every surface before any data arrives
    pub fn start(&mut self) {
        self.context.log.push("Dashboard initialized.");
        self.bridge.publish(&self.context.link, &self.context.log);
        self.refresh_focus();
    }

    /// Run one event to completion. Returns an outbound event the caller
    /// must send, if any.
    pub fn handle_event(&mut self, event: DashboardEvent) -> Option<OutboundEvent> {
        match event {
            DashboardEvent::History(fetch) => self.on_history(fetch),
            DashboardEvent::Push(event) => {
                let ctx = &mut self.context;
                self.bridge.handle(event, &mut ctx.link, &mut ctx.log);
            }
            DashboardEvent::SelectFocus(option) => {
                let ctx = &mut self.context;
                if let Err(e) = self.selector.select(&mut ctx.focus, option, &ctx.store) {
                    tracing::error!(focus = %option, "focus selection failed: {}", e);
                }
            }
            DashboardEvent::Outbound(event) => {
                let ctx = &mut self.context;
                if self.bridge.record_outbound(&event, &ctx.link, &mut ctx.log) {
                    return Some(event);
                }
            }
            DashboardEvent::ClearLog => {
                let ctx = &mut self.context;
                self.bridge.clear_log(&ctx.link, &mut ctx.log);
            }
        }
        None
    }

    /// One render-loop frame
    pub fn on_frame(&mut self) {
        self.context.animator.tick();
    }

    fn on_history(&mut self, fetch: HistoryFetch) {
        let channel = fetch.channel;

        match HistorySync::apply(fetch, &mut self.context.store) {
            Ok(true) => {}
            Ok(false) => return,
            Err(e) => {
                tracing::error!(channel = %channel, "history not applied: {}", e);
                return;
            }
        }

        if let Err(e) = self.render_channel(channel) {
            tracing::error!(channel = %channel, "channel render failed: {}", e);
        }

        if channel == ChannelId::Attitude {
            self.retarget_attitude();
        }

        let ctx = &self.context;
        if let Err(e) = self.selector.on_channel_updated(&ctx.focus, channel, &ctx.store) {
            tracing::error!(channel = %channel, "focus refresh failed: {}", e);
        }
    }

    fn render_channel(&self, id: ChannelId) -> Result<(), DashboardError> {
        let channel = self.context.store.channel(id)?;
        let chart = ChartData::for_channel(id, channel.samples());
        let tile = channel.latest().and_then(|s| TileData::latest_reading(id, s));

        draw(self.channel_surface.as_ref(), "channel", |s| {
            s.render_channel(id, &chart, tile.as_ref())
        });
        Ok(())
    }

    fn retarget_attitude(&mut self) {
        let ctx = &mut self.context;
        let sample = match ctx.store.latest(ChannelId::Attitude) {
            Ok(Some(latest)) => AttitudeSample::from_metric(latest),
            Ok(None) => return,
            Err(e) => {
                tracing::error!("{}", e);
                return;
            }
        };

        if let Err(e) = ctx.animator.on_sample(sample) {
            tracing::warn!("attitude sample rejected: {}", e);
        }
    }

    fn refresh_focus(&self) {
        let ctx = &self.context;
        if let Err(e) = self.selector.refresh(&ctx.focus, &ctx.store) {
            tracing::error!(focus = %ctx.focus.active(), "focus refresh failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::live_event_bridge::{CommandRequest, FaultInjection};
    use crate::application::surfaces::FocusSurface;
    use crate::domain::channel::{parse_timestamp, MetricSample};
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        focus: Mutex<Vec<ChartData>>,
        channels: Mutex<Vec<(ChannelId, ChartData, Option<TileData>)>>,
    }

    impl FocusSurface for Recorder {
        fn render_focus(&self, chart: &ChartData) -> Result<(), DashboardError> {
            self.focus.lock().unwrap().push(chart.clone());
            Ok(())
        }
    }

    impl ChannelSurface for Recorder {
        fn render_channel(
            &self,
            channel: ChannelId,
            chart: &ChartData,
            tile: Option<&TileData>,
        ) -> Result<(), DashboardError> {
            self.channels
                .lock()
                .unwrap()
                .push((channel, chart.clone(), tile.cloned()));
            Ok(())
        }
    }

    fn dashboard(recorder: &Arc<Recorder>) -> Dashboard {
        let surfaces = Surfaces {
            focus: Some(recorder.clone()),
            channels: Some(recorder.clone()),
            ..Surfaces::default()
        };
        Dashboard::new(ChannelId::ALL.map(|id| (id, 100)), 0.1, surfaces)
    }

    fn history(channel: ChannelId, records: &[(&str, &[(&str, f64)])]) -> DashboardEvent {
        let samples = records
            .iter()
            .map(|(ts, fields)| {
                MetricSample::new(
                    parse_timestamp(ts).unwrap(),
                    fields.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
                )
            })
            .collect();
        DashboardEvent::History(HistoryFetch {
            channel,
            outcome: Ok(samples),
        })
    }

    #[test]
    fn test_start_draws_empty_default_focus() {
        let recorder = Arc::new(Recorder::default());
        let mut dashboard = dashboard(&recorder);

        dashboard.start();

        let focus = recorder.focus.lock().unwrap();
        assert_eq!(focus.len(), 1);
        assert!(focus[0].is_empty());
        assert_eq!(focus[0].series[0].name, "Power Consumption (W)");
        assert_eq!(dashboard.context().log.len(), 1);
    }

    #[test]
    fn test_battery_history_refreshes_selected_focus() {
        let recorder = Arc::new(Recorder::default());
        let mut dashboard = dashboard(&recorder);
        dashboard.handle_event(DashboardEvent::SelectFocus(FocusOption::Battery));

        dashboard.handle_event(history(
            ChannelId::Battery,
            &[
                ("2025-06-05T10:00:00", &[("level", 80.0)]),
                ("2025-06-05T10:01:00", &[("level", 75.0)]),
            ],
        ));

        let focus = recorder.focus.lock().unwrap();
        let last = focus.last().unwrap();
        assert_eq!(last.series[0].values, vec![80.0, 75.0]);
        assert_eq!(last.labels, vec!["10:00:00", "10:01:00"]);

        let channels = recorder.channels.lock().unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].0, ChannelId::Battery);
        assert_eq!(channels[0].2.as_ref().unwrap().display, "75.0%");
    }

    #[test]
    fn test_unselected_history_does_not_touch_focus() {
        let recorder = Arc::new(Recorder::default());
        let mut dashboard = dashboard(&recorder);

        dashboard.handle_event(history(
            ChannelId::Thermal,
            &[("2025-06-05T10:00:00", &[("internal", 21.0)])],
        ));

        assert!(recorder.focus.lock().unwrap().is_empty());
        assert_eq!(recorder.channels.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_failed_fetch_keeps_stale_display() {
        let recorder = Arc::new(Recorder::default());
        let mut dashboard = dashboard(&recorder);
        dashboard.handle_event(history(
            ChannelId::Power,
            &[("2025-06-05T10:00:00", &[("total_watts", 2.5)])],
        ));
        let drawn = recorder.focus.lock().unwrap().len();

        dashboard.handle_event(DashboardEvent::History(HistoryFetch {
            channel: ChannelId::Power,
            outcome: Err(DashboardError::FetchFailure {
                channel: ChannelId::Power,
                reason: "timeout".to_string(),
            }),
        }));

        assert_eq!(recorder.focus.lock().unwrap().len(), drawn);
        assert_eq!(dashboard.context().store.channel(ChannelId::Power).unwrap().len(), 1);
    }

    #[test]
    fn test_attitude_history_drives_animation() {
        let recorder = Arc::new(Recorder::default());
        let mut dashboard = dashboard(&recorder);

        dashboard.handle_event(history(
            ChannelId::Attitude,
            &[
                ("2025-06-05T10:00:00", &[("roll", 1.5), ("pitch", -2.3), ("yaw", 0.5)]),
                ("2025-06-05T10:01:00", &[("roll", 0.0), ("pitch", 90.0), ("yaw", 0.0)]),
            ],
        ));
        for _ in 0..10 {
            dashboard.on_frame();
        }

        let state = dashboard.context().animator.state();
        assert!(state.animating);
        assert!((state.target.to_attitude().pitch - 90.0).abs() < 1e-9);
        assert!((state.current.to_attitude().pitch - 58.6).abs() < 0.1);
    }

    #[test]
    fn test_push_never_touches_time_series() {
        let recorder = Arc::new(Recorder::default());
        let mut dashboard = dashboard(&recorder);

        dashboard.handle_event(DashboardEvent::Push(PushEvent::Connected));
        dashboard.handle_event(DashboardEvent::Push(PushEvent::TelemetryUpdate(json!({
            "power": {"battery": {"level": 42.0}}
        }))));

        let ctx = dashboard.context();
        assert!(ctx.link.connected);
        for id in ChannelId::ALL {
            assert!(ctx.store.channel(id).unwrap().is_empty());
        }
        assert!(recorder.focus.lock().unwrap().is_empty());
    }

    #[test]
    fn test_outbound_events() {
        let recorder = Arc::new(Recorder::default());
        let mut dashboard = dashboard(&recorder);

        let command = OutboundEvent::SendCommand(CommandRequest {
            kind: "PING".to_string(),
            parameters: String::new(),
        });
        assert_eq!(
            dashboard.handle_event(DashboardEvent::Outbound(command.clone())),
            Some(command)
        );

        let none = OutboundEvent::InjectFault(FaultInjection {
            kind: "NONE".to_string(),
            duration: 100,
            probability: 10,
        });
        assert_eq!(dashboard.handle_event(DashboardEvent::Outbound(none)), None);

        dashboard.handle_event(DashboardEvent::ClearLog);
        let messages: Vec<&str> = dashboard
            .context()
            .log
            .entries()
            .map(|e| e.message.as_str())
            .collect();
        assert_eq!(messages, vec!["Log cleared"]);
    }
}
