// HTTP request handlers
use crate::application::live_event_bridge::{CommandRequest, FaultInjection};
use crate::domain::channel::{ChannelId, FocusOption};
use crate::domain::error::DashboardError;
use crate::domain::status::StatusView;
use crate::domain::telemetry::ChartData;
use crate::infrastructure::published_views::{AttitudeView, ChannelView};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::stream::Stream;
use futures::StreamExt;
use std::sync::Arc;
use tokio_stream::wrappers::WatchStream;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Current focus chart
pub async fn get_focus(State(state): State<Arc<AppState>>) -> Json<ChartData> {
    Json(state.views.focus.borrow().clone())
}

/// Bind another channel to the focus chart
pub async fn select_focus(
    Path(option): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let option: FocusOption = match option.parse() {
        Ok(option) => option,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    forward(state.dashboard.select_focus(option).await)
}

/// Focus chart updates as server-sent events
pub async fn stream_focus(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let updates = WatchStream::new(state.views.focus.clone())
        .map(|chart| Event::default().event("focus").json_data(&chart));
    Sse::new(updates).keep_alive(KeepAlive::default())
}

/// Chart and latest reading of one channel
pub async fn get_channel(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ChannelView>, (StatusCode, String)> {
    let id: ChannelId = id
        .parse()
        .map_err(|e: DashboardError| (StatusCode::NOT_FOUND, e.to_string()))?;

    state
        .views
        .channels
        .borrow()
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("no data for channel {}", id)))
}

pub async fn get_attitude(State(state): State<Arc<AppState>>) -> Json<AttitudeView> {
    Json(*state.views.attitude.borrow())
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusView> {
    Json(state.views.status.borrow().clone())
}

pub async fn clear_log(State(state): State<Arc<AppState>>) -> Response {
    forward(state.dashboard.clear_log().await)
}

pub async fn send_command(
    State(state): State<Arc<AppState>>,
    Json(command): Json<CommandRequest>,
) -> Response {
    forward(state.dashboard.send_command(command).await)
}

pub async fn inject_fault(
    State(state): State<Arc<AppState>>,
    Json(fault): Json<FaultInjection>,
) -> Response {
    forward(state.dashboard.inject_fault(fault).await)
}

/// Requests are queued for the dashboard event loop, not applied inline
fn forward(result: anyhow::Result<()>) -> Response {
    match result {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e) => {
            tracing::error!("Error forwarding request: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dashboard::{Dashboard, DashboardEvent};
    use crate::application::history_provider::HistoryProvider;
    use crate::application::history_sync::HistorySync;
    use crate::application::live_event_bridge::{OutboundEvent, PushChannel};
    use crate::application::runtime::DashboardRuntime;
    use crate::application::surfaces::ChannelSurface;
    use crate::domain::channel::MetricSample;
    use crate::domain::telemetry::TileData;
    use crate::infrastructure::published_views::PublishedViews;
    use async_trait::async_trait;
    use std::time::Duration;

    struct NoHistory;

    #[async_trait]
    impl HistoryProvider for NoHistory {
        async fn fetch_history(&self, _channel: ChannelId) -> anyhow::Result<Vec<MetricSample>> {
            Ok(Vec::new())
        }
    }

    struct Offline;

    #[async_trait]
    impl PushChannel for Offline {
        async fn run(&self, _tx: tokio::sync::mpsc::Sender<DashboardEvent>) {}

        async fn emit(&self, _event: OutboundEvent) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn app() -> (Arc<AppState>, Arc<PublishedViews>, DashboardRuntime) {
        let (views, receivers) = PublishedViews::new();
        let dashboard = Dashboard::new(ChannelId::ALL.map(|id| (id, 10)), 0.1, views.surfaces());
        let history = HistorySync::new(
            Arc::new(NoHistory),
            ChannelId::ALL.to_vec(),
            Duration::from_secs(10),
        );
        let runtime = DashboardRuntime::new(dashboard, history, Arc::new(Offline), 60);
        let state = Arc::new(AppState {
            views: receivers,
            dashboard: runtime.handle(),
        });
        (state, views, runtime)
    }

    #[tokio::test]
    async fn test_select_focus_validates_option() {
        let (state, _views, _runtime) = app();

        let rejected = select_focus(Path("attitude".to_string()), State(state.clone())).await;
        assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);

        let accepted = select_focus(Path("battery".to_string()), State(state)).await;
        assert_eq!(accepted.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_stopped_dashboard_is_unavailable() {
        let (state, _views, runtime) = app();
        drop(runtime);

        let response = clear_log(State(state)).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_get_channel() {
        let (state, views, _runtime) = app();

        let unknown = get_channel(Path("adcs".to_string()), State(state.clone())).await;
        assert_eq!(unknown.into_response().status(), StatusCode::NOT_FOUND);

        let empty = get_channel(Path("power".to_string()), State(state.clone())).await;
        assert_eq!(empty.into_response().status(), StatusCode::NOT_FOUND);

        let chart = ChartData::new("power".to_string(), Vec::new(), Vec::new());
        let tile = TileData {
            id: "power".to_string(),
            value: 2.5,
            display: "2.50W".to_string(),
        };
        views
            .render_channel(ChannelId::Power, &chart, Some(&tile))
            .unwrap();

        let Json(view) = get_channel(Path("power".to_string()), State(state)).await.unwrap();
        assert_eq!(view.tile.unwrap().display, "2.50W");
    }
}
