// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use anyhow::Context;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::dashboard::Dashboard;
use crate::application::history_sync::HistorySync;
use crate::application::runtime::DashboardRuntime;
use crate::infrastructure::config::load_dashboard_config;
use crate::infrastructure::http_history::HttpHistoryProvider;
use crate::infrastructure::published_views::PublishedViews;
use crate::infrastructure::push_client::HttpPushChannel;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    clear_log, get_attitude, get_channel, get_focus, get_status, health_check, inject_fault,
    select_focus, send_command, stream_focus,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_dashboard_config()?;
    let telemetry = &config.telemetry;
    let channels = config.channels();

    // Adapters (infrastructure layer)
    let history_provider = Arc::new(HttpHistoryProvider::new(
        &telemetry.base_url,
        channels.iter().map(|c| (c.id, c.resource())),
        telemetry.request_timeout(),
    )?);
    let push_channel = Arc::new(HttpPushChannel::new(
        &telemetry.base_url,
        &telemetry.events_path,
        telemetry.request_timeout(),
        telemetry.reconnect_delay(),
    )?);
    let (views, receivers) = PublishedViews::new();

    // Dashboard components (application layer)
    let dashboard = Dashboard::new(
        channels.iter().map(|c| (c.id, c.max_length)),
        config.animation.smoothing,
        views.surfaces(),
    );
    let history = HistorySync::new(
        history_provider,
        channels.iter().map(|c| c.id).collect(),
        telemetry.sync_interval(),
    );
    let runtime = DashboardRuntime::new(
        dashboard,
        history,
        push_channel,
        config.animation.frame_rate_hz,
    );

    let state = Arc::new(AppState {
        views: receivers,
        dashboard: runtime.handle(),
    });
    tokio::spawn(runtime.run());

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/api/focus", get(get_focus))
        .route("/api/focus/stream", get(stream_focus))
        .route("/api/focus/:option", post(select_focus))
        .route("/api/channels/:id", get(get_channel))
        .route("/api/attitude", get(get_attitude))
        .route("/api/status", get(get_status))
        .route("/api/log", delete(clear_log))
        .route("/api/commands", post(send_command))
        .route("/api/faults", post(inject_fault))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid server.bind address {}", config.server.bind))?;
    tracing::info!(%addr, history = %telemetry.base_url, "starting ground-station dashboard");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
