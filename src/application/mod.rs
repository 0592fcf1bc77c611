// Application layer - Dashboard components and event loop
pub mod attitude_animator;
pub mod channel_selector;
pub mod dashboard;
pub mod history_provider;
pub mod history_sync;
pub mod live_event_bridge;
pub mod runtime;
pub mod surfaces;
pub mod time_series_store;
