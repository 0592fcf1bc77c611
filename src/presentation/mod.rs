// Presentation layer - HTTP surface over the published views
pub mod app_state;
pub mod handlers;
