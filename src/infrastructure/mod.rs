// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod http_history;
pub mod published_views;
pub mod push_client;
