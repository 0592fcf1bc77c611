// Domain layer - Telemetry, attitude and status models
pub mod attitude;
pub mod channel;
pub mod error;
pub mod status;
pub mod telemetry;
