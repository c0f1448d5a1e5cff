pub mod config;
pub mod envelope;
pub mod path;
pub mod reactor;
pub mod scheduler;
pub mod state;
pub mod telemetry;
