//! Synchronizes facility status reports from application hosts into dated
//! spreadsheet sheets.

pub mod config;
pub mod errors;
pub mod logging;
pub mod metrics_defs;
pub mod pipeline;
pub mod trigger;

pub use config::{Config, ConfigError};
pub use errors::SyncError;
pub use pipeline::{BackendConnector, GoogleConnector, Pipeline, SyncJob, SyncReport};
pub use trigger::TriggerService;
