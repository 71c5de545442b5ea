//! Collects facility status reports from a fleet of application hosts.

pub mod aggregator;
pub mod metrics_defs;
pub mod source;
pub mod testutils;
pub mod types;

pub use aggregator::Aggregator;
pub use source::{FetchFailure, HttpSource, RecordSource, SourceUnavailable};
pub use types::{
    BridgingRecord, Datasets, HostEndpoint, InsuranceRecord, Payload, RegistryRecord,
    ResourceKind, Windowed,
};
