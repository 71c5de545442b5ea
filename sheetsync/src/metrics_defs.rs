//! Metrics definitions for synchronization runs.

use shared::metrics_defs::{MetricDef, MetricType};

pub const SYNC_RUNS: MetricDef = MetricDef {
    name: "sync.runs",
    metric_type: MetricType::Counter,
    description: "Completed synchronization runs. Tagged with outcome, and operation on failure.",
};

pub const SYNC_DURATION: MetricDef = MetricDef {
    name: "sync.duration",
    metric_type: MetricType::Histogram,
    description: "Wall time of a synchronization run in seconds.",
};

pub const ROWS_WRITTEN: MetricDef = MetricDef {
    name: "sync.rows_written",
    metric_type: MetricType::Counter,
    description: "Record rows appended to spreadsheets, headers excluded.",
};

pub const ALL_METRICS: &[MetricDef] = &[SYNC_RUNS, SYNC_DURATION, ROWS_WRITTEN];
