//! Metrics definitions for the collector.

use shared::metrics_defs::{MetricDef, MetricType};

pub const SOURCE_FETCH_FAILURES: MetricDef = MetricDef {
    name: "source.fetch.failures",
    metric_type: MetricType::Counter,
    description: "Host resource fetches that failed. Tagged with host, kind.",
};

pub const SOURCE_RECORDS: MetricDef = MetricDef {
    name: "source.records",
    metric_type: MetricType::Histogram,
    description: "Records returned by a single host resource fetch. Tagged with kind.",
};

pub const ALL_METRICS: &[MetricDef] = &[SOURCE_FETCH_FAILURES, SOURCE_RECORDS];
