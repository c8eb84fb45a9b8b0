pub mod cache;
pub mod collector;
pub mod config;
pub mod histogram;
pub mod metrics;
pub mod snapshot;

#[cfg(test)]
mod test_fixtures;

pub use cache::{CacheEntry, SnapshotCache};
pub use collector::EventCollector;
pub use config::ExporterConfig;
pub use histogram::{BucketThresholds, StageCounts, add_record};
pub use metrics::{
    CollectedMetric, MetricDescriptor, MetricSample, MetricSnapshot, MetricType, MetricValue,
    render_prometheus,
};
pub use snapshot::build_snapshot;
