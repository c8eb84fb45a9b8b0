pub mod definitions;
pub mod exposition;
pub mod types;

pub use definitions::{
    EVENTS_METRIC, SCRAPE_DURATION_METRIC, events_descriptor, scrape_duration_descriptor,
};
pub use exposition::render_prometheus;
pub use types::{
    CollectedMetric, MetricDescriptor, MetricSample, MetricSnapshot, MetricType, MetricValue,
};
