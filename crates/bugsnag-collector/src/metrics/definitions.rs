use crate::metrics::types::{MetricDescriptor, MetricType};

pub const EVENTS_METRIC: &str = "bugsnag_events";
pub const SCRAPE_DURATION_METRIC: &str = "bugsnag_scrape_duration_seconds";

pub fn events_descriptor() -> MetricDescriptor {
    MetricDescriptor {
        name: EVENTS_METRIC.to_string(),
        help: "Error events collected by Bugsnag, by project".to_string(),
        metric_type: MetricType::Histogram,
        variable_labels: vec!["project".to_string(), "release_stage".to_string()],
    }
}

pub fn scrape_duration_descriptor() -> MetricDescriptor {
    MetricDescriptor {
        name: SCRAPE_DURATION_METRIC.to_string(),
        help: "Duration of Bugsnag API scrape".to_string(),
        metric_type: MetricType::Gauge,
        variable_labels: Vec::new(),
    }
}
