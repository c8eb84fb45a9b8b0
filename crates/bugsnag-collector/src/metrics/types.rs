#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Gauge,
    Histogram,
}

impl MetricType {
    pub fn as_prometheus_type(&self) -> &'static str {
        match self {
            Self::Gauge => "gauge",
            Self::Histogram => "histogram",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricDescriptor {
    pub name: String,
    pub help: String,
    pub metric_type: MetricType,
    pub variable_labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Gauge(f64),
    /// `buckets` are cumulative and always end with the `+Inf` bound.
    Histogram {
        buckets: Vec<(f64, u64)>,
        count: u64,
        sum: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub labels: Vec<(String, String)>,
    pub value: MetricValue,
}

impl MetricSample {
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectedMetric {
    pub descriptor: MetricDescriptor,
    pub samples: Vec<MetricSample>,
}

/// Result of one full collection pass. Never mutated after construction; the
/// cache hands out shared references to it.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSnapshot {
    families: Vec<CollectedMetric>,
}

impl MetricSnapshot {
    pub fn new(families: Vec<CollectedMetric>) -> Self {
        Self { families }
    }

    pub fn families(&self) -> &[CollectedMetric] {
        &self.families
    }

    pub fn family(&self, name: &str) -> Option<&CollectedMetric> {
        self.families
            .iter()
            .find(|family| family.descriptor.name == name)
    }
}
