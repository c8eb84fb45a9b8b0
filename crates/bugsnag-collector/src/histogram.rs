use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use bugsnag_api::ErrorRecord;
use bugsnag_common::error::{ExporterError, Result};

use crate::metrics::MetricValue;

pub const DEFAULT_THRESHOLDS: [u64; 6] = [10, 100, 1_000, 10_000, 50_000, 100_000];

/// Strictly ascending upper bounds of the event count histogram. The `+Inf`
/// bound is implicit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketThresholds(Vec<u64>);

impl BucketThresholds {
    pub fn new(bounds: Vec<u64>) -> Result<Self> {
        if bounds.is_empty() {
            return Err(ExporterError::Configuration(
                "at least one bucket threshold is required".to_string(),
            ));
        }
        if let Some(pair) = bounds.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(ExporterError::Configuration(format!(
                "bucket thresholds must be strictly ascending, got {} before {}",
                pair[0], pair[1]
            )));
        }

        Ok(Self(bounds))
    }

    /// Parses a comma separated list such as `10,100,1000`.
    pub fn parse(value: &str) -> Result<Self> {
        let bounds = value
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| {
                item.parse::<u64>().map_err(|err| {
                    ExporterError::Configuration(format!(
                        "invalid bucket threshold {item:?}: {err}"
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(bounds)
    }

    pub fn bounds(&self) -> &[u64] {
        &self.0
    }
}

impl Default for BucketThresholds {
    fn default() -> Self {
        Self(DEFAULT_THRESHOLDS.to_vec())
    }
}

impl fmt::Display for BucketThresholds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        f.write_str(&joined)
    }
}

/// Cumulative event count histogram for one (project, release stage) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageCounts {
    buckets: Vec<u64>,
    count: u64,
    sum: u64,
}

pub type StageCountsMap = BTreeMap<String, StageCounts>;

impl StageCounts {
    pub fn new(thresholds: &BucketThresholds) -> Self {
        Self {
            buckets: vec![0; thresholds.bounds().len()],
            count: 0,
            sum: 0,
        }
    }

    pub fn observe(&mut self, events: u64, thresholds: &BucketThresholds) {
        for (bucket, bound) in self.buckets.iter_mut().zip(thresholds.bounds()) {
            if events <= *bound {
                *bucket += 1;
            }
        }
        self.count += 1;
        self.sum = self.sum.saturating_add(events);
    }

    pub fn merge(&mut self, other: &StageCounts) {
        for (bucket, extra) in self.buckets.iter_mut().zip(&other.buckets) {
            *bucket += extra;
        }
        self.count += other.count;
        self.sum = self.sum.saturating_add(other.sum);
    }

    /// Counts per explicit threshold, excluding `+Inf`.
    pub fn bucket_counts(&self) -> &[u64] {
        &self.buckets
    }

    /// Number of observations, which is also the `+Inf` bucket.
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum(&self) -> u64 {
        self.sum
    }

    pub fn into_value(self, thresholds: &BucketThresholds) -> MetricValue {
        let mut buckets = thresholds
            .bounds()
            .iter()
            .zip(self.buckets)
            .map(|(bound, count)| (*bound as f64, count))
            .collect::<Vec<_>>();
        buckets.push((f64::INFINITY, self.count));

        MetricValue::Histogram {
            buckets,
            count: self.count,
            sum: self.sum as f64,
        }
    }
}

/// Adds one error to the histogram of every release stage it was seen in.
pub fn add_record(
    stages: &mut StageCountsMap,
    record: &ErrorRecord,
    thresholds: &BucketThresholds,
) {
    let distinct: BTreeSet<&str> = record.release_stages.iter().map(String::as_str).collect();
    for stage in distinct {
        stages
            .entry(stage.to_string())
            .or_insert_with(|| StageCounts::new(thresholds))
            .observe(record.events, thresholds);
    }
}
