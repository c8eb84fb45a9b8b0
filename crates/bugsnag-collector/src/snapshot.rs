use std::collections::BTreeMap;

use bugsnag_api::ErrorSource;
use bugsnag_common::error::Result;
use futures::TryStreamExt;
use tokio::time::Instant;
use tracing::debug;

use crate::{
    histogram::{BucketThresholds, StageCounts, StageCountsMap, add_record},
    metrics::{
        CollectedMetric, MetricSample, MetricSnapshot, MetricValue, events_descriptor,
        scrape_duration_descriptor,
    },
};

/// Walks every organization, project and open error once and returns the
/// resulting metric families. Any failed page aborts the whole pass.
pub async fn build_snapshot(
    source: &dyn ErrorSource,
    thresholds: &BucketThresholds,
) -> Result<MetricSnapshot> {
    let started_at = Instant::now();
    // Keyed by project name, which is what the `project` label carries.
    let mut projects: BTreeMap<String, StageCountsMap> = BTreeMap::new();

    let mut organizations = source.organizations();
    while let Some(organization) = organizations.try_next().await? {
        debug!(organization = %organization.name, "scanning organization");

        let mut org_projects = source.projects(&organization);
        while let Some(project) = org_projects.try_next().await? {
            let mut stages = StageCountsMap::new();
            let mut errors = source.open_errors(&project);
            while let Some(record) = errors.try_next().await? {
                add_record(&mut stages, &record, thresholds);
            }

            debug!(project = %project.name, stages = stages.len(), "aggregated open errors");
            if stages.is_empty() {
                continue;
            }

            let merged = projects.entry(project.name).or_default();
            for (stage, counts) in stages {
                merged
                    .entry(stage)
                    .or_insert_with(|| StageCounts::new(thresholds))
                    .merge(&counts);
            }
        }
    }

    let mut samples = Vec::new();
    for (project, stages) in projects {
        for (stage, counts) in stages {
            samples.push(MetricSample {
                labels: vec![
                    ("project".to_string(), project.clone()),
                    ("release_stage".to_string(), stage),
                ],
                value: counts.into_value(thresholds),
            });
        }
    }

    let elapsed = started_at.elapsed();
    Ok(MetricSnapshot::new(vec![
        CollectedMetric {
            descriptor: events_descriptor(),
            samples,
        },
        CollectedMetric {
            descriptor: scrape_duration_descriptor(),
            samples: vec![MetricSample {
                labels: Vec::new(),
                value: MetricValue::Gauge(elapsed.as_secs_f64()),
            }],
        },
    ]))
}
