use std::{sync::Arc, time::Duration};

use bugsnag_api::{BugsnagClient, ErrorSource};
use bugsnag_common::{
    error::Result,
    time::{Clock, SystemClock},
};

use crate::{
    cache::SnapshotCache,
    config::ExporterConfig,
    histogram::BucketThresholds,
    metrics::{MetricDescriptor, MetricSnapshot, events_descriptor, scrape_duration_descriptor},
    snapshot::build_snapshot,
};

/// Entry point for the exposition layer: describes the exported families and
/// serves cached or freshly built snapshots.
pub struct EventCollector {
    source: Arc<dyn ErrorSource>,
    thresholds: BucketThresholds,
    cache_ttl: Duration,
    cache: SnapshotCache,
}

impl EventCollector {
    pub fn new(
        source: Arc<dyn ErrorSource>,
        thresholds: BucketThresholds,
        cache_ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            thresholds,
            cache_ttl,
            cache: SnapshotCache::new(clock),
        }
    }

    pub fn from_config(config: &ExporterConfig) -> Result<Self> {
        config.validate()?;
        let client = BugsnagClient::connect(
            &config.api_url,
            config.api_token.clone(),
            config.page_size,
            config.page_delay,
            config.request_timeout,
        )?;

        Ok(Self::new(
            Arc::new(client),
            config.thresholds.clone(),
            config.cache_ttl,
            Arc::new(SystemClock),
        ))
    }

    pub fn describe(&self) -> Vec<MetricDescriptor> {
        vec![events_descriptor(), scrape_duration_descriptor()]
    }

    /// Serves the cached snapshot, or waits for a refresh. The refresh keeps
    /// running and fills the cache even if this future is dropped.
    pub async fn collect(&self) -> Result<Arc<MetricSnapshot>> {
        let source = Arc::clone(&self.source);
        let thresholds = self.thresholds.clone();
        self.cache
            .get_or_refresh(self.cache_ttl, move || async move {
                build_snapshot(source.as_ref(), &thresholds).await
            })
            .await
    }

    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }
}
