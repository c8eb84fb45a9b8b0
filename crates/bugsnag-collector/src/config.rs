use std::{fmt, time::Duration};

use bugsnag_api::{
    fetcher::DEFAULT_API_URL,
    paginate::{DEFAULT_PAGE_DELAY, DEFAULT_PAGE_SIZE},
};
use bugsnag_common::error::{ExporterError, Result};

use crate::histogram::BucketThresholds;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);

#[derive(Clone)]
pub struct ExporterConfig {
    pub api_token: String,
    pub api_url: String,
    pub cache_ttl: Duration,
    pub thresholds: BucketThresholds,
    pub page_size: usize,
    pub page_delay: Duration,
    /// No timeout unless configured; a stalled API stalls the scrape.
    pub request_timeout: Option<Duration>,
}

impl ExporterConfig {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            api_url: DEFAULT_API_URL.to_string(),
            cache_ttl: DEFAULT_CACHE_TTL,
            thresholds: BucketThresholds::default(),
            page_size: DEFAULT_PAGE_SIZE,
            page_delay: DEFAULT_PAGE_DELAY,
            request_timeout: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_token.trim().is_empty() {
            return Err(ExporterError::Configuration(
                "a Bugsnag api token is required".to_string(),
            ));
        }
        if self.page_size == 0 {
            return Err(ExporterError::Configuration(
                "page size must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

impl fmt::Debug for ExporterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExporterConfig")
            .field("api_token", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("cache_ttl", &self.cache_ttl)
            .field("thresholds", &self.thresholds)
            .field("page_size", &self.page_size)
            .field("page_delay", &self.page_delay)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
