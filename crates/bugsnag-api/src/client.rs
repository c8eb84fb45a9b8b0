use std::{sync::Arc, time::Duration};

use bugsnag_common::error::Result;
use futures::stream::BoxStream;

use crate::{
    fetcher::HttpFetcher,
    paginate::Paginator,
    types::{ErrorRecord, Organization, Project},
};

/// Query that restricts the error listing to open errors. Sorting is disabled
/// because it is expensive on the Bugsnag side and order is irrelevant here.
const OPEN_ERRORS_QUERY: [(&str, &str); 3] = [
    ("filters[error.status][][type]", "eq"),
    ("filters[error.status][][value]", "open"),
    ("sort", "unsorted"),
];

/// The organization -> project -> error hierarchy walked on every scrape.
pub trait ErrorSource: Send + Sync {
    fn organizations(&self) -> BoxStream<'_, Result<Organization>>;

    fn projects(&self, organization: &Organization) -> BoxStream<'_, Result<Project>>;

    fn open_errors(&self, project: &Project) -> BoxStream<'_, Result<ErrorRecord>>;
}

#[derive(Clone)]
pub struct BugsnagClient {
    paginator: Paginator,
}

impl BugsnagClient {
    pub fn new(paginator: Paginator) -> Self {
        Self { paginator }
    }

    pub fn connect(
        api_url: &str,
        token: impl Into<String>,
        page_size: usize,
        page_delay: Duration,
        request_timeout: Option<Duration>,
    ) -> Result<Self> {
        let fetcher = HttpFetcher::new(api_url, token, request_timeout)?;
        let paginator = Paginator::new(Arc::new(fetcher))
            .with_page_size(page_size)
            .with_page_delay(page_delay);
        Ok(Self::new(paginator))
    }
}

impl ErrorSource for BugsnagClient {
    fn organizations(&self) -> BoxStream<'_, Result<Organization>> {
        self.paginator.paginate("user/organizations", &[])
    }

    fn projects(&self, organization: &Organization) -> BoxStream<'_, Result<Project>> {
        self.paginator
            .paginate(&format!("organizations/{}/projects", organization.id), &[])
    }

    fn open_errors(&self, project: &Project) -> BoxStream<'_, Result<ErrorRecord>> {
        self.paginator
            .paginate(&format!("projects/{}/errors", project.id), &OPEN_ERRORS_QUERY)
    }
}
