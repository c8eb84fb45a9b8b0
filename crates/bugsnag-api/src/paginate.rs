use std::{sync::Arc, time::Duration};

use bugsnag_common::error::{ExporterError, Result};
use futures::{
    StreamExt, TryStreamExt,
    stream::{self, BoxStream},
};
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::debug;

use crate::fetcher::{PageFetcher, PageRequest};

pub const DEFAULT_PAGE_SIZE: usize = 100;
/// Pause before each continuation page so a full traversal stays under the
/// Bugsnag rate limit.
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_secs(8);

#[derive(Clone)]
pub struct Paginator {
    fetcher: Arc<dyn PageFetcher>,
    page_size: usize,
    page_delay: Duration,
}

struct PageCursor {
    fetcher: Arc<dyn PageFetcher>,
    page_delay: Duration,
    next: Option<PageRequest>,
}

impl Paginator {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            page_size: DEFAULT_PAGE_SIZE,
            page_delay: DEFAULT_PAGE_DELAY,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_page_delay(mut self, page_delay: Duration) -> Self {
        self.page_delay = page_delay;
        self
    }

    /// Lazily walks every page of `path`, yielding records in page order.
    ///
    /// Nothing is fetched until the stream is polled. Each call starts again
    /// from the first page; the returned stream itself is single pass and ends
    /// after the first error.
    pub fn paginate<T>(&self, path: &str, query: &[(&str, &str)]) -> BoxStream<'static, Result<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let mut query: Vec<(String, String)> = query
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        if !query.iter().any(|(key, _)| key == "per_page") {
            query.push(("per_page".to_string(), self.page_size.to_string()));
        }

        let cursor = PageCursor {
            fetcher: Arc::clone(&self.fetcher),
            page_delay: self.page_delay,
            next: Some(PageRequest::First {
                path: path.to_string(),
                query,
            }),
        };

        stream::try_unfold(cursor, next_page::<T>)
            .map_ok(|records| stream::iter(records.into_iter().map(Ok::<T, ExporterError>)))
            .try_flatten()
            .boxed()
    }
}

async fn next_page<T>(mut cursor: PageCursor) -> Result<Option<(Vec<T>, PageCursor)>>
where
    T: DeserializeOwned,
{
    let Some(request) = cursor.next.take() else {
        return Ok(None);
    };

    if request.is_continuation() && !cursor.page_delay.is_zero() {
        debug!(delay = ?cursor.page_delay, url = %request, "waiting before next page");
        sleep(cursor.page_delay).await;
    }

    let page = cursor.fetcher.fetch(&request).await?;
    debug!(url = %request, records = page.records.len(), "fetched page");

    let records = page
        .records
        .into_iter()
        .map(|value| {
            serde_json::from_value::<T>(value).map_err(|err| {
                ExporterError::Decode(format!("unexpected record from {request}: {err}"))
            })
        })
        .collect::<Result<Vec<T>>>()?;

    cursor.next = page.next.map(|url| PageRequest::Next { url });
    Ok(Some((records, cursor)))
}
