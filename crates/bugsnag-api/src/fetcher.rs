use std::{fmt, time::Duration};

use async_trait::async_trait;
use bugsnag_common::error::{ExporterError, Result};
use reqwest::header::{AUTHORIZATION, LINK};
use serde_json::Value;
use url::Url;

use crate::link::parse_next_link;

pub const DEFAULT_API_URL: &str = "https://api.bugsnag.com/";
pub const API_VERSION: &str = "2";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    /// First page of a collection, addressed relative to the API base URL.
    First {
        path: String,
        query: Vec<(String, String)>,
    },
    /// Continuation page taken verbatim from a `Link: <...>; rel="next"` header.
    Next { url: String },
}

impl PageRequest {
    pub fn is_continuation(&self) -> bool {
        matches!(self, Self::Next { .. })
    }
}

impl fmt::Display for PageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First { path, .. } => write!(f, "{path}"),
            Self::Next { url } => write!(f, "{url}"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Page {
    pub records: Vec<Value>,
    pub next: Option<String>,
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, request: &PageRequest) -> Result<Page>;
}

pub struct HttpFetcher {
    base_url: Url,
    token: String,
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(
        base_url: &str,
        token: impl Into<String>,
        request_timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|err| {
            ExporterError::Configuration(format!("invalid api url {base_url}: {err}"))
        })?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| ExporterError::Internal(format!("failed to build http client: {err}")))?;

        Ok(Self {
            base_url,
            token: token.into(),
            client,
        })
    }

    fn resolve(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| ExporterError::Internal(format!("invalid api path {path}: {err}")))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, request: &PageRequest) -> Result<Page> {
        let builder = match request {
            PageRequest::First { path, query } => self.client.get(self.resolve(path)?).query(query),
            PageRequest::Next { url } => self.client.get(url.as_str()),
        };

        let response = builder
            .header(AUTHORIZATION, format!("token {}", self.token))
            .header("X-Version", API_VERSION)
            .send()
            .await
            .map_err(|err| ExporterError::Transport(format!("failed to fetch {request}: {err}")))?;

        let status = response.status();
        let next = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_next_link);
        let body = response.text().await.map_err(|err| {
            ExporterError::Transport(format!("failed to read response from {request}: {err}"))
        })?;

        if !status.is_success() {
            return Err(ExporterError::RemoteApi {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
                body,
            });
        }

        let records: Vec<Value> = serde_json::from_str(&body).map_err(|err| {
            ExporterError::Decode(format!("expected a json array from {request}: {err}"))
        })?;

        Ok(Page { records, next })
    }
}
