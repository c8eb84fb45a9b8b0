mod handlers;
mod router;

use std::{sync::Arc, time::Duration};

use bugsnag_api::fetcher::DEFAULT_API_URL;
use bugsnag_collector::{BucketThresholds, EventCollector, ExporterConfig};
use clap::{CommandFactory, Parser};
use tracing::info;
use tracing_subscriber::EnvFilter;

const TOKEN_ENV: &str = "BUGSNAG_APITOKEN";

#[derive(Parser)]
#[command(
    name = "bugsnag_exporter",
    about = "Export bugsnag events as prometheus metrics"
)]
struct Cli {
    /// Bugsnag API token, read from BUGSNAG_APITOKEN when omitted
    #[arg(long)]
    apitoken: Option<String>,

    /// Listen host
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Listen port
    #[arg(long, default_value = "9642")]
    port: u16,

    /// Cache TTL in seconds
    #[arg(long, default_value = "600")]
    ttl: u64,

    /// Histogram bucket thresholds, comma separated and ascending
    #[arg(long, default_value = "10,100,1000,10000,50000,100000")]
    buckets: String,

    /// Base URL of the Bugsnag data access API
    #[arg(long, default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Records requested per page (per_page)
    #[arg(long, default_value = "100")]
    page_size: usize,

    /// Seconds to wait before fetching each continuation page
    #[arg(long, default_value = "8")]
    page_delay: u64,

    /// Per-request timeout in seconds; unset waits indefinitely
    #[arg(long)]
    request_timeout: Option<u64>,
}

impl Cli {
    fn api_token(&self) -> Option<String> {
        self.apitoken
            .clone()
            .or_else(|| std::env::var(TOKEN_ENV).ok())
            .filter(|token| !token.trim().is_empty())
    }

    fn into_config(self, api_token: String) -> bugsnag_common::Result<ExporterConfig> {
        let mut config = ExporterConfig::new(api_token);
        config.api_url = self.api_url;
        config.cache_ttl = Duration::from_secs(self.ttl);
        config.thresholds = BucketThresholds::parse(&self.buckets)?;
        config.page_size = self.page_size;
        config.page_delay = Duration::from_secs(self.page_delay);
        config.request_timeout = self.request_timeout.map(Duration::from_secs);
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let Some(api_token) = cli.api_token() else {
        Cli::command().print_help()?;
        std::process::exit(1);
    };

    let env_filter = EnvFilter::from_default_env()
        .add_directive("bugsnag_exporter=info".parse()?)
        .add_directive("bugsnag_collector=info".parse()?)
        .add_directive("bugsnag_api=info".parse()?);
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let addr = format!("{}:{}", cli.host, cli.port);
    let config = cli.into_config(api_token)?;
    info!(
        ttl = ?config.cache_ttl,
        buckets = %config.thresholds,
        page_delay = ?config.page_delay,
        "exporter configured"
    );

    let collector = Arc::new(EventCollector::from_config(&config)?);
    let app = router::exporter_router(collector);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("bugsnag exporter listening on {addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
