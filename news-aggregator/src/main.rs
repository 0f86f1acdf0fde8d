use clap::Parser;
use news_aggregator::aggregator::parse_limit;
use news_aggregator::rss_utils::url::validate_feed_reference;
use news_aggregator::{AggregatorError, AppConfig, ArticlesResponse, ErrorPayload, NewsAggregator};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Fetch a news feed and print each article with a generated fake headline.
#[derive(Debug, Parser)]
#[command(name = "news-aggregator", version)]
struct Cli {
    /// Number of articles to return, clamped to [1, 50]; non-numeric values mean 10
    #[arg(long, allow_hyphen_values = true)]
    limit: Option<String>,

    /// RSS/Atom feed URL (http or https)
    #[arg(long)]
    source: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(&cli).await {
        Ok(response) => {
            println!("{}", serde_json::to_string(&response)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!("Request failed: {}", e);
            println!("{}", serde_json::to_string(&ErrorPayload::from(&e))?);
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run(cli: &Cli) -> Result<ArticlesResponse, AggregatorError> {
    // Input is checked before configuration so a bad reference is reported as such.
    let source = cli.source.as_deref().map(str::trim).filter(|s| !s.is_empty());
    if let Some(url) = source {
        validate_feed_reference(url)?;
    }
    let limit = parse_limit(cli.limit.as_deref());

    let config = AppConfig::load()?;
    let aggregator = NewsAggregator::from_config(&config)?;

    info!("Fetching up to {} articles from {:?}", limit, source);
    let started = Instant::now();
    let articles = aggregator.get_articles(limit, source).await?;
    let duration_ms = started.elapsed().as_millis() as u64;

    info!("Returned {} articles in {}ms", articles.len(), duration_ms);
    Ok(ArticlesResponse::new(&articles, duration_ms))
}
