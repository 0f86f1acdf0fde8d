pub mod types;
pub mod traits;
pub mod rss_utils;
pub mod raw_feed;
pub mod parser;
pub mod fetcher;
pub mod sources;
pub mod resolver;
pub mod retry;
pub mod llm_adapter;
pub mod cache;
pub mod config;
pub mod aggregator;

pub use types::*;
pub use traits::{CachePort, ContentTypeProbe, EnrichmentPort, NewsSourceStrategy, StrategyKind};
pub use fetcher::{Fetcher, HttpContentTypeProbe};
pub use parser::FeedParser;
pub use sources::{JsonFeedSource, RssFeedSource};
pub use resolver::SourceResolver;
pub use retry::RetryPolicy;
pub use llm_adapter::OpenAiEnrichment;
pub use cache::MemoryCache;
pub use config::AppConfig;
pub use aggregator::NewsAggregator;
