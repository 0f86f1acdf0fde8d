pub mod json_feed;
pub mod rss_feed;

pub use json_feed::JsonFeedSource;
pub use rss_feed::RssFeedSource;
