use crate::raw_feed::{self, RawEntry};
use crate::rss_utils::url::source_host;
use crate::types::{AggregatorError, NormalizedArticle, Result, UNTITLED};
use chrono::{DateTime, Utc};
use feed_rs::model::Entry;
use feed_rs::parser;
use tracing::{debug, info, warn};

/// Decodes RSS 2.0 (`rss/channel/item`) and Atom (`feed/entry`) documents
/// into normalized articles for a single feed URL.
///
/// feed-rs is the primary decoder. The path-based reader in `raw_feed`
/// fills fields feed-rs leaves empty, and takes over entirely when feed-rs
/// rejects a document whose root is still a feed root.
pub struct FeedParser {
    feed_url: String,
    source: String,
}

impl FeedParser {
    pub fn new(feed_url: &str) -> Self {
        Self {
            feed_url: feed_url.to_string(),
            source: source_host(feed_url).unwrap_or_else(|| "unknown".to_string()),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parse the document and normalize at most `limit` entries, in document order.
    /// A well-formed feed without entries yields an empty list.
    pub fn parse_feed(&self, content: &str, limit: usize) -> Result<Vec<NormalizedArticle>> {
        let content = content.trim_start();
        if content.is_empty() {
            return Err(self.fetch_failed("empty feed document"));
        }

        debug!("Parsing feed content from {} ({} bytes)", self.feed_url, content.len());

        let raw = raw_feed::decode(content);
        let now = Utc::now();

        let articles: Vec<NormalizedArticle> = match parser::parse(content.as_bytes()) {
            Ok(feed) => {
                let supplements: &[RawEntry] = match &raw {
                    Ok(r) if r.entries.len() == feed.entries.len() => &r.entries,
                    Ok(r) => {
                        debug!(
                            "Entry count mismatch for {} ({} vs {}); no path-based supplements",
                            self.feed_url,
                            feed.entries.len(),
                            r.entries.len()
                        );
                        &[]
                    }
                    Err(e) => {
                        debug!("Path-based read of {} failed: {}", self.feed_url, e);
                        &[]
                    }
                };

                feed.entries
                    .iter()
                    .take(limit)
                    .enumerate()
                    .map(|(i, entry)| self.normalize(Some(entry), supplements.get(i), now))
                    .collect()
            }
            Err(e) => match raw {
                Ok(r) if r.is_feed() => {
                    warn!("Feed decoder rejected {} ({}); reading entries by path", self.feed_url, e);
                    r.entries
                        .iter()
                        .take(limit)
                        .map(|entry| self.normalize(None, Some(entry), now))
                        .collect()
                }
                _ => return Err(self.fetch_failed(format!("unable to parse feed: {}", e))),
            },
        };

        if articles.is_empty() {
            warn!("Feed is empty: {}", self.feed_url);
        } else {
            info!("Parsed {} entries from {}", articles.len(), self.feed_url);
        }
        Ok(articles)
    }

    fn normalize(&self, entry: Option<&Entry>, raw: Option<&RawEntry>, now: DateTime<Utc>) -> NormalizedArticle {
        NormalizedArticle {
            real_title: title_or_placeholder(entry, raw),
            url: primary_link(entry, raw, &self.feed_url),
            source: self.source.clone(),
            category: first_category(entry, raw),
            published_at: published_or(entry, raw, now),
        }
    }

    fn fetch_failed(&self, reason: impl Into<String>) -> AggregatorError {
        AggregatorError::FetchFailed {
            url: self.feed_url.clone(),
            reason: reason.into(),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Entry title, or the placeholder when missing or blank.
pub fn title_or_placeholder(entry: Option<&Entry>, raw: Option<&RawEntry>) -> String {
    entry
        .and_then(|e| e.title.as_ref())
        .and_then(|t| non_empty(&t.content))
        .or_else(|| raw.and_then(|r| r.title.clone()))
        .unwrap_or_else(|| UNTITLED.to_string())
}

/// First non-empty link. Text links, `href` attributes (plain or `atom:`)
/// and repeated link elements all count; the feed URL is the link of last resort.
pub fn primary_link(entry: Option<&Entry>, raw: Option<&RawEntry>, feed_url: &str) -> String {
    entry
        .and_then(|e| e.links.iter().find_map(|l| non_empty(&l.href)))
        .or_else(|| raw.and_then(|r| r.link.clone()))
        .unwrap_or_else(|| feed_url.to_string())
}

/// First category term, whether the entry had a single scalar category or a list of tags.
pub fn first_category(entry: Option<&Entry>, raw: Option<&RawEntry>) -> Option<String> {
    entry
        .and_then(|e| e.categories.iter().find_map(|c| non_empty(&c.term)))
        .or_else(|| raw.and_then(|r| r.category.clone()))
}

/// RFC 3339 or RFC 2822 timestamp, normalized to UTC.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_rfc2822(value))
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// `pubDate`, then `published`, then `updated`, then `now`. Unparseable
/// values are skipped.
pub fn published_or(entry: Option<&Entry>, raw: Option<&RawEntry>, now: DateTime<Utc>) -> DateTime<Utc> {
    let raw_date = |value: Option<&String>| value.and_then(|v| parse_date(v));

    entry
        .and_then(|e| e.published)
        .or_else(|| raw_date(raw.and_then(|r| r.pub_date.as_ref())))
        .or_else(|| raw_date(raw.and_then(|r| r.published.as_ref())))
        .or_else(|| entry.and_then(|e| e.updated))
        .or_else(|| raw_date(raw.and_then(|r| r.updated.as_ref())))
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const FEED_URL: &str = "https://www.news.example.com/feed.xml";

    fn parse(xml: &str) -> Vec<NormalizedArticle> {
        FeedParser::new(FEED_URL).parse_feed(xml, 50).unwrap()
    }

    #[test]
    fn parses_rss_channel_items() {
        let xml = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Example RSS</title>
    <item>
      <title>First RSS Post</title>
      <link>https://news.example.com/posts/1</link>
      <pubDate>Mon, 01 Sep 2025 10:00:00 GMT</pubDate>
      <category>tech</category>
    </item>
    <item>
      <title>Second RSS Post</title>
      <link>https://news.example.com/posts/2</link>
    </item>
  </channel>
</rss>"#;

        let articles = parse(xml);
        assert_eq!(articles.len(), 2);

        let first = &articles[0];
        assert_eq!(first.real_title, "First RSS Post");
        assert_eq!(first.url, "https://news.example.com/posts/1");
        assert_eq!(first.source, "news.example.com");
        assert_eq!(first.category.as_deref(), Some("tech"));
        assert_eq!(first.published_at, Utc.with_ymd_and_hms(2025, 9, 1, 10, 0, 0).unwrap());

        assert_eq!(articles[1].real_title, "Second RSS Post");
        assert_eq!(articles[1].category, None);
    }

    #[test]
    fn parses_atom_entries_with_attribute_links() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Example Atom</title>
  <id>urn:example:feed</id>
  <updated>2025-09-02T08:00:00Z</updated>
  <entry>
    <title>Atom Entry</title>
    <id>urn:example:1</id>
    <link href="https://news.example.com/atom/1"/>
    <updated>2025-09-02T08:00:00Z</updated>
    <category term="politics"/>
    <category term="world"/>
  </entry>
</feed>"#;

        let articles = parse(xml);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].url, "https://news.example.com/atom/1");
        assert_eq!(articles[0].category.as_deref(), Some("politics"));
        assert_eq!(
            articles[0].published_at,
            Utc.with_ymd_and_hms(2025, 9, 2, 8, 0, 0).unwrap()
        );
    }

    #[test]
    fn multiple_links_take_the_first() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <title>t</title>
  <id>urn:example:feed</id>
  <updated>2025-09-02T08:00:00Z</updated>
  <entry>
    <title>Many links</title>
    <id>urn:example:2</id>
    <link rel="alternate" href="https://news.example.com/first"/>
    <link rel="related" href="https://news.example.com/second"/>
    <updated>2025-09-02T08:00:00Z</updated>
  </entry>
</feed>"#;

        let articles = parse(xml);
        assert_eq!(articles[0].url, "https://news.example.com/first");
    }

    #[test]
    fn attribute_links_are_read_per_item() {
        let xml = r#"<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">
  <channel>
    <title>Odd links</title>
    <item><title>scalar</title><link>https://news.example.com/a</link></item>
    <item><title>attribute</title><link href="https://news.example.com/b"/></item>
    <item><title>namespaced</title><atom:link href="https://news.example.com/d"/></item>
    <item><title>missing</title></item>
  </channel>
</rss>"#;

        let articles = parse(xml);
        assert_eq!(articles.len(), 4);
        assert_eq!(articles[0].url, "https://news.example.com/a");
        assert_eq!(articles[1].url, "https://news.example.com/b");
        assert_eq!(articles[2].url, "https://news.example.com/d");
        assert_eq!(articles[3].url, FEED_URL);
    }

    #[test]
    fn versionless_rss_is_read_by_path() {
        let xml = r#"<?xml version="1.0"?><rss><channel><title>t</title>
<item><title>x</title><link>https://n.example.com/1</link><category>local</category>
<pubDate>Thu, 02 Jan 2025 03:04:05 GMT</pubDate></item>
<item><link>https://n.example.com/2</link></item>
</channel></rss>"#;

        let articles = parse(xml);
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].real_title, "x");
        assert_eq!(articles[0].url, "https://n.example.com/1");
        assert_eq!(articles[0].source, "news.example.com");
        assert_eq!(articles[0].category.as_deref(), Some("local"));
        assert_eq!(articles[0].published_at, Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap());
        assert_eq!(articles[1].real_title, UNTITLED);
    }

    #[test]
    fn rss_items_fall_back_to_published_then_updated() {
        let xml = r#"<rss version="2.0"><channel><title>dates</title>
<item><title>updated only</title><link>https://n.example.com/3</link><updated>2025-01-02T03:04:05Z</updated></item>
<item><title>published and updated</title><link>https://n.example.com/4</link>
<updated>2025-01-05T00:00:00Z</updated><published>2025-01-04T00:00:00Z</published></item>
</channel></rss>"#;

        let articles = parse(xml);
        assert_eq!(articles[0].published_at, Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap());
        assert_eq!(articles[1].published_at, Utc.with_ymd_and_hms(2025, 1, 4, 0, 0, 0).unwrap());
    }

    #[test]
    fn fallback_rules_prefer_earlier_candidates() {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let raw = RawEntry {
            title: Some("raw title".to_string()),
            link: Some("https://raw.example.com/1".to_string()),
            pub_date: Some("garbage".to_string()),
            updated: Some("2025-03-01T00:00:00+02:00".to_string()),
            ..RawEntry::default()
        };

        assert_eq!(title_or_placeholder(None, Some(&raw)), "raw title");
        assert_eq!(title_or_placeholder(None, None), UNTITLED);
        assert_eq!(primary_link(None, Some(&raw), FEED_URL), "https://raw.example.com/1");
        assert_eq!(primary_link(None, None, FEED_URL), FEED_URL);
        assert_eq!(first_category(None, Some(&raw)), None);
        assert_eq!(
            published_or(None, Some(&raw), now),
            Utc.with_ymd_and_hms(2025, 2, 28, 22, 0, 0).unwrap()
        );
        assert_eq!(published_or(None, None, now), now);
    }

    #[test]
    fn missing_title_and_bad_date_fall_back() {
        let xml = r#"<rss version="2.0">
  <channel>
    <title>Fallbacks</title>
    <item>
      <link>https://news.example.com/untitled</link>
      <pubDate>not a date at all</pubDate>
    </item>
  </channel>
</rss>"#;

        let before = Utc::now();
        let articles = parse(xml);
        let after = Utc::now();

        assert_eq!(articles[0].real_title, UNTITLED);
        assert!(articles[0].published_at >= before && articles[0].published_at <= after);
    }

    #[test]
    fn respects_limit_and_order() {
        let items: String = (1..=5)
            .map(|i| format!("<item><title>Post {i}</title><link>https://e.com/{i}</link></item>"))
            .collect();
        let xml = format!(r#"<rss version="2.0"><channel><title>x</title>{items}</channel></rss>"#);

        let articles = FeedParser::new(FEED_URL).parse_feed(&xml, 3).unwrap();
        let titles: Vec<&str> = articles.iter().map(|a| a.real_title.as_str()).collect();
        assert_eq!(titles, vec!["Post 1", "Post 2", "Post 3"]);
    }

    #[test]
    fn empty_feed_is_not_an_error() {
        let xml = r#"<rss version="2.0"><channel><title>Nothing yet</title></channel></rss>"#;
        assert!(parse(xml).is_empty());
    }

    #[test]
    fn non_feed_documents_fail() {
        let parser = FeedParser::new(FEED_URL);
        for bad in ["", "   ", "{\"items\": []}", "<html><body><p>not a feed</p></body></html>"] {
            match parser.parse_feed(bad, 10) {
                Err(AggregatorError::FetchFailed { url, .. }) => assert_eq!(url, FEED_URL),
                other => panic!("expected FetchFailed for {:?}, got {:?}", bad, other),
            }
        }
    }
}
