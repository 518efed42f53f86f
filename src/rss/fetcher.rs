//! Feed fetching and decoding.
//!
//! One HTTP GET per call, no retries. The response body is decoded as
//! RSS/Atom and free-text fields are sanitized.

use chrono::{DateTime, Utc};
use feed_rs::parser;
use reqwest::Client;
use std::time::Duration;

use crate::config::FetchConfig;
use crate::rss::sanitize::sanitize;
use crate::{Result, SkimmerError};

/// A fetched feed after decoding and sanitization.
#[derive(Debug, Clone)]
pub struct ParsedFeed {
    /// Channel title (sanitized).
    pub title: String,
    /// Channel description (sanitized).
    pub description: String,
    /// Channel link, passed through untouched.
    pub link: Option<String>,
    /// Channel items.
    pub items: Vec<ParsedItem>,
}

/// A single feed item after decoding and sanitization.
#[derive(Debug, Clone)]
pub struct ParsedItem {
    /// Item title (sanitized).
    pub title: String,
    /// Item link, passed through untouched.
    pub link: Option<String>,
    /// Item description (sanitized); empty when the source has none.
    pub description: String,
    /// Publish date, passed through untouched.
    pub published: Option<DateTime<Utc>>,
}

/// Feed fetcher with a configured HTTP client.
pub struct FeedFetcher {
    client: Client,
    max_feed_size: u64,
}

impl FeedFetcher {
    /// Create a new fetcher from the fetch configuration.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .timeout(Duration::from_secs(config.total_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| SkimmerError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_feed_size: config.max_feed_size_bytes,
        })
    }

    /// Fetch and decode a feed from the given URL.
    ///
    /// A single attempt; transport failures and elapsed deadlines surface
    /// as network errors. Non-success statuses are not rejected up front:
    /// an error body that is not valid XML fails decoding instead.
    pub async fn fetch(&self, url: &str) -> Result<ParsedFeed> {
        validate_url(url)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SkimmerError::Network(format!("fetch {url}: {e}")))?;

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_feed_size {
                return Err(SkimmerError::Validation(format!(
                    "feed too large: {} bytes (max {} bytes)",
                    content_length, self.max_feed_size
                )));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SkimmerError::Network(format!("read {url}: {e}")))?;

        if bytes.len() as u64 > self.max_feed_size {
            return Err(SkimmerError::Validation(format!(
                "feed too large: {} bytes (max {} bytes)",
                bytes.len(),
                self.max_feed_size
            )));
        }

        parse_feed(&bytes)
    }
}

/// Fetch a feed using default fetch settings.
pub async fn fetch_feed(url: &str) -> Result<ParsedFeed> {
    FeedFetcher::new(&FetchConfig::default())?.fetch(url).await
}

/// Validate a feed URL before fetching: http/https scheme and a host.
pub fn validate_url(url: &str) -> Result<()> {
    let parsed =
        url::Url::parse(url).map_err(|e| SkimmerError::Validation(format!("invalid URL: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(SkimmerError::Validation(format!(
                "unsupported URL scheme: {scheme}"
            )));
        }
    }

    if parsed.host().is_none() {
        return Err(SkimmerError::Validation("URL has no host".to_string()));
    }

    Ok(())
}

/// Decode feed bytes into a ParsedFeed.
fn parse_feed(bytes: &[u8]) -> Result<ParsedFeed> {
    let feed = parser::parse(bytes)
        .map_err(|e| SkimmerError::Parse(format!("malformed feed: {e}")))?;

    let title = feed.title.map(|t| sanitize(&t.content)).unwrap_or_default();
    let description = feed
        .description
        .map(|d| sanitize(&d.content))
        .unwrap_or_default();
    let link = feed.links.first().map(|l| l.href.clone());

    let items = feed
        .entries
        .into_iter()
        .map(|entry| {
            let item_title = entry.title.map(|t| sanitize(&t.content)).unwrap_or_default();
            let item_link = entry.links.first().map(|l| l.href.clone());
            let item_description = entry
                .summary
                .map(|s| sanitize(&s.content))
                .or_else(|| entry.content.and_then(|c| c.body).map(|b| sanitize(&b)))
                .unwrap_or_default();
            let published = entry.published.or(entry.updated);

            ParsedItem {
                title: item_title,
                link: item_link,
                description: item_description,
                published,
            }
        })
        .collect();

    Ok(ParsedFeed {
        title,
        description,
        link,
        items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url_valid() {
        assert!(validate_url("https://example.com/feed.xml").is_ok());
        assert!(validate_url("http://example.com/feed.xml").is_ok());
    }

    #[test]
    fn test_validate_url_invalid_scheme() {
        let result = validate_url("ftp://example.com/feed.xml");
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("unsupported URL scheme"));
    }

    #[test]
    fn test_validate_url_not_a_url() {
        assert!(matches!(
            validate_url("not a url"),
            Err(SkimmerError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_url_no_host() {
        assert!(matches!(
            validate_url("http:///feed.xml"),
            Err(SkimmerError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_feed_rss_two_items() {
        let rss = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Go Blog &amp; News</title>
    <link>https://example.com</link>
    <description>A test feed</description>
    <item>
      <title>First Article</title>
      <link>https://example.com/1</link>
      <description>&lt;p&gt;First summary&lt;/p&gt;</description>
      <pubDate>Mon, 02 Jun 2025 09:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Second Article</title>
      <link>https://example.com/2</link>
      <description>Second summary</description>
    </item>
  </channel>
</rss>"#;

        let feed = parse_feed(rss.as_bytes()).unwrap();
        assert_eq!(feed.title, "Go Blog & News");
        assert_eq!(feed.description, "A test feed");
        // feed-rs may normalize URLs with a trailing slash
        assert!(feed.link.as_ref().unwrap().starts_with("https://example.com"));
        assert_eq!(feed.items.len(), 2);
        assert_eq!(feed.items[0].title, "First Article");
        assert_eq!(feed.items[0].link, Some("https://example.com/1".to_string()));
        assert_eq!(feed.items[0].description, "First summary");
        assert!(feed.items[0].published.is_some());
        assert_eq!(feed.items[1].title, "Second Article");
        assert!(feed.items[1].published.is_none());
    }

    #[test]
    fn test_parse_feed_sanitizes_item_markup() {
        let rss = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Feed</title>
    <item>
      <title>Post</title>
      <link>https://example.com/1</link>
      <description>&lt;div&gt;Learning about &lt;code&gt;defer&lt;/code&gt; keywords.&lt;/div&gt;</description>
    </item>
  </channel>
</rss>"#;

        let feed = parse_feed(rss.as_bytes()).unwrap();
        assert_eq!(feed.items[0].description, "Learning about defer keywords.");
    }

    #[test]
    fn test_parse_feed_atom() {
        let atom = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Feed</title>
  <link href="https://example.com"/>
  <entry>
    <id>urn:uuid:1</id>
    <title>Atom Entry</title>
    <link href="https://example.com/entry"/>
    <summary>Entry summary</summary>
    <updated>2025-01-01T00:00:00Z</updated>
  </entry>
</feed>"#;

        let feed = parse_feed(atom.as_bytes()).unwrap();
        assert_eq!(feed.title, "Atom Feed");
        assert_eq!(feed.items.len(), 1);
        assert_eq!(feed.items[0].title, "Atom Entry");
        // No published date; updated is the fallback
        assert!(feed.items[0].published.is_some());
    }

    #[test]
    fn test_parse_feed_missing_fields_are_empty() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <item>
      <link>https://example.com/1</link>
    </item>
  </channel>
</rss>"#;

        let feed = parse_feed(rss.as_bytes()).unwrap();
        assert_eq!(feed.title, "");
        assert_eq!(feed.description, "");
        assert_eq!(feed.items.len(), 1);
        assert_eq!(feed.items[0].title, "");
        assert_eq!(feed.items[0].description, "");
    }

    #[test]
    fn test_parse_feed_not_xml() {
        let result = parse_feed(b"This is not XML");
        assert!(matches!(result, Err(SkimmerError::Parse(_))));
    }

    #[test]
    fn test_parse_feed_unterminated_tag() {
        // Input ends in the middle of a closing tag
        let result =
            parse_feed(b"<?xml version=\"1.0\"?><rss version=\"2.0\"><channel><title>Oops</title");
        assert!(matches!(result, Err(SkimmerError::Parse(_))));
    }
}
