//! Lucky-news feed.
//!
//! Two sources, in order: an optional JSON feed (`LUCKY_FEED_URL`) and a set
//! of Thai news RSS feeds filtered down to lottery-related headlines. Both
//! are parsed leniently into [`LuckyItem`]; anything malformed is skipped.

use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::name::QName;
use quick_xml::reader::Reader;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::FeedError;

/// Per-request timeout for feed calls.
pub const FEED_TIMEOUT: Duration = Duration::from_secs(8);

/// Some publishers reject requests without a browser-like agent.
const USER_AGENT: &str = "Mozilla/5.0 (compatible; line-concierge)";

/// One news headline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LuckyItem {
    pub title: String,
    pub url: String,
    pub image_url: Option<String>,
    pub source: Option<String>,
    /// As published; RFC 2822 for RSS, free-form for JSON feeds.
    pub published_at: Option<String>,
}

/// Source of lucky-news headlines.
#[async_trait]
pub trait NewsFeed: Send + Sync {
    /// At most `limit` items, deduplicated by URL. An empty list is not an error.
    async fn fetch(&self, limit: usize) -> Result<Vec<LuckyItem>, FeedError>;
}

/// An RSS endpoint to aggregate.
#[derive(Debug, Clone)]
pub struct RssSource {
    pub name: String,
    pub url: String,
}

impl RssSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Thai news outlets aggregated when the JSON feed is absent or short.
pub fn default_rss_sources() -> Vec<RssSource> {
    vec![
        RssSource::new("Thairath", "https://www.thairath.co.th/rss/news"),
        RssSource::new("Khaosod", "https://www.khaosod.co.th/feed"),
        RssSource::new("Matichon", "https://www.matichon.co.th/feed"),
        RssSource::new("Sanook", "https://www.sanook.com/news/rss/"),
        RssSource::new("DailyNews", "https://www.dailynews.co.th/feed/"),
    ]
}

// ── HTTP implementation ─────────────────────────────────────────────

pub struct HttpNewsFeed {
    client: reqwest::Client,
    feed_url: Option<String>,
    rss_sources: Vec<RssSource>,
    timeout: Duration,
}

impl HttpNewsFeed {
    pub fn new(feed_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            feed_url,
            rss_sources: default_rss_sources(),
            timeout: FEED_TIMEOUT,
        }
    }

    pub fn with_rss_sources(mut self, sources: Vec<RssSource>) -> Self {
        self.rss_sources = sources;
        self
    }

    async fn get_text(&self, url: &str) -> Result<String, FeedError> {
        let resp = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| FeedError::RequestFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FeedError::BadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        resp.text().await.map_err(|e| FeedError::RequestFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    async fn fetch_rss(&self, source: &RssSource) -> Result<Vec<LuckyItem>, FeedError> {
        let xml = self.get_text(&source.url).await?;
        Ok(parse_rss(&xml, &source.name)
            .into_iter()
            .filter(|item| is_lucky_headline(&item.title))
            .collect())
    }
}

#[async_trait]
impl NewsFeed for HttpNewsFeed {
    async fn fetch(&self, limit: usize) -> Result<Vec<LuckyItem>, FeedError> {
        let mut items = Vec::new();
        let mut succeeded = 0usize;
        let mut last_error = None;

        if let Some(url) = &self.feed_url {
            match self.get_text(url).await {
                Ok(body) => {
                    succeeded += 1;
                    items.extend(parse_feed_json(&body));
                }
                Err(e) => {
                    warn!(error = %e, "Lucky feed unavailable, trying RSS");
                    last_error = Some(e);
                }
            }
        }

        if items.len() < limit && !self.rss_sources.is_empty() {
            let results =
                futures::future::join_all(self.rss_sources.iter().map(|s| self.fetch_rss(s)))
                    .await;
            for (source, result) in self.rss_sources.iter().zip(results) {
                match result {
                    Ok(found) => {
                        debug!(source = %source.name, count = found.len(), "RSS source fetched");
                        succeeded += 1;
                        items.extend(found);
                    }
                    Err(e) => {
                        debug!(source = %source.name, error = %e, "RSS source failed");
                        last_error = Some(e);
                    }
                }
            }
        }

        match last_error {
            Some(e) if succeeded == 0 => Err(e),
            _ => Ok(finalize(items, limit)),
        }
    }
}

// ── Parsing ─────────────────────────────────────────────────────────

static LUCKY_HEADLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(หวย|เลขเด็ด|ลอตเตอรี่|สลาก|ตรวจหวย|เลขดัง|เฮง|เสี่ยงโชค)")
        .expect("valid lucky pattern")
});

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid tag pattern"));

/// Whether a headline is about lotteries or luck.
pub fn is_lucky_headline(title: &str) -> bool {
    LUCKY_HEADLINE.is_match(title)
}

/// Parse a JSON feed body. Accepts `{items: [...]}`, `{articles: [...]}` or a
/// bare array; anything else yields an empty list.
pub fn parse_feed_json(body: &str) -> Vec<LuckyItem> {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return Vec::new();
    };

    let list = match &value {
        Value::Array(list) => list,
        Value::Object(map) => match map.get("items").or_else(|| map.get("articles")) {
            Some(Value::Array(list)) => list,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    list.iter().filter_map(item_from_json).collect()
}

fn item_from_json(value: &Value) -> Option<LuckyItem> {
    let obj = value.as_object()?;
    let field = |keys: &[&str]| {
        keys.iter()
            .filter_map(|k| obj.get(*k).and_then(Value::as_str))
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(str::to_string)
    };

    Some(LuckyItem {
        title: field(&["title", "headline"])?,
        url: field(&["url", "link"])?,
        image_url: field(&["imageUrl", "image", "thumbnail"]),
        source: field(&["source", "site"]),
        published_at: field(&["publishedAt", "pubDate"]),
    })
}

/// Item children we read. Publication date takes the first of its aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RssField {
    Title,
    Link,
    Guid,
    Published,
}

impl RssField {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "title" => Some(Self::Title),
            "link" => Some(Self::Link),
            "guid" => Some(Self::Guid),
            "pubdate" | "updated" | "dc:date" => Some(Self::Published),
            _ => None,
        }
    }
}

#[derive(Default)]
struct RssItem {
    title: String,
    link: String,
    guid: String,
    published: String,
}

impl RssItem {
    fn slot(&mut self, field: RssField) -> &mut String {
        match field {
            RssField::Title => &mut self.title,
            RssField::Link => &mut self.link,
            RssField::Guid => &mut self.guid,
            RssField::Published => &mut self.published,
        }
    }

    fn into_lucky(self, source: &str) -> Option<LuckyItem> {
        let title = clean_text(&self.title);
        let url = [self.link, self.guid]
            .into_iter()
            .map(|u| clean_text(&u))
            .find(|u| !u.is_empty())?;
        let published_at = Some(clean_text(&self.published)).filter(|d| !d.is_empty());
        (!title.is_empty()).then(|| LuckyItem {
            title,
            url,
            image_url: None,
            source: Some(source.to_string()),
            published_at,
        })
    }
}

fn tag_name(name: QName<'_>) -> String {
    String::from_utf8_lossy(name.as_ref()).to_ascii_lowercase()
}

/// Parse the `<item>` elements of an RSS document.
///
/// Lenient: mismatched end tags are tolerated, unknown entities are kept as
/// written, and a syntax error ends parsing with the items read so far.
pub fn parse_rss(xml: &str, source: &str) -> Vec<LuckyItem> {
    let mut reader = Reader::from_str(xml);
    let config = reader.config_mut();
    config.trim_text(true);
    config.check_end_names = false;

    let mut items = Vec::new();
    let mut current: Option<RssItem> = None;
    let mut field: Option<RssField> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let tag = tag_name(e.name());
                if tag == "item" {
                    current = Some(RssItem::default());
                    field = None;
                } else if let (Some(item), None) = (current.as_mut(), field) {
                    // repeated fields keep the first value
                    field = RssField::from_tag(&tag).filter(|f| item.slot(*f).is_empty());
                }
            }
            Ok(Event::End(e)) => {
                let tag = tag_name(e.name());
                if tag == "item" {
                    items.extend(current.take().and_then(|item| item.into_lucky(source)));
                    field = None;
                } else if field.is_some() && RssField::from_tag(&tag) == field {
                    field = None;
                }
            }
            Ok(Event::Text(t)) => {
                if let (Some(item), Some(f)) = (current.as_mut(), field) {
                    push_piece(item.slot(f), &decode_text(&t));
                }
            }
            Ok(Event::CData(c)) => {
                if let (Some(item), Some(f)) = (current.as_mut(), field) {
                    push_piece(item.slot(f), &String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                debug!(source, error = %e, "RSS parse stopped early");
                break;
            }
            Ok(_) => {}
        }
    }
    items
}

/// Unescape XML entities. Feeds often carry HTML's `&nbsp;`, which XML does
/// not define; any other unknown entity leaves the text as written.
fn decode_text(raw: &[u8]) -> String {
    let raw = String::from_utf8_lossy(raw).replace("&nbsp;", " ");
    let decoded = quick_xml::escape::unescape(&raw).map(|text| text.into_owned());
    decoded.unwrap_or(raw)
}

fn push_piece(slot: &mut String, piece: &str) {
    if !slot.is_empty() {
        slot.push(' ');
    }
    slot.push_str(piece);
}

/// Drop markup left inside a value (CDATA often carries HTML), collapse whitespace.
fn clean_text(raw: &str) -> String {
    TAG.replace_all(raw, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drop items missing a title or URL, dedupe by URL (first wins), cap.
pub fn finalize(items: Vec<LuckyItem>, limit: usize) -> Vec<LuckyItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| !item.title.trim().is_empty() && !item.url.trim().is_empty())
        .filter(|item| seen.insert(item.url.clone()))
        .take(limit)
        .collect()
}
