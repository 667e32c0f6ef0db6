/// RSS document parsing into `NewsItem`s.
///
/// Items missing a title, link or parseable RFC 2822 `pubDate` are skipped, not errors.
/// Only an unreadable document is an error. Document order is preserved because the
/// ranker's final tie-break is input position.
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::FeedError;
use crate::model::NewsItem;

/// Parse an RSS 2.0 document.
///
/// `source` labels every item. With `use_item_source`, an item's own non-empty `<source>`
/// element overrides it.
pub fn parse_rss(xml: &str, source: &str, use_item_source: bool) -> Result<Vec<NewsItem>, FeedError> {
    let channel =
        rss::Channel::read_from(xml.as_bytes()).map_err(|e| FeedError::Malformed(e.to_string()))?;

    Ok(channel
        .items()
        .iter()
        .filter_map(|item| to_news_item(item, source, use_item_source))
        .collect())
}

fn to_news_item(item: &rss::Item, source: &str, use_item_source: bool) -> Option<NewsItem> {
    let title = non_empty(item.title())?;
    let url = non_empty(item.link())?;
    let pub_date = non_empty(item.pub_date())?;

    let published_at = match parse_pub_date(pub_date) {
        Some(dt) => dt,
        None => {
            debug!(pub_date, title, "skipping item with unparseable pubDate");
            return None;
        }
    };

    let item_source = if use_item_source {
        item.source()
            .and_then(|s| non_empty(s.title()))
            .unwrap_or(source)
    } else {
        source
    };

    Some(NewsItem {
        source: item_source.to_string(),
        url: url.to_string(),
        published_at,
        title: title.to_string(),
        evidence: non_empty(item.description()).unwrap_or_default().to_string(),
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub fn parse_pub_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
