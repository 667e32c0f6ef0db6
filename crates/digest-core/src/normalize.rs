/// URL and title canonicalization for deduplication.
use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};
use url::Url;

use crate::model::NewsItem;

/// Query parameters that identify a campaign, not a document.
const TRACKING_PARAMS: [&str; 9] = [
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_cid",
    "mc_eid",
];

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Lowercase scheme and host, drop the fragment and tracking parameters, and sort what
/// remains of the query. Strings that do not parse as absolute URLs are returned trimmed.
pub fn normalize_url(raw: &str) -> String {
    let raw = raw.trim();
    let Ok(mut url) = Url::parse(raw) else {
        return raw.to_string();
    };

    url.set_fragment(None);

    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.to_lowercase().as_str()))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    pairs.sort();

    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(pairs.iter());
    }

    url.to_string()
}

pub fn normalize_title(title: &str) -> String {
    WHITESPACE_RUN.replace_all(title.trim(), " ").into_owned()
}

/// Stable content key: SHA-256 of the normalized `"{url}|{title}"`, lowercase hex.
pub fn dedupe_key(url: &str, title: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}|{}", normalize_url(url), normalize_title(title)).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Drop items whose dedupe key was already seen. First occurrence wins; order is kept.
pub fn normalize_and_dedupe(items: Vec<NewsItem>) -> Vec<NewsItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(dedupe_key(&item.url, &item.title)))
        .collect()
}
