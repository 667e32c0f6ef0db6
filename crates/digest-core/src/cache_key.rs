/// Summary cache keys and expiry.
///
/// Keys hash the model name together with whitespace-normalized evidence, so cosmetic
/// whitespace differences in the same article share one cache slot while a model change
/// never does.
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use sha2::{Digest, Sha256};

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Trim and collapse every whitespace run to a single space. `None` normalizes to "".
pub fn normalize_evidence(evidence: Option<&str>) -> String {
    match evidence {
        Some(text) => WHITESPACE_RUN.replace_all(text.trim(), " ").into_owned(),
        None => String::new(),
    }
}

/// SHA-256 of `"{model}|{normalized evidence}"` as 64 lowercase hex characters.
pub fn compute_summary_cache_key(model: &str, evidence: Option<&str>) -> String {
    let normalized = normalize_evidence(evidence);
    let mut hasher = Sha256::new();
    hasher.update(format!("{model}|{normalized}").as_bytes());
    format!("{:x}", hasher.finalize())
}

/// An entry is expired once its age reaches the TTL. Entries dated in the future are not.
pub fn is_cache_expired(created_at: DateTime<Utc>, ttl_seconds: i64, now: DateTime<Utc>) -> bool {
    (now - created_at).num_seconds() >= ttl_seconds
}
