/// Summary pipeline: cache lookup, LLM call, output parsing, grounding, cache write.
///
/// A fresh cached summary is served even when the LLM is disabled; `LLM_DISABLED` only
/// stands in for the provider call.
///
/// The pipeline always yields a `SummaryResult`. Transport failures, unparseable output and
/// ungrounded citations all become refusals with a stable code; nothing here returns an
/// error to the caller. Only grounded summaries are cached, so a transient refusal never
/// pins an item to "no summary" for the TTL.
use std::future::Future;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::cache_key::compute_summary_cache_key;
use crate::codes;
use crate::grounding::validate_grounding;
use crate::model::{NewsItem, SummaryResult};
use crate::redis::RedisCache;
use crate::summary_cache::{CacheStore, CachedSummary, SummaryCache};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 7 * 24 * 3600;

pub const SYSTEM_PROMPT: &str = r#"You are a news summarization assistant. Given a news item and evidence, produce a JSON object.

STRICT RULES (violations will be rejected):
1. Use ONLY the provided evidence. Do not use prior knowledge or external information.
2. If evidence is insufficient to write a factual summary, return: {"refusal": "NO_EVIDENCE"}
3. Every factual claim in the summary MUST have a citation.
4. Citation evidence_snippet MUST be an EXACT quote from the provided evidence.
5. Do not infer or add information not explicitly stated in the evidence.

Output JSON structure:
{
"summary": "1-2 sentence summary using only provided evidence",
"tags": ["tag1", "tag2"],
"citations": [
    {"source_url": "the item's URL", "evidence_snippet": "EXACT quote from evidence"}
],
"confidence": 0.0 to 1.0
}

Respond with ONLY the JSON object."#;

pub const REPAIR_PROMPT: &str =
    "The following output was supposed to be a single JSON object but could not be parsed. \
     Return ONLY the corrected JSON object, with no markdown and no explanation.";

static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```(?:json)?\s*\n?(.*?)\n?```$").expect("valid regex")
});

#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub model: String,
    pub enabled: bool,
    pub cache_ttl_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            enabled: false,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("llm api call failed: {0}")]
    Api(String),

    #[error("llm call timed out")]
    Timeout,
}

/// The LLM transport. Implementations send prompts and return raw model text.
pub trait SummaryProvider {
    fn complete(
        &self,
        model: &str,
        system: &str,
        user: &str,
    ) -> impl Future<Output = Result<String, ProviderError>> + Send;
}

/// User message for one item. Only `evidence` may be cited.
pub fn user_prompt(item: &NewsItem, evidence: &str) -> String {
    format!(
        "News item:\nTitle: {}\nSource: {}\nURL: {}\nPublished: {}\n\nEvidence:\n{}\n",
        item.title,
        item.source,
        item.url,
        item.published_at.to_rfc3339(),
        evidence
    )
}

/// Parse raw model output into a `SummaryResult`.
///
/// A single surrounding markdown fence is stripped. Anything that is not then a JSON object
/// satisfying the summary-or-refusal contract yields `None`; there is no partial recovery.
pub fn parse_summary_output(raw: &str) -> Option<SummaryResult> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    let text = match FENCE.captures(text).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => text,
    };
    serde_json::from_str(text).ok()
}

pub struct SummaryPipeline<P, S = RedisCache> {
    provider: P,
    cache: SummaryCache<S>,
    config: LlmConfig,
}

impl<P: SummaryProvider, S: CacheStore> SummaryPipeline<P, S> {
    pub fn new(provider: P, cache: SummaryCache<S>, config: LlmConfig) -> Self {
        Self {
            provider,
            cache,
            config,
        }
    }

    /// Summarize one item against `evidence` at time `now`.
    pub async fn summarize(&self, item: &NewsItem, evidence: &str, now: DateTime<Utc>) -> SummaryResult {
        let cache_key = compute_summary_cache_key(&self.config.model, Some(evidence));
        if let Some(hit) = self.cache.get(&cache_key, now).await {
            debug!(url = %item.url, cache_key, "summary cache hit");
            return hit.result;
        }

        if !self.config.enabled {
            debug!(url = %item.url, "llm disabled, refusing");
            return SummaryResult::refusal(codes::LLM_DISABLED);
        }

        let result = validate_grounding(self.call_model(item, evidence).await, Some(evidence));

        match result.refusal_code() {
            Some(code) => info!(url = %item.url, refusal = code, "summary refused"),
            None => {
                let entry = CachedSummary {
                    model: self.config.model.clone(),
                    created_at: now,
                    result: result.clone(),
                };
                self.cache.put(&cache_key, &entry).await;
                info!(url = %item.url, cache_key, "summary grounded and cached");
            }
        }

        result
    }

    /// One call, plus one repair attempt when the first output does not parse.
    async fn call_model(&self, item: &NewsItem, evidence: &str) -> SummaryResult {
        let model = &self.config.model;

        let raw = match self
            .provider
            .complete(model, SYSTEM_PROMPT, &user_prompt(item, evidence))
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, url = %item.url, "llm call failed");
                return SummaryResult::refusal(codes::LLM_API_FAIL);
            }
        };

        if let Some(result) = parse_summary_output(&raw) {
            return result;
        }

        debug!(url = %item.url, "unparseable llm output, retrying with repair prompt");
        match self.provider.complete(model, REPAIR_PROMPT, &raw).await {
            Ok(repaired) => parse_summary_output(&repaired)
                .unwrap_or_else(|| SummaryResult::refusal(codes::LLM_PARSE_FAIL)),
            Err(e) => {
                warn!(error = %e, url = %item.url, "llm repair call failed");
                SummaryResult::refusal(codes::LLM_API_FAIL)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Citation;
    use crate::summary_cache::MemoryStore;
    use chrono::{Duration, TimeZone};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const EVIDENCE: &str = "Acme Corp reported record revenue of $5 billion.";

    struct Scripted {
        replies: Mutex<VecDeque<Result<String, ProviderError>>>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl SummaryProvider for Scripted {
        fn complete(
            &self,
            _model: &str,
            _system: &str,
            _user: &str,
        ) -> impl Future<Output = Result<String, ProviderError>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::Api("no scripted reply".to_string())));
            async move { reply }
        }
    }

    fn grounded_json() -> String {
        r#"{"summary": "Acme posted record revenue.", "tags": ["business"],
            "citations": [{"source_url": "https://e.com/acme", "evidence_snippet": "record revenue of $5 billion"}]}"#
            .to_string()
    }

    fn item() -> NewsItem {
        NewsItem {
            source: "wire".to_string(),
            url: "https://e.com/acme".to_string(),
            published_at: Utc.with_ymd_and_hms(2026, 1, 14, 9, 0, 0).unwrap(),
            title: "Acme results".to_string(),
            evidence: EVIDENCE.to_string(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 14, 12, 0, 0).unwrap()
    }

    fn enabled() -> LlmConfig {
        LlmConfig {
            enabled: true,
            ..LlmConfig::default()
        }
    }

    fn pipeline(replies: Vec<Result<String, ProviderError>>) -> SummaryPipeline<Scripted> {
        let config = enabled();
        SummaryPipeline::new(
            Scripted::new(replies),
            SummaryCache::new(RedisCache::disabled(), config.cache_ttl_secs),
            config,
        )
    }

    fn cached_pipeline(
        replies: Vec<Result<String, ProviderError>>,
        store: &MemoryStore,
        config: LlmConfig,
    ) -> SummaryPipeline<Scripted, MemoryStore> {
        let cache = SummaryCache::new(store.clone(), config.cache_ttl_secs);
        SummaryPipeline::new(Scripted::new(replies), cache, config)
    }

    async fn seed(store: &MemoryStore, created_at: DateTime<Utc>) -> SummaryResult {
        let result = SummaryResult::summary(
            "Acme had a record year.",
            vec!["business".to_string()],
            vec![Citation::new("https://e.com/acme", "record revenue")],
            None,
        )
        .unwrap();
        let entry = CachedSummary {
            model: DEFAULT_MODEL.to_string(),
            created_at,
            result: result.clone(),
        };
        let key = compute_summary_cache_key(DEFAULT_MODEL, Some(EVIDENCE));
        SummaryCache::new(store.clone(), DEFAULT_CACHE_TTL_SECS)
            .put(&key, &entry)
            .await;
        result
    }

    #[test]
    fn test_parse_plain_and_fenced_json() {
        let plain = parse_summary_output(&grounded_json()).unwrap();
        assert_eq!(plain.summary_text(), Some("Acme posted record revenue."));

        let fenced = format!("```json\n{}\n```", grounded_json());
        assert_eq!(parse_summary_output(&fenced), Some(plain.clone()));

        let bare_fence = format!("```\n{}\n```", grounded_json());
        assert_eq!(parse_summary_output(&bare_fence), Some(plain));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_summary_output(""), None);
        assert_eq!(parse_summary_output("   "), None);
        assert_eq!(parse_summary_output("Sure! Here is the summary."), None);
        assert_eq!(parse_summary_output(r#"{"summary": "x", "tags": [],"#), None);
        assert_eq!(parse_summary_output(r#"{"summary": "no citations"}"#), None);
    }

    #[test]
    fn test_parse_refusal() {
        let parsed = parse_summary_output(r#"{"refusal": "NO_EVIDENCE"}"#).unwrap();
        assert_eq!(parsed.refusal_code(), Some("NO_EVIDENCE"));
    }

    #[tokio::test]
    async fn test_disabled_refuses_without_calling_provider() {
        let p = SummaryPipeline::new(
            Scripted::new(vec![Ok(grounded_json())]),
            SummaryCache::new(RedisCache::disabled(), 60),
            LlmConfig::default(),
        );
        let result = p.summarize(&item(), EVIDENCE, now()).await;
        assert_eq!(result.refusal_code(), Some(codes::LLM_DISABLED));
        assert_eq!(p.provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_provider() {
        let store = MemoryStore::default();
        let cached = seed(&store, now() - Duration::hours(1)).await;
        let p = cached_pipeline(vec![Ok(grounded_json())], &store, enabled());

        let result = p.summarize(&item(), EVIDENCE, now()).await;
        assert_eq!(result, cached);
        assert_eq!(p.provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cache_hit_is_served_while_disabled() {
        let store = MemoryStore::default();
        let cached = seed(&store, now() - Duration::hours(1)).await;
        let p = cached_pipeline(vec![Ok(grounded_json())], &store, LlmConfig::default());

        let result = p.summarize(&item(), EVIDENCE, now()).await;
        assert_eq!(result, cached);
        assert_eq!(p.provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_expired_entry_calls_provider() {
        let store = MemoryStore::default();
        let ttl = i64::try_from(DEFAULT_CACHE_TTL_SECS).unwrap();
        let stale = seed(&store, now() - Duration::seconds(ttl)).await;
        let p = cached_pipeline(vec![Ok(grounded_json())], &store, enabled());

        let result = p.summarize(&item(), EVIDENCE, now()).await;
        assert_ne!(result, stale);
        assert_eq!(result.summary_text(), Some("Acme posted record revenue."));
        assert_eq!(p.provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_grounded_summary_is_cached_for_next_call() {
        let store = MemoryStore::default();
        let p = cached_pipeline(vec![Ok(grounded_json())], &store, enabled());

        let first = p.summarize(&item(), EVIDENCE, now()).await;
        assert!(!first.is_refusal());
        assert_eq!(store.len(), 1);

        let second = p.summarize(&item(), EVIDENCE, now() + Duration::hours(1)).await;
        assert_eq!(second, first);
        assert_eq!(p.provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refusals_are_not_cached() {
        let invented = r#"{"summary": "Acme tripled profits.", "tags": ["business"],
            "citations": [{"source_url": "https://e.com/acme", "evidence_snippet": "profits tripled"}]}"#;

        let store = MemoryStore::default();
        let p = cached_pipeline(vec![Ok(invented.to_string())], &store, enabled());
        let result = p.summarize(&item(), EVIDENCE, now()).await;
        assert_eq!(result.refusal_code(), Some(codes::GROUNDING_FAIL));
        assert_eq!(store.len(), 0);

        let p = cached_pipeline(vec![Err(ProviderError::Timeout)], &store, enabled());
        let result = p.summarize(&item(), EVIDENCE, now()).await;
        assert_eq!(result.refusal_code(), Some(codes::LLM_API_FAIL));
        assert_eq!(store.len(), 0);

        let p = cached_pipeline(Vec::new(), &store, LlmConfig::default());
        let result = p.summarize(&item(), EVIDENCE, now()).await;
        assert_eq!(result.refusal_code(), Some(codes::LLM_DISABLED));
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_grounded_summary_is_returned() {
        let p = pipeline(vec![Ok(grounded_json())]);
        let result = p.summarize(&item(), EVIDENCE, now()).await;
        assert!(!result.is_refusal());
        assert_eq!(result.citations()[0].evidence_snippet, "record revenue of $5 billion");
    }

    #[tokio::test]
    async fn test_api_failure_is_llm_api_fail() {
        let p = pipeline(vec![Err(ProviderError::Timeout)]);
        let result = p.summarize(&item(), EVIDENCE, now()).await;
        assert_eq!(result.refusal_code(), Some(codes::LLM_API_FAIL));
    }

    #[tokio::test]
    async fn test_repair_attempt_recovers() {
        let p = pipeline(vec![Ok("not json".to_string()), Ok(grounded_json())]);
        let result = p.summarize(&item(), EVIDENCE, now()).await;
        assert!(!result.is_refusal());
        assert_eq!(p.provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unrepairable_output_is_llm_parse_fail() {
        let p = pipeline(vec![Ok("not json".to_string()), Ok("still not json".to_string())]);
        let result = p.summarize(&item(), EVIDENCE, now()).await;
        assert_eq!(result.refusal_code(), Some(codes::LLM_PARSE_FAIL));
    }

    #[tokio::test]
    async fn test_ungrounded_output_is_grounding_fail() {
        let invented = r#"{"summary": "Acme tripled profits.", "tags": ["business"],
            "citations": [{"source_url": "https://e.com/acme", "evidence_snippet": "profits tripled"}]}"#;
        let p = pipeline(vec![Ok(invented.to_string())]);
        let result = p.summarize(&item(), EVIDENCE, now()).await;
        assert_eq!(result.refusal_code(), Some(codes::GROUNDING_FAIL));
    }

    #[tokio::test]
    async fn test_blank_evidence_is_no_evidence() {
        let p = pipeline(vec![Ok(grounded_json())]);
        let result = p.summarize(&item(), "   ", now()).await;
        assert_eq!(result.refusal_code(), Some(codes::NO_EVIDENCE));
    }

    #[test]
    fn test_user_prompt_carries_item_and_evidence() {
        let prompt = user_prompt(&item(), EVIDENCE);
        assert!(prompt.contains("Title: Acme results"));
        assert!(prompt.contains("URL: https://e.com/acme"));
        assert!(prompt.ends_with(&format!("Evidence:\n{EVIDENCE}\n")));
    }
}
