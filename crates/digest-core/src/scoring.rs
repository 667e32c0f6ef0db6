/// Scoring engine and ranker.
///
/// `score = relevance * source_weight * recency_decay (+ ai_score_alpha * similarity)` where
/// relevance counts 1.0 per matched topic plus the boost of every matched keyword. Matching is
/// plain lowercase substring containment: "ai" matches inside "said". Eval fixtures depend on
/// that, so it must not be tightened to word boundaries.
///
/// Recency is hyperbolic, not exponential: `1 / (1 + age / half_life)`, so an item exactly one
/// half-life old scores 0.5 and future-dated items clamp to age 0.
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::RankError;
use crate::model::{NewsItem, RankConfig, SearchField};

/// A keyword that matched, with the boost it contributed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct KeywordMatch {
    pub keyword: String,
    pub boost: f64,
}

/// Every component of one item's score. Recomputed on demand; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoreBreakdown {
    /// Matched topics in config order
    pub matched_topics: Vec<String>,
    pub matched_keywords: Vec<KeywordMatch>,
    pub source_weight: f64,
    /// Clamped to >= 0
    pub age_hours: f64,
    /// In (0, 1]
    pub recency_decay: f64,
    pub relevance: f64,
    /// External similarity used for this item, if any, after clamping to [0, 1]
    pub similarity: Option<f64>,
    pub total_score: f64,
}

/// Lowercased text searched for topics and keywords: title then evidence, space-joined,
/// limited to the configured fields.
pub fn build_search_text(item: &NewsItem, cfg: &RankConfig) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(2);
    if cfg.searches(SearchField::Title) {
        parts.push(&item.title);
    }
    if cfg.searches(SearchField::Evidence) {
        parts.push(&item.evidence);
    }
    parts.join(" ").to_lowercase()
}

pub fn age_hours(published_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let age_seconds = (now - published_at).num_milliseconds() as f64 / 1000.0;
    (age_seconds / 3600.0).max(0.0)
}

pub fn recency_decay(age_hours: f64, half_life_hours: f64) -> f64 {
    1.0 / (1.0 + age_hours / half_life_hours)
}

/// Compute every score component for an item.
///
/// This is the single implementation behind both ranking and explanation, so the two can
/// never drift apart.
pub fn compute_score_breakdown(
    item: &NewsItem,
    now: DateTime<Utc>,
    cfg: &RankConfig,
    similarity: Option<f64>,
) -> ScoreBreakdown {
    let age_hours = age_hours(item.published_at, now);
    let recency_decay = recency_decay(age_hours, cfg.effective_half_life_hours());

    let text = build_search_text(item, cfg);

    let matched_topics: Vec<String> = cfg
        .topics
        .iter()
        .filter(|topic| contains_term(&text, topic))
        .cloned()
        .collect();

    let matched_keywords: Vec<KeywordMatch> = cfg
        .keyword_boosts
        .iter()
        .filter(|(keyword, _)| contains_term(&text, keyword))
        .map(|(keyword, boost)| KeywordMatch {
            keyword: keyword.clone(),
            boost: *boost,
        })
        .collect();

    let source_weight = cfg.source_weight(&item.source);

    let relevance = matched_topics.len() as f64
        + matched_keywords.iter().map(|k| k.boost).sum::<f64>();

    let similarity = similarity.map(|s| if s.is_nan() { 0.0 } else { s.clamp(0.0, 1.0) });

    let mut total_score = relevance * source_weight * recency_decay;
    if let Some(sim) = similarity {
        total_score += cfg.ai_score_alpha * sim;
    }

    ScoreBreakdown {
        matched_topics,
        matched_keywords,
        source_weight,
        age_hours,
        recency_decay,
        relevance,
        similarity,
        total_score,
    }
}

/// Case-folded substring test. Blank terms never match.
fn contains_term(text: &str, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    !term.is_empty() && text.contains(&term)
}

pub fn score_item(item: &NewsItem, now: DateTime<Utc>, cfg: &RankConfig) -> f64 {
    compute_score_breakdown(item, now, cfg, None).total_score
}

/// Rank items by score and return at most `top_n` of them.
///
/// Order: score descending, then `published_at` descending, then input position ascending.
/// The last key makes the output identical across runs for identical input, which the
/// evaluation harness relies on. `similarity_by_url` supplies the optional external signal.
pub fn rank_items(
    items: &[NewsItem],
    now: DateTime<Utc>,
    top_n: usize,
    cfg: &RankConfig,
    similarity_by_url: Option<&HashMap<String, f64>>,
) -> Result<Vec<NewsItem>, RankError> {
    if top_n < 1 {
        return Err(RankError::InvalidTopN(top_n));
    }

    let mut scored: Vec<(f64, usize, &NewsItem)> = items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let similarity = similarity_by_url.and_then(|m| m.get(&item.url).copied());
            let score = compute_score_breakdown(item, now, cfg, similarity).total_score;
            (score, idx, item)
        })
        .collect();

    scored.sort_by(|(score_a, idx_a, a), (score_b, idx_b, b)| {
        score_b
            .total_cmp(score_a)
            .then_with(|| b.published_at.cmp(&a.published_at))
            .then_with(|| idx_a.cmp(idx_b))
    });

    Ok(scored
        .into_iter()
        .take(top_n)
        .map(|(_, _, item)| item.clone())
        .collect())
}

/// Same ordering as `rank_items`, but keeps each item's breakdown for display.
pub fn rank_with_breakdowns(
    items: &[NewsItem],
    now: DateTime<Utc>,
    top_n: usize,
    cfg: &RankConfig,
    similarity_by_url: Option<&HashMap<String, f64>>,
) -> Result<Vec<(NewsItem, ScoreBreakdown)>, RankError> {
    let ranked = rank_items(items, now, top_n, cfg, similarity_by_url)?;
    Ok(ranked
        .into_iter()
        .map(|item| {
            let similarity = similarity_by_url.and_then(|m| m.get(&item.url).copied());
            let breakdown = compute_score_breakdown(&item, now, cfg, similarity);
            (item, breakdown)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 13, 12, 0, 0).unwrap()
    }

    fn item(url: &str, title: &str, evidence: &str, hours_ago: i64) -> NewsItem {
        NewsItem {
            source: "blog".to_string(),
            url: url.to_string(),
            published_at: now() - Duration::hours(hours_ago),
            title: title.to_string(),
            evidence: evidence.to_string(),
        }
    }

    #[test]
    fn test_relevance_beats_recency() {
        let cfg = RankConfig::empty()
            .with_keyword_boosts([("merger", 5.0)])
            .with_search_fields([SearchField::Title]);

        let newer = item("https://a.com/1", "Daily market wrap", "", 1);
        let older_relevant = item("https://a.com/2", "Company announces merger", "", 10);

        assert!(score_item(&older_relevant, now(), &cfg) > score_item(&newer, now(), &cfg));

        let ranked = rank_items(&[newer, older_relevant.clone()], now(), 2, &cfg, None).unwrap();
        assert_eq!(ranked[0], older_relevant);
    }

    #[test]
    fn test_keyword_match_in_evidence_counts() {
        let cfg = RankConfig::empty()
            .with_keyword_boosts([("earnings", 3.0)])
            .with_search_fields([SearchField::Evidence]);

        let a = item("https://a.com/1", "Update", "Company reports earnings beat", 2);
        let b = item("https://a.com/2", "Update", "Nothing important", 2);

        assert!(score_item(&a, now(), &cfg) > score_item(&b, now(), &cfg));
    }

    #[test]
    fn test_source_weight_changes_ordering() {
        let cfg = RankConfig::empty()
            .with_topics(["ai"])
            .with_source_weights([("tier1", 2.0), ("tier3", 1.0)])
            .with_search_fields([SearchField::Title]);

        let mut hi = item("https://a.com/1", "AI update", "", 3);
        hi.source = "tier1".to_string();
        let mut lo = item("https://a.com/2", "AI update", "", 3);
        lo.source = "Tier3".to_string();

        assert!(score_item(&hi, now(), &cfg) > score_item(&lo, now(), &cfg));
    }

    #[test]
    fn test_substring_matching_is_not_word_bounded() {
        let cfg = RankConfig::empty()
            .with_topics(["AI"])
            .with_search_fields([SearchField::Title]);
        let b = compute_score_breakdown(&item("u", "He said hello", "", 0), now(), &cfg, None);
        assert_eq!(b.matched_topics, vec!["AI".to_string()]);
        assert_eq!(b.relevance, 1.0);
    }

    #[test]
    fn test_stable_tie_preserves_input_order() {
        let cfg = RankConfig::empty()
            .with_topics(["x"])
            .with_keyword_boosts([("y", 0.0)])
            .with_source_weights([("s", 1.0)])
            .with_search_fields([SearchField::Title]);

        let a = item("https://a.com/1", "x", "", 1);
        let b = item("https://a.com/2", "x", "", 1);

        let ranked = rank_items(&[a.clone(), b.clone()], now(), 2, &cfg, None).unwrap();
        assert_eq!(ranked[0].url, a.url);
        assert_eq!(ranked[1].url, b.url);

        let reversed = rank_items(&[b.clone(), a.clone()], now(), 2, &cfg, None).unwrap();
        assert_eq!(reversed[0].url, b.url);
    }

    #[test]
    fn test_zero_score_tie_break_uses_input_order() {
        let cfg = RankConfig::empty();
        let a = item("https://a.com/1", "First", "", 5);
        let b = item("https://a.com/2", "Second", "", 5);
        assert_eq!(score_item(&a, now(), &cfg), 0.0);

        let ranked = rank_items(&[a.clone(), b], now(), 2, &cfg, None).unwrap();
        assert_eq!(ranked[0].url, a.url);
    }

    #[test]
    fn test_zero_relevance_falls_back_to_recency() {
        let cfg = RankConfig::empty();
        let older = item("https://a.com/1", "Older", "", 9);
        let newer = item("https://a.com/2", "Newer", "", 1);
        let ranked = rank_items(&[older, newer.clone()], now(), 2, &cfg, None).unwrap();
        assert_eq!(ranked[0], newer);
    }

    #[test]
    fn test_top_n_truncates() {
        let cfg = RankConfig::empty()
            .with_keyword_boosts([("merger", 5.0)])
            .with_search_fields([SearchField::Title]);

        let a = item("https://a.com/1", "merger announced", "", 1);
        let b = item("https://a.com/2", "daily wrap", "", 2);
        let c = item("https://a.com/3", "daily wrap", "", 3);

        let ranked = rank_items(&[b, c, a.clone()], now(), 2, &cfg, None).unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].url, a.url);
    }

    #[test]
    fn test_top_n_zero_is_rejected() {
        let err = rank_items(&[], now(), 0, &RankConfig::default(), None).unwrap_err();
        assert_eq!(err, RankError::InvalidTopN(0));
    }

    #[test]
    fn test_ranking_is_deterministic() {
        let cfg = RankConfig::default();
        let items: Vec<NewsItem> = (0..20)
            .map(|i| item(&format!("https://a.com/{i}"), "AI startup raised funding", "", i % 4))
            .collect();
        let first = rank_items(&items, now(), 10, &cfg, None).unwrap();
        let second = rank_items(&items, now(), 10, &cfg, None).unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0].url, "https://a.com/0");
        assert_eq!(first[1].url, "https://a.com/4");
    }

    #[test]
    fn test_decay_is_half_at_half_life() {
        let cfg = RankConfig::empty().with_half_life_hours(24.0);
        let b = compute_score_breakdown(&item("u", "t", "", 24), now(), &cfg, None);
        assert_eq!(b.recency_decay, 0.5);
        assert_eq!(b.age_hours, 24.0);
    }

    #[test]
    fn test_decay_is_monotonic_in_age() {
        let mut last = f64::INFINITY;
        for hours in [0.0, 0.5, 1.0, 6.0, 24.0, 72.0, 1000.0] {
            let decay = recency_decay(hours, 24.0);
            assert!(decay <= last);
            assert!(decay > 0.0 && decay <= 1.0);
            last = decay;
        }
    }

    #[test]
    fn test_future_items_clamp_to_age_zero() {
        let cfg = RankConfig::empty();
        let future = item("u", "t", "", -2);
        let b = compute_score_breakdown(&future, now(), &cfg, None);
        assert_eq!(b.age_hours, 0.0);
        assert_eq!(b.recency_decay, 1.0);
    }

    #[test]
    fn test_search_text_respects_field_order() {
        let it = item("u", "Title Here", "Body TEXT", 0);
        let both = RankConfig::empty();
        assert_eq!(build_search_text(&it, &both), "title here body text");
        let evidence_only = RankConfig::empty().with_search_fields([SearchField::Evidence]);
        assert_eq!(build_search_text(&it, &evidence_only), "body text");
    }

    #[test]
    fn test_similarity_blends_additively() {
        let cfg = RankConfig::empty().with_ai_score_alpha(0.5);
        let stale = item("https://a.com/liked", "Nothing", "", 100);
        let fresh = item("https://a.com/other", "Nothing", "", 1);

        let mut sims = HashMap::new();
        sims.insert(stale.url.clone(), 1.7);

        let b = compute_score_breakdown(&stale, now(), &cfg, sims.get(&stale.url).copied());
        assert_eq!(b.similarity, Some(1.0));
        assert_eq!(b.total_score, 0.5);

        let ranked = rank_items(&[fresh, stale.clone()], now(), 1, &cfg, Some(&sims)).unwrap();
        assert_eq!(ranked[0], stale);
    }

    #[test]
    fn test_blank_terms_never_match() {
        let cfg = RankConfig::empty()
            .with_topics(["  ", ""])
            .with_keyword_boosts([(" ", 3.0)]);
        let b = compute_score_breakdown(&item("u", "anything", "at all", 0), now(), &cfg, None);
        assert!(b.matched_topics.is_empty());
        assert!(b.matched_keywords.is_empty());
    }
}
