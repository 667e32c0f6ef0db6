/// Score explanations for debugging why an item ranked where it did.
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::{NewsItem, RankConfig};
use crate::scoring::{KeywordMatch, ScoreBreakdown, compute_score_breakdown};

/// Full-precision breakdown for one item. Values equal exactly what ranking used.
pub fn explain_item(item: &NewsItem, now: DateTime<Utc>, cfg: &RankConfig) -> ScoreBreakdown {
    compute_score_breakdown(item, now, cfg, None)
}

/// Display view of a `ScoreBreakdown`. Age is rounded to 2 decimals and decay to 4; every
/// other field is exact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Explanation {
    pub matched_topics: Vec<String>,
    pub matched_keywords: Vec<KeywordMatch>,
    pub source_weight: f64,
    pub age_hours: f64,
    pub recency_decay: f64,
    pub relevance: f64,
    pub total_score: f64,
}

impl From<&ScoreBreakdown> for Explanation {
    fn from(b: &ScoreBreakdown) -> Self {
        Self {
            matched_topics: b.matched_topics.clone(),
            matched_keywords: b.matched_keywords.clone(),
            source_weight: b.source_weight,
            age_hours: round_to(b.age_hours, 2),
            recency_decay: round_to(b.recency_decay, 4),
            relevance: b.relevance,
            total_score: b.total_score,
        }
    }
}

pub fn explain_for_display(item: &NewsItem, now: DateTime<Utc>, cfg: &RankConfig) -> Explanation {
    Explanation::from(&explain_item(item, now, cfg))
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
