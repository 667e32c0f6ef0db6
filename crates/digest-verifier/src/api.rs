/// Tool parameter and response shapes for the verifier MCP server.
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use digest_core::explain::Explanation;
use digest_core::scoring::ScoreBreakdown;
use digest_core::summary_cache::CachedSummary;
use digest_core::weights::{AdjustmentParams, WeightChange};
use digest_core::{NewsItem, RankConfig, SummaryResult};
use digest_evals::gate::GateDecision;
use digest_evals::runner::EvalSummary;

// --- Ranking ---

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RankItemsParams {
    pub items: Vec<NewsItem>,
    /// Maximum number of items to return (>= 1)
    pub top_n: usize,
    /// Ranking config; omitted fields take the built-in defaults
    #[serde(default)]
    pub config: Option<RankConfig>,
    /// Reference time for recency. Defaults to the current time.
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
    /// Previously liked items. When present, a TF-IDF similarity to them is blended in
    /// with weight `config.ai_score_alpha`.
    #[serde(default)]
    pub positives: Vec<NewsItem>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct RankedItem {
    pub rank: usize,
    pub item: NewsItem,
    pub breakdown: ScoreBreakdown,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct RankItemsResponse {
    pub ranked: Vec<RankedItem>,
    /// Input items left after URL/title dedupe
    pub unique_items: usize,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExplainItemParams {
    pub item: NewsItem,
    #[serde(default)]
    pub config: Option<RankConfig>,
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ExplainItemResponse {
    /// Exact values used by ranking
    pub breakdown: ScoreBreakdown,
    /// Rounded for display
    pub display: Explanation,
}

// --- Grounding and cache ---

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ValidateGroundingParams {
    pub result: SummaryResult,
    #[serde(default)]
    pub evidence: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ValidateGroundingResponse {
    pub grounded: bool,
    pub result: SummaryResult,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CacheKeyParams {
    /// Defaults to the configured `LLM_MODEL`
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub evidence: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct CacheKeyResponse {
    pub model: String,
    pub cache_key: String,
    pub normalized_evidence: String,
    /// Fresh cached summary for this key, if Redis holds one
    pub cached: Option<CachedSummary>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SummarizeItemParams {
    pub item: NewsItem,
    /// Defaults to the item's own evidence
    #[serde(default)]
    pub evidence: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct SummarizeItemResponse {
    pub result: SummaryResult,
}

// --- Evals ---

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RunEvalsParams {
    /// Evaluation clock. Defaults to `EVAL_NOW`.
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct RunEvalsResponse {
    pub report: String,
    pub summary: EvalSummary,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CheckSummaryOutputParams {
    /// Raw summarizer output, in the summary-or-refusal JSON shape
    pub output: serde_json::Value,
    pub evidence: String,
    pub item_url: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct CheckSummaryOutputResponse {
    pub passed: bool,
    pub failures: Vec<String>,
}

// --- Source weights ---

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SourceFeedback {
    pub source: String,
    pub total: u32,
    pub useful: u32,
    /// Useful-rate over the last 7 days, in [0, 1]
    pub rate_7d: f64,
    /// Useful-rate over all time, in [0, 1]
    pub rate_longterm: f64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ProposeWeightsParams {
    /// Current learned weights (lowercase source → weight)
    #[serde(default)]
    pub current: BTreeMap<String, f64>,
    pub feedback: Vec<SourceFeedback>,
    #[serde(default)]
    pub params: Option<AdjustmentParams>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ProposeWeightsResponse {
    pub proposed: BTreeMap<String, f64>,
    pub changes: Vec<WeightChange>,
    pub baseline_pass_rate: f64,
    pub candidate_pass_rate: f64,
    pub decision: GateDecision,
}
