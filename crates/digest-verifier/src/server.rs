/// MCP server exposing the digest ranking and verification core.
///
/// Exposes tools:
/// - `rank_items`: dedupe, score and rank items, with per-item breakdowns
/// - `explain_item`: score breakdown for a single item
/// - `validate_grounding`: apply the grounding rules to a summary result
/// - `compute_cache_key`: summary cache key for (model, evidence), plus any cached entry
/// - `summarize_item`: run the summary pipeline (cache-backed)
/// - `run_evals`: the ranking regression battery
/// - `run_summary_evals`: the summary-quality battery
/// - `check_summary_output`: summary-quality checks for one raw output
/// - `propose_source_weights`: learn weights from feedback and gate them on the evals
use std::sync::Arc;

use chrono::Utc;
use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use tracing::info;

use digest_core::cache_key::{compute_summary_cache_key, normalize_evidence};
use digest_core::explain::{Explanation, explain_item};
use digest_core::grounding::validate_grounding;
use digest_core::normalize::normalize_and_dedupe;
use digest_core::scoring::rank_with_breakdowns;
use digest_core::similarity::{SimilarityModel, compute_similarity_scores};
use digest_core::summarize::SummaryPipeline;
use digest_core::summary_cache::SummaryCache;
use digest_core::weights::{FeedbackStats, compute_weight_adjustments, compute_weight_changes};
use digest_evals::cases::load_cases;
use digest_evals::gate::gate_weight_update;
use digest_evals::report::format_report;
use digest_evals::runner::run_all;
use digest_evals::summary::{evaluate_json, load_summary_cases, run_all_cases, summarize_results};
use digest_evals::summary::runner::SummaryEvalSummary;

use crate::api::{
    CacheKeyParams, CacheKeyResponse, CheckSummaryOutputParams, CheckSummaryOutputResponse,
    ExplainItemParams, ExplainItemResponse, ProposeWeightsParams, ProposeWeightsResponse,
    RankItemsParams, RankItemsResponse, RankedItem, RunEvalsParams, RunEvalsResponse,
    SummarizeItemParams, SummarizeItemResponse, ValidateGroundingParams,
    ValidateGroundingResponse,
};
use crate::config::Config;
use crate::error::AppError;
use crate::provider::CacheOnly;

#[derive(Clone)]
pub struct DigestVerifierServer {
    config: Arc<Config>,
    cache: SummaryCache,
    pipeline: Arc<SummaryPipeline<CacheOnly>>,
    tool_router: ToolRouter<DigestVerifierServer>,
}

impl DigestVerifierServer {
    pub fn new(config: Config, cache: SummaryCache) -> Self {
        let pipeline = SummaryPipeline::new(CacheOnly, cache.clone(), config.llm.clone());
        Self {
            config: Arc::new(config),
            cache,
            pipeline: Arc::new(pipeline),
            tool_router: Self::tool_router(),
        }
    }

    fn rank(&self, params: RankItemsParams) -> Result<RankItemsResponse, AppError> {
        let cfg = params.config.unwrap_or_default();
        let now = params.now.unwrap_or_else(Utc::now);
        let items = normalize_and_dedupe(params.items);

        let similarity = if params.positives.is_empty() {
            None
        } else {
            let corpus: Vec<_> = items.iter().chain(&params.positives).cloned().collect();
            let model = SimilarityModel::fit(&corpus);
            Some(compute_similarity_scores(model.as_ref(), &params.positives, &items))
        };

        let ranked = rank_with_breakdowns(&items, now, params.top_n, &cfg, similarity.as_ref())?;
        Ok(RankItemsResponse {
            unique_items: items.len(),
            ranked: ranked
                .into_iter()
                .enumerate()
                .map(|(i, (item, breakdown))| RankedItem {
                    rank: i + 1,
                    item,
                    breakdown,
                })
                .collect(),
        })
    }

    fn propose(&self, params: ProposeWeightsParams) -> Result<ProposeWeightsResponse, AppError> {
        let feedback: Vec<FeedbackStats> = params
            .feedback
            .into_iter()
            .map(|f| FeedbackStats::new(f.source, f.total, f.useful, f.rate_7d, f.rate_longterm))
            .collect();
        let adjustment = params.params.unwrap_or_default();

        let proposed = compute_weight_adjustments(&params.current, &feedback, &adjustment);
        let changes = compute_weight_changes(&params.current, &proposed, &feedback);

        let evals = &self.config.evals;
        let cases = load_cases(&evals.fixtures_dir);
        let (baseline, candidate, decision) = gate_weight_update(&cases, evals.now, &proposed)?;

        Ok(ProposeWeightsResponse {
            proposed,
            changes,
            baseline_pass_rate: baseline.pass_rate(),
            candidate_pass_rate: candidate.pass_rate(),
            decision,
        })
    }
}

#[tool_router]
impl DigestVerifierServer {
    #[tool(description = "Rank news items by topic/keyword relevance, source weight and recency. Items are deduplicated by normalized URL and title first. Returns the top_n items with their score breakdowns.")]
    async fn rank_items(
        &self,
        Parameters(params): Parameters<RankItemsParams>,
    ) -> Result<Json<RankItemsResponse>, String> {
        let response = self.rank(params).map_err(|e| format!("rank_items failed: {e}"))?;
        Ok(Json(response))
    }

    #[tool(description = "Explain one item's score: matched topics and keywords, source weight, age, recency decay, relevance and total.")]
    async fn explain_item(
        &self,
        Parameters(params): Parameters<ExplainItemParams>,
    ) -> Result<Json<ExplainItemResponse>, String> {
        let cfg = params.config.unwrap_or_default();
        let now = params.now.unwrap_or_else(Utc::now);
        let breakdown = explain_item(&params.item, now, &cfg);
        Ok(Json(ExplainItemResponse {
            display: Explanation::from(&breakdown),
            breakdown,
        }))
    }

    #[tool(description = "Check that every citation snippet in a summary is an exact substring of the evidence. Returns the summary unchanged, or a NO_EVIDENCE / GROUNDING_FAIL refusal.")]
    async fn validate_grounding(
        &self,
        Parameters(params): Parameters<ValidateGroundingParams>,
    ) -> Result<Json<ValidateGroundingResponse>, String> {
        let result = validate_grounding(params.result, params.evidence.as_deref());
        Ok(Json(ValidateGroundingResponse {
            grounded: !result.is_refusal(),
            result,
        }))
    }

    #[tool(description = "Derive the summary cache key for (model, evidence) and return the cached summary for it, if one is fresh.")]
    async fn compute_cache_key(
        &self,
        Parameters(params): Parameters<CacheKeyParams>,
    ) -> Result<Json<CacheKeyResponse>, String> {
        let model = params
            .model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.config.llm.model.clone());
        let evidence = params.evidence.as_deref();
        let cache_key = compute_summary_cache_key(&model, evidence);
        let cached = self.cache.get(&cache_key, Utc::now()).await;

        Ok(Json(CacheKeyResponse {
            normalized_evidence: normalize_evidence(evidence),
            model,
            cache_key,
            cached,
        }))
    }

    #[tool(description = "Summarize an item through the grounded summary pipeline. Serves cached summaries; refuses with a stable code (LLM_DISABLED, LLM_API_FAIL, NO_EVIDENCE, GROUNDING_FAIL) otherwise.")]
    async fn summarize_item(
        &self,
        Parameters(params): Parameters<SummarizeItemParams>,
    ) -> Result<Json<SummarizeItemResponse>, String> {
        let evidence = params.evidence.unwrap_or_else(|| params.item.evidence.clone());
        let result = self
            .pipeline
            .summarize(&params.item, &evidence, Utc::now())
            .await;
        Ok(Json(SummarizeItemResponse { result }))
    }

    #[tool(description = "Run the ranking evaluation battery against the bundled fixtures with a fixed clock. Returns pass/fail counts, per-case diffs and the text report.")]
    async fn run_evals(
        &self,
        Parameters(params): Parameters<RunEvalsParams>,
    ) -> Result<Json<RunEvalsResponse>, String> {
        let evals = &self.config.evals;
        let now = params.now.unwrap_or(evals.now);
        info!(%now, "run_evals tool invoked");

        let cases = load_cases(&evals.fixtures_dir);
        let summary = run_all(&cases, now).map_err(|e| format!("run_evals failed: {e}"))?;
        Ok(Json(RunEvalsResponse {
            report: format_report(&summary),
            summary,
        }))
    }

    #[tool(description = "Run the summary-quality evaluation battery (grounding, citation URLs, refusal codes, tag counts, summary length).")]
    async fn run_summary_evals(&self) -> Result<Json<SummaryEvalSummary>, String> {
        let results = run_all_cases(&load_summary_cases());
        Ok(Json(summarize_results(&results)))
    }

    #[tool(description = "Run the summary-quality checks on one raw summarizer output against its evidence and item URL. Returns the failure codes found.")]
    async fn check_summary_output(
        &self,
        Parameters(params): Parameters<CheckSummaryOutputParams>,
    ) -> Result<Json<CheckSummaryOutputResponse>, String> {
        let failures: Vec<String> = evaluate_json(&params.output, &params.evidence, &params.item_url)
            .into_iter()
            .map(str::to_string)
            .collect();
        Ok(Json(CheckSummaryOutputResponse {
            passed: failures.is_empty(),
            failures,
        }))
    }

    #[tool(description = "Propose new per-source weights from feedback rates, then rerun the ranking evals with them. The decision is 'reject' if the eval pass rate drops.")]
    async fn propose_source_weights(
        &self,
        Parameters(params): Parameters<ProposeWeightsParams>,
    ) -> Result<Json<ProposeWeightsResponse>, String> {
        let response = self
            .propose(params)
            .map_err(|e| format!("propose_source_weights failed: {e}"))?;
        info!(
            sources = response.proposed.len(),
            apply = response.decision.is_apply(),
            "source weights proposed"
        );
        Ok(Json(response))
    }
}

#[tool_handler]
impl ServerHandler for DigestVerifierServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "digest-verifier".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "News digest ranking and verification server. Use rank_items/explain_item to see \
why items rank where they do, validate_grounding and check_summary_output to verify summaries \
against their evidence, and run_evals/run_summary_evals for the regression batteries. \
propose_source_weights learns weights from feedback and gates them on the ranking evals."
                    .to_string(),
            ),
        }
    }
}
