/// Accept or reject a proposed source-weight update by rerunning the ranking battery.
///
/// Learned weights sit beneath each case's pinned weights, so a case that tests source
/// weighting keeps testing its own numbers while every other source picks up the candidate.
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use digest_core::RankError;

use crate::cases::EvalCase;
use crate::runner::{EvalSummary, run_all};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GateDecision {
    Apply,
    Reject { reason: String },
}

impl GateDecision {
    pub fn is_apply(&self) -> bool {
        matches!(self, Self::Apply)
    }
}

/// Reject when the candidate passes a smaller share of the battery than the baseline.
/// Equal pass rates are accepted.
pub fn check_regression(baseline: &EvalSummary, candidate: &EvalSummary) -> GateDecision {
    let (before, after) = (baseline.pass_rate(), candidate.pass_rate());
    if after < before {
        let reason = format!(
            "eval pass rate dropped from {:.1}% to {:.1}%",
            before * 100.0,
            after * 100.0
        );
        warn!(before, after, "rejecting weight update");
        return GateDecision::Reject { reason };
    }
    info!(before, after, "weight update passes regression gate");
    GateDecision::Apply
}

pub fn run_all_with_weights(
    cases: &[EvalCase],
    now: DateTime<Utc>,
    weights: &BTreeMap<String, f64>,
) -> Result<EvalSummary, RankError> {
    let overlaid: Vec<EvalCase> = cases
        .iter()
        .cloned()
        .map(|mut case| {
            case.cfg = case.cfg.with_default_source_weights(weights);
            case
        })
        .collect();
    run_all(&overlaid, now)
}

/// Run the battery with and without `candidate` and decide.
pub fn gate_weight_update(
    cases: &[EvalCase],
    now: DateTime<Utc>,
    candidate: &BTreeMap<String, f64>,
) -> Result<(EvalSummary, EvalSummary, GateDecision), RankError> {
    let baseline = run_all(cases, now)?;
    let proposed = run_all_with_weights(cases, now, candidate)?;
    let decision = check_regression(&baseline, &proposed);
    Ok((baseline, proposed, decision))
}
