use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::cases::SummaryCheckCase;
use super::checks::evaluate_raw;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SummaryCaseResult {
    pub name: String,
    pub passed: bool,
    pub expected: Vec<String>,
    pub actual: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SummaryEvalSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Percentage, one decimal place
    pub pass_rate: f64,
    /// Failing cases only
    pub failures: Vec<SummaryCaseResult>,
}

pub fn run_case(case: &SummaryCheckCase) -> SummaryCaseResult {
    let actual = evaluate_raw(&case.output, &case.evidence, &case.item_url);

    let expected_set: BTreeSet<&str> = case.expected_failures.iter().copied().collect();
    let actual_set: BTreeSet<&str> = actual.iter().copied().collect();
    let passed = expected_set == actual_set;
    debug!(case_id = %case.case_id, passed, ?actual, "summary case checked");

    SummaryCaseResult {
        name: case.case_id.clone(),
        passed,
        expected: case.expected_failures.iter().map(|c| c.to_string()).collect(),
        actual: actual.iter().map(|c| c.to_string()).collect(),
    }
}

pub fn run_all_cases(cases: &[SummaryCheckCase]) -> Vec<SummaryCaseResult> {
    cases.iter().map(run_case).collect()
}

pub fn summarize_results(results: &[SummaryCaseResult]) -> SummaryEvalSummary {
    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();
    let pass_rate = if total == 0 {
        0.0
    } else {
        (passed as f64 / total as f64 * 1000.0).round() / 10.0
    };

    let summary = SummaryEvalSummary {
        total,
        passed,
        failed: total - passed,
        pass_rate,
        failures: results.iter().filter(|r| !r.passed).cloned().collect(),
    };
    info!(
        total = summary.total,
        passed = summary.passed,
        failed = summary.failed,
        "summary evals complete"
    );
    summary
}
