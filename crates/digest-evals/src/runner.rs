/// Runs ranking cases against their fixtures and diagnoses mismatches.
///
/// Data faults (unreadable fixture, unparseable XML) become a failed `EvalResult` carrying a
/// code so the rest of the battery still runs. Only a caller bug such as `top_n == 0` is an
/// error.
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use digest_core::codes;
use digest_core::explain::{Explanation, explain_for_display};
use digest_core::feed::parse_rss;
use digest_core::scoring::rank_items;
use digest_core::{NewsItem, RankError};

use crate::cases::EvalCase;

/// Where and why actual output first diverged from the expectation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Mismatch {
    pub index: usize,
    pub expected_title: Option<String>,
    pub actual_title: Option<String>,
    pub expected_explain: Option<Explanation>,
    pub actual_explain: Option<Explanation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EvalResult {
    pub case_id: String,
    pub expected_titles: Vec<String>,
    pub actual_titles: Vec<String>,
    pub pass: bool,
    pub mismatch: Option<Mismatch>,
    pub error_code: Option<String>,
}

impl EvalResult {
    fn fault(case: &EvalCase, code: &str) -> Self {
        Self {
            case_id: case.case_id.clone(),
            expected_titles: case.expected_titles.clone(),
            actual_titles: Vec::new(),
            pass: false,
            mismatch: None,
            error_code: Some(code.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EvalSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub results: Vec<EvalResult>,
}

impl EvalSummary {
    pub fn from_results(results: Vec<EvalResult>) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.pass).count();
        Self {
            total,
            passed,
            failed: total - passed,
            results,
        }
    }

    /// Fraction in [0, 1]. An empty battery counts as 0.
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.passed as f64 / self.total as f64
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &EvalResult> {
        self.results.iter().filter(|r| !r.pass)
    }
}

pub fn run_eval_case(case: &EvalCase, now: DateTime<Utc>) -> Result<EvalResult, RankError> {
    let xml = match std::fs::read_to_string(&case.fixture_path) {
        Ok(xml) => xml,
        Err(e) => {
            warn!(case_id = %case.case_id, path = %case.fixture_path.display(), error = %e, "fixture unreadable");
            return Ok(EvalResult::fault(case, codes::EVAL_FIXTURE_READ_FAIL));
        }
    };

    let items = match parse_rss(&xml, &case.source, case.use_item_source) {
        Ok(items) => items,
        Err(e) => {
            warn!(case_id = %case.case_id, error = %e, "fixture did not parse");
            return Ok(EvalResult::fault(case, codes::EVAL_RSS_PARSE_FAIL));
        }
    };

    let ranked = rank_items(&items, now, case.top_n, &case.cfg, None)?;
    let actual_titles: Vec<String> = ranked.iter().map(|item| item.title.clone()).collect();

    if actual_titles == case.expected_titles {
        debug!(case_id = %case.case_id, "case passed");
        return Ok(EvalResult {
            case_id: case.case_id.clone(),
            expected_titles: case.expected_titles.clone(),
            actual_titles,
            pass: true,
            mismatch: None,
            error_code: None,
        });
    }

    let index = first_difference(&case.expected_titles, &actual_titles);
    let expected_title = case.expected_titles.get(index).cloned();
    let actual_title = actual_titles.get(index).cloned();

    let explain = |pool: &[NewsItem], title: &Option<String>| {
        title
            .as_ref()
            .and_then(|t| pool.iter().find(|item| &item.title == t))
            .map(|item| explain_for_display(item, now, &case.cfg))
    };

    let mismatch = Mismatch {
        index,
        expected_explain: explain(&items, &expected_title),
        actual_explain: explain(&ranked, &actual_title),
        expected_title,
        actual_title,
    };
    let code = classify_mismatch(mismatch.expected_explain.as_ref(), mismatch.actual_explain.as_ref());

    info!(case_id = %case.case_id, index, error_code = code, "case failed");
    Ok(EvalResult {
        case_id: case.case_id.clone(),
        expected_titles: case.expected_titles.clone(),
        actual_titles,
        pass: false,
        mismatch: Some(mismatch),
        error_code: Some(code.to_string()),
    })
}

/// First index where the lists differ. When one is a prefix of the other, the length of
/// the shorter list.
pub fn first_difference(expected: &[String], actual: &[String]) -> usize {
    expected
        .iter()
        .zip(actual)
        .position(|(e, a)| e != a)
        .unwrap_or_else(|| expected.len().min(actual.len()))
}

/// Name the first explained component that differs, checked in priority order. A missing
/// explanation compares as absent on every field.
pub fn classify_mismatch(expected: Option<&Explanation>, actual: Option<&Explanation>) -> &'static str {
    let keywords = |x: Option<&Explanation>| x.map(|e| e.matched_keywords.clone());
    let topics = |x: Option<&Explanation>| x.map(|e| e.matched_topics.clone());
    let decay = |x: Option<&Explanation>| x.map(|e| e.recency_decay);
    let weight = |x: Option<&Explanation>| x.map(|e| e.source_weight);

    if keywords(expected) != keywords(actual) {
        codes::EVAL_MISMATCH_KEYWORD
    } else if topics(expected) != topics(actual) {
        codes::EVAL_MISMATCH_TOPIC
    } else if decay(expected) != decay(actual) {
        codes::EVAL_MISMATCH_RECENCY
    } else if weight(expected) != weight(actual) {
        codes::EVAL_MISMATCH_SOURCE_WEIGHT
    } else {
        codes::EVAL_MISMATCH_TIEBREAK_OR_EXPECTATION
    }
}

pub fn run_all(cases: &[EvalCase], now: DateTime<Utc>) -> Result<EvalSummary, RankError> {
    let results = cases
        .iter()
        .map(|case| run_eval_case(case, now))
        .collect::<Result<Vec<_>, _>>()?;
    let summary = EvalSummary::from_results(results);
    info!(
        total = summary.total,
        passed = summary.passed,
        failed = summary.failed,
        "ranking evals complete"
    );
    Ok(summary)
}
