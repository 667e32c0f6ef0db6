/// Summary-quality checks.
///
/// Each check returns `Some(code)` on failure and `None` otherwise. Refusals skip every
/// check except the refusal-code one.
use serde::Deserialize;
use serde_json::Value;

use digest_core::codes::is_valid_refusal;
use digest_core::model::RawSummaryResult;
use digest_core::{SummaryError, SummaryResult};

use super::taxonomy::{
    INVALID_REFUSAL_CODE, MAX_TAGS, MIN_SUMMARY_LENGTH, MIN_TAGS, MISSING_CITATIONS, NO_TAGS,
    SCHEMA_INVALID, SNIPPET_NOT_GROUNDED, SUMMARY_TOO_SHORT, TOO_MANY_TAGS, URL_MISMATCH,
};

/// Promote the wire shape to a typed result. An uncited summary is reported on its own
/// code; every other shape violation is `SCHEMA_INVALID`.
pub fn check_schema_valid(raw: &RawSummaryResult) -> Result<SummaryResult, &'static str> {
    SummaryResult::try_from(raw.clone()).map_err(|e| match e {
        SummaryError::MissingCitations => MISSING_CITATIONS,
        _ => SCHEMA_INVALID,
    })
}

pub fn check_citations_grounded(result: &SummaryResult, evidence: &str) -> Option<&'static str> {
    result
        .citations()
        .iter()
        .any(|c| !evidence.contains(c.evidence_snippet.as_str()))
        .then_some(SNIPPET_NOT_GROUNDED)
}

/// Citations must point at the item's own URL, compared verbatim.
pub fn check_citation_urls(result: &SummaryResult, item_url: &str) -> Option<&'static str> {
    result
        .citations()
        .iter()
        .any(|c| c.source_url != item_url)
        .then_some(URL_MISMATCH)
}

pub fn check_refusal_code_valid(result: &SummaryResult) -> Option<&'static str> {
    match result.refusal_code() {
        Some(code) if !is_valid_refusal(code) => Some(INVALID_REFUSAL_CODE),
        _ => None,
    }
}

pub fn check_tag_count(result: &SummaryResult) -> Option<&'static str> {
    if result.is_refusal() {
        return None;
    }
    let count = result.tags().len();
    if count < MIN_TAGS {
        Some(NO_TAGS)
    } else if count > MAX_TAGS {
        Some(TOO_MANY_TAGS)
    } else {
        None
    }
}

pub fn check_summary_length(result: &SummaryResult) -> Option<&'static str> {
    result
        .summary_text()
        .filter(|text| text.chars().count() < MIN_SUMMARY_LENGTH)
        .map(|_| SUMMARY_TOO_SHORT)
}

/// Every failing code for a typed result, in check order. Empty means clean.
pub fn run_all_checks(result: &SummaryResult, evidence: &str, item_url: &str) -> Vec<&'static str> {
    [
        check_citations_grounded(result, evidence),
        check_citation_urls(result, item_url),
        check_refusal_code_valid(result),
        check_tag_count(result),
        check_summary_length(result),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Schema check first; the content checks only run on a result that has a valid shape.
pub fn evaluate_raw(raw: &RawSummaryResult, evidence: &str, item_url: &str) -> Vec<&'static str> {
    match check_schema_valid(raw) {
        Ok(result) => run_all_checks(&result, evidence, item_url),
        Err(code) => vec![code],
    }
}

/// Evaluate arbitrary JSON, e.g. an LLM response handed in by a caller.
pub fn evaluate_json(value: &Value, evidence: &str, item_url: &str) -> Vec<&'static str> {
    match RawSummaryResult::deserialize(value) {
        Ok(raw) => evaluate_raw(&raw, evidence, item_url),
        Err(_) => vec![SCHEMA_INVALID],
    }
}
