/// Text and markdown renderings of an `EvalSummary`.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::AppError;
use crate::runner::{EvalResult, EvalSummary};

const UNKNOWN_CODE: &str = "UNKNOWN";

fn titles(list: &[String]) -> String {
    format!("{list:?}")
}

fn explain_json<T: serde::Serialize>(value: &Option<T>) -> String {
    match value {
        Some(v) => serde_json::to_string(v).unwrap_or_else(|e| format!("<unrenderable: {e}>")),
        None => "null".to_string(),
    }
}

fn opt(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("null")
}

/// Console report: a summary line, then `ALL PASS` or one block per failing case.
pub fn format_report(summary: &EvalSummary) -> String {
    let mut lines = vec![format!(
        "EVAL SUMMARY: total={} passed={} failed={}",
        summary.total, summary.passed, summary.failed
    )];
    if summary.failed == 0 {
        lines.push("ALL PASS".to_string());
        return lines.join("\n");
    }

    for r in summary.failures() {
        lines.push(String::new());
        lines.push(format!("FAIL: {}", r.case_id));
        lines.push(format!("EXPECTED: {}", titles(&r.expected_titles)));
        lines.push(format!("ACTUAL:   {}", titles(&r.actual_titles)));
        if let Some(code) = &r.error_code {
            lines.push(format!("ERROR_CODE: {code}"));
        }
        if let Some(mm) = &r.mismatch {
            lines.push(format!("MISMATCH_AT: {}", mm.index));
            lines.push(format!("EXPECTED_TITLE: {}", opt(&mm.expected_title)));
            lines.push(format!("ACTUAL_TITLE:   {}", opt(&mm.actual_title)));
            lines.push(format!("EXPECTED_EXPLAIN: {}", explain_json(&mm.expected_explain)));
            lines.push(format!("ACTUAL_EXPLAIN:   {}", explain_json(&mm.actual_explain)));
        }
    }
    lines.join("\n")
}

/// Failure counts per code, sorted by code.
pub fn failure_breakdown(summary: &EvalSummary) -> BTreeMap<String, usize> {
    let mut breakdown = BTreeMap::new();
    for r in summary.failures() {
        let code = r.error_code.clone().unwrap_or_else(|| UNKNOWN_CODE.to_string());
        *breakdown.entry(code).or_insert(0) += 1;
    }
    breakdown
}

fn failure_block(r: &EvalResult, lines: &mut Vec<String>) {
    lines.push(format!("### {}", r.case_id));
    lines.push(format!("- error_code: {}", opt(&r.error_code)));
    lines.push(format!("- expected: {}", titles(&r.expected_titles)));
    lines.push(format!("- actual: {}", titles(&r.actual_titles)));
    if let Some(mm) = &r.mismatch {
        lines.push(format!("- mismatch_index: {}", mm.index));
        lines.push(format!("- expected_title: {}", opt(&mm.expected_title)));
        lines.push(format!("- actual_title: {}", opt(&mm.actual_title)));
    }
    lines.push(String::new());
}

/// Markdown artifact body for `day` (`YYYY-MM-DD`).
pub fn render_markdown(summary: &EvalSummary, day: &str) -> String {
    let mut lines = vec![
        format!("# Eval Report — {day}"),
        String::new(),
        format!("- total: {}", summary.total),
        format!("- passed: {}", summary.passed),
        format!("- failed: {}", summary.failed),
        format!("- pass_rate: {:.2}%", summary.pass_rate() * 100.0),
        String::new(),
        "## Failure breakdown".to_string(),
    ];

    let breakdown = failure_breakdown(summary);
    if breakdown.is_empty() {
        lines.push("- (none)".to_string());
    }
    for (code, count) in &breakdown {
        lines.push(format!("- {code}: {count}"));
    }
    lines.push(String::new());

    lines.push("## Failures (diffs)".to_string());
    let mut any_failure = false;
    for r in summary.failures() {
        any_failure = true;
        failure_block(r, &mut lines);
    }
    if !any_failure {
        lines.push("- (none)".to_string());
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Write `eval_report_{day}.md` under `artifacts_dir`, creating it if needed.
pub fn write_eval_report(summary: &EvalSummary, day: &str, artifacts_dir: &Path) -> Result<PathBuf, AppError> {
    let path = artifacts_dir.join(format!("eval_report_{day}.md"));
    let io_err = |source| AppError::Report {
        path: path.clone(),
        source,
    };

    std::fs::create_dir_all(artifacts_dir).map_err(io_err)?;
    std::fs::write(&path, render_markdown(summary, day)).map_err(io_err)?;

    info!(path = %path.display(), "wrote eval report");
    Ok(path)
}
