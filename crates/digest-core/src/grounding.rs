/// Post-hoc grounding validation for LLM summaries.
///
/// Rules run in order and stop at the first that applies:
/// 1. a refusal passes through unchanged
/// 2. missing or whitespace-only evidence becomes `NO_EVIDENCE`
/// 3. any citation snippet that is not a verbatim substring of the evidence becomes
///    `GROUNDING_FAIL`
/// 4. otherwise the summary is returned unchanged
///
/// Matching is exact and case-sensitive. No normalization is applied to either side.
use tracing::debug;

use crate::codes;
use crate::model::SummaryResult;

pub fn validate_grounding(result: SummaryResult, evidence: Option<&str>) -> SummaryResult {
    if result.is_refusal() {
        return result;
    }

    let evidence = match evidence {
        Some(e) if !e.trim().is_empty() => e,
        _ => {
            debug!("summary has no evidence to ground against");
            return SummaryResult::refusal(codes::NO_EVIDENCE);
        }
    };

    if let Some(citation) = result
        .citations()
        .iter()
        .find(|c| !evidence.contains(c.evidence_snippet.as_str()))
    {
        debug!(
            source_url = %citation.source_url,
            snippet = %citation.evidence_snippet,
            "citation snippet not found in evidence"
        );
        return SummaryResult::refusal(codes::GROUNDING_FAIL);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Citation;

    const EVIDENCE: &str = "Acme Corp reported record revenue of $5 billion. The CEO said growth will continue.";

    fn summary_with(snippets: &[&str]) -> SummaryResult {
        let citations = snippets
            .iter()
            .map(|s| Citation::new("https://example.com/acme", *s))
            .collect();
        SummaryResult::summary("Acme had a record quarter.", vec!["business".to_string()], citations, None)
            .unwrap()
    }

    #[test]
    fn test_grounded_summary_passes_unchanged() {
        let result = summary_with(&["record revenue of $5 billion", "growth will continue"]);
        assert_eq!(validate_grounding(result.clone(), Some(EVIDENCE)), result);
    }

    #[test]
    fn test_refusal_passes_through() {
        let refusal = SummaryResult::refusal(codes::LLM_API_FAIL);
        assert_eq!(validate_grounding(refusal.clone(), None), refusal);
        assert_eq!(validate_grounding(refusal.clone(), Some(EVIDENCE)), refusal);
    }

    #[test]
    fn test_missing_evidence_is_no_evidence() {
        let result = summary_with(&["record revenue"]);
        for evidence in [None, Some(""), Some("   \n\t ")] {
            assert_eq!(
                validate_grounding(result.clone(), evidence).refusal_code(),
                Some(codes::NO_EVIDENCE)
            );
        }
    }

    #[test]
    fn test_missing_evidence_wins_over_bad_snippet() {
        let result = summary_with(&["not in anything"]);
        assert_eq!(
            validate_grounding(result, Some(" ")).refusal_code(),
            Some(codes::NO_EVIDENCE)
        );
    }

    #[test]
    fn test_ungrounded_snippet_fails() {
        let result = summary_with(&["record revenue", "profits tripled"]);
        assert_eq!(
            validate_grounding(result, Some(EVIDENCE)).refusal_code(),
            Some(codes::GROUNDING_FAIL)
        );
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let result = summary_with(&["ACME CORP"]);
        assert_eq!(
            validate_grounding(result, Some(EVIDENCE)).refusal_code(),
            Some(codes::GROUNDING_FAIL)
        );
    }

    #[test]
    fn test_whitespace_is_not_normalized() {
        let result = summary_with(&["record  revenue"]);
        assert_eq!(
            validate_grounding(result, Some(EVIDENCE)).refusal_code(),
            Some(codes::GROUNDING_FAIL)
        );
    }
}
