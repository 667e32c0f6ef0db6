/// The fixed summary-quality battery.
///
/// Outputs are held in their wire shape so that malformed results can be expressed too.
use digest_core::Citation;
use digest_core::model::RawSummaryResult;

use super::taxonomy::{
    INVALID_REFUSAL_CODE, NO_TAGS, SNIPPET_NOT_GROUNDED, SUMMARY_TOO_SHORT, TOO_MANY_TAGS,
    URL_MISMATCH,
};

const DEFAULT_URL: &str = "https://example.com/article";

#[derive(Debug, Clone)]
pub struct SummaryCheckCase {
    pub case_id: String,
    pub output: RawSummaryResult,
    pub evidence: String,
    pub item_url: String,
    /// Order is irrelevant; compared as a set
    pub expected_failures: Vec<&'static str>,
}

fn summary(text: &str, tags: &[&str], citations: &[(&str, &str)], confidence: f64) -> RawSummaryResult {
    RawSummaryResult {
        summary: Some(text.to_string()),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        citations: citations
            .iter()
            .map(|(url, snippet)| Citation::new(*url, *snippet))
            .collect(),
        confidence: Some(confidence),
        refusal: None,
    }
}

fn refusal(code: &str) -> RawSummaryResult {
    RawSummaryResult {
        refusal: Some(code.to_string()),
        ..RawSummaryResult::default()
    }
}

pub fn load_summary_cases() -> Vec<SummaryCheckCase> {
    let mut cases = Vec::with_capacity(32);
    let mut add = |case_id: &str,
                   output: RawSummaryResult,
                   evidence: &str,
                   item_url: &str,
                   expected_failures: &[&'static str]| {
        cases.push(SummaryCheckCase {
            case_id: case_id.to_string(),
            output,
            evidence: evidence.to_string(),
            item_url: item_url.to_string(),
            expected_failures: expected_failures.to_vec(),
        });
    };
    let url = DEFAULT_URL;

    // Clean summaries
    add(
        "valid_simple",
        summary(
            "The company reported strong earnings.",
            &["business"],
            &[(url, "reported strong earnings")],
            0.9,
        ),
        "The company reported strong earnings this quarter.",
        url,
        &[],
    );
    add(
        "valid_multiple_citations",
        summary(
            "Revenue grew and profits increased.",
            &["business", "finance"],
            &[
                ("https://example.com/news", "Revenue grew 20%"),
                ("https://example.com/news", "profits increased significantly"),
            ],
            0.85,
        ),
        "Revenue grew 20% year over year. Meanwhile, profits increased significantly.",
        "https://example.com/news",
        &[],
    );
    add(
        "valid_max_tags",
        summary(
            "Tech company launches new product.",
            &["tech", "product", "launch", "innovation", "news"],
            &[("https://tech.com/article", "launches new product")],
            0.8,
        ),
        "Tech company launches new product today.",
        "https://tech.com/article",
        &[],
    );
    add(
        "valid_min_tags",
        summary(
            "Market update.",
            &["finance"],
            &[("https://finance.com/update", "Market update")],
            0.7,
        ),
        "Market update for today.",
        "https://finance.com/update",
        &[],
    );
    add(
        "valid_long_summary",
        summary(
            "The quarterly earnings report showed significant growth across all divisions, \
             with particularly strong performance in the cloud services sector.",
            &["business", "earnings", "cloud"],
            &[("https://example.com/earnings", "significant growth across all divisions")],
            0.9,
        ),
        "The quarterly earnings report showed significant growth across all divisions.",
        "https://example.com/earnings",
        &[],
    );

    // Known refusal codes
    add("valid_refusal_no_evidence", refusal("NO_EVIDENCE"), "", url, &[]);
    add("valid_refusal_parse_fail", refusal("LLM_PARSE_FAIL"), "Some evidence here.", url, &[]);
    add("valid_refusal_grounding_fail", refusal("GROUNDING_FAIL"), "Some evidence.", url, &[]);
    add("valid_refusal_pipeline_error", refusal("PIPELINE_ERROR"), "Evidence text.", url, &[]);

    // Snippets that are not verbatim in the evidence
    add(
        "bad_grounding_snippet_missing",
        summary(
            "Company had record profits.",
            &["business"],
            &[(url, "record profits of one billion dollars")],
            0.9,
        ),
        "The company reported strong earnings this quarter.",
        url,
        &[SNIPPET_NOT_GROUNDED],
    );
    add(
        "bad_grounding_partial_match",
        summary("Profits rose.", &["finance"], &[(url, "Profits rose dramatically")], 0.8),
        "Profits rose this quarter.",
        url,
        &[SNIPPET_NOT_GROUNDED],
    );
    add(
        "bad_grounding_case_mismatch",
        summary("Revenue increased.", &["business"], &[(url, "REVENUE INCREASED")], 0.7),
        "The company said revenue increased.",
        url,
        &[SNIPPET_NOT_GROUNDED],
    );
    add(
        "bad_grounding_one_of_many",
        summary(
            "Good news overall.",
            &["news"],
            &[(url, "Good news"), (url, "fantastic results")],
            0.8,
        ),
        "Good news from the company today.",
        url,
        &[SNIPPET_NOT_GROUNDED],
    );

    // Citation URL differs from the item
    add(
        "url_mismatch_different_domain",
        summary(
            "News reported.",
            &["news"],
            &[("https://other-site.com/article", "News reported")],
            0.8,
        ),
        "News reported today.",
        url,
        &[URL_MISMATCH],
    );
    add(
        "url_mismatch_different_path",
        summary(
            "Update shared.",
            &["update"],
            &[("https://example.com/wrong-path", "Update shared")],
            0.7,
        ),
        "Update shared with users.",
        "https://example.com/correct-path",
        &[URL_MISMATCH],
    );
    add(
        "url_mismatch_one_of_many",
        summary(
            "Two facts.",
            &["facts"],
            &[(url, "First fact"), ("https://wrong.com/article", "Second fact")],
            0.8,
        ),
        "First fact. Second fact.",
        url,
        &[URL_MISMATCH],
    );

    // Refusal codes outside the allowed set
    add("invalid_refusal_unknown", refusal("UNKNOWN_ERROR"), "Some evidence.", url, &[INVALID_REFUSAL_CODE]);
    add("invalid_refusal_typo", refusal("NO_EVIDNECE"), "Evidence here.", url, &[INVALID_REFUSAL_CODE]);
    add(
        "invalid_refusal_random",
        refusal("I cannot summarize this"),
        "Evidence.",
        url,
        &[INVALID_REFUSAL_CODE],
    );

    // Tag bounds
    add(
        "no_tags_empty",
        summary("A summary.", &[], &[(url, "A summary")], 0.8),
        "A summary of the news.",
        url,
        &[NO_TAGS],
    );
    add(
        "too_many_tags_six",
        summary(
            "Lots of topics.",
            &["one", "two", "three", "four", "five", "six"],
            &[(url, "Lots of topics")],
            0.8,
        ),
        "Lots of topics covered here.",
        url,
        &[TOO_MANY_TAGS],
    );
    add(
        "too_many_tags_ten",
        summary(
            "Everything tagged.",
            &["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"],
            &[(url, "Everything tagged")],
            0.5,
        ),
        "Everything tagged in this article.",
        url,
        &[TOO_MANY_TAGS],
    );

    // Several failures at once
    add(
        "multiple_grounding_and_url",
        summary(
            "Double trouble.",
            &["test"],
            &[("https://wrong.com/article", "not in evidence")],
            0.5,
        ),
        "Actual evidence text here.",
        url,
        &[SNIPPET_NOT_GROUNDED, URL_MISMATCH],
    );
    add(
        "multiple_grounding_and_tags",
        summary(
            "Multiple problems detected.",
            &["one", "two", "three", "four", "five", "six"],
            &[(url, "fabricated quote")],
            0.3,
        ),
        "Real evidence here.",
        url,
        &[SNIPPET_NOT_GROUNDED, TOO_MANY_TAGS],
    );
    add(
        "multiple_url_and_notags",
        summary("More issues.", &[], &[("https://wrong.com/path", "More issues")], 0.4),
        "More issues to report.",
        url,
        &[URL_MISMATCH, NO_TAGS],
    );

    // Edges that must still pass
    add(
        "edge_snippet_at_start",
        summary("Breaking news.", &["news"], &[(url, "Breaking")], 0.9),
        "Breaking news from the company.",
        url,
        &[],
    );
    add(
        "edge_snippet_at_end",
        summary("Company news.", &["business"], &[(url, "the company.")], 0.9),
        "News from the company.",
        url,
        &[],
    );
    add(
        "edge_short_snippet",
        summary("Profit was reported.", &["finance"], &[(url, "Profit")], 0.7),
        "Profit was reported.",
        url,
        &[],
    );
    add(
        "edge_unicode",
        summary("International news.", &["international"], &[(url, "日本語テスト")], 0.8),
        "International report: 日本語テスト confirmed.",
        url,
        &[],
    );
    add(
        "edge_whitespace",
        summary("Spaced out.", &["test"], &[(url, "multiple   spaces")], 0.6),
        "Text with multiple   spaces included.",
        url,
        &[],
    );

    // Summary length
    add(
        "valid_summary_length",
        summary(
            "This is a valid summary that is long enough.",
            &["test"],
            &[(url, "valid summary")],
            0.9,
        ),
        "This is a valid summary that is long enough.",
        url,
        &[],
    );
    add(
        "summary_too_short",
        summary("Short", &["test"], &[(url, "Short")], 0.9),
        "Short text here.",
        url,
        &[SUMMARY_TOO_SHORT],
    );

    cases
}
