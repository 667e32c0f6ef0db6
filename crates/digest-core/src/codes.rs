/// Stable failure codes.
///
/// These strings are a public contract: the run-failure store, the debug endpoints and the
/// eval reports key off them. Never rename a value.

// --- Fetch / parse ---

pub const FETCH_TIMEOUT: &str = "FETCH_TIMEOUT";
pub const FETCH_TRANSIENT: &str = "FETCH_TRANSIENT";
pub const RATE_LIMITED: &str = "RATE_LIMITED";
pub const FETCH_PERMANENT: &str = "FETCH_PERMANENT";
pub const PARSE_ERROR: &str = "PARSE_ERROR";

// --- LLM adapter ---

pub const LLM_PARSE_FAIL: &str = "LLM_PARSE_FAIL";
pub const LLM_API_FAIL: &str = "LLM_API_FAIL";
pub const LLM_DISABLED: &str = "LLM_DISABLED";

// --- Grounding ---

pub const NO_EVIDENCE: &str = "NO_EVIDENCE";
pub const GROUNDING_FAIL: &str = "GROUNDING_FAIL";

pub const PIPELINE_ERROR: &str = "PIPELINE_ERROR";

// --- Ranking evaluation ---

pub const EVAL_FIXTURE_READ_FAIL: &str = "EVAL_FIXTURE_READ_FAIL";
pub const EVAL_RSS_PARSE_FAIL: &str = "EVAL_RSS_PARSE_FAIL";
pub const EVAL_MISMATCH_KEYWORD: &str = "EVAL_MISMATCH_KEYWORD";
pub const EVAL_MISMATCH_TOPIC: &str = "EVAL_MISMATCH_TOPIC";
pub const EVAL_MISMATCH_RECENCY: &str = "EVAL_MISMATCH_RECENCY";
pub const EVAL_MISMATCH_SOURCE_WEIGHT: &str = "EVAL_MISMATCH_SOURCE_WEIGHT";
pub const EVAL_MISMATCH_TIEBREAK_OR_EXPECTATION: &str = "EVAL_MISMATCH_TIEBREAK_OR_EXPECTATION";

/// Refusal reasons a `SummaryResult` may legitimately carry.
pub const VALID_REFUSAL_CODES: [&str; 6] = [
    LLM_PARSE_FAIL,
    LLM_API_FAIL,
    LLM_DISABLED,
    NO_EVIDENCE,
    GROUNDING_FAIL,
    PIPELINE_ERROR,
];

pub fn is_valid_refusal(code: &str) -> bool {
    VALID_REFUSAL_CODES.contains(&code)
}
