/// Summary-quality failure codes and limits.
pub const SCHEMA_INVALID: &str = "SCHEMA_INVALID";
pub const MISSING_CITATIONS: &str = "MISSING_CITATIONS";
pub const SNIPPET_NOT_GROUNDED: &str = "SNIPPET_NOT_GROUNDED";
pub const URL_MISMATCH: &str = "URL_MISMATCH";
pub const INVALID_REFUSAL_CODE: &str = "INVALID_REFUSAL_CODE";
pub const NO_TAGS: &str = "NO_TAGS";
pub const TOO_MANY_TAGS: &str = "TOO_MANY_TAGS";
pub const SUMMARY_TOO_SHORT: &str = "SUMMARY_TOO_SHORT";

pub const MIN_TAGS: usize = 1;
pub const MAX_TAGS: usize = 5;
/// Counted in characters, not bytes
pub const MIN_SUMMARY_LENGTH: usize = 10;
