pub mod cases;
pub mod checks;
pub mod runner;
pub mod taxonomy;

pub use cases::{SummaryCheckCase, load_summary_cases};
pub use checks::{evaluate_json, evaluate_raw, run_all_checks};
pub use runner::{SummaryCaseResult, SummaryEvalSummary, run_all_cases, run_case, summarize_results};
