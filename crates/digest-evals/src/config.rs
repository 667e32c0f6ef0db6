use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::error::AppError;

/// Default evaluation clock. Every run pins `now` so results are reproducible.
pub const DEFAULT_EVAL_NOW: &str = "2026-01-14T23:59:59Z";

/// Eval harness configuration loaded explicitly from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the `case_*.xml` fixtures.
    pub fixtures_dir: PathBuf,
    /// Directory the markdown report is written to.
    pub artifacts_dir: PathBuf,
    pub now: DateTime<Utc>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Optional:
    /// - `EVAL_FIXTURES_DIR`: fixture directory (defaults to the crate's bundled fixtures)
    /// - `EVAL_ARTIFACTS_DIR`: report directory (defaults to `artifacts`)
    /// - `EVAL_NOW`: RFC 3339 timestamp (defaults to `2026-01-14T23:59:59Z`)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let fixtures_dir = lookup("EVAL_FIXTURES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(crate::cases::bundled_fixtures_dir);

        let artifacts_dir = lookup("EVAL_ARTIFACTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("artifacts"));

        let raw_now = lookup("EVAL_NOW").unwrap_or_else(|| DEFAULT_EVAL_NOW.to_string());
        let now = DateTime::parse_from_rfc3339(&raw_now)
            .map_err(|e| AppError::Config(format!("EVAL_NOW must be RFC 3339, got {raw_now:?}: {e}")))?
            .with_timezone(&Utc);

        Ok(Self {
            fixtures_dir,
            artifacts_dir,
            now,
        })
    }

    /// The report's date stamp, e.g. `2026-01-14`.
    pub fn day(&self) -> String {
        self.now.date_naive().to_string()
    }
}
