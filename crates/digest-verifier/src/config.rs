use digest_core::summarize::{DEFAULT_CACHE_TTL_SECS, DEFAULT_MODEL, LlmConfig};

use crate::error::AppError;

/// Verifier configuration loaded explicitly from environment variables.
///
/// Everything is optional. Without `REDIS_URL` the summary cache always misses.
#[derive(Debug, Clone)]
pub struct Config {
    /// Redis connection URL (e.g. "redis://127.0.0.1:6379"). `None` disables caching.
    pub redis_url: Option<String>,
    pub llm: LlmConfig,
    /// Fixture directory and pinned clock for the eval tools.
    pub evals: digest_evals::config::Config,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Optional:
    /// - `REDIS_URL`: Redis connection string (omit to disable caching)
    /// - `LLM_MODEL`: model name folded into summary cache keys (default `gpt-4o-mini`)
    /// - `LLM_ENABLED`: `true`/`false` (default `false`)
    /// - `SUMMARY_CACHE_TTL_SECS`: summary cache lifetime (default 7 days)
    /// - `EVAL_FIXTURES_DIR`, `EVAL_NOW`: as for the `digest-evals` binary
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let redis_url = lookup("REDIS_URL").filter(|u| !u.trim().is_empty());

        let model = lookup("LLM_MODEL")
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let enabled = match lookup("LLM_ENABLED").as_deref().map(str::trim) {
            None | Some("") => false,
            Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => true,
            Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => false,
            Some(v) => {
                return Err(AppError::Config(format!(
                    "LLM_ENABLED must be true or false, got {v:?}"
                )));
            }
        };

        let cache_ttl_secs = match lookup("SUMMARY_CACHE_TTL_SECS") {
            None => DEFAULT_CACHE_TTL_SECS,
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                AppError::Config(format!("SUMMARY_CACHE_TTL_SECS must be a whole number of seconds, got {raw:?}: {e}"))
            })?,
        };

        let evals = digest_evals::config::Config::from_lookup(&lookup)
            .map_err(|e| AppError::Config(e.to_string()))?;

        Ok(Self {
            redis_url,
            llm: LlmConfig {
                model,
                enabled,
                cache_ttl_secs,
            },
            evals,
        })
    }
}
