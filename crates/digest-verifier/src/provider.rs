/// Summary provider for a verifier that has no LLM transport of its own.
///
/// Summaries are produced by the ingest side and land in the shared Redis cache. The
/// verifier answers from that cache. On a miss the pipeline refuses with `LLM_DISABLED`, or
/// with `LLM_API_FAIL` when `LLM_ENABLED` is set, since this provider always fails.
use digest_core::summarize::{ProviderError, SummaryProvider};

#[derive(Debug, Clone, Copy, Default)]
pub struct CacheOnly;

impl SummaryProvider for CacheOnly {
    async fn complete(&self, model: &str, _system: &str, _user: &str) -> Result<String, ProviderError> {
        Err(ProviderError::Api(format!(
            "no transport for model {model}; only cached summaries are served"
        )))
    }
}
