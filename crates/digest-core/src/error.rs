/// Error types shared across the digest crates.
///
/// Ranking and grounding are total over well-formed input, so the only errors here are
/// caller bugs (`RankError`), upstream data faults that the harness converts to result
/// codes (`FeedError`), contract violations caught at construction (`SummaryError`), and
/// cache infrastructure failures (`CommonError`). Binary crates wrap these via `#[from]`.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RankError {
    #[error("top_n must be at least 1, got {0}")]
    InvalidTopN(usize),
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("malformed feed XML: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SummaryError {
    #[error("cannot have both summary and refusal")]
    BothSummaryAndRefusal,

    #[error("must have either summary or refusal")]
    NeitherSummaryNorRefusal,

    #[error("summary requires at least one citation")]
    MissingCitations,
}

#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("redis unavailable, degrading gracefully")]
    RedisUnavailable,

    #[error("cache entry could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}
