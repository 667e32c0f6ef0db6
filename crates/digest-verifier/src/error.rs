use digest_core::RankError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Rank(#[from] RankError),

    #[error("config error: {0}")]
    Config(String),
}
