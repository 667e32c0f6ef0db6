use std::path::PathBuf;

use digest_core::RankError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Rank(#[from] RankError),

    #[error("config error: {0}")]
    Config(String),

    #[error("failed to write report {}: {source}", path.display())]
    Report {
        path: PathBuf,
        source: std::io::Error,
    },
}
