pub mod cache_key;
pub mod codes;
pub mod error;
pub mod explain;
pub mod feed;
pub mod grounding;
pub mod model;
pub mod normalize;
pub mod redis;
pub mod scoring;
pub mod similarity;
pub mod summarize;
pub mod summary_cache;
pub mod weights;

pub use error::{CommonError, FeedError, RankError, SummaryError};
pub use model::{Citation, NewsItem, RankConfig, SearchField, Summary, SummaryResult};
