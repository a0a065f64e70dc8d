use async_trait::async_trait;

use crate::analysis::{
    error::StageError,
    types::{Intent, Keywords, RecommendationInput, Recommendations, Sentiment, Summary},
};

// Implementations may hold internal caches but must treat every call as independent:
// a pipeline shared behind an `Arc` invokes them concurrently.

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<Summary, StageError>;
}

#[async_trait]
pub trait SentimentAnalyzer: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<Sentiment, StageError>;
}

#[async_trait]
pub trait KeywordExtractor: Send + Sync {
    async fn extract(&self, text: &str, top_n: usize) -> Result<Keywords, StageError>;
}

#[async_trait]
pub trait IntentRecognizer: Send + Sync {
    /// `Ok(None)` means no intent was detected.
    async fn recognize(&self, text: &str) -> Result<Option<Intent>, StageError>;
}

/// The fan-in stage. It never sees the raw feedback text.
#[async_trait]
pub trait Recommender: Send + Sync {
    async fn recommend(&self, input: &RecommendationInput)
    -> Result<Recommendations, StageError>;
}
