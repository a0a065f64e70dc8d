pub mod adapters;
pub mod credentials;
pub mod error;
pub mod pipeline;
pub mod ports;
pub mod registry;
pub mod testing;
pub mod types;

pub use error::{PipelineError, StageError, StageErrorKind};
pub use pipeline::{Pipeline, PipelineStages, PipelineTelemetryEvent, PipelineTelemetryHook};
pub use ports::{IntentRecognizer, KeywordExtractor, Recommender, SentimentAnalyzer, Summarizer};
pub use registry::{StageFactory, StageRegistries, StageRegistry};
pub use types::{
    AnalysisResult, Capability, DEFAULT_KEYWORDS_TOP_N, Intent, Keywords, RecommendationInput,
    Recommendations, Sentiment, SentimentLabel, Summary,
};
