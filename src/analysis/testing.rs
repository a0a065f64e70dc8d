use std::{future::Future, pin::Pin, sync::Arc};

use async_trait::async_trait;

use crate::analysis::{
    error::StageError,
    pipeline::{Pipeline, PipelineStages},
    ports::{IntentRecognizer, KeywordExtractor, Recommender, SentimentAnalyzer, Summarizer},
    types::{
        Intent, Keywords, RecommendationInput, Recommendations, Sentiment, SentimentLabel, Summary,
    },
};

pub type StageFuture<T> = Pin<Box<dyn Future<Output = Result<T, StageError>> + Send>>;

pub type SummarizeHook = Arc<dyn Fn(String) -> StageFuture<Summary> + Send + Sync>;
pub type SentimentHook = Arc<dyn Fn(String) -> StageFuture<Sentiment> + Send + Sync>;
pub type KeywordsHook = Arc<dyn Fn(String, usize) -> StageFuture<Keywords> + Send + Sync>;
pub type IntentHook = Arc<dyn Fn(String) -> StageFuture<Option<Intent>> + Send + Sync>;
pub type RecommendHook =
    Arc<dyn Fn(RecommendationInput) -> StageFuture<Recommendations> + Send + Sync>;

pub fn boxed<T>(
    future: impl Future<Output = T> + Send + 'static,
) -> Pin<Box<dyn Future<Output = T> + Send>>
where
    T: Send + 'static,
{
    Box::pin(future)
}

pub fn summarize_hook<F, Fut>(hook: F) -> SummarizeHook
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Summary, StageError>> + Send + 'static,
{
    Arc::new(move |text| boxed(hook(text)))
}

pub fn sentiment_hook<F, Fut>(hook: F) -> SentimentHook
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Sentiment, StageError>> + Send + 'static,
{
    Arc::new(move |text| boxed(hook(text)))
}

pub fn keywords_hook<F, Fut>(hook: F) -> KeywordsHook
where
    F: Fn(String, usize) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Keywords, StageError>> + Send + 'static,
{
    Arc::new(move |text, top_n| boxed(hook(text, top_n)))
}

pub fn intent_hook<F, Fut>(hook: F) -> IntentHook
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<Intent>, StageError>> + Send + 'static,
{
    Arc::new(move |text| boxed(hook(text)))
}

pub fn recommend_hook<F, Fut>(hook: F) -> RecommendHook
where
    F: Fn(RecommendationInput) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Recommendations, StageError>> + Send + 'static,
{
    Arc::new(move |input| boxed(hook(input)))
}

/// Closure-backed stages for exercising the pipeline without real implementations.
#[derive(Clone)]
pub struct StageHooks {
    pub summarize: SummarizeHook,
    pub sentiment: SentimentHook,
    pub keywords: KeywordsHook,
    pub intent: IntentHook,
    pub recommend: RecommendHook,
}

impl StageHooks {
    /// Hooks that return fixed, successful outputs.
    pub fn fixed() -> Self {
        Self {
            summarize: summarize_hook(|_text| async { Ok(vec!["Mock summary.".to_string()]) }),
            sentiment: sentiment_hook(|_text| async {
                Ok(Sentiment::new(SentimentLabel::Neutral, 0.5))
            }),
            keywords: keywords_hook(|_text, _top_n| async { Ok(Keywords::new(["mock_keyword"])) }),
            intent: intent_hook(|_text| async { Ok(Some(Intent::new("general"))) }),
            recommend: recommend_hook(|_input| async {
                Ok(Recommendations::new(["Mock recommendation."]))
            }),
        }
    }

    pub fn with_summarize(mut self, hook: SummarizeHook) -> Self {
        self.summarize = hook;
        self
    }

    pub fn with_sentiment(mut self, hook: SentimentHook) -> Self {
        self.sentiment = hook;
        self
    }

    pub fn with_keywords(mut self, hook: KeywordsHook) -> Self {
        self.keywords = hook;
        self
    }

    pub fn with_intent(mut self, hook: IntentHook) -> Self {
        self.intent = hook;
        self
    }

    pub fn with_recommend(mut self, hook: RecommendHook) -> Self {
        self.recommend = hook;
        self
    }

    pub fn into_stages(self) -> PipelineStages {
        PipelineStages {
            summarizer: Arc::new(HookSummarizer(self.summarize)),
            sentiment_analyzer: Arc::new(HookSentimentAnalyzer(self.sentiment)),
            keyword_extractor: Arc::new(HookKeywordExtractor(self.keywords)),
            intent_recognizer: Arc::new(HookIntentRecognizer(self.intent)),
            recommender: Arc::new(HookRecommender(self.recommend)),
        }
    }
}

pub fn pipeline_with_hooks(hooks: StageHooks, keywords_top_n: usize) -> Pipeline {
    Pipeline::new(hooks.into_stages(), keywords_top_n)
}

pub struct HookSummarizer(pub SummarizeHook);

#[async_trait]
impl Summarizer for HookSummarizer {
    async fn summarize(&self, text: &str) -> Result<Summary, StageError> {
        (self.0)(text.to_string()).await
    }
}

pub struct HookSentimentAnalyzer(pub SentimentHook);

#[async_trait]
impl SentimentAnalyzer for HookSentimentAnalyzer {
    async fn analyze(&self, text: &str) -> Result<Sentiment, StageError> {
        (self.0)(text.to_string()).await
    }
}

pub struct HookKeywordExtractor(pub KeywordsHook);

#[async_trait]
impl KeywordExtractor for HookKeywordExtractor {
    async fn extract(&self, text: &str, top_n: usize) -> Result<Keywords, StageError> {
        (self.0)(text.to_string(), top_n).await
    }
}

pub struct HookIntentRecognizer(pub IntentHook);

#[async_trait]
impl IntentRecognizer for HookIntentRecognizer {
    async fn recognize(&self, text: &str) -> Result<Option<Intent>, StageError> {
        (self.0)(text.to_string()).await
    }
}

pub struct HookRecommender(pub RecommendHook);

#[async_trait]
impl Recommender for HookRecommender {
    async fn recommend(
        &self,
        input: &RecommendationInput,
    ) -> Result<Recommendations, StageError> {
        (self.0)(input.clone()).await
    }
}
