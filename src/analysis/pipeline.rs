use std::{future::Future, sync::Arc};

use crate::{
    analysis::{
        error::{PipelineError, StageError},
        ports::{IntentRecognizer, KeywordExtractor, Recommender, SentimentAnalyzer, Summarizer},
        registry::StageRegistries,
        types::{AnalysisResult, Capability, RecommendationInput},
    },
    config::PipelineConfig,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineTelemetryEvent {
    ProcessStarted { text_chars: usize },
    StageFailed { stage: Capability },
    ProcessCompleted { recommendation_count: usize },
}

pub type PipelineTelemetryHook = Arc<dyn Fn(PipelineTelemetryEvent) + Send + Sync>;

/// One resolved implementation per capability.
#[derive(Clone)]
pub struct PipelineStages {
    pub summarizer: Arc<dyn Summarizer>,
    pub sentiment_analyzer: Arc<dyn SentimentAnalyzer>,
    pub keyword_extractor: Arc<dyn KeywordExtractor>,
    pub intent_recognizer: Arc<dyn IntentRecognizer>,
    pub recommender: Arc<dyn Recommender>,
}

impl PipelineStages {
    /// Resolves every capability through its registry. Any failure aborts the whole build.
    pub fn resolve(
        config: &PipelineConfig,
        registries: &StageRegistries,
    ) -> Result<Self, PipelineError> {
        Ok(Self {
            summarizer: registries.summarizers.resolve(&config.summarizer, config)?,
            sentiment_analyzer: registries
                .sentiment_analyzers
                .resolve(&config.sentiment_analyzer, config)?,
            keyword_extractor: registries
                .keyword_extractors
                .resolve(&config.keyword_extractor, config)?,
            intent_recognizer: registries
                .intent_recognizers
                .resolve(&config.intent_recognizer, config)?,
            recommender: registries
                .recommenders
                .resolve(&config.recommender, config)?,
        })
    }
}

/// Runs feedback text through the five analysis stages.
///
/// Summarize, sentiment, keywords, and intent are independent and run concurrently;
/// the recommender starts only once all four have produced their output. A failing
/// stage fails the whole call: sibling stages still in flight are dropped, the
/// recommender is never invoked, and no partial result is returned.
///
/// A `Pipeline` holds no per-call state. Build it once and share it behind an `Arc`.
pub struct Pipeline {
    stages: PipelineStages,
    keywords_top_n: usize,
    telemetry_hook: Option<PipelineTelemetryHook>,
}

impl Pipeline {
    pub fn new(stages: PipelineStages, keywords_top_n: usize) -> Self {
        Self {
            stages,
            keywords_top_n,
            telemetry_hook: None,
        }
    }

    pub fn from_config(
        config: &PipelineConfig,
        registries: &StageRegistries,
    ) -> Result<Self, PipelineError> {
        let stages = PipelineStages::resolve(config, registries)?;
        tracing::info!(
            target: "pipeline",
            summarizer = %config.summarizer,
            sentiment_analyzer = %config.sentiment_analyzer,
            keyword_extractor = %config.keyword_extractor,
            intent_recognizer = %config.intent_recognizer,
            recommender = %config.recommender,
            keywords_top_n = config.keywords_top_n,
            "pipeline_ready"
        );
        Ok(Self::new(stages, config.keywords_top_n))
    }

    pub fn with_telemetry_hook(mut self, hook: PipelineTelemetryHook) -> Self {
        self.telemetry_hook = Some(hook);
        self
    }

    pub async fn process(&self, text: &str) -> Result<AnalysisResult, PipelineError> {
        self.emit(PipelineTelemetryEvent::ProcessStarted {
            text_chars: text.chars().count(),
        });

        let (summary, sentiment, keywords, intent) = tokio::try_join!(
            self.run_stage(Capability::Summarizer, self.stages.summarizer.summarize(text)),
            self.run_stage(
                Capability::SentimentAnalyzer,
                self.stages.sentiment_analyzer.analyze(text)
            ),
            self.run_stage(
                Capability::KeywordExtractor,
                self.stages
                    .keyword_extractor
                    .extract(text, self.keywords_top_n)
            ),
            self.run_stage(
                Capability::IntentRecognizer,
                self.stages.intent_recognizer.recognize(text)
            )
        )?;

        let input = RecommendationInput {
            summary,
            sentiment,
            keywords: keywords.truncated(self.keywords_top_n),
            intent,
        };
        let recommendations = self
            .run_stage(
                Capability::Recommender,
                self.stages.recommender.recommend(&input),
            )
            .await?;

        self.emit(PipelineTelemetryEvent::ProcessCompleted {
            recommendation_count: recommendations.len(),
        });
        tracing::debug!(
            target: "pipeline",
            summary_items = input.summary.len(),
            sentiment = ?input.sentiment.label,
            keywords = input.keywords.len(),
            intent_detected = input.intent.is_some(),
            recommendations = recommendations.len(),
            "process_completed"
        );

        let RecommendationInput {
            summary,
            sentiment,
            keywords,
            intent,
        } = input;
        Ok(AnalysisResult {
            summary,
            sentiment,
            keywords,
            intent,
            recommendations,
        })
    }

    async fn run_stage<T>(
        &self,
        stage: Capability,
        call: impl Future<Output = Result<T, StageError>>,
    ) -> Result<T, PipelineError> {
        match call.await {
            Ok(output) => Ok(output),
            Err(source) => {
                self.emit(PipelineTelemetryEvent::StageFailed { stage });
                tracing::warn!(
                    target: "pipeline",
                    stage = %stage,
                    kind = ?source.kind,
                    error = %source,
                    "stage_failed"
                );
                Err(PipelineError::stage(stage, source))
            }
        }
    }

    fn emit(&self, event: PipelineTelemetryEvent) {
        if let Some(hook) = &self.telemetry_hook {
            hook(event);
        }
    }
}
