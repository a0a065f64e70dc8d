pub mod lexicon;
pub mod openai_chat;
pub mod recommender;
pub mod rule_based;

use std::sync::Arc;

use crate::{
    analysis::{
        error::{PipelineError, StageError},
        ports::{IntentRecognizer, KeywordExtractor, Recommender, SentimentAnalyzer, Summarizer},
        registry::StageRegistries,
    },
    config::PipelineConfig,
};

pub use lexicon::{LexiconKeywordExtractor, LexiconSentimentAnalyzer};
pub use openai_chat::{OpenAiChatClient, OpenAiIntentRecognizer, OpenAiSummarizer};
pub use recommender::RuleBasedRecommender;
pub use rule_based::{RuleBasedIntentRecognizer, RuleBasedSummarizer};

pub const RULE_BASED_SUMMARIZER: &str = "rule_based_summarizer";
pub const OPENAI_SUMMARIZER: &str = "openai_summarizer";
pub const LEXICON_SENTIMENT_ANALYZER: &str = "lexicon_sentiment_analyzer";
pub const LEXICON_KEYWORD_EXTRACTOR: &str = "lexicon_keyword_extractor";
pub const RULE_BASED_INTENT_RECOGNIZER: &str = "rule_based_intent_recognizer";
pub const OPENAI_INTENT_RECOGNIZER: &str = "openai_intent_recognizer";
pub const RULE_BASED_RECOMMENDER: &str = "rule_based_recommender";

// Keys used by earlier deployments' settings. They resolve to the
// deterministic stand-ins those deployments actually ran.
pub const LEGACY_SUMMARIZER: &str = "gpt_summarizer";
pub const LEGACY_SENTIMENT_ANALYZER: &str = "hf_sentiment_analyzer";
pub const LEGACY_KEYWORD_EXTRACTOR: &str = "keybert_extractor";
pub const LEGACY_INTENT_RECOGNIZER: &str = "openai_function_calling_recognizer";

pub(crate) fn register_builtin_stages(
    registries: &mut StageRegistries,
) -> Result<(), PipelineError> {
    let summarizers = &mut registries.summarizers;
    summarizers.register(RULE_BASED_SUMMARIZER, build_rule_based_summarizer)?;
    summarizers.register(LEGACY_SUMMARIZER, build_rule_based_summarizer)?;
    summarizers.register(OPENAI_SUMMARIZER, build_openai_summarizer)?;

    let sentiment_analyzers = &mut registries.sentiment_analyzers;
    sentiment_analyzers.register(LEXICON_SENTIMENT_ANALYZER, build_lexicon_sentiment_analyzer)?;
    sentiment_analyzers.register(LEGACY_SENTIMENT_ANALYZER, build_lexicon_sentiment_analyzer)?;

    let keyword_extractors = &mut registries.keyword_extractors;
    keyword_extractors.register(LEXICON_KEYWORD_EXTRACTOR, build_lexicon_keyword_extractor)?;
    keyword_extractors.register(LEGACY_KEYWORD_EXTRACTOR, build_lexicon_keyword_extractor)?;

    let intent_recognizers = &mut registries.intent_recognizers;
    intent_recognizers.register(RULE_BASED_INTENT_RECOGNIZER, build_rule_based_intent_recognizer)?;
    intent_recognizers.register(LEGACY_INTENT_RECOGNIZER, build_rule_based_intent_recognizer)?;
    intent_recognizers.register(OPENAI_INTENT_RECOGNIZER, build_openai_intent_recognizer)?;

    registries
        .recommenders
        .register(RULE_BASED_RECOMMENDER, build_rule_based_recommender)
}

fn build_rule_based_summarizer(
    _config: &PipelineConfig,
) -> Result<Arc<dyn Summarizer>, StageError> {
    Ok(Arc::new(RuleBasedSummarizer::default()))
}

fn build_openai_summarizer(config: &PipelineConfig) -> Result<Arc<dyn Summarizer>, StageError> {
    let client = OpenAiChatClient::from_config(&config.openai)?;
    Ok(Arc::new(OpenAiSummarizer::new(client)))
}

fn build_lexicon_sentiment_analyzer(
    config: &PipelineConfig,
) -> Result<Arc<dyn SentimentAnalyzer>, StageError> {
    Ok(Arc::new(LexiconSentimentAnalyzer::new(
        config.sentiment.model_name.clone(),
    )))
}

fn build_lexicon_keyword_extractor(
    _config: &PipelineConfig,
) -> Result<Arc<dyn KeywordExtractor>, StageError> {
    Ok(Arc::new(LexiconKeywordExtractor::default()))
}

fn build_rule_based_intent_recognizer(
    _config: &PipelineConfig,
) -> Result<Arc<dyn IntentRecognizer>, StageError> {
    Ok(Arc::new(RuleBasedIntentRecognizer::default()))
}

fn build_openai_intent_recognizer(
    config: &PipelineConfig,
) -> Result<Arc<dyn IntentRecognizer>, StageError> {
    let client = OpenAiChatClient::from_config(&config.openai)?;
    Ok(Arc::new(OpenAiIntentRecognizer::new(client)))
}

fn build_rule_based_recommender(
    config: &PipelineConfig,
) -> Result<Arc<dyn Recommender>, StageError> {
    let data = &config.recommender_data;
    Ok(Arc::new(RuleBasedRecommender::from_data_files(
        data.product_catalog_path.as_deref(),
        data.customer_segments_path.as_deref(),
    )?))
}
