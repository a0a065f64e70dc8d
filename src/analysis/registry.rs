use std::{collections::BTreeMap, fmt, sync::Arc};

use crate::{
    analysis::{
        adapters,
        error::{PipelineError, StageError},
        ports::{IntentRecognizer, KeywordExtractor, Recommender, SentimentAnalyzer, Summarizer},
        types::Capability,
    },
    config::PipelineConfig,
};

/// Builds one stage implementation from the pipeline configuration.
pub type StageFactory<T> =
    Arc<dyn Fn(&PipelineConfig) -> Result<Arc<T>, StageError> + Send + Sync>;

/// Maps configuration keys to the implementations of a single capability.
pub struct StageRegistry<T: ?Sized> {
    capability: Capability,
    factories: BTreeMap<String, StageFactory<T>>,
}

impl<T: ?Sized> StageRegistry<T> {
    pub fn new(capability: Capability) -> Self {
        Self {
            capability,
            factories: BTreeMap::new(),
        }
    }

    pub fn register<F>(&mut self, key: impl Into<String>, factory: F) -> Result<(), PipelineError>
    where
        F: Fn(&PipelineConfig) -> Result<Arc<T>, StageError> + Send + Sync + 'static,
    {
        let key = key.into();
        if self.factories.contains_key(&key) {
            return Err(PipelineError::DuplicateImplementation {
                capability: self.capability,
                key,
            });
        }
        self.factories.insert(key, Arc::new(factory));
        Ok(())
    }

    pub fn keys(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    pub fn resolve(&self, key: &str, config: &PipelineConfig) -> Result<Arc<T>, PipelineError> {
        let factory =
            self.factories
                .get(key)
                .ok_or_else(|| PipelineError::UnknownImplementation {
                    capability: self.capability,
                    key: key.to_string(),
                })?;

        factory(config).map_err(|source| PipelineError::StageConstruction {
            capability: self.capability,
            key: key.to_string(),
            source,
        })
    }
}

impl<T: ?Sized> fmt::Debug for StageRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageRegistry")
            .field("capability", &self.capability)
            .field("keys", &self.keys())
            .finish()
    }
}

/// One registry per capability.
#[derive(Debug)]
pub struct StageRegistries {
    pub summarizers: StageRegistry<dyn Summarizer>,
    pub sentiment_analyzers: StageRegistry<dyn SentimentAnalyzer>,
    pub keyword_extractors: StageRegistry<dyn KeywordExtractor>,
    pub intent_recognizers: StageRegistry<dyn IntentRecognizer>,
    pub recommenders: StageRegistry<dyn Recommender>,
}

impl StageRegistries {
    pub fn empty() -> Self {
        Self {
            summarizers: StageRegistry::new(Capability::Summarizer),
            sentiment_analyzers: StageRegistry::new(Capability::SentimentAnalyzer),
            keyword_extractors: StageRegistry::new(Capability::KeywordExtractor),
            intent_recognizers: StageRegistry::new(Capability::IntentRecognizer),
            recommenders: StageRegistry::new(Capability::Recommender),
        }
    }

    /// Registries populated with every built-in adapter.
    pub fn with_defaults() -> Result<Self, PipelineError> {
        let mut registries = Self::empty();
        adapters::register_builtin_stages(&mut registries)?;
        Ok(registries)
    }

    pub fn keys(&self, capability: Capability) -> Vec<&str> {
        match capability {
            Capability::Summarizer => self.summarizers.keys(),
            Capability::SentimentAnalyzer => self.sentiment_analyzers.keys(),
            Capability::KeywordExtractor => self.keyword_extractors.keys(),
            Capability::IntentRecognizer => self.intent_recognizers.keys(),
            Capability::Recommender => self.recommenders.keys(),
        }
    }
}
