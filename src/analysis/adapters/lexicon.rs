use async_trait::async_trait;

use crate::analysis::{
    error::StageError,
    ports::{KeywordExtractor, SentimentAnalyzer},
    types::{Keywords, Sentiment, SentimentLabel},
};

const NEGATIVE_MARKERS: &[&str] = &["不滿意", "抱怨"];
const POSITIVE_MARKERS: &[&str] = &["感謝", "滿意"];

const NEGATIVE_SCORE: f32 = 0.95;
const POSITIVE_SCORE: f32 = 0.98;
const NEUTRAL_SCORE: f32 = 0.8;

/// Marker-lexicon sentiment. Negative markers are checked first, so "不滿意" never
/// reads as positive through its "滿意" suffix.
#[derive(Debug, Clone)]
pub struct LexiconSentimentAnalyzer {
    model_name: String,
}

impl LexiconSentimentAnalyzer {
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
        }
    }

    fn classify(text: &str) -> (SentimentLabel, f32) {
        if contains_any(text, NEGATIVE_MARKERS) {
            (SentimentLabel::Negative, NEGATIVE_SCORE)
        } else if contains_any(text, POSITIVE_MARKERS) {
            (SentimentLabel::Positive, POSITIVE_SCORE)
        } else {
            (SentimentLabel::Neutral, NEUTRAL_SCORE)
        }
    }
}

#[async_trait]
impl SentimentAnalyzer for LexiconSentimentAnalyzer {
    async fn analyze(&self, text: &str) -> Result<Sentiment, StageError> {
        let (label, score) = Self::classify(text);
        Ok(Sentiment::new(label, score).with_extra("model", self.model_name.clone()))
    }
}

/// Reports vocabulary terms found in the text, in vocabulary order.
#[derive(Debug, Clone)]
pub struct LexiconKeywordExtractor {
    vocabulary: Vec<String>,
}

impl LexiconKeywordExtractor {
    pub fn new<I, S>(vocabulary: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            vocabulary: vocabulary.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for LexiconKeywordExtractor {
    fn default() -> Self {
        Self::new(["保健食品", "胃部不適", "睡眠品質", "促銷方案"])
    }
}

#[async_trait]
impl KeywordExtractor for LexiconKeywordExtractor {
    async fn extract(&self, text: &str, top_n: usize) -> Result<Keywords, StageError> {
        let found = self
            .vocabulary
            .iter()
            .filter(|term| text.contains(term.as_str()))
            .cloned();
        Ok(Keywords::new(found).truncated(top_n))
    }
}

fn contains_any(text: &str, markers: &[&str]) -> bool {
    markers.iter().any(|marker| text.contains(marker))
}
