use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_KEYWORDS_TOP_N: usize = 5;

/// The five pluggable stages of the analysis pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Summarizer,
    SentimentAnalyzer,
    KeywordExtractor,
    IntentRecognizer,
    Recommender,
}

impl Capability {
    pub const ALL: [Capability; 5] = [
        Capability::Summarizer,
        Capability::SentimentAnalyzer,
        Capability::KeywordExtractor,
        Capability::IntentRecognizer,
        Capability::Recommender,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Summarizer => "summarizer",
            Capability::SentimentAnalyzer => "sentiment_analyzer",
            Capability::KeywordExtractor => "keyword_extractor",
            Capability::IntentRecognizer => "intent_recognizer",
            Capability::Recommender => "recommender",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary bullets in presentation order. Duplicates are allowed.
pub type Summary = Vec<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub label: SentimentLabel,
    pub score: f32,
    #[serde(flatten, default)]
    pub extra: BTreeMap<String, Value>,
}

impl Sentiment {
    /// Scores outside `[0, 1]` are clamped; NaN collapses to zero.
    pub fn new(label: SentimentLabel, score: f32) -> Self {
        let score = if score.is_nan() {
            0.0
        } else {
            score.clamp(0.0, 1.0)
        };
        Self {
            label,
            score,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn is_negative_above(&self, threshold: f32) -> bool {
        self.label == SentimentLabel::Negative && self.score > threshold
    }
}

/// Keywords in ranking order, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Keywords(Vec<String>);

impl Keywords {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(dedup_preserving_order(keywords))
    }

    pub fn truncated(mut self, top_n: usize) -> Self {
        self.0.truncate(top_n);
        self
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.0.iter().any(|item| item == keyword)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for Keywords {
    fn from(value: Vec<String>) -> Self {
        Self::new(value)
    }
}

impl From<Keywords> for Vec<String> {
    fn from(value: Keywords) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub intent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_category: Option<String>,
    #[serde(flatten, default)]
    pub extra: BTreeMap<String, Value>,
}

impl Intent {
    pub fn new(intent: impl Into<String>) -> Self {
        Self {
            intent: intent.into(),
            product_category: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_product_category(mut self, category: impl Into<String>) -> Self {
        self.product_category = Some(category.into());
        self
    }
}

/// Recommendations in first-seen order. Repeated entries are dropped on construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Recommendations(Vec<String>);

impl Recommendations {
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(dedup_preserving_order(items))
    }

    pub fn contains(&self, item: &str) -> bool {
        self.0.iter().any(|existing| existing == item)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for Recommendations {
    fn from(value: Vec<String>) -> Self {
        Self::new(value)
    }
}

impl From<Recommendations> for Vec<String> {
    fn from(value: Recommendations) -> Self {
        value.0
    }
}

/// Everything the recommender sees: the outputs of the four upstream stages of one call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationInput {
    pub summary: Summary,
    pub sentiment: Sentiment,
    pub keywords: Keywords,
    pub intent: Option<Intent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: Summary,
    pub sentiment: Sentiment,
    pub keywords: Keywords,
    pub intent: Option<Intent>,
    pub recommendations: Recommendations,
}

fn dedup_preserving_order<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for item in items {
        let item = item.into();
        if seen.insert(item.clone()) {
            out.push(item);
        }
    }
    out
}
