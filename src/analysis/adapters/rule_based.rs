//! Marker-driven stand-ins for the summarizer and intent recognizer.
//!
//! Both match literal substrings; they are deterministic and meant for local runs and
//! tests, not as a substitute for a model-backed implementation.

use async_trait::async_trait;

use crate::analysis::{
    error::StageError,
    ports::{IntentRecognizer, Summarizer},
    types::{Intent, Summary},
};

const GENERIC_SUMMARY_PREFIX: &str = "通用摘要: ";
const GENERIC_SUMMARY_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRule {
    pub marker: String,
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RuleBasedSummarizer {
    rules: Vec<SummaryRule>,
}

impl RuleBasedSummarizer {
    pub fn new(rules: Vec<SummaryRule>) -> Self {
        Self { rules }
    }
}

impl Default for RuleBasedSummarizer {
    fn default() -> Self {
        Self::new(vec![SummaryRule {
            marker: "胃部不適".to_string(),
            bullets: vec![
                "主要問題為「胃部不適與睡眠困擾」。".to_string(),
                "約 40% 顧客有明確症狀表達。".to_string(),
            ],
        }])
    }
}

#[async_trait]
impl Summarizer for RuleBasedSummarizer {
    async fn summarize(&self, text: &str) -> Result<Summary, StageError> {
        if let Some(rule) = self.rules.iter().find(|rule| text.contains(&rule.marker)) {
            return Ok(rule.bullets.clone());
        }

        let head: String = text.chars().take(GENERIC_SUMMARY_CHARS).collect();
        Ok(vec![format!("{GENERIC_SUMMARY_PREFIX}{head}...")])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntentRule {
    pub marker: String,
    pub intent: Intent,
}

impl IntentRule {
    fn new(marker: &str, intent: &str, category: Option<&str>) -> Self {
        let mut intent = Intent::new(intent);
        if let Some(category) = category {
            intent = intent.with_product_category(category);
        }
        Self {
            marker: marker.to_string(),
            intent,
        }
    }
}

/// First matching rule wins; `fallback` answers when nothing matches.
#[derive(Debug, Clone)]
pub struct RuleBasedIntentRecognizer {
    rules: Vec<IntentRule>,
    fallback: Option<Intent>,
}

impl RuleBasedIntentRecognizer {
    pub fn new(rules: Vec<IntentRule>, fallback: Option<Intent>) -> Self {
        Self { rules, fallback }
    }
}

impl Default for RuleBasedIntentRecognizer {
    fn default() -> Self {
        Self::new(
            vec![
                IntentRule::new("胃部不適", "健康問題諮詢", Some("腸胃照護產品")),
                IntentRule::new("睡眠品質", "健康問題諮詢", Some("睡眠產品")),
                IntentRule::new("促銷", "促銷活動查詢", None),
            ],
            Some(Intent::new("產品諮詢").with_product_category("保健食品")),
        )
    }
}

#[async_trait]
impl IntentRecognizer for RuleBasedIntentRecognizer {
    async fn recognize(&self, text: &str) -> Result<Option<Intent>, StageError> {
        Ok(self
            .rules
            .iter()
            .find(|rule| text.contains(&rule.marker))
            .map(|rule| rule.intent.clone())
            .or_else(|| self.fallback.clone()))
    }
}
