//! Rule-based recommender backed by optional product-catalog and customer-segment files.

use std::{collections::BTreeMap, fs, path::Path};

use async_trait::async_trait;
use serde::{Deserialize, de::DeserializeOwned};

use crate::analysis::{
    error::{StageError, data_unavailable},
    ports::Recommender,
    types::{RecommendationInput, Recommendations},
};

pub const PREAMBLE: &str = "根據分析，建議：";
pub const PROMOTION_SUGGESTION: &str = "促銷訊息應優先展示在首頁。";
pub const MANUAL_INTERVENTION_SUGGESTION: &str = "客戶情緒較為負面，建議人工介入。";

const PROMOTION_SUMMARY_MARKER: &str = "促銷方案";
const PROMOTION_INTENT: &str = "促銷活動查詢";
const NEGATIVE_ESCALATION_THRESHOLD: f32 = 0.8;

const BUILTIN_CATEGORY_SUGGESTIONS: &[(&str, &str)] = &[
    ("睡眠產品", "寄送「睡眠系列產品」推薦郵件。"),
    ("腸胃照護產品", "觸發自動推薦「腸胃照護」商品模組。"),
];

/// Product category → suggestion. Entries override the built-in suggestions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProductCatalog {
    #[serde(default)]
    pub categories: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SegmentRule {
    pub keyword: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CustomerSegments {
    #[serde(default)]
    pub segments: Vec<SegmentRule>,
}

#[derive(Debug, Clone)]
pub struct RuleBasedRecommender {
    category_suggestions: BTreeMap<String, String>,
    segments: Vec<SegmentRule>,
}

impl Default for RuleBasedRecommender {
    fn default() -> Self {
        Self::new(ProductCatalog::default(), CustomerSegments::default())
    }
}

impl RuleBasedRecommender {
    pub fn new(catalog: ProductCatalog, segments: CustomerSegments) -> Self {
        let mut category_suggestions: BTreeMap<String, String> = BUILTIN_CATEGORY_SUGGESTIONS
            .iter()
            .map(|(category, suggestion)| (category.to_string(), suggestion.to_string()))
            .collect();
        category_suggestions.extend(catalog.categories);

        Self {
            category_suggestions,
            segments: segments.segments,
        }
    }

    /// A missing file is tolerated and contributes no data. A file that exists but
    /// cannot be read or parsed fails construction.
    pub fn from_data_files(
        product_catalog_path: Option<&Path>,
        customer_segments_path: Option<&Path>,
    ) -> Result<Self, StageError> {
        let catalog: ProductCatalog = load_data_file(product_catalog_path, "product_catalog")?;
        let segments: CustomerSegments =
            load_data_file(customer_segments_path, "customer_segments")?;
        tracing::debug!(
            target: "recommender",
            categories = catalog.categories.len(),
            segments = segments.segments.len(),
            "recommender_data_loaded"
        );
        Ok(Self::new(catalog, segments))
    }

    fn suggestions(&self, input: &RecommendationInput) -> Vec<String> {
        let mut suggestions = vec![PREAMBLE.to_string()];

        let category_suggestion = input
            .intent
            .as_ref()
            .and_then(|intent| intent.product_category.as_deref())
            .and_then(|category| self.category_suggestions.get(category));
        if let Some(suggestion) = category_suggestion {
            suggestions.push(suggestion.clone());
        }

        let summary_mentions_promotion = input
            .summary
            .iter()
            .any(|item| item.contains(PROMOTION_SUMMARY_MARKER));
        let promotion_inquiry = input
            .intent
            .as_ref()
            .is_some_and(|intent| intent.intent == PROMOTION_INTENT);
        if summary_mentions_promotion || promotion_inquiry {
            suggestions.push(PROMOTION_SUGGESTION.to_string());
        }

        suggestions.extend(
            self.segments
                .iter()
                .filter(|rule| input.keywords.contains(&rule.keyword))
                .map(|rule| rule.suggestion.clone()),
        );

        if input
            .sentiment
            .is_negative_above(NEGATIVE_ESCALATION_THRESHOLD)
        {
            suggestions.push(MANUAL_INTERVENTION_SUGGESTION.to_string());
        }

        suggestions
    }
}

#[async_trait]
impl Recommender for RuleBasedRecommender {
    async fn recommend(&self, input: &RecommendationInput) -> Result<Recommendations, StageError> {
        Ok(Recommendations::new(self.suggestions(input)))
    }
}

fn load_data_file<T>(path: Option<&Path>, label: &str) -> Result<T, StageError>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path else {
        return Ok(T::default());
    };

    if !path.exists() {
        tracing::warn!(
            target: "recommender",
            data = label,
            path = %path.display(),
            "data_file_missing"
        );
        return Ok(T::default());
    }

    let content = fs::read_to_string(path).map_err(|err| {
        data_unavailable(format!("failed to read {label} {}: {err}", path.display()))
    })?;
    serde_json::from_str(&content).map_err(|err| {
        data_unavailable(format!("failed to parse {label} {}: {err}", path.display()))
    })
}
