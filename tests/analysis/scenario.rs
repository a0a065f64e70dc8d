use std::path::PathBuf;

use insight_flow::{
    analysis::{Pipeline, SentimentLabel, StageRegistries},
    config::PipelineConfig,
};

const COMPLAINT: &str = "顧客抱怨胃部不適，希望有促銷方案。";

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

fn default_pipeline() -> Pipeline {
    let registries = StageRegistries::with_defaults().expect("built-in stages register");
    Pipeline::from_config(&PipelineConfig::default(), &registries)
        .expect("default pipeline should build")
}

fn pipeline_with_data_files() -> Pipeline {
    let mut config = PipelineConfig::default();
    config.recommender_data.product_catalog_path = Some(data_dir().join("products.json"));
    config.recommender_data.customer_segments_path = Some(data_dir().join("segments.json"));
    let registries = StageRegistries::with_defaults().expect("built-in stages register");
    Pipeline::from_config(&config, &registries).expect("pipeline with data files should build")
}

#[tokio::test]
async fn negative_complaint_escalates_and_suggests_category_module() {
    let result = default_pipeline()
        .process(COMPLAINT)
        .await
        .expect("process should succeed");

    assert_eq!(result.sentiment.label, SentimentLabel::Negative);
    assert!(result.sentiment.score > 0.8);
    let intent = result.intent.as_ref().expect("intent should be recognized");
    assert_eq!(intent.product_category.as_deref(), Some("腸胃照護產品"));
    assert_eq!(result.keywords.as_slice(), ["胃部不適", "促銷方案"]);
    assert_eq!(
        result.recommendations.as_slice(),
        [
            "根據分析，建議：",
            "觸發自動推薦「腸胃照護」商品模組。",
            "客戶情緒較為負面，建議人工介入。",
        ]
    );
}

#[tokio::test]
async fn segment_data_adds_keyword_suggestions() {
    let result = pipeline_with_data_files()
        .process(COMPLAINT)
        .await
        .expect("process should succeed");

    assert_eq!(
        result.recommendations.as_slice(),
        [
            "根據分析，建議：",
            "觸發自動推薦「腸胃照護」商品模組。",
            "促銷訊息應優先展示在首頁。",
            "客戶情緒較為負面，建議人工介入。",
        ]
    );
}

#[tokio::test]
async fn promotion_suggestion_appears_once_when_triggered_twice() {
    let result = pipeline_with_data_files()
        .process("想了解促銷方案")
        .await
        .expect("process should succeed");

    let promotion_count = result
        .recommendations
        .as_slice()
        .iter()
        .filter(|item| item.as_str() == "促銷訊息應優先展示在首頁。")
        .count();
    assert_eq!(promotion_count, 1);
    assert_eq!(result.recommendations.len(), 2);
}

#[tokio::test]
async fn pipelines_built_from_one_config_agree() {
    let first = default_pipeline();
    let second = default_pipeline();

    for text in [COMPLAINT, "感謝你們的服務", "睡眠品質不好怎麼辦"] {
        let a = first.process(text).await.expect("first pipeline");
        let b = second.process(text).await.expect("second pipeline");
        assert_eq!(a, b, "results diverged for {text}");
    }
}

#[tokio::test]
async fn result_serializes_all_five_fields() {
    let result = default_pipeline()
        .process("感謝")
        .await
        .expect("process should succeed");
    let value = serde_json::to_value(&result).expect("result should serialize");
    let object = value.as_object().expect("result is an object");
    for field in ["summary", "sentiment", "keywords", "intent", "recommendations"] {
        assert!(object.contains_key(field), "missing {field}");
    }
    assert_eq!(value["sentiment"]["label"], "positive");
}
