use std::sync::Arc;

use insight_flow::{
    analysis::{
        Capability, Pipeline, PipelineError, StageErrorKind, StageRegistries, Summarizer,
        adapters::RuleBasedSummarizer, error::invalid_input,
    },
    config::PipelineConfig,
};

#[test]
fn default_registries_cover_every_default_key() {
    let registries = StageRegistries::with_defaults().expect("built-in stages register");
    let config = PipelineConfig::default();

    Pipeline::from_config(&config, &registries).expect("defaults should resolve");
    for capability in Capability::ALL {
        assert!(
            !registries.keys(capability).is_empty(),
            "{capability} should have at least one implementation"
        );
    }
}

#[test]
fn unknown_key_is_a_configuration_error_naming_capability_and_key() {
    let registries = StageRegistries::with_defaults().expect("built-in stages register");
    let config = PipelineConfig {
        intent_recognizer: "crystal_ball".to_string(),
        ..PipelineConfig::default()
    };

    let err = Pipeline::from_config(&config, &registries)
        .err()
        .expect("unknown key should fail");
    assert!(err.is_configuration());
    assert_eq!(
        err,
        PipelineError::UnknownImplementation {
            capability: Capability::IntentRecognizer,
            key: "crystal_ball".to_string(),
        }
    );
}

#[test]
fn openai_stage_without_credential_fails_construction() {
    let registries = StageRegistries::with_defaults().expect("built-in stages register");
    let mut config = PipelineConfig {
        summarizer: "openai_summarizer".to_string(),
        ..PipelineConfig::default()
    };
    config.openai.credential = insight_flow::analysis::credentials::CredentialRef::Env {
        var: "INSIGHT_FLOW_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
    };

    let err = Pipeline::from_config(&config, &registries)
        .err()
        .expect("missing credential should fail");
    match err {
        PipelineError::StageConstruction {
            capability,
            key,
            source,
        } => {
            assert_eq!(capability, Capability::Summarizer);
            assert_eq!(key, "openai_summarizer");
            assert_eq!(source.kind, StageErrorKind::InvalidInput);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn custom_implementations_can_be_registered_and_selected() {
    let mut registries = StageRegistries::with_defaults().expect("built-in stages register");
    registries
        .summarizers
        .register("terse_summarizer", |_config| {
            Ok(Arc::new(RuleBasedSummarizer::new(Vec::new())) as Arc<dyn Summarizer>)
        })
        .expect("new key should register");
    registries
        .summarizers
        .register("broken_summarizer", |_config| {
            Err(invalid_input("model weights missing"))
        })
        .expect("new key should register");

    let config = PipelineConfig {
        summarizer: "terse_summarizer".to_string(),
        ..PipelineConfig::default()
    };
    Pipeline::from_config(&config, &registries).expect("custom key should resolve");

    let broken = PipelineConfig {
        summarizer: "broken_summarizer".to_string(),
        ..PipelineConfig::default()
    };
    let err = Pipeline::from_config(&broken, &registries)
        .err()
        .expect("failing factory should abort construction");
    assert!(err.to_string().contains("model weights missing"));
}

#[tokio::test]
async fn legacy_stage_keys_resolve_to_the_deterministic_stages() {
    let registries = StageRegistries::with_defaults().expect("built-in stages register");
    let legacy = PipelineConfig {
        summarizer: "gpt_summarizer".to_string(),
        sentiment_analyzer: "hf_sentiment_analyzer".to_string(),
        keyword_extractor: "keybert_extractor".to_string(),
        intent_recognizer: "openai_function_calling_recognizer".to_string(),
        ..PipelineConfig::default()
    };

    let legacy_pipeline =
        Pipeline::from_config(&legacy, &registries).expect("legacy keys should resolve");
    let default_pipeline = Pipeline::from_config(&PipelineConfig::default(), &registries)
        .expect("default keys should resolve");

    let text = "最近胃部不適，睡眠品質也很差，想問有沒有促銷方案。";
    let from_legacy = legacy_pipeline.process(text).await.expect("legacy run");
    let from_default = default_pipeline.process(text).await.expect("default run");
    assert_eq!(from_legacy, from_default);
}
