use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use insight_flow::analysis::{
    Capability, Intent, Keywords, PipelineError, PipelineTelemetryEvent, PipelineTelemetryHook,
    RecommendationInput, Recommendations, Sentiment, SentimentLabel, StageErrorKind,
    error::backend_failure,
    testing::{
        StageHooks, intent_hook, keywords_hook, pipeline_with_hooks, recommend_hook,
        sentiment_hook, summarize_hook,
    },
};

fn failing_hooks(stage: Capability) -> StageHooks {
    let hooks = StageHooks::fixed();
    match stage {
        Capability::Summarizer => hooks.with_summarize(summarize_hook(|_text| async {
            Err(backend_failure("API error from summarizer"))
        })),
        Capability::SentimentAnalyzer => hooks.with_sentiment(sentiment_hook(|_text| async {
            Err(backend_failure("sentiment backend down"))
        })),
        Capability::KeywordExtractor => hooks.with_keywords(keywords_hook(|_text, _top_n| async {
            Err(backend_failure("keyword backend down"))
        })),
        Capability::IntentRecognizer => hooks.with_intent(intent_hook(|_text| async {
            Err(backend_failure("intent backend down"))
        })),
        Capability::Recommender => hooks.with_recommend(recommend_hook(|_input| async {
            Err(backend_failure("recommender down"))
        })),
    }
}

#[tokio::test]
async fn process_returns_all_five_outputs() {
    let pipeline = pipeline_with_hooks(StageHooks::fixed(), 5);

    let result = pipeline
        .process("This is a test feedback.")
        .await
        .expect("process should succeed");

    assert_eq!(result.summary, vec!["Mock summary.".to_string()]);
    assert_eq!(result.sentiment.label, SentimentLabel::Neutral);
    assert_eq!(result.keywords.as_slice(), ["mock_keyword"]);
    assert_eq!(result.intent, Some(Intent::new("general")));
    assert_eq!(result.recommendations.as_slice(), ["Mock recommendation."]);
}

#[tokio::test]
async fn recommender_sees_exactly_the_upstream_outputs() {
    let seen: Arc<Mutex<Option<RecommendationInput>>> = Arc::new(Mutex::new(None));
    let seen_ref = Arc::clone(&seen);

    let hooks = StageHooks::fixed()
        .with_summarize(summarize_hook(|text| async move {
            Ok(vec![format!("about {text}")])
        }))
        .with_sentiment(sentiment_hook(|_text| async {
            Ok(Sentiment::new(SentimentLabel::Negative, 0.91))
        }))
        .with_intent(intent_hook(|_text| async { Ok(None) }))
        .with_recommend(recommend_hook(move |input| {
            *seen_ref.lock().expect("lock") = Some(input);
            async { Ok(Recommendations::new(["ok"])) }
        }));
    let pipeline = pipeline_with_hooks(hooks, 5);

    let result = pipeline.process("refund").await.expect("process should succeed");
    let input = seen
        .lock()
        .expect("lock")
        .clone()
        .expect("recommender should be called");

    assert_eq!(input.summary, result.summary);
    assert_eq!(input.sentiment, result.sentiment);
    assert_eq!(input.keywords, result.keywords);
    assert_eq!(input.intent, None);
    assert_eq!(result.intent, None);
}

#[tokio::test]
async fn keywords_are_capped_at_top_n_even_if_extractor_overshoots() {
    let requested = Arc::new(AtomicUsize::new(0));
    let requested_ref = Arc::clone(&requested);
    let hooks = StageHooks::fixed().with_keywords(keywords_hook(move |_text, top_n| {
        requested_ref.store(top_n, Ordering::SeqCst);
        async { Ok(Keywords::new(["a", "b", "c", "d"])) }
    }));
    let pipeline = pipeline_with_hooks(hooks, 2);

    let result = pipeline.process("text").await.expect("process should succeed");
    assert_eq!(requested.load(Ordering::SeqCst), 2);
    assert_eq!(result.keywords.as_slice(), ["a", "b"]);
}

#[tokio::test]
async fn any_failing_stage_fails_the_call_and_skips_the_recommender() {
    for stage in [
        Capability::Summarizer,
        Capability::SentimentAnalyzer,
        Capability::KeywordExtractor,
        Capability::IntentRecognizer,
    ] {
        let recommend_calls = Arc::new(AtomicUsize::new(0));
        let calls_ref = Arc::clone(&recommend_calls);
        let hooks = failing_hooks(stage).with_recommend(recommend_hook(move |_input| {
            calls_ref.fetch_add(1, Ordering::SeqCst);
            async { Ok(Recommendations::default()) }
        }));
        let pipeline = pipeline_with_hooks(hooks, 5);

        let err = pipeline
            .process("text")
            .await
            .expect_err("stage failure should fail the call");
        match &err {
            PipelineError::StageExecution { stage: failed, source } => {
                assert_eq!(*failed, stage);
                assert_eq!(source.kind, StageErrorKind::Backend);
            }
            other => panic!("unexpected error for {stage}: {other:?}"),
        }
        assert_eq!(
            recommend_calls.load(Ordering::SeqCst),
            0,
            "recommender must not run after {stage} fails"
        );
    }
}

#[tokio::test]
async fn summarizer_failure_message_names_stage_and_cause() {
    let pipeline = pipeline_with_hooks(failing_hooks(Capability::Summarizer), 5);
    let err = pipeline.process("text").await.expect_err("should fail");
    assert_eq!(
        err.to_string(),
        "summarizer stage failed: API error from summarizer"
    );
    assert!(!err.is_configuration());
}

#[tokio::test]
async fn recommender_failure_is_reported_as_recommender_stage() {
    let pipeline = pipeline_with_hooks(failing_hooks(Capability::Recommender), 5);
    let err = pipeline.process("text").await.expect_err("should fail");
    assert_eq!(err.capability(), Capability::Recommender);
}

#[tokio::test]
async fn telemetry_reports_start_failure_and_completion() {
    let events: Arc<Mutex<Vec<PipelineTelemetryEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let hook: PipelineTelemetryHook = Arc::new(move |event: PipelineTelemetryEvent| {
        sink.lock().expect("lock").push(event);
    });

    let ok_pipeline =
        pipeline_with_hooks(StageHooks::fixed(), 5).with_telemetry_hook(hook.clone());
    ok_pipeline.process("héllo").await.expect("process should succeed");

    let failing_pipeline = pipeline_with_hooks(failing_hooks(Capability::IntentRecognizer), 5)
        .with_telemetry_hook(hook);
    let _ = failing_pipeline.process("x").await;

    let events = events.lock().expect("lock").clone();
    assert_eq!(
        events,
        vec![
            PipelineTelemetryEvent::ProcessStarted { text_chars: 5 },
            PipelineTelemetryEvent::ProcessCompleted {
                recommendation_count: 1
            },
            PipelineTelemetryEvent::ProcessStarted { text_chars: 1 },
            PipelineTelemetryEvent::StageFailed {
                stage: Capability::IntentRecognizer
            },
        ]
    );
}

#[tokio::test]
async fn concurrent_calls_do_not_share_state() {
    let hooks =
        StageHooks::fixed().with_summarize(summarize_hook(|text| async move { Ok(vec![text]) }));
    let pipeline = Arc::new(pipeline_with_hooks(hooks, 5));

    let handles: Vec<_> = (0..8)
        .map(|index| {
            let pipeline = Arc::clone(&pipeline);
            tokio::spawn(async move { pipeline.process(&format!("text-{index}")).await })
        })
        .collect();

    for (index, handle) in handles.into_iter().enumerate() {
        let result = handle
            .await
            .expect("task should join")
            .expect("process should succeed");
        assert_eq!(result.summary, vec![format!("text-{index}")]);
    }
}
