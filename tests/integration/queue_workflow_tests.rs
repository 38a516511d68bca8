/*!
 * End-to-end queue processing tests.
 *
 * These tests drive the processor against an in-memory store with
 * scripted backend responses, covering the full state machine: batching,
 * enumeration stripping, partial responses, retries, terminal errors and
 * cache reuse across runs.
 */

use std::sync::Arc;
use std::time::Duration;

use crate::common::{ScriptedTranslator, seeded_store};
use transq::queue::{PendingFilter, ProcessorOptions, QueueProcessor, QueueStore, TaskStatus};
use transq::translation::TranslationCache;

fn options() -> ProcessorOptions {
    ProcessorOptions {
        batch_size: 2,
        batch_timeout: Duration::from_secs(5),
        context_window: 2,
        source_language: "zh".to_string(),
        reprocess_mixed_script: true,
    }
}

fn processor_with(
    store: &QueueStore,
    cache: TranslationCache,
    translator: ScriptedTranslator,
) -> QueueProcessor {
    QueueProcessor::new(store.clone(), cache, Arc::new(translator), options())
}

#[tokio::test]
async fn test_workflow_withEnumeratedResponse_shouldStoreCleanTranslations() {
    let store = seeded_store("en", &[("bio-001", "什么是细胞"), ("bio-002", "什么是线粒体")]).await;
    let translator =
        ScriptedTranslator::with_response("1. what is a cell\n2. what is a mitochondrion");
    let processor = processor_with(&store, TranslationCache::in_memory(), translator);

    let report = processor.process_language("en").await.unwrap();
    assert_eq!(report.translated, 2);

    // Enumeration tokens are stripped before write-back
    let all = PendingFilter {
        statuses: vec![TaskStatus::Complete],
        ..Default::default()
    };
    let tasks = store.fetch_pending("en", all).await.unwrap();
    let texts: Vec<&str> = tasks.iter().map(|t| t.query.as_str()).collect();
    assert!(texts.contains(&"what is a cell"));
    assert!(texts.contains(&"what is a mitochondrion"));
}

#[tokio::test]
async fn test_workflow_withPartialResponse_shouldCompleteOnNextRun() {
    let store = seeded_store(
        "en",
        &[("bio-001", "第一个问题"), ("bio-002", "第二个问题")],
    )
    .await;

    // First run answers only one of two lines; the second run finishes
    let translator = ScriptedTranslator::new(vec![
        Ok("first question".to_string()),
        Ok("second question".to_string()),
    ]);
    let processor = processor_with(&store, TranslationCache::in_memory(), translator);

    let first = processor.process_language("en").await.unwrap();
    assert_eq!(first.translated, 1);
    assert_eq!(first.failed, 1);

    let counts = store.count_by_status().await.unwrap();
    assert_eq!(counts.complete, 1);
    assert_eq!(counts.pending, 1);

    let second = processor.process_language("en").await.unwrap();
    assert_eq!(second.translated, 1);

    let counts = store.count_by_status().await.unwrap();
    assert_eq!(counts.complete, 2);
    assert_eq!(counts.pending, 0);
}

#[tokio::test]
async fn test_workflow_oneBadBatch_shouldNotAbortTheRun() {
    // Four texts at batch size two: the first batch errors, the second succeeds
    let store = seeded_store(
        "en",
        &[
            ("bio-001", "问题一"),
            ("bio-002", "问题二"),
            ("bio-003", "问题三"),
            ("bio-004", "问题四"),
        ],
    )
    .await;

    let translator = ScriptedTranslator::new(vec![
        Err("connection reset".to_string()),
        Ok("question three\nquestion four".to_string()),
    ]);
    let processor = processor_with(&store, TranslationCache::in_memory(), translator);

    let report = processor.process_language("en").await.unwrap();

    assert_eq!(report.batches, 2);
    assert_eq!(report.translated, 2);
    assert_eq!(report.failed, 2);

    let counts = store.count_by_status().await.unwrap();
    assert_eq!(counts.complete, 2);
    assert_eq!(counts.pending, 2);
}

#[tokio::test]
async fn test_workflow_exhaustedRetries_shouldReachTerminalError() {
    let store = seeded_store("en", &[("bio-001", "什么是细胞")]).await;

    // Script errors forever; max_attempts is 3
    let translator = ScriptedTranslator::new(vec![
        Err("boom".to_string()),
        Err("boom".to_string()),
        Err("boom".to_string()),
        Err("boom".to_string()),
    ]);
    let processor = processor_with(&store, TranslationCache::in_memory(), translator);

    for _ in 0..3 {
        processor.process_language("en").await.unwrap();
    }

    let counts = store.count_by_status().await.unwrap();
    assert_eq!(counts.error, 1);

    // error is terminal: a fourth run selects nothing and writes nothing
    let report = processor.process_language("en").await.unwrap();
    assert_eq!(report.tasks_selected, 0);
    assert_eq!(report.rows_updated, 0);
}

#[tokio::test]
async fn test_workflow_cacheFile_shouldCarryTranslationsAcrossRuns() {
    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("translation_cache.json");

    // First run translates and persists its cache
    {
        let store = seeded_store("en", &[("bio-001", "什么是细胞")]).await;
        let cache = TranslationCache::load(&cache_path);
        let translator = ScriptedTranslator::with_response("what is a cell");
        let processor = processor_with(&store, cache.clone(), translator);

        processor.process_language("en").await.unwrap();
        cache.save().unwrap();
    }

    // A fresh store with the same text settles entirely from the cache
    let store = seeded_store("en", &[("chem-001", "什么是细胞")]).await;
    let cache = TranslationCache::load(&cache_path);
    let translator = ScriptedTranslator::new(vec![]);
    let processor = processor_with(&store, cache, translator);

    let report = processor.process_language("en").await.unwrap();
    assert_eq!(report.cache_hits, 1);
    assert_eq!(report.failed, 0);

    let counts = store.count_by_status().await.unwrap();
    assert_eq!(counts.complete, 1);
}

#[tokio::test]
async fn test_workflow_mixedScriptCompletion_shouldBeReprocessed() {
    let store = seeded_store("en", &[("bio-001", "什么是线粒体")]).await;

    // First response leaves source-script residue; the sweep re-selects it
    let translator = ScriptedTranslator::new(vec![
        Ok("what is 线粒体".to_string()),
        Ok("what is a mitochondrion".to_string()),
    ]);
    let processor = processor_with(&store, TranslationCache::in_memory(), translator);

    processor.process_language("en").await.unwrap();
    let report = processor.process_language("en").await.unwrap();
    assert_eq!(report.tasks_selected, 1);
    assert_eq!(report.translated, 1);

    let complete = PendingFilter {
        statuses: vec![TaskStatus::Complete],
        ..Default::default()
    };
    let tasks = store.fetch_pending("en", complete).await.unwrap();
    assert_eq!(tasks[0].query, "what is a mitochondrion");
}
