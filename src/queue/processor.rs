/*!
 * Queue processor for driving translation tasks to completion.
 *
 * One processor run works a single language partition: it pulls eligible
 * tasks, settles what it can from the cache, sends the rest through the
 * batch translator, and writes results back idempotently. Batches are
 * sequential within a run; a failed or timed-out batch degrades to
 * all-`None` results and the run continues with the next batch.
 */

use anyhow::Result;
use log::{info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::translation::adapter::{BatchTranslator, ExchangeContext};
use crate::translation::cache::TranslationCache;

use super::models::PendingFilter;
use super::store::QueueStore;

/// Options controlling a processor run
#[derive(Debug, Clone)]
pub struct ProcessorOptions {
    /// Number of texts per translation batch
    pub batch_size: usize,

    /// Time budget for one batch call; an overrun counts as a failed batch
    pub batch_timeout: Duration,

    /// Number of prior exchanges carried between batches
    pub context_window: usize,

    /// Source language of queued texts
    pub source_language: String,

    /// Re-select completed rows that still carry source-script characters
    pub reprocess_mixed_script: bool,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            batch_size: 8,
            batch_timeout: Duration::from_secs(120),
            context_window: 3,
            source_language: "zh".to_string(),
            reprocess_mixed_script: true,
        }
    }
}

/// Outcome of one per-language processor run
#[derive(Debug, Clone, Default)]
pub struct LanguageRunReport {
    /// Language this run worked on
    pub language: String,
    /// Tasks selected at the start of the run
    pub tasks_selected: usize,
    /// Distinct texts among the selected tasks
    pub unique_texts: usize,
    /// Texts settled from the cache
    pub cache_hits: usize,
    /// Texts translated by the backend
    pub translated: usize,
    /// Texts that produced no translation this run
    pub failed: usize,
    /// Batches sent to the backend
    pub batches: usize,
    /// Queue rows updated by write-backs
    pub rows_updated: usize,
}

impl std::fmt::Display for LanguageRunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} tasks ({} unique texts): {} cached, {} translated, {} failed over {} batches, {} rows updated",
            self.language,
            self.tasks_selected,
            self.unique_texts,
            self.cache_hits,
            self.translated,
            self.failed,
            self.batches,
            self.rows_updated
        )
    }
}

/// Processor driving queue tasks through the translation state machine
pub struct QueueProcessor {
    /// Durable task store
    store: QueueStore,

    /// Durable translation cache
    cache: TranslationCache,

    /// Translation strategy
    translator: Arc<dyn BatchTranslator>,

    /// Run options
    options: ProcessorOptions,
}

impl QueueProcessor {
    /// Create a new processor
    ///
    /// The store, cache and translator are constructed by the caller and
    /// live for the whole run; the processor owns no hidden globals.
    pub fn new(
        store: QueueStore,
        cache: TranslationCache,
        translator: Arc<dyn BatchTranslator>,
        options: ProcessorOptions,
    ) -> Self {
        Self {
            store,
            cache,
            translator,
            options,
        }
    }

    /// The translation cache used by this processor
    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    /// Process all eligible tasks for one language
    ///
    /// Store-level failures propagate and end the run; per-batch backend
    /// failures are absorbed via the attempts counter. Cancelling mid-run
    /// leaves in-flight tasks in `processing`, to be re-selected by the
    /// next run.
    pub async fn process_language(&self, language: &str) -> Result<LanguageRunReport> {
        let mut report = LanguageRunReport {
            language: language.to_string(),
            ..Default::default()
        };

        let filter = if self.options.reprocess_mixed_script {
            PendingFilter::with_mixed_script(&self.options.source_language)
        } else {
            PendingFilter::default()
        };

        let tasks = self.store.fetch_pending(language, filter).await?;
        if tasks.is_empty() {
            info!("[{}] queue drained, nothing to do", language);
            return Ok(report);
        }
        report.tasks_selected = tasks.len();

        // Claim every selected row before translating; `processing` is a
        // breadcrumb for observers, not a lock
        self.store
            .mark_processing(tasks.iter().map(|t| t.id).collect())
            .await?;

        // Distinct texts, first-seen order
        let mut seen = HashSet::new();
        let texts: Vec<String> = tasks
            .iter()
            .filter(|t| seen.insert(t.query.clone()))
            .map(|t| t.query.clone())
            .collect();
        report.unique_texts = texts.len();

        // Settle cache hits first, collect the misses for the backend
        let mut misses = Vec::new();
        for text in &texts {
            match self.cache.lookup(language, text) {
                Some(translation) => {
                    report.rows_updated +=
                        self.store.update_query(language, text, &translation).await?;
                    report.cache_hits += 1;
                }
                None => misses.push(text.clone()),
            }
        }

        info!(
            "[{}] {} texts to translate ({} cache hits)",
            language,
            misses.len(),
            report.cache_hits
        );

        let mut context = ExchangeContext::new(self.options.context_window);
        let total_batches = misses.len().div_ceil(self.options.batch_size.max(1));

        for (batch_index, batch) in misses.chunks(self.options.batch_size.max(1)).enumerate() {
            let results = self.translate_one_batch(batch, language, &mut context).await;

            for (text, result) in batch.iter().zip(results) {
                match result {
                    Some(translation) => {
                        report.rows_updated +=
                            self.store.update_query(language, text, &translation).await?;
                        self.cache.store(language, text, &translation);
                        report.translated += 1;
                    }
                    None => {
                        self.store.record_failure(language, text).await?;
                        report.failed += 1;
                    }
                }
            }

            report.batches += 1;
            info!(
                "[{}] batch {}/{} done ({} translated, {} failed so far)",
                language,
                batch_index + 1,
                total_batches,
                report.translated,
                report.failed
            );
        }

        Ok(report)
    }

    /// Run one batch through the translator under the batch timeout
    ///
    /// A transport error or timeout degrades to all-`None` results so the
    /// affected tasks go through the normal retry accounting.
    async fn translate_one_batch(
        &self,
        batch: &[String],
        language: &str,
        context: &mut ExchangeContext,
    ) -> Vec<Option<String>> {
        let call = self.translator.translate_batch(batch, language, context);

        match tokio::time::timeout(self.options.batch_timeout, call).await {
            Ok(Ok(results)) => results,
            Ok(Err(e)) => {
                warn!("[{}] batch of {} failed: {}", language, batch.len(), e);
                vec![None; batch.len()]
            }
            Err(_) => {
                warn!(
                    "[{}] batch of {} timed out after {:?}",
                    language,
                    batch.len(),
                    self.options.batch_timeout
                );
                vec![None; batch.len()]
            }
        }
    }
}
