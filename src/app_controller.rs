use anyhow::{Context, Result};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::app_config::{Config, TranslationProvider};
use crate::monitor::{MonitorOptions, ProgressMonitor};
use crate::queue::{ProcessorOptions, QueueProcessor, QueueStore};
use crate::translation::{BatchTranslator, DictionaryTranslator, LlmTranslator, TranslationCache};

// @module: Application controller wiring config to the engine

/// Main application controller for queue processing
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Build the translation strategy selected by configuration
    ///
    /// Strategies share one contract and are interchangeable; the
    /// dictionary fallback plugs in exactly where the LLM backends do.
    fn build_translator(&self) -> Result<Arc<dyn BatchTranslator>> {
        let translator: Arc<dyn BatchTranslator> = match self.config.translation.provider {
            TranslationProvider::Dictionary => Arc::new(
                DictionaryTranslator::load(
                    &self.config.translation.dictionary_path,
                    &self.config.source_language,
                )
                .context("Failed to load dictionary translator")?,
            ),
            _ => Arc::new(
                LlmTranslator::new(&self.config.translation)
                    .context("Failed to create LLM translator")?,
            ),
        };
        Ok(translator)
    }

    /// Processor options derived from configuration
    fn processor_options(&self) -> ProcessorOptions {
        ProcessorOptions {
            batch_size: self.config.translation.effective_batch_size(),
            batch_timeout: Duration::from_secs(self.config.translation.timeout_secs),
            context_window: self.config.translation.context_window,
            source_language: self.config.source_language.clone(),
            reprocess_mixed_script: self.config.queue.reprocess_mixed_script,
        }
    }

    /// Run the queue processor over the target languages
    ///
    /// Languages are processed sequentially; each operates on a disjoint
    /// queue partition. The translation cache is loaded wholesale up front
    /// and rewritten wholesale at run end, even when a store failure ends
    /// the run early.
    pub async fn run_process(&self, languages: Option<Vec<String>>, check: bool) -> Result<()> {
        let store = QueueStore::open(&self.config.database_path)?;
        let cache = TranslationCache::load(&self.config.translation.cache_path);
        let translator = self.build_translator()?;

        if check {
            info!("Checking connection to '{}'", translator.name());
            translator.check_connection().await?;
        }

        let languages = languages.unwrap_or_else(|| self.config.target_languages.clone());
        let processor = QueueProcessor::new(
            store,
            cache.clone(),
            translator,
            self.processor_options(),
        );

        let run_result = self.process_all(&processor, &languages).await;

        if let Err(e) = cache.save() {
            warn!("Failed to save translation cache: {}", e);
        }
        let (hits, misses, hit_rate) = cache.stats();
        info!(
            "Cache: {} entries, {} hits / {} misses ({:.0}% hit rate)",
            cache.len(),
            hits,
            misses,
            hit_rate * 100.0
        );

        run_result
    }

    /// Process each language in turn
    ///
    /// Note: one run per language at a time. Concurrent runs on the same
    /// language are not coordinated by the engine and are unsupported.
    async fn process_all(&self, processor: &QueueProcessor, languages: &[String]) -> Result<()> {
        for language in languages {
            if language == &self.config.source_language {
                warn!(
                    "Skipping '{}': tasks are already in the source language",
                    language
                );
                continue;
            }

            let report = processor.process_language(language).await?;
            info!("{}", report);
        }
        Ok(())
    }

    /// Run the progress monitor until interrupted
    pub async fn run_monitor(&self, interval_override: Option<u64>) -> Result<()> {
        let store = QueueStore::open(&self.config.database_path)?;

        let options = MonitorOptions {
            interval: Duration::from_secs(
                interval_override.unwrap_or(self.config.monitor.interval_secs),
            ),
            log_path: PathBuf::from(&self.config.monitor.log_path),
            latest_path: PathBuf::from(&self.config.monitor.latest_path),
            source_language: self.config.source_language.clone(),
        };

        let monitor = ProgressMonitor::new(store, options);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = shutdown_tx.send(true);
            }
        });

        monitor.run(shutdown_rx).await
    }

    /// Fan a completed source-language query out to all target languages
    ///
    /// The source-language row is recorded too, completed immediately: its
    /// text is already in final form, and coverage accounting counts it.
    pub async fn run_enqueue(
        &self,
        subject_id: &str,
        tool: &str,
        query: &str,
        priority: i64,
    ) -> Result<()> {
        let store = QueueStore::open(&self.config.database_path)?;

        let mut languages = vec![self.config.source_language.clone()];
        languages.extend(self.config.target_languages.iter().cloned());

        let inserted = store
            .enqueue_fanout(
                subject_id,
                tool,
                query,
                &languages,
                self.config.queue.max_attempts,
                priority,
            )
            .await?;

        store
            .update_query(&self.config.source_language, query, query)
            .await?;

        info!(
            "Enqueued {} tasks for ({}, {}) across {} languages",
            inserted,
            subject_id,
            tool,
            languages.len()
        );
        Ok(())
    }

    /// Print queue and cache statistics
    pub async fn run_stats(&self) -> Result<()> {
        let store = QueueStore::open(&self.config.database_path)?;

        let db_stats = store.stats()?;
        let counts = store.count_by_status().await?;
        let distribution = store.language_distribution().await?;
        let coverage = store.coverage_counts(&self.config.source_language).await?;

        println!("Database: {}", db_stats);
        println!(
            "Status: {} pending, {} processing, {} complete, {} error ({:.1}% complete)",
            counts.pending,
            counts.processing,
            counts.complete,
            counts.error,
            counts.completion_percentage()
        );
        println!(
            "Coverage: {} (subject, tool) pairs, {} with source translation, {} with target translation",
            coverage.total, coverage.with_source_translation, coverage.with_target_translation
        );
        for (language, count) in &distribution {
            println!("  {}: {} tasks", language, count);
        }

        Ok(())
    }
}
