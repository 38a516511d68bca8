/*!
 * Common test utilities for the transq test suite.
 */

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use transq::errors::{ProviderError, TranslationError};
use transq::queue::QueueStore;
use transq::translation::adapter::{BatchTranslator, ExchangeContext, parse_batch_response};

/// Batch translator that replays scripted raw backend responses
///
/// Each call consumes the next scripted entry: a raw response body to be
/// parsed line-for-line, or a scripted transport error. Once the script
/// runs out, every further call errors.
pub struct ScriptedTranslator {
    /// Scripted raw responses, consumed front to back
    script: Mutex<VecDeque<Result<String, String>>>,
}

impl ScriptedTranslator {
    /// Create a translator replaying the given script
    pub fn new(script: Vec<Result<String, String>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
        }
    }

    /// Convenience constructor for a single raw response
    pub fn with_response(response: &str) -> Self {
        Self::new(vec![Ok(response.to_string())])
    }

    /// Number of unconsumed script entries
    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

#[async_trait]
impl BatchTranslator for ScriptedTranslator {
    async fn translate_batch(
        &self,
        texts: &[String],
        _target_language: &str,
        context: &mut ExchangeContext,
    ) -> Result<Vec<Option<String>>, TranslationError> {
        let next = self.script.lock().unwrap().pop_front();

        match next {
            Some(Ok(raw)) => {
                context.push(texts.join("\n"), raw.clone());
                Ok(parse_batch_response(&raw, texts.len()))
            }
            Some(Err(message)) => Err(TranslationError::Provider(
                ProviderError::RequestFailed(message),
            )),
            None => Err(TranslationError::Provider(ProviderError::RequestFailed(
                "Script exhausted".to_string(),
            ))),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Create an in-memory store with one pending task per (subject, query)
pub async fn seeded_store(language: &str, tasks: &[(&str, &str)]) -> QueueStore {
    let store = QueueStore::new_in_memory().expect("Failed to create in-memory store");
    for (subject, query) in tasks {
        store
            .enqueue_fanout(subject, "search", query, &[language.to_string()], 3, 0)
            .await
            .expect("Failed to enqueue task");
    }
    store
}
