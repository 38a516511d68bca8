/*!
 * Mock translation strategy for testing.
 *
 * This module provides a mock `BatchTranslator` that simulates different
 * backend behaviors:
 * - `MockTranslator::working()` - Always succeeds with translated lines
 * - `MockTranslator::enumerated()` - Succeeds but numbers its lines
 * - `MockTranslator::truncated(n)` - Returns only the first n lines
 * - `MockTranslator::failing()` - Always fails with an error
 */

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::{ProviderError, TranslationError};
use crate::translation::adapter::{BatchTranslator, ExchangeContext, parse_batch_response};

/// Behavior mode for the mock translator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with one translated line per input
    Working,
    /// Succeeds but prefixes every line with enumeration tokens
    Enumerated,
    /// Returns only the first n lines of the batch
    Truncated {
        /// Number of lines kept
        keep: usize,
    },
    /// Fails intermittently (every Nth request)
    Intermittent {
        /// Request cadence of the failures
        fail_every: usize,
    },
    /// Always fails with an error
    Failing,
    /// Returns an empty response
    Empty,
    /// Simulates a slow backend (for timeout testing)
    Slow {
        /// Response delay in milliseconds
        delay_ms: u64,
    },
}

/// Mock batch translator for testing queue processing behavior
#[derive(Debug)]
pub struct MockTranslator {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter for intermittent failures
    request_count: Arc<AtomicUsize>,
}

impl MockTranslator {
    /// Create a new mock translator with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a working mock translator that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a mock that numbers its output lines
    pub fn enumerated() -> Self {
        Self::new(MockBehavior::Enumerated)
    }

    /// Create a mock that returns only the first `keep` lines
    pub fn truncated(keep: usize) -> Self {
        Self::new(MockBehavior::Truncated { keep })
    }

    /// Create an intermittently failing mock translator
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// Create a failing mock translator that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that returns empty responses
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Create a mock that responds slowly
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Number of batch requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// The canonical mock translation of a single text
    pub fn translation_of(text: &str, target_language: &str) -> String {
        format!("[{}] {}", target_language, text)
    }

    /// Render the raw response the configured behavior produces
    fn render_response(&self, texts: &[String], target_language: &str) -> String {
        match self.behavior {
            MockBehavior::Working | MockBehavior::Slow { .. } | MockBehavior::Intermittent { .. } => {
                texts
                    .iter()
                    .map(|t| Self::translation_of(t, target_language))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            MockBehavior::Enumerated => texts
                .iter()
                .enumerate()
                .map(|(i, t)| format!("{}. {}", i + 1, Self::translation_of(t, target_language)))
                .collect::<Vec<_>>()
                .join("\n"),
            MockBehavior::Truncated { keep } => texts
                .iter()
                .take(keep)
                .map(|t| Self::translation_of(t, target_language))
                .collect::<Vec<_>>()
                .join("\n"),
            MockBehavior::Failing | MockBehavior::Empty => String::new(),
        }
    }
}

impl Clone for MockTranslator {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            request_count: Arc::clone(&self.request_count),
        }
    }
}

#[async_trait]
impl BatchTranslator for MockTranslator {
    async fn translate_batch(
        &self,
        texts: &[String],
        target_language: &str,
        context: &mut ExchangeContext,
    ) -> Result<Vec<Option<String>>, TranslationError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            MockBehavior::Failing => {
                return Err(TranslationError::Provider(ProviderError::ApiError {
                    status_code: 500,
                    message: "Simulated provider failure".to_string(),
                }));
            }
            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    return Err(TranslationError::Provider(ProviderError::ApiError {
                        status_code: 503,
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                    }));
                }
            }
            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
            }
            _ => {}
        }

        let response = self.render_response(texts, target_language);
        context.push(texts.join("\n"), response.clone());

        Ok(parse_batch_response(&response, texts.len()))
    }

    fn name(&self) -> &str {
        "mock"
    }
}
