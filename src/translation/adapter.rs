/*!
 * Batch translator adapter contract and response parsing.
 *
 * This module defines the interface every translation strategy implements,
 * the explicit conversational context threaded between batches, and the
 * defensive line parser shared by backend-driven strategies.
 */

use async_trait::async_trait;
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::VecDeque;

use crate::errors::TranslationError;

/// Leading enumeration tokens some backends prepend despite instructions
/// (pattern: digits, a period, optional space)
static ENUMERATION_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d+\.\s*").expect("enumeration prefix regex is valid"));

/// Common trait for all batch translation strategies
///
/// Implementations translate an ordered batch of texts into a target
/// language, returning a sequence of the same length and order with `None`
/// at any position whose translation could not be confidently extracted.
/// Strategies are interchangeable and selected by configuration.
#[async_trait]
pub trait BatchTranslator: Send + Sync {
    /// Translate a batch of texts into the target language
    ///
    /// Conversational state is explicitly owned by the caller and passed
    /// in; the adapter holds no hidden session. A returned error means the
    /// whole batch failed (transport-level); malformed content degrades to
    /// `None` positions instead.
    async fn translate_batch(
        &self,
        texts: &[String],
        target_language: &str,
        context: &mut ExchangeContext,
    ) -> Result<Vec<Option<String>>, TranslationError>;

    /// Verify the backing service is reachable
    async fn check_connection(&self) -> Result<(), TranslationError> {
        Ok(())
    }

    /// Strategy name for logging
    fn name(&self) -> &str;
}

/// One prior request/response pair
#[derive(Debug, Clone)]
pub struct Exchange {
    /// The request text sent to the backend
    pub request: String,
    /// The raw response received
    pub response: String,
}

/// Explicit conversational context carried between successive batches
///
/// A bounded window of prior exchanges used to stabilize terminology
/// across batches of one run. The processor owns one per language run.
#[derive(Debug, Clone)]
pub struct ExchangeContext {
    /// Prior exchanges, oldest first
    exchanges: VecDeque<Exchange>,
    /// Maximum number of exchanges retained
    capacity: usize,
}

impl ExchangeContext {
    /// Create a context window retaining up to `capacity` exchanges
    pub fn new(capacity: usize) -> Self {
        Self {
            exchanges: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Create a context that retains nothing
    pub fn disabled() -> Self {
        Self::new(0)
    }

    /// Record an exchange, evicting the oldest once at capacity
    pub fn push(&mut self, request: String, response: String) {
        if self.capacity == 0 {
            return;
        }
        if self.exchanges.len() == self.capacity {
            self.exchanges.pop_front();
        }
        self.exchanges.push_back(Exchange { request, response });
    }

    /// Iterate prior exchanges, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Exchange> {
        self.exchanges.iter()
    }

    /// Number of retained exchanges
    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    /// Whether no exchanges are retained
    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }
}

/// Parse a line-for-line translation response
///
/// Splits the response into non-empty lines, strips any leading
/// enumeration tokens, and aligns lines positionally with the request.
/// When the counts disagree the shorter sequence is zipped and the
/// remaining positions are filled with `None`; this never fails.
pub fn parse_batch_response(response: &str, expected: usize) -> Vec<Option<String>> {
    let lines: Vec<String> = response
        .lines()
        .map(|line| ENUMERATION_PREFIX.replace(line.trim(), "").to_string())
        .filter(|line| !line.is_empty())
        .collect();

    if lines.len() != expected {
        warn!(
            "Batch response line count mismatch: got {}, expected {}",
            lines.len(),
            expected
        );
    }

    (0..expected)
        .map(|i| lines.get(i).cloned())
        .collect()
}
