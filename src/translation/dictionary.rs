/*!
 * Dictionary-substitution translation strategy.
 *
 * A local fallback for a single language pair that replaces known source
 * terms with their translations, longest term first. It implements the
 * same contract as the LLM strategy and is selected by configuration; a
 * text it cannot fully clear of source-script characters is reported as
 * untranslated rather than half-done.
 */

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use std::collections::HashMap;
use std::path::Path;

use crate::errors::TranslationError;
use crate::language_utils::contains_source_script;

use super::adapter::{BatchTranslator, ExchangeContext};

/// Batch translator backed by a local term dictionary
pub struct DictionaryTranslator {
    /// Source language whose script must be cleared from the output
    source_language: String,

    /// Term pairs ordered longest source term first
    terms: Vec<(String, String)>,
}

impl DictionaryTranslator {
    /// Load a dictionary from a JSON file mapping source terms to translations
    pub fn load<P: AsRef<Path>>(path: P, source_language: &str) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read dictionary file: {:?}", path.as_ref()))?;

        let terms: HashMap<String, String> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse dictionary file: {:?}", path.as_ref()))?;

        debug!(
            "Loaded {} dictionary terms from {:?}",
            terms.len(),
            path.as_ref()
        );

        Ok(Self::new_with_terms(terms, source_language))
    }

    /// Create a translator from an in-memory term map
    pub fn new_with_terms(terms: HashMap<String, String>, source_language: &str) -> Self {
        let mut terms: Vec<(String, String)> = terms.into_iter().collect();
        // Longest source term first, so compound terms win over their parts
        terms.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));

        Self {
            source_language: source_language.to_string(),
            terms,
        }
    }

    /// Number of known terms
    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Apply all known substitutions to a text
    fn substitute(&self, text: &str) -> String {
        let mut result = text.to_string();
        for (source, translation) in &self.terms {
            if result.contains(source.as_str()) {
                result = result.replace(source.as_str(), translation);
            }
        }
        result
    }
}

#[async_trait]
impl BatchTranslator for DictionaryTranslator {
    async fn translate_batch(
        &self,
        texts: &[String],
        _target_language: &str,
        _context: &mut ExchangeContext,
    ) -> Result<Vec<Option<String>>, TranslationError> {
        Ok(texts
            .iter()
            .map(|text| {
                let substituted = self.substitute(text);
                // Residual source script means the dictionary did not
                // cover the text; report no translation at all
                if contains_source_script(&substituted, &self.source_language) {
                    None
                } else {
                    Some(substituted)
                }
            })
            .collect())
    }

    fn name(&self) -> &str {
        "dictionary"
    }
}
