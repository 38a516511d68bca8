/*!
 * LLM-backed batch translation strategy.
 *
 * Composes a line-for-line translation prompt, dispatches it to the
 * configured provider client, and parses the free-form response back into
 * positional results. Providers are constructed once per run from the
 * configuration and owned by the translator.
 */

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use log::debug;

use crate::app_config::{TranslationConfig, TranslationProvider};
use crate::errors::TranslationError;
use crate::providers::anthropic::{Anthropic, AnthropicRequest};
use crate::providers::ollama::{GenerationRequest, Ollama};

use super::adapter::{BatchTranslator, ExchangeContext, parse_batch_response};

/// Translation provider implementation variants
enum ProviderImpl {
    /// Ollama LLM service
    Ollama {
        /// Client instance
        client: Ollama,
    },

    /// Anthropic API service
    Anthropic {
        /// Client instance
        client: Anthropic,
    },
}

/// Batch translator backed by an LLM provider
pub struct LlmTranslator {
    /// Provider implementation
    provider: ProviderImpl,

    /// Model name passed with every request
    model: String,

    /// Strategy name for logging
    name: String,
}

impl LlmTranslator {
    /// Create a new LLM translator from the translation configuration
    pub fn new(config: &TranslationConfig) -> Result<Self> {
        let provider = match config.provider {
            TranslationProvider::Ollama => ProviderImpl::Ollama {
                client: Ollama::new_with_config(
                    config.get_endpoint(),
                    config.retry_count,
                    config.retry_backoff_ms,
                    config.timeout_secs,
                ),
            },
            TranslationProvider::Anthropic => ProviderImpl::Anthropic {
                client: Anthropic::new_with_config(
                    config.api_key.clone(),
                    config.get_endpoint(),
                    config.retry_count,
                    config.retry_backoff_ms,
                    config.rate_limit,
                    config.timeout_secs,
                ),
            },
            TranslationProvider::Dictionary => {
                return Err(anyhow!(
                    "Dictionary provider is not an LLM backend; use DictionaryTranslator"
                ));
            }
        };

        Ok(Self {
            provider,
            model: config.model.clone(),
            name: config.provider.to_lowercase_string(),
        })
    }

    /// System prompt shared by all batches
    fn build_system_prompt(target_language: &str) -> String {
        format!(
            "You are a translation engine. Translate each input line into the \
             language with code '{}'. Respond with exactly one translated line \
             per input line, in the same order. Do not number the lines, do not \
             add commentary, and do not merge or split lines.",
            target_language
        )
    }

    /// User prompt for one batch
    fn build_user_prompt(texts: &[String], target_language: &str) -> String {
        format!(
            "Translate the following {} lines into '{}':\n\n{}",
            texts.len(),
            target_language,
            texts.join("\n")
        )
    }

    /// Send one batch request and return the raw response text
    async fn request_raw(
        &self,
        user_prompt: &str,
        target_language: &str,
        context: &ExchangeContext,
    ) -> Result<String, TranslationError> {
        match &self.provider {
            ProviderImpl::Anthropic { client } => {
                let mut request = AnthropicRequest::new(&self.model, 4096)
                    .system(Self::build_system_prompt(target_language));

                // Prior exchanges ride along as conversation turns to keep
                // terminology stable across batches
                for exchange in context.iter() {
                    request = request
                        .add_message("user", exchange.request.clone())
                        .add_message("assistant", exchange.response.clone());
                }
                request = request.add_message("user", user_prompt);

                let response = client.complete(request).await?;
                Ok(Anthropic::extract_text_from_response(&response))
            }
            ProviderImpl::Ollama { client } => {
                // The generate API has no conversation turns; prior
                // exchanges are inlined ahead of the current request
                let mut prompt = String::new();
                for exchange in context.iter() {
                    prompt.push_str(&exchange.request);
                    prompt.push_str("\n\n");
                    prompt.push_str(&exchange.response);
                    prompt.push_str("\n\n");
                }
                prompt.push_str(user_prompt);

                let request = GenerationRequest::new(&self.model, prompt)
                    .system(Self::build_system_prompt(target_language));

                let response = client.generate(request).await?;
                Ok(response.response)
            }
        }
    }
}

#[async_trait]
impl BatchTranslator for LlmTranslator {
    async fn translate_batch(
        &self,
        texts: &[String],
        target_language: &str,
        context: &mut ExchangeContext,
    ) -> Result<Vec<Option<String>>, TranslationError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let user_prompt = Self::build_user_prompt(texts, target_language);
        let raw = self
            .request_raw(&user_prompt, target_language, context)
            .await?;

        debug!(
            "Provider '{}' returned {} chars for a {}-line batch",
            self.name,
            raw.len(),
            texts.len()
        );

        let results = parse_batch_response(&raw, texts.len());
        context.push(user_prompt, raw);

        Ok(results)
    }

    async fn check_connection(&self) -> Result<(), TranslationError> {
        match &self.provider {
            ProviderImpl::Anthropic { client } => client.test_connection(&self.model).await?,
            ProviderImpl::Ollama { client } => client.test_connection().await?,
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
