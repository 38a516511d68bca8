/*!
 * Translation strategies and caching.
 *
 * This module contains the batch translation contract and its
 * implementations, plus the durable translation cache. It is split into
 * several submodules:
 *
 * - `adapter`: Strategy contract, conversational context, response parsing
 * - `llm`: LLM-provider-backed strategy
 * - `dictionary`: Local dictionary-substitution strategy
 * - `cache`: Durable cache of completed translations
 */

// Re-export main types for easier usage
pub use self::adapter::{BatchTranslator, Exchange, ExchangeContext};
pub use self::cache::TranslationCache;
pub use self::dictionary::DictionaryTranslator;
pub use self::llm::LlmTranslator;

// Submodules
pub mod adapter;
pub mod cache;
pub mod dictionary;
pub mod llm;
