/*!
 * # transq - Translation Queue Processing Engine
 *
 * A Rust library for driving a persistent, multi-language queue of
 * translation tasks to completion using an external translation backend.
 *
 * ## Features
 *
 * - Durable SQLite-backed queue of translation tasks with retry accounting
 * - Batch translation through interchangeable strategies:
 *   - Ollama (local LLM)
 *   - Anthropic API
 *   - Local dictionary substitution
 * - Durable translation cache shared across runs
 * - Idempotent write-back keyed by (language, source text)
 * - Independent progress monitor with a durable snapshot log
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `queue`: Durable task queue and its processor:
 *   - `queue::store`: Typed queue operations
 *   - `queue::processor`: Per-language run orchestration
 * - `translation`: Batch translation strategies:
 *   - `translation::adapter`: Strategy contract and response parsing
 *   - `translation::cache`: Durable cache of completed translations
 * - `monitor`: Read-only progress observation
 * - `providers`: Client implementations for LLM backends:
 *   - `providers::ollama`: Ollama API client
 *   - `providers::anthropic`: Anthropic API client
 * - `app_controller`: Main application controller
 * - `language_utils`: Script detection utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod language_utils;
pub mod monitor;
pub mod providers;
pub mod queue;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use errors::{AppError, ProviderError, TranslationError};
pub use monitor::{ProgressMonitor, ProgressSnapshot};
pub use queue::{QueueProcessor, QueueStore, TaskRecord, TaskStatus};
pub use translation::{BatchTranslator, ExchangeContext, TranslationCache};
