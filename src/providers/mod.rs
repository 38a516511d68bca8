/*!
 * Provider implementations for translation backends.
 *
 * This module contains client implementations for the LLM backends the
 * engine can translate with:
 * - Ollama: Local LLM server
 * - Anthropic: Anthropic API integration
 *
 * plus a mock translation strategy used by the test suites. Clients own
 * their HTTP connection and retry policy; they are constructed once per
 * run and injected into the translation strategy, never held in module
 * globals.
 */

pub mod anthropic;
pub mod mock;
pub mod ollama;
