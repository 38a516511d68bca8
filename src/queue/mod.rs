/*!
 * Durable queue of translation tasks and its processor.
 *
 * This module contains the persistence layer for queued translation work
 * and the processor that drives tasks through their state machine. It is
 * split into several submodules:
 *
 * - `connection`: SQLite connection management
 * - `schema`: Table definitions and migrations
 * - `models`: Task records, statuses and filters
 * - `store`: Typed queue operations
 * - `processor`: Per-language run orchestration
 */

// Re-export main types for easier usage
pub use self::connection::{DatabaseConnection, DatabaseStats};
pub use self::models::{CoverageCounts, PendingFilter, StatusCounts, TaskRecord, TaskStatus};
pub use self::processor::{LanguageRunReport, ProcessorOptions, QueueProcessor};
pub use self::store::QueueStore;

// Submodules
pub mod connection;
pub mod models;
pub mod processor;
pub mod schema;
pub mod store;
