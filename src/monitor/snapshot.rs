/*!
 * Progress snapshot models.
 *
 * Serializable point-in-time aggregates over the queue, written by the
 * monitor as an append-only JSON-lines log plus one overwritten latest
 * record.
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::queue::models::{CoverageCounts, StatusCounts};

/// Queue counts section of a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueSection {
    /// Total number of tasks
    pub total: i64,
    /// Tasks in terminal `complete` state
    pub completed: i64,
    /// Tasks currently claimed by a run
    pub processing: i64,
    /// Tasks awaiting translation
    pub pending: i64,
    /// Abandoned tasks
    pub error: i64,
    /// Completed share of all tasks, in percent
    pub completion_pct: f64,
}

impl From<&StatusCounts> for QueueSection {
    fn from(counts: &StatusCounts) -> Self {
        Self {
            total: counts.total,
            completed: counts.complete,
            processing: counts.processing,
            pending: counts.pending,
            error: counts.error,
            completion_pct: counts.completion_percentage(),
        }
    }
}

/// Result coverage section of a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsSection {
    /// Distinct (subject, tool) pairs in the queue
    pub total: i64,
    /// Pairs whose source-language row is complete
    pub with_source_translation: i64,
    /// Pairs with at least one completed non-source row
    pub with_target_translation: i64,
    /// Task counts per language
    pub language_distribution: BTreeMap<String, i64>,
}

/// One point-in-time observation of queue state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Observation time (ISO 8601)
    pub timestamp: String,
    /// Queue counts
    pub queue: QueueSection,
    /// Result coverage
    pub results: ResultsSection,
    /// Recent completion rate in entries per hour; absent on the first tick
    #[serde(skip_serializing_if = "Option::is_none")]
    pub throughput_per_hour: Option<f64>,
}

impl ProgressSnapshot {
    /// Build a snapshot from store aggregates
    pub fn new(
        counts: &StatusCounts,
        coverage: CoverageCounts,
        language_distribution: BTreeMap<String, i64>,
        throughput_per_hour: Option<f64>,
    ) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            queue: QueueSection::from(counts),
            results: ResultsSection {
                total: coverage.total,
                with_source_translation: coverage.with_source_translation,
                with_target_translation: coverage.with_target_translation,
                language_distribution,
            },
            throughput_per_hour,
        }
    }
}

/// Completion rate in entries per hour over an interval
///
/// A negative delta (a concurrent external reset shrank the completed
/// count) is clamped to zero rather than reported as negative throughput.
pub fn compute_rate(completed_now: i64, completed_previous: i64, elapsed_secs: f64) -> f64 {
    if elapsed_secs <= 0.0 {
        return 0.0;
    }

    let delta = (completed_now - completed_previous).max(0) as f64;
    delta / (elapsed_secs / 3600.0)
}
