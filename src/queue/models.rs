/*!
 * Queue entity models and DTOs.
 *
 * These structures map directly to the queue table and provide
 * type-safe access to persisted tasks.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Task status enumeration
///
/// Transitions are monotonic except `processing -> pending` on retry:
/// `pending -> processing -> {complete, error, pending}`. `complete` and
/// `error` are terminal for the processor (a completed row can still be
/// re-selected by the mixed-script filter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task awaiting translation
    Pending,
    /// Task selected into the current batch
    Processing,
    /// Task text translated and written back
    Complete,
    /// Retries exhausted, task abandoned
    Error,
}

impl TaskStatus {
    /// Whether no further automatic transition occurs from this status
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Complete | TaskStatus::Error)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Processing => write!(f, "processing"),
            TaskStatus::Complete => write!(f, "complete"),
            TaskStatus::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "processing" => Ok(TaskStatus::Processing),
            "complete" => Ok(TaskStatus::Complete),
            "error" => Ok(TaskStatus::Error),
            _ => Err(anyhow::anyhow!("Invalid task status: {}", s)),
        }
    }
}

/// Queue task record
///
/// One unit of translation work, identified by
/// `(subject_id, tool, language, query)`. The query column holds the
/// source-language text until translation lands, then the translated text:
/// the row is reused rather than duplicated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Database ID
    pub id: i64,
    /// Subject this query belongs to
    pub subject_id: String,
    /// Tool that issued the query
    pub tool: String,
    /// Query text (source text until translated, then target text)
    pub query: String,
    /// Language code of this task
    pub language: String,
    /// Current status
    pub status: TaskStatus,
    /// Translation attempts made so far
    pub attempts: i64,
    /// Attempts after which the task is abandoned
    pub max_attempts: i64,
    /// Ordering hint, higher first; not a correctness constraint
    pub priority: i64,
    /// Creation timestamp (ISO 8601)
    pub created_at: String,
    /// Last update timestamp (ISO 8601)
    pub updated_at: String,
}

impl TaskRecord {
    /// Create a new task record (without database ID)
    pub fn new(
        subject_id: String,
        tool: String,
        query: String,
        language: String,
        max_attempts: i64,
        priority: i64,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: 0, // Will be assigned by database
            subject_id,
            tool,
            query,
            language,
            status: TaskStatus::Pending,
            attempts: 0,
            max_attempts,
            priority,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Whether the task has exhausted its attempts
    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }
}

/// Selection filter for `fetch_pending`
///
/// Defaults to pending rows plus stale `processing` rows: `processing` is
/// not an exclusive lock, and rows left behind by a cancelled run must be
/// re-selectable on restart.
#[derive(Debug, Clone)]
pub struct PendingFilter {
    /// Statuses eligible for selection
    pub statuses: Vec<TaskStatus>,
    /// Restrict to a single tool
    pub tool: Option<String>,
    /// Also select completed rows whose text still carries characters of
    /// this source language's script (partially translated rows)
    pub mixed_script_source: Option<String>,
    /// Cap on the number of rows returned
    pub limit: Option<usize>,
}

impl Default for PendingFilter {
    fn default() -> Self {
        Self {
            statuses: vec![TaskStatus::Pending, TaskStatus::Processing],
            tool: None,
            mixed_script_source: None,
            limit: None,
        }
    }
}

impl PendingFilter {
    /// Filter that also re-selects mixed-script completed rows
    pub fn with_mixed_script(source_language: &str) -> Self {
        Self {
            mixed_script_source: Some(source_language.to_string()),
            ..Default::default()
        }
    }
}

/// Task counts by status
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusCounts {
    /// Total number of tasks
    pub total: i64,
    /// Tasks awaiting translation
    pub pending: i64,
    /// Tasks selected into a batch
    pub processing: i64,
    /// Translated tasks
    pub complete: i64,
    /// Abandoned tasks
    pub error: i64,
}

impl StatusCounts {
    /// Percentage of tasks in a terminal `complete` state
    pub fn completion_percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.complete as f64 / self.total as f64) * 100.0
    }
}

/// Coverage of distinct (subject, tool) pairs by completed translations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoverageCounts {
    /// Distinct (subject, tool) pairs in the queue
    pub total: i64,
    /// Pairs whose source-language row is complete
    pub with_source_translation: i64,
    /// Pairs with at least one completed non-source row
    pub with_target_translation: i64,
}
