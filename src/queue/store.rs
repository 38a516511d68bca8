/*!
 * Queue store for translation task persistence.
 *
 * This module provides the durable task table the processor and monitor
 * operate on, abstracting away the SQL details and providing type-safe
 * access. Write-back deliberately matches rows by `(language, query)`:
 * one successful translation settles every row that shared the exact
 * source text, across subjects and tools.
 */

use anyhow::Result;
use log::debug;
use rusqlite::{Connection, params};
use std::collections::BTreeMap;

use super::connection::{DatabaseConnection, DatabaseStats};
use super::models::{CoverageCounts, PendingFilter, StatusCounts, TaskRecord, TaskStatus};
use crate::language_utils;

/// Store for queue task operations
#[derive(Clone)]
pub struct QueueStore {
    /// Database connection
    db: DatabaseConnection,
}

impl QueueStore {
    /// Create a new store with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a store backed by a database file
    pub fn open(path: &str) -> Result<Self> {
        let db = DatabaseConnection::new(path)?;
        Ok(Self::new(db))
    }

    /// Create a store with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db))
    }

    /// Get the underlying database connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DatabaseStats> {
        self.db.stats()
    }

    // =========================================================================
    // Task Creation
    // =========================================================================

    /// Fan a completed source-language query out to target languages
    ///
    /// Creates one pending task per language, each starting from the
    /// source-language text. Rows whose identity
    /// `(subject_id, tool, language, query)` already exists are skipped,
    /// so repeated fan-out of the same query is idempotent.
    pub async fn enqueue_fanout(
        &self,
        subject_id: &str,
        tool: &str,
        query: &str,
        languages: &[String],
        max_attempts: i64,
        priority: i64,
    ) -> Result<usize> {
        let subject_id = subject_id.to_string();
        let tool = tool.to_string();
        let query = query.to_string();
        let languages = languages.to_vec();

        self.db
            .transaction_async(move |tx| {
                let now = chrono::Utc::now().to_rfc3339();
                let mut inserted = 0;

                for language in &languages {
                    let exists: i64 = tx.query_row(
                        r#"
                        SELECT COUNT(*) FROM queue_tasks
                        WHERE subject_id = ?1 AND tool = ?2 AND language = ?3 AND query = ?4
                        "#,
                        params![subject_id, tool, language, query],
                        |row| row.get(0),
                    )?;

                    if exists > 0 {
                        continue;
                    }

                    tx.execute(
                        r#"
                        INSERT INTO queue_tasks (
                            subject_id, tool, query, language, status,
                            attempts, max_attempts, priority, created_at, updated_at
                        ) VALUES (?1, ?2, ?3, ?4, 'pending', 0, ?5, ?6, ?7, ?8)
                        "#,
                        params![subject_id, tool, query, language, max_attempts, priority, now, now],
                    )?;
                    inserted += 1;
                }

                Ok(inserted)
            })
            .await
    }

    // =========================================================================
    // Task Selection
    // =========================================================================

    /// Fetch tasks eligible for processing in a language
    ///
    /// Returns rows in priority order (highest first, then insertion
    /// order). The default filter selects `pending` plus stale
    /// `processing` rows; `processing` is not a lock and rows abandoned by
    /// a cancelled run are picked up here. When the filter carries a
    /// mixed-script source language, completed rows whose text still
    /// contains that script are appended for reprocessing.
    pub async fn fetch_pending(
        &self,
        language: &str,
        filter: PendingFilter,
    ) -> Result<Vec<TaskRecord>> {
        let language = language.to_string();

        self.db
            .execute_async(move |conn| {
                let mut tasks = Self::fetch_by_statuses(conn, &language, &filter)?;

                if let Some(source_language) = &filter.mixed_script_source {
                    // Partially translated rows end up complete with
                    // source-script residue; script detection has to
                    // happen on this side of the SQL boundary.
                    let completed =
                        Self::fetch_completed(conn, &language, filter.tool.as_deref())?;
                    tasks.extend(completed.into_iter().filter(|t| {
                        language_utils::contains_source_script(&t.query, source_language)
                    }));
                }

                if let Some(limit) = filter.limit {
                    tasks.truncate(limit);
                }

                debug!("Fetched {} eligible tasks for '{}'", tasks.len(), language);
                Ok(tasks)
            })
            .await
    }

    /// Fetch rows in the filter's status set
    fn fetch_by_statuses(
        conn: &Connection,
        language: &str,
        filter: &PendingFilter,
    ) -> Result<Vec<TaskRecord>> {
        // Status values come from the enum's Display impl, never from input
        let status_list = filter
            .statuses
            .iter()
            .map(|s| format!("'{}'", s))
            .collect::<Vec<_>>()
            .join(", ");

        let sql = format!(
            r#"
            SELECT id, subject_id, tool, query, language, status,
                   attempts, max_attempts, priority, created_at, updated_at
            FROM queue_tasks
            WHERE language = ?1
              AND status IN ({})
              AND (?2 IS NULL OR tool = ?2)
            ORDER BY priority DESC, id ASC
            "#,
            status_list
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![language, filter.tool], Self::parse_task_row)?;

        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Fetch completed rows for the mixed-script sweep
    fn fetch_completed(
        conn: &Connection,
        language: &str,
        tool: Option<&str>,
    ) -> Result<Vec<TaskRecord>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT id, subject_id, tool, query, language, status,
                   attempts, max_attempts, priority, created_at, updated_at
            FROM queue_tasks
            WHERE language = ?1
              AND status = 'complete'
              AND (?2 IS NULL OR tool = ?2)
            ORDER BY priority DESC, id ASC
            "#,
        )?;

        let rows = stmt.query_map(params![language, tool], Self::parse_task_row)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Parse a task row
    fn parse_task_row(row: &rusqlite::Row) -> rusqlite::Result<TaskRecord> {
        Ok(TaskRecord {
            id: row.get(0)?,
            subject_id: row.get(1)?,
            tool: row.get(2)?,
            query: row.get(3)?,
            language: row.get(4)?,
            status: row
                .get::<_, String>(5)?
                .parse()
                .unwrap_or(TaskStatus::Pending),
            attempts: row.get(6)?,
            max_attempts: row.get(7)?,
            priority: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    /// Mark tasks as selected into the current batch
    pub async fn mark_processing(&self, ids: Vec<i64>) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        self.db
            .transaction_async(move |tx| {
                let now = chrono::Utc::now().to_rfc3339();
                let mut updated = 0;

                for id in &ids {
                    updated += tx.execute(
                        "UPDATE queue_tasks SET status = 'processing', updated_at = ?1 WHERE id = ?2",
                        params![now, id],
                    )?;
                }

                Ok(updated)
            })
            .await
    }

    // =========================================================================
    // Write-back
    // =========================================================================

    /// Write a translation back to every row sharing the source text
    ///
    /// Matches on `(language, old_text)` and only touches rows still in an
    /// eligible (non-terminal) status, so re-running against completed rows
    /// performs zero writes. Matched rows get the new text and move to
    /// `complete` with attempts unchanged. Calling with
    /// `old_text == new_text` is safe: only the status flips, and repeated
    /// calls are no-ops.
    ///
    /// Returns the number of rows affected.
    pub async fn update_query(
        &self,
        language: &str,
        old_text: &str,
        new_text: &str,
    ) -> Result<usize> {
        let language = language.to_string();
        let old_text = old_text.to_string();
        let new_text = new_text.to_string();

        self.db
            .execute_async(move |conn| {
                let now = chrono::Utc::now().to_rfc3339();
                let updated = conn.execute(
                    r#"
                    UPDATE queue_tasks
                    SET query = ?1, status = 'complete', updated_at = ?2
                    WHERE language = ?3
                      AND query = ?4
                      AND status IN ('pending', 'processing')
                    "#,
                    params![new_text, now, language, old_text],
                )?;

                if updated > 1 {
                    debug!(
                        "Translation for '{}' settled {} rows sharing the text",
                        language, updated
                    );
                }

                Ok(updated)
            })
            .await
    }

    /// Record a failed translation for every row sharing the source text
    ///
    /// Increments `attempts` and either returns the task to `pending` or,
    /// once `attempts` reaches `max_attempts`, abandons it as `error`.
    /// `error` is terminal: rows already there are never touched again.
    ///
    /// Returns the number of rows affected.
    pub async fn record_failure(&self, language: &str, text: &str) -> Result<usize> {
        let language = language.to_string();
        let text = text.to_string();

        self.db
            .execute_async(move |conn| {
                let now = chrono::Utc::now().to_rfc3339();
                let updated = conn.execute(
                    r#"
                    UPDATE queue_tasks
                    SET attempts = attempts + 1,
                        status = CASE
                            WHEN attempts + 1 >= max_attempts THEN 'error'
                            ELSE 'pending'
                        END,
                        updated_at = ?1
                    WHERE language = ?2
                      AND query = ?3
                      AND status IN ('pending', 'processing')
                    "#,
                    params![now, language, text],
                )?;

                Ok(updated)
            })
            .await
    }

    // =========================================================================
    // Aggregates
    // =========================================================================

    /// Count tasks by status across all languages
    pub async fn count_by_status(&self) -> Result<StatusCounts> {
        self.db
            .execute_async(|conn| {
                let mut stmt =
                    conn.prepare("SELECT status, COUNT(*) FROM queue_tasks GROUP BY status")?;

                let rows = stmt.query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                })?;

                let mut counts = StatusCounts::default();
                for row in rows.filter_map(|r| r.ok()) {
                    let (status, count) = row;
                    counts.total += count;
                    match status.parse::<TaskStatus>() {
                        Ok(TaskStatus::Pending) => counts.pending = count,
                        Ok(TaskStatus::Processing) => counts.processing = count,
                        Ok(TaskStatus::Complete) => counts.complete = count,
                        Ok(TaskStatus::Error) => counts.error = count,
                        Err(_) => {}
                    }
                }

                Ok(counts)
            })
            .await
    }

    /// Count tasks per language
    pub async fn language_distribution(&self) -> Result<BTreeMap<String, i64>> {
        self.db
            .execute_async(|conn| {
                let mut stmt =
                    conn.prepare("SELECT language, COUNT(*) FROM queue_tasks GROUP BY language")?;

                let rows = stmt.query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                })?;

                Ok(rows.filter_map(|r| r.ok()).collect())
            })
            .await
    }

    /// Coverage of distinct (subject, tool) pairs by completed translations
    pub async fn coverage_counts(&self, source_language: &str) -> Result<CoverageCounts> {
        let source_language = source_language.to_string();

        self.db
            .execute_async(move |conn| {
                let total: i64 = conn.query_row(
                    "SELECT COUNT(DISTINCT subject_id || ':' || tool) FROM queue_tasks",
                    [],
                    |row| row.get(0),
                )?;

                let with_source: i64 = conn.query_row(
                    r#"
                    SELECT COUNT(DISTINCT subject_id || ':' || tool)
                    FROM queue_tasks
                    WHERE language = ?1 AND status = 'complete'
                    "#,
                    params![source_language],
                    |row| row.get(0),
                )?;

                let with_target: i64 = conn.query_row(
                    r#"
                    SELECT COUNT(DISTINCT subject_id || ':' || tool)
                    FROM queue_tasks
                    WHERE language != ?1 AND status = 'complete'
                    "#,
                    params![source_language],
                    |row| row.get(0),
                )?;

                Ok(CoverageCounts {
                    total,
                    with_source_translation: with_source,
                    with_target_translation: with_target,
                })
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn create_test_store() -> QueueStore {
        QueueStore::new_in_memory().expect("Failed to create test store")
    }

    async fn enqueue_one(store: &QueueStore, subject: &str, tool: &str, query: &str, lang: &str) {
        store
            .enqueue_fanout(subject, tool, query, &[lang.to_string()], 3, 0)
            .await
            .expect("Failed to enqueue");
    }

    #[tokio::test]
    async fn test_enqueueFanout_shouldCreateOneTaskPerLanguage() {
        let store = create_test_store().await;

        let languages = vec!["en".to_string(), "fr".to_string(), "ru".to_string()];
        let inserted = store
            .enqueue_fanout("bio-001", "search", "什么是细胞", &languages, 3, 0)
            .await
            .unwrap();

        assert_eq!(inserted, 3);

        let counts = store.count_by_status().await.unwrap();
        assert_eq!(counts.total, 3);
        assert_eq!(counts.pending, 3);
    }

    #[tokio::test]
    async fn test_enqueueFanout_calledTwice_shouldBeIdempotent() {
        let store = create_test_store().await;

        let languages = vec!["en".to_string(), "fr".to_string()];
        store
            .enqueue_fanout("bio-001", "search", "什么是细胞", &languages, 3, 0)
            .await
            .unwrap();
        let second = store
            .enqueue_fanout("bio-001", "search", "什么是细胞", &languages, 3, 0)
            .await
            .unwrap();

        assert_eq!(second, 0);
        assert_eq!(store.count_by_status().await.unwrap().total, 2);
    }

    #[tokio::test]
    async fn test_fetchPending_shouldOrderByPriority() {
        let store = create_test_store().await;

        store
            .enqueue_fanout("bio-001", "search", "low", &["en".to_string()], 3, 0)
            .await
            .unwrap();
        store
            .enqueue_fanout("bio-002", "search", "high", &["en".to_string()], 3, 5)
            .await
            .unwrap();

        let tasks = store
            .fetch_pending("en", PendingFilter::default())
            .await
            .unwrap();

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].query, "high");
        assert_eq!(tasks[1].query, "low");
    }

    #[tokio::test]
    async fn test_fetchPending_shouldIncludeStaleProcessing() {
        let store = create_test_store().await;
        enqueue_one(&store, "bio-001", "search", "什么是细胞", "en").await;

        let tasks = store
            .fetch_pending("en", PendingFilter::default())
            .await
            .unwrap();
        store
            .mark_processing(tasks.iter().map(|t| t.id).collect())
            .await
            .unwrap();

        // A restart sees the stale processing row again
        let tasks = store
            .fetch_pending("en", PendingFilter::default())
            .await
            .unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].status, TaskStatus::Processing);
    }

    #[tokio::test]
    async fn test_fetchPending_withMixedScriptFilter_shouldReselectResidue() {
        let store = create_test_store().await;
        enqueue_one(&store, "bio-001", "search", "什么是细胞", "en").await;
        enqueue_one(&store, "bio-002", "search", "什么是线粒体", "en").await;

        // One full translation, one partial with residue
        store
            .update_query("en", "什么是细胞", "what is a cell")
            .await
            .unwrap();
        store
            .update_query("en", "什么是线粒体", "what is 线粒体")
            .await
            .unwrap();

        let tasks = store
            .fetch_pending("en", PendingFilter::with_mixed_script("zh"))
            .await
            .unwrap();

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].query, "what is 线粒体");
    }

    #[tokio::test]
    async fn test_updateQuery_shouldAmplifyAcrossSubjects() {
        let store = create_test_store().await;

        // Three subjects happen to share the exact same query text
        enqueue_one(&store, "bio-001", "search", "什么是细胞", "en").await;
        enqueue_one(&store, "bio-002", "search", "什么是细胞", "en").await;
        enqueue_one(&store, "chem-001", "lookup", "什么是细胞", "en").await;

        let updated = store
            .update_query("en", "什么是细胞", "what is a cell")
            .await
            .unwrap();

        assert_eq!(updated, 3);
        let counts = store.count_by_status().await.unwrap();
        assert_eq!(counts.complete, 3);
    }

    #[tokio::test]
    async fn test_updateQuery_shouldNotTouchTerminalRows() {
        let store = create_test_store().await;
        enqueue_one(&store, "bio-001", "search", "什么是细胞", "en").await;

        let first = store
            .update_query("en", "什么是细胞", "what is a cell")
            .await
            .unwrap();
        assert_eq!(first, 1);

        // Re-running against completed rows performs zero writes
        let second = store
            .update_query("en", "什么是细胞", "what is a cell")
            .await
            .unwrap();
        assert_eq!(second, 0);
    }

    #[tokio::test]
    async fn test_updateQuery_withIdenticalText_shouldBeSafe() {
        let store = create_test_store().await;
        enqueue_one(&store, "math-001", "search", "2 + 2", "en").await;

        let updated = store.update_query("en", "2 + 2", "2 + 2").await.unwrap();
        assert_eq!(updated, 1);

        let counts = store.count_by_status().await.unwrap();
        assert_eq!(counts.complete, 1);
    }

    #[tokio::test]
    async fn test_recordFailure_shouldReturnTaskToPending() {
        let store = create_test_store().await;
        enqueue_one(&store, "bio-001", "search", "什么是细胞", "en").await;

        store.record_failure("en", "什么是细胞").await.unwrap();

        let tasks = store
            .fetch_pending("en", PendingFilter::default())
            .await
            .unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].status, TaskStatus::Pending);
        assert_eq!(tasks[0].attempts, 1);
    }

    #[tokio::test]
    async fn test_recordFailure_atMaxAttempts_shouldAbandonTask() {
        let store = create_test_store().await;
        enqueue_one(&store, "bio-001", "search", "什么是细胞", "en").await;

        for _ in 0..3 {
            store.record_failure("en", "什么是细胞").await.unwrap();
        }

        let counts = store.count_by_status().await.unwrap();
        assert_eq!(counts.error, 1);
        assert_eq!(counts.pending, 0);

        // Terminal: a further failure touches nothing
        let touched = store.record_failure("en", "什么是细胞").await.unwrap();
        assert_eq!(touched, 0);
    }

    #[tokio::test]
    async fn test_recordFailure_attemptsNonDecreasing() {
        let store = create_test_store().await;
        enqueue_one(&store, "bio-001", "search", "什么是细胞", "en").await;

        let mut last_attempts = 0;
        for _ in 0..3 {
            store.record_failure("en", "什么是细胞").await.unwrap();
            let statuses = vec![TaskStatus::Pending, TaskStatus::Processing, TaskStatus::Error];
            let tasks = store
                .fetch_pending(
                    "en",
                    PendingFilter {
                        statuses,
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
            assert!(tasks[0].attempts >= last_attempts);
            last_attempts = tasks[0].attempts;
        }
        assert_eq!(last_attempts, 3);
    }

    #[tokio::test]
    async fn test_countByStatus_shouldGroupCorrectly() {
        let store = create_test_store().await;
        enqueue_one(&store, "bio-001", "search", "什么是细胞", "en").await;
        enqueue_one(&store, "bio-002", "search", "什么是线粒体", "en").await;
        store
            .update_query("en", "什么是细胞", "what is a cell")
            .await
            .unwrap();

        let counts = store.count_by_status().await.unwrap();
        assert_eq!(counts.total, 2);
        assert_eq!(counts.pending, 1);
        assert_eq!(counts.complete, 1);
        assert_eq!(counts.completion_percentage(), 50.0);
    }

    #[tokio::test]
    async fn test_languageDistribution_shouldCountPerLanguage() {
        let store = create_test_store().await;
        let languages = vec!["en".to_string(), "fr".to_string()];
        store
            .enqueue_fanout("bio-001", "search", "什么是细胞", &languages, 3, 0)
            .await
            .unwrap();
        enqueue_one(&store, "bio-002", "search", "什么是线粒体", "en").await;

        let distribution = store.language_distribution().await.unwrap();
        assert_eq!(distribution.get("en"), Some(&2));
        assert_eq!(distribution.get("fr"), Some(&1));
    }

    #[tokio::test]
    async fn test_coverageCounts_shouldTrackSubjectToolPairs() {
        let store = create_test_store().await;

        // Source-language row completed for bio-001, target row for bio-002
        enqueue_one(&store, "bio-001", "search", "什么是细胞", "zh").await;
        store
            .update_query("zh", "什么是细胞", "什么是细胞")
            .await
            .unwrap();
        enqueue_one(&store, "bio-002", "search", "什么是线粒体", "en").await;
        store
            .update_query("en", "什么是线粒体", "what is a mitochondrion")
            .await
            .unwrap();

        let coverage = store.coverage_counts("zh").await.unwrap();
        assert_eq!(coverage.total, 2);
        assert_eq!(coverage.with_source_translation, 1);
        assert_eq!(coverage.with_target_translation, 1);
    }
}
