/*!
 * Progress monitor task.
 *
 * A read-only observer that polls the queue store on a fixed interval,
 * derives completion and throughput aggregates, and persists them as an
 * append-only JSON-lines log plus one overwritten latest record. The
 * monitor never mutates the queue and needs no coordination with the
 * processor beyond eventual consistency of its snapshots.
 */

use anyhow::{Context, Result};
use log::{debug, info};
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::watch;

use crate::queue::store::QueueStore;

use super::snapshot::{ProgressSnapshot, compute_rate};

/// Options controlling the monitor
#[derive(Debug, Clone)]
pub struct MonitorOptions {
    /// Time between snapshots
    pub interval: Duration,

    /// Append-only snapshot log path
    pub log_path: PathBuf,

    /// Overwritten latest-snapshot path
    pub latest_path: PathBuf,

    /// Source language, for result coverage accounting
    pub source_language: String,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            log_path: PathBuf::from("progress_log.jsonl"),
            latest_path: PathBuf::from("progress_latest.json"),
            source_language: "zh".to_string(),
        }
    }
}

/// Carry-over between ticks for throughput computation
#[derive(Debug, Default)]
pub struct TickState {
    /// Completed count at the previous tick
    completed_previous: i64,
    /// Time of the previous tick
    last_tick: Option<Instant>,
}

/// Read-only progress observer over the queue store
pub struct ProgressMonitor {
    /// Queue store to observe
    store: QueueStore,

    /// Monitor options
    options: MonitorOptions,
}

impl ProgressMonitor {
    /// Create a new monitor
    pub fn new(store: QueueStore, options: MonitorOptions) -> Self {
        Self { store, options }
    }

    /// Take one snapshot, updating the carry-over state
    pub async fn tick(&self, state: &mut TickState) -> Result<ProgressSnapshot> {
        let counts = self.store.count_by_status().await?;
        let coverage = self
            .store
            .coverage_counts(&self.options.source_language)
            .await?;
        let distribution = self.store.language_distribution().await?;

        let throughput = state.last_tick.map(|last| {
            compute_rate(
                counts.complete,
                state.completed_previous,
                last.elapsed().as_secs_f64(),
            )
        });

        state.completed_previous = counts.complete;
        state.last_tick = Some(Instant::now());

        let snapshot = ProgressSnapshot::new(&counts, coverage, distribution, throughput);
        self.persist(&snapshot)?;

        debug!(
            "Snapshot: {}/{} complete ({:.1}%)",
            snapshot.queue.completed, snapshot.queue.total, snapshot.queue.completion_pct
        );

        Ok(snapshot)
    }

    /// Append the snapshot to the log and overwrite the latest record
    fn persist(&self, snapshot: &ProgressSnapshot) -> Result<()> {
        let line =
            serde_json::to_string(snapshot).context("Failed to serialize progress snapshot")?;

        let mut log = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.options.log_path)
            .with_context(|| format!("Failed to open progress log: {:?}", self.options.log_path))?;
        writeln!(log, "{}", line)
            .with_context(|| format!("Failed to append to progress log: {:?}", self.options.log_path))?;

        let latest = serde_json::to_string_pretty(snapshot)
            .context("Failed to serialize latest snapshot")?;
        std::fs::write(&self.options.latest_path, latest).with_context(|| {
            format!(
                "Failed to write latest snapshot: {:?}",
                self.options.latest_path
            )
        })?;

        Ok(())
    }

    /// Run the monitor until the shutdown channel fires
    ///
    /// The first snapshot is taken immediately, then one per interval.
    /// Store failures are fatal; everything else keeps ticking.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!(
            "Progress monitor started (every {:?}, log at {:?})",
            self.options.interval, self.options.log_path
        );

        let mut interval = tokio::time::interval(self.options.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut state = TickState::default();

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let snapshot = self.tick(&mut state).await?;
                    info!(
                        "{}/{} complete ({:.1}%), {} pending, {} error{}",
                        snapshot.queue.completed,
                        snapshot.queue.total,
                        snapshot.queue.completion_pct,
                        snapshot.queue.pending,
                        snapshot.queue.error,
                        snapshot
                            .throughput_per_hour
                            .map(|r| format!(", {:.1} entries/hour", r))
                            .unwrap_or_default()
                    );
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Progress monitor stopped");
                        return Ok(());
                    }
                }
            }
        }
    }
}
