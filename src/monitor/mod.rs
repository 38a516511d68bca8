/*!
 * Progress monitoring over the queue store.
 *
 * This module contains the read-only progress observer and its snapshot
 * models:
 *
 * - `snapshot`: Serializable aggregates and throughput math
 * - `progress`: The periodic monitor task
 */

// Re-export main types for easier usage
pub use self::progress::{MonitorOptions, ProgressMonitor, TickState};
pub use self::snapshot::{ProgressSnapshot, compute_rate};

// Submodules
pub mod progress;
pub mod snapshot;
