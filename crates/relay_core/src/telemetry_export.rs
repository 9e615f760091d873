//! Parquet export of run telemetry.

mod propagation;
mod snapshot_counts;
mod utils;

pub use propagation::write_propagation_parquet;
pub use snapshot_counts::{write_agent_snapshots_parquet, write_snapshot_counts_parquet};
