//! Result export to JSON, CSV and Parquet.
//!
//! Every [ExperimentResult] already carries its experiment id, seed and the
//! swept parameters, so rows are self-describing in every format.

use std::path::Path;

use crate::metrics::ExperimentResult;

#[path = "export/csv.rs"]
mod csv;
#[path = "export/json.rs"]
mod json;
#[path = "export/parquet.rs"]
mod parquet;
#[path = "export/writer_utils.rs"]
mod writer_utils;

/// Export experiment results to Parquet, one row per run.
///
/// # Errors
///
/// Returns an error when `results` is empty or writing fails.
pub fn export_to_parquet(
    results: &[ExperimentResult],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    writer_utils::ensure_not_empty(results)?;
    let file = writer_utils::create_output_file(path)?;
    parquet::export_to_parquet_impl(results, file)
}

/// Export experiment results as a pretty-printed JSON array.
pub fn export_to_json(
    results: &[ExperimentResult],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = writer_utils::create_output_file(path)?;
    json::export_to_json_impl(results, file)
}

/// Export experiment results to CSV with a header row.
///
/// # Errors
///
/// Returns an error when `results` is empty or writing fails.
pub fn export_to_csv(
    results: &[ExperimentResult],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    writer_utils::ensure_not_empty(results)?;
    let file = writer_utils::create_output_file(path)?;
    csv::export_to_csv_impl(results, file)
}

/// Write results as JSON to any writer, e.g. stdout.
pub fn write_json(
    results: &[ExperimentResult],
    writer: impl std::io::Write,
) -> Result<(), Box<dyn std::error::Error>> {
    json::export_to_json_impl(results, writer)
}
