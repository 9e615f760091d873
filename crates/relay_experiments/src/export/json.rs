use std::io::Write;

use crate::metrics::ExperimentResult;

pub(crate) fn export_to_json_impl(
    results: &[ExperimentResult],
    writer: impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    serde_json::to_writer_pretty(writer, results)?;
    Ok(())
}
