use std::io::Write;

use crate::metrics::ExperimentResult;

/// One row per result; the header comes from the field names and missing
/// reach times are left blank.
pub(crate) fn export_to_csv_impl(
    results: &[ExperimentResult],
    writer: impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = csv::Writer::from_writer(writer);
    for result in results {
        wtr.serialize(result)?;
    }
    wtr.flush()?;
    Ok(())
}
