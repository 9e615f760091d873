use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;

use crate::metrics::ExperimentResult;

pub(crate) fn export_to_parquet_impl(
    results: &[ExperimentResult],
    file: std::fs::File,
) -> Result<(), Box<dyn std::error::Error>> {
    let batch = build_record_batch(results)?;
    let props = WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn build_record_batch(
    results: &[ExperimentResult],
) -> Result<RecordBatch, arrow::error::ArrowError> {
    RecordBatch::try_new(Arc::new(parquet_schema()), build_arrays(results))
}

pub(crate) fn parquet_schema() -> Schema {
    Schema::new(vec![
        Field::new("experiment_id", DataType::Utf8, false),
        Field::new("run_id", DataType::UInt64, false),
        Field::new("seed", DataType::UInt64, false),
        Field::new("encounter_model", DataType::Utf8, false),
        Field::new("author_policy", DataType::Utf8, false),
        Field::new("population", DataType::UInt64, false),
        Field::new("adversaries", DataType::UInt64, false),
        Field::new("static_jammers", DataType::UInt64, false),
        Field::new("mobile_jammers", DataType::UInt64, false),
        Field::new("neighborhood_radius", DataType::Float64, false),
        Field::new("jamming_radius", DataType::Float64, false),
        Field::new("encounter_chance", DataType::Float64, false),
        Field::new("final_reach", DataType::UInt64, false),
        Field::new("reach_fraction", DataType::Float64, false),
        Field::new("time_to_half_reach", DataType::Float64, true),
        Field::new("time_to_full_reach", DataType::Float64, true),
        Field::new("record_count", DataType::UInt64, false),
        Field::new("duration_secs", DataType::Float64, false),
        Field::new("encounters", DataType::UInt64, false),
    ])
}

fn strings(results: &[ExperimentResult], f: impl Fn(&ExperimentResult) -> &str) -> ArrayRef {
    Arc::new(StringArray::from(results.iter().map(f).collect::<Vec<_>>()))
}

fn counts(results: &[ExperimentResult], f: impl Fn(&ExperimentResult) -> u64) -> ArrayRef {
    Arc::new(UInt64Array::from(results.iter().map(f).collect::<Vec<_>>()))
}

fn floats(results: &[ExperimentResult], f: impl Fn(&ExperimentResult) -> f64) -> ArrayRef {
    Arc::new(Float64Array::from(results.iter().map(f).collect::<Vec<_>>()))
}

fn optional_floats(
    results: &[ExperimentResult],
    f: impl Fn(&ExperimentResult) -> Option<f64>,
) -> ArrayRef {
    Arc::new(Float64Array::from(results.iter().map(f).collect::<Vec<_>>()))
}

fn build_arrays(results: &[ExperimentResult]) -> Vec<ArrayRef> {
    vec![
        strings(results, |r| r.experiment_id.as_str()),
        counts(results, |r| r.run_id as u64),
        counts(results, |r| r.seed),
        strings(results, |r| r.encounter_model.as_str()),
        strings(results, |r| r.author_policy.as_str()),
        counts(results, |r| r.population as u64),
        counts(results, |r| r.adversaries as u64),
        counts(results, |r| r.static_jammers as u64),
        counts(results, |r| r.mobile_jammers as u64),
        floats(results, |r| r.neighborhood_radius),
        floats(results, |r| r.jamming_radius),
        floats(results, |r| r.encounter_chance),
        counts(results, |r| r.final_reach as u64),
        floats(results, |r| r.reach_fraction),
        optional_floats(results, |r| r.time_to_half_reach),
        optional_floats(results, |r| r.time_to_full_reach),
        counts(results, |r| r.record_count as u64),
        floats(results, |r| r.duration_secs),
        counts(results, |r| r.encounters),
    ]
}
