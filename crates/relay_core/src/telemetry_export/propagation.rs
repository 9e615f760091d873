use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, UInt64Array};
use arrow::datatypes::Schema;

use crate::measurer::PropagationRecord;

use super::utils::{f64_field, u64_field, write_record_batch};

/// One row per propagation point: `time`, `count`.
pub fn write_propagation_parquet<P: AsRef<Path>>(
    path: P,
    records: &[PropagationRecord],
) -> Result<(), Box<dyn Error>> {
    let time: Vec<f64> = records.iter().map(|r| r.time).collect();
    let count: Vec<u64> = records.iter().map(|r| r.count as u64).collect();

    let schema = Schema::new(vec![f64_field("time"), u64_field("count")]);
    let arrays: Vec<ArrayRef> = vec![
        Arc::new(Float64Array::from(time)),
        Arc::new(UInt64Array::from(count)),
    ];

    write_record_batch(path, schema, arrays)
}
