use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Float64Array, UInt32Array, UInt64Array, UInt8Array};
use arrow::datatypes::Schema;

use crate::telemetry::SimSnapshots;

use super::utils::{
    bool_field, f64_field, nullable_f64_field, trust_policy_code, u32_field, u64_field, u8_field,
    write_record_batch,
};

pub fn write_snapshot_counts_parquet<P: AsRef<Path>>(
    path: P,
    snapshots: &SimSnapshots,
) -> Result<(), Box<dyn Error>> {
    let n = snapshots.snapshots.len();
    let mut timestamp = Vec::with_capacity(n);
    let mut agents = Vec::with_capacity(n);
    let mut positioned = Vec::with_capacity(n);
    let mut adversaries = Vec::with_capacity(n);
    let mut holders = Vec::with_capacity(n);
    let mut queued_messages = Vec::with_capacity(n);
    let mut encounters = Vec::with_capacity(n);

    for snapshot in &snapshots.snapshots {
        timestamp.push(snapshot.timestamp);
        agents.push(snapshot.counts.agents as u64);
        positioned.push(snapshot.counts.positioned as u64);
        adversaries.push(snapshot.counts.adversaries as u64);
        holders.push(snapshot.counts.holders as u64);
        queued_messages.push(snapshot.counts.queued_messages as u64);
        encounters.push(snapshot.counts.encounters);
    }

    let schema = Schema::new(vec![
        f64_field("timestamp"),
        u64_field("agents"),
        u64_field("positioned"),
        u64_field("adversaries"),
        u64_field("holders"),
        u64_field("queued_messages"),
        u64_field("encounters"),
    ]);

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(Float64Array::from(timestamp)),
        Arc::new(UInt64Array::from(agents)),
        Arc::new(UInt64Array::from(positioned)),
        Arc::new(UInt64Array::from(adversaries)),
        Arc::new(UInt64Array::from(holders)),
        Arc::new(UInt64Array::from(queued_messages)),
        Arc::new(UInt64Array::from(encounters)),
    ];

    write_record_batch(path, schema, arrays)
}

/// One row per agent per snapshot. Unpositioned agents have null coordinates.
pub fn write_agent_snapshots_parquet<P: AsRef<Path>>(
    path: P,
    snapshots: &SimSnapshots,
) -> Result<(), Box<dyn Error>> {
    let mut timestamp = Vec::new();
    let mut agent = Vec::new();
    let mut policy = Vec::new();
    let mut x = Vec::new();
    let mut y = Vec::new();
    let mut queue_len = Vec::new();
    let mut holds_tracked = Vec::new();

    for snapshot in &snapshots.snapshots {
        for a in &snapshot.agents {
            timestamp.push(snapshot.timestamp);
            agent.push(a.id);
            policy.push(trust_policy_code(a.trust_policy));
            x.push(a.position.map(|p| p.x));
            y.push(a.position.map(|p| p.y));
            queue_len.push(a.queue_len as u64);
            holds_tracked.push(a.holds_tracked);
        }
    }

    let schema = Schema::new(vec![
        f64_field("timestamp"),
        u32_field("agent"),
        u8_field("trust_policy"),
        nullable_f64_field("x"),
        nullable_f64_field("y"),
        u64_field("queue_len"),
        bool_field("holds_tracked"),
    ]);

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(Float64Array::from(timestamp)),
        Arc::new(UInt32Array::from(agent)),
        Arc::new(UInt8Array::from(policy)),
        Arc::new(Float64Array::from(x)),
        Arc::new(Float64Array::from(y)),
        Arc::new(UInt64Array::from(queue_len)),
        Arc::new(BooleanArray::from(holds_tracked)),
    ];

    write_record_batch(path, schema, arrays)
}
