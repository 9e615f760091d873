pub mod encounter_tick;
pub mod measurer;
pub mod movement;
pub mod spatial_index;
pub mod telemetry_snapshot;
pub mod trace_encounter;
