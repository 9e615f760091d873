pub mod agents;
pub mod clock;
pub mod distributions;
pub mod ecs;
pub mod encounter;
pub mod error;
pub mod measurer;
pub mod message;
pub mod queue;
pub mod runner;
pub mod scenario;
pub mod social;
pub mod spatial;
pub mod systems;
pub mod telemetry;
pub mod telemetry_export;
pub mod traces;
pub mod trust;

#[cfg(feature = "test-helpers")]
pub mod test_helpers;
