//! Scenario setup: population, social graph, jammers and the initial event
//! schedule, all derived from one [SimulationConfig] and seeded generator.

mod build;
mod params;

pub use build::{build_scenario, create_encounter_model};
pub use params::{
    GraphSource, JammingConfig, RandomWalkConfig, ScenarioInputs, SimulationConfig,
    DEFAULT_MAX_RUNTIME_HOURS,
};
