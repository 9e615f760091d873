//! Metrics extraction from finished simulation runs.

use bevy_ecs::prelude::World;
use relay_core::telemetry::{EncounterStats, ScenarioSummary, SimulationOutput};
use serde::Serialize;

use crate::parameters::ParameterSet;

/// Outcome of one run, flat enough for CSV and parquet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperimentResult {
    pub experiment_id: String,
    pub run_id: usize,
    pub seed: u64,
    pub encounter_model: String,
    pub author_policy: String,
    /// Live population after pruning, not the configured head count.
    pub population: usize,
    pub adversaries: usize,
    pub static_jammers: usize,
    pub mobile_jammers: usize,
    pub neighborhood_radius: f64,
    pub jamming_radius: f64,
    pub encounter_chance: f64,
    pub final_reach: usize,
    /// `final_reach / population`.
    pub reach_fraction: f64,
    /// First time at least half the population held the message.
    pub time_to_half_reach: Option<f64>,
    pub time_to_full_reach: Option<f64>,
    pub record_count: usize,
    pub duration_secs: f64,
    pub encounters: u64,
}

/// Builds the result row for `param_set` from its finished world.
pub fn extract_metrics(
    param_set: &ParameterSet,
    world: &World,
    output: &SimulationOutput,
) -> ExperimentResult {
    let summary = world.get_resource::<ScenarioSummary>();
    let encounters = world
        .get_resource::<EncounterStats>()
        .map_or(0, |stats| stats.encounters);
    let population = output.number_of_people;
    let final_reach = output.final_reach();
    let reach_fraction = if population == 0 {
        0.0
    } else {
        final_reach as f64 / population as f64
    };

    ExperimentResult {
        experiment_id: param_set.experiment_id.clone(),
        run_id: param_set.run_id,
        seed: output.seed,
        encounter_model: output.encounter_model.to_string(),
        author_policy: output.author_policy.to_string(),
        population,
        adversaries: output.number_of_adversaries,
        static_jammers: summary.map_or(0, |s| s.static_jammers),
        mobile_jammers: summary.map_or(0, |s| s.mobile_jammers),
        neighborhood_radius: output.neighborhood_radius,
        jamming_radius: output.jamming_radius,
        encounter_chance: output.encounter_chance,
        final_reach,
        reach_fraction,
        time_to_half_reach: output.time_to_reach(population.div_ceil(2)),
        time_to_full_reach: output.time_to_reach(population),
        record_count: output.propagation_data.len(),
        duration_secs: output.duration,
        encounters,
    }
}
