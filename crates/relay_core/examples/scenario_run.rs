//! Run a random-walk proximity scenario and print the propagation curve.
//!
//! Run with: cargo run -p relay_core --example scenario_run

use relay_core::runner::run_simulation_with_world;
use relay_core::scenario::{JammingConfig, RandomWalkConfig, ScenarioInputs, SimulationConfig};
use relay_core::telemetry::EncounterStats;

fn main() {
    const NUM_PEOPLE: usize = 300;
    const NUM_ADVERSARIES: usize = 30;

    let config = SimulationConfig::default()
        .with_seed(123)
        .with_people(NUM_PEOPLE)
        .with_adversaries(NUM_ADVERSARIES)
        .with_arena(2_000.0, 2_000.0)
        .with_proximity(20.0, 0.05)
        .with_random_walk(RandomWalkConfig {
            steps: 2_000,
            interval: 1_000.0,
            step_scale: 10.0,
        })
        .with_jamming(JammingConfig {
            static_jammers: 5,
            ..Default::default()
        });

    let (world, output) = match run_simulation_with_world(&config, ScenarioInputs::default()) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("scenario failed: {err}");
            std::process::exit(1);
        }
    };
    let stats = world.resource::<EncounterStats>();

    println!(
        "--- Scenario run ({} people, {} adversaries, seed {}) ---",
        output.number_of_people, output.number_of_adversaries, output.seed
    );
    println!("Author: {:?}", output.author);
    println!("Encounters: {} over {} ticks", stats.encounters, stats.ticks);
    println!(
        "Reach: {} / {} after {:.1} min",
        output.final_reach(),
        output.number_of_people,
        output.minutes_duration
    );

    println!("\nPropagation curve:");
    for record in &output.propagation_data {
        println!("  t={:>10.0}  holders={}", record.time, record.count);
    }
}
