//! Example: how adversaries and author choice affect message reach.
//!
//! Runs a grid of random-walk proximity scenarios in parallel, prints the
//! mean reach per combination and exports every run to CSV.
//!
//! Run with: cargo run -p relay_experiments --example parameter_sweep --release

use std::collections::BTreeMap;

use relay_core::measurer::AuthorPolicy;
use relay_core::scenario::{RandomWalkConfig, SimulationConfig};
use relay_experiments::{export_to_csv, run_parallel_experiments, ParameterSpace};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let base = SimulationConfig::default()
        .with_arena(1_000.0, 1_000.0)
        .with_proximity(25.0, 0.1)
        .with_random_walk(RandomWalkConfig {
            steps: 500,
            interval: 1_000.0,
            step_scale: 10.0,
        });

    let space = ParameterSpace::grid()
        .with_base(base)
        .num_people(vec![100, 200])
        .num_adversaries(vec![0, 10, 40])
        .authors(vec![AuthorPolicy::Popular, AuthorPolicy::Unpopular])
        .seeds(vec![1, 2, 3]);

    let parameter_sets = space.generate();
    println!("Running {} simulations...", parameter_sets.len());
    let results = run_parallel_experiments(parameter_sets, None)?;
    println!("Completed {} simulations", results.len());

    let mut by_experiment: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for result in &results {
        by_experiment
            .entry(result.experiment_id.as_str())
            .or_default()
            .push(result.reach_fraction);
    }

    println!(
        "\n{:<8} {:>7} {:>12} {:>10} {:>11}",
        "exp", "people", "adversaries", "author", "mean reach"
    );
    for (id, fractions) in &by_experiment {
        let Some(first) = results.iter().find(|r| r.experiment_id == *id) else {
            continue;
        };
        let mean = fractions.iter().sum::<f64>() / fractions.len() as f64;
        println!(
            "{:<8} {:>7} {:>12} {:>10} {:>10.1}%",
            id,
            first.population,
            first.adversaries,
            first.author_policy,
            mean * 100.0
        );
    }

    export_to_csv(&results, "relay_sweep_results.csv")?;
    println!("\nExported to relay_sweep_results.csv");
    Ok(())
}
