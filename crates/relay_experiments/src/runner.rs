//! Parallel simulation execution using rayon.
//!
//! Every run builds its own world from its own config and seed, so runs
//! share nothing and may execute in any order.

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use rayon::ThreadPoolBuildError;
use relay_core::error::SimResult;
use relay_core::runner::run_simulation_with_world;
use relay_core::scenario::ScenarioInputs;
use tracing::warn;

use crate::metrics::{extract_metrics, ExperimentResult};
use crate::parameters::ParameterSet;

/// Runs one parameter set to completion against `inputs`.
pub fn run_single_simulation_with_inputs(
    param_set: &ParameterSet,
    inputs: ScenarioInputs,
) -> SimResult<ExperimentResult> {
    let config = param_set.simulation_config();
    let (world, output) = run_simulation_with_world(&config, inputs)?;
    Ok(extract_metrics(param_set, &world, &output))
}

/// Runs one parameter set with generated data only.
pub fn run_single_simulation(param_set: &ParameterSet) -> SimResult<ExperimentResult> {
    run_single_simulation_with_inputs(param_set, ScenarioInputs::default())
}

/// Runs every parameter set in parallel with a progress bar.
///
/// Results come back in input order. Runs that fail are logged and left
/// out; each result carries its own experiment id.
pub fn run_parallel_experiments(
    parameter_sets: Vec<ParameterSet>,
    num_threads: Option<usize>,
) -> Result<Vec<ExperimentResult>, ThreadPoolBuildError> {
    run_parallel_experiments_with_progress(
        parameter_sets,
        &ScenarioInputs::default(),
        num_threads,
        true,
    )
}

/// Like [run_parallel_experiments], sharing `inputs` between runs and with
/// the progress bar optional.
pub fn run_parallel_experiments_with_progress(
    parameter_sets: Vec<ParameterSet>,
    inputs: &ScenarioInputs,
    num_threads: Option<usize>,
    show_progress: bool,
) -> Result<Vec<ExperimentResult>, ThreadPoolBuildError> {
    let total = parameter_sets.len();
    let pb = if show_progress && total > 0 {
        let bar = ProgressBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        bar.set_style(style);
        Some(bar)
    } else {
        None
    };

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = num_threads {
        builder = builder.num_threads(threads);
    }
    let pool = builder.build()?;

    let pb_clone = pb.clone();
    let results: Vec<Option<ExperimentResult>> = pool.install(|| {
        parameter_sets
            .par_iter()
            .map(|param_set| {
                let result = run_single_simulation_with_inputs(param_set, inputs.clone());
                if let Some(ref progress_bar) = pb_clone {
                    progress_bar.inc(1);
                }
                match result {
                    Ok(metrics) => Some(metrics),
                    Err(err) => {
                        warn!(
                            experiment = %param_set.experiment_id,
                            run = param_set.run_id,
                            error = %err,
                            "simulation failed"
                        );
                        None
                    }
                }
            })
            .collect()
    });

    if let Some(ref progress_bar) = pb {
        progress_bar.finish_with_message("Completed");
    }

    Ok(results.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::ParameterSpace;
    use relay_core::test_helpers::small_proximity_config;

    #[test]
    fn single_simulation_reports_its_population() {
        let sets = ParameterSpace::grid()
            .with_base(small_proximity_config(1))
            .generate();
        let result = run_single_simulation(&sets[0]).expect("run");
        assert_eq!(result.population, 20);
        assert!(result.final_reach >= 1);
        assert!(result.reach_fraction > 0.0 && result.reach_fraction <= 1.0);
        assert_eq!(result.seed, sets[0].seed);
    }

    #[test]
    fn parallel_results_keep_input_order() {
        let sets = ParameterSpace::grid()
            .with_base(small_proximity_config(1))
            .num_people(vec![10, 15])
            .seeds(vec![3, 4])
            .generate();
        let results =
            run_parallel_experiments_with_progress(sets, &ScenarioInputs::default(), Some(2), false)
                .expect("thread pool");

        assert_eq!(results.len(), 4);
        let ids: Vec<(&str, u64, usize)> = results
            .iter()
            .map(|r| (r.experiment_id.as_str(), r.seed, r.population))
            .collect();
        assert_eq!(
            ids,
            vec![("exp_0", 3, 10), ("exp_0", 4, 10), ("exp_1", 3, 15), ("exp_1", 4, 15)]
        );
    }

    #[test]
    fn failing_runs_are_left_out() {
        // Proximity without any mobility leaves nobody to simulate.
        let sets = ParameterSpace::grid().num_people(vec![5]).generate();
        let results =
            run_parallel_experiments_with_progress(sets, &ScenarioInputs::default(), Some(1), false)
                .expect("thread pool");
        assert!(results.is_empty());
    }
}
