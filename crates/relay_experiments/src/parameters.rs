//! Parameter variation framework for exploring the relay parameter space.
//!
//! A [ParameterSpace] lists the values to try per dimension on top of a base
//! [SimulationConfig]. Grid search takes the Cartesian product; random
//! sampling draws one value per dimension.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use relay_core::measurer::AuthorPolicy;
use relay_core::scenario::SimulationConfig;
use tracing::debug;

/// One simulation to run: a config plus experiment metadata.
#[derive(Debug, Clone)]
pub struct ParameterSet {
    pub config: SimulationConfig,
    /// Shared by every run of the same parameter combination.
    pub experiment_id: String,
    /// Index of the seed within the experiment.
    pub run_id: usize,
    pub seed: u64,
}

impl ParameterSet {
    pub fn new(config: SimulationConfig, experiment_id: String, run_id: usize, seed: u64) -> Self {
        Self {
            config,
            experiment_id,
            run_id,
            seed,
        }
    }

    /// The config with this run's seed applied.
    pub fn simulation_config(&self) -> SimulationConfig {
        self.config.clone().with_seed(self.seed)
    }
}

/// Values to explore per dimension. An empty dimension keeps the base value.
#[derive(Debug, Clone, Default)]
pub struct ParameterSpace {
    base: SimulationConfig,
    num_people: Vec<usize>,
    num_adversaries: Vec<usize>,
    authors: Vec<AuthorPolicy>,
    static_jammers: Vec<usize>,
    mobile_jammers: Vec<usize>,
    neighborhood_radii: Vec<f64>,
    jamming_radii: Vec<f64>,
    encounter_chances: Vec<f64>,
    seeds: Vec<u64>,
}

fn expand<T: Copy>(
    configs: Vec<SimulationConfig>,
    values: &[T],
    apply: impl Fn(&mut SimulationConfig, T),
) -> Vec<SimulationConfig> {
    if values.is_empty() {
        return configs;
    }
    let mut expanded = Vec::with_capacity(configs.len() * values.len());
    for config in configs {
        for &value in values {
            let mut next = config.clone();
            apply(&mut next, value);
            expanded.push(next);
        }
    }
    expanded
}

/// Mobile jammers are promoted adversaries, so asking for more jammers than
/// adversaries is not a distinct experiment.
fn is_valid_combination(config: &SimulationConfig) -> bool {
    config.jamming.mobile_jammers <= config.num_adversaries
        && config.num_adversaries <= config.num_people
        && config.validate().is_ok()
}

fn derived_seed(experiment: usize) -> u64 {
    (experiment as u64).wrapping_mul(0x9e37_79b9)
}

impl ParameterSpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Alias of [ParameterSpace::new] that reads well at call sites.
    pub fn grid() -> Self {
        Self::new()
    }

    pub fn with_base(mut self, base: SimulationConfig) -> Self {
        self.base = base;
        self
    }

    pub fn num_people(mut self, counts: Vec<usize>) -> Self {
        self.num_people = counts;
        self
    }

    pub fn num_adversaries(mut self, counts: Vec<usize>) -> Self {
        self.num_adversaries = counts;
        self
    }

    pub fn authors(mut self, policies: Vec<AuthorPolicy>) -> Self {
        self.authors = policies;
        self
    }

    pub fn static_jammers(mut self, counts: Vec<usize>) -> Self {
        self.static_jammers = counts;
        self
    }

    pub fn mobile_jammers(mut self, counts: Vec<usize>) -> Self {
        self.mobile_jammers = counts;
        self
    }

    pub fn neighborhood_radius(mut self, radii: Vec<f64>) -> Self {
        self.neighborhood_radii = radii;
        self
    }

    pub fn jamming_radius(mut self, radii: Vec<f64>) -> Self {
        self.jamming_radii = radii;
        self
    }

    pub fn encounter_chance(mut self, chances: Vec<f64>) -> Self {
        self.encounter_chances = chances;
        self
    }

    /// Seeds to repeat every combination with. Without seeds each
    /// combination runs once with a seed derived from its index.
    pub fn seeds(mut self, seeds: Vec<u64>) -> Self {
        self.seeds = seeds;
        self
    }

    fn combinations(&self) -> Vec<SimulationConfig> {
        let configs = vec![self.base.clone()];
        let configs = expand(configs, &self.num_people, |c, v| c.num_people = v);
        let configs = expand(configs, &self.num_adversaries, |c, v| c.num_adversaries = v);
        let configs = expand(configs, &self.authors, |c, v| c.author = v);
        let configs = expand(configs, &self.static_jammers, |c, v| {
            c.jamming.static_jammers = v
        });
        let configs = expand(configs, &self.mobile_jammers, |c, v| {
            c.jamming.mobile_jammers = v
        });
        let configs = expand(configs, &self.neighborhood_radii, |c, v| {
            c.neighborhood_radius = v
        });
        let configs = expand(configs, &self.jamming_radii, |c, v| c.jamming.radius = v);
        expand(configs, &self.encounter_chances, |c, v| {
            c.encounter_chance = v;
            c.trace_encounter_chance = v;
            c.naive_encounter_chance = v;
        })
    }

    /// Grid search: every valid combination, once per seed.
    pub fn generate(&self) -> Vec<ParameterSet> {
        let combinations = self.combinations();
        let total = combinations.len();
        let valid: Vec<SimulationConfig> = combinations
            .into_iter()
            .filter(is_valid_combination)
            .collect();
        if valid.len() < total {
            debug!(
                discarded = total - valid.len(),
                "dropped invalid parameter combinations"
            );
        }

        valid
            .into_iter()
            .enumerate()
            .flat_map(|(experiment, config)| {
                let experiment_id = format!("exp_{experiment}");
                let seeds = if self.seeds.is_empty() {
                    vec![derived_seed(experiment)]
                } else {
                    self.seeds.clone()
                };
                seeds
                    .into_iter()
                    .enumerate()
                    .map(move |(run_id, seed)| {
                        ParameterSet::new(config.clone(), experiment_id.clone(), run_id, seed)
                    })
            })
            .collect()
    }

    /// Monte Carlo sampling: up to `count` distinct valid combinations, one
    /// run each.
    pub fn sample_random(&self, count: usize, seed: u64) -> Vec<ParameterSet> {
        const MAX_ATTEMPTS: usize = 10_000;

        fn pick<T: Copy, R: Rng>(rng: &mut R, values: &[T], fallback: T) -> T {
            if values.is_empty() {
                fallback
            } else {
                values[rng.gen_range(0..values.len())]
            }
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut seen = HashSet::new();
        let mut sets = Vec::new();
        let mut attempts = 0;

        while sets.len() < count && attempts < MAX_ATTEMPTS {
            attempts += 1;
            let base = &self.base;
            let mut config = base.clone();
            config.num_people = pick(&mut rng, &self.num_people, base.num_people);
            config.num_adversaries = pick(&mut rng, &self.num_adversaries, base.num_adversaries);
            config.author = pick(&mut rng, &self.authors, base.author);
            config.jamming.static_jammers =
                pick(&mut rng, &self.static_jammers, base.jamming.static_jammers);
            config.jamming.mobile_jammers =
                pick(&mut rng, &self.mobile_jammers, base.jamming.mobile_jammers);
            config.neighborhood_radius =
                pick(&mut rng, &self.neighborhood_radii, base.neighborhood_radius);
            config.jamming.radius = pick(&mut rng, &self.jamming_radii, base.jamming.radius);
            let chance = pick(&mut rng, &self.encounter_chances, base.encounter_chance);
            config.encounter_chance = chance;
            if !self.encounter_chances.is_empty() {
                config.trace_encounter_chance = chance;
                config.naive_encounter_chance = chance;
            }
            let run_seed = pick(&mut rng, &self.seeds, derived_seed(sets.len()));

            if !is_valid_combination(&config) {
                continue;
            }
            // serde_json gives a stable identity for float-bearing configs.
            let key = match serde_json::to_string(&config) {
                Ok(json) => format!("{json}#{run_seed}"),
                Err(_) => continue,
            };
            if !seen.insert(key) {
                continue;
            }
            let experiment_id = format!("sample_{}", sets.len());
            sets.push(ParameterSet::new(config, experiment_id, 0, run_seed));
        }
        sets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_is_the_cartesian_product() {
        let sets = ParameterSpace::grid()
            .num_people(vec![50, 100])
            .num_adversaries(vec![0, 5])
            .authors(vec![AuthorPolicy::Random, AuthorPolicy::Popular])
            .generate();
        assert_eq!(sets.len(), 8);
        assert_eq!(sets[0].experiment_id, "exp_0");
        assert_eq!(sets[7].config.num_people, 100);
        assert_eq!(sets[7].config.num_adversaries, 5);
        assert_eq!(sets[7].config.author, AuthorPolicy::Popular);
    }

    #[test]
    fn seeds_repeat_each_combination() {
        let sets = ParameterSpace::grid()
            .num_people(vec![10, 20])
            .seeds(vec![1, 2, 3])
            .generate();
        assert_eq!(sets.len(), 6);
        assert_eq!(sets[2].experiment_id, "exp_0");
        assert_eq!(sets[2].run_id, 2);
        assert_eq!(sets[3].experiment_id, "exp_1");
        assert_eq!(sets[3].simulation_config().seed, Some(1));
    }

    #[test]
    fn more_mobile_jammers_than_adversaries_is_dropped() {
        let sets = ParameterSpace::grid()
            .num_adversaries(vec![1, 4])
            .mobile_jammers(vec![0, 2])
            .generate();
        let pairs: Vec<(usize, usize)> = sets
            .iter()
            .map(|s| (s.config.num_adversaries, s.config.jamming.mobile_jammers))
            .collect();
        assert_eq!(pairs, vec![(1, 0), (4, 0), (4, 2)]);
    }

    #[test]
    fn encounter_chance_applies_to_every_model() {
        let sets = ParameterSpace::grid().encounter_chance(vec![0.2]).generate();
        assert_eq!(sets.len(), 1);
        let config = &sets[0].config;
        assert_eq!(config.encounter_chance, 0.2);
        assert_eq!(config.trace_encounter_chance, 0.2);
        assert_eq!(config.naive_encounter_chance, 0.2);
    }

    #[test]
    fn random_sampling_is_distinct_and_reproducible() {
        let space = ParameterSpace::grid()
            .num_people(vec![10, 20, 30])
            .num_adversaries(vec![0, 1]);
        let first = space.sample_random(4, 9);
        let second = space.sample_random(4, 9);
        assert_eq!(first.len(), 4);
        let configs = |sets: &[ParameterSet]| {
            sets.iter()
                .map(|s| (s.config.num_people, s.config.num_adversaries, s.seed))
                .collect::<Vec<_>>()
        };
        assert_eq!(configs(&first), configs(&second));
    }
}
