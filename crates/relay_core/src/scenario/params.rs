use serde::{Deserialize, Serialize};

use crate::agents::AgentId;
use crate::encounter::EncounterModelKind;
use crate::error::{SimError, SimResult};
use crate::measurer::{AuthorPolicy, TimeUnit};
use crate::queue::DEFAULT_QUEUE_CAPACITY;
use crate::spatial::{Arena, GeoProjection, Point};
use crate::traces::{EncounterRecord, MobilityPoint, SocialEdge};
use crate::trust::{TrustParams, TrustPolicy};

/// Runtime cap in hours of trace time; 0 disables it.
pub const DEFAULT_MAX_RUNTIME_HOURS: f64 = 150.0;

/// Where the social graph comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphSource {
    /// `num_people` nodes wired by preferential attachment.
    #[default]
    ScaleFree,
    /// `num_people` nodes, each linked to `edges_per_node` random others.
    Random { edges_per_node: usize },
    /// Nodes and edges from [ScenarioInputs::social_edges].
    Loaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JammingConfig {
    /// Fixed jammer locations to place in the arena.
    pub static_jammers: usize,
    /// Adversaries promoted to moving jammers.
    pub mobile_jammers: usize,
    pub radius: f64,
    /// Place static jammers at [ScenarioInputs::jammer_locations] instead of
    /// uniformly at random.
    pub optimal_placement: bool,
}

impl Default for JammingConfig {
    fn default() -> Self {
        Self {
            static_jammers: 0,
            mobile_jammers: 0,
            radius: crate::encounter::DEFAULT_JAMMING_RADIUS,
            optimal_placement: false,
        }
    }
}

/// Synthetic mobility for proximity runs without traces: each agent starts
/// at a uniform point and takes `steps` lattice steps of up to two
/// `step_scale` units per axis, one every `interval`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RandomWalkConfig {
    pub steps: usize,
    pub interval: f64,
    pub step_scale: f64,
}

impl Default for RandomWalkConfig {
    fn default() -> Self {
        Self {
            steps: 1_000,
            interval: 1_000.0,
            step_scale: 10.0,
        }
    }
}

/// Everything that shapes one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub num_people: usize,
    pub num_adversaries: usize,
    pub queue_capacity: usize,
    /// Fill each queue with random-priority filler messages at setup.
    pub prefill_queues: bool,
    pub author: AuthorPolicy,
    pub default_trust_policy: TrustPolicy,
    pub encounter_model: EncounterModelKind,
    pub neighborhood_radius: f64,
    pub encounter_chance: f64,
    pub trace_encounter_chance: f64,
    pub naive_encounter_chance: f64,
    /// Spacing of naive-model ticks, in clock units.
    pub tick_interval: f64,
    pub tick_count: usize,
    pub jamming: JammingConfig,
    pub arena: Arena,
    pub projection: GeoProjection,
    /// Remove agents with any mobility point outside the arena.
    pub drop_out_of_bounds: bool,
    /// Used when the proximity model gets no mobility input.
    pub random_walk: Option<RandomWalkConfig>,
    pub trust: TrustParams,
    pub seed: Option<u64>,
    pub max_runtime_hours: f64,
    pub time_unit: TimeUnit,
    pub graph_source: GraphSource,
    /// Snapshot spacing in clock units; `None` means hourly.
    pub snapshot_interval: Option<f64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_people: 100,
            num_adversaries: 0,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            prefill_queues: true,
            author: AuthorPolicy::default(),
            default_trust_policy: TrustPolicy::default(),
            encounter_model: EncounterModelKind::default(),
            neighborhood_radius: crate::encounter::DEFAULT_NEIGHBORHOOD_RADIUS,
            encounter_chance: crate::encounter::DEFAULT_ENCOUNTER_CHANCE,
            trace_encounter_chance: crate::encounter::DEFAULT_TRACE_ENCOUNTER_CHANCE,
            naive_encounter_chance: crate::encounter::DEFAULT_ENCOUNTER_CHANCE,
            tick_interval: 1.0,
            tick_count: 100,
            jamming: JammingConfig::default(),
            arena: Arena::default(),
            projection: GeoProjection::default(),
            drop_out_of_bounds: false,
            random_walk: None,
            trust: TrustParams::default(),
            seed: None,
            max_runtime_hours: DEFAULT_MAX_RUNTIME_HOURS,
            time_unit: TimeUnit::default(),
            graph_source: GraphSource::default(),
            snapshot_interval: None,
        }
    }
}

impl SimulationConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_people(mut self, people: usize) -> Self {
        self.num_people = people;
        self
    }

    pub fn with_adversaries(mut self, adversaries: usize) -> Self {
        self.num_adversaries = adversaries;
        self
    }

    pub fn with_author(mut self, author: AuthorPolicy) -> Self {
        self.author = author;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_encounter_model(mut self, model: EncounterModelKind) -> Self {
        self.encounter_model = model;
        self
    }

    /// Proximity neighborhood radius and per-neighbor encounter chance.
    pub fn with_proximity(mut self, radius: f64, chance: f64) -> Self {
        self.neighborhood_radius = radius;
        self.encounter_chance = chance;
        self
    }

    /// Naive model: `count` ticks every `interval`, pairs meeting with `chance`.
    pub fn with_naive_ticks(mut self, count: usize, interval: f64, chance: f64) -> Self {
        self.tick_count = count;
        self.tick_interval = interval;
        self.naive_encounter_chance = chance;
        self
    }

    pub fn with_trace_encounter_chance(mut self, chance: f64) -> Self {
        self.trace_encounter_chance = chance;
        self
    }

    pub fn with_jamming(mut self, jamming: JammingConfig) -> Self {
        self.jamming = jamming;
        self
    }

    pub fn with_arena(mut self, width: f64, height: f64) -> Self {
        self.arena = Arena { width, height };
        self
    }

    pub fn with_random_walk(mut self, walk: RandomWalkConfig) -> Self {
        self.random_walk = Some(walk);
        self
    }

    pub fn with_graph_source(mut self, source: GraphSource) -> Self {
        self.graph_source = source;
        self
    }

    pub fn with_time_unit(mut self, unit: TimeUnit) -> Self {
        self.time_unit = unit;
        self
    }

    pub fn with_max_runtime_hours(mut self, hours: f64) -> Self {
        self.max_runtime_hours = hours;
        self
    }

    pub fn with_trust_policy(mut self, policy: TrustPolicy) -> Self {
        self.default_trust_policy = policy;
        self
    }

    /// Encounter probability of the selected model.
    pub fn active_encounter_chance(&self) -> f64 {
        match self.encounter_model {
            EncounterModelKind::ProximityGrid => self.encounter_chance,
            EncounterModelKind::TraceReplay => self.trace_encounter_chance,
            EncounterModelKind::NaivePairwise => self.naive_encounter_chance,
        }
    }

    pub fn validate(&self) -> SimResult<()> {
        if AgentId::try_from(self.num_people).is_err() {
            return Err(invalid(format!(
                "num_people must be at most {}, got {}",
                AgentId::MAX,
                self.num_people
            )));
        }
        if self.queue_capacity == 0 {
            return Err(invalid("queue_capacity must be at least 1"));
        }
        for (name, p) in [
            ("encounter_chance", self.encounter_chance),
            ("trace_encounter_chance", self.trace_encounter_chance),
            ("naive_encounter_chance", self.naive_encounter_chance),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(invalid(format!("{name} must be within [0, 1], got {p}")));
            }
        }
        for (name, r) in [
            ("neighborhood_radius", self.neighborhood_radius),
            ("jamming.radius", self.jamming.radius),
        ] {
            if !positive(r) {
                return Err(invalid(format!("{name} must be positive, got {r}")));
            }
        }
        let naive = self.encounter_model == EncounterModelKind::NaivePairwise;
        if naive && !positive(self.tick_interval) {
            return Err(invalid("tick_interval must be positive"));
        }
        if !(positive(self.arena.width) && positive(self.arena.height)) {
            return Err(invalid("arena dimensions must be positive"));
        }
        if let Some(walk) = &self.random_walk {
            if !positive(walk.interval) {
                return Err(invalid("random_walk.interval must be positive"));
            }
        }
        if matches!(self.snapshot_interval, Some(i) if !positive(i)) {
            return Err(invalid("snapshot_interval must be positive"));
        }
        if self.default_trust_policy.is_adversary() {
            return Err(invalid("default_trust_policy must be an honest policy"));
        }
        Ok(())
    }
}

fn positive(value: f64) -> bool {
    value > 0.0 && value.is_finite()
}

fn invalid(message: impl Into<String>) -> SimError {
    SimError::InvalidConfig(message.into())
}

/// Data handed to the scenario builder. Every field may be empty.
#[derive(Debug, Clone, Default)]
pub struct ScenarioInputs {
    pub social_edges: Vec<SocialEdge>,
    pub mobility: Vec<MobilityPoint>,
    pub encounters: Vec<EncounterRecord>,
    /// Pre-computed static jammer placement; `None` when unavailable.
    pub jammer_locations: Option<Vec<Point>>,
}

impl ScenarioInputs {
    pub fn with_social_edges(mut self, edges: Vec<SocialEdge>) -> Self {
        self.social_edges = edges;
        self
    }

    pub fn with_mobility(mut self, mobility: Vec<MobilityPoint>) -> Self {
        self.mobility = mobility;
        self
    }

    pub fn with_encounters(mut self, encounters: Vec<EncounterRecord>) -> Self {
        self.encounters = encounters;
        self
    }

    pub fn with_jammer_locations(mut self, locations: Vec<Point>) -> Self {
        self.jammer_locations = Some(locations);
        self
    }
}
