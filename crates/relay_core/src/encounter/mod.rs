//! Encounter models: strategies deciding which agent pairs exchange messages.
//!
//! - **ProximityGrid**: agents within a radius of each other on the plane, filtered by jamming
//! - **NaivePairwise**: every unordered pair with a fixed probability (small populations only)
//! - **TraceReplay**: recorded encounters replayed at their start times
//!
//! Exactly one model is active per run. Models are stateless between ticks;
//! all randomness comes from the generator passed to [EncounterModel::tick].

mod jamming;
mod naive;
mod proximity;
mod trace_replay;

use std::collections::BTreeSet;
use std::ops::Deref;

use bevy_ecs::prelude::Resource;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::agents::AgentId;
use crate::spatial::SpatialGrid;

pub use jamming::{JammingField, DEFAULT_JAMMING_RADIUS};
pub use naive::NaivePairwiseModel;
pub use proximity::{ProximityGridModel, DEFAULT_ENCOUNTER_CHANCE, DEFAULT_NEIGHBORHOOD_RADIUS};
pub use trace_replay::{
    subsample_records, validate_records, TraceReplayModel, DEFAULT_TRACE_ENCOUNTER_CHANCE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EncounterModelKind {
    #[default]
    ProximityGrid,
    TraceReplay,
    NaivePairwise,
}

impl EncounterModelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EncounterModelKind::ProximityGrid => "proximity",
            EncounterModelKind::TraceReplay => "trace",
            EncounterModelKind::NaivePairwise => "naive",
        }
    }
}

/// Read-only view of the population handed to a model tick.
#[derive(Debug)]
pub struct PopulationView<'a> {
    /// Every live agent, ascending.
    pub agents: &'a [AgentId],
    pub grid: &'a SpatialGrid,
    /// Agents excluded from this tick by jamming.
    pub jammed: BTreeSet<AgentId>,
}

impl<'a> PopulationView<'a> {
    pub fn new(
        agents: &'a [AgentId],
        grid: &'a SpatialGrid,
        mobile_jammers: &[AgentId],
        jamming: &JammingField,
    ) -> Self {
        let jammed = jamming.jammed_agents(agents, grid, mobile_jammers);
        Self {
            agents,
            grid,
            jammed,
        }
    }

    /// A view with no jamming at all.
    pub fn unjammed(agents: &'a [AgentId], grid: &'a SpatialGrid) -> Self {
        Self {
            agents,
            grid,
            jammed: BTreeSet::new(),
        }
    }

    pub fn is_jammed(&self, id: AgentId) -> bool {
        self.jammed.contains(&id)
    }
}

pub trait EncounterModel: Send + Sync + std::fmt::Debug {
    fn kind(&self) -> EncounterModelKind;

    /// Pairs that encounter during this tick, in the order they must run.
    /// The first element of each pair initiates the exchange.
    fn tick(&self, view: &PopulationView<'_>, rng: &mut StdRng) -> Vec<(AgentId, AgentId)>;
}

/// Resource wrapper for the active encounter model.
#[derive(Resource)]
pub struct EncounterModelResource(pub Box<dyn EncounterModel>);

impl Deref for EncounterModelResource {
    type Target = dyn EncounterModel;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}
