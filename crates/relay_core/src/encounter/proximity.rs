use rand::rngs::StdRng;

use super::{EncounterModel, EncounterModelKind, PopulationView};
use crate::agents::AgentId;
use crate::distributions::chance;

pub const DEFAULT_NEIGHBORHOOD_RADIUS: f64 = 20.0;
pub const DEFAULT_ENCOUNTER_CHANCE: f64 = 0.05;

/// Radius-based encounters on the arena plane.
///
/// Every positioned, unjammed agent (ascending id) looks up neighbors within
/// `radius`; each unjammed neighbor other than itself costs one uniform draw
/// and yields an encounter when the draw is below `encounter_chance`. A pair
/// of mutual neighbors therefore gets two chances per tick, one from each side.
#[derive(Debug, Clone)]
pub struct ProximityGridModel {
    pub radius: f64,
    pub encounter_chance: f64,
}

impl Default for ProximityGridModel {
    fn default() -> Self {
        Self {
            radius: DEFAULT_NEIGHBORHOOD_RADIUS,
            encounter_chance: DEFAULT_ENCOUNTER_CHANCE,
        }
    }
}

impl ProximityGridModel {
    pub fn new(radius: f64, encounter_chance: f64) -> Self {
        Self {
            radius,
            encounter_chance,
        }
    }
}

impl EncounterModel for ProximityGridModel {
    fn kind(&self) -> EncounterModelKind {
        EncounterModelKind::ProximityGrid
    }

    fn tick(&self, view: &PopulationView<'_>, rng: &mut StdRng) -> Vec<(AgentId, AgentId)> {
        let mut pairs = Vec::new();
        for &id in view.agents {
            let Some(location) = view.grid.position(id) else {
                continue;
            };
            if view.is_jammed(id) {
                continue;
            }
            for neighbor in view.grid.neighbors_within(&location, self.radius) {
                if neighbor == id || view.is_jammed(neighbor) {
                    continue;
                }
                if chance(rng, self.encounter_chance) {
                    pairs.push((id, neighbor));
                }
            }
        }
        pairs
    }
}
