use rand::rngs::StdRng;

use super::{EncounterModel, EncounterModelKind, PopulationView};
use crate::agents::AgentId;
use crate::distributions::chance;

/// Every unordered pair meets with probability `encounter_chance` per tick.
/// Positions and jamming are ignored. O(n²) per tick; meant for small
/// populations and tests.
#[derive(Debug, Clone)]
pub struct NaivePairwiseModel {
    pub encounter_chance: f64,
}

impl Default for NaivePairwiseModel {
    fn default() -> Self {
        Self {
            encounter_chance: 0.05,
        }
    }
}

impl EncounterModel for NaivePairwiseModel {
    fn kind(&self) -> EncounterModelKind {
        EncounterModelKind::NaivePairwise
    }

    fn tick(&self, view: &PopulationView<'_>, rng: &mut StdRng) -> Vec<(AgentId, AgentId)> {
        let mut pairs = Vec::new();
        for (i, &a) in view.agents.iter().enumerate() {
            for &b in &view.agents[i + 1..] {
                if chance(rng, self.encounter_chance) {
                    pairs.push((a, b));
                }
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::SpatialGrid;
    use rand::SeedableRng;

    #[test]
    fn certain_chance_yields_every_unordered_pair_once() {
        let grid = SpatialGrid::for_radius(1.0);
        let agents = [1, 2, 3];
        let view = PopulationView::unjammed(&agents, &grid);
        let mut rng = StdRng::seed_from_u64(0);
        let model = NaivePairwiseModel {
            encounter_chance: 1.0,
        };
        assert_eq!(model.tick(&view, &mut rng), vec![(1, 2), (1, 3), (2, 3)]);
    }

    #[test]
    fn pair_rate_tracks_chance() {
        let grid = SpatialGrid::for_radius(1.0);
        let agents: Vec<AgentId> = (0..50).collect();
        let view = PopulationView::unjammed(&agents, &grid);
        let mut rng = StdRng::seed_from_u64(4);
        let pairs = NaivePairwiseModel::default().tick(&view, &mut rng);
        // 1225 pairs at 5%: expect about 61.
        assert!((30..100).contains(&pairs.len()), "got {}", pairs.len());
    }
}
