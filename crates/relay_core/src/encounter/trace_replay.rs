use rand::rngs::StdRng;
use rand::Rng;
use tracing::info;

use super::{EncounterModel, EncounterModelKind, PopulationView};
use crate::agents::AgentId;
use crate::distributions::chance;
use crate::error::{SimError, SimResult};
use crate::social::SocialGraph;
use crate::traces::EncounterRecord;

pub const DEFAULT_TRACE_ENCOUNTER_CHANCE: f64 = 0.1;

/// Replays recorded encounters. Records are subsampled once at setup and
/// each kept record becomes its own scheduled `TraceEncounter` action, so the
/// per-tick hook has nothing to do.
#[derive(Debug, Clone)]
pub struct TraceReplayModel {
    pub encounter_chance: f64,
}

impl Default for TraceReplayModel {
    fn default() -> Self {
        Self {
            encounter_chance: DEFAULT_TRACE_ENCOUNTER_CHANCE,
        }
    }
}

impl EncounterModel for TraceReplayModel {
    fn kind(&self) -> EncounterModelKind {
        EncounterModelKind::TraceReplay
    }

    fn tick(&self, _view: &PopulationView<'_>, _rng: &mut StdRng) -> Vec<(AgentId, AgentId)> {
        Vec::new()
    }
}

/// Fails on the first record naming an agent the graph does not know.
pub fn validate_records(records: &[EncounterRecord], graph: &SocialGraph) -> SimResult<()> {
    for record in records {
        for id in [record.first, record.second] {
            if !graph.contains(id) {
                return Err(SimError::UnknownAgent(id));
            }
        }
    }
    Ok(())
}

/// Keeps each record with probability `keep_chance`, one draw per record in
/// input order. Self-encounters are dropped without a draw.
pub fn subsample_records<R: Rng + ?Sized>(
    records: &[EncounterRecord],
    keep_chance: f64,
    rng: &mut R,
) -> Vec<EncounterRecord> {
    let kept: Vec<EncounterRecord> = records
        .iter()
        .filter(|r| r.first != r.second)
        .filter(|_| chance(&mut *rng, keep_chance))
        .cloned()
        .collect();
    info!(
        total = records.len(),
        kept = kept.len(),
        "subsampled encounter trace"
    );
    kept
}
