//! Encounter tick: asks the active model which pairs meet and runs each
//! exchange in the order the model returned them.

use bevy_ecs::prelude::{Query, Res, ResMut};
use rand::rngs::StdRng;
use tracing::debug;

use crate::agents::{AgentId, ExchangeContext, Person, ReceiveSummary};
use crate::ecs::{AgentDirectory, SimRng};
use crate::encounter::{EncounterModelResource, JammingField, PopulationView};
use crate::social::SocialGraph;
use crate::spatial::SpatialGrid;
use crate::telemetry::EncounterStats;
use crate::trust::TrustParams;

/// Runs one symmetric exchange between `first` and `second`.
/// Returns `None` when either agent is gone or both ids are the same.
pub(crate) fn exchange(
    first: AgentId,
    second: AgentId,
    directory: &AgentDirectory,
    people: &mut Query<&mut Person>,
    ctx: &mut ExchangeContext<'_, StdRng>,
) -> Option<(ReceiveSummary, ReceiveSummary)> {
    if first == second {
        return None;
    }
    let a = directory.entity(first)?;
    let b = directory.entity(second)?;
    let [mut initiator, mut other] = people.get_many_mut([a, b]).ok()?;
    Some(initiator.encounter(&mut other, ctx))
}

#[allow(clippy::too_many_arguments)]
pub fn encounter_tick_system(
    model: Res<EncounterModelResource>,
    grid: Res<SpatialGrid>,
    jamming: Res<JammingField>,
    directory: Res<AgentDirectory>,
    graph: Res<SocialGraph>,
    trust: Res<TrustParams>,
    mut rng: ResMut<SimRng>,
    mut stats: ResMut<EncounterStats>,
    mut people: Query<&mut Person>,
) {
    let agents: Vec<AgentId> = directory.ids().collect();
    let mobile_jammers: Vec<AgentId> = if jamming.mobile {
        directory
            .iter()
            .filter(|(_, entity)| {
                people
                    .get(*entity)
                    .is_ok_and(|person| person.trust_policy.is_jammer())
            })
            .map(|(id, _)| id)
            .collect()
    } else {
        Vec::new()
    };

    let view = PopulationView::new(&agents, &grid, &mobile_jammers, &jamming);
    let pairs = model.tick(&view, &mut rng.0);
    stats.ticks += 1;
    stats.jammed_agent_ticks += view.jammed.len() as u64;
    if !pairs.is_empty() {
        debug!(pairs = pairs.len(), jammed = view.jammed.len(), "encounter tick");
    }

    let mut ctx = ExchangeContext {
        graph: &graph,
        trust: &trust,
        rng: &mut rng.0,
    };
    for (first, second) in pairs {
        if let Some((to_first, to_second)) =
            exchange(first, second, &directory, &mut people, &mut ctx)
        {
            stats.record_exchange(to_first, to_second);
        }
    }
}
