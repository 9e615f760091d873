//! Replays one recorded encounter. Jamming does not apply to recorded contacts.

use bevy_ecs::prelude::{Query, Res, ResMut};
use tracing::debug;

use super::encounter_tick::exchange;
use crate::agents::{ExchangeContext, Person};
use crate::clock::{Action, CurrentAction};
use crate::ecs::{AgentDirectory, SimRng};
use crate::social::SocialGraph;
use crate::telemetry::EncounterStats;
use crate::trust::TrustParams;

pub fn trace_encounter_system(
    current: Res<CurrentAction>,
    directory: Res<AgentDirectory>,
    graph: Res<SocialGraph>,
    trust: Res<TrustParams>,
    mut rng: ResMut<SimRng>,
    mut stats: ResMut<EncounterStats>,
    mut people: Query<&mut Person>,
) {
    let Action::TraceEncounter(first, second) = current.action else {
        return;
    };
    let mut ctx = ExchangeContext {
        graph: &graph,
        trust: &trust,
        rng: &mut rng.0,
    };
    match exchange(first, second, &directory, &mut people, &mut ctx) {
        Some((to_first, to_second)) => {
            stats.trace_encounters += 1;
            stats.record_exchange(to_first, to_second);
        }
        None => debug!(first, second, "recorded encounter skipped"),
    }
}
