//! Measure action: authors the tracked message on first use, then samples
//! how many agents hold it and stops the clock once the run is done.

use bevy_ecs::prelude::{Query, Res, ResMut};

use crate::agents::Person;
use crate::clock::{CurrentAction, SimulationClock};
use crate::ecs::{AgentDirectory, SimRng};
use crate::measurer::{select_author, PropagationMeasurer};
use crate::message::{ContentIdAllocator, Message};
use crate::social::SocialGraph;

/// Priority the author assigns to the tracked message.
pub const AUTHORED_PRIORITY: f64 = 1.0;

#[allow(clippy::too_many_arguments)]
pub fn measure_system(
    current: Res<CurrentAction>,
    mut clock: ResMut<SimulationClock>,
    mut measurer: ResMut<PropagationMeasurer>,
    mut content_ids: ResMut<ContentIdAllocator>,
    mut rng: ResMut<SimRng>,
    graph: Res<SocialGraph>,
    directory: Res<AgentDirectory>,
    mut people: Query<&mut Person>,
) {
    if measurer.needs_author() {
        let author = select_author(
            measurer.author_policy,
            &graph,
            |id| {
                directory
                    .entity(id)
                    .and_then(|entity| people.get(entity).ok())
                    .is_some_and(|person| person.is_adversary())
            },
            &mut rng.0,
        );
        let content = content_ids.next_id();
        if let Some(mut person) = author
            .and_then(|id| directory.entity(id))
            .and_then(|entity| people.get_mut(entity).ok())
        {
            person.add_message(Message::new(content, AUTHORED_PRIORITY));
        }
        measurer.mark_authored(content, author);
    }

    let holders = measurer.tracked().map_or(0, |content| {
        people
            .iter()
            .filter(|person| person.queue.has_content(content))
            .count()
    });
    if measurer.observe(current.timestamp, holders) {
        clock.cancel_all();
    }
}
