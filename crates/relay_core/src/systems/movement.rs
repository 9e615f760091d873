//! Movement system: steps an agent to the next point of its mobility schedule.

use bevy_ecs::prelude::{Query, Res};
use tracing::debug;

use crate::clock::{Action, CurrentAction};
use crate::ecs::{AgentDirectory, MobilitySchedule, Position};

pub fn movement_system(
    current: Res<CurrentAction>,
    directory: Res<AgentDirectory>,
    mut movers: Query<(&mut MobilitySchedule, &mut Position)>,
) {
    let Action::MovePerson(id) = current.action else {
        return;
    };
    let Some(entity) = directory.entity(id) else {
        debug!(agent = id, "move for unknown agent");
        return;
    };
    let Ok((mut schedule, mut position)) = movers.get_mut(entity) else {
        return;
    };
    if let Some(next) = schedule.advance() {
        position.0 = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::{Schedule, World};

    use crate::spatial::Point;

    #[test]
    fn each_move_takes_the_next_point() {
        let mut world = World::new();
        let entity = world
            .spawn((
                MobilitySchedule::new(vec![
                    (5.0, Point::new(1.0, 1.0)),
                    (1.0, Point::new(0.0, 0.0)),
                ]),
                Position(Point::new(0.0, 0.0)),
            ))
            .id();
        let mut directory = AgentDirectory::default();
        directory.insert(3, entity);
        world.insert_resource(directory);

        let mut schedule = Schedule::default();
        schedule.add_systems(movement_system);
        for (expected, cursor) in [(Point::new(0.0, 0.0), 1), (Point::new(1.0, 1.0), 2)] {
            world.insert_resource(CurrentAction {
                timestamp: 0.0,
                action: Action::MovePerson(3),
            });
            schedule.run(&mut world);
            assert_eq!(world.get::<Position>(entity).map(|p| p.0), Some(expected));
            assert_eq!(world.get::<MobilitySchedule>(entity).map(|s| s.next), Some(cursor));
        }

        // Exhausted schedules leave the agent where it is.
        schedule.run(&mut world);
        assert_eq!(
            world.get::<Position>(entity).map(|p| p.0),
            Some(Point::new(1.0, 1.0))
        );
    }
}
