//! Keeps the [SpatialGrid] in step with agent positions.

use bevy_ecs::prelude::{Changed, Query, ResMut};

use crate::agents::Person;
use crate::ecs::Position;
use crate::spatial::SpatialGrid;

/// Re-buckets agents whose position changed since the last run.
pub fn update_spatial_index_system(
    grid: Option<ResMut<SpatialGrid>>,
    moved: Query<(&Person, &Position), Changed<Position>>,
) {
    let Some(mut grid) = grid else {
        return;
    };
    if moved.is_empty() {
        return;
    }
    for (person, position) in moved.iter() {
        grid.update(person.id, position.0);
    }
}
