//! Test helpers for common test setup and utilities.
//!
//! This module provides shared test utilities to reduce duplication across test files.

use bevy_ecs::prelude::{Entity, World};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::agents::{AgentId, Person};
use crate::clock::SimulationClock;
use crate::ecs::{AgentDirectory, Position, SimRng};
use crate::encounter::{EncounterModelResource, JammingField, ProximityGridModel};
use crate::measurer::{AuthorPolicy, PropagationMeasurer, TimeUnit};
use crate::message::ContentIdAllocator;
use crate::scenario::{RandomWalkConfig, SimulationConfig};
use crate::social::SocialGraph;
use crate::spatial::{Point, SpatialGrid};
use crate::telemetry::{EncounterStats, SimSnapshotConfig, SimSnapshots};
use crate::trust::{TrustParams, TrustPolicy};

/// Seed used by tests that do not care about the exact value.
pub const TEST_SEED: u64 = 42;

/// Small proximity scenario: a handful of random walkers in a tight arena so
/// encounters actually happen within a few hundred steps.
pub fn small_proximity_config(seed: u64) -> SimulationConfig {
    SimulationConfig::default()
        .with_seed(seed)
        .with_people(20)
        .with_arena(60.0, 60.0)
        .with_proximity(20.0, 0.3)
        .with_random_walk(RandomWalkConfig {
            steps: 200,
            interval: 1_000.0,
            step_scale: 5.0,
        })
        .with_max_runtime_hours(0.0)
}

/// Create a basic test world with essential resources and no agents.
///
/// Uses a certain-encounter proximity model with a 20 m radius. For
/// full scenarios, use [crate::scenario::build_scenario].
pub fn create_test_world() -> World {
    let mut world = World::new();
    world.insert_resource(SimulationClock::default());
    world.insert_resource(SimRng(StdRng::seed_from_u64(TEST_SEED)));
    world.insert_resource(ContentIdAllocator::default());
    world.insert_resource(SocialGraph::new());
    world.insert_resource(AgentDirectory::default());
    world.insert_resource(SpatialGrid::for_radius(20.0));
    world.insert_resource(JammingField::default());
    world.insert_resource(EncounterModelResource(Box::new(ProximityGridModel::new(
        20.0, 1.0,
    ))));
    world.insert_resource(TrustParams::default());
    world.insert_resource(PropagationMeasurer::new(
        AuthorPolicy::Random,
        0,
        0.0,
        TimeUnit::Seconds,
    ));
    world.insert_resource(EncounterStats::default());
    world.insert_resource(SimSnapshotConfig::default());
    world.insert_resource(SimSnapshots::default());
    world
}

/// Spawns a person with an empty queue of capacity 5, registers it with the
/// directory and graph, and places it on the grid when `position` is given.
pub fn spawn_person(
    world: &mut World,
    id: AgentId,
    policy: TrustPolicy,
    position: Option<Point>,
) -> Entity {
    let mut entity = world.spawn(Person::new(id, policy, 5));
    if let Some(point) = position {
        entity.insert(Position(point));
    }
    let entity = entity.id();
    world.resource_mut::<AgentDirectory>().insert(id, entity);
    world.resource_mut::<SocialGraph>().add_node(id);
    if let Some(point) = position {
        world.resource_mut::<SpatialGrid>().update(id, point);
    }
    entity
}

/// Re-creates the measurer so its population matches the spawned agents.
pub fn reset_measurer(world: &mut World, author: AuthorPolicy) {
    let population = world.resource::<AgentDirectory>().len();
    world.insert_resource(PropagationMeasurer::new(
        author,
        population,
        0.0,
        TimeUnit::Seconds,
    ));
}
