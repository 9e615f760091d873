use std::collections::BTreeMap;

use bevy_ecs::prelude::{Component, Entity, Resource};
use rand::rngs::StdRng;

use crate::agents::AgentId;
use crate::spatial::Point;

/// Current position of an agent on the arena plane. Agents without this
/// component are invisible to the proximity model.
#[derive(Debug, Clone, Copy, PartialEq, Component)]
pub struct Position(pub Point);

/// Time-ordered mobility points; each `MovePerson` action advances `next` by one.
#[derive(Debug, Clone, Default, Component)]
pub struct MobilitySchedule {
    pub points: Vec<(f64, Point)>,
    pub next: usize,
}

impl MobilitySchedule {
    /// Sorts points by time; equal times keep their input order.
    pub fn new(mut points: Vec<(f64, Point)>) -> Self {
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { points, next: 0 }
    }

    pub fn advance(&mut self) -> Option<Point> {
        let point = self.points.get(self.next).map(|(_, p)| *p)?;
        self.next += 1;
        Some(point)
    }

    pub fn is_exhausted(&self) -> bool {
        self.next >= self.points.len()
    }
}

/// The run's single random generator. Every stochastic decision draws from it.
#[derive(Debug, Resource)]
pub struct SimRng(pub StdRng);

/// Agent id → entity lookup with deterministic (ascending id) iteration.
#[derive(Debug, Clone, Default, Resource)]
pub struct AgentDirectory {
    entities: BTreeMap<AgentId, Entity>,
}

impl AgentDirectory {
    pub fn insert(&mut self, id: AgentId, entity: Entity) {
        self.entities.insert(id, entity);
    }

    pub fn remove(&mut self, id: AgentId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    pub fn entity(&self, id: AgentId) -> Option<Entity> {
        self.entities.get(&id).copied()
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.entities.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AgentId, Entity)> + '_ {
        self.entities.iter().map(|(id, e)| (*id, *e))
    }
}
