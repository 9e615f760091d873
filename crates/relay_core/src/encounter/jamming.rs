use std::collections::BTreeSet;

use bevy_ecs::prelude::Resource;

use crate::agents::AgentId;
use crate::spatial::{Point, SpatialGrid};

pub const DEFAULT_JAMMING_RADIUS: f64 = 50.0;

/// Where jamming applies during a tick.
///
/// Mobile jamming silences every positioned agent within `radius` of an
/// adversary-jammer (inclusive, jammers included). Static jamming silences
/// agents strictly closer than `radius` to a fixed jammer location. Both
/// modes may be active at once.
#[derive(Debug, Clone, Resource)]
pub struct JammingField {
    pub radius: f64,
    pub mobile: bool,
    pub static_locations: Vec<Point>,
}

impl Default for JammingField {
    fn default() -> Self {
        Self {
            radius: DEFAULT_JAMMING_RADIUS,
            mobile: false,
            static_locations: Vec::new(),
        }
    }
}

impl JammingField {
    pub fn is_active(&self) -> bool {
        self.mobile || !self.static_locations.is_empty()
    }

    pub fn statically_jammed(&self, point: &Point) -> bool {
        self.static_locations
            .iter()
            .any(|jammer| jammer.distance(point) < self.radius)
    }

    /// Positioned agents silenced for the current tick.
    pub fn jammed_agents(
        &self,
        agents: &[AgentId],
        grid: &SpatialGrid,
        mobile_jammers: &[AgentId],
    ) -> BTreeSet<AgentId> {
        let mut jammed = BTreeSet::new();
        if !self.is_active() {
            return jammed;
        }
        for &id in agents {
            let Some(point) = grid.position(id) else {
                continue;
            };
            let mobile_hit =
                self.mobile && grid.any_within(&point, self.radius, mobile_jammers.iter());
            if mobile_hit || self.statically_jammed(&point) {
                jammed.insert(id);
            }
        }
        jammed
    }
}
