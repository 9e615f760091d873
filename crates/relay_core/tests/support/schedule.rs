#![allow(dead_code)]

use bevy_ecs::prelude::World;
use bevy_ecs::schedule::Schedule;
use relay_core::clock::{ActionKind, Event};
use relay_core::runner::{run_next_event, run_until_empty_with_hook, simulation_schedule};
use relay_core::telemetry::SimulationOutput;

/// Owns the simulation schedule so tests can step a built world or drain it.
pub struct ScheduleRunner {
    schedule: Schedule,
}

impl Default for ScheduleRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ScheduleRunner {
    pub fn new() -> Self {
        Self {
            schedule: simulation_schedule(),
        }
    }

    /// Runs one event; `false` once the clock is drained or cancelled.
    pub fn run_one(&mut self, world: &mut World) -> bool {
        run_next_event(world, &mut self.schedule)
    }

    /// Drains the clock, recording the kind and time of every popped event.
    pub fn run_recording(&mut self, world: &mut World) -> Vec<(f64, ActionKind)> {
        let mut seen = Vec::new();
        run_until_empty_with_hook(world, &mut self.schedule, usize::MAX, |_, event: &Event| {
            seen.push((event.timestamp, event.action.kind()));
        });
        seen
    }

    /// Drains the clock and returns the run's output.
    pub fn run_full(&mut self, world: &mut World) -> SimulationOutput {
        self.run_recording(world);
        SimulationOutput::from_world(world).expect("world was built by build_scenario")
    }
}
