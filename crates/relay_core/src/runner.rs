//! Simulation runner: advances the clock and routes actions into the ECS.
//!
//! Clock progression and action routing happen here, outside systems. Each
//! step pops the next event from [SimulationClock], expands a
//! [Action::Sequence] into its leaves, and for every leaf inserts a
//! [CurrentAction] and runs the schedule once. A leaf that cancels the clock
//! only drops pending events: the rest of its sequence still runs, and the
//! next step finds the clock empty.

use bevy_ecs::prelude::{Res, Schedule, World};
use bevy_ecs::schedule::IntoSystemConfigs;

use crate::clock::{ActionKind, CurrentAction, Event, SimulationClock};
use crate::error::SimResult;
use crate::scenario::{build_scenario, ScenarioInputs, SimulationConfig};
use crate::systems::{
    encounter_tick::encounter_tick_system, measurer::measure_system,
    movement::movement_system, spatial_index::update_spatial_index_system,
    telemetry_snapshot::capture_snapshot_system, trace_encounter::trace_encounter_system,
};
use crate::telemetry::{SimSnapshotConfig, SimSnapshots, SimulationOutput};

fn action_is(action: Option<Res<CurrentAction>>, kind: ActionKind) -> bool {
    action.map(|a| a.action.kind() == kind).unwrap_or(false)
}

fn is_move_person(action: Option<Res<CurrentAction>>) -> bool {
    action_is(action, ActionKind::MovePerson)
}

fn is_measure(action: Option<Res<CurrentAction>>) -> bool {
    action_is(action, ActionKind::Measure)
}

fn is_encounter_tick(action: Option<Res<CurrentAction>>) -> bool {
    action_is(action, ActionKind::EncounterTick)
}

fn is_trace_encounter(action: Option<Res<CurrentAction>>) -> bool {
    action_is(action, ActionKind::TraceEncounter)
}

/// Condition: telemetry snapshot interval has elapsed.
fn should_capture_snapshot(
    clock: Option<Res<SimulationClock>>,
    config: Option<Res<SimSnapshotConfig>>,
    snapshots: Option<Res<SimSnapshots>>,
) -> bool {
    let (Some(clock), Some(config), Some(snapshots)) = (clock, config, snapshots) else {
        return false;
    };
    snapshots.due(clock.now(), &config)
}

fn run_event(world: &mut World, schedule: &mut Schedule, event: &Event) {
    let mut leaves = Vec::new();
    event.action.clone().flatten_into(&mut leaves);
    for action in leaves {
        world.insert_resource(CurrentAction {
            timestamp: event.timestamp,
            action,
        });
        schedule.run(world);
    }
}

/// Runs one simulation step. Returns `false` once the clock is drained or cancelled.
pub fn run_next_event(world: &mut World, schedule: &mut Schedule) -> bool {
    run_next_event_with_hook(world, schedule, |_, _| {})
}

/// Runs one simulation step and invokes `hook` after every leaf has run.
pub fn run_next_event_with_hook<F>(world: &mut World, schedule: &mut Schedule, mut hook: F) -> bool
where
    F: FnMut(&World, &Event),
{
    let Some(event) = world.resource_mut::<SimulationClock>().pop_next() else {
        return false;
    };
    run_event(world, schedule, &event);
    hook(world, &event);
    true
}

/// Runs simulation steps until the event queue is empty or `max_steps` is reached.
/// Returns the number of steps executed.
pub fn run_until_empty(world: &mut World, schedule: &mut Schedule, max_steps: usize) -> usize {
    run_until_empty_with_hook(world, schedule, max_steps, |_, _| {})
}

/// Runs simulation steps until empty and invokes `hook` after each step.
pub fn run_until_empty_with_hook<F>(
    world: &mut World,
    schedule: &mut Schedule,
    max_steps: usize,
    mut hook: F,
) -> usize
where
    F: FnMut(&World, &Event),
{
    let mut steps = 0;
    while steps < max_steps && run_next_event_with_hook(world, schedule, &mut hook) {
        steps += 1;
    }
    steps
}

/// Builds the simulation schedule. Systems are chained so that one leaf
/// action sees the effects of the previous system: movement, then index
/// sync, then the action handlers, then the snapshot.
pub fn simulation_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            movement_system.run_if(is_move_person),
            update_spatial_index_system,
            measure_system.run_if(is_measure),
            encounter_tick_system.run_if(is_encounter_tick),
            trace_encounter_system.run_if(is_trace_encounter),
            capture_snapshot_system.run_if(should_capture_snapshot),
        )
            .chain(),
    );
    schedule
}

/// Builds a world for `config`, runs it to completion and returns the world
/// with its output.
pub fn run_simulation_with_world(
    config: &SimulationConfig,
    inputs: ScenarioInputs,
) -> SimResult<(World, SimulationOutput)> {
    let mut world = World::new();
    build_scenario(&mut world, config, inputs)?;
    let mut schedule = simulation_schedule();
    run_until_empty(&mut world, &mut schedule, usize::MAX);
    let output = SimulationOutput::new(world.resource(), world.resource());
    Ok((world, output))
}

/// Runs one simulation and returns only its output.
pub fn run_simulation(
    config: &SimulationConfig,
    inputs: ScenarioInputs,
) -> SimResult<SimulationOutput> {
    run_simulation_with_world(config, inputs).map(|(_, output)| output)
}
