use bevy_ecs::prelude::{Query, Res, ResMut};

use crate::agents::Person;
use crate::clock::SimulationClock;
use crate::ecs::Position;
use crate::measurer::PropagationMeasurer;
use crate::telemetry::{build_snapshot, EncounterStats, SimSnapshotConfig, SimSnapshots};

pub fn capture_snapshot_system(
    clock: Res<SimulationClock>,
    config: Res<SimSnapshotConfig>,
    mut snapshots: ResMut<SimSnapshots>,
    measurer: Option<Res<PropagationMeasurer>>,
    stats: Option<Res<EncounterStats>>,
    people: Query<(&Person, Option<&Position>)>,
) {
    let now = clock.now();
    if !snapshots.due(now, &config) {
        return;
    }
    let tracked = measurer.and_then(|m| m.tracked());
    let encounters = stats.map_or(0, |s| s.encounters);
    let snapshot = build_snapshot(now, tracked, encounters, people.iter());
    snapshots.push(snapshot, &config);
}
