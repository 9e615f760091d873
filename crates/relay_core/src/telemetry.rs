//! Telemetry: run output, exchange counters and a rolling population view.

use std::collections::VecDeque;

use bevy_ecs::prelude::{Resource, World};
use serde::ser::Serializer;
use serde::Serialize;

use crate::agents::{AgentId, Person, ReceiveSummary};
use crate::clock::SimulationClock;
use crate::ecs::Position;
use crate::measurer::{PropagationMeasurer, PropagationRecord, TimeUnit};
use crate::message::ContentId;
use crate::spatial::Point;
use crate::trust::TrustPolicy;

const MILLISECONDS_PER_SECOND: f64 = 1000.0;
const SECONDS_PER_MINUTE: f64 = 60.0;
const MINUTES_PER_HOUR: f64 = 60.0;
const HOURS_PER_DAY: f64 = 24.0;

/// Above this `maxTimeSeen` the trace is assumed to be in epoch milliseconds.
pub const MILLISECOND_EPOCH_THRESHOLD: f64 = 139_967_902_300.0;

/// Counters over every exchange in the run.
#[derive(Debug, Clone, Copy, Default, Resource, Serialize)]
pub struct EncounterStats {
    pub ticks: u64,
    pub encounters: u64,
    pub trace_encounters: u64,
    pub jammed_agent_ticks: u64,
    pub messages_offered: u64,
    pub messages_accepted: u64,
    pub messages_evicted: u64,
}

impl EncounterStats {
    pub fn record_exchange(&mut self, first: ReceiveSummary, second: ReceiveSummary) {
        self.encounters += 1;
        for side in [first, second] {
            self.messages_offered += side.offered as u64;
            self.messages_accepted += side.accepted as u64;
            self.messages_evicted += side.evicted as u64;
        }
    }
}

/// Fixed facts about the built scenario, reported alongside the results.
#[derive(Debug, Clone, Resource, Serialize)]
pub struct ScenarioSummary {
    pub seed: u64,
    pub population: usize,
    pub adversaries: usize,
    pub mobile_jammers: usize,
    pub static_jammers: usize,
    pub neighborhood_radius: f64,
    pub encounter_chance: f64,
    pub jamming_radius: f64,
    pub encounter_model: &'static str,
    pub author_policy: &'static str,
    pub time_unit: TimeUnit,
}

/// Result document of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationOutput {
    /// Time to holder count, ascending by time. Keys are written as strings.
    #[serde(rename = "propagationData", serialize_with = "propagation_as_map")]
    pub propagation_data: Vec<PropagationRecord>,
    #[serde(rename = "minTimeSeen")]
    pub min_time_seen: f64,
    #[serde(rename = "maxTimeSeen")]
    pub max_time_seen: f64,
    #[serde(rename = "NUMBER_OF_PEOPLE")]
    pub number_of_people: usize,
    #[serde(rename = "NEIGHBORHOOD_RADIUS")]
    pub neighborhood_radius: f64,
    #[serde(rename = "ENCOUNTER_CHANCE")]
    pub encounter_chance: f64,
    #[serde(rename = "NUMBER_OF_ADVERSARIES")]
    pub number_of_adversaries: usize,
    #[serde(rename = "JAMMING_RADIUS")]
    pub jamming_radius: f64,
    pub priority: f64,
    /// Seconds between the first and last nonzero measurement.
    pub duration: f64,
    #[serde(rename = "minutesDuration")]
    pub minutes_duration: f64,
    #[serde(rename = "hoursDuration")]
    pub hours_duration: f64,
    #[serde(rename = "daysDuration")]
    pub days_duration: f64,
    pub seed: u64,
    pub author: Option<AgentId>,
    #[serde(rename = "authorPolicy")]
    pub author_policy: &'static str,
    #[serde(rename = "encounterModel")]
    pub encounter_model: &'static str,
}

fn propagation_as_map<S: Serializer>(
    records: &[PropagationRecord],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(records.iter().map(|r| (r.time.to_string(), r.count)))
}

/// Span in seconds between two measurement times, guessing the unit from
/// the magnitude of `max`.
pub fn duration_seconds(min: f64, max: f64) -> f64 {
    if max > MILLISECOND_EPOCH_THRESHOLD {
        (max - min) / MILLISECONDS_PER_SECOND
    } else {
        max - min
    }
}

impl SimulationOutput {
    pub fn new(measurer: &PropagationMeasurer, summary: &ScenarioSummary) -> Self {
        let min = measurer.min_time_seen();
        let max = measurer.max_time_seen();
        let duration = duration_seconds(min, max);
        let minutes = duration / SECONDS_PER_MINUTE;
        let hours = minutes / MINUTES_PER_HOUR;
        Self {
            propagation_data: measurer.records().to_vec(),
            min_time_seen: min,
            max_time_seen: max,
            number_of_people: summary.population,
            neighborhood_radius: summary.neighborhood_radius,
            encounter_chance: summary.encounter_chance,
            number_of_adversaries: summary.adversaries,
            jamming_radius: summary.jamming_radius,
            priority: 1.0,
            duration,
            minutes_duration: minutes,
            hours_duration: hours,
            days_duration: hours / HOURS_PER_DAY,
            seed: summary.seed,
            author: measurer.author(),
            author_policy: summary.author_policy,
            encounter_model: summary.encounter_model,
        }
    }

    /// Builds the output from a finished world.
    pub fn from_world(world: &World) -> Option<Self> {
        let measurer = world.get_resource::<PropagationMeasurer>()?;
        let summary = world.get_resource::<ScenarioSummary>()?;
        Some(Self::new(measurer, summary))
    }

    /// Holder count at the end of the run.
    pub fn final_reach(&self) -> usize {
        self.propagation_data.last().map_or(0, |r| r.count)
    }

    /// First time the holder count reached `count`, if it ever did.
    pub fn time_to_reach(&self, count: usize) -> Option<f64> {
        self.propagation_data
            .iter()
            .find(|r| r.count >= count)
            .map(|r| r.time)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// One agent as seen by a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub position: Option<Point>,
    pub trust_policy: TrustPolicy,
    pub queue_len: usize,
    pub holds_tracked: bool,
}

/// Aggregated counts at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimCounts {
    pub agents: usize,
    pub positioned: usize,
    pub adversaries: usize,
    pub holders: usize,
    pub queued_messages: usize,
    pub encounters: u64,
}

impl SimCounts {
    pub fn add_agent(&mut self, agent: &AgentSnapshot) {
        self.agents += 1;
        if agent.position.is_some() {
            self.positioned += 1;
        }
        if agent.trust_policy.is_adversary() {
            self.adversaries += 1;
        }
        if agent.holds_tracked {
            self.holders += 1;
        }
        self.queued_messages += agent.queue_len;
    }
}

#[derive(Debug, Clone)]
pub struct SimSnapshot {
    pub timestamp: f64,
    pub counts: SimCounts,
    pub agents: Vec<AgentSnapshot>,
}

/// Snapshot capture configuration. `interval` is in clock units.
#[derive(Debug, Clone, Copy, Resource)]
pub struct SimSnapshotConfig {
    pub interval: f64,
    pub max_snapshots: usize,
}

impl SimSnapshotConfig {
    pub fn hourly(unit: TimeUnit) -> Self {
        Self {
            interval: unit.per_hour(),
            ..Default::default()
        }
    }
}

impl Default for SimSnapshotConfig {
    fn default() -> Self {
        Self {
            interval: TimeUnit::Milliseconds.per_hour(),
            max_snapshots: 1_000,
        }
    }
}

/// Rolling snapshot buffer.
#[derive(Debug, Default, Resource)]
pub struct SimSnapshots {
    pub snapshots: VecDeque<SimSnapshot>,
    pub last_snapshot_at: Option<f64>,
}

impl SimSnapshots {
    pub fn due(&self, now: f64, config: &SimSnapshotConfig) -> bool {
        match self.last_snapshot_at {
            None => true,
            Some(last) => now - last >= config.interval,
        }
    }

    pub fn push(&mut self, snapshot: SimSnapshot, config: &SimSnapshotConfig) {
        self.last_snapshot_at = Some(snapshot.timestamp);
        self.snapshots.push_back(snapshot);
        while self.snapshots.len() > config.max_snapshots {
            self.snapshots.pop_front();
        }
    }
}

/// Assembles a snapshot from agents in any order; the result is sorted by id.
pub fn build_snapshot<'a>(
    timestamp: f64,
    tracked: Option<ContentId>,
    encounters: u64,
    people: impl Iterator<Item = (&'a Person, Option<&'a Position>)>,
) -> SimSnapshot {
    let mut counts = SimCounts {
        encounters,
        ..Default::default()
    };
    let mut agents: Vec<AgentSnapshot> = people
        .map(|(person, position)| AgentSnapshot {
            id: person.id,
            position: position.map(|p| p.0),
            trust_policy: person.trust_policy,
            queue_len: person.queue.len(),
            holds_tracked: tracked.is_some_and(|c| person.queue.has_content(c)),
        })
        .collect();
    agents.sort_by_key(|a| a.id);
    for agent in &agents {
        counts.add_agent(agent);
    }
    SimSnapshot {
        timestamp,
        counts,
        agents,
    }
}

/// Read-only view of the whole population at the current clock time.
pub fn capture_population_snapshot(world: &mut World) -> SimSnapshot {
    let timestamp = world
        .get_resource::<SimulationClock>()
        .map_or(0.0, |c| c.now());
    let tracked = world
        .get_resource::<PropagationMeasurer>()
        .and_then(|m| m.tracked());
    let encounters = world
        .get_resource::<EncounterStats>()
        .map_or(0, |s| s.encounters);
    let mut query = world.query::<(&Person, Option<&Position>)>();
    build_snapshot(timestamp, tracked, encounters, query.iter(world))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    fn summary() -> ScenarioSummary {
        ScenarioSummary {
            seed: 7,
            population: 10,
            adversaries: 2,
            mobile_jammers: 0,
            static_jammers: 0,
            neighborhood_radius: 20.0,
            encounter_chance: 0.05,
            jamming_radius: 50.0,
            encounter_model: "proximity",
            author_policy: "random",
            time_unit: TimeUnit::Seconds,
        }
    }

    #[test]
    fn duration_unit_is_guessed_from_magnitude() {
        assert_eq!(duration_seconds(100.0, 160.0), 60.0);
        let start = 1_213_084_687_000.0;
        assert_eq!(duration_seconds(start, start + 60_000.0), 60.0);
    }

    #[test]
    fn output_json_uses_legacy_field_names() {
        let mut m = PropagationMeasurer::new(
            crate::measurer::AuthorPolicy::Random,
            10,
            0.0,
            TimeUnit::Seconds,
        );
        m.observe(0.0, 1);
        m.observe(30.0, 1);
        m.observe(3_630.0, 4);
        let out = SimulationOutput::new(&m, &summary());
        assert_eq!(out.hours_duration, 1.0);
        assert_eq!(out.final_reach(), 4);
        assert_eq!(out.time_to_reach(2), Some(3_630.0));

        let value: serde_json::Value =
            serde_json::from_str(&out.to_json().expect("json")).expect("parse");
        assert_eq!(value["propagationData"]["30"], 1);
        assert_eq!(value["propagationData"]["3630"], 4);
        assert_eq!(value["NUMBER_OF_ADVERSARIES"], 2);
        assert_eq!(value["priority"], 1.0);
        assert_eq!(value["minTimeSeen"], 30.0);
        assert_eq!(value["encounterModel"], "proximity");
    }

    #[test]
    fn snapshot_buffer_rolls_over() {
        let config = SimSnapshotConfig {
            interval: 10.0,
            max_snapshots: 2,
        };
        let mut buffer = SimSnapshots::default();
        for t in [0.0, 10.0, 20.0] {
            assert!(buffer.due(t, &config));
            buffer.push(build_snapshot(t, None, 0, std::iter::empty()), &config);
        }
        assert!(!buffer.due(25.0, &config));
        assert_eq!(buffer.snapshots.len(), 2);
        assert_eq!(buffer.snapshots[0].timestamp, 10.0);
    }

    #[test]
    fn snapshot_counts_holders() {
        let mut a = Person::new(2, TrustPolicy::MaxFriends, 3);
        a.add_message(Message::new(ContentId(1), 1.0));
        let b = Person::new(1, TrustPolicy::Adversary, 3);
        let pos = Position(Point::new(1.0, 1.0));
        let snap = build_snapshot(
            5.0,
            Some(ContentId(1)),
            3,
            [(&a, Some(&pos)), (&b, None)].into_iter(),
        );
        assert_eq!(snap.agents[0].id, 1);
        assert_eq!(
            snap.counts,
            SimCounts {
                agents: 2,
                positioned: 1,
                adversaries: 1,
                holders: 1,
                queued_messages: 1,
                encounters: 3,
            }
        );
    }
}
