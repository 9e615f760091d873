use std::collections::{BTreeMap, BTreeSet};

use bevy_ecs::prelude::World;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use super::params::{
    GraphSource, JammingConfig, RandomWalkConfig, ScenarioInputs, SimulationConfig,
};
use crate::agents::{AgentId, Person};
use crate::clock::{Action, SimulationClock};
use crate::ecs::{AgentDirectory, MobilitySchedule, Position, SimRng};
use crate::encounter::{
    subsample_records, validate_records, EncounterModel, EncounterModelKind,
    EncounterModelResource, JammingField, NaivePairwiseModel, ProximityGridModel,
    TraceReplayModel,
};
use crate::error::{SimError, SimResult};
use crate::measurer::PropagationMeasurer;
use crate::message::{ContentIdAllocator, Message};
use crate::social::{assign_adversaries, random_attachment, scale_free_attachment, SocialGraph};
use crate::spatial::{Arena, Point, SpatialGrid};
use crate::telemetry::{EncounterStats, ScenarioSummary, SimSnapshotConfig, SimSnapshots};
use crate::traces::{EncounterRecord, MobilityPoint, SocialEdge};
use crate::trust::TrustPolicy;

/// Boxes the encounter model selected by `config`.
pub fn create_encounter_model(config: &SimulationConfig) -> EncounterModelResource {
    let model: Box<dyn EncounterModel> = match config.encounter_model {
        EncounterModelKind::ProximityGrid => Box::new(ProximityGridModel::new(
            config.neighborhood_radius,
            config.encounter_chance,
        )),
        EncounterModelKind::TraceReplay => Box::new(TraceReplayModel {
            encounter_chance: config.trace_encounter_chance,
        }),
        EncounterModelKind::NaivePairwise => Box::new(NaivePairwiseModel {
            encounter_chance: config.naive_encounter_chance,
        }),
    };
    EncounterModelResource(model)
}

fn initial_graph(config: &SimulationConfig, edges: &[SocialEdge]) -> SocialGraph {
    match config.graph_source {
        GraphSource::Loaded => {
            let mut graph = SocialGraph::new();
            for edge in edges {
                graph.add_node(edge.first);
                graph.add_node(edge.second);
                graph.add_edge(edge.first, edge.second, edge.weight);
            }
            info!(
                nodes = graph.len(),
                edges = graph.edge_count(),
                "loaded social graph"
            );
            graph
        }
        GraphSource::ScaleFree | GraphSource::Random { .. } => {
            if !edges.is_empty() {
                warn!(
                    edges = edges.len(),
                    "social edges supplied but graph is generated; ignoring them"
                );
            }
            SocialGraph::with_nodes(0..config.num_people as AgentId)
        }
    }
}

/// Projects trace points onto the plane and groups them per agent.
/// Points before time 0 or off the projection are dropped. Agents with any
/// point outside the arena are dropped from the graph when the config asks.
fn attach_mobility(
    config: &SimulationConfig,
    graph: &mut SocialGraph,
    points: &[MobilityPoint],
) -> SimResult<BTreeMap<AgentId, MobilitySchedule>> {
    let mut grouped: BTreeMap<AgentId, Vec<(f64, Point)>> = BTreeMap::new();
    let mut out_of_bounds = BTreeSet::new();
    let mut dropped = 0usize;
    for point in points {
        if !graph.contains(point.agent) {
            return Err(SimError::UnknownAgent(point.agent));
        }
        let projected = config.projection.project(point.latitude, point.longitude);
        let Some(location) = projected.filter(|_| point.time >= 0.0 && point.time.is_finite())
        else {
            dropped += 1;
            continue;
        };
        if !config.arena.contains(&location) {
            out_of_bounds.insert(point.agent);
        }
        grouped
            .entry(point.agent)
            .or_default()
            .push((point.time, location));
    }
    if dropped > 0 {
        warn!(dropped, "dropped unusable mobility points");
    }
    if config.drop_out_of_bounds {
        for id in &out_of_bounds {
            grouped.remove(id);
            graph.remove_node(*id);
        }
        if !out_of_bounds.is_empty() {
            warn!(
                removed = out_of_bounds.len(),
                "removed agents with mobility outside the arena"
            );
        }
    }
    Ok(grouped
        .into_iter()
        .map(|(id, points)| (id, MobilitySchedule::new(points)))
        .collect())
}

/// Lattice random walk: every step moves each axis by `step_scale * k` for a
/// uniform `k` in `-2..=2`, clamped to the arena.
fn random_walks<R: Rng + ?Sized>(
    graph: &SocialGraph,
    arena: &Arena,
    walk: &RandomWalkConfig,
    rng: &mut R,
) -> BTreeMap<AgentId, MobilitySchedule> {
    let mut schedules = BTreeMap::new();
    for id in graph.nodes() {
        let mut here = arena.random_point(rng);
        let mut points = Vec::with_capacity(walk.steps + 1);
        points.push((0.0, here));
        for step in 1..=walk.steps {
            let dx = walk.step_scale * (rng.gen_range(0..5) as f64 - 2.0);
            let dy = walk.step_scale * (rng.gen_range(0..5) as f64 - 2.0);
            here = Point::new(
                (here.x + dx).clamp(0.0, arena.width),
                (here.y + dy).clamp(0.0, arena.height),
            );
            points.push((step as f64 * walk.interval, here));
        }
        schedules.insert(id, MobilitySchedule::new(points));
    }
    info!(
        agents = schedules.len(),
        steps = walk.steps,
        "generated random-walk mobility"
    );
    schedules
}

/// Agents the proximity model can never see are removed outright.
fn prune_immobile(graph: &mut SocialGraph, schedules: &BTreeMap<AgentId, MobilitySchedule>) {
    let immobile: Vec<AgentId> = graph
        .nodes()
        .filter(|id| !schedules.contains_key(id))
        .collect();
    for id in &immobile {
        debug!(agent = id, "no mobility data");
        graph.remove_node(*id);
    }
    if !immobile.is_empty() {
        warn!(
            removed = immobile.len(),
            "removed agents without mobility data"
        );
    }
}

/// The first `count` adversaries by id become jammers.
fn promote_jammers(
    people: &mut BTreeMap<AgentId, Person>,
    adversaries: &[AgentId],
    count: usize,
) -> Vec<AgentId> {
    let mut ids = adversaries.to_vec();
    ids.sort_unstable();
    ids.truncate(count);
    if ids.len() < count {
        warn!(
            requested = count,
            available = ids.len(),
            "not enough adversaries for mobile jammers"
        );
    }
    for id in &ids {
        if let Some(person) = people.get_mut(id) {
            person.trust_policy = TrustPolicy::AdversaryJammer;
        }
    }
    ids
}

fn place_static_jammers<R: Rng + ?Sized>(
    jamming: &JammingConfig,
    arena: &Arena,
    locations: Option<&[Point]>,
    rng: &mut R,
) -> Vec<Point> {
    let count = jamming.static_jammers;
    if count == 0 {
        return Vec::new();
    }
    if jamming.optimal_placement {
        match locations {
            Some(points) if !points.is_empty() => {
                return points.iter().take(count).copied().collect();
            }
            _ => warn!("optimal jammer locations unavailable; placing jammers randomly"),
        }
    }
    (0..count).map(|_| arena.random_point(&mut *rng)).collect()
}

fn schedule_model_events(
    clock: &mut SimulationClock,
    config: &SimulationConfig,
    schedules: &BTreeMap<AgentId, MobilitySchedule>,
    records: &[EncounterRecord],
) {
    clock.schedule_at(0.0, Action::Measure);
    match config.encounter_model {
        EncounterModelKind::ProximityGrid => {
            for (&id, schedule) in schedules {
                for &(time, _) in &schedule.points {
                    clock.schedule_at(
                        time,
                        Action::Sequence(vec![
                            Action::MovePerson(id),
                            Action::Measure,
                            Action::EncounterTick,
                        ]),
                    );
                }
            }
        }
        EncounterModelKind::NaivePairwise => {
            for tick in 1..=config.tick_count {
                clock.schedule_at(
                    tick as f64 * config.tick_interval,
                    Action::Sequence(vec![Action::EncounterTick, Action::Measure]),
                );
            }
        }
        EncounterModelKind::TraceReplay => {
            let mut skipped = 0usize;
            for record in records {
                if !(record.start_time >= 0.0 && record.start_time.is_finite()) {
                    skipped += 1;
                    continue;
                }
                clock.schedule_at(
                    record.start_time,
                    Action::Sequence(vec![
                        Action::TraceEncounter(record.first, record.second),
                        Action::Measure,
                    ]),
                );
            }
            if skipped > 0 {
                warn!(skipped, "skipped encounter records with negative start time");
            }
        }
    }
}

/// Builds the population, social graph, jammers and event schedule, and
/// inserts every resource the runner needs.
///
/// Generator draws happen in a fixed order: random walks, queue pre-fill
/// (ascending id), graph generation, static jammer placement, trace
/// subsampling. The same seed, config and inputs therefore rebuild the same
/// world.
pub fn build_scenario(
    world: &mut World,
    config: &SimulationConfig,
    inputs: ScenarioInputs,
) -> SimResult<()> {
    config.validate()?;
    let seed = config.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut content_ids = ContentIdAllocator::default();
    let proximity = config.encounter_model == EncounterModelKind::ProximityGrid;

    let mut graph = initial_graph(config, &inputs.social_edges);

    let schedules = if !proximity {
        if !inputs.mobility.is_empty() {
            debug!(
                points = inputs.mobility.len(),
                "mobility ignored by this encounter model"
            );
        }
        BTreeMap::new()
    } else if inputs.mobility.is_empty() {
        match &config.random_walk {
            Some(walk) => random_walks(&graph, &config.arena, walk, &mut rng),
            None => BTreeMap::new(),
        }
    } else {
        attach_mobility(config, &mut graph, &inputs.mobility)?
    };
    if proximity {
        prune_immobile(&mut graph, &schedules);
    }
    if graph.is_empty() {
        return Err(SimError::EmptyPopulation);
    }

    let mut people: BTreeMap<AgentId, Person> = BTreeMap::new();
    for id in graph.nodes() {
        let mut person = Person::new(id, config.default_trust_policy, config.queue_capacity);
        if config.prefill_queues {
            for _ in 0..config.queue_capacity {
                person.add_message(Message::new(content_ids.next_id(), rng.gen::<f64>()));
            }
        }
        people.insert(id, person);
    }

    match config.graph_source {
        GraphSource::ScaleFree => {
            scale_free_attachment(&mut graph, &mut rng);
        }
        GraphSource::Random { edges_per_node } => {
            random_attachment(&mut graph, &mut rng, edges_per_node);
        }
        GraphSource::Loaded => {}
    }

    let adversaries = assign_adversaries(&mut graph, config.num_adversaries);
    for id in &adversaries {
        if let Some(person) = people.get_mut(id) {
            person.trust_policy = TrustPolicy::Adversary;
        }
    }
    let mobile_jammers = promote_jammers(&mut people, &adversaries, config.jamming.mobile_jammers);
    let static_locations = place_static_jammers(
        &config.jamming,
        &config.arena,
        inputs.jammer_locations.as_deref(),
        &mut rng,
    );

    let records = if config.encounter_model == EncounterModelKind::TraceReplay {
        validate_records(&inputs.encounters, &graph)?;
        subsample_records(&inputs.encounters, config.trace_encounter_chance, &mut rng)
    } else {
        Vec::new()
    };

    let mut clock = SimulationClock::default();
    schedule_model_events(&mut clock, config, &schedules, &records);

    let mut directory = AgentDirectory::default();
    let mut grid = SpatialGrid::for_radius(config.neighborhood_radius);
    let mut schedules = schedules;
    for (id, person) in people {
        let mut entity = world.spawn(person);
        if let Some(schedule) = schedules.remove(&id) {
            if let Some(&(_, start)) = schedule.points.first() {
                entity.insert(Position(start));
                grid.update(id, start);
            }
            entity.insert(schedule);
        }
        directory.insert(id, entity.id());
    }

    let population = graph.len();
    let summary = ScenarioSummary {
        seed,
        population,
        adversaries: adversaries.len(),
        mobile_jammers: mobile_jammers.len(),
        static_jammers: static_locations.len(),
        neighborhood_radius: config.neighborhood_radius,
        encounter_chance: config.active_encounter_chance(),
        jamming_radius: config.jamming.radius,
        encounter_model: config.encounter_model.as_str(),
        author_policy: config.author.as_str(),
        time_unit: config.time_unit,
    };
    info!(
        seed,
        population,
        adversaries = summary.adversaries,
        mobile_jammers = summary.mobile_jammers,
        static_jammers = summary.static_jammers,
        events = clock.pending(),
        model = summary.encounter_model,
        "scenario built"
    );

    let snapshot_config = match config.snapshot_interval {
        Some(interval) => SimSnapshotConfig {
            interval,
            ..Default::default()
        },
        None => SimSnapshotConfig::hourly(config.time_unit),
    };

    world.insert_resource(clock);
    world.insert_resource(SimRng(rng));
    world.insert_resource(content_ids);
    world.insert_resource(graph);
    world.insert_resource(directory);
    world.insert_resource(grid);
    world.insert_resource(JammingField {
        radius: config.jamming.radius,
        mobile: !mobile_jammers.is_empty(),
        static_locations,
    });
    world.insert_resource(create_encounter_model(config));
    world.insert_resource(config.trust);
    world.insert_resource(PropagationMeasurer::new(
        config.author,
        population,
        config.max_runtime_hours,
        config.time_unit,
    ));
    world.insert_resource(EncounterStats::default());
    world.insert_resource(summary);
    world.insert_resource(snapshot_config);
    world.insert_resource(SimSnapshots::default());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_walk_stays_in_arena() {
        let graph = SocialGraph::with_nodes(0..3);
        let arena = Arena {
            width: 50.0,
            height: 50.0,
        };
        let walk = RandomWalkConfig {
            steps: 200,
            interval: 2.0,
            step_scale: 10.0,
        };
        let mut rng = StdRng::seed_from_u64(1);
        let schedules = random_walks(&graph, &arena, &walk, &mut rng);
        assert_eq!(schedules.len(), 3);
        for schedule in schedules.values() {
            assert_eq!(schedule.points.len(), 201);
            assert_eq!(schedule.points[200].0, 400.0);
            assert!(schedule.points.iter().all(|(_, p)| arena.contains(p)));
        }
    }

    #[test]
    fn jammer_promotion_takes_lowest_ids() {
        let mut people: BTreeMap<AgentId, Person> = (0..6)
            .map(|id| (id, Person::new(id, TrustPolicy::Adversary, 1)))
            .collect();
        let promoted = promote_jammers(&mut people, &[5, 2, 4], 2);
        assert_eq!(promoted, vec![2, 4]);
        assert_eq!(people[&2].trust_policy, TrustPolicy::AdversaryJammer);
        assert_eq!(people[&5].trust_policy, TrustPolicy::Adversary);
        assert_eq!(promote_jammers(&mut people, &[1], 3), vec![1]);
    }

    #[test]
    fn optimal_placement_falls_back_to_random() {
        let jamming = JammingConfig {
            static_jammers: 2,
            optimal_placement: true,
            ..Default::default()
        };
        let arena = Arena::default();
        let mut rng = StdRng::seed_from_u64(0);
        let loaded = [Point::new(1.0, 1.0), Point::new(2.0, 2.0), Point::new(3.0, 3.0)];
        assert_eq!(
            place_static_jammers(&jamming, &arena, Some(&loaded), &mut rng),
            vec![Point::new(1.0, 1.0), Point::new(2.0, 2.0)]
        );
        let random = place_static_jammers(&jamming, &arena, None, &mut rng);
        assert_eq!(random.len(), 2);
        assert!(random.iter().all(|p| arena.contains(p)));
    }
}
