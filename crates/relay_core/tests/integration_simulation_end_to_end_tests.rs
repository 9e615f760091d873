mod support;

use bevy_ecs::prelude::World;
use relay_core::clock::{ActionKind, SimulationClock};
use relay_core::encounter::EncounterModelKind;
use relay_core::measurer::{AuthorPolicy, PropagationRecord, TimeUnit};
use relay_core::runner::{run_simulation, run_simulation_with_world};
use relay_core::scenario::{build_scenario, JammingConfig, ScenarioInputs, SimulationConfig};
use relay_core::spatial::Point;
use relay_core::telemetry::EncounterStats;
use relay_core::test_helpers::{small_proximity_config, TEST_SEED};
use support::schedule::ScheduleRunner;

fn fully_mixed(people: usize) -> SimulationConfig {
    let mut config = SimulationConfig::default()
        .with_seed(TEST_SEED)
        .with_people(people)
        .with_encounter_model(EncounterModelKind::NaivePairwise)
        .with_naive_ticks(10, 1.0, 1.0);
    config.prefill_queues = false;
    config
}

#[test]
fn full_mixing_reaches_everyone_on_the_first_tick() {
    let config = fully_mixed(6);
    let mut world = World::new();
    build_scenario(&mut world, &config, ScenarioInputs::default()).expect("build");

    let mut runner = ScheduleRunner::new();
    let events = runner.run_recording(&mut world);
    assert_eq!(
        events,
        vec![(0.0, ActionKind::Measure), (1.0, ActionKind::Sequence)]
    );
    assert!(world.resource::<SimulationClock>().is_cancelled());

    let output = runner.run_full(&mut world);
    assert_eq!(
        output.propagation_data,
        vec![PropagationRecord { time: 1.0, count: 6 }]
    );
    assert_eq!(output.number_of_people, 6);
    assert_eq!(output.final_reach(), 6);
    assert_eq!(output.time_to_reach(6), Some(1.0));
    assert!(output.author.is_some());
}

#[test]
fn output_json_uses_legacy_field_names() {
    let output = run_simulation(&fully_mixed(4), ScenarioInputs::default()).expect("run");
    let json: serde_json::Value =
        serde_json::from_str(&output.to_json().expect("serialize")).expect("parse");
    assert_eq!(json["propagationData"]["1"], 4);
    assert_eq!(json["NUMBER_OF_PEOPLE"], 4);
    assert_eq!(json["NUMBER_OF_ADVERSARIES"], 0);
    assert_eq!(json["ENCOUNTER_CHANCE"], 1.0);
    assert_eq!(json["encounterModel"], "naive");
    assert_eq!(json["authorPolicy"], "random");
    assert_eq!(json["seed"], TEST_SEED);
    assert_eq!(json["minTimeSeen"], 1.0);
}

#[test]
fn same_seed_reproduces_the_same_run() {
    let config = small_proximity_config(7);
    let first = run_simulation(&config, ScenarioInputs::default()).expect("first run");
    let second = run_simulation(&config, ScenarioInputs::default()).expect("second run");
    assert_eq!(first, second);
    assert_eq!(first.seed, 7);
}

#[test]
fn propagation_curve_only_grows() {
    let config = small_proximity_config(TEST_SEED);
    let (world, output) =
        run_simulation_with_world(&config, ScenarioInputs::default()).expect("run");

    assert!(!output.propagation_data.is_empty());
    for pair in output.propagation_data.windows(2) {
        assert!(pair[0].time <= pair[1].time);
        assert!(pair[0].count < pair[1].count);
    }
    assert!(output.final_reach() <= 20);
    assert!(output.propagation_data.iter().all(|r| r.time > 0.0));
    assert!(world.resource::<EncounterStats>().encounters > 0);
}

#[test]
fn max_runtime_stops_the_run() {
    // 0.01 h is 36 s of clock time; the first nonzero measurement is at 1 s.
    let config = small_proximity_config(TEST_SEED)
        .with_time_unit(TimeUnit::Milliseconds)
        .with_max_runtime_hours(0.01);
    let (world, output) =
        run_simulation_with_world(&config, ScenarioInputs::default()).expect("run");

    assert!(world.resource::<SimulationClock>().is_cancelled());
    assert!(output.max_time_seen <= 38_000.0);
    assert_eq!(output.min_time_seen, 1_000.0);
}

#[test]
fn missing_adversarial_author_measures_nothing() {
    let config = fully_mixed(5).with_author(AuthorPolicy::Adversarial);
    let mut world = World::new();
    build_scenario(&mut world, &config, ScenarioInputs::default()).expect("build");

    let mut runner = ScheduleRunner::new();
    let events = runner.run_recording(&mut world);
    // Nothing ever completes, so every tick runs.
    assert_eq!(events.len(), 11);
    assert!(!world.resource::<SimulationClock>().is_cancelled());

    let output = runner.run_full(&mut world);
    assert_eq!(output.author, None);
    assert!(output.propagation_data.is_empty());
    assert_eq!(output.max_time_seen, 10.0);
}

#[test]
fn mobile_jammer_covering_the_arena_blocks_every_encounter() {
    let config = small_proximity_config(TEST_SEED)
        .with_adversaries(1)
        .with_jamming(JammingConfig {
            mobile_jammers: 1,
            radius: 100.0,
            ..Default::default()
        });
    let (world, output) =
        run_simulation_with_world(&config, ScenarioInputs::default()).expect("run");

    let stats = world.resource::<EncounterStats>();
    assert_eq!(stats.encounters, 0);
    assert!(stats.jammed_agent_ticks > 0);
    assert_eq!(output.final_reach(), 1);
}

#[test]
fn static_jammer_in_the_middle_blocks_every_encounter() {
    let config = small_proximity_config(TEST_SEED).with_jamming(JammingConfig {
        static_jammers: 1,
        radius: 100.0,
        optimal_placement: true,
        ..Default::default()
    });
    let inputs = ScenarioInputs::default().with_jammer_locations(vec![Point::new(30.0, 30.0)]);
    let (world, output) = run_simulation_with_world(&config, inputs).expect("run");

    assert_eq!(world.resource::<EncounterStats>().encounters, 0);
    assert_eq!(output.final_reach(), 1);
}
