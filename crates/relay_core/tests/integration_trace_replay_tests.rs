mod support;

use bevy_ecs::prelude::World;
use relay_core::clock::ActionKind;
use relay_core::encounter::EncounterModelKind;
use relay_core::measurer::{AuthorPolicy, PropagationRecord};
use relay_core::runner::run_simulation_with_world;
use relay_core::scenario::{build_scenario, GraphSource, ScenarioInputs, SimulationConfig};
use relay_core::telemetry::EncounterStats;
use relay_core::test_helpers::TEST_SEED;
use relay_core::traces::{load_encounter_records, load_social_edges};
use support::fixtures::{chain_edges, contact, file_with};
use support::schedule::ScheduleRunner;

fn replay_config() -> SimulationConfig {
    let mut config = SimulationConfig::default()
        .with_seed(TEST_SEED)
        .with_encounter_model(EncounterModelKind::TraceReplay)
        .with_graph_source(GraphSource::Loaded)
        .with_trace_encounter_chance(1.0)
        .with_author(AuthorPolicy::Unpopular);
    config.prefill_queues = false;
    config
}

#[test]
fn recorded_contacts_carry_the_message_down_a_chain() {
    let edges = file_with("0,1\n1,2\n2,3\n");
    // Rows out of time order; the negative start is skipped at build time.
    let contacts = file_with(
        "id1,id2,start,end,upload,rssi\n\
         2,3,30,40,0,-60\n\
         0,1,10,20,0,-75\n\
         3,0,-5,0,0,-80\n\
         1,2,20,25,0,-70\n",
    );
    let inputs = ScenarioInputs::default()
        .with_social_edges(load_social_edges(edges.path(), b',', 0).expect("edges"))
        .with_encounters(load_encounter_records(contacts.path()).expect("contacts"));

    let (world, output) = run_simulation_with_world(&replay_config(), inputs).expect("run");

    // Chain ends have degree one; the lowest id wins the tie.
    assert_eq!(output.author, Some(0));
    assert_eq!(
        output.propagation_data,
        vec![
            PropagationRecord { time: 10.0, count: 2 },
            PropagationRecord { time: 20.0, count: 3 },
            PropagationRecord { time: 30.0, count: 4 },
        ]
    );
    assert_eq!(output.duration, 20.0);
    assert_eq!(output.encounter_model, "trace");
    assert_eq!(world.resource::<EncounterStats>().trace_encounters, 3);
}

#[test]
fn each_kept_record_is_its_own_event() {
    let inputs = ScenarioInputs::default()
        .with_social_edges(chain_edges(4))
        .with_encounters(vec![
            contact(0, 1, 5.0),
            contact(2, 3, 5.0),
            contact(1, 1, 7.0),
        ]);
    let mut world = World::new();
    build_scenario(&mut world, &replay_config(), inputs).expect("build");

    let events = ScheduleRunner::new().run_recording(&mut world);
    // Self-contacts never make it into the schedule.
    assert_eq!(
        events,
        vec![
            (0.0, ActionKind::Measure),
            (5.0, ActionKind::Sequence),
            (5.0, ActionKind::Sequence),
        ]
    );
    assert_eq!(world.resource::<EncounterStats>().trace_encounters, 2);
    assert_eq!(world.resource::<EncounterStats>().ticks, 0);
}

#[test]
fn zero_keep_chance_replays_nothing() {
    let config = replay_config().with_trace_encounter_chance(0.0);
    let inputs = ScenarioInputs::default()
        .with_social_edges(chain_edges(3))
        .with_encounters(vec![contact(0, 1, 5.0), contact(1, 2, 6.0)]);
    let (world, output) = run_simulation_with_world(&config, inputs).expect("run");

    assert!(output.propagation_data.is_empty());
    assert_eq!(output.encounter_chance, 0.0);
    assert_eq!(world.resource::<EncounterStats>().encounters, 0);
}
