//! Performance benchmarks for relay_core using Criterion.rs.

use bevy_ecs::prelude::World;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use relay_core::encounter::{EncounterModel, ProximityGridModel};
use relay_core::encounter::{JammingField, PopulationView};
use relay_core::runner::{run_until_empty, simulation_schedule};
use relay_core::scenario::{build_scenario, RandomWalkConfig, ScenarioInputs, SimulationConfig};
use relay_core::spatial::{Arena, SpatialGrid};

fn walk_config(people: usize) -> SimulationConfig {
    SimulationConfig::default()
        .with_seed(42)
        .with_people(people)
        .with_adversaries(people / 10)
        .with_arena(1_000.0, 1_000.0)
        .with_random_walk(RandomWalkConfig {
            steps: 100,
            interval: 1_000.0,
            step_scale: 10.0,
        })
        .with_max_runtime_hours(0.0)
}

fn bench_simulation_run(c: &mut Criterion) {
    let scenarios = vec![("small", 50), ("medium", 200), ("large", 500)];

    let mut group = c.benchmark_group("simulation_run");
    group.sample_size(10);
    for (name, people) in scenarios {
        group.bench_with_input(BenchmarkId::from_parameter(name), &people, |b, &people| {
            b.iter(|| {
                let mut world = World::new();
                build_scenario(&mut world, &walk_config(people), ScenarioInputs::default())
                    .expect("scenario builds");
                let mut schedule = simulation_schedule();
                black_box(run_until_empty(&mut world, &mut schedule, usize::MAX));
            });
        });
    }
    group.finish();
}

fn bench_proximity_tick(c: &mut Criterion) {
    let arena = Arena {
        width: 2_000.0,
        height: 2_000.0,
    };
    let mut group = c.benchmark_group("proximity_tick");
    for agents in [100u32, 1_000, 5_000] {
        let mut rng = StdRng::seed_from_u64(7);
        let mut grid = SpatialGrid::for_radius(20.0);
        let ids: Vec<u32> = (0..agents).collect();
        for &id in &ids {
            grid.update(id, arena.random_point(&mut rng));
        }
        let jamming = JammingField {
            static_locations: vec![arena.random_point(&mut rng)],
            ..Default::default()
        };
        let model = ProximityGridModel::new(20.0, 0.05);

        group.bench_with_input(BenchmarkId::from_parameter(agents), &ids, |b, ids| {
            b.iter(|| {
                let view = PopulationView::new(ids, &grid, &[], &jamming);
                black_box(model.tick(&view, &mut rng))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_simulation_run, bench_proximity_tick);
criterion_main!(benches);
