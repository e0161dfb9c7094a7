use criterion::*;
use std::hint::black_box;

use colonnade::{EntityId, World};

mod common;
use common::*;

fn transition_benchmark(c: &mut Criterion) {
    init_components();

    let mut group = c.benchmark_group("transition");

    group.bench_function("add_remove_wealth_10k", |b| {
        b.iter_batched(
            || {
                let mut world = World::new();
                let entities: Vec<EntityId> = (0..ENTITIES_SMALL)
                    .map(|i| {
                        let entity = world.create_entity().unwrap();
                        world
                            .add_components(entity, (Position { x: i as f32, y: 0.0 },))
                            .unwrap();
                        entity
                    })
                    .collect();
                (world, entities)
            },
            |(mut world, entities)| {
                for &entity in &entities {
                    world
                        .add_components(entity, (Wealth { value: 100.0 },))
                        .unwrap();
                }
                for &entity in &entities {
                    world.remove_components::<(Wealth,)>(entity).unwrap();
                }
                black_box(world);
            },
            BatchSize::LargeInput,
        );
    });

    group.bench_function("despawn_half_10k", |b| {
        b.iter_batched(
            || {
                let mut world = World::new();
                let entities: Vec<EntityId> = (0..ENTITIES_SMALL)
                    .map(|_| {
                        let entity = world.create_entity().unwrap();
                        world
                            .add_components(entity, (Position { x: 0.0, y: 0.0 },))
                            .unwrap();
                        entity
                    })
                    .collect();
                (world, entities)
            },
            |(mut world, entities)| {
                for &entity in entities.iter().step_by(2) {
                    world.remove_entity(entity).unwrap();
                }
                black_box(world);
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

criterion_group!(benches, transition_benchmark);
criterion_main!(benches);
