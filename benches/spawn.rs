use criterion::*;
use std::hint::black_box;

use colonnade::World;

mod common;
use common::*;

fn spawn_benchmark(c: &mut Criterion) {
    init_components();

    let mut group = c.benchmark_group("spawn");

    group.bench_function("spawn_10k_two_components", |b| {
        b.iter_batched(
            World::new,
            |mut world| {
                populate(&mut world, ENTITIES_SMALL).unwrap();
                black_box(world);
            },
            BatchSize::LargeInput,
        );
    });

    group.bench_function("spawn_10k_componentless", |b| {
        b.iter_batched(
            World::new,
            |mut world| {
                for _ in 0..ENTITIES_SMALL {
                    world.create_entity().unwrap();
                }
                black_box(world);
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

criterion_group!(benches, spawn_benchmark);
criterion_main!(benches);
