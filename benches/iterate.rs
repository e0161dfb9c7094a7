use criterion::*;
use std::hint::black_box;

use colonnade::Query;

mod common;
use common::*;

fn iterate_benchmark(c: &mut Criterion) {
    init_components();

    let mut group = c.benchmark_group("iterate");

    group.bench_function("each_mut_position_velocity_100k", |b| {
        let mut world = populated_world(ENTITIES_MED);
        let query = Query::<(Position, Velocity)>::new().unwrap();

        b.iter(|| {
            query
                .each_mut(&mut world, |(position, velocity): (&mut Position, &mut Velocity)| {
                    position.x += velocity.dx;
                })
                .unwrap();
            black_box(&world);
        });
    });

    group.bench_function("each_read_position_100k", |b| {
        let world = populated_world(ENTITIES_MED);
        let query = Query::<(Position,)>::new().unwrap();

        b.iter(|| {
            let mut total = 0.0f32;
            query
                .each(&world, |(position,): (&Position,)| {
                    total += position.x;
                })
                .unwrap();
            black_box(total);
        });
    });

    group.bench_function("size_100k", |b| {
        let world = populated_world(ENTITIES_MED);
        let query = Query::<(Position, Velocity)>::new().unwrap();

        b.iter(|| black_box(query.size(&world)));
    });

    group.finish();
}

criterion_group!(benches, iterate_benchmark);
criterion_main!(benches);
