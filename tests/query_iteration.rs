use std::sync::Once;

use colonnade::{freeze_components, register_component, EntityId, Query, World};

#[derive(Clone, Copy, Debug, PartialEq)]
struct Position {
    x: f32,
    y: f32,
    z: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Velocity {
    vx: f32,
    vy: f32,
    vz: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Health {
    current: f32,
}

#[derive(Clone, Copy, Debug)]
struct EnemyTag;

static INIT: Once = Once::new();

fn init_registry() {
    INIT.call_once(|| {
        register_component::<Position>().unwrap();
        register_component::<Velocity>().unwrap();
        register_component::<Health>().unwrap();
        register_component::<EnemyTag>().unwrap();
        freeze_components().unwrap();
    });
}

fn spawn_moving(world: &mut World, x: f32, vx: f32) -> EntityId {
    let entity = world.create_entity().unwrap();
    world
        .add_components(
            entity,
            (
                Position { x, y: 0.0, z: 0.0 },
                Velocity { vx, vy: 0.0, vz: 0.0 },
            ),
        )
        .unwrap();
    entity
}

#[test]
fn two_component_iteration_advances_positions() {
    init_registry();
    let mut world = World::new();

    let entities: Vec<EntityId> = (1..=3)
        .map(|i| spawn_moving(&mut world, i as f32, 1.0))
        .collect();

    Query::<(Position, Velocity)>::new()
        .unwrap()
        .each_mut(&mut world, |(position, velocity): (&mut Position, &mut Velocity)| {
            position.x += velocity.vx;
        })
        .unwrap();

    for (index, &entity) in entities.iter().enumerate() {
        let expected = (index + 1) as f32 + 1.0;
        assert_eq!(world.get::<Position>(entity).unwrap().x, expected);
    }
}

#[test]
fn exclude_filter_skips_tagged_entities() {
    init_registry();
    let mut world = World::new();

    let e1 = world.create_entity().unwrap();
    world
        .add_components(e1, (Position { x: 1.0, y: 0.0, z: 0.0 },))
        .unwrap();

    let e2 = world.create_entity().unwrap();
    world
        .add_components(e2, (Position { x: 2.0, y: 0.0, z: 0.0 }, EnemyTag))
        .unwrap();

    let e3 = world.create_entity().unwrap();
    world
        .add_components(e3, (Position { x: 3.0, y: 0.0, z: 0.0 },))
        .unwrap();

    let query = Query::<(Position,)>::new()
        .unwrap()
        .without::<(EnemyTag,)>()
        .unwrap();

    assert_eq!(query.size(&world), 2);

    let mut visited: Vec<EntityId> = Vec::new();
    query
        .each_with_entity(&world, |(_position,): (&Position,), entity| {
            visited.push(entity);
        })
        .unwrap();

    assert_eq!(visited.len(), 2);
    assert!(!visited.contains(&e2));
}

#[test]
fn with_filter_requires_presence_without_iterating() {
    init_registry();
    let mut world = World::new();

    spawn_moving(&mut world, 1.0, 1.0);
    let plain = world.create_entity().unwrap();
    world
        .add_components(plain, (Position { x: 9.0, y: 0.0, z: 0.0 },))
        .unwrap();

    let query = Query::<(Position,)>::new()
        .unwrap()
        .with::<(Velocity,)>()
        .unwrap();

    assert_eq!(query.size(&world), 1);
}

#[test]
fn size_on_a_fresh_world_is_zero() {
    init_registry();
    let world = World::new();
    assert_eq!(Query::<(Position,)>::new().unwrap().size(&world), 0);
}

#[test]
fn each_without_matches_never_invokes_the_callable() {
    init_registry();
    let mut world = World::new();

    // Entities exist, but none carries Health.
    spawn_moving(&mut world, 1.0, 1.0);

    let mut calls = 0usize;
    Query::<(Health,)>::new()
        .unwrap()
        .each(&world, |(_health,): (&Health,)| {
            calls += 1;
        })
        .unwrap();
    assert_eq!(calls, 0);
}

#[test]
fn match_completeness_across_archetypes() {
    init_registry();
    let mut world = World::new();

    // Three archetypes: P, P+V, P+V+H.
    let p = world.create_entity().unwrap();
    world
        .add_components(p, (Position { x: 1.0, y: 0.0, z: 0.0 },))
        .unwrap();

    spawn_moving(&mut world, 2.0, 1.0);

    let pvh = world.create_entity().unwrap();
    world
        .add_components(
            pvh,
            (
                Position { x: 3.0, y: 0.0, z: 0.0 },
                Velocity { vx: 1.0, vy: 0.0, vz: 0.0 },
                Health { current: 10.0 },
            ),
        )
        .unwrap();

    assert_eq!(Query::<(Position,)>::new().unwrap().size(&world), 3);
    assert_eq!(Query::<(Position, Velocity)>::new().unwrap().size(&world), 2);
    assert_eq!(
        Query::<(Position, Velocity, Health)>::new().unwrap().size(&world),
        1
    );
}

#[test]
fn rows_are_visited_in_ascending_order_per_archetype() {
    init_registry();
    let mut world = World::new();

    for i in 0..5 {
        spawn_moving(&mut world, i as f32, 0.0);
    }

    let mut seen: Vec<f32> = Vec::new();
    Query::<(Position,)>::new()
        .unwrap()
        .each(&world, |(position,): (&Position,)| {
            seen.push(position.x);
        })
        .unwrap();

    assert_eq!(seen, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn iteration_order_is_stable_across_runs_on_an_unmodified_world() {
    init_registry();
    let mut world = World::new();

    for i in 0..4 {
        spawn_moving(&mut world, i as f32, 0.0);
    }
    let lone = world.create_entity().unwrap();
    world
        .add_components(lone, (Position { x: 99.0, y: 0.0, z: 0.0 },))
        .unwrap();

    let query = Query::<(Position,)>::new().unwrap();
    let collect = |world: &World| {
        let mut order: Vec<EntityId> = Vec::new();
        query
            .each_with_entity(world, |(_position,): (&Position,), entity| {
                order.push(entity);
            })
            .unwrap();
        order
    };

    assert_eq!(collect(&world), collect(&world));
}

#[test]
fn entity_id_variant_matches_component_rows() {
    init_registry();
    let mut world = World::new();

    let entities: Vec<EntityId> = (0..3)
        .map(|i| spawn_moving(&mut world, i as f32 * 10.0, 0.0))
        .collect();

    Query::<(Position,)>::new()
        .unwrap()
        .each_with_entity(&world, |(position,): (&Position,), entity| {
            let index = entities.iter().position(|&e| e == entity).unwrap();
            assert_eq!(position.x, index as f32 * 10.0);
        })
        .unwrap();
}

#[test]
fn mutating_values_through_each_mut_with_entity() {
    init_registry();
    let mut world = World::new();

    let target = spawn_moving(&mut world, 0.0, 0.0);
    spawn_moving(&mut world, 0.0, 0.0);

    Query::<(Position,)>::new()
        .unwrap()
        .each_mut_with_entity(&mut world, |(position,): (&mut Position,), entity| {
            if entity == target {
                position.y = 7.0;
            }
        })
        .unwrap();

    assert_eq!(world.get::<Position>(target).unwrap().y, 7.0);
}
