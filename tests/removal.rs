use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Once;

use colonnade::{freeze_components, register_component, EntityId, Query, World};

#[derive(Clone, Copy, Debug, PartialEq)]
struct Item {
    k: i32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Charge {
    x: i32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Sprite {
    frame: u32,
}

static MIGRATION_DROPS: AtomicUsize = AtomicUsize::new(0);

/// Counts its drops so transitions can be audited for double-drops/leaks.
#[derive(Debug)]
struct MigrationProbe;

impl Drop for MigrationProbe {
    fn drop(&mut self) {
        MIGRATION_DROPS.fetch_add(1, Ordering::SeqCst);
    }
}

static TEARDOWN_DROPS: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug)]
struct TeardownProbe;

impl Drop for TeardownProbe {
    fn drop(&mut self) {
        TEARDOWN_DROPS.fetch_add(1, Ordering::SeqCst);
    }
}

static INIT: Once = Once::new();

fn init_registry() {
    INIT.call_once(|| {
        register_component::<Item>().unwrap();
        register_component::<Charge>().unwrap();
        register_component::<Sprite>().unwrap();
        register_component::<MigrationProbe>().unwrap();
        register_component::<TeardownProbe>().unwrap();
        freeze_components().unwrap();
    });
}

#[test]
fn swap_remove_preserves_the_other_rows() {
    init_registry();
    let mut world = World::new();

    let mut spawn = |k: i32| -> EntityId {
        let entity = world.create_entity().unwrap();
        world.add_components(entity, (Item { k },)).unwrap();
        entity
    };
    let e1 = spawn(1);
    let e2 = spawn(2);
    let e3 = spawn(3);

    assert!(world.remove_entity(e2).unwrap());

    let query = Query::<(Item,)>::new().unwrap();
    assert_eq!(query.size(&world), 2);

    let mut remaining: Vec<i32> = Vec::new();
    query
        .each(&world, |(item,): (&Item,)| remaining.push(item.k))
        .unwrap();
    remaining.sort_unstable();
    assert_eq!(remaining, vec![1, 3]);

    assert_eq!(world.get::<Item>(e1).unwrap().k, 1);
    assert_eq!(world.get::<Item>(e3).unwrap().k, 3);
}

#[test]
fn removing_the_only_row_leaves_a_valid_empty_archetype() {
    init_registry();
    let mut world = World::new();

    let entity = world.create_entity().unwrap();
    world.add_components(entity, (Sprite { frame: 1 },)).unwrap();
    assert!(world.remove_entity(entity).unwrap());

    assert_eq!(Query::<(Sprite,)>::new().unwrap().size(&world), 0);

    // The archetype is still usable for new residents.
    let next = world.create_entity().unwrap();
    world.add_components(next, (Sprite { frame: 2 },)).unwrap();
    assert_eq!(world.get::<Sprite>(next).unwrap().frame, 2);
}

#[test]
fn remove_if_culls_matching_entities() {
    init_registry();
    let mut world = World::new();

    for x in [-5, 10, -2, 8] {
        let entity = world.create_entity().unwrap();
        world.add_components(entity, (Charge { x },)).unwrap();
    }

    let query = Query::<(Charge,)>::new().unwrap();
    let removed = query
        .remove_if(&mut world, |_entity, (charge,): (&Charge,)| charge.x < 0)
        .unwrap();

    assert_eq!(removed, 2);
    assert_eq!(query.size(&world), 2);
    query
        .each(&world, |(charge,): (&Charge,)| {
            assert!(charge.x > 0);
        })
        .unwrap();
}

#[test]
fn remove_if_drops_removed_entities_from_the_world() {
    init_registry();
    let mut world = World::new();

    let doomed = world.create_entity().unwrap();
    world.add_components(doomed, (Charge { x: -1 },)).unwrap();
    let kept = world.create_entity().unwrap();
    world.add_components(kept, (Charge { x: 1 },)).unwrap();

    Query::<(Charge,)>::new()
        .unwrap()
        .remove_if(&mut world, |_entity, (charge,): (&Charge,)| charge.x < 0)
        .unwrap();

    assert!(!world.contains(doomed));
    assert!(world.contains(kept));
}

#[test]
fn clear_removes_all_matching_rows() {
    init_registry();
    let mut world = World::new();

    let mut tagged: Vec<EntityId> = Vec::new();
    for frame in 0..4 {
        let entity = world.create_entity().unwrap();
        world.add_components(entity, (Sprite { frame },)).unwrap();
        tagged.push(entity);
    }
    let bystander = world.create_entity().unwrap();
    world.add_components(bystander, (Item { k: 1 },)).unwrap();

    let query = Query::<(Sprite,)>::new().unwrap();
    query.clear(&mut world);

    assert_eq!(query.size(&world), 0);
    for entity in tagged {
        assert!(!world.contains(entity));
    }
    // Non-matching archetypes are untouched.
    assert!(world.contains(bystander));
    assert_eq!(world.get::<Item>(bystander).unwrap().k, 1);
}

#[test]
fn migration_never_double_drops_component_values() {
    init_registry();
    let mut world = World::new();

    let entity = world.create_entity().unwrap();
    world.add_components(entity, (MigrationProbe,)).unwrap();

    // Two migrations carry the probe between archetypes by byte move; the
    // value itself must not be dropped along the way.
    world.add_components(entity, (Item { k: 1 },)).unwrap();
    world.add_components(entity, (Sprite { frame: 0 },)).unwrap();
    assert_eq!(MIGRATION_DROPS.load(Ordering::SeqCst), 0);

    // Detaching the component drops its value exactly once.
    world.remove_components::<(MigrationProbe,)>(entity).unwrap();
    assert_eq!(MIGRATION_DROPS.load(Ordering::SeqCst), 1);
}

#[test]
fn world_teardown_drops_every_live_value_once() {
    init_registry();
    {
        let mut world = World::new();
        for _ in 0..3 {
            let entity = world.create_entity().unwrap();
            world.add_components(entity, (TeardownProbe,)).unwrap();
        }
        // One value leaves early via remove_entity.
        let early = world.create_entity().unwrap();
        world.add_components(early, (TeardownProbe,)).unwrap();
        world.remove_entity(early).unwrap();
        assert_eq!(TEARDOWN_DROPS.load(Ordering::SeqCst), 1);
    }
    assert_eq!(TEARDOWN_DROPS.load(Ordering::SeqCst), 4);
}
