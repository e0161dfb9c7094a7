#![allow(dead_code)]

use std::sync::Once;

use colonnade::prelude::*;

pub const ENTITIES_SMALL: usize = 10_000;
pub const ENTITIES_MED: usize = 100_000;

#[derive(Clone, Copy)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy)]
pub struct Velocity {
    pub dx: f32,
    pub dy: f32,
}

#[derive(Clone, Copy)]
pub struct Wealth {
    pub value: f32,
}

static INIT: Once = Once::new();

pub fn init_components() {
    INIT.call_once(|| {
        register_component::<Position>().unwrap();
        register_component::<Velocity>().unwrap();
        register_component::<Wealth>().unwrap();
        freeze_components().unwrap();
    });
}

pub fn populate(world: &mut World, count: usize) -> EcsResult<()> {
    for i in 0..count {
        let entity = world.create_entity()?;
        world.add_components(
            entity,
            (
                Position { x: i as f32, y: 0.0 },
                Velocity { dx: 1.0, dy: 0.0 },
            ),
        )?;
    }
    Ok(())
}

pub fn populated_world(count: usize) -> World {
    let mut world = World::new();
    populate(&mut world, count).unwrap();
    world
}
