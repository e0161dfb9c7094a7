//! # Colonnade
//!
//! Archetype-based Entity-Component-System data store with type-erased
//! Structure-of-Arrays columns.
//!
//! Entities are opaque identifiers; components are arbitrary user-defined
//! value types attached to entities; an *archetype* is the set of component
//! types an entity currently has. All entities sharing an archetype store
//! their components column-major, so queries over a component subset sweep
//! contiguous memory.
//!
//! ## Design goals
//! - Archetype-based storage for cache efficiency
//! - Compact dense component ids and bitset archetype masks
//! - Compile-time-typed queries with include/exclude filtering
//! - Explicit, structured error reporting; no panics in library code
//!
//! ## Usage
//! ```ignore
//! use colonnade::prelude::*;
//!
//! #[derive(Clone, Copy)]
//! struct Position { x: f32, y: f32 }
//! #[derive(Clone, Copy)]
//! struct Velocity { dx: f32, dy: f32 }
//!
//! register_component::<Position>()?;
//! register_component::<Velocity>()?;
//! freeze_components()?;
//!
//! let mut world = World::new();
//! let entity = world.create_entity()?;
//! world.add_components(entity, (Position { x: 0.0, y: 0.0 }, Velocity { dx: 1.0, dy: 0.0 }))?;
//!
//! Query::<(Position, Velocity)>::new()?
//!     .each_mut(&mut world, |(position, velocity): (&mut Position, &mut Velocity)| {
//!         position.x += velocity.dx;
//!     })?;
//! ```
//!
//! The world assumes single-threaded exclusive access; the component type
//! registry is process-wide and should be populated (and ideally frozen)
//! before the first world operation.

#![forbid(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

pub mod engine;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports (Public API)
// ─────────────────────────────────────────────────────────────────────────────

pub use engine::world::World;

pub use engine::query::Query;

pub use engine::component::{
    component_id_of, component_info, freeze_components, register_component,
    registered_component_count, ComponentBundle, ComponentSet, ComponentTypeInfo,
};

pub use engine::error::{ColumnError, EcsError, EcsResult, RegistryError};

pub use engine::types::{
    build_mask, ArchetypeId, ComponentMask, ComponentTypeId, EntityId, MAX_COMPONENTS,
};

// ─────────────────────────────────────────────────────────────────────────────
// Prelude
// ─────────────────────────────────────────────────────────────────────────────

/// Commonly used types and functions.
///
/// Import with:
/// ```rust
/// use colonnade::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        component_id_of, freeze_components, register_component, ComponentMask, EcsError,
        EcsResult, EntityId, Query, World,
    };
}
