//! World: archetype table, entity index, and the transition protocol.
//!
//! The [`World`] owns every archetype and the entity→archetype index, and
//! exposes the public entity/component operations. It is the only type that
//! coordinates more than one archetype at a time, which it must do whenever
//! an entity's component set changes.
//!
//! ## Archetype table
//! Archetypes live in a vector and are additionally indexed by their mask
//! (`ComponentMask → ArchetypeId`). They are created lazily on first need
//! and never destroyed within the world's lifetime, so archetype ids stay
//! stable and query iteration order is deterministic.
//!
//! ## Transition protocol
//! Adding or removing components migrates one entity's row atomically:
//!
//! 1. Compute the target mask (union on add, difference on remove).
//! 2. Resolve or create the target archetype; equal masks are a no-op.
//! 3. Register the entity as a new row of the destination.
//! 4. Append newly added component values to the destination columns
//!    (add only).
//! 5. Byte-move the carry-over values (source ∩ destination) into the
//!    destination columns.
//! 6. Swap-remove the source row, dropping only the values that were not
//!    carried over, and patch the source bimap.
//! 7. Point the entity index at the destination.
//!
//! Steps 4–6 never unwind: values are relocated by byte copy and the only
//! user code involved is the `Drop` of discarded values.
//!
//! ## Concurrency
//! A world is a plain value with no internal synchronization; callers
//! needing shared access must synchronize externally. Every operation runs
//! to completion on the calling thread.

use std::any::type_name;
use std::collections::HashMap;

use crate::engine::archetype::Archetype;
use crate::engine::component::{component_id_of, component_info, ComponentBundle, ComponentSet};
use crate::engine::entity::EntityAllocator;
use crate::engine::error::{ColumnError, EcsError, EcsResult};
use crate::engine::types::{ArchetypeId, ComponentMask, EntityId};

/// The archetype-based entity-component store.
///
/// ## Ownership
/// The world exclusively owns its archetypes; each archetype exclusively
/// owns its columns; each column owns its buffer and the live values in it.
/// Entities are bare identifiers; the `entity_to_archetype` index is the
/// single source of truth for where an entity resides.
pub struct World {
    archetypes: Vec<Archetype>,
    archetype_by_mask: HashMap<ComponentMask, ArchetypeId>,
    entity_to_archetype: HashMap<EntityId, ArchetypeId>,
    entities: EntityAllocator,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Creates an empty world. Archetypes are allocated lazily.
    pub fn new() -> Self {
        Self {
            archetypes: Vec::new(),
            archetype_by_mask: HashMap::new(),
            entity_to_archetype: HashMap::new(),
            entities: EntityAllocator::new(),
        }
    }

    /// All archetypes in creation order.
    #[inline]
    pub fn archetypes(&self) -> &[Archetype] {
        &self.archetypes
    }

    #[inline]
    pub(crate) fn archetypes_mut(&mut self) -> &mut [Archetype] {
        &mut self.archetypes
    }

    /// Number of live entities.
    #[inline]
    pub fn entity_count(&self) -> usize {
        self.entity_to_archetype.len()
    }

    /// Number of archetypes created so far.
    #[inline]
    pub fn archetype_count(&self) -> usize {
        self.archetypes.len()
    }

    /// Returns `true` if `entity` exists in this world.
    #[inline]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.entity_to_archetype.contains_key(&entity)
    }

    /// The archetype `entity` currently resides in.
    ///
    /// ## Errors
    /// [`EcsError::UnknownEntity`] if the entity does not exist.
    pub fn archetype_of(&self, entity: EntityId) -> EcsResult<&Archetype> {
        let archetype_id = self
            .entity_to_archetype
            .get(&entity)
            .copied()
            .ok_or(EcsError::UnknownEntity(entity))?;
        Ok(&self.archetypes[archetype_id as usize])
    }

    fn get_or_create_archetype(&mut self, mask: ComponentMask) -> EcsResult<ArchetypeId> {
        if let Some(&id) = self.archetype_by_mask.get(&mask) {
            return Ok(id);
        }
        if self.archetypes.len() > ArchetypeId::MAX as usize {
            return Err(EcsError::Internal("archetype table overflow".into()));
        }
        let id = self.archetypes.len() as ArchetypeId;
        self.archetypes.push(Archetype::new(id, mask)?);
        self.archetype_by_mask.insert(mask, id);
        Ok(id)
    }

    /// Mutable access to two distinct archetypes at once.
    fn archetype_pair_mut(
        &mut self,
        a: ArchetypeId,
        b: ArchetypeId,
    ) -> (&mut Archetype, &mut Archetype) {
        assert!(a != b, "source and destination archetype must differ");
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        let (head, tail) = self.archetypes.split_at_mut(high as usize);
        let low_ref = &mut head[low as usize];
        let high_ref = &mut tail[0];
        if a < b {
            (low_ref, high_ref)
        } else {
            (high_ref, low_ref)
        }
    }

    /// Creates a fresh entity with no components.
    ///
    /// The entity is inserted into the empty archetype immediately, so
    /// `has` / `get` / `remove_entity` treat it exactly like an entity whose
    /// components were all removed.
    ///
    /// ## Errors
    /// [`EcsError::EntityIdsExhausted`] once the id space is spent.
    pub fn create_entity(&mut self) -> EcsResult<EntityId> {
        let entity = self.entities.allocate()?;
        let archetype_id = self.get_or_create_archetype(ComponentMask::EMPTY)?;
        self.archetypes[archetype_id as usize].add_row(entity)?;
        self.entity_to_archetype.insert(entity, archetype_id);
        Ok(entity)
    }

    /// Attaches the components of `bundle` to `entity`.
    ///
    /// ## Behavior
    /// Executes the transition protocol with target mask
    /// `current ∪ bundle`. Existing component values are carried over
    /// untouched; the bundle's values fill the newly added columns. The
    /// empty bundle `()` is a no-op.
    ///
    /// ## Errors
    /// - [`EcsError::UnknownEntity`] if the entity does not exist.
    /// - [`EcsError::DuplicateComponent`] if the entity already has any
    ///   component of the bundle.
    /// - [`EcsError::Registry`] if a bundle type was never registered.
    pub fn add_components<B: ComponentBundle>(
        &mut self,
        entity: EntityId,
        bundle: B,
    ) -> EcsResult<()> {
        let source_id = self
            .entity_to_archetype
            .get(&entity)
            .copied()
            .ok_or(EcsError::UnknownEntity(entity))?;

        let added = B::mask()?;
        if added.is_empty() {
            return Ok(());
        }

        let source_mask = *self.archetypes[source_id as usize].mask();
        if source_mask.intersects(&added) {
            let overlap = source_mask.intersection(&added);
            let name = match overlap.iter().next() {
                Some(component_id) => component_info(component_id)?.name,
                None => "<unknown>",
            };
            return Err(EcsError::DuplicateComponent { entity, name });
        }

        let target_mask = source_mask.union(&added);
        let destination_id = self.get_or_create_archetype(target_mask)?;

        let (source, destination) = self.archetype_pair_mut(source_id, destination_id);
        destination.add_row(entity)?;
        bundle.write_into(destination)?;
        source.transfer_row_into(destination, entity)?;

        self.entity_to_archetype.insert(entity, destination_id);
        debug_assert!(self.archetype_rows_consistent(destination_id));
        debug_assert!(self.archetype_rows_consistent(source_id));
        Ok(())
    }

    /// Detaches the component types of `S` from `entity`.
    ///
    /// ## Behavior
    /// Executes the transition protocol with target mask `current \ S`.
    /// Detached values are dropped; the rest are carried over. Removing
    /// component types the entity does not have is a silent no-op; removing
    /// every component leaves the entity alive in the empty archetype.
    ///
    /// ## Errors
    /// - [`EcsError::UnknownEntity`] if the entity does not exist.
    /// - [`EcsError::Registry`] if a type of `S` was never registered.
    pub fn remove_components<S: ComponentSet>(&mut self, entity: EntityId) -> EcsResult<()> {
        let source_id = self
            .entity_to_archetype
            .get(&entity)
            .copied()
            .ok_or(EcsError::UnknownEntity(entity))?;

        let removed = S::mask()?;
        let source_mask = *self.archetypes[source_id as usize].mask();
        let target_mask = source_mask.difference(&removed);
        if target_mask == source_mask {
            return Ok(());
        }

        let destination_id = self.get_or_create_archetype(target_mask)?;
        let (source, destination) = self.archetype_pair_mut(source_id, destination_id);
        destination.add_row(entity)?;
        source.transfer_row_into(destination, entity)?;

        self.entity_to_archetype.insert(entity, destination_id);
        debug_assert!(self.archetype_rows_consistent(destination_id));
        debug_assert!(self.archetype_rows_consistent(source_id));
        Ok(())
    }

    /// Removes `entity` and drops all of its component values.
    ///
    /// Returns `Ok(false)` if the entity never existed (or was already
    /// removed). The id is not reused.
    pub fn remove_entity(&mut self, entity: EntityId) -> EcsResult<bool> {
        let Some(archetype_id) = self.entity_to_archetype.remove(&entity) else {
            return Ok(false);
        };
        self.archetypes[archetype_id as usize].remove_row(entity)?;
        Ok(true)
    }

    /// Shared reference to `entity`'s component of type `T`.
    ///
    /// ## Errors
    /// - [`EcsError::UnknownEntity`] if the entity does not exist.
    /// - [`EcsError::MissingComponent`] if it does not own a `T`.
    pub fn get<T: Send + Sync + 'static>(&self, entity: EntityId) -> EcsResult<&T> {
        let archetype = self.archetype_of(entity)?;
        let row = archetype
            .row_of(entity)
            .ok_or_else(|| EcsError::Internal(format!("entity {} missing from its archetype", entity)))?;
        let component_id = component_id_of::<T>()?;
        let column = archetype
            .column(component_id)
            .ok_or(EcsError::MissingComponent {
                entity,
                name: type_name::<T>(),
            })?;
        let slice = column
            .as_slice::<T>()
            .ok_or(EcsError::Column(ColumnError::TypeMismatch {
                expected: column.type_info().name,
                actual: type_name::<T>(),
            }))?;
        slice
            .get(row)
            .ok_or_else(|| EcsError::Internal(format!("row {} out of range in column", row)))
    }

    /// Mutable reference to `entity`'s component of type `T`.
    ///
    /// ## Errors
    /// As [`World::get`].
    pub fn get_mut<T: Send + Sync + 'static>(&mut self, entity: EntityId) -> EcsResult<&mut T> {
        let archetype_id = self
            .entity_to_archetype
            .get(&entity)
            .copied()
            .ok_or(EcsError::UnknownEntity(entity))?;
        let archetype = &mut self.archetypes[archetype_id as usize];
        let row = archetype
            .row_of(entity)
            .ok_or_else(|| EcsError::Internal(format!("entity {} missing from its archetype", entity)))?;
        let component_id = component_id_of::<T>()?;
        let column = archetype
            .column_mut(component_id)
            .ok_or(EcsError::MissingComponent {
                entity,
                name: type_name::<T>(),
            })?;
        let expected = column.type_info().name;
        let slice = column
            .as_mut_slice::<T>()
            .ok_or(EcsError::Column(ColumnError::TypeMismatch {
                expected,
                actual: type_name::<T>(),
            }))?;
        slice
            .get_mut(row)
            .ok_or_else(|| EcsError::Internal(format!("row {} out of range in column", row)))
    }

    /// Shared references to several of `entity`'s components at once.
    ///
    /// `S` is a tuple of component types, e.g.
    /// `world.get_many::<(Position, Velocity)>(entity)`.
    ///
    /// ## Errors
    /// - [`EcsError::UnknownEntity`] if the entity does not exist.
    /// - [`EcsError::MissingComponent`] if any member type is absent.
    pub fn get_many<S: ComponentSet>(&self, entity: EntityId) -> EcsResult<S::Refs<'_>> {
        let archetype = self.archetype_of(entity)?;
        let row = archetype
            .row_of(entity)
            .ok_or_else(|| EcsError::Internal(format!("entity {} missing from its archetype", entity)))?;
        let wanted = S::mask()?;
        if !archetype.mask().contains_all(&wanted) {
            let missing = wanted.difference(archetype.mask());
            let name = match missing.iter().next() {
                Some(component_id) => component_info(component_id)?.name,
                None => "<unknown>",
            };
            return Err(EcsError::MissingComponent { entity, name });
        }
        let ptrs = S::base_ptrs(archetype)?;
        // SAFETY: the mask check guarantees every column exists and stores
        // the entity's row; the returned references borrow `self` shared.
        Ok(unsafe { S::refs_at(ptrs, row) })
    }

    /// Mutable references to several of `entity`'s components at once.
    ///
    /// ## Errors
    /// As [`World::get_many`]; additionally rejects a set naming the same
    /// component type twice, which would alias the returned references.
    pub fn get_many_mut<S: ComponentSet>(&mut self, entity: EntityId) -> EcsResult<S::Muts<'_>> {
        let wanted = S::mask()?;
        if wanted.count() != S::LEN {
            return Err(EcsError::Internal(
                "component set names a type more than once".into(),
            ));
        }
        let archetype_id = self
            .entity_to_archetype
            .get(&entity)
            .copied()
            .ok_or(EcsError::UnknownEntity(entity))?;
        let archetype = &mut self.archetypes[archetype_id as usize];
        let row = archetype
            .row_of(entity)
            .ok_or_else(|| EcsError::Internal(format!("entity {} missing from its archetype", entity)))?;
        if !archetype.mask().contains_all(&wanted) {
            let missing = wanted.difference(archetype.mask());
            let name = match missing.iter().next() {
                Some(component_id) => component_info(component_id)?.name,
                None => "<unknown>",
            };
            return Err(EcsError::MissingComponent { entity, name });
        }
        let ptrs = S::base_ptrs(archetype)?;
        // SAFETY: every column exists and stores the entity's row; the set's
        // member types are distinct (checked above), so the references are
        // disjoint, and they borrow `self` exclusively.
        Ok(unsafe { S::muts_at(ptrs, row) })
    }

    /// Returns `true` iff `entity` owns every component type of `S`.
    ///
    /// ## Errors
    /// [`EcsError::UnknownEntity`] if the entity does not exist.
    pub fn has<S: ComponentSet>(&self, entity: EntityId) -> EcsResult<bool> {
        let archetype = self.archetype_of(entity)?;
        Ok(archetype.mask().contains_all(&S::mask()?))
    }

    /// Drops every row of archetype `index` and forgets its entities.
    pub(crate) fn clear_archetype_rows(&mut self, index: usize) {
        let Self {
            archetypes,
            entity_to_archetype,
            ..
        } = self;
        let archetype = &mut archetypes[index];
        for entity in archetype.entities() {
            entity_to_archetype.remove(entity);
        }
        archetype.clear_rows();
    }

    /// Removes `entity` from archetype `index` and the entity index.
    pub(crate) fn despawn_from_archetype(
        &mut self,
        index: usize,
        entity: EntityId,
    ) -> EcsResult<()> {
        self.archetypes[index].remove_row(entity)?;
        self.entity_to_archetype.remove(&entity);
        Ok(())
    }

    fn archetype_rows_consistent(&self, archetype_id: ArchetypeId) -> bool {
        let archetype = &self.archetypes[archetype_id as usize];
        let rows = archetype.len();
        archetype
            .mask()
            .iter()
            .all(|component_id| match archetype.column(component_id) {
                Some(column) => column.len() == rows,
                None => false,
            })
    }
}
