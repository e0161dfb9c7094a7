//! Archetype storage: one table per component set.
//!
//! An [`Archetype`] stores every entity that currently has exactly the same
//! set of component types. Component data is kept column-major, one
//! [`ComponentColumn`] per set bit of the archetype's mask, so iterating a
//! component subset sweeps contiguous memory.
//!
//! ## Design
//! - The mask is fixed at construction and never changes; entities whose
//!   component set changes migrate to a different archetype.
//! - Entities are densely packed; removal uses swap-remove so every column
//!   stays gap-free.
//! - A row↔entity bimap (`row_to_entity` / `entity_to_row`) tracks where
//!   each entity lives.
//!
//! ## Invariants
//! - Every column's length equals the archetype's row count.
//! - `row_to_entity[entity_to_row[e]] == e` for every resident entity.
//! - The set of allocated columns is exactly the set bits of the mask.
//!
//! ## Row transfer
//! Moving an entity between archetypes relocates the shared component
//! values by byte move ([`ComponentColumn::push_from`]) and then compacts
//! the source row. Slots whose values were moved out are compacted without
//! being dropped; slots being discarded (components removed) are dropped
//! normally.

use std::collections::HashMap;

use crate::engine::component::component_info;
use crate::engine::error::{EcsError, EcsResult};
use crate::engine::storage::ComponentColumn;
use crate::engine::types::{ArchetypeId, ComponentMask, ComponentTypeId, EntityId, MAX_COMPONENTS};

/// Stores all entities sharing one component mask, column-major.
pub struct Archetype {
    id: ArchetypeId,
    mask: ComponentMask,
    columns: Vec<Option<ComponentColumn>>,
    row_to_entity: Vec<EntityId>,
    entity_to_row: HashMap<EntityId, usize>,
}

/// Archetypes are identified by their mask; a world holds at most one
/// archetype per mask.
impl PartialEq for Archetype {
    fn eq(&self, other: &Self) -> bool {
        self.mask == other.mask
    }
}

impl Eq for Archetype {}

impl Archetype {
    /// Creates an empty archetype for `mask`.
    ///
    /// ## Behavior
    /// Allocates one empty column per set bit of the mask, using the vtable
    /// registered for each component type.
    ///
    /// ## Errors
    /// Fails if any set bit names an unregistered component type.
    pub fn new(id: ArchetypeId, mask: ComponentMask) -> EcsResult<Self> {
        let mut columns: Vec<Option<ComponentColumn>> =
            (0..MAX_COMPONENTS).map(|_| None).collect();
        for component_id in mask.iter() {
            let info = component_info(component_id)?;
            columns[component_id as usize] = Some(ComponentColumn::new(info));
        }
        Ok(Self {
            id,
            mask,
            columns,
            row_to_entity: Vec::new(),
            entity_to_row: HashMap::new(),
        })
    }

    /// Dense index of this archetype within its world.
    #[inline]
    pub fn id(&self) -> ArchetypeId {
        self.id
    }

    /// The component mask this archetype stores.
    #[inline]
    pub fn mask(&self) -> &ComponentMask {
        &self.mask
    }

    /// Number of resident entities (rows).
    #[inline]
    pub fn len(&self) -> usize {
        self.row_to_entity.len()
    }

    /// Returns `true` if no entity resides here.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.row_to_entity.is_empty()
    }

    /// Returns `true` if `entity` resides in this archetype.
    #[inline]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.entity_to_row.contains_key(&entity)
    }

    /// Row index of `entity`, if resident.
    #[inline]
    pub fn row_of(&self, entity: EntityId) -> Option<usize> {
        self.entity_to_row.get(&entity).copied()
    }

    /// Entity residing at `row`, if any.
    #[inline]
    pub fn entity_at(&self, row: usize) -> Option<EntityId> {
        self.row_to_entity.get(row).copied()
    }

    /// Resident entities in row order.
    #[inline]
    pub fn entities(&self) -> &[EntityId] {
        &self.row_to_entity
    }

    /// Returns `true` if the mask contains `component_id`.
    #[inline]
    pub fn has_component(&self, component_id: ComponentTypeId) -> bool {
        self.mask.has(component_id)
    }

    /// The column for `component_id`, if this archetype stores it.
    #[inline]
    pub fn column(&self, component_id: ComponentTypeId) -> Option<&ComponentColumn> {
        self.columns
            .get(component_id as usize)
            .and_then(|column| column.as_ref())
    }

    /// Mutable access to the column for `component_id`.
    #[inline]
    pub fn column_mut(&mut self, component_id: ComponentTypeId) -> Option<&mut ComponentColumn> {
        self.columns
            .get_mut(component_id as usize)
            .and_then(|column| column.as_mut())
    }

    fn column_ref(&self, component_id: ComponentTypeId) -> EcsResult<&ComponentColumn> {
        self.column(component_id).ok_or_else(|| {
            EcsError::Internal(format!(
                "archetype {} missing column {} named by its mask",
                self.id, component_id
            ))
        })
    }

    fn column_mut_ref(&mut self, component_id: ComponentTypeId) -> EcsResult<&mut ComponentColumn> {
        let id = self.id;
        self.column_mut(component_id).ok_or_else(|| {
            EcsError::Internal(format!(
                "archetype {} missing column {} named by its mask",
                id, component_id
            ))
        })
    }

    /// Registers `entity` as the next row and returns the new row index.
    ///
    /// ## Behavior
    /// Touches only the row bimap; columns are filled separately as part of
    /// the transition protocol, which restores the row/column length
    /// agreement before it completes.
    pub fn add_row(&mut self, entity: EntityId) -> EcsResult<usize> {
        if self.contains(entity) {
            return Err(EcsError::Internal(format!(
                "entity {} already resides in archetype {}",
                entity, self.id
            )));
        }
        let row = self.row_to_entity.len();
        self.row_to_entity.push(entity);
        self.entity_to_row.insert(entity, row);
        Ok(row)
    }

    /// Swap-removes the row of `entity`, dropping its component values.
    ///
    /// ## Behavior
    /// Every column swap-removes the row, then the bimap is patched for the
    /// entity that was relocated into the vacated slot (if any).
    ///
    /// ## Errors
    /// [`EcsError::UnknownEntity`] if `entity` does not reside here.
    pub fn remove_row(&mut self, entity: EntityId) -> EcsResult<()> {
        self.remove_row_skipping(entity, &ComponentMask::EMPTY)
    }

    /// Swap-removes the row of `entity`, skipping the drop of columns whose
    /// values were already moved out during a transition.
    pub(crate) fn remove_row_skipping(
        &mut self,
        entity: EntityId,
        moved_out: &ComponentMask,
    ) -> EcsResult<()> {
        let row = self
            .entity_to_row
            .remove(&entity)
            .ok_or(EcsError::UnknownEntity(entity))?;

        let mask = self.mask;
        for component_id in mask.iter() {
            let column = self.column_mut_ref(component_id)?;
            if moved_out.has(component_id) {
                column.swap_remove_forget(row)?;
            } else {
                column.swap_remove(row)?;
            }
        }

        let last = self.row_to_entity.len() - 1;
        if row != last {
            let relocated = self.row_to_entity[last];
            self.row_to_entity[row] = relocated;
            self.entity_to_row.insert(relocated, row);
        }
        self.row_to_entity.pop();
        Ok(())
    }

    /// Moves the carry-over component values of `entity` into `destination`.
    ///
    /// ## Behavior
    /// For every component type present in both masks, the value at the
    /// entity's source row is byte-moved onto the end of the destination
    /// column. The source row is then swap-removed; the moved-out slots are
    /// compacted without being dropped, while slots of component types the
    /// destination does not store are dropped normally.
    ///
    /// The caller must have registered the entity in the destination's row
    /// bimap beforehand and is responsible for filling any destination-only
    /// columns, so that both archetypes satisfy the row/column agreement
    /// once the transition completes.
    ///
    /// ## Errors
    /// [`EcsError::UnknownEntity`] if `entity` does not reside here.
    pub fn transfer_row_into(
        &mut self,
        destination: &mut Archetype,
        entity: EntityId,
    ) -> EcsResult<()> {
        let source_row = self
            .row_of(entity)
            .ok_or(EcsError::UnknownEntity(entity))?;

        let shared = self.mask.intersection(destination.mask());
        for component_id in shared.iter() {
            let source_column = self.column_ref(component_id)?;
            let source_ptr = source_column.ptr(source_row).ok_or_else(|| {
                EcsError::Internal(format!(
                    "row {} missing in column {} of archetype {}",
                    source_row, component_id, self.id
                ))
            })?;
            let destination_column = destination.column_mut_ref(component_id)?;
            // SAFETY: the pointer addresses a live element of the same
            // registered type (both columns were built from its vtable),
            // and `remove_row_skipping` below abandons the source slot
            // without dropping it.
            unsafe { destination_column.push_from(source_ptr) };
        }

        self.remove_row_skipping(entity, &shared)
    }

    /// Drops every row: all columns are cleared and the bimap is reset.
    pub fn clear_rows(&mut self) {
        let mask = self.mask;
        for component_id in mask.iter() {
            if let Some(column) = self.columns[component_id as usize].as_mut() {
                column.clear();
            }
        }
        self.row_to_entity.clear();
        self.entity_to_row.clear();
    }
}
