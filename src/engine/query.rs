//! Typed query construction and execution.
//!
//! A [`Query`] is a compile-time-typed view over every archetype whose mask
//! contains the query's include set and avoids its exclude set. The iterated
//! component types are given as a tuple type parameter; additional
//! presence/absence constraints are added with [`Query::with`] and
//! [`Query::without`].
//!
//! ## Execution model
//! 1. The include mask is built from the tuple's component ids at
//!    construction time.
//! 2. At execution time the world's archetypes are scanned and matched on
//!    masks (two bitwise comparisons per archetype).
//! 3. For each matching archetype, the typed base pointer of every iterated
//!    column is captured once, and the callable is invoked per row with
//!    references derived from those bases. Per-row dispatch involves no
//!    type lookup.
//!
//! ## Const correctness
//! [`Query::each`] borrows the world shared and hands out shared component
//! references; [`Query::each_mut`] requires `&mut World` and hands out
//! mutable references. Because the world stays borrowed for the duration of
//! the call, structural mutation from inside the callable is rejected at
//! compile time. [`Query::remove_if`] is the supported way to remove
//! entities based on a per-row predicate.
//!
//! ## Ordering
//! Rows are visited in ascending row order within an archetype; archetypes
//! are visited in creation order, which is stable while the world is not
//! structurally modified.

use std::marker::PhantomData;

use crate::engine::component::ComponentSet;
use crate::engine::error::{EcsError, EcsResult};
use crate::engine::types::{ComponentMask, EntityId};
use crate::engine::world::World;

/// A compile-time-typed view over matching archetypes.
///
/// `Q` is a tuple of the component types the query iterates, e.g.
/// `Query::<(Position, Velocity)>`.
///
/// ## Example
/// ```ignore
/// let query = Query::<(Position, Velocity)>::new()?;
/// query.each_mut(&mut world, |(position, velocity): (&mut Position, &mut Velocity)| {
///     position.x += velocity.dx;
/// })?;
/// ```
pub struct Query<Q: ComponentSet> {
    include: ComponentMask,
    exclude: ComponentMask,
    _marker: PhantomData<fn() -> Q>,
}

impl<Q: ComponentSet> Clone for Query<Q> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Q: ComponentSet> Copy for Query<Q> {}

impl<Q: ComponentSet> Query<Q> {
    /// Creates a query over the component types of `Q`.
    ///
    /// The include mask starts as the ids of `Q`; the exclude mask starts
    /// empty.
    ///
    /// ## Errors
    /// Fails if any component type of `Q` was never registered, or if `Q`
    /// names the same component type twice (which would alias the mutable
    /// references handed out by [`Query::each_mut`]).
    pub fn new() -> EcsResult<Self> {
        let include = Q::mask()?;
        if include.count() != Q::LEN {
            return Err(EcsError::Internal(
                "query names a component type more than once".into(),
            ));
        }
        Ok(Self {
            include,
            exclude: ComponentMask::EMPTY,
            _marker: PhantomData,
        })
    }

    /// Requires the component types of `W` to be present on matched
    /// archetypes without iterating them.
    ///
    /// ## Errors
    /// Fails if any type of `W` was never registered.
    pub fn with<W: ComponentSet>(mut self) -> EcsResult<Self> {
        self.include = self.include.union(&W::mask()?);
        Ok(self)
    }

    /// Excludes archetypes storing any component type of `E`.
    ///
    /// ## Errors
    /// Fails if any type of `E` was never registered.
    pub fn without<E: ComponentSet>(mut self) -> EcsResult<Self> {
        self.exclude = self.exclude.union(&E::mask()?);
        Ok(self)
    }

    /// Returns `true` if an archetype with `mask` is matched by this query.
    #[inline]
    pub fn matches(&self, mask: &ComponentMask) -> bool {
        mask.contains_all(&self.include) && !mask.intersects(&self.exclude)
    }

    /// Invokes `f` once per matching row with shared component references.
    ///
    /// The callable must not structurally modify the world; because the world
    /// stays borrowed, it cannot.
    ///
    /// ```compile_fail
    /// use colonnade::{Query, World};
    ///
    /// #[derive(Clone, Copy)]
    /// struct Health(f32);
    ///
    /// // A shared world only hands out shared component references.
    /// fn regenerate(world: &World, query: Query<(Health,)>) {
    ///     query.each_mut(world, |(health,): (&mut Health,)| {
    ///         health.0 += 1.0;
    ///     }).unwrap();
    /// }
    /// ```
    pub fn each<F>(&self, world: &World, mut f: F) -> EcsResult<()>
    where
        F: for<'w> FnMut(Q::Refs<'w>),
    {
        for archetype in world.archetypes() {
            if !self.matches(archetype.mask()) {
                continue;
            }
            let rows = archetype.len();
            if rows == 0 {
                continue;
            }
            let ptrs = Q::base_ptrs(archetype)?;
            for row in 0..rows {
                // SAFETY: the mask matched, the columns hold `rows` live
                // elements, and only shared references are derived while
                // the world is borrowed shared.
                f(unsafe { Q::refs_at(ptrs, row) });
            }
        }
        Ok(())
    }

    /// As [`Query::each`], additionally passing each row's [`EntityId`].
    pub fn each_with_entity<F>(&self, world: &World, mut f: F) -> EcsResult<()>
    where
        F: for<'w> FnMut(Q::Refs<'w>, EntityId),
    {
        for archetype in world.archetypes() {
            if !self.matches(archetype.mask()) {
                continue;
            }
            let rows = archetype.len();
            if rows == 0 {
                continue;
            }
            let ptrs = Q::base_ptrs(archetype)?;
            for row in 0..rows {
                let entity = archetype.entities()[row];
                // SAFETY: as in `each`.
                f(unsafe { Q::refs_at(ptrs, row) }, entity);
            }
        }
        Ok(())
    }

    /// Invokes `f` once per matching row with mutable component references.
    ///
    /// Component *values* may be mutated freely; structural changes are
    /// rejected at compile time because the world is exclusively borrowed
    /// for the duration of the call.
    pub fn each_mut<F>(&self, world: &mut World, mut f: F) -> EcsResult<()>
    where
        F: for<'w> FnMut(Q::Muts<'w>),
    {
        for archetype in world.archetypes_mut() {
            if !self.matches(archetype.mask()) {
                continue;
            }
            let rows = archetype.len();
            if rows == 0 {
                continue;
            }
            let ptrs = Q::base_ptrs(archetype)?;
            for row in 0..rows {
                // SAFETY: the world is exclusively borrowed, every row is
                // visited once, and the member types of a set are distinct
                // columns, so the derived mutable borrows are disjoint.
                f(unsafe { Q::muts_at(ptrs, row) });
            }
        }
        Ok(())
    }

    /// As [`Query::each_mut`], additionally passing each row's
    /// [`EntityId`].
    pub fn each_mut_with_entity<F>(&self, world: &mut World, mut f: F) -> EcsResult<()>
    where
        F: for<'w> FnMut(Q::Muts<'w>, EntityId),
    {
        for archetype in world.archetypes_mut() {
            if !self.matches(archetype.mask()) {
                continue;
            }
            let rows = archetype.len();
            if rows == 0 {
                continue;
            }
            let ptrs = Q::base_ptrs(archetype)?;
            for row in 0..rows {
                let entity = archetype.entities()[row];
                // SAFETY: as in `each_mut`.
                f(unsafe { Q::muts_at(ptrs, row) }, entity);
            }
        }
        Ok(())
    }

    /// Total number of rows across matching archetypes.
    pub fn size(&self, world: &World) -> u64 {
        world
            .archetypes()
            .iter()
            .filter(|archetype| self.matches(archetype.mask()))
            .map(|archetype| archetype.len() as u64)
            .sum()
    }

    /// Removes every row of every matching archetype.
    ///
    /// All component values are dropped, row bookkeeping is reset, and the
    /// removed entities cease to exist.
    pub fn clear(&self, world: &mut World) {
        let matching: Vec<usize> = world
            .archetypes()
            .iter()
            .enumerate()
            .filter(|(_, archetype)| self.matches(archetype.mask()))
            .map(|(index, _)| index)
            .collect();
        for index in matching {
            world.clear_archetype_rows(index);
        }
    }

    /// Removes every matching entity for which `pred` returns `true`.
    ///
    /// ## Behavior
    /// Per archetype, the predicate is evaluated over all rows first; the
    /// selected rows are then swap-removed in descending row order, so
    /// predicate invocations never observe a partially edited archetype and
    /// pending rows never shift under the removal.
    ///
    /// Returns the number of entities removed.
    pub fn remove_if<P>(&self, world: &mut World, mut pred: P) -> EcsResult<u64>
    where
        P: for<'w> FnMut(EntityId, Q::Refs<'w>) -> bool,
    {
        let mut removed = 0u64;
        for index in 0..world.archetypes().len() {
            let archetype = &world.archetypes()[index];
            if !self.matches(archetype.mask()) {
                continue;
            }
            let rows = archetype.len();
            if rows == 0 {
                continue;
            }
            let ptrs = Q::base_ptrs(archetype)?;
            let mut selected: Vec<EntityId> = Vec::new();
            for row in 0..rows {
                let entity = archetype.entities()[row];
                // SAFETY: as in `each`; the predicate receives shared
                // references and no mutation happens during evaluation.
                if pred(entity, unsafe { Q::refs_at(ptrs, row) }) {
                    selected.push(entity);
                }
            }
            for &entity in selected.iter().rev() {
                world.despawn_from_archetype(index, entity)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
