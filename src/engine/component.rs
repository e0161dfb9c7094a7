//! Component type registry and component group traits.
//!
//! This module provides a process-wide registry that assigns stable
//! [`ComponentTypeId`] values to Rust component types and captures the
//! per-type vtable ([`ComponentTypeInfo`]) that archetype columns need to
//! store values of that type behind a type-erased buffer.
//!
//! ## Purpose
//! The registry decouples component type information (`TypeId`, name, layout,
//! drop glue) from runtime storage, enabling archetypes to hold heterogeneous
//! component columns without being generic over their element types.
//!
//! ## Design
//! - Components are registered once and assigned a compact id in
//!   `[0, MAX_COMPONENTS)`. Registration is idempotent.
//! - Every value in Rust can be relocated by a plain byte copy, so the
//!   vtable records layout and drop glue only; there is no per-type copy or
//!   move hook to dispatch through.
//! - The registry can be [`freeze_components`]d to prevent further
//!   registrations once world setup is complete.
//!
//! ## Invariants
//! - Ids are unique and stable for the lifetime of the process.
//! - `infos[id]` exists for every id handed out.
//! - When frozen, registration of new types is rejected.
//!
//! ## Concurrency
//! The registry is protected by an `RwLock` for concurrent reads and
//! serialized writes. Once all registrations have completed (or the registry
//! is frozen), lookups are effectively reads of immutable data.

use std::{
    alloc::Layout,
    any::{type_name, TypeId},
    collections::HashMap,
    fmt,
    sync::{OnceLock, RwLock},
};

use crate::engine::archetype::Archetype;
use crate::engine::error::{EcsError, EcsResult, RegistryError, RegistryResult};
use crate::engine::types::{ComponentMask, ComponentTypeId, MAX_COMPONENTS};

/// Per-type vtable captured at registration time.
///
/// ## Purpose
/// Carries everything a type-erased column needs to manage values of one
/// component type: the memory layout, the drop glue, and diagnostic
/// metadata.
///
/// ## Notes
/// `ComponentTypeInfo` is `Copy` and safe to hand out by value; it contains
/// only plain data and function pointers.
#[derive(Clone, Copy, Debug)]
pub struct ComponentTypeInfo {
    /// Runtime identifier assigned to this component type.
    pub id: ComponentTypeId,

    /// Rust type name for diagnostics.
    pub name: &'static str,

    /// Runtime `TypeId` of the component.
    pub type_id: TypeId,

    /// Size and alignment of the component value.
    pub layout: Layout,

    /// Drop glue for one value, present iff the type needs drop.
    pub drop_fn: Option<unsafe fn(*mut u8)>,
}

unsafe fn drop_erased<T>(ptr: *mut u8) {
    // SAFETY: the caller guarantees `ptr` points at a live, properly aligned
    // value of type `T` that is not used again afterwards.
    unsafe { std::ptr::drop_in_place(ptr.cast::<T>()) }
}

impl ComponentTypeInfo {
    /// Constructs the vtable for type `T` with the given id.
    #[inline]
    pub fn of<T: Send + Sync + 'static>(id: ComponentTypeId) -> Self {
        Self {
            id,
            name: type_name::<T>(),
            type_id: TypeId::of::<T>(),
            layout: Layout::new::<T>(),
            drop_fn: if std::mem::needs_drop::<T>() {
                Some(drop_erased::<T>)
            } else {
                None
            },
        }
    }

    /// Size of the component value in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.layout.size()
    }

    /// Alignment of the component value in bytes.
    #[inline]
    pub fn align(&self) -> usize {
        self.layout.align()
    }

    /// Returns `true` if dropping a value of this type runs user code.
    #[inline]
    pub fn needs_drop(&self) -> bool {
        self.drop_fn.is_some()
    }

    /// Returns `true` if this vtable describes type `T`.
    #[inline]
    pub fn matches_type<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

impl fmt::Display for ComponentTypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ComponentTypeInfo {{ id: {}, name: {}, size: {}, align: {} }}",
            self.id,
            self.name,
            self.size(),
            self.align()
        )
    }
}

/// Process-wide mapping between Rust component types and compact ids.
///
/// ## Design
/// - `by_type` maps `TypeId -> ComponentTypeId`.
/// - `infos` stores the vtable indexed by id; its length is the next id to
///   assign, bounded by [`MAX_COMPONENTS`].
/// - `frozen` prevents further registration once world setup is done.
///
/// ## Invariants
/// - Every entry in `by_type` has a matching `infos[id]`.
/// - Ids are always in bounds of [`MAX_COMPONENTS`].
pub struct ComponentRegistry {
    by_type: HashMap<TypeId, ComponentTypeId>,
    infos: Vec<ComponentTypeInfo>,
    frozen: bool,
}

static REGISTRY: OnceLock<RwLock<ComponentRegistry>> = OnceLock::new();

fn component_registry() -> &'static RwLock<ComponentRegistry> {
    REGISTRY.get_or_init(|| {
        RwLock::new(ComponentRegistry {
            by_type: HashMap::new(),
            infos: Vec::new(),
            frozen: false,
        })
    })
}

impl ComponentRegistry {
    fn alloc_id(&self) -> RegistryResult<ComponentTypeId> {
        let next = self.infos.len();
        if next >= MAX_COMPONENTS {
            return Err(RegistryError::CapacityExceeded { cap: MAX_COMPONENTS });
        }
        Ok(next as ComponentTypeId)
    }

    /// Registers component type `T` and returns its assigned id.
    ///
    /// ## Behavior
    /// - If `T` is already registered, returns the existing id.
    /// - Otherwise allocates the next id and records the vtable for `T`.
    ///
    /// ## Errors
    /// - `Frozen` if the registry was frozen before the first registration
    ///   of `T`.
    /// - `CapacityExceeded` past [`MAX_COMPONENTS`] distinct types.
    pub fn register<T: Send + Sync + 'static>(&mut self) -> RegistryResult<ComponentTypeId> {
        let type_id = TypeId::of::<T>();
        if let Some(&existing) = self.by_type.get(&type_id) {
            return Ok(existing);
        }

        if self.frozen {
            return Err(RegistryError::Frozen);
        }

        let id = self.alloc_id()?;
        self.by_type.insert(type_id, id);
        self.infos.push(ComponentTypeInfo::of::<T>(id));
        Ok(id)
    }

    /// Freezes the registry, preventing further component registrations.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Returns `true` if the registry has been frozen.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Returns the id for `T`, if registered.
    pub fn id_of<T: 'static>(&self) -> Option<ComponentTypeId> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }

    /// Returns the id for `T`, failing if it was never registered.
    pub fn require_id_of<T: 'static>(&self) -> RegistryResult<ComponentTypeId> {
        self.id_of::<T>().ok_or(RegistryError::NotRegistered {
            name: type_name::<T>(),
        })
    }

    /// Returns the vtable for `component_id`, if one was registered.
    pub fn info(&self, component_id: ComponentTypeId) -> Option<ComponentTypeInfo> {
        self.infos.get(component_id as usize).copied()
    }

    /// Number of registered component types.
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// Returns `true` if no component type has been registered.
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }
}

/// Registers component type `T` in the process-wide registry.
///
/// ## Purpose
/// Assigns `T` a stable [`ComponentTypeId`] and captures its vtable so
/// archetype columns can be created for it. Idempotent: repeated calls for
/// the same `T` return the same id.
///
/// ## Errors
/// - [`RegistryError::CapacityExceeded`] past [`MAX_COMPONENTS`] distinct
///   types.
/// - [`RegistryError::Frozen`] after [`freeze_components`].
pub fn register_component<T: Send + Sync + 'static>() -> EcsResult<ComponentTypeId> {
    let registry = component_registry();
    let mut registry = registry.write().map_err(|_| RegistryError::PoisonedLock)?;
    Ok(registry.register::<T>()?)
}

/// Freezes the process-wide component registry.
///
/// ## Purpose
/// Marks the set of registered component types complete. After this call,
/// ids and vtables are stable and concurrent lookups are safe; further
/// registrations of new types fail.
pub fn freeze_components() -> EcsResult<()> {
    let registry = component_registry();
    let mut registry = registry.write().map_err(|_| RegistryError::PoisonedLock)?;
    registry.freeze();
    Ok(())
}

/// Returns the registered id for type `T`.
///
/// ## Errors
/// [`RegistryError::NotRegistered`] if `T` was never registered.
pub fn component_id_of<T: 'static>() -> EcsResult<ComponentTypeId> {
    let registry = component_registry();
    let registry = registry.read().map_err(|_| RegistryError::PoisonedLock)?;
    Ok(registry.require_id_of::<T>()?)
}

/// Returns the vtable for `component_id`.
///
/// ## Errors
/// [`RegistryError::NotRegistered`] if the id is out of range.
pub fn component_info(component_id: ComponentTypeId) -> EcsResult<ComponentTypeInfo> {
    let registry = component_registry();
    let registry = registry.read().map_err(|_| RegistryError::PoisonedLock)?;
    registry
        .info(component_id)
        .ok_or_else(|| EcsError::Registry(RegistryError::NotRegistered { name: "<unknown id>" }))
}

/// Number of component types registered so far.
pub fn registered_component_count() -> EcsResult<usize> {
    let registry = component_registry();
    let registry = registry.read().map_err(|_| RegistryError::PoisonedLock)?;
    Ok(registry.len())
}

/// A compile-time set of component types, expressed as a tuple.
///
/// ## Purpose
/// `ComponentSet` is the crate's uniform way of naming several component
/// types at once: query parameters, `remove_components::<S>`, `has::<S>`
/// and `get_many::<S>` all take a tuple such as `(Position, Velocity)`.
///
/// ## Typing model
/// The associated types describe the three views the store needs of a set:
/// raw column base pointers captured per archetype, shared references, and
/// mutable references. The query engine materializes `Ptrs` once per
/// matching archetype and derives per-row references from it, so per-row
/// dispatch involves no type lookup.
///
/// Implementations are provided for tuples of up to eight component types.
pub trait ComponentSet: 'static {
    /// Number of component types in the set.
    const LEN: usize;

    /// Tuple of shared references, one per member type.
    type Refs<'w>;

    /// Tuple of mutable references, one per member type.
    type Muts<'w>;

    /// Tuple of raw column base pointers, one per member type.
    type Ptrs: Copy;

    /// Builds the mask of this set's component type ids.
    ///
    /// ## Errors
    /// Fails if any member type was never registered.
    fn mask() -> EcsResult<ComponentMask>;

    /// Captures the column base pointers of this set within `archetype`.
    ///
    /// ## Errors
    /// Fails if the archetype does not store every member type; callers are
    /// expected to have mask-matched the archetype first.
    fn base_ptrs(archetype: &Archetype) -> EcsResult<Self::Ptrs>;

    /// Derives shared references to row `row` from captured base pointers.
    ///
    /// ## Safety
    /// `ptrs` must have been captured from a live archetype whose columns
    /// still hold at least `row + 1` elements, and no mutable reference to
    /// any of the addressed values may exist for the chosen lifetime.
    unsafe fn refs_at<'w>(ptrs: Self::Ptrs, row: usize) -> Self::Refs<'w>;

    /// Derives mutable references to row `row` from captured base pointers.
    ///
    /// ## Safety
    /// As [`ComponentSet::refs_at`], and additionally no other reference to
    /// any of the addressed values may exist for the chosen lifetime.
    unsafe fn muts_at<'w>(ptrs: Self::Ptrs, row: usize) -> Self::Muts<'w>;
}

/// A tuple of owned component values attached to an entity in one step.
///
/// Implemented for tuples of up to eight component types; the unit tuple
/// `()` is the empty bundle and attaches nothing.
pub trait ComponentBundle: Sized + 'static {
    /// Number of component values in the bundle.
    const LEN: usize;

    /// Builds the mask of the bundle's component type ids.
    fn mask() -> EcsResult<ComponentMask>;

    /// Appends each value to its column in `archetype`.
    ///
    /// The caller is responsible for having reserved the destination row via
    /// the archetype's row bookkeeping; values land at the next free row of
    /// each column.
    fn write_into(self, archetype: &mut Archetype) -> EcsResult<()>;
}

impl ComponentBundle for () {
    const LEN: usize = 0;

    fn mask() -> EcsResult<ComponentMask> {
        Ok(ComponentMask::EMPTY)
    }

    fn write_into(self, _archetype: &mut Archetype) -> EcsResult<()> {
        Ok(())
    }
}

macro_rules! count_types {
    () => (0usize);
    ($head:ident $(, $tail:ident)*) => (1usize + count_types!($($tail),*));
}

macro_rules! impl_component_group {
    ($(($ty:ident, $idx:tt)),+) => {
        impl<$($ty: Send + Sync + 'static),+> ComponentSet for ($($ty,)+) {
            const LEN: usize = count_types!($($ty),+);

            type Refs<'w> = ($(&'w $ty,)+);
            type Muts<'w> = ($(&'w mut $ty,)+);
            type Ptrs = ($(*mut $ty,)+);

            fn mask() -> EcsResult<ComponentMask> {
                let mut mask = ComponentMask::default();
                $(mask.set(component_id_of::<$ty>()?);)+
                Ok(mask)
            }

            fn base_ptrs(archetype: &Archetype) -> EcsResult<Self::Ptrs> {
                Ok(($(
                    archetype
                        .column(component_id_of::<$ty>()?)
                        .ok_or_else(|| EcsError::Internal(
                            format!("archetype missing matched column for {}", type_name::<$ty>()),
                        ))?
                        .typed_base::<$ty>()
                        .ok_or_else(|| EcsError::Internal(
                            format!("column element type diverged for {}", type_name::<$ty>()),
                        ))?,
                )+))
            }

            unsafe fn refs_at<'w>(ptrs: Self::Ptrs, row: usize) -> Self::Refs<'w> {
                // SAFETY: forwarded to the caller; each pointer addresses a
                // live element at `row` and no conflicting mutable borrow
                // exists.
                ($(unsafe { &*ptrs.$idx.add(row) },)+)
            }

            unsafe fn muts_at<'w>(ptrs: Self::Ptrs, row: usize) -> Self::Muts<'w> {
                // SAFETY: forwarded to the caller; the member types of a set
                // are distinct columns, so the produced borrows are disjoint.
                ($(unsafe { &mut *ptrs.$idx.add(row) },)+)
            }
        }

        impl<$($ty: Send + Sync + 'static),+> ComponentBundle for ($($ty,)+) {
            const LEN: usize = count_types!($($ty),+);

            fn mask() -> EcsResult<ComponentMask> {
                let mut mask = ComponentMask::default();
                $(
                    let id = component_id_of::<$ty>()?;
                    if mask.has(id) {
                        return Err(EcsError::Internal(format!(
                            "bundle lists component {} more than once",
                            type_name::<$ty>(),
                        )));
                    }
                    mask.set(id);
                )+
                Ok(mask)
            }

            #[allow(non_snake_case)]
            fn write_into(self, archetype: &mut Archetype) -> EcsResult<()> {
                let ($($ty,)+) = self;
                $(
                    let id = component_id_of::<$ty>()?;
                    archetype
                        .column_mut(id)
                        .ok_or_else(|| EcsError::Internal(
                            format!("destination archetype missing column for {}", type_name::<$ty>()),
                        ))?
                        .push($ty)?;
                )+
                Ok(())
            }
        }
    };
}

impl_component_group!((A, 0));
impl_component_group!((A, 0), (B, 1));
impl_component_group!((A, 0), (B, 1), (C, 2));
impl_component_group!((A, 0), (B, 1), (C, 2), (D, 3));
impl_component_group!((A, 0), (B, 1), (C, 2), (D, 3), (E, 4));
impl_component_group!((A, 0), (B, 1), (C, 2), (D, 3), (E, 4), (F, 5));
impl_component_group!((A, 0), (B, 1), (C, 2), (D, 3), (E, 4), (F, 5), (G, 6));
impl_component_group!((A, 0), (B, 1), (C, 2), (D, 3), (E, 4), (F, 5), (G, 6), (H, 7));
