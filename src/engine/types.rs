//! Core identifiers and bit-level layouts.
//!
//! This module defines the fundamental types shared across all subsystems of
//! the store: entity identifiers, component type identifiers, archetype
//! identifiers, and the [`ComponentMask`] bitset that names an archetype.
//!
//! ## Design
//!
//! - Entities are opaque `u32` handles with no internal structure.
//! - Component types are identified by a dense, compact id assigned at
//!   registration time.
//! - An archetype is identified both by its mask (the set of component type
//!   ids it stores) and by a dense index into the world's archetype table.
//!
//! Masks are fixed-size `u64` word arrays so that archetype matching is a
//! handful of bitwise operations, and so that [`ComponentMask`] can key a
//! hash map directly.

/// Opaque identifier for an entity.
///
/// Assigned monotonically from a per-world counter. Identifiers are never
/// reused; a removed entity's id stays dead for the lifetime of the world.
pub type EntityId = u32;

/// Compact identifier for a registered component type.
///
/// Dense in `[0, registered_count)`. The width is the smallest unsigned
/// integer that can hold [`MAX_COMPONENTS`].
pub type ComponentTypeId = u8;

/// Dense index of an archetype within a world's archetype table.
pub type ArchetypeId = u16;

/// Maximum number of component types that may be registered.
///
/// This bounds the total number of *registered* types, not the number of
/// components a single entity may carry.
pub const MAX_COMPONENTS: usize = 32;

/// Number of `u64` words required to represent a full component mask.
pub const MASK_WORDS: usize = (MAX_COMPONENTS + 63) / 64;

const _: [(); 1] = [(); (MAX_COMPONENTS <= ComponentTypeId::MAX as usize + 1) as usize];
const _: [(); 1] = [(); (MASK_WORDS > 0) as usize];

/// Bitset naming a set of component types.
///
/// Bit `i` set means component type id `i` is a member. Every archetype is
/// identified by exactly one mask, and the world's archetype table is keyed
/// by it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ComponentMask {
    /// Packed component bitset.
    pub words: [u64; MASK_WORDS],
}

impl Default for ComponentMask {
    fn default() -> Self {
        Self {
            words: [0u64; MASK_WORDS],
        }
    }
}

impl ComponentMask {
    /// The empty mask, naming the archetype of componentless entities.
    pub const EMPTY: ComponentMask = ComponentMask {
        words: [0u64; MASK_WORDS],
    };

    /// Sets the bit corresponding to `component_id`.
    #[inline]
    pub fn set(&mut self, component_id: ComponentTypeId) {
        let index = (component_id as usize) / 64;
        let bits = (component_id as usize) % 64;
        self.words[index] |= 1u64 << bits;
    }

    /// Clears the bit corresponding to `component_id`.
    #[inline]
    pub fn clear(&mut self, component_id: ComponentTypeId) {
        let index = (component_id as usize) / 64;
        let bits = (component_id as usize) % 64;
        self.words[index] &= !(1u64 << bits);
    }

    /// Returns `true` if `component_id` is a member of this mask.
    #[inline]
    pub fn has(&self, component_id: ComponentTypeId) -> bool {
        let index = (component_id as usize) / 64;
        let bits = (component_id as usize) % 64;
        (self.words[index] >> bits) & 1 == 1
    }

    /// Returns `true` if no bit is set.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&word| word == 0)
    }

    /// Returns the number of set bits.
    #[inline]
    pub fn count(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// Returns `true` if every member of `other` is also a member of `self`.
    #[inline]
    pub fn contains_all(&self, other: &ComponentMask) -> bool {
        self.words
            .iter()
            .zip(other.words.iter())
            .all(|(a, b)| (a & b) == *b)
    }

    /// Returns `true` if the two masks share at least one member.
    #[inline]
    pub fn intersects(&self, other: &ComponentMask) -> bool {
        self.words
            .iter()
            .zip(other.words.iter())
            .any(|(a, b)| (a & b) != 0)
    }

    /// Returns the union of the two masks.
    #[inline]
    pub fn union(&self, other: &ComponentMask) -> ComponentMask {
        let mut words = [0u64; MASK_WORDS];
        for (index, word) in words.iter_mut().enumerate() {
            *word = self.words[index] | other.words[index];
        }
        ComponentMask { words }
    }

    /// Returns the intersection of the two masks.
    #[inline]
    pub fn intersection(&self, other: &ComponentMask) -> ComponentMask {
        let mut words = [0u64; MASK_WORDS];
        for (index, word) in words.iter_mut().enumerate() {
            *word = self.words[index] & other.words[index];
        }
        ComponentMask { words }
    }

    /// Returns the members of `self` that are not members of `other`.
    #[inline]
    pub fn difference(&self, other: &ComponentMask) -> ComponentMask {
        let mut words = [0u64; MASK_WORDS];
        for (index, word) in words.iter_mut().enumerate() {
            *word = self.words[index] & !other.words[index];
        }
        ComponentMask { words }
    }

    /// Iterates over the component type ids set in this mask, ascending.
    pub fn iter(&self) -> impl Iterator<Item = ComponentTypeId> + '_ {
        self.words.iter().enumerate().flat_map(|(word_index, &word)| {
            let base = word_index * 64;
            let mut bits = word;
            std::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let tz = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                Some((base + tz) as ComponentTypeId)
            })
        })
    }
}

/// Builds a component mask from a list of component type ids.
pub fn build_mask(component_ids: &[ComponentTypeId]) -> ComponentMask {
    let mut mask = ComponentMask::default();
    for &component_id in component_ids {
        mask.set(component_id);
    }
    mask
}
