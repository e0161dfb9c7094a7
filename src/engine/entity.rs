//! Entity identifier allocation.
//!
//! Entities are lightweight, opaque identifiers that reference rows in
//! archetype storage. Each world owns one allocator; ids are handed out
//! monotonically and never reused, so a stale handle can never alias a
//! newer entity.

use crate::engine::error::{EcsError, EcsResult};
use crate::engine::types::EntityId;

/// Monotonic per-world entity id allocator.
///
/// `EntityId::MAX` is reserved as a never-issued sentinel; allocation fails
/// once the counter reaches it.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    next: EntityId,
}

impl EntityAllocator {
    /// Creates an allocator starting at id 0.
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// Allocates a fresh entity id.
    ///
    /// ## Errors
    /// [`EcsError::EntityIdsExhausted`] once the id space is spent.
    pub fn allocate(&mut self) -> EcsResult<EntityId> {
        if self.next == EntityId::MAX {
            return Err(EcsError::EntityIdsExhausted);
        }
        let id = self.next;
        self.next += 1;
        Ok(id)
    }
}
