//! Error types for the registry, column storage, and world operations.
//!
//! This module declares focused, composable error types used across the
//! store. Each error carries enough context to make failures actionable
//! while remaining small and cheap to pass around or convert into the
//! aggregate [`EcsError`].
//!
//! ## Goals
//! * **Specificity:** Each variant models a single failure mode (e.g. a
//!   registry capacity violation, a column addressed out of bounds, a
//!   component attached twice).
//! * **Ergonomics:** All errors implement [`std::error::Error`] and
//!   [`std::fmt::Display`], and provide `From<T>` conversions into
//!   [`EcsError`] so call sites can use `?` freely.
//! * **Actionability:** Structured fields (offending entity id, component
//!   type name, requested vs. available capacity) make failures diagnosable
//!   without a debugger.
//!
//! ## Typical flow
//! Low-level registry and column operations return the dedicated
//! [`RegistryError`] / [`ColumnError`] types. World-level orchestration uses
//! `?` to bubble failures into [`EcsError`], which callers can match on for
//! control flow or print for diagnostics.

use std::fmt;

use crate::engine::types::EntityId;

/// Result alias for operations that can fail with an [`EcsError`].
pub type EcsResult<T> = Result<T, EcsError>;

/// Result alias for registry-level operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors raised by the component type registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// Registration would exceed the compile-time component type capacity.
    CapacityExceeded {
        /// The configured maximum number of registered types.
        cap: usize,
    },

    /// A component type was used before being registered.
    NotRegistered {
        /// Rust type name of the offending component.
        name: &'static str,
    },

    /// Registration was attempted after the registry was frozen.
    Frozen,

    /// The registry lock was poisoned by a panicking writer.
    PoisonedLock,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::CapacityExceeded { cap } => {
                write!(f, "component type capacity exceeded (max {})", cap)
            }
            RegistryError::NotRegistered { name } => {
                write!(f, "component type not registered: {}", name)
            }
            RegistryError::Frozen => f.write_str("component registry is frozen"),
            RegistryError::PoisonedLock => f.write_str("component registry lock poisoned"),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Errors raised by type-erased component columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnError {
    /// A typed view or write did not match the column's element type.
    TypeMismatch {
        /// Element type the column was created for.
        expected: &'static str,
        /// Type the caller supplied.
        actual: &'static str,
    },

    /// A row index addressed storage outside the live element range.
    PositionOutOfBounds {
        /// Row index that was addressed.
        index: usize,
        /// Number of live elements in the column.
        len: usize,
    },
}

impl fmt::Display for ColumnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnError::TypeMismatch { expected, actual } => {
                write!(f, "column type mismatch: expected {}, got {}", expected, actual)
            }
            ColumnError::PositionOutOfBounds { index, len } => {
                write!(f, "row {} out of bounds (column length {})", index, len)
            }
        }
    }
}

impl std::error::Error for ColumnError {}

/// Aggregate error for world and query operations.
///
/// This preserves the underlying structured error where one exists, so
/// diagnostics stay actionable at the API boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// An entity id was not present in the world.
    UnknownEntity(EntityId),

    /// An entity was expected to own a component it does not have.
    MissingComponent {
        /// Entity that was addressed.
        entity: EntityId,
        /// Rust type name of the missing component.
        name: &'static str,
    },

    /// A component was attached to an entity that already owns it.
    DuplicateComponent {
        /// Entity that was addressed.
        entity: EntityId,
        /// Rust type name of the duplicated component.
        name: &'static str,
    },

    /// The per-world entity id counter was exhausted.
    EntityIdsExhausted,

    /// A registry-level failure.
    Registry(RegistryError),

    /// A column-level failure.
    Column(ColumnError),

    /// An internal invariant was violated.
    ///
    /// This indicates a bug in the store, not a recoverable runtime
    /// condition.
    Internal(String),
}

impl fmt::Display for EcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcsError::UnknownEntity(entity) => write!(f, "unknown entity {}", entity),
            EcsError::MissingComponent { entity, name } => {
                write!(f, "entity {} has no component {}", entity, name)
            }
            EcsError::DuplicateComponent { entity, name } => {
                write!(f, "entity {} already has component {}", entity, name)
            }
            EcsError::EntityIdsExhausted => f.write_str("entity id space exhausted"),
            EcsError::Registry(e) => write!(f, "{e}"),
            EcsError::Column(e) => write!(f, "{e}"),
            EcsError::Internal(message) => write!(f, "internal invariant violated: {}", message),
        }
    }
}

impl std::error::Error for EcsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EcsError::Registry(e) => Some(e),
            EcsError::Column(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RegistryError> for EcsError {
    fn from(e: RegistryError) -> Self {
        EcsError::Registry(e)
    }
}

impl From<ColumnError> for EcsError {
    fn from(e: ColumnError) -> Self {
        EcsError::Column(e)
    }
}
