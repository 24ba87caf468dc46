//! MeshForgeError: Unified error type for mesh-forge public APIs
//!
//! This error type is used throughout the mesh-forge library to provide
//! robust, non-panicking error handling for all public APIs. Invariant
//! failures during an operation attempt are deliberately *not* represented
//! here: they are a normal `Rejected` outcome, not an error.

use crate::topology::Dimension;
use thiserror::Error;

/// Unified error type for mesh-forge operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshForgeError {
    /// A handle referred to a cell whose generation has moved on (or that was
    /// deleted). Always recoverable: re-resolve or drop the handle.
    #[error("stale handle: cell {cell} holds generation {held}, live generation is {live}")]
    StaleHandle {
        /// Global index of the top-dimension cell the handle named.
        cell: u32,
        /// Generation stamp carried by the handle.
        held: u32,
        /// Generation stamp currently live for that cell (0 if deleted).
        live: u32,
    },
    /// Growing an attribute store or the generation ledger failed at the
    /// allocator. Fatal for the current scheduling run.
    #[error("capacity error: could not reserve {requested} slots for dimension {dimension:?}")]
    CapacityError {
        /// Dimension whose storage could not grow.
        dimension: Dimension,
        /// Total slot count that was requested.
        requested: usize,
    },
    /// The external mesh interface could not invert its own last edit.
    /// Fatal: continuing would break attribute/topology consistency.
    #[error("mesh interface failed to undo its last edit: {0}")]
    UndoFailure(String),
    /// A slot index fell outside the store's current size.
    #[error("slot {slot} out of bounds for store of length {len}")]
    SlotOutOfBounds {
        /// Offending slot index.
        slot: usize,
        /// Store length at the time of access.
        len: usize,
    },
    /// A value slice did not match the store's per-slot stride.
    #[error("stride mismatch: store holds {expected} values per slot, got {found}")]
    StrideMismatch {
        /// Values per slot declared at registration.
        expected: usize,
        /// Length of the slice supplied by the caller.
        found: usize,
    },
    /// Attribute registration collided with an existing (dimension, name).
    #[error("attribute `{0}` already registered for this dimension")]
    DuplicateAttribute(String),
    /// Lookup of an attribute that was never registered.
    #[error("unknown attribute `{0}`")]
    UnknownAttribute(String),
    /// Commit or rollback was requested with no scope open.
    #[error("scope underflow: commit/rollback without a matching open scope")]
    ScopeUnderflow,
    /// Access to a slot currently marked dead.
    #[error("slot {0} is dead (not bound to a live element)")]
    DeadSlot(usize),
}
