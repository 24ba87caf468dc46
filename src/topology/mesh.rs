//! `MeshTopology`: the boundary contract to concrete connectivity kinds.
//!
//! mesh-forge does not own connectivity tables or navigation rules; those
//! live in point/edge/triangle/tetrahedron mesh implementations outside the
//! core. This trait is what the transactional core needs from them: slot
//! bookkeeping, primitive creation/deletion, generation maintenance,
//! neighborhood queries for conflict coloring, and exact inversion of the
//! most recent edit so a rejected attempt can be unwound.

use crate::forge_error::MeshForgeError;
use crate::topology::{Dimension, ElementHandle, GenerationLedger};

/// Connectivity contract consumed (not implemented) by the core.
///
/// Implementations must pair every mutating call with the ability to invert
/// it via [`undo_last_edit`](MeshTopology::undo_last_edit); the operation
/// protocol relies on that to unwind rejected attempts edit by edit.
pub trait MeshTopology {
    /// Highest element rank this mesh carries.
    fn top_dimension(&self) -> Dimension;

    /// Number of element slots (live or dead) for a dimension. Attribute
    /// stores for that dimension must be at least this large.
    fn capacity(&self, dimension: Dimension) -> usize;

    /// Generation stamps and liveness for the top-dimension cells.
    fn ledger(&self) -> &GenerationLedger;

    /// Allocate a slot for a new primitive of `dimension`, reusing a dead
    /// slot when one is available. Counts as one edit.
    ///
    /// # Errors
    /// `CapacityError` if backing storage could not grow.
    fn create_primitive(&mut self, dimension: Dimension) -> Result<usize, MeshForgeError>;

    /// Soft-delete the primitive in `slot`. Counts as one edit.
    ///
    /// # Errors
    /// `SlotOutOfBounds` / `DeadSlot` on a bad target.
    fn delete_primitive(&mut self, dimension: Dimension, slot: usize) -> Result<(), MeshForgeError>;

    /// Bump the generation of a top-dimension cell, invalidating all
    /// outstanding handles to it. Must happen with the same atomicity as
    /// the topology edit it accompanies.
    fn bump_generation(&self, cell: u32) {
        self.ledger().bump(cell);
    }

    /// Resolve a handle to the global slot of the element it names, in the
    /// element's own dimension.
    ///
    /// # Errors
    /// `StaleHandle` if the handle fails the ledger check.
    fn slot_of(&self, handle: ElementHandle) -> Result<usize, MeshForgeError>;

    /// Elements whose attribute slots an edit at `handle` may touch.
    /// Used to build the conflict graph for parallel batching; candidates
    /// with overlapping neighborhoods are never attempted concurrently.
    fn local_neighbors(&self, handle: ElementHandle) -> Vec<ElementHandle>;

    /// Number of edits performed so far. The operation protocol snapshots
    /// this before an attempt and unwinds back to it on rejection.
    fn edit_count(&self) -> usize;

    /// Exactly invert the most recent edit.
    ///
    /// # Errors
    /// `UndoFailure` if the edit cannot be inverted; this is fatal for the
    /// scheduling run because attribute/topology consistency can no longer
    /// be guaranteed.
    fn undo_last_edit(&mut self) -> Result<(), MeshForgeError>;

    /// Staleness check for `handle` against this mesh's ledger.
    #[inline]
    fn is_valid(&self, handle: ElementHandle) -> bool {
        self.ledger().is_valid(handle)
    }

    /// Neighborhood query that refuses stale handles instead of silently
    /// reading renumbered connectivity.
    fn try_local_neighbors(
        &self,
        handle: ElementHandle,
    ) -> Result<Vec<ElementHandle>, MeshForgeError> {
        if !self.is_valid(handle) {
            return Err(self.ledger().stale_error(handle));
        }
        Ok(self.local_neighbors(handle))
    }
}
