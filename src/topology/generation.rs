//! `GenerationLedger`: per-cell generation stamps and liveness.
//!
//! The ledger is the single source of truth for handle staleness. It keeps
//! one atomic generation counter and one liveness bit per top-dimension
//! cell slot. Structural edits bump the counter with `Release` ordering and
//! validity checks load with `Acquire`, so a reader on another thread sees
//! either the pre-edit or the post-edit stamp, never a torn value.
//!
//! Stamps start at 1 and only ever increase; a slot's counter survives
//! soft-deletion and revival, so a handle minted against a previous
//! occupant of the slot can never accidentally validate against the next.

use crate::forge_error::MeshForgeError;
use crate::topology::{Dimension, ElementHandle};
use std::sync::atomic::{AtomicU32, Ordering};

/// Generation stamps and liveness bits for the top-dimension cells of one
/// mesh. Owned by the mesh interface implementation; read by accessors and
/// the scheduler through shared references.
#[derive(Debug, Default)]
pub struct GenerationLedger {
    stamps: Vec<AtomicU32>,
    alive: Vec<bool>,
}

impl GenerationLedger {
    /// Ledger with `capacity` live slots, all at generation 1.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            stamps: (0..capacity).map(|_| AtomicU32::new(1)).collect(),
            alive: vec![true; capacity],
        }
    }

    /// Number of tracked cell slots (live or dead).
    #[inline]
    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    /// True when no slots are tracked.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    /// Append `additional` fresh live slots at generation 1.
    ///
    /// # Errors
    /// `CapacityError` if the allocator refuses the growth.
    pub fn grow(&mut self, dimension: Dimension, additional: usize) -> Result<(), MeshForgeError> {
        let requested = self.stamps.len() + additional;
        let err = |_| MeshForgeError::CapacityError {
            dimension,
            requested,
        };
        self.stamps.try_reserve(additional).map_err(err)?;
        self.alive.try_reserve(additional).map_err(err)?;
        self.stamps.extend((0..additional).map(|_| AtomicU32::new(1)));
        self.alive.resize(requested, true);
        Ok(())
    }

    /// Live generation stamp of a cell slot, 0 if out of range.
    #[inline]
    pub fn stamp(&self, cell: u32) -> u32 {
        self.stamps
            .get(cell as usize)
            .map(|s| s.load(Ordering::Acquire))
            .unwrap_or(0)
    }

    /// Whether a cell slot is currently bound to a live element.
    #[inline]
    pub fn is_alive(&self, cell: u32) -> bool {
        self.alive.get(cell as usize).copied().unwrap_or(false)
    }

    /// O(1) staleness check: the cell is alive and its live stamp equals the
    /// handle's stamp.
    #[inline]
    pub fn is_valid(&self, handle: ElementHandle) -> bool {
        self.is_alive(handle.cell()) && self.stamp(handle.cell()) == handle.generation()
    }

    /// Bump the generation of a cell, invalidating every outstanding handle
    /// to it. Called by the mesh interface for each structural edit touching
    /// the cell.
    #[inline]
    pub fn bump(&self, cell: u32) {
        if let Some(s) = self.stamps.get(cell as usize) {
            s.fetch_add(1, Ordering::Release);
        }
    }

    /// Soft-delete a cell slot: mark dead and bump, so handles to the old
    /// occupant stay stale even if the slot is later revived.
    pub fn mark_dead(&mut self, cell: u32) {
        if let Some(a) = self.alive.get_mut(cell as usize) {
            *a = false;
        }
        self.bump(cell);
    }

    /// Revive a dead slot for a newly created element. The stamp is left at
    /// its bumped value; handles minted now validate, older ones do not.
    pub fn revive(&mut self, cell: u32) {
        if let Some(a) = self.alive.get_mut(cell as usize) {
            *a = true;
        }
    }

    /// Re-stamp a handle whose cell was bumped but not deleted.
    ///
    /// Used when an edit only renumbered an element: the same cell slot
    /// still refers to the same geometric element, so the handle can be
    /// revalidated in place.
    ///
    /// # Errors
    /// `StaleHandle` if the cell is dead or out of range.
    pub fn resurrect(&self, handle: ElementHandle) -> Result<ElementHandle, MeshForgeError> {
        if self.is_alive(handle.cell()) {
            Ok(handle.with_generation(self.stamp(handle.cell())))
        } else {
            Err(MeshForgeError::StaleHandle {
                cell: handle.cell(),
                held: handle.generation(),
                live: self.stamp(handle.cell()),
            })
        }
    }

    /// `StaleHandle` error describing `handle` against the current ledger.
    pub fn stale_error(&self, handle: ElementHandle) -> MeshForgeError {
        MeshForgeError::StaleHandle {
            cell: handle.cell(),
            held: handle.generation(),
            live: self.stamp(handle.cell()),
        }
    }
}

impl Clone for GenerationLedger {
    fn clone(&self) -> Self {
        Self {
            stamps: self
                .stamps
                .iter()
                .map(|s| AtomicU32::new(s.load(Ordering::Acquire)))
                .collect(),
            alive: self.alive.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(cell: u32, generation: u32) -> ElementHandle {
        ElementHandle::cell_handle(Dimension::Triangle, cell, generation)
    }

    #[test]
    fn fresh_slots_validate_at_generation_one() {
        let ledger = GenerationLedger::with_capacity(4);
        assert!(ledger.is_valid(handle(0, 1)));
        assert!(!ledger.is_valid(handle(0, 2)));
        assert!(!ledger.is_valid(handle(9, 1)));
    }

    #[test]
    fn bump_invalidates_old_handles() {
        let ledger = GenerationLedger::with_capacity(2);
        let h = handle(1, ledger.stamp(1));
        ledger.bump(1);
        assert!(!ledger.is_valid(h));
        assert!(ledger.is_valid(handle(1, 2)));
    }

    #[test]
    fn delete_then_reuse_keeps_old_handle_stale() {
        // Scenario: H points to cell 3 at generation 1; cell 3 is deleted,
        // then the slot is reused by a new element.
        let mut ledger = GenerationLedger::with_capacity(4);
        let h = handle(3, 1);
        assert!(ledger.is_valid(h));
        ledger.mark_dead(3);
        assert!(!ledger.is_valid(h));
        ledger.revive(3);
        let h2 = handle(3, ledger.stamp(3));
        assert_eq!(h2.generation(), 2);
        assert!(ledger.is_valid(h2));
        assert!(!ledger.is_valid(h));
    }

    #[test]
    fn resurrect_restamps_live_cells_only() {
        let mut ledger = GenerationLedger::with_capacity(2);
        let h = handle(0, 1);
        ledger.bump(0);
        let fresh = ledger.resurrect(h).unwrap();
        assert!(ledger.is_valid(fresh));
        ledger.mark_dead(0);
        assert!(matches!(
            ledger.resurrect(h),
            Err(MeshForgeError::StaleHandle { cell: 0, .. })
        ));
    }

    #[test]
    fn grow_appends_live_slots() {
        let mut ledger = GenerationLedger::with_capacity(1);
        ledger.grow(Dimension::Triangle, 3).unwrap();
        assert_eq!(ledger.len(), 4);
        assert!(ledger.is_valid(handle(3, 1)));
    }

    #[test]
    fn validity_is_monotone_once_false() {
        let mut ledger = GenerationLedger::with_capacity(1);
        let h = handle(0, 1);
        ledger.bump(0);
        assert!(!ledger.is_valid(h));
        // No further edit sequence can make h valid again.
        ledger.mark_dead(0);
        ledger.revive(0);
        ledger.bump(0);
        assert!(!ledger.is_valid(h));
    }
}
