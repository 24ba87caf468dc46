//! `AttributeStore`: one dense, typed, per-dimension attribute column.
//!
//! A store maps element slots to fixed-stride runs of values (stride 1 for
//! scalars, k for fixed-width vectors) in one flat buffer, with a default
//! fill for freshly reserved or recycled slots and a dead bitmap that lets
//! slots be soft-deleted and reused without shrinking the buffer. All
//! mutation is scope-aware: while a transaction scope is open, the first
//! write to a slot snapshots its pre-scope image so the owning manager can
//! roll the whole attempt back.

use crate::attr::scope::ScopeStack;
use crate::debug_invariants::DebugInvariants;
use crate::forge_error::MeshForgeError;
use crate::topology::Dimension;

/// Old-to-new slot map produced by [`AttributeStore::consolidate`].
///
/// Every dependent structure holding raw slot indices (open scopes are
/// handled internally; caller-side caches are not) must apply this before
/// touching the store again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRemap {
    forward: Vec<Option<usize>>,
    live: usize,
}

impl SlotRemap {
    /// Build a remap from an explicit forward table.
    pub fn from_forward(forward: Vec<Option<usize>>) -> Self {
        let live = forward.iter().flatten().count();
        Self { forward, live }
    }

    /// Remap from a dead bitmap: live slots keep their relative order and
    /// compact onto a dense prefix.
    pub fn compacting(dead: &[bool]) -> Self {
        let mut next = 0usize;
        let forward = dead
            .iter()
            .map(|&d| {
                if d {
                    None
                } else {
                    let slot = next;
                    next += 1;
                    Some(slot)
                }
            })
            .collect();
        Self {
            forward,
            live: next,
        }
    }

    /// New index of `slot`, `None` if the slot was removed.
    #[inline]
    pub fn lookup(&self, slot: usize) -> Option<usize> {
        self.forward.get(slot).copied().flatten()
    }

    /// Slot count before consolidation.
    #[inline]
    pub fn len_before(&self) -> usize {
        self.forward.len()
    }

    /// Slot count after consolidation (live slots).
    #[inline]
    pub fn len_after(&self) -> usize {
        self.live
    }

    /// True when the remap moves nothing.
    pub fn is_identity(&self) -> bool {
        self.live == self.forward.len()
    }
}

/// One named, typed attribute column for one dimension.
#[derive(Debug, Clone)]
pub struct AttributeStore<V> {
    name: String,
    dimension: Dimension,
    stride: usize,
    default: Box<[V]>,
    data: Vec<V>,
    dead: Vec<bool>,
    scopes: ScopeStack<V>,
}

impl<V: Clone + PartialEq + std::fmt::Debug> AttributeStore<V> {
    /// New column of `capacity` slots, every slot filled with `default`.
    /// The stride is `default.len()`.
    ///
    /// # Panics
    /// Panics if `default` is empty; a column with zero values per slot is
    /// meaningless. Manager-level registration validates before reaching
    /// this constructor.
    pub fn new(
        dimension: Dimension,
        name: impl Into<String>,
        default: &[V],
        capacity: usize,
    ) -> Self {
        assert!(!default.is_empty(), "attribute default must be non-empty");
        let stride = default.len();
        let default: Box<[V]> = Box::from(default);
        let mut data = Vec::new();
        for _ in 0..capacity {
            data.extend_from_slice(&default);
        }
        Self {
            name: name.into(),
            dimension,
            stride,
            default,
            data,
            dead: vec![false; capacity],
            scopes: ScopeStack::new(),
        }
    }

    /// Attribute name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dimension this column is bound to.
    #[inline]
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Values per slot.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of slots (live or dead).
    #[inline]
    pub fn len(&self) -> usize {
        self.dead.len()
    }

    /// True when the column has no slots.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dead.is_empty()
    }

    /// Default fill image.
    #[inline]
    pub fn default_value(&self) -> &[V] {
        &self.default
    }

    /// Count of live (not dead) slots.
    pub fn live_len(&self) -> usize {
        self.dead.iter().filter(|&&d| !d).count()
    }

    /// Whether `slot` is currently soft-deleted.
    #[inline]
    pub fn is_dead(&self, slot: usize) -> bool {
        self.dead.get(slot).copied().unwrap_or(false)
    }

    #[inline]
    fn span(&self, slot: usize) -> Result<std::ops::Range<usize>, MeshForgeError> {
        if slot >= self.dead.len() {
            return Err(MeshForgeError::SlotOutOfBounds {
                slot,
                len: self.dead.len(),
            });
        }
        let start = slot * self.stride;
        Ok(start..start + self.stride)
    }

    /// Read the value image of `slot`.
    ///
    /// Reads go straight to the column: writes are applied in place and
    /// undone on rollback, so the latest write inside the current scope is
    /// what a read observes.
    pub fn try_read(&self, slot: usize) -> Result<&[V], MeshForgeError> {
        let span = self.span(slot)?;
        Ok(&self.data[span])
    }

    /// Write the value image of `slot`, snapshotting the pre-scope image on
    /// first touch when a scope is open.
    ///
    /// # Errors
    /// `SlotOutOfBounds` / `StrideMismatch`.
    pub fn try_write(&mut self, slot: usize, values: &[V]) -> Result<(), MeshForgeError> {
        if values.len() != self.stride {
            return Err(MeshForgeError::StrideMismatch {
                expected: self.stride,
                found: values.len(),
            });
        }
        let span = self.span(slot)?;
        let current = &self.data[span.clone()];
        if self.scopes.is_active() {
            self.scopes.note_value(slot, current);
        }
        self.data[span].clone_from_slice(values);
        Ok(())
    }

    /// The value of `slot` as it stood when the current scope opened: the
    /// top scope's snapshot if the slot was touched, the live value
    /// otherwise. With no open scope this is just [`try_read`].
    ///
    /// [`try_read`]: AttributeStore::try_read
    pub fn try_read_pre_scope(&self, slot: usize) -> Result<&[V], MeshForgeError> {
        if let Some(shadow) = self.scopes.shadow(slot) {
            return Ok(shadow);
        }
        self.try_read(slot)
    }

    /// Grow the column to at least `min_capacity` slots, filling new slots
    /// with the default image and marking them live.
    ///
    /// # Errors
    /// `CapacityError` only when the allocator refuses the growth.
    pub fn reserve(&mut self, min_capacity: usize) -> Result<(), MeshForgeError> {
        let current = self.dead.len();
        if min_capacity <= current {
            return Ok(());
        }
        let added = min_capacity - current;
        let err = |_| MeshForgeError::CapacityError {
            dimension: self.dimension,
            requested: min_capacity,
        };
        self.data.try_reserve(added * self.stride).map_err(err)?;
        self.dead.try_reserve(added).map_err(err)?;
        for _ in 0..added {
            self.data.extend_from_slice(&self.default);
        }
        self.dead.resize(min_capacity, false);
        Ok(())
    }

    /// Soft-delete `slot`: the data stays in place for a possible rollback,
    /// but the slot is no longer bound to a live element and may be handed
    /// out again by [`reuse`](AttributeStore::reuse).
    ///
    /// # Errors
    /// `SlotOutOfBounds`; `DeadSlot` on a double delete.
    pub fn mark_dead(&mut self, slot: usize) -> Result<(), MeshForgeError> {
        self.span(slot)?;
        if self.dead[slot] {
            return Err(MeshForgeError::DeadSlot(slot));
        }
        if self.scopes.is_active() {
            self.scopes.note_dead_bit(slot, false);
        }
        self.dead[slot] = true;
        Ok(())
    }

    /// Recycle a dead slot for a newly created element: the dead bit clears
    /// and the contents reset to the default image, both through the scope,
    /// so rolling the attempt back restores the old occupant exactly.
    pub fn reuse(&mut self, slot: usize) -> Result<(), MeshForgeError> {
        self.span(slot)?;
        debug_assert!(self.dead[slot], "reuse() of a live slot");
        if self.scopes.is_active() {
            self.scopes.note_dead_bit(slot, self.dead[slot]);
        }
        self.dead[slot] = false;
        let default = self.default.clone();
        self.try_write(slot, &default)
    }

    /// Begin a new diff layer over this column.
    pub fn push_scope(&mut self) {
        self.scopes.push();
    }

    /// Current scope nesting depth.
    #[inline]
    pub fn scope_depth(&self) -> usize {
        self.scopes.depth()
    }

    /// Pop the top scope, keeping its writes.
    pub fn commit_scope(&mut self) -> Result<(), MeshForgeError> {
        self.scopes.commit()
    }

    /// Pop the top scope and restore every snapshotted slot to its recorded
    /// pre-scope image, undoing all writes made while it was open.
    pub fn rollback_scope(&mut self) -> Result<(), MeshForgeError> {
        let log = self.scopes.rollback()?;
        for (slot, old) in &log.values {
            let start = slot * self.stride;
            self.data[start..start + self.stride].clone_from_slice(old);
        }
        for (&slot, &bit) in &log.dead_bits {
            self.dead[slot] = bit;
        }
        Ok(())
    }

    /// Compact live slots onto a dense prefix. Returns the old-to-new map;
    /// open scopes are remapped in place (snapshots of removed slots are
    /// dropped with the slots they described).
    pub fn consolidate(&mut self) -> SlotRemap {
        let remap = SlotRemap::compacting(&self.dead);
        if !remap.is_identity() {
            self.apply_remap(&remap);
        }
        remap
    }

    /// Apply an externally computed remap (e.g. the one returned by the
    /// first store consolidated by a manager) to this column.
    pub fn apply_remap(&mut self, remap: &SlotRemap) {
        debug_assert_eq!(remap.len_before(), self.dead.len());
        for old in 0..self.dead.len() {
            if let Some(new) = remap.lookup(old) {
                if new != old {
                    let (from, to) = (old * self.stride, new * self.stride);
                    for k in 0..self.stride {
                        self.data[to + k] = self.data[from + k].clone();
                    }
                }
            }
        }
        self.data.truncate(remap.len_after() * self.stride);
        self.dead.clear();
        self.dead.resize(remap.len_after(), false);
        self.scopes.apply_remap(remap);
        crate::forge_debug_assert_ok!(self.validate_invariants(), "AttributeStore after remap");
    }
}

impl<V: Clone + PartialEq + std::fmt::Debug> DebugInvariants for AttributeStore<V> {
    fn debug_assert_invariants(&self) {
        crate::forge_debug_assert_ok!(self.validate_invariants(), "AttributeStore invalid");
    }

    fn validate_invariants(&self) -> Result<(), MeshForgeError> {
        if self.data.len() != self.dead.len() * self.stride {
            return Err(MeshForgeError::StrideMismatch {
                expected: self.dead.len() * self.stride,
                found: self.data.len(),
            });
        }
        Ok(())
    }
}
