//! Accessors: handle-checked read/write façades over one attribute column.
//!
//! An [`Accessor`] resolves element handles to slots through the mesh
//! (staleness-checked against the generation ledger) and delegates to the
//! column's scope-aware read/write. The [`BufferedAccessor`] variant
//! accumulates writes in a private cache and flushes each touched slot
//! once, for edits that rewrite the same slot many times where only the
//! final value matters.

use crate::attr::store::AttributeStore;
use crate::attr::value::AttributeValue;
use crate::forge_error::MeshForgeError;
use crate::topology::{ElementHandle, MeshTopology};
use hashbrown::HashMap;

fn resolve<M: MeshTopology + ?Sized>(
    mesh: &M,
    handle: ElementHandle,
) -> Result<usize, MeshForgeError> {
    if !mesh.is_valid(handle) {
        return Err(mesh.ledger().stale_error(handle));
    }
    mesh.slot_of(handle)
}

/// Per-attribute read/write façade routing through the active scope.
#[derive(Debug)]
pub struct Accessor<'a, V: AttributeValue> {
    store: &'a mut AttributeStore<V>,
}

impl<'a, V: AttributeValue> Accessor<'a, V> {
    pub(crate) fn new(store: &'a mut AttributeStore<V>) -> Self {
        Self { store }
    }

    /// Values per slot of the underlying column.
    #[inline]
    pub fn stride(&self) -> usize {
        self.store.stride()
    }

    /// Read the values bound to `handle`.
    ///
    /// # Errors
    /// `StaleHandle` when the handle fails the ledger check;
    /// `SlotOutOfBounds` when the column lags the mesh capacity.
    pub fn get<M: MeshTopology + ?Sized>(
        &self,
        mesh: &M,
        handle: ElementHandle,
    ) -> Result<&[V], MeshForgeError> {
        debug_assert_eq!(handle.dimension(), self.store.dimension());
        let slot = resolve(mesh, handle)?;
        self.store.try_read(slot)
    }

    /// The values bound to `handle` as they stood when the current scope
    /// opened. Lets invariants compare post-edit state against pre-edit
    /// state without a second mesh copy.
    pub fn get_pre_scope<M: MeshTopology + ?Sized>(
        &self,
        mesh: &M,
        handle: ElementHandle,
    ) -> Result<&[V], MeshForgeError> {
        debug_assert_eq!(handle.dimension(), self.store.dimension());
        let slot = resolve(mesh, handle)?;
        self.store.try_read_pre_scope(slot)
    }

    /// Write the values bound to `handle` through the active scope.
    pub fn set<M: MeshTopology + ?Sized>(
        &mut self,
        mesh: &M,
        handle: ElementHandle,
        values: &[V],
    ) -> Result<(), MeshForgeError> {
        debug_assert_eq!(handle.dimension(), self.store.dimension());
        let slot = resolve(mesh, handle)?;
        self.store.try_write(slot, values)
    }

    /// Slot-addressed read for callers that already resolved the handle.
    pub fn get_at(&self, slot: usize) -> Result<&[V], MeshForgeError> {
        self.store.try_read(slot)
    }

    /// Slot-addressed write for callers that already resolved the handle.
    pub fn set_at(&mut self, slot: usize, values: &[V]) -> Result<(), MeshForgeError> {
        self.store.try_write(slot, values)
    }
}

/// Write-coalescing accessor: `set` calls land in a private cache; only
/// [`flush`](BufferedAccessor::flush) pushes them through the scope, one
/// snapshot per touched slot no matter how often it was rewritten.
#[derive(Debug)]
pub struct BufferedAccessor<'a, V: AttributeValue> {
    store: &'a mut AttributeStore<V>,
    buffer: HashMap<usize, Box<[V]>>,
}

impl<'a, V: AttributeValue> BufferedAccessor<'a, V> {
    pub(crate) fn new(store: &'a mut AttributeStore<V>) -> Self {
        Self {
            store,
            buffer: HashMap::new(),
        }
    }

    /// Number of slots with pending writes.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Read through the buffer: a pending write wins over the column.
    pub fn get<M: MeshTopology + ?Sized>(
        &self,
        mesh: &M,
        handle: ElementHandle,
    ) -> Result<&[V], MeshForgeError> {
        let slot = resolve(mesh, handle)?;
        if let Some(pending) = self.buffer.get(&slot) {
            return Ok(pending);
        }
        self.store.try_read(slot)
    }

    /// Buffer a write; nothing reaches the column until `flush`.
    ///
    /// # Errors
    /// `StaleHandle` / `StrideMismatch` are reported eagerly so a bad write
    /// is caught where it happens, not at flush time.
    pub fn set<M: MeshTopology + ?Sized>(
        &mut self,
        mesh: &M,
        handle: ElementHandle,
        values: &[V],
    ) -> Result<(), MeshForgeError> {
        if values.len() != self.store.stride() {
            return Err(MeshForgeError::StrideMismatch {
                expected: self.store.stride(),
                found: values.len(),
            });
        }
        let slot = resolve(mesh, handle)?;
        self.buffer
            .insert(slot, values.to_vec().into_boxed_slice());
        Ok(())
    }

    /// Push every pending slot through the scope-aware write path and
    /// clear the buffer.
    pub fn flush(&mut self) -> Result<(), MeshForgeError> {
        for (slot, values) in self.buffer.drain() {
            self.store.try_write(slot, &values)?;
        }
        Ok(())
    }

    /// Drop all pending writes without touching the column.
    pub fn discard(&mut self) {
        self.buffer.clear();
    }
}
