//! `AttributeManager`: every attribute column of one mesh, under one
//! transactional roof.
//!
//! The manager owns one [`AttributeStore`] per (dimension, value-type,
//! name) and is the only place scopes are opened and closed: `open_scope`,
//! `commit` and `rollback` fan out to every store of every value type, so
//! an operation attempt either keeps all of its attribute writes or none
//! of them. Cross-attribute consistency is never left half-applied.

use crate::attr::accessor::{Accessor, BufferedAccessor};
use crate::attr::store::{AttributeStore, SlotRemap};
use crate::attr::value::AttributeValue;
use crate::debug_invariants::DebugInvariants;
use crate::forge_error::MeshForgeError;
use crate::topology::Dimension;
use hashbrown::HashMap;
use std::marker::PhantomData;

/// Typed reference to one registered attribute column.
///
/// Cheap to copy and hand out; resolves against the manager that issued it.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct AttributeHandle<V> {
    dimension: Dimension,
    index: usize,
    #[serde(skip)]
    _marker: PhantomData<fn() -> V>,
}

impl<V> AttributeHandle<V> {
    fn new(dimension: Dimension, index: usize) -> Self {
        Self {
            dimension,
            index,
            _marker: PhantomData,
        }
    }

    /// Dimension the attribute is bound to.
    #[inline]
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }
}

impl<V> Clone for AttributeHandle<V> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<V> Copy for AttributeHandle<V> {}
impl<V> PartialEq for AttributeHandle<V> {
    fn eq(&self, other: &Self) -> bool {
        self.dimension == other.dimension && self.index == other.index
    }
}
impl<V> Eq for AttributeHandle<V> {}

/// All columns of one value type, indexed by (dimension, name).
#[derive(Debug, Clone, Default)]
pub struct TypedColumns<V> {
    stores: Vec<AttributeStore<V>>,
    index: HashMap<(Dimension, String), usize>,
}

impl<V: AttributeValue> TypedColumns<V> {
    fn lookup(&self, dimension: Dimension, name: &str) -> Option<usize> {
        self.index.get(&(dimension, name.to_owned())).copied()
    }
}

/// Erased per-store operations used for the scope/capacity fan-out.
trait ColumnOps {
    fn dimension(&self) -> Dimension;
    fn scope_depth(&self) -> usize;
    fn push_scope(&mut self);
    fn commit_scope(&mut self) -> Result<(), MeshForgeError>;
    fn rollback_scope(&mut self) -> Result<(), MeshForgeError>;
    fn reserve(&mut self, min_capacity: usize) -> Result<(), MeshForgeError>;
    fn mark_dead(&mut self, slot: usize) -> Result<(), MeshForgeError>;
    fn reuse(&mut self, slot: usize) -> Result<(), MeshForgeError>;
    fn compacting_remap(&self) -> SlotRemap;
    fn apply_remap(&mut self, remap: &SlotRemap);
}

impl<V: AttributeValue> ColumnOps for AttributeStore<V> {
    fn dimension(&self) -> Dimension {
        AttributeStore::dimension(self)
    }
    fn scope_depth(&self) -> usize {
        AttributeStore::scope_depth(self)
    }
    fn push_scope(&mut self) {
        AttributeStore::push_scope(self)
    }
    fn commit_scope(&mut self) -> Result<(), MeshForgeError> {
        AttributeStore::commit_scope(self)
    }
    fn rollback_scope(&mut self) -> Result<(), MeshForgeError> {
        AttributeStore::rollback_scope(self)
    }
    fn reserve(&mut self, min_capacity: usize) -> Result<(), MeshForgeError> {
        AttributeStore::reserve(self, min_capacity)
    }
    fn mark_dead(&mut self, slot: usize) -> Result<(), MeshForgeError> {
        AttributeStore::mark_dead(self, slot)
    }
    fn reuse(&mut self, slot: usize) -> Result<(), MeshForgeError> {
        AttributeStore::reuse(self, slot)
    }
    fn compacting_remap(&self) -> SlotRemap {
        SlotRemap::compacting(&(0..self.len()).map(|s| self.is_dead(s)).collect::<Vec<_>>())
    }
    fn apply_remap(&mut self, remap: &SlotRemap) {
        AttributeStore::apply_remap(self, remap)
    }
}

/// Owner and transactional coordinator of every attribute column of one
/// mesh.
#[derive(Debug, Default, Clone)]
pub struct AttributeManager {
    capacities: [usize; 4],
    doubles: TypedColumns<f64>,
    longs: TypedColumns<i64>,
    bytes: TypedColumns<u8>,
    scope_depth: usize,
}

impl AttributeManager {
    /// Empty manager; capacities start at zero and grow via
    /// [`reserve`](AttributeManager::reserve).
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn double_columns(&self) -> &TypedColumns<f64> {
        &self.doubles
    }
    pub(crate) fn double_columns_mut(&mut self) -> &mut TypedColumns<f64> {
        &mut self.doubles
    }
    pub(crate) fn long_columns(&self) -> &TypedColumns<i64> {
        &self.longs
    }
    pub(crate) fn long_columns_mut(&mut self) -> &mut TypedColumns<i64> {
        &mut self.longs
    }
    pub(crate) fn byte_columns(&self) -> &TypedColumns<u8> {
        &self.bytes
    }
    pub(crate) fn byte_columns_mut(&mut self) -> &mut TypedColumns<u8> {
        &mut self.bytes
    }

    fn columns_mut_iter(&mut self) -> impl Iterator<Item = &mut dyn ColumnOps> {
        self.doubles
            .stores
            .iter_mut()
            .map(|s| s as &mut dyn ColumnOps)
            .chain(self.longs.stores.iter_mut().map(|s| s as &mut dyn ColumnOps))
            .chain(self.bytes.stores.iter_mut().map(|s| s as &mut dyn ColumnOps))
    }

    fn columns_iter(&self) -> impl Iterator<Item = &dyn ColumnOps> {
        self.doubles
            .stores
            .iter()
            .map(|s| s as &dyn ColumnOps)
            .chain(self.longs.stores.iter().map(|s| s as &dyn ColumnOps))
            .chain(self.bytes.stores.iter().map(|s| s as &dyn ColumnOps))
    }

    /// Registered column count across all value types.
    pub fn attribute_count(&self) -> usize {
        self.doubles.stores.len() + self.longs.stores.len() + self.bytes.stores.len()
    }

    /// Current slot capacity for a dimension.
    #[inline]
    pub fn capacity(&self, dimension: Dimension) -> usize {
        self.capacities[dimension.index()]
    }

    /// Register a new column. The stride is `default.len()`; the column is
    /// created at the dimension's current capacity and joins any scopes
    /// already open so the fan-out stays balanced.
    ///
    /// # Errors
    /// `StrideMismatch` for an empty default, `DuplicateAttribute` when the
    /// (dimension, name) pair is taken for this value type.
    pub fn register<V: AttributeValue>(
        &mut self,
        dimension: Dimension,
        name: &str,
        default: &[V],
    ) -> Result<AttributeHandle<V>, MeshForgeError> {
        if default.is_empty() {
            return Err(MeshForgeError::StrideMismatch {
                expected: 1,
                found: 0,
            });
        }
        let capacity = self.capacity(dimension);
        let depth = self.scope_depth;
        let columns = V::columns_mut(self);
        if columns.lookup(dimension, name).is_some() {
            return Err(MeshForgeError::DuplicateAttribute(name.to_owned()));
        }
        let mut store = AttributeStore::new(dimension, name, default, capacity);
        for _ in 0..depth {
            store.push_scope();
        }
        let index = columns.stores.len();
        columns.stores.push(store);
        columns.index.insert((dimension, name.to_owned()), index);
        log::debug!("registered attribute `{name}` on {dimension} (stride {})", default.len());
        Ok(AttributeHandle::new(dimension, index))
    }

    /// Handle to a previously registered column, if any.
    pub fn attribute<V: AttributeValue>(
        &self,
        dimension: Dimension,
        name: &str,
    ) -> Option<AttributeHandle<V>> {
        V::columns(self)
            .lookup(dimension, name)
            .map(|index| AttributeHandle::new(dimension, index))
    }

    /// Handle to a previously registered column.
    ///
    /// # Errors
    /// `UnknownAttribute` when the (dimension, name) pair was never
    /// registered for this value type.
    pub fn try_attribute<V: AttributeValue>(
        &self,
        dimension: Dimension,
        name: &str,
    ) -> Result<AttributeHandle<V>, MeshForgeError> {
        self.attribute(dimension, name)
            .ok_or_else(|| MeshForgeError::UnknownAttribute(name.to_owned()))
    }

    /// The column a handle refers to.
    pub fn store<V: AttributeValue>(&self, handle: AttributeHandle<V>) -> &AttributeStore<V> {
        &V::columns(self).stores[handle.index]
    }

    /// Mutable access to the column a handle refers to.
    pub fn store_mut<V: AttributeValue>(
        &mut self,
        handle: AttributeHandle<V>,
    ) -> &mut AttributeStore<V> {
        &mut V::columns_mut(self).stores[handle.index]
    }

    /// Read/write façade over one column.
    pub fn accessor<V: AttributeValue>(&mut self, handle: AttributeHandle<V>) -> Accessor<'_, V> {
        Accessor::new(self.store_mut(handle))
    }

    /// Write-coalescing façade over one column; see [`BufferedAccessor`].
    pub fn buffered_accessor<V: AttributeValue>(
        &mut self,
        handle: AttributeHandle<V>,
    ) -> BufferedAccessor<'_, V> {
        BufferedAccessor::new(self.store_mut(handle))
    }

    /// Grow every column of `dimension` to at least `min_capacity` slots.
    ///
    /// # Errors
    /// `CapacityError` when any column's backing storage refuses to grow;
    /// columns already grown stay grown (harmless; capacity is monotone).
    pub fn reserve(
        &mut self,
        dimension: Dimension,
        min_capacity: usize,
    ) -> Result<(), MeshForgeError> {
        for column in self.columns_mut_iter() {
            if column.dimension() == dimension {
                column.reserve(min_capacity)?;
            }
        }
        let cap = &mut self.capacities[dimension.index()];
        *cap = (*cap).max(min_capacity);
        Ok(())
    }

    /// Soft-delete `slot` in every column of `dimension` (scope-logged).
    pub fn mark_dead(&mut self, dimension: Dimension, slot: usize) -> Result<(), MeshForgeError> {
        for column in self.columns_mut_iter() {
            if column.dimension() == dimension {
                column.mark_dead(slot)?;
            }
        }
        Ok(())
    }

    /// Recycle a dead `slot` in every column of `dimension` (scope-logged,
    /// values reset to each column's default).
    pub fn reuse(&mut self, dimension: Dimension, slot: usize) -> Result<(), MeshForgeError> {
        for column in self.columns_mut_iter() {
            if column.dimension() == dimension {
                column.reuse(slot)?;
            }
        }
        Ok(())
    }

    /// Begin one logical scope spanning every column of every value type.
    pub fn open_scope(&mut self) {
        for column in self.columns_mut_iter() {
            column.push_scope();
        }
        self.scope_depth += 1;
        self.debug_assert_invariants();
    }

    /// Current logical scope depth.
    #[inline]
    pub fn scope_depth(&self) -> usize {
        self.scope_depth
    }

    /// Pop the top logical scope everywhere, keeping all writes.
    ///
    /// # Errors
    /// `ScopeUnderflow` with no open scope.
    pub fn commit(&mut self) -> Result<(), MeshForgeError> {
        if self.scope_depth == 0 {
            return Err(MeshForgeError::ScopeUnderflow);
        }
        for column in self.columns_mut_iter() {
            column.commit_scope()?;
        }
        self.scope_depth -= 1;
        self.debug_assert_invariants();
        Ok(())
    }

    /// Pop the top logical scope everywhere, undoing all writes made while
    /// it was open. All columns roll back together; none is left
    /// half-applied.
    ///
    /// # Errors
    /// `ScopeUnderflow` with no open scope.
    pub fn rollback(&mut self) -> Result<(), MeshForgeError> {
        if self.scope_depth == 0 {
            return Err(MeshForgeError::ScopeUnderflow);
        }
        for column in self.columns_mut_iter() {
            column.rollback_scope()?;
        }
        self.scope_depth -= 1;
        self.debug_assert_invariants();
        Ok(())
    }

    /// Compact every column of `dimension` under one shared old-to-new
    /// map, computed from the first column's dead bitmap (all columns of a
    /// dimension are driven identically and agree). Returns `None` when
    /// the dimension has no columns.
    pub fn consolidate(&mut self, dimension: Dimension) -> Option<SlotRemap> {
        let remap = self
            .columns_iter()
            .find(|c| c.dimension() == dimension)?
            .compacting_remap();
        for column in self.columns_mut_iter() {
            if column.dimension() == dimension {
                column.apply_remap(&remap);
            }
        }
        self.capacities[dimension.index()] = remap.len_after();
        log::debug!(
            "consolidated {dimension}: {} -> {} slots",
            remap.len_before(),
            remap.len_after()
        );
        Some(remap)
    }
}

impl DebugInvariants for AttributeManager {
    fn debug_assert_invariants(&self) {
        crate::forge_debug_assert_ok!(self.validate_invariants(), "AttributeManager invalid");
    }

    fn validate_invariants(&self) -> Result<(), MeshForgeError> {
        // every column tracks the manager's logical depth exactly
        for column in self.columns_iter() {
            if column.scope_depth() != self.scope_depth {
                return Err(MeshForgeError::ScopeUnderflow);
            }
        }
        Ok(())
    }
}
