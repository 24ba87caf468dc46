//! `ElementHandle`: a generational reference into mutable topology.
//!
//! A handle names one element of one dimension: local sub-element indices
//! inside an owning top-dimension cell, the global index of that cell, and
//! a generation stamp copied from the cell at construction time. The stamp
//! is what turns "dangling pointer into a renumbered mesh" into an O(1)
//! staleness check: a handle is valid iff its cell is still alive and the
//! cell's live generation equals the stamp.
//!
//! Handles are never mutated in place. Navigation and edits produce new
//! handles; every structural edit that touches a cell bumps that cell's
//! generation and thereby invalidates all outstanding handles to it.

use crate::topology::Dimension;
use std::fmt;

/// Local sub-element indices within one top-dimension cell.
///
/// For a tetrahedron these are a local vertex (0..4), a local edge (0..6)
/// and a local face (0..4); lower-dimensional meshes leave the unused
/// entries at 0.
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, Debug, Default, serde::Serialize, serde::Deserialize,
)]
pub struct LocalIndices {
    /// Local vertex index within the cell.
    pub vertex: u8,
    /// Local edge index within the cell.
    pub edge: u8,
    /// Local face index within the cell.
    pub face: u8,
}

/// Generational reference to one mesh element.
///
/// `Copy` and 12 bytes; cheap to pass around, store in work lists, and
/// re-check at any time via [`GenerationLedger::is_valid`].
///
/// [`GenerationLedger::is_valid`]: crate::topology::GenerationLedger::is_valid
#[derive(Copy, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ElementHandle {
    /// Rank of the element this handle resolves to.
    dimension: Dimension,
    /// Local sub-element indices within the owning cell.
    local: LocalIndices,
    /// Global index of the owning top-dimension cell.
    cell: u32,
    /// Generation stamp of the cell at construction time.
    generation: u32,
}

impl ElementHandle {
    /// Create a handle from its parts. The caller supplies the generation
    /// stamp read from the ledger at navigation time.
    #[inline]
    pub const fn new(
        dimension: Dimension,
        local: LocalIndices,
        cell: u32,
        generation: u32,
    ) -> Self {
        Self {
            dimension,
            local,
            cell,
            generation,
        }
    }

    /// Shorthand for a top-dimension cell handle (all locals zero).
    #[inline]
    pub const fn cell_handle(dimension: Dimension, cell: u32, generation: u32) -> Self {
        Self::new(dimension, LocalIndices { vertex: 0, edge: 0, face: 0 }, cell, generation)
    }

    /// Rank of the referenced element.
    #[inline]
    pub const fn dimension(self) -> Dimension {
        self.dimension
    }

    /// Local sub-element indices within the owning cell.
    #[inline]
    pub const fn local(self) -> LocalIndices {
        self.local
    }

    /// Global index of the owning top-dimension cell.
    #[inline]
    pub const fn cell(self) -> u32 {
        self.cell
    }

    /// Generation stamp captured at construction.
    #[inline]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// The same element reference carrying a fresh generation stamp.
    ///
    /// Used by [`GenerationLedger::resurrect`] when an edit only renumbered
    /// (bumped) a cell without deleting it; never call this with a stamp
    /// that was not read from the ledger.
    ///
    /// [`GenerationLedger::resurrect`]: crate::topology::GenerationLedger::resurrect
    #[inline]
    #[must_use]
    pub const fn with_generation(self, generation: u32) -> Self {
        Self {
            dimension: self.dimension,
            local: self.local,
            cell: self.cell,
            generation,
        }
    }
}

impl fmt::Debug for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementHandle")
            .field("dim", &self.dimension)
            .field("cell", &self.cell)
            .field("gen", &self.generation)
            .field("local", &(self.local.vertex, self.local.edge, self.local.face))
            .finish()
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}@g{}", self.dimension, self.cell, self.generation)
    }
}

#[cfg(test)]
mod layout_tests {
    //! Compile-time assertion that the handle stays three words wide.
    use super::*;
    use static_assertions::assert_eq_size;

    assert_eq_size!(ElementHandle, [u32; 3]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors() {
        let h = ElementHandle::new(
            Dimension::Triangle,
            LocalIndices { vertex: 1, edge: 2, face: 0 },
            42,
            7,
        );
        assert_eq!(h.dimension(), Dimension::Triangle);
        assert_eq!(h.cell(), 42);
        assert_eq!(h.generation(), 7);
        assert_eq!(h.local().edge, 2);
    }

    #[test]
    fn with_generation_only_changes_stamp() {
        let h = ElementHandle::cell_handle(Dimension::Edge, 3, 1);
        let h2 = h.with_generation(5);
        assert_eq!(h2.cell(), 3);
        assert_eq!(h2.dimension(), Dimension::Edge);
        assert_eq!(h2.generation(), 5);
        assert_ne!(h, h2);
    }

    #[test]
    fn display_and_debug() {
        let h = ElementHandle::cell_handle(Dimension::Tetrahedron, 9, 2);
        assert_eq!(format!("{h}"), "tetrahedron#9@g2");
        assert!(format!("{h:?}").contains("cell: 9"));
    }

    #[test]
    fn serde_roundtrip() {
        let h = ElementHandle::cell_handle(Dimension::Vertex, 11, 3);
        let s = serde_json::to_string(&h).unwrap();
        let h2: ElementHandle = serde_json::from_str(&s).unwrap();
        assert_eq!(h, h2);
    }
}
