//! # mesh-forge
//!
//! mesh-forge is the transactional attribute-storage and operation-execution
//! core of a dynamic mesh-editing toolkit: it lets callers repeatedly rewrite
//! the connectivity of a discrete cell complex (point/edge/triangle/
//! tetrahedron meshes) while carrying per-element numeric data (positions,
//! tags, energies) safely through each edit.
//!
//! ## Features
//! - Generational element handles with O(1) staleness detection backed by
//!   atomic per-cell generation counters
//! - Typed attribute columns (f64/i64/u8) with scoped, speculative
//!   transactions: open a scope, mutate, validate, commit or roll back
//! - An operation protocol composing topology edits, attribute transfer and
//!   invariant checking into one attempt/commit/rollback unit
//! - A scheduler with a conflict-free parallel batching mode built on
//!   greedy graph coloring
//!
//! Concrete connectivity tables, navigation rules, and geometric predicates
//! live outside this crate behind the [`MeshTopology`] boundary trait; see
//! the crate-level docs of [`topology::mesh`] for the contract, in
//! particular the requirement that every mutating call be invertible via
//! `undo_last_edit`.
//!
//! ## Determinism
//!
//! Sequential runs visit candidates in order. Parallel runs color once per
//! pass and apply each class's surviving candidates in candidate order, so
//! a given candidate list always produces the same final mesh state.
//!
//! ## Usage
//! Add `mesh-forge` as a dependency in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! mesh-forge = "0.3"
//! ```
//!
//! [`MeshTopology`]: crate::topology::MeshTopology

// Re-export our major subsystems:
pub mod attr;
pub mod debug_invariants;
pub mod forge_error;
pub mod ops;
pub mod schedule;
pub mod topology;

pub use debug_invariants::DebugInvariants;
pub use forge_error::MeshForgeError;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::attr::{
        Accessor, AttributeHandle, AttributeManager, AttributeStore, AttributeValue,
        BufferedAccessor, ScopeStack, SlotRemap,
    };
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::forge_error::MeshForgeError;
    pub use crate::ops::{
        attempt, AlwaysPass, AnyOf, Applied, AttributeTransfer, CompositeOperation, EditReceipt,
        Invariant, InvariantCollection, MinScore, Operation, Outcome, RejectReason,
        ScoredInvariant, Sequence, TransferRule, TransferStrategy,
    };
    pub use crate::schedule::{color_candidates, ColorClasses, RunStats, Scheduler};
    pub use crate::topology::{
        Dimension, ElementHandle, GenerationLedger, LocalIndices, MeshTopology,
    };
}
