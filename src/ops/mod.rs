//! The operation protocol: invariants, attribute transfer, and the
//! attempt/commit/rollback state machine.
#![warn(missing_docs)]

pub mod composite;
pub mod invariant;
pub mod operation;
pub mod transfer;

pub use composite::CompositeOperation;
pub use invariant::{
    AlwaysPass, AnyOf, Invariant, InvariantCollection, MinScore, ScoredInvariant, Sequence,
};
pub use operation::{attempt, Applied, EditReceipt, Operation, Outcome, RejectReason};
pub use transfer::{AttributeTransfer, TransferFn, TransferRule, TransferStrategy};
