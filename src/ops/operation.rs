//! The operation protocol: one edit template, one transactional attempt.
//!
//! An [`Operation`] describes a template of mesh edit: what makes a
//! candidate eligible (`pre_check`), how the edit is performed
//! (`apply`, delegating topology to the [`MeshTopology`] interface and
//! attribute transfer to accessors inside the open scope), and which
//! invariants gate acceptance. [`attempt`] drives the state machine
//!
//! ```text
//! Candidate -> Attempting -> { Accepted, Rejected }
//! ```
//!
//! and owns the pairing that keeps attributes and topology consistent: a
//! rejected attempt rolls the attribute scope back *and* unwinds every
//! mesh edit the attempt performed, newest first, via `undo_last_edit`.

use crate::attr::AttributeManager;
use crate::forge_error::MeshForgeError;
use crate::ops::invariant::Invariant;
use crate::topology::{ElementHandle, MeshTopology};

/// Handles an accepted edit created, rewrote, or removed.
#[derive(Debug, Clone, Default)]
pub struct EditReceipt {
    /// Elements the edit brought into existence.
    pub created: Vec<ElementHandle>,
    /// Pre-existing elements whose attributes or connectivity changed.
    pub modified: Vec<ElementHandle>,
    /// Elements the edit deleted (handles are stale by construction).
    pub removed: Vec<ElementHandle>,
}

impl EditReceipt {
    /// Receipt with nothing in it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles the gating invariants should look at: created + modified.
    pub fn touched(&self) -> Vec<ElementHandle> {
        let mut out = self.created.clone();
        out.extend_from_slice(&self.modified);
        out
    }

    /// Fold another receipt into this one (used by composite operations).
    pub fn absorb(&mut self, other: EditReceipt) {
        self.created.extend(other.created);
        self.modified.extend(other.modified);
        self.removed.extend(other.removed);
    }
}

/// What `apply` reports back to the state machine.
#[derive(Debug)]
pub enum Applied {
    /// The edit was performed; here is what changed.
    Done(EditReceipt),
    /// The mesh could not perform the requested mutation (a normal
    /// rejection, not an error).
    Infeasible,
}

/// Why an attempt was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The cheap pre-checks said no; no scope was opened, nothing mutated.
    PreCheck,
    /// The mesh interface declined the mutation mid-apply.
    Infeasible,
    /// A recoverable error surfaced during apply (e.g. a handle went
    /// stale); the attempt was unwound.
    ApplyError(MeshForgeError),
    /// The gating invariants failed on the post-edit state.
    InvariantFailed,
}

/// Outcome of one attempt.
#[derive(Debug)]
pub enum Outcome {
    /// Invariants passed, scope committed; the receipt lists the changes.
    Accepted(EditReceipt),
    /// The attempt was rolled back; no observable change remains.
    Rejected(RejectReason),
}

impl Outcome {
    /// True for [`Outcome::Accepted`].
    pub fn is_accepted(&self) -> bool {
        matches!(self, Outcome::Accepted(_))
    }
}

/// One edit template (split, collapse, swap, or a composite of those).
///
/// Transient per attempt: the scheduler re-runs the same operation value
/// against many candidates, but nothing persists between attempts.
pub trait Operation<M: MeshTopology + ?Sized> {
    /// Short label for logs and statistics.
    fn kind(&self) -> &str;

    /// Cheap eligibility checks, run before any scope is opened. Failing
    /// here rejects the candidate with no store mutation at all.
    fn pre_check(&self, mesh: &M, candidate: ElementHandle) -> bool {
        mesh.is_valid(candidate)
    }

    /// Perform the edit: mutate topology through the mesh interface and
    /// write transferred/derived attribute values through accessors. Runs
    /// inside the scope opened by [`attempt`]; must not open or close
    /// scopes itself.
    fn apply(
        &mut self,
        mesh: &mut M,
        attrs: &mut AttributeManager,
        candidate: ElementHandle,
    ) -> Result<Applied, MeshForgeError>;

    /// The gate deciding acceptance of the post-edit state.
    fn invariants(&self) -> &dyn Invariant<M>;
}

fn is_fatal(error: &MeshForgeError) -> bool {
    matches!(
        error,
        MeshForgeError::CapacityError { .. } | MeshForgeError::UndoFailure(_)
    )
}

/// Roll the attribute scope back and unwind mesh edits down to
/// `edit_mark`, newest first.
fn unwind<M: MeshTopology + ?Sized>(
    mesh: &mut M,
    attrs: &mut AttributeManager,
    edit_mark: usize,
) -> Result<(), MeshForgeError> {
    attrs.rollback()?;
    while mesh.edit_count() > edit_mark {
        mesh.undo_last_edit()?;
    }
    Ok(())
}

/// Drive one candidate through the operation state machine.
///
/// # Errors
/// Only fatal conditions escape: `CapacityError` (storage could not grow)
/// and `UndoFailure` (the mesh broke its inversion contract). Everything
/// per-candidate (stale handles, infeasible mutations, invariant
/// failures) comes back as [`Outcome::Rejected`] with the attempt fully
/// unwound.
pub fn attempt<M, O>(
    op: &mut O,
    mesh: &mut M,
    attrs: &mut AttributeManager,
    candidate: ElementHandle,
) -> Result<Outcome, MeshForgeError>
where
    M: MeshTopology + ?Sized,
    O: Operation<M> + ?Sized,
{
    if !op.pre_check(mesh, candidate) {
        log::trace!("{}: pre-check rejected {candidate}", op.kind());
        return Ok(Outcome::Rejected(RejectReason::PreCheck));
    }

    let edit_mark = mesh.edit_count();
    attrs.open_scope();

    match op.apply(mesh, attrs, candidate) {
        Ok(Applied::Done(receipt)) => {
            if op.invariants().evaluate(mesh, attrs, &receipt.touched()) {
                attrs.commit()?;
                log::trace!("{}: accepted {candidate}", op.kind());
                Ok(Outcome::Accepted(receipt))
            } else {
                unwind(mesh, attrs, edit_mark)?;
                log::trace!("{}: invariants rejected {candidate}", op.kind());
                Ok(Outcome::Rejected(RejectReason::InvariantFailed))
            }
        }
        Ok(Applied::Infeasible) => {
            unwind(mesh, attrs, edit_mark)?;
            Ok(Outcome::Rejected(RejectReason::Infeasible))
        }
        Err(error) => {
            unwind(mesh, attrs, edit_mark)?;
            if is_fatal(&error) {
                Err(error)
            } else {
                log::trace!("{}: apply error on {candidate}: {error}", op.kind());
                Ok(Outcome::Rejected(RejectReason::ApplyError(error)))
            }
        }
    }
}
