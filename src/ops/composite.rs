//! Composite operations: a sequence of edits under one transaction.
//!
//! A composite threads the single scope opened by `attempt` through every
//! step and commits once, at the end of the whole sequence. A late failure
//! therefore unwinds all earlier steps too: the attribute scope rollback
//! undoes every step's writes in one go, and the mesh unwind loop pops
//! every topology edit the sequence performed, newest first.
//!
//! Candidate chaining between steps follows the first-created rule: step
//! *k+1* receives the first element step *k* created, falling back to the
//! running candidate re-stamped through the ledger when a step created
//! nothing (a smoothing step, say, only moves values).

use crate::attr::AttributeManager;
use crate::forge_error::MeshForgeError;
use crate::ops::invariant::{Invariant, InvariantCollection};
use crate::ops::operation::{Applied, EditReceipt, Operation};
use crate::topology::{ElementHandle, MeshTopology};

/// A sequence of operations committed as one unit.
pub struct CompositeOperation<M: MeshTopology + ?Sized> {
    label: String,
    steps: Vec<Box<dyn Operation<M>>>,
    gate: InvariantCollection<M>,
}

impl<M: MeshTopology + ?Sized> CompositeOperation<M> {
    /// Empty composite with a display label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            steps: Vec::new(),
            gate: InvariantCollection::new(),
        }
    }

    /// Append a step; builder-style.
    #[must_use]
    pub fn then(mut self, step: impl Operation<M> + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Add a whole-sequence invariant evaluated once, after the last step.
    #[must_use]
    pub fn gated_by(mut self, invariant: impl Invariant<M> + 'static) -> Self {
        self.gate.push(invariant);
        self
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True when the composite has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl<M: MeshTopology + ?Sized> Operation<M> for CompositeOperation<M> {
    fn kind(&self) -> &str {
        &self.label
    }

    fn pre_check(&self, mesh: &M, candidate: ElementHandle) -> bool {
        // later steps see post-edit state, so only the first step can be
        // pre-checked up front
        match self.steps.first() {
            Some(step) => step.pre_check(mesh, candidate),
            None => false,
        }
    }

    fn apply(
        &mut self,
        mesh: &mut M,
        attrs: &mut AttributeManager,
        candidate: ElementHandle,
    ) -> Result<Applied, MeshForgeError> {
        let mut receipt = EditReceipt::new();
        let mut current = candidate;
        for (index, step) in self.steps.iter_mut().enumerate() {
            if index > 0 && !step.pre_check(mesh, current) {
                return Ok(Applied::Infeasible);
            }
            let step_receipt = match step.apply(mesh, attrs, current)? {
                Applied::Done(r) => r,
                Applied::Infeasible => return Ok(Applied::Infeasible),
            };
            if !step
                .invariants()
                .evaluate(mesh, attrs, &step_receipt.touched())
            {
                return Ok(Applied::Infeasible);
            }
            current = match step_receipt.created.first() {
                Some(&h) => h,
                None => match mesh.ledger().resurrect(current) {
                    Ok(h) => h,
                    Err(_) => return Ok(Applied::Infeasible),
                },
            };
            receipt.absorb(step_receipt);
        }
        Ok(Applied::Done(receipt))
    }

    fn invariants(&self) -> &dyn Invariant<M> {
        &self.gate
    }
}
