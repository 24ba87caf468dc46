//! Invariants: pass/fail predicates gating acceptance of an edit.
//!
//! An invariant sees the post-edit mesh plus the attribute manager and the
//! handles the edit touched; pre-edit attribute values remain readable
//! through the pre-scope view (`Accessor::get_pre_scope`) for before/after
//! comparisons. Failure is a normal boolean outcome consumed by the
//! operation protocol to decide rollback, never an error.
//!
//! Combinators compose invariants recursively: a collection is logical
//! AND, [`AnyOf`] is OR, [`Sequence`] is in-order short-circuit AND, and
//! [`MinScore`] accepts the best-scoring alternative. Each combinator is
//! itself an [`Invariant`], so nesting is uniform.

use crate::attr::AttributeManager;
use crate::topology::{ElementHandle, MeshTopology};

/// Pass/fail predicate over post-edit state.
///
/// Must be side-effect-free and deterministic for a given state; the
/// scheduler may evaluate it speculatively.
pub trait Invariant<M: MeshTopology + ?Sized>: Send + Sync {
    /// True when the edit described by `handles` is acceptable.
    fn evaluate(&self, mesh: &M, attrs: &AttributeManager, handles: &[ElementHandle]) -> bool;
}

/// Any matching closure is an invariant.
impl<M, F> Invariant<M> for F
where
    M: MeshTopology + ?Sized,
    F: Fn(&M, &AttributeManager, &[ElementHandle]) -> bool + Send + Sync,
{
    fn evaluate(&self, mesh: &M, attrs: &AttributeManager, handles: &[ElementHandle]) -> bool {
        self(mesh, attrs, handles)
    }
}

/// The empty gate: accepts everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysPass;

impl<M: MeshTopology + ?Sized> Invariant<M> for AlwaysPass {
    fn evaluate(&self, _mesh: &M, _attrs: &AttributeManager, _handles: &[ElementHandle]) -> bool {
        true
    }
}

/// Conjunction over a list of invariants; the default gate shape.
pub struct InvariantCollection<M: MeshTopology + ?Sized> {
    children: Vec<Box<dyn Invariant<M>>>,
}

impl<M: MeshTopology + ?Sized> Default for InvariantCollection<M> {
    fn default() -> Self {
        Self {
            children: Vec::new(),
        }
    }
}

impl<M: MeshTopology + ?Sized> InvariantCollection<M> {
    /// Empty collection (accepts everything).
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a child; builder-style.
    #[must_use]
    pub fn with(mut self, child: impl Invariant<M> + 'static) -> Self {
        self.children.push(Box::new(child));
        self
    }

    /// Append a child in place.
    pub fn push(&mut self, child: impl Invariant<M> + 'static) {
        self.children.push(Box::new(child));
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// True when the collection has no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl<M: MeshTopology + ?Sized> Invariant<M> for InvariantCollection<M> {
    fn evaluate(&self, mesh: &M, attrs: &AttributeManager, handles: &[ElementHandle]) -> bool {
        self.children
            .iter()
            .all(|child| child.evaluate(mesh, attrs, handles))
    }
}

/// Disjunction: passes when any child passes.
pub struct AnyOf<M: MeshTopology + ?Sized> {
    children: Vec<Box<dyn Invariant<M>>>,
}

impl<M: MeshTopology + ?Sized> AnyOf<M> {
    /// OR over `children`.
    pub fn new(children: Vec<Box<dyn Invariant<M>>>) -> Self {
        Self { children }
    }
}

impl<M: MeshTopology + ?Sized> Invariant<M> for AnyOf<M> {
    fn evaluate(&self, mesh: &M, attrs: &AttributeManager, handles: &[ElementHandle]) -> bool {
        self.children
            .iter()
            .any(|child| child.evaluate(mesh, attrs, handles))
    }
}

/// In-order short-circuit conjunction: children are evaluated front to
/// back and the first failure stops the chain. Use when late checks are
/// expensive and early ones are cheap filters.
pub struct Sequence<M: MeshTopology + ?Sized> {
    children: Vec<Box<dyn Invariant<M>>>,
}

impl<M: MeshTopology + ?Sized> Sequence<M> {
    /// Ordered chain over `children`.
    pub fn new(children: Vec<Box<dyn Invariant<M>>>) -> Self {
        Self { children }
    }
}

impl<M: MeshTopology + ?Sized> Invariant<M> for Sequence<M> {
    fn evaluate(&self, mesh: &M, attrs: &AttributeManager, handles: &[ElementHandle]) -> bool {
        for child in &self.children {
            if !child.evaluate(mesh, attrs, handles) {
                return false;
            }
        }
        true
    }
}

/// Scored alternative for [`MinScore`]: `None` means the alternative is
/// infeasible, `Some(score)` ranks it (lower is better).
pub trait ScoredInvariant<M: MeshTopology + ?Sized>: Send + Sync {
    /// Score this alternative, `None` to rule it out. NaN scores are
    /// treated as infeasible.
    fn score(&self, mesh: &M, attrs: &AttributeManager, handles: &[ElementHandle]) -> Option<f64>;
}

impl<M, F> ScoredInvariant<M> for F
where
    M: MeshTopology + ?Sized,
    F: Fn(&M, &AttributeManager, &[ElementHandle]) -> Option<f64> + Send + Sync,
{
    fn score(&self, mesh: &M, attrs: &AttributeManager, handles: &[ElementHandle]) -> Option<f64> {
        self(mesh, attrs, handles)
    }
}

/// Accept the best-scoring alternative.
///
/// Tie-break rule: the lowest score wins; among equal scores the earliest
/// child (registration order) wins. As a boolean invariant this passes
/// when any alternative is feasible; [`winner`](MinScore::winner) reports
/// which one.
pub struct MinScore<M: MeshTopology + ?Sized> {
    children: Vec<Box<dyn ScoredInvariant<M>>>,
}

impl<M: MeshTopology + ?Sized> MinScore<M> {
    /// Scored alternatives in registration order.
    pub fn new(children: Vec<Box<dyn ScoredInvariant<M>>>) -> Self {
        Self { children }
    }

    /// Index of the winning alternative, `None` when all are infeasible.
    pub fn winner(
        &self,
        mesh: &M,
        attrs: &AttributeManager,
        handles: &[ElementHandle],
    ) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (index, child) in self.children.iter().enumerate() {
            let Some(score) = child.score(mesh, attrs, handles) else {
                continue;
            };
            if score.is_nan() {
                continue;
            }
            match best {
                Some((_, best_score)) if score >= best_score => {}
                _ => best = Some((index, score)),
            }
        }
        best.map(|(index, _)| index)
    }
}

impl<M: MeshTopology + ?Sized> Invariant<M> for MinScore<M> {
    fn evaluate(&self, mesh: &M, attrs: &AttributeManager, handles: &[ElementHandle]) -> bool {
        self.winner(mesh, attrs, handles).is_some()
    }
}
