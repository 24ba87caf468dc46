//! Conflict coloring: partitioning candidates into independent batches.
//!
//! Two candidates conflict when their local neighborhoods overlap: the
//! element slots an edit at each may touch, as reported by the mesh
//! interface. The coloring groups candidates so that no two candidates of
//! one color class conflict; a class is therefore a batch of provably
//! independent edits. Classes are processed one at a time in ascending
//! color order; independence is only guaranteed *within* a class.
//!
//! Footprint collection is read-only and runs in parallel; the greedy
//! coloring pass itself is sequential in candidate order, which keeps the
//! class assignment deterministic for a given candidate list.

use crate::topology::{Dimension, ElementHandle, MeshTopology};
use hashbrown::{HashMap, HashSet};
use itertools::Itertools;
use rayon::prelude::*;

/// Element identity for conflict purposes: its dimension and global slot.
type ElementKey = (Dimension, usize);

/// Candidates partitioned into pairwise-independent classes.
#[derive(Debug, Clone, Default)]
pub struct ColorClasses {
    classes: Vec<Vec<ElementHandle>>,
}

impl ColorClasses {
    /// Number of classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// True when no candidate received a color.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Classes in ascending color order; candidate order is preserved
    /// within each class.
    pub fn iter(&self) -> impl Iterator<Item = &[ElementHandle]> {
        self.classes.iter().map(Vec::as_slice)
    }

    /// Class `color`, if assigned.
    pub fn class(&self, color: usize) -> Option<&[ElementHandle]> {
        self.classes.get(color).map(Vec::as_slice)
    }
}

/// The set of element slots an edit at `candidate` may touch: the
/// candidate itself plus its reported local neighborhood. Stale candidates
/// get an empty footprint (they conflict with nothing and are skipped at
/// attempt time).
fn footprint<M: MeshTopology + Sync + ?Sized>(
    mesh: &M,
    candidate: ElementHandle,
) -> HashSet<ElementKey> {
    let mut keys = HashSet::new();
    if !mesh.is_valid(candidate) {
        return keys;
    }
    if let Ok(slot) = mesh.slot_of(candidate) {
        keys.insert((candidate.dimension(), slot));
    }
    for neighbor in mesh.local_neighbors(candidate) {
        if let Ok(slot) = mesh.slot_of(neighbor) {
            keys.insert((neighbor.dimension(), slot));
        }
    }
    keys
}

/// Per-candidate conflict footprints, collected in parallel.
pub fn conflict_footprints<M: MeshTopology + Sync + ?Sized>(
    mesh: &M,
    candidates: &[ElementHandle],
) -> Vec<HashSet<ElementKey>> {
    candidates
        .par_iter()
        .map(|&candidate| footprint(mesh, candidate))
        .collect()
}

/// Greedily color `candidates` by conflict, smallest available color
/// first, in candidate order.
pub fn color_candidates<M: MeshTopology + Sync + ?Sized>(
    mesh: &M,
    candidates: &[ElementHandle],
) -> ColorClasses {
    let footprints = conflict_footprints(mesh, candidates);

    // invert: element slot -> candidates whose footprint contains it
    let mut buckets: HashMap<ElementKey, Vec<usize>> = HashMap::new();
    for (index, keys) in footprints.iter().enumerate() {
        for &key in keys {
            buckets.entry(key).or_default().push(index);
        }
    }

    let mut adjacency: Vec<HashSet<usize>> = vec![HashSet::new(); candidates.len()];
    for bucket in buckets.values() {
        for (&a, &b) in bucket.iter().tuple_combinations() {
            adjacency[a].insert(b);
            adjacency[b].insert(a);
        }
    }

    let mut colors = vec![usize::MAX; candidates.len()];
    let mut class_count = 0usize;
    for index in 0..candidates.len() {
        let used: HashSet<usize> = adjacency[index]
            .iter()
            .filter(|&&j| colors[j] != usize::MAX)
            .map(|&j| colors[j])
            .collect();
        let color = (0..).find(|c| !used.contains(c)).unwrap_or(0);
        colors[index] = color;
        class_count = class_count.max(color + 1);
    }

    let mut classes = vec![Vec::new(); class_count];
    for (index, &candidate) in candidates.iter().enumerate() {
        classes[colors[index]].push(candidate);
    }
    log::debug!(
        "colored {} candidates into {} classes",
        candidates.len(),
        classes.len()
    );
    ColorClasses { classes }
}

/// Check the coloring contract: no two candidates of one class overlap.
/// Intended for tests and `debug_assert!`-style auditing.
pub fn verify_classes<M: MeshTopology + Sync + ?Sized>(mesh: &M, classes: &ColorClasses) -> bool {
    classes.iter().all(|class| {
        let footprints: Vec<_> = class.iter().map(|&c| footprint(mesh, c)).collect();
        footprints
            .iter()
            .tuple_combinations()
            .all(|(a, b)| a.is_disjoint(b))
    })
}
