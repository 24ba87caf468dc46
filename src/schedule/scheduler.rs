//! The scheduler: driving many operation attempts over a candidate set.
//!
//! `run` walks candidates in order (a static list or any lazily produced
//! sequence), drives each through the operation state machine, and tallies
//! the outcomes. A single candidate's rejection never aborts a run; only
//! the fatal conditions (`CapacityError`, `UndoFailure`) do, and even then
//! every previously committed edit stays committed; only the in-flight
//! attempt is unwound.
//!
//! `run_parallel` partitions candidates by conflict coloring and processes
//! the classes in ascending color order. Within a class the read-only
//! phase (validity + pre-checks) runs concurrently; the transactional
//! apply/commit of the survivors then runs under exclusive access in
//! candidate order. Class members are pairwise independent, so their
//! relative order is unobservable; class *k* finishes before class *k+1*
//! starts because the later class's conflicts may depend on the earlier
//! class's edits.

use crate::attr::AttributeManager;
use crate::forge_error::MeshForgeError;
use crate::ops::operation::{attempt, Operation, Outcome};
use crate::schedule::coloring::color_candidates;
use crate::topology::{ElementHandle, MeshTopology};
use rayon::prelude::*;
use std::collections::VecDeque;
use std::fmt;

/// Outcome tally for one scheduling run. Reset at the start of each run;
/// nothing persists across runs.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
pub struct RunStats {
    /// Candidates driven through the state machine.
    pub attempted: u64,
    /// Attempts that committed.
    pub succeeded: u64,
    /// Attempts that were rejected and rolled back.
    pub failed: u64,
    /// Candidates dropped before any attempt (stale handles).
    pub skipped: u64,
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "attempted {}, succeeded {}, failed {}, skipped {}",
            self.attempted, self.succeeded, self.failed, self.skipped
        )
    }
}

impl RunStats {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Accepted(_) => self.succeeded += 1,
            Outcome::Rejected(_) => self.failed += 1,
        }
    }
}

/// Drives one operation over many candidates.
#[derive(Debug)]
pub struct Scheduler<O> {
    operation: O,
    requeue_created: bool,
}

impl<O> Scheduler<O> {
    /// Scheduler for `operation`; created elements are not re-queued.
    pub fn new(operation: O) -> Self {
        Self {
            operation,
            requeue_created: false,
        }
    }

    /// Push elements created by accepted attempts back onto the work list
    /// (sequential runs only).
    #[must_use]
    pub fn with_requeue(mut self, requeue: bool) -> Self {
        self.requeue_created = requeue;
        self
    }

    /// The driven operation.
    pub fn operation(&self) -> &O {
        &self.operation
    }

    /// Drive every candidate through the operation state machine, in
    /// order.
    ///
    /// # Errors
    /// Only fatal conditions: `CapacityError` and `UndoFailure`. Committed
    /// edits from earlier accepted attempts are untouched by an abort.
    pub fn run<M>(
        &mut self,
        mesh: &mut M,
        attrs: &mut AttributeManager,
        candidates: impl IntoIterator<Item = ElementHandle>,
    ) -> Result<RunStats, MeshForgeError>
    where
        M: MeshTopology + ?Sized,
        O: Operation<M>,
    {
        let mut stats = RunStats::default();
        let mut queue: VecDeque<ElementHandle> = candidates.into_iter().collect();
        while let Some(candidate) = queue.pop_front() {
            if !mesh.is_valid(candidate) {
                stats.skipped += 1;
                continue;
            }
            stats.attempted += 1;
            let outcome = attempt(&mut self.operation, mesh, attrs, candidate)?;
            stats.record(&outcome);
            if self.requeue_created {
                if let Outcome::Accepted(receipt) = &outcome {
                    queue.extend(receipt.created.iter().copied());
                }
            }
        }
        log::debug!("{} pass: {stats}", self.operation.kind());
        Ok(stats)
    }

    /// Drive candidates in conflict-free parallel batches.
    ///
    /// Coloring happens once, over the initial candidate list; every
    /// attempt still runs the full transactional state machine, so a
    /// neighborhood changed by an earlier class can only cost a rejection,
    /// never consistency.
    ///
    /// # Errors
    /// As [`run`](Scheduler::run).
    pub fn run_parallel<M>(
        &mut self,
        mesh: &mut M,
        attrs: &mut AttributeManager,
        candidates: Vec<ElementHandle>,
    ) -> Result<RunStats, MeshForgeError>
    where
        M: MeshTopology + Sync,
        O: Operation<M> + Sync,
    {
        let classes = color_candidates(&*mesh, &candidates);
        let mut stats = RunStats::default();
        for class in classes.iter() {
            // read-only phase: validity and pre-checks, in parallel
            let shared_mesh: &M = mesh;
            let op: &O = &self.operation;
            let verdicts: Vec<(ElementHandle, bool, bool)> = class
                .par_iter()
                .map(|&candidate| {
                    let valid = shared_mesh.is_valid(candidate);
                    let eligible = valid && op.pre_check(shared_mesh, candidate);
                    (candidate, valid, eligible)
                })
                .collect();

            // mutating phase: exclusive access, candidate order
            for (candidate, valid, eligible) in verdicts {
                if !valid {
                    stats.skipped += 1;
                    continue;
                }
                stats.attempted += 1;
                if !eligible {
                    stats.failed += 1;
                    continue;
                }
                let outcome = attempt(&mut self.operation, mesh, attrs, candidate)?;
                stats.record(&outcome);
            }
        }
        log::debug!(
            "{} parallel pass over {} classes: {stats}",
            self.operation.kind(),
            classes.len()
        );
        Ok(stats)
    }
}
