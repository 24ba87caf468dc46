//! Scheduling: candidate iteration, outcome statistics, and conflict-free
//! parallel batching.
#![warn(missing_docs)]

pub mod coloring;
pub mod scheduler;

pub use coloring::{color_candidates, conflict_footprints, verify_classes, ColorClasses};
pub use scheduler::{RunStats, Scheduler};
