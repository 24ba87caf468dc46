//! Topology vocabulary: element ranks, generational handles, and the
//! boundary contract to concrete mesh kinds.

pub mod dimension;
pub mod generation;
pub mod handle;
pub mod mesh;

pub use dimension::Dimension;
pub use generation::GenerationLedger;
pub use handle::{ElementHandle, LocalIndices};
pub use mesh::MeshTopology;
