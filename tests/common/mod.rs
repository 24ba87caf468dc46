//! Shared test fixture: a small edge mesh with journaled, invertible
//! edits.
//!
//! The fixture is the thin concrete-mesh glue the core treats as an
//! external collaborator: vertices and edges (top dimension = edge), an
//! endpoint table for connectivity, a generation ledger for the edge
//! cells, and an edit journal so `undo_last_edit` can invert every
//! mutating call exactly. Vertex elements are named relative to an owning
//! edge, wmtk-tuple style: `(edge cell, local vertex 0|1)`.

// each test binary uses its own subset of the fixture
#![allow(dead_code)]

use mesh_forge::forge_error::MeshForgeError;
use mesh_forge::topology::{
    Dimension, ElementHandle, GenerationLedger, LocalIndices, MeshTopology,
};

#[derive(Debug, Clone)]
enum Edit {
    CreateVertex { slot: usize, reused: bool },
    CreateEdge { slot: usize, reused: bool },
    DeleteEdge { slot: usize, endpoints: [usize; 2] },
}

/// Vertex/edge mesh with exact-inverse edit support.
#[derive(Debug, Clone, Default)]
pub struct EdgeMesh {
    ledger: GenerationLedger,
    endpoints: Vec<[usize; 2]>,
    edge_alive: Vec<bool>,
    vertex_alive: Vec<bool>,
    journal: Vec<Edit>,
    /// When set, `undo_last_edit` reports failure; exercises the fatal
    /// `UndoFailure` path.
    pub poison_undo: bool,
}

impl EdgeMesh {
    /// Mesh from explicit edges over `vertex_count` vertices.
    pub fn new(vertex_count: usize, edges: &[[usize; 2]]) -> Self {
        Self {
            ledger: GenerationLedger::with_capacity(edges.len()),
            endpoints: edges.to_vec(),
            edge_alive: vec![true; edges.len()],
            vertex_alive: vec![true; vertex_count],
            journal: Vec::new(),
            poison_undo: false,
        }
    }

    /// A chain 0-1-2-…-n: `n` edges over `n+1` vertices.
    pub fn chain(edge_count: usize) -> Self {
        let edges: Vec<[usize; 2]> = (0..edge_count).map(|i| [i, i + 1]).collect();
        Self::new(edge_count + 1, &edges)
    }

    /// `edge_count` pairwise disjoint edges: edge `i` joins vertices
    /// `2i` and `2i+1`.
    pub fn disjoint_pairs(edge_count: usize) -> Self {
        let edges: Vec<[usize; 2]> = (0..edge_count).map(|i| [2 * i, 2 * i + 1]).collect();
        Self::new(2 * edge_count, &edges)
    }

    /// Handle to edge `slot` at its current generation.
    pub fn edge_handle(&self, slot: usize) -> ElementHandle {
        ElementHandle::cell_handle(Dimension::Edge, slot as u32, self.ledger.stamp(slot as u32))
    }

    /// Handle to the `local` endpoint (0 or 1) of edge `slot`.
    pub fn vertex_handle(&self, slot: usize, local: u8) -> ElementHandle {
        ElementHandle::new(
            Dimension::Vertex,
            LocalIndices {
                vertex: local,
                edge: 0,
                face: 0,
            },
            slot as u32,
            self.ledger.stamp(slot as u32),
        )
    }

    /// Handles to every currently live edge.
    pub fn live_edges(&self) -> Vec<ElementHandle> {
        (0..self.edge_alive.len())
            .filter(|&slot| self.edge_alive[slot])
            .map(|slot| self.edge_handle(slot))
            .collect()
    }

    /// Endpoint slots of a live edge.
    pub fn endpoints_of(&self, slot: usize) -> [usize; 2] {
        self.endpoints[slot]
    }

    /// Whether edge `slot` is live.
    pub fn edge_is_alive(&self, slot: usize) -> bool {
        self.edge_alive.get(slot).copied().unwrap_or(false)
    }

    /// Count of live edges.
    pub fn live_edge_count(&self) -> usize {
        self.edge_alive.iter().filter(|&&a| a).count()
    }

    /// Rewire a (new) edge's endpoints; used by split right after
    /// `create_primitive`.
    pub fn set_endpoints(&mut self, slot: usize, endpoints: [usize; 2]) {
        self.endpoints[slot] = endpoints;
    }

    fn first_dead(flags: &[bool]) -> Option<usize> {
        flags.iter().position(|&alive| !alive)
    }
}

impl MeshTopology for EdgeMesh {
    fn top_dimension(&self) -> Dimension {
        Dimension::Edge
    }

    fn capacity(&self, dimension: Dimension) -> usize {
        match dimension {
            Dimension::Vertex => self.vertex_alive.len(),
            Dimension::Edge => self.edge_alive.len(),
            _ => 0,
        }
    }

    fn ledger(&self) -> &GenerationLedger {
        &self.ledger
    }

    fn create_primitive(&mut self, dimension: Dimension) -> Result<usize, MeshForgeError> {
        match dimension {
            Dimension::Vertex => {
                let (slot, reused) = match Self::first_dead(&self.vertex_alive) {
                    Some(slot) => {
                        self.vertex_alive[slot] = true;
                        (slot, true)
                    }
                    None => {
                        self.vertex_alive.push(true);
                        (self.vertex_alive.len() - 1, false)
                    }
                };
                self.journal.push(Edit::CreateVertex { slot, reused });
                Ok(slot)
            }
            Dimension::Edge => {
                let (slot, reused) = match Self::first_dead(&self.edge_alive) {
                    Some(slot) => {
                        self.edge_alive[slot] = true;
                        self.ledger.revive(slot as u32);
                        (slot, true)
                    }
                    None => {
                        self.edge_alive.push(true);
                        self.endpoints.push([0, 0]);
                        self.ledger.grow(Dimension::Edge, 1)?;
                        (self.edge_alive.len() - 1, false)
                    }
                };
                self.journal.push(Edit::CreateEdge { slot, reused });
                Ok(slot)
            }
            other => Err(MeshForgeError::CapacityError {
                dimension: other,
                requested: 0,
            }),
        }
    }

    fn delete_primitive(&mut self, dimension: Dimension, slot: usize) -> Result<(), MeshForgeError> {
        match dimension {
            Dimension::Edge => {
                if !self.edge_is_alive(slot) {
                    return Err(MeshForgeError::DeadSlot(slot));
                }
                self.edge_alive[slot] = false;
                self.ledger.mark_dead(slot as u32);
                self.journal.push(Edit::DeleteEdge {
                    slot,
                    endpoints: self.endpoints[slot],
                });
                Ok(())
            }
            Dimension::Vertex => unimplemented!("fixture never deletes vertices"),
            _ => Err(MeshForgeError::SlotOutOfBounds { slot, len: 0 }),
        }
    }

    fn slot_of(&self, handle: ElementHandle) -> Result<usize, MeshForgeError> {
        if !self.ledger.is_valid(handle) {
            return Err(self.ledger.stale_error(handle));
        }
        let cell = handle.cell() as usize;
        match handle.dimension() {
            Dimension::Edge => Ok(cell),
            Dimension::Vertex => Ok(self.endpoints[cell][handle.local().vertex as usize]),
            _ => Err(MeshForgeError::SlotOutOfBounds {
                slot: cell,
                len: 0,
            }),
        }
    }

    fn local_neighbors(&self, handle: ElementHandle) -> Vec<ElementHandle> {
        // endpoint vertices of the edge, plus every live edge sharing one
        let slot = match handle.dimension() {
            Dimension::Edge => handle.cell() as usize,
            _ => return Vec::new(),
        };
        let [a, b] = self.endpoints[slot];
        let mut out = vec![self.vertex_handle(slot, 0), self.vertex_handle(slot, 1)];
        for other in 0..self.edge_alive.len() {
            if other == slot || !self.edge_alive[other] {
                continue;
            }
            let [c, d] = self.endpoints[other];
            if c == a || c == b || d == a || d == b {
                out.push(self.edge_handle(other));
            }
        }
        out
    }

    fn edit_count(&self) -> usize {
        self.journal.len()
    }

    fn undo_last_edit(&mut self) -> Result<(), MeshForgeError> {
        if self.poison_undo {
            return Err(MeshForgeError::UndoFailure(
                "journal poisoned by test".into(),
            ));
        }
        let edit = self
            .journal
            .pop()
            .ok_or_else(|| MeshForgeError::UndoFailure("journal empty".into()))?;
        match edit {
            Edit::CreateVertex { slot, reused } => {
                self.vertex_alive[slot] = false;
                if !reused {
                    self.vertex_alive.pop();
                }
            }
            Edit::CreateEdge { slot, reused } => {
                self.edge_alive[slot] = false;
                self.ledger.mark_dead(slot as u32);
                if !reused {
                    // slot stays allocated; generations never shrink
                    self.endpoints[slot] = [0, 0];
                }
            }
            Edit::DeleteEdge { slot, endpoints } => {
                // revive at the bumped generation: old handles stay stale,
                // callers re-resolve via resurrect
                self.edge_alive[slot] = true;
                self.endpoints[slot] = endpoints;
                self.ledger.revive(slot as u32);
            }
        }
        Ok(())
    }
}

use mesh_forge::attr::{AttributeHandle, AttributeManager};
use mesh_forge::ops::{
    Applied, EditReceipt, Invariant, InvariantCollection, Operation, TransferStrategy,
};

/// Edge split: replace one edge with a midpoint vertex and two half
/// edges. Positions are averaged onto the midpoint; the edge weight is
/// copied onto both halves.
pub struct SplitEdge {
    pub position: AttributeHandle<f64>,
    pub edge_weight: AttributeHandle<f64>,
    pub gate: InvariantCollection<EdgeMesh>,
}

impl SplitEdge {
    pub fn new(position: AttributeHandle<f64>, edge_weight: AttributeHandle<f64>) -> Self {
        Self {
            position,
            edge_weight,
            gate: InvariantCollection::new(),
        }
    }
}

impl Operation<EdgeMesh> for SplitEdge {
    fn kind(&self) -> &str {
        "edge_split"
    }

    fn pre_check(&self, mesh: &EdgeMesh, candidate: ElementHandle) -> bool {
        candidate.dimension() == Dimension::Edge && mesh.is_valid(candidate)
    }

    fn apply(
        &mut self,
        mesh: &mut EdgeMesh,
        attrs: &mut AttributeManager,
        candidate: ElementHandle,
    ) -> Result<Applied, MeshForgeError> {
        let edge_slot = mesh.slot_of(candidate)?;
        let [a, b] = mesh.endpoints_of(edge_slot);
        let pos_a = attrs.store(self.position).try_read(a)?.to_vec();
        let pos_b = attrs.store(self.position).try_read(b)?.to_vec();
        let weight = attrs.store(self.edge_weight).try_read(edge_slot)?.to_vec();

        let mid = mesh.create_primitive(Dimension::Vertex)?;
        let left = mesh.create_primitive(Dimension::Edge)?;
        let right = mesh.create_primitive(Dimension::Edge)?;
        mesh.set_endpoints(left, [a, mid]);
        mesh.set_endpoints(right, [mid, b]);
        mesh.delete_primitive(Dimension::Edge, edge_slot)?;

        attrs.reserve(Dimension::Vertex, mesh.capacity(Dimension::Vertex))?;
        attrs.reserve(Dimension::Edge, mesh.capacity(Dimension::Edge))?;

        let stride = attrs.store(self.position).stride();
        let mid_pos = TransferStrategy::<f64>::Mean.derive(&[&pos_a, &pos_b], stride)?;
        attrs.store_mut(self.position).try_write(mid, &mid_pos)?;
        attrs.store_mut(self.edge_weight).try_write(left, &weight)?;
        attrs.store_mut(self.edge_weight).try_write(right, &weight)?;

        Ok(Applied::Done(EditReceipt {
            created: vec![
                mesh.edge_handle(left),
                mesh.edge_handle(right),
                mesh.vertex_handle(left, 1),
            ],
            modified: Vec::new(),
            removed: vec![candidate],
        }))
    }

    fn invariants(&self) -> &dyn Invariant<EdgeMesh> {
        &self.gate
    }
}

/// Register the standard fixture attributes (vertex position x1, edge
/// weight x1) sized to `mesh`, with positions `slot as f64` and weights
/// `10 + slot as f64`.
pub fn standard_attrs(mesh: &EdgeMesh) -> (AttributeManager, AttributeHandle<f64>, AttributeHandle<f64>) {
    let mut attrs = AttributeManager::new();
    attrs
        .reserve(Dimension::Vertex, mesh.capacity(Dimension::Vertex))
        .unwrap();
    attrs
        .reserve(Dimension::Edge, mesh.capacity(Dimension::Edge))
        .unwrap();
    let position = attrs
        .register::<f64>(Dimension::Vertex, "position", &[0.0])
        .unwrap();
    let weight = attrs
        .register::<f64>(Dimension::Edge, "weight", &[0.0])
        .unwrap();
    for slot in 0..mesh.capacity(Dimension::Vertex) {
        attrs
            .store_mut(position)
            .try_write(slot, &[slot as f64])
            .unwrap();
    }
    for slot in 0..mesh.capacity(Dimension::Edge) {
        attrs
            .store_mut(weight)
            .try_write(slot, &[10.0 + slot as f64])
            .unwrap();
    }
    (attrs, position, weight)
}

/// Dump one store's image for state-equality assertions.
pub fn store_image(attrs: &AttributeManager, handle: AttributeHandle<f64>) -> Vec<Vec<f64>> {
    let store = attrs.store(handle);
    (0..store.len())
        .map(|slot| store.try_read(slot).unwrap().to_vec())
        .collect()
}
