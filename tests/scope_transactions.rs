//! Manager-level transaction semantics: rollback, commit, nesting, and
//! the buffered write path.

mod common;

use common::EdgeMesh;
use mesh_forge::attr::AttributeManager;
use mesh_forge::forge_error::MeshForgeError;
use mesh_forge::topology::Dimension;

fn tag_manager() -> (AttributeManager, mesh_forge::attr::AttributeHandle<u8>) {
    let mut attrs = AttributeManager::new();
    attrs.reserve(Dimension::Vertex, 16).unwrap();
    let tag = attrs.register::<u8>(Dimension::Vertex, "tag", &[0]).unwrap();
    (attrs, tag)
}

#[test]
fn rollback_restores_both_slots() {
    // Scenario A: slot 5 = "X" (was "A"), slot 7 = "Y" (was "B"),
    // rollback -> "A", "B".
    let (mut attrs, tag) = tag_manager();
    attrs.store_mut(tag).try_write(5, b"A").unwrap();
    attrs.store_mut(tag).try_write(7, b"B").unwrap();

    attrs.open_scope();
    attrs.store_mut(tag).try_write(5, b"X").unwrap();
    attrs.store_mut(tag).try_write(7, b"Y").unwrap();
    attrs.rollback().unwrap();

    assert_eq!(attrs.store(tag).try_read(5).unwrap(), b"A");
    assert_eq!(attrs.store(tag).try_read(7).unwrap(), b"B");
}

#[test]
fn commit_keeps_both_slots() {
    // Scenario B: same writes, commit -> "X", "Y".
    let (mut attrs, tag) = tag_manager();
    attrs.store_mut(tag).try_write(5, b"A").unwrap();
    attrs.store_mut(tag).try_write(7, b"B").unwrap();

    attrs.open_scope();
    attrs.store_mut(tag).try_write(5, b"X").unwrap();
    attrs.store_mut(tag).try_write(7, b"Y").unwrap();
    attrs.commit().unwrap();

    assert_eq!(attrs.store(tag).try_read(5).unwrap(), b"X");
    assert_eq!(attrs.store(tag).try_read(7).unwrap(), b"Y");
}

#[test]
fn rollback_of_popped_scope_has_no_further_effect() {
    let (mut attrs, tag) = tag_manager();
    attrs.open_scope();
    attrs.store_mut(tag).try_write(0, b"Z").unwrap();
    attrs.rollback().unwrap();
    let after_first = attrs.store(tag).try_read(0).unwrap().to_vec();
    assert!(matches!(
        attrs.rollback(),
        Err(MeshForgeError::ScopeUnderflow)
    ));
    assert_eq!(attrs.store(tag).try_read(0).unwrap(), &after_first[..]);
}

#[test]
fn nested_rollback_never_touches_outer_snapshots() {
    // Nested isolation: rolling back depth d leaves depth d-1 snapshots
    // intact, at several depths.
    let (mut attrs, tag) = tag_manager();
    attrs.store_mut(tag).try_write(3, &[1]).unwrap();

    attrs.open_scope(); // depth 1
    attrs.store_mut(tag).try_write(3, &[2]).unwrap();
    attrs.open_scope(); // depth 2
    attrs.store_mut(tag).try_write(3, &[3]).unwrap();
    attrs.open_scope(); // depth 3
    attrs.store_mut(tag).try_write(3, &[4]).unwrap();

    attrs.rollback().unwrap();
    assert_eq!(attrs.store(tag).try_read(3).unwrap(), &[3]);
    attrs.rollback().unwrap();
    assert_eq!(attrs.store(tag).try_read(3).unwrap(), &[2]);
    attrs.rollback().unwrap();
    assert_eq!(attrs.store(tag).try_read(3).unwrap(), &[1]);
}

#[test]
fn commit_is_transparent_to_the_parent() {
    // Commit transparency: committing a scope yields the same store
    // contents as performing the writes directly in the parent.
    let (mut attrs, tag) = tag_manager();
    let (mut direct, direct_tag) = tag_manager();

    attrs.open_scope();
    attrs.open_scope();
    attrs.store_mut(tag).try_write(1, &[11]).unwrap();
    attrs.store_mut(tag).try_write(2, &[22]).unwrap();
    attrs.commit().unwrap();

    direct.open_scope();
    direct.store_mut(direct_tag).try_write(1, &[11]).unwrap();
    direct.store_mut(direct_tag).try_write(2, &[22]).unwrap();

    for slot in 0..16 {
        assert_eq!(
            attrs.store(tag).try_read(slot).unwrap(),
            direct.store(direct_tag).try_read(slot).unwrap()
        );
    }

    // and the surviving outer scopes behave identically under rollback
    attrs.rollback().unwrap();
    direct.rollback().unwrap();
    for slot in 0..16 {
        assert_eq!(
            attrs.store(tag).try_read(slot).unwrap(),
            direct.store(direct_tag).try_read(slot).unwrap()
        );
    }
}

#[test]
fn inner_commit_outer_rollback_restores_pre_outer_values() {
    let (mut attrs, tag) = tag_manager();
    attrs.store_mut(tag).try_write(9, &[90]).unwrap();
    attrs.open_scope();
    attrs.open_scope();
    attrs.store_mut(tag).try_write(9, &[91]).unwrap();
    attrs.commit().unwrap();
    attrs.rollback().unwrap();
    assert_eq!(attrs.store(tag).try_read(9).unwrap(), &[90]);
}

#[test]
fn scope_spans_every_store_of_every_type() {
    let mesh = EdgeMesh::chain(3);
    let (mut attrs, position, weight) = common::standard_attrs(&mesh);
    let count = attrs
        .register::<i64>(Dimension::Edge, "visits", &[0])
        .unwrap();

    attrs.open_scope();
    attrs.store_mut(position).try_write(0, &[0.5]).unwrap();
    attrs.store_mut(weight).try_write(1, &[99.0]).unwrap();
    attrs.store_mut(count).try_write(1, &[7]).unwrap();
    attrs.rollback().unwrap();

    assert_eq!(attrs.store(position).try_read(0).unwrap(), &[0.0]);
    assert_eq!(attrs.store(weight).try_read(1).unwrap(), &[11.0]);
    assert_eq!(attrs.store(count).try_read(1).unwrap(), &[0]);
}

#[test]
fn buffered_accessor_snapshots_once_per_slot() {
    let mesh = EdgeMesh::chain(2);
    let (mut attrs, position, _) = common::standard_attrs(&mesh);
    let handle = mesh.vertex_handle(0, 0); // vertex slot 0

    attrs.open_scope();
    {
        let mut buffered = attrs.buffered_accessor(position);
        for step in 1..=100 {
            buffered.set(&mesh, handle, &[step as f64]).unwrap();
        }
        assert_eq!(buffered.pending(), 1);
        buffered.flush().unwrap();
    }
    assert_eq!(attrs.store(position).try_read(0).unwrap(), &[100.0]);
    attrs.rollback().unwrap();
    assert_eq!(attrs.store(position).try_read(0).unwrap(), &[0.0]);
}

#[test]
fn consolidation_with_open_scope_stays_consistent() {
    let (mut attrs, tag) = tag_manager();
    for slot in 0..16 {
        attrs.store_mut(tag).try_write(slot, &[slot as u8]).unwrap();
    }
    attrs.mark_dead(Dimension::Vertex, 0).unwrap();
    attrs.open_scope();
    attrs.store_mut(tag).try_write(8, &[200]).unwrap();
    let remap = attrs.consolidate(Dimension::Vertex).unwrap();
    let new_slot = remap.lookup(8).unwrap();
    assert_eq!(attrs.store(tag).try_read(new_slot).unwrap(), &[200]);
    attrs.rollback().unwrap();
    assert_eq!(attrs.store(tag).try_read(new_slot).unwrap(), &[8]);
}
