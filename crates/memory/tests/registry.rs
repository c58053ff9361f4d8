//! Registry ownership rules: unique ids, lookup, delete-while-shared

use strata_memory::{NumaNode, PoolRegistry};

#[test]
fn ids_are_unique_and_never_reused() {
    let mut registry = PoolRegistry::new();
    let a = registry.create_pool(4096, NumaNode(0));
    let b = registry.create_pool(4096, NumaNode(0));
    assert_ne!(a, b);

    registry.delete_pool(a);
    let c = registry.create_pool(4096, NumaNode(0));
    assert_ne!(c, a, "deleted id must not be reissued");
    assert_ne!(c, b);

    registry.delete_pool(b);
    registry.delete_pool(c);
}

#[test]
fn exists_tracks_lifecycle() {
    let mut registry = PoolRegistry::new();
    let id = registry.create_pool(4096, NumaNode(0));
    assert!(registry.exists(id));
    assert_eq!(registry.len(), 1);

    registry.delete_pool(id);
    assert!(!registry.exists(id));
    assert!(registry.is_empty());
}

#[test]
fn get_returns_shared_handle() {
    let mut registry = PoolRegistry::new();
    let id = registry.create_pool(4096, NumaNode(0));

    let one = registry.get_pool(id);
    let two = registry.get_pool(id);
    assert_eq!(one.start_address(), two.start_address());

    drop(one);
    drop(two);
    registry.delete_pool(id);
}

#[test]
#[should_panic(expected = "not found")]
fn get_unknown_pool_is_fatal() {
    let mut registry = PoolRegistry::new();
    let id = registry.create_pool(4096, NumaNode(0));
    registry.delete_pool(id);
    let _ = registry.get_pool(id);
}

#[test]
#[should_panic(expected = "still shared")]
fn delete_while_shared_is_fatal() {
    let mut registry = PoolRegistry::new();
    let id = registry.create_pool(4096, NumaNode(0));
    let _held = registry.get_pool(id);
    registry.delete_pool(id);
}

#[test]
fn delete_succeeds_once_handles_are_released() {
    let mut registry = PoolRegistry::new();
    let id = registry.create_pool(4096, NumaNode(0));
    let held = registry.get_pool(id);
    drop(held);
    registry.delete_pool(id);
    assert!(!registry.exists(id));
}
