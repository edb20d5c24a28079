use augtree::{ErrorKind, LinkMode, RbTree, TreeConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[ctor::ctor]
fn init() {
    colog::init();
}

fn successor_tree() -> RbTree<i32> {
    let cfg: TreeConfig<i32> = TreeConfig::new(LinkMode::Successor, |a, b| a.cmp(b));
    RbTree::new(cfg)
}

/// Ordered append-only: inserting 0..n by key should read back in sorted
/// order at every rank, and the tree's own invariants must hold throughout.
#[test]
fn ordered_append_only() {
    let mut tree = successor_tree();
    for v in 0..2_000 {
        tree.insert_by_key(v).unwrap();
    }
    tree.checked_invariants().unwrap();
    for k in 0..2_000u32 {
        assert_eq!(*tree.value_at_rank(k).unwrap(), k as i32);
    }
    let collected: Vec<i32> = tree.iter().map(|r| *r.unwrap()).collect();
    assert_eq!(collected, (0..2_000).collect::<Vec<_>>());
}

/// Random insert and delete against a fixed seed: a reference `Vec` is kept
/// in lockstep and every rank must agree with it after every mutation.
#[test]
fn random_insert_and_delete_matches_reference() {
    let mut rng = StdRng::seed_from_u64(0xA55E55ED);
    let mut tree = successor_tree();
    let mut reference: Vec<i32> = Vec::new();
    let mut handles = Vec::new();

    for _ in 0..5_000 {
        if reference.is_empty() || rng.gen_bool(0.65) {
            let v: i32 = rng.gen_range(0..10_000);
            if reference.contains(&v) {
                continue;
            }
            let h = tree.insert_by_key(v).unwrap();
            let pos = reference.partition_point(|&x| x < v);
            reference.insert(pos, v);
            handles.push(h);
        } else {
            let idx = rng.gen_range(0..handles.len());
            let h = handles.swap_remove(idx);
            let rank = tree.rank_of(h).unwrap();
            tree.remove(h).unwrap();
            reference.remove(rank as usize);
        }
    }

    tree.checked_invariants().unwrap();
    assert_eq!(tree.len(), reference.len());
    for (k, &expected) in reference.iter().enumerate() {
        assert_eq!(*tree.value_at_rank(k as u32).unwrap(), expected);
    }
}

/// Duplicate group: repeated keys land in a satellite subtree ordered by
/// the satellite comparator, and removing every member collapses the group
/// back into an ordinary node.
#[test]
fn duplicate_group_promotes_and_collapses() {
    let cfg: TreeConfig<(i32, i32)> = TreeConfig::new(LinkMode::Satellite, |a: &(i32, i32), b: &(i32, i32)| {
        a.0.cmp(&b.0)
    })
    .with_duplicates(true)
    .with_satellite_comparator(|a: &(i32, i32), b: &(i32, i32)| a.1.cmp(&b.1));
    let mut tree = RbTree::new(cfg);

    tree.insert_by_key((1, 0)).unwrap();
    tree.insert_by_key((2, 0)).unwrap();
    let dup_a = tree.insert_by_key((1, 2)).unwrap();
    let dup_b = tree.insert_by_key((1, 1)).unwrap();
    tree.checked_invariants().unwrap();

    assert_eq!(tree.len(), 4);
    assert_eq!(*tree.value_at_rank(0).unwrap(), (1, 0));
    assert_eq!(*tree.value_at_rank(1).unwrap(), (1, 1));
    assert_eq!(*tree.value_at_rank(2).unwrap(), (1, 2));
    assert_eq!(*tree.value_at_rank(3).unwrap(), (2, 0));

    tree.remove(dup_b).unwrap();
    tree.checked_invariants().unwrap();
    assert_eq!(tree.len(), 3);

    tree.remove(dup_a).unwrap();
    tree.checked_invariants().unwrap();
    assert_eq!(tree.len(), 2);
    // the group has collapsed back to a single ordinary node
    assert_eq!(*tree.value_at_rank(0).unwrap(), (1, 0));
}

/// Adjacent duplicate groups: iterating across the boundary between two
/// back-to-back satellite subtrees must dive into the second group's
/// anchor rather than yielding it as a bare (valueless) handle.
#[test]
fn iteration_crosses_adjacent_duplicate_groups() {
    let cfg: TreeConfig<(i32, i32)> = TreeConfig::new(LinkMode::Satellite, |a: &(i32, i32), b: &(i32, i32)| {
        a.0.cmp(&b.0)
    })
    .with_duplicates(true)
    .with_satellite_comparator(|a: &(i32, i32), b: &(i32, i32)| a.1.cmp(&b.1));
    let mut tree = RbTree::new(cfg);

    for v in [(1, 0), (1, 1), (2, 0), (2, 1), (3, 0)] {
        tree.insert_by_key(v).unwrap();
    }
    tree.checked_invariants().unwrap();

    let collected: Vec<(i32, i32)> = tree.iter().map(|r| *r.unwrap()).collect();
    assert_eq!(collected, vec![(1, 0), (1, 1), (2, 0), (2, 1), (3, 0)]);

    let from_rank: Vec<(i32, i32)> = tree.iter_from_rank(2).unwrap().map(|r| *r.unwrap()).collect();
    assert_eq!(from_rank, vec![(2, 0), (2, 1), (3, 0)]);
}

/// Positional list: rank-based insert/remove with no regard to key order,
/// exercised as a plain order-statistics list.
#[test]
fn positional_list_behaves_like_a_vec() {
    let mut tree = successor_tree();
    let mut reference: Vec<i32> = Vec::new();
    let mut rng = StdRng::seed_from_u64(7);

    for i in 0..1_000 {
        let pos = rng.gen_range(0..=reference.len()) as u32;
        tree.insert_by_rank(pos, i).unwrap();
        reference.insert(pos as usize, i);
    }
    tree.checked_invariants().unwrap();
    for (k, &expected) in reference.iter().enumerate() {
        assert_eq!(*tree.value_at_rank(k as u32).unwrap(), expected);
    }

    while !reference.is_empty() {
        let pos = rng.gen_range(0..reference.len()) as u32;
        let removed = tree.remove_at_rank(pos).unwrap();
        let expected = reference.remove(pos as usize);
        assert_eq!(removed, expected);
    }
    assert!(tree.is_empty());
}

/// Iterator invalidation: a structural mutation after an iterator is
/// created must surface as `ConcurrentMutation` on the very next `next()`
/// call, rather than reading through a stale handle.
#[test]
fn iterator_invalidated_by_concurrent_mutation() {
    let mut tree = successor_tree();
    for v in 0..10 {
        tree.insert_by_key(v).unwrap();
    }
    let mut it = tree.iter();
    assert_eq!(*it.next().unwrap().unwrap(), 0);

    tree.insert_by_key(100).unwrap();

    match it.next() {
        Some(Err(e)) => assert_eq!(e.kind(), &ErrorKind::ConcurrentMutation),
        other => panic!("expected ConcurrentMutation, got {other:?}"),
    }
}

/// A satellite comparator that reports `Equal` for genuinely distinct
/// values is a contract violation, and must fail the triggering insert
/// with `InvariantViolated` rather than silently merging them.
#[test]
fn bad_satellite_comparator_is_rejected() {
    let cfg: TreeConfig<(i32, i32)> = TreeConfig::new(LinkMode::Satellite, |a: &(i32, i32), b: &(i32, i32)| {
        a.0.cmp(&b.0)
    })
    .with_duplicates(true)
    .with_satellite_comparator(|_: &(i32, i32), _: &(i32, i32)| std::cmp::Ordering::Equal);
    let mut tree = RbTree::new(cfg);

    tree.insert_by_key((1, 0)).unwrap();
    let err = tree.insert_by_key((1, 1)).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::InvariantViolated);
    assert_eq!(tree.len(), 1);
}
