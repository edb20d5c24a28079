//! The augmented red-black tree: core rotations/fixups, key- and
//! rank-based primary-tree policies, and in-order traversal, layered over
//! the slab allocator.

mod core;
mod invariants;
mod primary;
mod traversal;

pub use traversal::Iter;

use std::collections::HashMap;

use crate::config::{LinkMode, TreeConfig};
use crate::errors::{TreeError, TreeResult};
use crate::handle::Handle;
use crate::slab::Slab;

/// An order-statistic red-black tree: ordered lookup by key, indexed lookup
/// by rank, O(log n) positional insert/remove, and logical duplicates via
/// nested satellite subtrees, backed by a slab-allocated node arena.
pub struct RbTree<V> {
    slab: Slab<V>,
    root: Handle,
    len: u32,
    version: u32,
    config: TreeConfig<V>,
    /// Reverse index from a satellite subtree's current root to the
    /// main-tree anchor (placeholder) whose `link` points at it. Needed
    /// because a satellite root's own `parent` is always `NIL` (spec §3
    /// invariant 3) and therefore cannot itself carry a back-pointer.
    anchors: HashMap<Handle, Handle>,
    duplicate_groups: u32,
}

impl<V> RbTree<V> {
    /// Builds an empty tree from the given configuration.
    pub fn new(config: TreeConfig<V>) -> Self {
        RbTree {
            slab: Slab::new(),
            root: Handle::NIL,
            len: 0,
            version: 0,
            config,
            anchors: HashMap::new(),
            duplicate_groups: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn link_mode(&self) -> LinkMode {
        self.config.link_mode()
    }

    pub fn allow_duplicates(&self) -> bool {
        self.config.allow_duplicates()
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Tightens or relaxes the duplicates policy. Forbidding duplicates
    /// (`false`) while a duplicate group still exists is rejected, per
    /// spec §6; relaxing (`true`) is always accepted. Rejection is an
    /// ordinary caller-fault precondition failure: the tree is left
    /// completely valid and usable, so this uses `DuplicateKey` rather
    /// than a tree-tainting kind.
    pub fn set_allow_duplicates(&mut self, allow: bool) -> TreeResult<()> {
        if !allow && self.config.allow_duplicates && self.duplicate_groups > 0 {
            return Err(TreeError::duplicate_key(
                "cannot forbid duplicates while a duplicate group still exists",
            ));
        }
        self.config.allow_duplicates = allow;
        Ok(())
    }

    /// Drops every node and releases every slab page the tree owns.
    pub fn clear(&mut self) {
        self.slab = Slab::new();
        self.root = Handle::NIL;
        self.len = 0;
        self.anchors.clear();
        self.duplicate_groups = 0;
        self.bump_version();
        log::debug!("tree cleared");
    }

    pub(crate) fn bump_version(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    pub(crate) fn is_live_value_handle(&self, handle: Handle) -> bool {
        !handle.is_nil() && self.slab.is_allocated(handle) && !self.slab.value_is_none(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_tree_is_empty() {
        let cfg: TreeConfig<i32> = TreeConfig::new(LinkMode::Successor, |a, b| a.cmp(b));
        let tree = RbTree::new(cfg);
        assert_eq!(tree.len(), 0);
        assert!(tree.is_empty());
        assert_eq!(tree.version(), 0);
    }
}
