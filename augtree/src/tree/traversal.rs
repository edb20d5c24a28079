//! In-order iteration, with fail-fast detection of concurrent mutation
//! (spec §4.4).

use crate::config::LinkMode;
use crate::errors::{TreeError, TreeResult};
use crate::handle::Handle;

use super::RbTree;

impl<V> RbTree<V> {
    pub fn iter(&self) -> Iter<'_, V> {
        if self.len == 0 {
            return Iter {
                tree: self,
                next: Handle::NIL,
                version: self.version,
                remaining: 0,
                satellite_anchor: None,
            };
        }
        let (start, anchor) = self.handle_and_anchor_of_rank(self.root, 0, None);
        Iter {
            tree: self,
            next: start,
            version: self.version,
            remaining: self.len,
            satellite_anchor: anchor,
        }
    }

    /// Starts iteration from the element currently at rank `k`.
    pub fn iter_from_rank(&self, k: u32) -> TreeResult<Iter<'_, V>> {
        if k > self.len {
            return Err(TreeError::out_of_range(format!(
                "rank {k} out of range for length {}",
                self.len
            )));
        }
        if k == self.len {
            return Ok(Iter {
                tree: self,
                next: Handle::NIL,
                version: self.version,
                remaining: 0,
                satellite_anchor: None,
            });
        }
        let (handle, anchor) = self.handle_and_anchor_of_rank(self.root, k, None);
        Ok(Iter {
            tree: self,
            next: handle,
            version: self.version,
            remaining: self.len - k,
            satellite_anchor: anchor,
        })
    }

    /// Collects up to `count` values starting at rank `start`, stopping
    /// early if the tree is exhausted.
    pub fn range_by_index(&self, start: u32, count: u32) -> TreeResult<Vec<&V>> {
        let mut it = self.iter_from_rank(start)?;
        let mut out = Vec::with_capacity(count.min(self.len.saturating_sub(start)) as usize);
        for _ in 0..count {
            match it.next() {
                Some(Ok(v)) => out.push(v),
                Some(Err(e)) => return Err(e),
                None => break,
            }
        }
        Ok(out)
    }
}

/// Snapshot-versioned in-order iterator. Any structural mutation on the
/// source tree after the iterator is created causes the next `next()` call
/// to return `Err(ConcurrentMutation)` instead of silently reading through
/// stale or reused handles.
pub struct Iter<'a, V> {
    tree: &'a RbTree<V>,
    next: Handle,
    version: u32,
    remaining: u32,
    /// Set while stepping through a satellite subtree, so the iterator
    /// knows to step back out into the main tree via the anchor once the
    /// subtree is exhausted.
    satellite_anchor: Option<Handle>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = TreeResult<&'a V>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        if self.tree.version != self.version {
            self.remaining = 0;
            return Some(Err(TreeError::concurrent_mutation(
                "tree was mutated while an iterator over it was live",
            )));
        }
        let current = self.next;
        if current.is_nil() {
            self.remaining = 0;
            return Some(Err(TreeError::invariant_violated(
                "iterator ran out of handles before its remaining count reached zero",
            )));
        }
        self.remaining -= 1;
        self.advance();
        Some(Ok(self.tree.slab_value(current)))
    }
}

impl<'a, V> Iter<'a, V> {
    fn advance(&mut self) {
        if self.remaining == 0 {
            self.next = Handle::NIL;
            return;
        }
        let current = self.next;
        if self.tree.link_mode() == LinkMode::Successor {
            self.next = self.tree.slab.link(current);
            return;
        }
        // Satellite mode: step structurally, diving into a duplicate
        // group's satellite subtree when we land back on its anchor, and
        // popping back out via the anchor's own successor once a satellite
        // subtree is exhausted.
        let landed = if let Some(anchor) = self.satellite_anchor {
            let succ = self.tree.structural_successor(current);
            if succ.is_nil() {
                self.satellite_anchor = None;
                self.tree.structural_successor(anchor)
            } else {
                succ
            }
        } else {
            self.tree.structural_successor(current)
        };
        // The node just landed on may itself be the anchor of an adjacent
        // duplicate group (e.g. keys `1,1,2,2`), so always re-check rather
        // than only on the "wasn't already inside a satellite" path.
        if self.tree.is_anchor(landed) {
            self.satellite_anchor = Some(landed);
            self.next = self.tree.subtree_min(self.tree.slab.link(landed));
        } else {
            self.next = landed;
        }
    }
}

impl<V> RbTree<V> {
    fn slab_value(&self, h: Handle) -> &V {
        self.slab.value_ref(h)
    }

    fn is_anchor(&self, h: Handle) -> bool {
        !h.is_nil() && self.link_mode() == LinkMode::Satellite && self.slab.value_is_none(h)
    }
}
