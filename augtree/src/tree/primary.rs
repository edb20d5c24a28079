//! Key-ordered and rank-ordered insertion, duplicate handling via satellite
//! subtrees, successor-chain maintenance, and deletion (spec §4.3).

use std::cmp::Ordering;

use crate::config::LinkMode;
use crate::errors::{TreeError, TreeResult};
use crate::handle::Handle;
use crate::node::Color;

use super::RbTree;

impl<V> RbTree<V> {
    /// A main-tree node may be a valueless anchor (its `link` points at a
    /// satellite subtree holding the actual duplicate group). Every member
    /// of that group shares the same primary key by construction, so any
    /// one of them — here, the satellite root — stands in for comparing
    /// against the group's key.
    fn primary_comparison_value(&self, n: Handle) -> Handle {
        if self.config.link_mode() == LinkMode::Satellite {
            let link = self.slab.link(n);
            if !link.is_nil() {
                return link;
            }
        }
        n
    }

    /// Inserts `value` ordered by the primary comparator. On a collision,
    /// promotes the colliding node to a satellite root (first duplicate) or
    /// recurses into its existing satellite subtree (subsequent
    /// duplicates), per spec §3.2/§4.3.1.
    pub fn insert_by_key(&mut self, value: V) -> TreeResult<Handle> {
        let mut cur = self.root;
        let mut parent = Handle::NIL;
        let mut go_left = false;
        while !cur.is_nil() {
            let repr = self.primary_comparison_value(cur);
            match self.config.compare_primary(&value, self.slab.value_ref(repr)) {
                Ordering::Less => {
                    parent = cur;
                    go_left = true;
                    cur = self.slab.left(cur);
                }
                Ordering::Greater => {
                    parent = cur;
                    go_left = false;
                    cur = self.slab.right(cur);
                }
                Ordering::Equal => return self.insert_duplicate_at(cur, value),
            }
        }
        let candidate = self.slab.allocate(Some(value))?;
        self.attach_leaf(parent, candidate, go_left);
        self.insert_fixup(candidate)?;
        self.propagate_size_up(candidate);
        self.len += 1;
        self.bump_version();
        Ok(candidate)
    }

    fn insert_duplicate_at(&mut self, p: Handle, value: V) -> TreeResult<Handle> {
        if !self.config.allow_duplicates() {
            return Err(TreeError::duplicate_key(
                "value compares equal to an existing entry and duplicates are forbidden",
            ));
        }
        if self.config.link_mode() != LinkMode::Satellite {
            return Err(TreeError::invariant_violated(
                "duplicates require a tree constructed with LinkMode::Satellite",
            ));
        }
        let link = self.slab.link(p);
        if link.is_nil() {
            self.promote_to_satellite(p, value)
        } else {
            self.insert_into_satellite(p, value)
        }
    }

    fn promote_to_satellite(&mut self, p: Handle, value: V) -> TreeResult<Handle> {
        let candidate = self.slab.allocate(Some(value))?;
        let p_left = self.slab.left(p);
        let p_right = self.slab.right(p);
        let p_parent = self.slab.parent(p);
        let p_color = self.slab.color(p);
        let p_size = self.slab.size(p);
        let was_left_child = !p_parent.is_nil() && self.slab.left(p_parent) == p;

        let m = self.slab.allocate(None)?;
        self.slab.set_left(m, p_left);
        if !p_left.is_nil() {
            self.slab.set_parent(p_left, m);
        }
        self.slab.set_right(m, p_right);
        if !p_right.is_nil() {
            self.slab.set_parent(p_right, m);
        }
        self.slab.set_parent(m, p_parent);
        self.slab.set_color(m, p_color);
        self.slab.set_size(m, p_size);

        if p_parent.is_nil() {
            self.root = m;
        } else if was_left_child {
            self.slab.set_left(p_parent, m);
        } else {
            self.slab.set_right(p_parent, m);
        }

        self.slab.set_left(p, Handle::NIL);
        self.slab.set_right(p, Handle::NIL);
        self.slab.set_parent(p, Handle::NIL);
        self.slab.set_color(p, Color::Black);
        self.slab.set_size(p, 1);
        self.slab.set_link(p, Handle::NIL);

        self.slab.set_link(m, p);
        self.anchors.insert(p, m);
        self.duplicate_groups += 1;

        if let Err(e) = self.satellite_insert(p, candidate) {
            return Err(e);
        }

        self.propagate_size_up(m);
        self.len += 1;
        self.bump_version();
        log::debug!("promoted node to a satellite root for a new duplicate group");
        Ok(candidate)
    }

    fn insert_into_satellite(&mut self, anchor: Handle, value: V) -> TreeResult<Handle> {
        let candidate = self.slab.allocate(Some(value))?;
        let sat_root = self.slab.link(anchor);
        self.satellite_insert(sat_root, candidate)?;
        self.propagate_size_up(anchor);
        self.len += 1;
        self.bump_version();
        Ok(candidate)
    }

    /// Inserts `candidate` into the (sub)tree rooted at `sat_root` using
    /// the satellite comparator. Frees `candidate` and fails with
    /// `InvariantViolated` if the comparator cannot distinguish it from an
    /// existing member.
    fn satellite_insert(&mut self, sat_root: Handle, candidate: Handle) -> TreeResult<()> {
        let mut cur = sat_root;
        let mut parent = Handle::NIL;
        let mut go_left = false;
        while !cur.is_nil() {
            match self.compare_satellite_handles(candidate, cur) {
                Ordering::Less => {
                    parent = cur;
                    go_left = true;
                    cur = self.slab.left(cur);
                }
                Ordering::Greater => {
                    parent = cur;
                    go_left = false;
                    cur = self.slab.right(cur);
                }
                Ordering::Equal => {
                    self.slab.free(candidate);
                    return Err(TreeError::invariant_violated(
                        "ambiguous satellite order: satellite comparator returned equal for distinct values",
                    ));
                }
            }
        }
        self.attach_leaf(parent, candidate, go_left);
        self.insert_fixup(candidate)?;
        self.propagate_size_up(candidate);
        Ok(())
    }

    fn compare_satellite_handles(&self, a: Handle, b: Handle) -> Ordering {
        self.config.compare_satellite(self.slab.value_ref(a), self.slab.value_ref(b))
    }

    /// Inserts `value` at zero-based position `pos`, ignoring the primary
    /// comparator entirely. Never creates a satellite subtree; duplicate
    /// positions are always allowed (spec §4.3.2).
    pub fn insert_by_rank(&mut self, pos: u32, value: V) -> TreeResult<Handle> {
        if pos > self.len {
            return Err(TreeError::out_of_range(format!(
                "position {pos} out of range for length {}",
                self.len
            )));
        }
        let candidate = self.slab.allocate(Some(value))?;
        if self.root.is_nil() {
            self.attach_leaf(Handle::NIL, candidate, false);
        } else {
            let mut cur = self.root;
            let mut parent;
            let mut go_left;
            let mut p = pos as i64;
            loop {
                parent = cur;
                let left_size = self.slab.size(self.slab.left(cur)) as i64;
                let c = p - left_size;
                if c <= 0 {
                    go_left = true;
                    let next = self.slab.left(cur);
                    if next.is_nil() {
                        break;
                    }
                    cur = next;
                } else {
                    go_left = false;
                    p = c - 1;
                    let next = self.slab.right(cur);
                    if next.is_nil() {
                        break;
                    }
                    cur = next;
                }
            }
            self.attach_leaf(parent, candidate, go_left);
        }
        self.insert_fixup(candidate)?;
        self.propagate_size_up(candidate);
        self.len += 1;
        self.bump_version();
        Ok(candidate)
    }

    pub fn append(&mut self, value: V) -> TreeResult<Handle> {
        self.insert_by_rank(self.len, value)
    }

    /// Attaches `child` as `parent`'s left or right child (or as the root
    /// of an empty main tree when `parent` is `NIL`), maintaining the
    /// successor chain in successor mode (spec §4.3.3).
    fn attach_leaf(&mut self, parent: Handle, child: Handle, go_left: bool) {
        if parent.is_nil() {
            self.root = child;
            self.slab.set_parent(child, Handle::NIL);
            return;
        }
        if self.config.link_mode() == LinkMode::Successor {
            if go_left {
                let old_pred = self.structural_predecessor(parent);
                self.slab.set_link(child, parent);
                if !old_pred.is_nil() {
                    self.slab.set_link(old_pred, child);
                }
            } else {
                let old_succ = self.slab.link(parent);
                self.slab.set_link(child, old_succ);
                self.slab.set_link(parent, child);
            }
        }
        self.slab.set_parent(child, parent);
        if go_left {
            self.slab.set_left(parent, child);
        } else {
            self.slab.set_right(parent, child);
        }
    }

    /// Finds the handle of a value equal to `value` under the primary
    /// comparator. When duplicates are present this returns the smallest
    /// member of the group under the satellite order — a deliberate
    /// "first-wins" resolution of spec §9's open question about `Contains`
    /// under hash collisions.
    pub fn find_by_key(&self, value: &V) -> Option<Handle> {
        let mut n = self.root;
        while !n.is_nil() {
            let repr = self.primary_comparison_value(n);
            match self.config.compare_primary(value, self.slab.value_ref(repr)) {
                Ordering::Less => n = self.slab.left(n),
                Ordering::Greater => n = self.slab.right(n),
                Ordering::Equal => {
                    let link = self.slab.link(n);
                    if self.config.link_mode() == LinkMode::Satellite && !link.is_nil() {
                        return Some(self.subtree_min(link));
                    }
                    return Some(n);
                }
            }
        }
        None
    }

    pub fn value_at_rank(&self, k: u32) -> TreeResult<&V> {
        if k >= self.len {
            return Err(TreeError::out_of_range(format!(
                "rank {k} out of range for length {}",
                self.len
            )));
        }
        let h = self.handle_of_rank(self.root, k);
        if h.is_nil() {
            return Err(TreeError::invariant_violated("rank lookup returned NIL within range"));
        }
        Ok(self.slab.value_ref(h))
    }

    /// Zero-based in-order rank of `handle`, or `None` if the handle is
    /// stale. Composes a satellite-local rank with the main-tree rank of
    /// the group's anchor when `handle` lives inside a satellite subtree.
    pub fn rank_of(&self, handle: Handle) -> Option<u32> {
        if !self.is_live_value_handle(handle) {
            return None;
        }
        let top = self.current_subtree_root(handle);
        if top == self.root {
            Some(self.local_rank(handle))
        } else {
            self.anchors.get(&top).map(|&anchor| self.local_rank(anchor) + self.local_rank(handle))
        }
    }

    /// Overwrites the value at `handle` in place, preserving its identity.
    /// The caller must guarantee the new value still compares equal to the
    /// old one under the primary comparator — the engine does not re-sort.
    pub fn update_value(&mut self, handle: Handle, new_value: V) -> TreeResult<()> {
        if !self.is_live_value_handle(handle) {
            return Err(TreeError::not_found("handle does not address a live value"));
        }
        self.slab.set_value(handle, new_value);
        self.bump_version();
        Ok(())
    }

    pub fn remove(&mut self, handle: Handle) -> TreeResult<()> {
        self.remove_value(handle).map(|_| ())
    }

    pub fn remove_by_key(&mut self, value: &V) -> bool {
        match self.find_by_key(value) {
            Some(h) => self.remove(h).is_ok(),
            None => false,
        }
    }

    pub fn remove_at_rank(&mut self, k: u32) -> TreeResult<V> {
        if k >= self.len {
            return Err(TreeError::out_of_range(format!(
                "rank {k} out of range for length {}",
                self.len
            )));
        }
        let h = self.handle_of_rank(self.root, k);
        if h.is_nil() {
            return Err(TreeError::invariant_violated("rank lookup returned NIL within range"));
        }
        self.remove_value(h)
    }

    fn remove_value(&mut self, handle: Handle) -> TreeResult<V> {
        if !self.is_live_value_handle(handle) {
            return Err(TreeError::not_found("handle does not address a live value"));
        }
        let top = self.current_subtree_root(handle);
        let anchor = if top == self.root { None } else { self.anchors.get(&top).copied() };

        let value = self.delete_node(handle)?;

        if let Some(m) = anchor {
            let sat_root = self.slab.link(m);
            if self.slab.size(sat_root) == 1 {
                self.collapse_satellite(m, sat_root);
            } else {
                self.propagate_size_up(m);
            }
        }

        self.len -= 1;
        self.bump_version();
        Ok(value)
    }

    /// Replaces a collapsed satellite's anchor `m` with its sole surviving
    /// member `sat_root`, inheriting `m`'s colour, parent, children, and
    /// subtree size, then frees `m` (spec §4.3.4).
    fn collapse_satellite(&mut self, m: Handle, sat_root: Handle) {
        debug_assert_eq!(self.slab.size(sat_root), 1);
        self.anchors.remove(&sat_root);
        let m_parent = self.slab.parent(m);
        let m_color = self.slab.color(m);
        let m_left = self.slab.left(m);
        let m_right = self.slab.right(m);
        let was_left = !m_parent.is_nil() && self.slab.left(m_parent) == m;

        self.slab.set_left(sat_root, m_left);
        if !m_left.is_nil() {
            self.slab.set_parent(m_left, sat_root);
        }
        self.slab.set_right(sat_root, m_right);
        if !m_right.is_nil() {
            self.slab.set_parent(m_right, sat_root);
        }
        self.slab.set_parent(sat_root, m_parent);
        self.slab.set_color(sat_root, m_color);
        self.slab.set_link(sat_root, Handle::NIL);

        if m_parent.is_nil() {
            self.root = sat_root;
        } else if was_left {
            self.slab.set_left(m_parent, sat_root);
        } else {
            self.slab.set_right(m_parent, sat_root);
        }

        self.slab.free(m);
        self.duplicate_groups -= 1;
        self.recompute_size(sat_root);
        self.propagate_size_up(sat_root);
        log::debug!("collapsed a satellite subtree back into the main tree");
    }

    /// Canonical CLRS RB-delete, generalised via `transplant`/
    /// `replace_subtree_root` so it applies equally within a satellite
    /// subtree. Maintains "handle identity follows value": the handle the
    /// caller passed in is the one freed; the structural successor that
    /// gets spliced into its place keeps its own handle throughout.
    fn delete_node(&mut self, z: Handle) -> TreeResult<V> {
        let chain_relink = if self.config.link_mode() == LinkMode::Successor {
            Some((self.structural_predecessor(z), self.slab.link(z)))
        } else {
            None
        };

        let mut y_original_color = self.slab.color(z);
        let x;
        let x_parent;

        if self.slab.left(z).is_nil() {
            x = self.slab.right(z);
            x_parent = self.slab.parent(z);
            self.transplant(z, x);
        } else if self.slab.right(z).is_nil() {
            x = self.slab.left(z);
            x_parent = self.slab.parent(z);
            self.transplant(z, x);
        } else {
            let y = self.subtree_min(self.slab.right(z));
            y_original_color = self.slab.color(y);
            x = self.slab.right(y);
            if self.slab.parent(y) == z {
                x_parent = y;
                self.slab.set_parent(x, y);
            } else {
                x_parent = self.slab.parent(y);
                self.transplant(y, self.slab.right(y));
                self.slab.set_right(y, self.slab.right(z));
                self.slab.set_parent(self.slab.right(y), y);
            }
            self.transplant(z, y);
            self.slab.set_left(y, self.slab.left(z));
            self.slab.set_parent(self.slab.left(y), y);
            self.slab.set_color(y, self.slab.color(z));
        }

        if let Some((pred, succ)) = chain_relink {
            if !pred.is_nil() {
                self.slab.set_link(pred, succ);
            }
        }

        if y_original_color == Color::Black {
            self.delete_fixup(x, x_parent)?;
        }

        let refresh_from = if x_parent.is_nil() { self.current_subtree_root(x) } else { x_parent };
        self.propagate_size_up(refresh_from);

        let value = self.slab.take_value(z);
        self.slab.free(z);
        Ok(value)
    }
}
