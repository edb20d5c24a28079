//! Rotations, fixups, and the structural primitives shared by the main
//! tree and every satellite subtree (spec §4.2).

use crate::config::LinkMode;
use crate::errors::{TreeError, TreeResult};
use crate::handle::Handle;
use crate::node::Color;

use super::RbTree;

impl<V> RbTree<V> {
    /// `size(n) = size(left) + size(right) + contribution(n)`, spec §3 rule 2.
    pub(super) fn recompute_size(&mut self, n: Handle) {
        if n.is_nil() {
            return;
        }
        let l = self.slab.size(self.slab.left(n));
        let r = self.slab.size(self.slab.right(n));
        let c = self.node_contribution(n);
        self.slab.set_size(n, l + r + c);
    }

    /// What `n` itself contributes to its parent's size: the satellite
    /// subtree's size if `n` is a main-tree anchor in satellite mode, else
    /// one (an ordinary node, or any node living inside a satellite
    /// subtree, which never nests further duplication).
    pub(super) fn node_contribution(&self, n: Handle) -> u32 {
        if self.config.link_mode() == LinkMode::Satellite {
            let link = self.slab.link(n);
            if !link.is_nil() {
                return self.slab.size(link);
            }
        }
        1
    }

    /// Walks from `hint` up to whichever (sub)tree root it belongs to: the
    /// main root, or a satellite root (whose `parent` is always `NIL`).
    pub(super) fn current_subtree_root(&self, mut hint: Handle) -> Handle {
        while !hint.is_nil() && !self.slab.parent(hint).is_nil() {
            hint = self.slab.parent(hint);
        }
        hint
    }

    /// Repoints whichever root-level reference used to name `old` (the
    /// tree's own `root` field, or a satellite anchor's `link`) at `new`.
    /// Used by both rotations and delete's transplant, so that a pivot or
    /// splice at the top of a satellite subtree is handled exactly like one
    /// at the top of the main tree.
    pub(super) fn replace_subtree_root(&mut self, old: Handle, new: Handle) {
        if old == self.root {
            self.root = new;
        } else if let Some(anchor) = self.anchors.remove(&old) {
            self.slab.set_link(anchor, new);
            if !new.is_nil() {
                self.anchors.insert(new, anchor);
            }
        } else {
            log::warn!("replace_subtree_root called on a handle with no tracked root identity");
        }
    }

    pub(super) fn transplant(&mut self, u: Handle, v: Handle) {
        let u_parent = self.slab.parent(u);
        if u_parent.is_nil() {
            self.replace_subtree_root(u, v);
        } else if self.slab.left(u_parent) == u {
            self.slab.set_left(u_parent, v);
        } else {
            self.slab.set_right(u_parent, v);
        }
        self.slab.set_parent(v, u_parent);
    }

    pub(super) fn rotate_left(&mut self, x: Handle) {
        let y = self.slab.right(x);
        debug_assert!(!y.is_nil(), "rotate_left requires a non-sentinel right child");
        let y_left = self.slab.left(y);
        self.slab.set_right(x, y_left);
        if !y_left.is_nil() {
            self.slab.set_parent(y_left, x);
        }
        let x_parent = self.slab.parent(x);
        if x_parent.is_nil() {
            self.replace_subtree_root(x, y);
        } else if self.slab.left(x_parent) == x {
            self.slab.set_left(x_parent, y);
        } else {
            self.slab.set_right(x_parent, y);
        }
        self.slab.set_parent(y, x_parent);
        self.slab.set_left(y, x);
        self.slab.set_parent(x, y);
        self.recompute_size(x);
        self.recompute_size(y);
        log::trace!("rotate_left pivot={x:?}");
    }

    pub(super) fn rotate_right(&mut self, x: Handle) {
        let y = self.slab.left(x);
        debug_assert!(!y.is_nil(), "rotate_right requires a non-sentinel left child");
        let y_right = self.slab.right(y);
        self.slab.set_left(x, y_right);
        if !y_right.is_nil() {
            self.slab.set_parent(y_right, x);
        }
        let x_parent = self.slab.parent(x);
        if x_parent.is_nil() {
            self.replace_subtree_root(x, y);
        } else if self.slab.right(x_parent) == x {
            self.slab.set_right(x_parent, y);
        } else {
            self.slab.set_left(x_parent, y);
        }
        self.slab.set_parent(y, x_parent);
        self.slab.set_right(y, x);
        self.slab.set_parent(x, y);
        self.recompute_size(x);
        self.recompute_size(y);
        log::trace!("rotate_right pivot={x:?}");
    }

    pub(super) fn subtree_min(&self, mut n: Handle) -> Handle {
        if n.is_nil() {
            return Handle::NIL;
        }
        while !self.slab.left(n).is_nil() {
            n = self.slab.left(n);
        }
        n
    }

    pub(super) fn subtree_max(&self, mut n: Handle) -> Handle {
        if n.is_nil() {
            return Handle::NIL;
        }
        while !self.slab.right(n).is_nil() {
            n = self.slab.right(n);
        }
        n
    }

    /// Classical structural successor, using only `left`/`right`/`parent` —
    /// valid both in the main tree and inside a satellite subtree, since it
    /// stops the moment it reaches a `NIL` parent.
    pub(super) fn structural_successor(&self, n: Handle) -> Handle {
        if n.is_nil() {
            return Handle::NIL;
        }
        if !self.slab.right(n).is_nil() {
            return self.subtree_min(self.slab.right(n));
        }
        let mut x = n;
        let mut p = self.slab.parent(x);
        while !p.is_nil() && x == self.slab.right(p) {
            x = p;
            p = self.slab.parent(p);
        }
        p
    }

    pub(super) fn structural_predecessor(&self, n: Handle) -> Handle {
        if n.is_nil() {
            return Handle::NIL;
        }
        if !self.slab.left(n).is_nil() {
            return self.subtree_max(self.slab.left(n));
        }
        let mut x = n;
        let mut p = self.slab.parent(x);
        while !p.is_nil() && x == self.slab.left(p) {
            x = p;
            p = self.slab.parent(p);
        }
        p
    }

    /// Recomputes `size` from `h` up to the top of whichever (sub)tree it
    /// belongs to (main tree or satellite). Does *not* cross from a
    /// satellite subtree back into the main tree — the caller is
    /// responsible for refreshing the anchor afterward (see
    /// `tree::primary`).
    pub(super) fn propagate_size_up(&mut self, mut h: Handle) {
        while !h.is_nil() {
            self.recompute_size(h);
            h = self.slab.parent(h);
        }
    }

    /// Canonical CLRS insert-fixup, generalised to operate on whichever
    /// (sub)tree `z` lives in: forcing the root black at the end forces
    /// *that* (sub)tree's root, found by walking up from `z`.
    pub(super) fn insert_fixup(&mut self, mut z: Handle) -> TreeResult<()> {
        while self.slab.color(self.slab.parent(z)) == Color::Red {
            let p = self.slab.parent(z);
            let g = self.slab.parent(p);
            if g.is_nil() {
                return Err(TreeError::invariant_violated(
                    "insert fixup found a red node with no grandparent",
                ));
            }
            if p == self.slab.left(g) {
                let u = self.slab.right(g);
                if self.slab.color(u) == Color::Red {
                    self.slab.set_color(p, Color::Black);
                    self.slab.set_color(u, Color::Black);
                    self.slab.set_color(g, Color::Red);
                    z = g;
                } else {
                    let mut z = z;
                    if z == self.slab.right(p) {
                        z = p;
                        self.rotate_left(z);
                    }
                    let p = self.slab.parent(z);
                    let g = self.slab.parent(p);
                    self.slab.set_color(p, Color::Black);
                    self.slab.set_color(g, Color::Red);
                    self.rotate_right(g);
                    break;
                }
            } else {
                let u = self.slab.left(g);
                if self.slab.color(u) == Color::Red {
                    self.slab.set_color(p, Color::Black);
                    self.slab.set_color(u, Color::Black);
                    self.slab.set_color(g, Color::Red);
                    z = g;
                } else {
                    let mut z = z;
                    if z == self.slab.left(p) {
                        z = p;
                        self.rotate_right(z);
                    }
                    let p = self.slab.parent(z);
                    let g = self.slab.parent(p);
                    self.slab.set_color(p, Color::Black);
                    self.slab.set_color(g, Color::Red);
                    self.rotate_left(g);
                    break;
                }
            }
        }
        let top = self.current_subtree_root(z);
        self.slab.set_color(top, Color::Black);
        Ok(())
    }

    /// Canonical CLRS delete-fixup. `x` may be the sentinel; `x_parent` is
    /// passed explicitly since a sentinel's own `parent` reads back as
    /// `NIL` and would otherwise make the loop's termination ambiguous
    /// between "at the root" and "structurally detached".
    pub(super) fn delete_fixup(&mut self, mut x: Handle, mut x_parent: Handle) -> TreeResult<()> {
        while !x_parent.is_nil() && self.slab.color(x) == Color::Black {
            if x == self.slab.left(x_parent) {
                let mut w = self.slab.right(x_parent);
                if w.is_nil() {
                    return Err(TreeError::invariant_violated(
                        "delete fixup expected a sibling but found the sentinel",
                    ));
                }
                if self.slab.color(w) == Color::Red {
                    self.slab.set_color(w, Color::Black);
                    self.slab.set_color(x_parent, Color::Red);
                    self.rotate_left(x_parent);
                    w = self.slab.right(x_parent);
                }
                if self.slab.color(self.slab.left(w)) == Color::Black
                    && self.slab.color(self.slab.right(w)) == Color::Black
                {
                    self.slab.set_color(w, Color::Red);
                    x = x_parent;
                    x_parent = self.slab.parent(x);
                } else {
                    if self.slab.color(self.slab.right(w)) == Color::Black {
                        self.slab.set_color(self.slab.left(w), Color::Black);
                        self.slab.set_color(w, Color::Red);
                        self.rotate_right(w);
                        w = self.slab.right(x_parent);
                    }
                    self.slab.set_color(w, self.slab.color(x_parent));
                    self.slab.set_color(x_parent, Color::Black);
                    self.slab.set_color(self.slab.right(w), Color::Black);
                    self.rotate_left(x_parent);
                    x = self.current_subtree_root(w);
                    x_parent = Handle::NIL;
                }
            } else {
                let mut w = self.slab.left(x_parent);
                if w.is_nil() {
                    return Err(TreeError::invariant_violated(
                        "delete fixup expected a sibling but found the sentinel",
                    ));
                }
                if self.slab.color(w) == Color::Red {
                    self.slab.set_color(w, Color::Black);
                    self.slab.set_color(x_parent, Color::Red);
                    self.rotate_right(x_parent);
                    w = self.slab.left(x_parent);
                }
                if self.slab.color(self.slab.right(w)) == Color::Black
                    && self.slab.color(self.slab.left(w)) == Color::Black
                {
                    self.slab.set_color(w, Color::Red);
                    x = x_parent;
                    x_parent = self.slab.parent(x);
                } else {
                    if self.slab.color(self.slab.left(w)) == Color::Black {
                        self.slab.set_color(self.slab.right(w), Color::Black);
                        self.slab.set_color(w, Color::Red);
                        self.rotate_left(w);
                        w = self.slab.left(x_parent);
                    }
                    self.slab.set_color(w, self.slab.color(x_parent));
                    self.slab.set_color(x_parent, Color::Black);
                    self.slab.set_color(self.slab.left(w), Color::Black);
                    self.rotate_right(x_parent);
                    x = self.current_subtree_root(w);
                    x_parent = Handle::NIL;
                }
            }
        }
        self.slab.set_color(x, Color::Black);
        Ok(())
    }

    /// Descends using `size(left)+1` as the local 1-indexed rank; recurses
    /// into a satellite subtree when the rank lands inside a duplicate
    /// group, returning that group's anchor alongside the resolved handle.
    pub(super) fn handle_and_anchor_of_rank(
        &self,
        root: Handle,
        k: u32,
        current_anchor: Option<Handle>,
    ) -> (Handle, Option<Handle>) {
        let mut n = root;
        let mut k1 = k + 1;
        loop {
            if n.is_nil() {
                return (Handle::NIL, current_anchor);
            }
            let left_size = self.slab.size(self.slab.left(n));
            let contribution = self.node_contribution(n);
            if k1 <= left_size {
                n = self.slab.left(n);
            } else if k1 <= left_size + contribution {
                if contribution == 1 {
                    return (n, current_anchor);
                }
                return self.handle_and_anchor_of_rank(self.slab.link(n), k1 - left_size - 1, Some(n));
            } else {
                k1 -= left_size + contribution;
                n = self.slab.right(n);
            }
        }
    }

    pub(super) fn handle_of_rank(&self, root: Handle, k: u32) -> Handle {
        self.handle_and_anchor_of_rank(root, k, None).0
    }

    /// Bottom-up rank accumulation within `h`'s own (sub)tree: does not
    /// cross from a satellite subtree into the main tree on its own.
    pub(super) fn local_rank(&self, h: Handle) -> u32 {
        let mut rank = self.slab.size(self.slab.left(h));
        let mut cur = h;
        loop {
            let p = self.slab.parent(cur);
            if p.is_nil() {
                break;
            }
            if cur == self.slab.right(p) {
                rank += self.slab.size(self.slab.left(p)) + self.node_contribution(p);
            }
            cur = p;
        }
        rank
    }
}
