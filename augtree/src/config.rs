//! Construction-time parameters for an [`crate::RbTree`].
//!
//! Rather than a type parameter bound (`V: PrimaryOrd`), the tree is
//! parameterised by two boxed comparator closures supplied at construction —
//! "polymorphism via capability parameters" (spec §9) rather than
//! inheritance or a trait bound. This keeps `link_mode` and the comparators
//! out of the type signature entirely, at the cost of a vtable call per
//! comparison.

use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// The two mutually-exclusive meanings of a node's `link` field (spec §3.1).
/// Chosen once at construction and immutable thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMode {
    /// `link` threads the in-order successor chain. No satellite subtrees
    /// are ever created in this mode, so duplicates-by-position are always
    /// permitted.
    Successor,
    /// `link`, when non-`NIL`, points at the root of a satellite subtree
    /// holding this node's logical duplicates.
    Satellite,
}

pub(crate) type Comparator<V> = Box<dyn Fn(&V, &V) -> Ordering>;

/// Construction-time configuration for an [`crate::RbTree`].
pub struct TreeConfig<V> {
    link_mode: LinkMode,
    pub(crate) allow_duplicates: bool,
    primary: Comparator<V>,
    satellite: Comparator<V>,
}

impl<V: Hash> TreeConfig<V> {
    /// Builds a configuration with the default satellite comparator: a
    /// stable hash of the value. Fallible on hash collisions between
    /// distinct values — see spec §9 "Hash-as-satellite-comparator is
    /// fallible". Prefer [`TreeConfig::with_satellite_comparator`] when an
    /// explicit secondary order is available.
    pub fn new(link_mode: LinkMode, primary_comparator: impl Fn(&V, &V) -> Ordering + 'static) -> Self {
        TreeConfig {
            link_mode,
            allow_duplicates: false,
            primary: Box::new(primary_comparator),
            satellite: Box::new(hash_satellite_comparator),
        }
    }
}

impl<V> TreeConfig<V> {
    /// Enables or forbids logical duplicates at construction time. Once the
    /// tree built from this config is non-empty, tightening `true` to
    /// `false` is only legal while no duplicate group exists — see
    /// [`crate::RbTree::set_allow_duplicates`].
    pub fn with_duplicates(mut self, allow: bool) -> Self {
        self.allow_duplicates = allow;
        self
    }

    /// Supplies an explicit satellite comparator, overriding the
    /// hash-based default. Must never return `Ordering::Equal` for two
    /// distinct values that end up in the same satellite subtree; doing so
    /// fails the triggering insert with `InvariantViolated`.
    pub fn with_satellite_comparator(mut self, cmp: impl Fn(&V, &V) -> Ordering + 'static) -> Self {
        self.satellite = Box::new(cmp);
        self
    }

    pub fn link_mode(&self) -> LinkMode {
        self.link_mode
    }

    pub fn allow_duplicates(&self) -> bool {
        self.allow_duplicates
    }

    pub(crate) fn compare_primary(&self, a: &V, b: &V) -> Ordering {
        (self.primary)(a, b)
    }

    pub(crate) fn compare_satellite(&self, a: &V, b: &V) -> Ordering {
        (self.satellite)(a, b)
    }
}

fn hash_satellite_comparator<V: Hash>(a: &V, b: &V) -> Ordering {
    let mut ha = DefaultHasher::new();
    a.hash(&mut ha);
    let mut hb = DefaultHasher::new();
    b.hash(&mut hb);
    ha.finish().cmp(&hb.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_default_to_forbidden() {
        let cfg: TreeConfig<i32> = TreeConfig::new(LinkMode::Successor, |a, b| a.cmp(b));
        assert!(!cfg.allow_duplicates());
        assert_eq!(cfg.link_mode(), LinkMode::Successor);
    }

    #[test]
    fn with_duplicates_toggles_flag() {
        let cfg: TreeConfig<i32> = TreeConfig::new(LinkMode::Satellite, |a, b| a.cmp(b)).with_duplicates(true);
        assert!(cfg.allow_duplicates());
    }

    #[test]
    fn custom_satellite_comparator_overrides_hash() {
        let cfg: TreeConfig<(i32, i32)> = TreeConfig::new(LinkMode::Satellite, |a: &(i32, i32), b: &(i32, i32)| {
            a.0.cmp(&b.0)
        })
        .with_satellite_comparator(|a: &(i32, i32), b: &(i32, i32)| a.1.cmp(&b.1));
        assert_eq!(cfg.compare_satellite(&(1, 2), &(1, 3)), Ordering::Less);
    }
}
