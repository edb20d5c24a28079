#![allow(clippy::invisible_characters, clippy::approx_constant)]
//! # augtree - an order-statistic red-black tree
//!
//! `augtree` is an augmented red-black tree engine offering logarithmic
//! ordered lookup by key, logarithmic indexed lookup by rank, O(log n)
//! positional insert/remove, and logical duplicates via nested satellite
//! subtrees, backed by a slab/page-table allocator that hands out dense
//! integer handles instead of pointers.
//!
//! ## Key Features
//!
//! - **Order statistics**: every node is augmented with its subtree size,
//!   so "the k-th smallest element" and "the rank of this handle" are both
//!   O(log n).
//! - **Positional operations**: insert or remove at an arbitrary index
//!   without touching keys at all, the same tree doubling as an
//!   order-statistics list.
//! - **Logical duplicates**: primary-key collisions are resolved by
//!   promoting the colliding node into a small satellite subtree ordered by
//!   a secondary comparator, rather than chaining or rejecting the insert.
//! - **Handle-based arena**: nodes live in growable, page-tiered slabs and
//!   are addressed by a dense `Handle`, not a pointer - handles stay valid
//!   across rotations and are cheap to store externally.
//!
//! ## Quick Start
//!
//! ```rust
//! use augtree::{LinkMode, RbTree, TreeConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config: TreeConfig<i32> = TreeConfig::new(LinkMode::Satellite, |a, b| a.cmp(b))
//!     .with_duplicates(true);
//! let mut tree = RbTree::new(config);
//!
//! let h1 = tree.insert_by_key(10)?;
//! let h2 = tree.insert_by_key(5)?;
//! tree.insert_by_key(15)?;
//!
//! assert_eq!(tree.rank_of(h2), Some(0));
//! assert_eq!(*tree.value_at_rank(1)?, 10);
//!
//! tree.remove(h1)?;
//! assert_eq!(tree.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Design Pattern
//!
//! The tree is parameterised at construction time by a [`TreeConfig`]
//! holding boxed comparator closures and a [`LinkMode`], rather than by
//! trait-bound type parameters - "polymorphism via capability parameters."
//! This keeps the comparators, and the choice between a successor chain and
//! satellite subtrees, out of `RbTree`'s type signature entirely.
//!
//! ## Module Organization
//!
//! - [`tree`] - the `RbTree` type: rotations/fixups, key- and rank-based
//!   insertion and removal policies, and in-order traversal
//! - [`config`] - construction-time configuration (`TreeConfig`, `LinkMode`)
//! - [`handle`] - the `Handle` identifier type
//! - [`errors`] - error types and result definitions
//! - `slab` - the page-tiered node arena (private; accessed only through
//!   `RbTree`)

pub mod config;
pub mod errors;
pub mod handle;
pub(crate) mod node;
pub(crate) mod slab;
pub mod tree;

pub use config::{LinkMode, TreeConfig};
pub use errors::{ErrorKind, TreeError, TreeResult};
pub use handle::Handle;
pub use tree::{Iter, RbTree};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quick_start_smoke_test() {
        let config: TreeConfig<i32> = TreeConfig::new(LinkMode::Satellite, |a, b| a.cmp(b)).with_duplicates(true);
        let mut tree = RbTree::new(config);
        let h1 = tree.insert_by_key(10).unwrap();
        let h2 = tree.insert_by_key(5).unwrap();
        tree.insert_by_key(15).unwrap();

        assert_eq!(tree.rank_of(h2), Some(0));
        assert_eq!(*tree.value_at_rank(1).unwrap(), 10);

        tree.remove(h1).unwrap();
        assert_eq!(tree.len(), 2);
    }
}
