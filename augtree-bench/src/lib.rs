//! Data generators for `augtree` benchmarks.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A reproducible shuffle of `0..count`, for inserts that don't benefit
/// from an already-sorted key order.
pub fn shuffled_keys(count: u32, seed: u64) -> Vec<i32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut keys: Vec<i32> = (0..count as i32).collect();
    for i in (1..keys.len()).rev() {
        let j = rng.gen_range(0..=i);
        keys.swap(i, j);
    }
    keys
}

/// A reproducible sequence of primary keys with `duplicate_groups` of them
/// repeated `group_size` times, interleaved randomly.
pub fn keys_with_duplicates(distinct: u32, group_size: u32, seed: u64) -> Vec<i32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut keys = Vec::with_capacity((distinct * group_size) as usize);
    for k in 0..distinct as i32 {
        for _ in 0..group_size {
            keys.push(k);
        }
    }
    for i in (1..keys.len()).rev() {
        let j = rng.gen_range(0..=i);
        keys.swap(i, j);
    }
    keys
}
