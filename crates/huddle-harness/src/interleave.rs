//! Seeded interleaving of independent event sources.
//!
//! Each source delivers in order, but nothing orders one source against
//! another. [`interleave`] picks one of the legal merges deterministically
//! from a seed, so a failing ordering can be replayed.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Merge `sources` into one sequence, preserving the order within each source.
///
/// The same seed always yields the same merge.
pub fn interleave<T>(sources: Vec<Vec<T>>, seed: u64) -> Vec<T> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let total = sources.iter().map(Vec::len).sum();
    let mut queues: Vec<std::vec::IntoIter<T>> =
        sources.into_iter().filter(|s| !s.is_empty()).map(Vec::into_iter).collect();
    let mut remaining: Vec<usize> = queues.iter().map(ExactSizeIterator::len).collect();
    let mut merged = Vec::with_capacity(total);

    while !queues.is_empty() {
        // Weight by what is left so every merge is reachable
        let left: usize = remaining.iter().sum();
        let mut pick = rng.gen_range(0..left);
        let mut index = 0;
        while pick >= remaining[index] {
            pick -= remaining[index];
            index += 1;
        }

        if let Some(item) = queues[index].next() {
            merged.push(item);
        }
        remaining[index] -= 1;
        if remaining[index] == 0 {
            queues.swap_remove(index);
            remaining.swap_remove(index);
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_per_source_order() {
        for seed in 0..32 {
            let merged = interleave(vec![vec![1, 2, 3], vec![10, 20], vec![], vec![100]], seed);

            assert_eq!(merged.len(), 6);
            let firsts: Vec<_> = merged.iter().filter(|v| **v < 10).collect();
            let seconds: Vec<_> = merged.iter().filter(|v| (10..100).contains(*v)).collect();
            assert_eq!(firsts, [&1, &2, &3]);
            assert_eq!(seconds, [&10, &20]);
        }
    }

    #[test]
    fn same_seed_same_merge() {
        let sources = || vec![vec!['a', 'b', 'c'], vec!['x', 'y', 'z']];
        assert_eq!(interleave(sources(), 7), interleave(sources(), 7));
    }

    #[test]
    fn both_orders_reachable() {
        let orders: std::collections::BTreeSet<_> =
            (0..64).map(|seed| interleave(vec![vec![1], vec![2]], seed)).collect();
        assert_eq!(orders.len(), 2);
    }
}
