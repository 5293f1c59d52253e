//! Synthetic workloads for benchmarking drift.
//!
//! - [`allocation_sizes`]: seeded mix of small/medium allocation requests
//! - [`churn_ops`]: seeded insert/remove sequence for slot stores
//! - [`run_churn`]: replay a churn sequence against a store

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use drift_arena::Arena;
use drift_core::Handle;
use drift_slots::{SlotError, SlotStore};
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Generate `n` `(size, align)` requests with sizes in `1..=max_size` and
/// power-of-two alignments up to 16.
pub fn allocation_sizes(seed: u64, n: usize, max_size: usize) -> Vec<(usize, usize)> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let size = 1 + rng.next_u32() as usize % max_size.max(1);
            let align = 1 << (rng.next_u32() % 5);
            (size, align)
        })
        .collect()
}

/// One step of a slot churn workload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChurnOp {
    /// Insert a new element.
    Insert,
    /// Remove the live element at this index (modulo the live count).
    Remove(u32),
}

/// Generate `n` churn steps; `insert_percent` of them are inserts.
pub fn churn_ops(seed: u64, n: usize, insert_percent: u32) -> Vec<ChurnOp> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            if rng.next_u32() % 100 < insert_percent {
                ChurnOp::Insert
            } else {
                ChurnOp::Remove(rng.next_u32())
            }
        })
        .collect()
}

/// Replay `ops` against `store`, returning the handles still live.
///
/// Removes against an empty live set are skipped.
pub fn run_churn(
    arena: &mut Arena,
    store: &mut SlotStore<u64>,
    ops: &[ChurnOp],
) -> Result<Vec<Handle>, SlotError> {
    let mut live = Vec::new();
    for op in ops {
        match *op {
            ChurnOp::Insert => {
                let (handle, value) = store.insert(arena)?;
                *value = handle.to_bits();
                live.push(handle);
            }
            ChurnOp::Remove(_) if live.is_empty() => {}
            ChurnOp::Remove(pick) => {
                let handle: Handle = live.swap_remove(pick as usize % live.len());
                store.remove(handle.locator())?;
            }
        }
    }
    Ok(live)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workloads_are_deterministic() {
        assert_eq!(allocation_sizes(7, 100, 256), allocation_sizes(7, 100, 256));
        assert_eq!(churn_ops(7, 100, 60), churn_ops(7, 100, 60));
        assert_ne!(churn_ops(7, 100, 60), churn_ops(8, 100, 60));
    }

    #[test]
    fn allocation_sizes_in_range() {
        for (size, align) in allocation_sizes(1, 1000, 64) {
            assert!((1..=64).contains(&size));
            assert!(align.is_power_of_two() && align <= 16);
        }
    }

    #[test]
    fn churn_replay_matches_store() {
        let mut arena = Arena::new(1 << 20);
        let mut store = SlotStore::new();
        let live = run_churn(&mut arena, &mut store, &churn_ops(42, 5_000, 55)).unwrap();
        assert_eq!(store.len(), live.len());
        for h in live {
            assert_eq!(*store.get_live(&arena, h).unwrap(), h.to_bits());
        }
    }
}
