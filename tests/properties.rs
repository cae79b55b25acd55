//! Property-based tests for the workload generator and the backends.
//!
//! # Test Properties
//!
//! 1. **Determinism**: the same index always yields the same record
//! 2. **Layout**: zero padding followed by the 10 digit index
//! 3. **Read-back**: every backend returns what was written, for any hasher
//! 4. **Parallel keys**: distinct (worker, counter) pairs never collide

use cachebench::backend::{BackendConfig, BackendKind, CacheBackend, HashFunction};
use cachebench::check::{self, CheckOutcome};
use cachebench::workload::{self, INDEX_WIDTH};

use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

fn value_size_strategy() -> impl Strategy<Value = usize> {
    INDEX_WIDTH..512
}

fn kind_strategy() -> impl Strategy<Value = BackendKind> {
    prop::sample::select(BackendKind::ALL.to_vec())
}

fn hasher_strategy() -> impl Strategy<Value = HashFunction> {
    prop::sample::select(HashFunction::ALL.to_vec())
}

// =============================================================================
// Generator properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// The generator is a pure function of index and size.
    #[test]
    fn prop_generate_is_deterministic(index in 0u64..10_000_000_000, size in value_size_strategy()) {
        let first = workload::generate(index, size)?;
        let second = workload::generate(index, size)?;
        prop_assert_eq!(first, second);
    }

    /// Values are zero padding then the index, and the index reads back.
    #[test]
    fn prop_value_layout(index in 0u64..10_000_000_000, size in value_size_strategy()) {
        let record = workload::generate(index, size)?;

        prop_assert_eq!(record.value.len(), size);
        prop_assert!(record.value[..size - INDEX_WIDTH].iter().all(|b| *b == 0));
        let expected_suffix = format!("{index:010}");
        prop_assert_eq!(&record.value[size - INDEX_WIDTH..], expected_suffix.as_bytes());
        prop_assert_eq!(workload::embedded_index(&record.value), Some(index));
        prop_assert_eq!(record.key, format!("key-{index:010}"));
    }

    /// Sizes below the suffix width are rejected, never truncated.
    #[test]
    fn prop_short_values_rejected(index in any::<u32>(), size in 0usize..INDEX_WIDTH) {
        prop_assert!(workload::generate(u64::from(index), size).is_err());
    }

    /// Parallel keys are unique per (worker, counter) and verify by checksum.
    #[test]
    fn prop_parallel_keys_distinct(
        a in (0u32..=workload::MAX_WORKER_ID, 0u64..1_000_000),
        b in (0u32..=workload::MAX_WORKER_ID, 0u64..1_000_000),
    ) {
        prop_assume!(a != b);
        prop_assert_ne!(workload::parallel_key(a.0, a.1), workload::parallel_key(b.0, b.1));

        let record = workload::parallel_generate(a.0, a.1, 64)?;
        prop_assert!(check::check_parallel(&Ok(Some(record.value)), a.0, a.1, 64).is_match());
    }
}

// =============================================================================
// Backend properties
// =============================================================================

fn write_then_read<B: CacheBackend>(
    config: &BackendConfig,
    indices: &[u64],
    value_size: usize,
) -> Result<Vec<CheckOutcome>, TestCaseError> {
    let backend = B::construct(config)?;
    for &index in indices {
        let record = workload::generate(index, value_size)?;
        backend.set(record.key, record.value)?;
    }
    Ok(indices
        .iter()
        .map(|&index| check::check(&backend.get(&workload::key(index)), index, value_size))
        .collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Whatever was written reads back intact on every backend and hasher.
    #[test]
    fn prop_backend_read_back(
        kind in kind_strategy(),
        hasher in hasher_strategy(),
        indices in prop::collection::btree_set(0u64..1_000_000, 1..200),
        value_size in INDEX_WIDTH..150,
    ) {
        let indices: Vec<u64> = indices.into_iter().collect();
        let config = BackendConfig::new(1_000).with_shards(8).with_hasher(hasher);

        let outcomes = cachebench::with_backend!(kind, hasher, B => {
            write_then_read::<B>(&config, &indices, value_size)
        })?;

        for outcome in outcomes {
            prop_assert_eq!(outcome, CheckOutcome::Match);
        }
    }

    /// The most recent write wins.
    #[test]
    fn prop_overwrite_keeps_latest(
        kind in kind_strategy(),
        index in 0u64..1_000,
        first in INDEX_WIDTH..64,
        second in INDEX_WIDTH..64,
    ) {
        let config = BackendConfig::new(64).with_shards(4);
        let latest = cachebench::with_backend!(kind, HashFunction::Default, B => {
            let backend = B::construct(&config)?;
            let old = workload::generate(index, first)?;
            let new = workload::generate(index, second)?;
            backend.set(old.key, old.value)?;
            backend.set(new.key.clone(), new.value)?;
            backend.get(&new.key)?
        });
        prop_assert_eq!(latest, Some(workload::expected_value(index, second)?));
    }
}
