//! Bounded cache with a fixed byte budget, backed by `quick_cache`.
//!
//! This backend fills the preallocated, byte-budgeted role: capacity is
//! `max_entries * max_entry_size` bytes and each entry weighs its key plus
//! value length. `max_entries` is also the estimated item count used to
//! pre-size the tables.
//!
//! Ignored: `shards` (quick_cache picks its own shard count) and
//! `life_window` (no expiry). Entries heavier than one shard's share of the
//! budget are dropped by the crate without an error; they read back as
//! misses.

use super::{BackendConfig, BackendHasher, BackendKind, CacheBackend, HashFunction};
use crate::error::{Error, Result};

use quick_cache::sync::{Cache, DefaultLifecycle};
use quick_cache::Weighter;
use std::collections::hash_map::RandomState;

/// Weighs an entry by its byte footprint.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteWeighter;

impl Weighter<String, Vec<u8>> for ByteWeighter {
    fn weight(&self, key: &String, value: &Vec<u8>) -> u64 {
        (key.len() + value.len()) as u64
    }
}

/// quick_cache `Cache<String, Vec<u8>>` with a byte budget.
pub struct ArenaCache<S = RandomState> {
    cache: Cache<String, Vec<u8>, ByteWeighter, S>,
}

impl<S: BackendHasher> ArenaCache<S> {
    /// Configured byte budget.
    pub fn capacity_bytes(&self) -> u64 {
        self.cache.capacity()
    }

    /// Bytes currently held.
    pub fn weight_bytes(&self) -> u64 {
        self.cache.weight()
    }
}

impl<S: BackendHasher> CacheBackend for ArenaCache<S> {
    const KIND: BackendKind = BackendKind::Arena;

    fn construct(config: &BackendConfig) -> Result<Self> {
        let budget = config.byte_budget();
        if budget == 0 {
            return Err(Error::construction(
                Self::KIND.as_str(),
                "max entries and max entry size must be non-zero",
            ));
        }

        let estimated_items = usize::try_from(config.max_entries).map_err(|_| {
            Error::construction(Self::KIND.as_str(), "max entries exceeds the address space")
        })?;

        Ok(Self {
            cache: Cache::with(
                estimated_items,
                budget,
                ByteWeighter,
                S::default(),
                DefaultLifecycle::default(),
            ),
        })
    }

    fn set(&self, key: String, value: Vec<u8>) -> Result<()> {
        self.cache.insert(key, value);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.cache.get(key))
    }

    fn len(&self) -> usize {
        self.cache.len()
    }

    fn hash_function(&self) -> HashFunction {
        S::FUNCTION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::XxHashBuilder;
    use crate::workload;

    #[test]
    fn test_rejects_zero_budget() {
        let config = BackendConfig::new(0);
        assert!(ArenaCache::<RandomState>::construct(&config).is_err());

        let config = BackendConfig::new(10).with_max_entry_size(0);
        assert!(ArenaCache::<RandomState>::construct(&config).is_err());
    }

    #[test]
    fn test_weight_tracks_bytes() {
        let cache = ArenaCache::<RandomState>::construct(&BackendConfig::new(100)).unwrap();
        assert_eq!(cache.capacity_bytes(), 100 * 200);

        let record = workload::generate(3, 50).unwrap();
        let expected = (record.key.len() + record.value.len()) as u64;
        cache.set(record.key, record.value).unwrap();
        assert_eq!(cache.weight_bytes(), expected);
    }

    #[test]
    fn test_stays_within_budget() {
        let config = BackendConfig::new(100).with_max_entry_size(64);
        let cache = ArenaCache::<RandomState>::construct(&config).unwrap();

        for i in 0..1_000 {
            let record = workload::generate(i, 50).unwrap();
            cache.set(record.key, record.value).unwrap();
        }

        assert!(cache.weight_bytes() <= cache.capacity_bytes());
        assert!(cache.len() < 1_000);
    }

    #[test]
    fn test_round_trip_with_both_hashers() {
        let config = BackendConfig::new(100);
        let default = ArenaCache::<RandomState>::construct(&config).unwrap();
        let xxhash = ArenaCache::<XxHashBuilder>::construct(&config).unwrap();
        assert_eq!(xxhash.hash_function(), HashFunction::XxHash);

        let record = workload::generate(7, 50).unwrap();
        default.set(record.key.clone(), record.value.clone()).unwrap();
        xxhash.set(record.key.clone(), record.value.clone()).unwrap();

        assert_eq!(default.get(&record.key).unwrap(), Some(record.value.clone()));
        assert_eq!(xxhash.get(&record.key).unwrap(), Some(record.value));
        assert_eq!(default.get("absent").unwrap(), None);
    }
}
