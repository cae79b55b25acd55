//! Segmented cache with a lifetime window, backed by `moka`.
//!
//! Honours every [`BackendConfig`] field:
//! - `shards` becomes the moka segment count (moka rounds it up to a power of
//!   two; zero is rejected).
//! - `life_window` is the time-to-live. Expired entries read as misses even
//!   before moka's housekeeping removes them.
//! - `max_entries` pre-sizes the segments.
//! - `max_entry_size` sizes the weighted capacity at
//!   `max_entries * max_entry_size` bytes. Oversized entries are not
//!   rejected on `set`; they count against the capacity and may push other
//!   entries out.

use super::{BackendConfig, BackendHasher, BackendKind, CacheBackend, HashFunction};
use crate::error::{Error, Result};

use moka::sync::SegmentedCache;
use std::collections::hash_map::RandomState;

/// moka `SegmentedCache` keyed by string.
pub struct ShardedTtlCache<S = RandomState> {
    cache: SegmentedCache<String, Vec<u8>, S>,
}

impl<S: BackendHasher> ShardedTtlCache<S> {
    /// Run moka's pending housekeeping (expiry, eviction) now.
    pub fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks();
    }
}

fn entry_weight(key: &String, value: &Vec<u8>) -> u32 {
    u32::try_from(key.len() + value.len()).unwrap_or(u32::MAX)
}

impl<S: BackendHasher> CacheBackend for ShardedTtlCache<S> {
    const KIND: BackendKind = BackendKind::ShardedTtl;

    fn construct(config: &BackendConfig) -> Result<Self> {
        if config.shards == 0 {
            return Err(Error::construction(Self::KIND.as_str(), "shard count must be non-zero"));
        }
        if config.life_window.is_zero() {
            return Err(Error::construction(Self::KIND.as_str(), "life window must be non-zero"));
        }
        if config.max_entries == 0 || config.max_entry_size == 0 {
            return Err(Error::construction(
                Self::KIND.as_str(),
                "max entries and max entry size must be non-zero",
            ));
        }

        let initial_capacity = usize::try_from(config.max_entries).map_err(|_| {
            Error::construction(Self::KIND.as_str(), "max entries exceeds the address space")
        })?;

        let cache = SegmentedCache::builder(config.shards)
            .initial_capacity(initial_capacity)
            .max_capacity(config.byte_budget())
            .weigher(entry_weight)
            .time_to_live(config.life_window)
            .build_with_hasher(S::default());

        tracing::debug!(
            shards = config.shards,
            ttl_ms = config.life_window.as_millis() as u64,
            capacity_bytes = config.byte_budget(),
            "constructed sharded ttl cache"
        );

        Ok(Self { cache })
    }

    fn set(&self, key: String, value: Vec<u8>) -> Result<()> {
        self.cache.insert(key, value);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.cache.get(key))
    }

    fn len(&self) -> usize {
        self.cache.entry_count() as usize
    }

    fn hash_function(&self) -> HashFunction {
        S::FUNCTION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workload;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_rejects_zero_shards() {
        let config = BackendConfig::new(100).with_shards(0);
        let err = ShardedTtlCache::<RandomState>::construct(&config).err().unwrap();
        assert!(matches!(err, Error::Construction { .. }));
    }

    #[test]
    fn test_rejects_zero_life_window() {
        let config = BackendConfig::new(100).with_life_window(Duration::ZERO);
        assert!(ShardedTtlCache::<RandomState>::construct(&config).is_err());
    }

    #[test]
    fn test_entry_expires_after_life_window() {
        let config = BackendConfig::new(100)
            .with_shards(4)
            .with_life_window(Duration::from_millis(50));
        let cache = ShardedTtlCache::<RandomState>::construct(&config).unwrap();

        let record = workload::generate(1, 100).unwrap();
        cache.set(record.key.clone(), record.value.clone()).unwrap();
        assert_eq!(cache.get(&record.key).unwrap(), Some(record.value));

        thread::sleep(Duration::from_millis(150));

        assert_eq!(cache.get(&record.key).unwrap(), None);
    }

    #[test]
    fn test_entry_count_after_housekeeping() {
        let cache = ShardedTtlCache::<RandomState>::construct(&BackendConfig::new(100)).unwrap();
        for i in 0..10 {
            let record = workload::generate(i, 20).unwrap();
            cache.set(record.key, record.value).unwrap();
        }
        cache.run_pending_tasks();
        assert_eq!(cache.len(), 10);
    }
}
