//! Sharded concurrent map, backed by `dashmap`.
//!
//! `shards` is the DashMap shard amount, which the crate requires to be a
//! power of two greater than one; anything else is a construction error.
//! `max_entries` pre-sizes the map. The lifetime window and entry size are
//! ignored: entries live until overwritten.

use super::{BackendConfig, BackendHasher, BackendKind, CacheBackend, HashFunction};
use crate::error::{Error, Result};

use dashmap::DashMap;
use std::collections::hash_map::RandomState;

/// `DashMap<String, Vec<u8>>`.
pub struct ConcurrentMap<S = RandomState> {
    map: DashMap<String, Vec<u8>, S>,
    shards: usize,
}

impl<S: BackendHasher> ConcurrentMap<S> {
    /// Number of shards the map was built with.
    pub fn shard_count(&self) -> usize {
        self.shards
    }
}

impl<S: BackendHasher> CacheBackend for ConcurrentMap<S> {
    const KIND: BackendKind = BackendKind::ConcurrentMap;

    fn construct(config: &BackendConfig) -> Result<Self> {
        if config.shards < 2 || !config.shards.is_power_of_two() {
            return Err(Error::construction(
                Self::KIND.as_str(),
                format!(
                    "shard count must be a power of two greater than one, got {}",
                    config.shards
                ),
            ));
        }

        let capacity = usize::try_from(config.max_entries).map_err(|_| {
            Error::construction(Self::KIND.as_str(), "max entries exceeds the address space")
        })?;

        Ok(Self {
            map: DashMap::with_capacity_and_hasher_and_shard_amount(
                capacity,
                S::default(),
                config.shards,
            ),
            shards: config.shards,
        })
    }

    fn set(&self, key: String, value: Vec<u8>) -> Result<()> {
        self.map.insert(key, value);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.map.get(key).map(|entry| entry.value().clone()))
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn hash_function(&self) -> HashFunction {
        S::FUNCTION
    }
}
