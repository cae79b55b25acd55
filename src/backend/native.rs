//! The standard library `HashMap`.
//!
//! Only `max_entries` (capacity pre-sizing) and the hash function are
//! honoured. Entries never expire and are never rejected.
//!
//! The map sits in a `RefCell`, which makes this backend `Send` but not
//! `Sync`: it can be handed to the reclaimer but never to a parallel trial.

use super::{BackendConfig, BackendHasher, BackendKind, CacheBackend, HashFunction};
use crate::error::{Error, Result};

use std::cell::RefCell;
use std::collections::hash_map::RandomState;
use std::collections::HashMap;

/// Plain `HashMap<String, Vec<u8>>`.
pub struct NativeMap<S = RandomState> {
    map: RefCell<HashMap<String, Vec<u8>, S>>,
}

impl<S: BackendHasher> CacheBackend for NativeMap<S> {
    const KIND: BackendKind = BackendKind::NativeMap;

    fn construct(config: &BackendConfig) -> Result<Self> {
        let capacity = usize::try_from(config.max_entries).map_err(|_| {
            Error::construction(Self::KIND.as_str(), "max entries exceeds the address space")
        })?;

        Ok(Self {
            map: RefCell::new(HashMap::with_capacity_and_hasher(capacity, S::default())),
        })
    }

    fn set(&self, key: String, value: Vec<u8>) -> Result<()> {
        self.map.borrow_mut().insert(key, value);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.map.borrow().get(key).cloned())
    }

    fn len(&self) -> usize {
        self.map.borrow().len()
    }

    fn hash_function(&self) -> HashFunction {
        S::FUNCTION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presized_capacity() {
        let map = NativeMap::<RandomState>::construct(&BackendConfig::new(1_000)).unwrap();
        assert!(map.map.borrow().capacity() >= 1_000);
        assert!(map.is_empty());
    }

    #[test]
    fn test_ignores_shards_and_life_window() {
        let config = BackendConfig::new(10)
            .with_shards(0)
            .with_life_window(std::time::Duration::ZERO);
        let map = NativeMap::<RandomState>::construct(&config).unwrap();
        map.set("key".into(), vec![7]).unwrap();
        assert_eq!(map.get("key").unwrap(), Some(vec![7]));
    }
}
