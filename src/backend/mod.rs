//! Uniform capability interface over the caches under test.
//!
//! Each backend kind wraps one external crate behind [`CacheBackend`] so a
//! trial can drive any of them the same way. Whether a backend may be shared
//! between workers is expressed through `Sync`: parallel trials only accept
//! `CacheBackend + Sync`.

pub mod arena;
pub mod concurrent;
pub mod native;
pub mod sharded;

use crate::error::Result;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::BuildHasher;
use std::time::Duration;

pub use arena::ArenaCache;
pub use concurrent::ConcurrentMap;
pub use native::NativeMap;
pub use sharded::ShardedTtlCache;

/// The caches the harness knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Segmented cache with a lifetime window (moka)
    ShardedTtl,
    /// `std::collections::HashMap`, single-threaded only
    NativeMap,
    /// Sharded concurrent map (dashmap)
    ConcurrentMap,
    /// Byte-budgeted bounded cache (quick_cache)
    Arena,
}

impl BackendKind {
    /// Every backend kind, in report order.
    pub const ALL: [BackendKind; 4] = [
        BackendKind::ShardedTtl,
        BackendKind::NativeMap,
        BackendKind::ConcurrentMap,
        BackendKind::Arena,
    ];

    /// Stable identifier used in target ids and report lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::ShardedTtl => "sharded_ttl",
            BackendKind::NativeMap => "native_map",
            BackendKind::ConcurrentMap => "concurrent_map",
            BackendKind::Arena => "arena",
        }
    }

    /// Whether the backend may be shared by parallel workers.
    pub fn is_concurrent(&self) -> bool {
        !matches!(self, BackendKind::NativeMap)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hash function override handed to a backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashFunction {
    /// The standard library's randomly seeded SipHash
    #[default]
    Default,
    /// xxh3
    XxHash,
}

impl HashFunction {
    /// Both hash functions, default first.
    pub const ALL: [HashFunction; 2] = [HashFunction::Default, HashFunction::XxHash];

    /// Stable identifier used in target ids and config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            HashFunction::Default => "default",
            HashFunction::XxHash => "xxhash",
        }
    }
}

impl fmt::Display for HashFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HashFunction {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(HashFunction::Default),
            "xxhash" | "xxh3" => Ok(HashFunction::XxHash),
            other => Err(crate::Error::config_key(
                format!("unknown hash function '{other}'"),
                "hasher",
            )),
        }
    }
}

/// `BuildHasher` for xxh3.
#[derive(Debug, Clone, Copy, Default)]
pub struct XxHashBuilder;

impl BuildHasher for XxHashBuilder {
    type Hasher = xxhash_rust::xxh3::Xxh3;

    fn build_hasher(&self) -> Self::Hasher {
        xxhash_rust::xxh3::Xxh3::new()
    }
}

/// Hasher types a backend can be instantiated with.
pub trait BackendHasher: BuildHasher + Clone + Default + Send + Sync + 'static {
    /// Which override this hasher implements.
    const FUNCTION: HashFunction;
}

impl BackendHasher for std::collections::hash_map::RandomState {
    const FUNCTION: HashFunction = HashFunction::Default;
}

impl BackendHasher for XxHashBuilder {
    const FUNCTION: HashFunction = HashFunction::XxHash;
}

/// Construction parameters shared by all backends.
///
/// Backends ignore the fields they have no use for; see each backend module
/// for what it honours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Number of shards (segments)
    pub shards: usize,
    /// Duration after which an entry may be evicted
    pub life_window: Duration,
    /// Entries expected, used for pre-sizing
    pub max_entries: u64,
    /// Largest single entry in bytes, used to size byte budgets
    pub max_entry_size: usize,
    /// Hash function override
    pub hasher: HashFunction,
}

impl BackendConfig {
    /// Create a configuration for `max_entries` entries with default limits.
    pub fn new(max_entries: u64) -> Self {
        Self {
            shards: crate::config::DEFAULT_SHARDS,
            life_window: crate::config::DEFAULT_LIFE_WINDOW,
            max_entries,
            max_entry_size: crate::config::DEFAULT_MAX_ENTRY_SIZE,
            hasher: HashFunction::Default,
        }
    }

    /// Set the shard count.
    pub fn with_shards(mut self, shards: usize) -> Self {
        self.shards = shards;
        self
    }

    /// Set the lifetime window.
    pub fn with_life_window(mut self, life_window: Duration) -> Self {
        self.life_window = life_window;
        self
    }

    /// Set the maximum entry size.
    pub fn with_max_entry_size(mut self, max_entry_size: usize) -> Self {
        self.max_entry_size = max_entry_size;
        self
    }

    /// Set the hash function override.
    pub fn with_hasher(mut self, hasher: HashFunction) -> Self {
        self.hasher = hasher;
        self
    }

    /// Total byte budget for backends that weigh entries.
    pub fn byte_budget(&self) -> u64 {
        self.max_entries.saturating_mul(self.max_entry_size as u64)
    }
}

/// A cache driven by the harness.
pub trait CacheBackend: Sized {
    /// Which backend this is.
    const KIND: BackendKind;

    /// Build an instance from `config`.
    ///
    /// A configuration the backend cannot honour yields
    /// [`Error::Construction`](crate::Error::Construction).
    fn construct(config: &BackendConfig) -> Result<Self>;

    /// Insert or overwrite `key`.
    fn set(&self, key: String, value: Vec<u8>) -> Result<()>;

    /// Most recent value for `key`, `Ok(None)` when absent or evicted.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Number of entries currently held (approximate for some backends).
    fn len(&self) -> usize;

    /// Whether the backend holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hash function this instance uses.
    fn hash_function(&self) -> HashFunction;
}

/// Run `$body` with `$backend` bound to the concrete backend type for
/// `$kind` and `$hasher`.
///
/// ```ignore
/// let report = with_backend!(kind, hasher, B => run_sequential::<B>(&config, op, n, size))?;
/// ```
#[macro_export]
macro_rules! with_backend {
    ($kind:expr, $hasher:expr, $backend:ident => $body:expr) => {{
        use $crate::backend::{BackendKind, HashFunction};
        type Std = ::std::collections::hash_map::RandomState;
        type Xx = $crate::backend::XxHashBuilder;
        match ($kind, $hasher) {
            (BackendKind::ShardedTtl, HashFunction::Default) => {
                type $backend = $crate::backend::ShardedTtlCache<Std>;
                $body
            }
            (BackendKind::ShardedTtl, HashFunction::XxHash) => {
                type $backend = $crate::backend::ShardedTtlCache<Xx>;
                $body
            }
            (BackendKind::NativeMap, HashFunction::Default) => {
                type $backend = $crate::backend::NativeMap<Std>;
                $body
            }
            (BackendKind::NativeMap, HashFunction::XxHash) => {
                type $backend = $crate::backend::NativeMap<Xx>;
                $body
            }
            (BackendKind::ConcurrentMap, HashFunction::Default) => {
                type $backend = $crate::backend::ConcurrentMap<Std>;
                $body
            }
            (BackendKind::ConcurrentMap, HashFunction::XxHash) => {
                type $backend = $crate::backend::ConcurrentMap<Xx>;
                $body
            }
            (BackendKind::Arena, HashFunction::Default) => {
                type $backend = $crate::backend::ArenaCache<Std>;
                $body
            }
            (BackendKind::Arena, HashFunction::XxHash) => {
                type $backend = $crate::backend::ArenaCache<Xx>;
                $body
            }
        }
    }};
}

/// Like [`with_backend!`] but only for backends that are `Sync`; the native
/// map yields [`Error::NotConcurrent`](crate::Error::NotConcurrent).
#[macro_export]
macro_rules! with_concurrent_backend {
    ($kind:expr, $hasher:expr, $backend:ident => $body:expr) => {{
        use $crate::backend::{BackendKind, HashFunction};
        type Std = ::std::collections::hash_map::RandomState;
        type Xx = $crate::backend::XxHashBuilder;
        match ($kind, $hasher) {
            (BackendKind::ShardedTtl, HashFunction::Default) => {
                type $backend = $crate::backend::ShardedTtlCache<Std>;
                $body
            }
            (BackendKind::ShardedTtl, HashFunction::XxHash) => {
                type $backend = $crate::backend::ShardedTtlCache<Xx>;
                $body
            }
            (BackendKind::ConcurrentMap, HashFunction::Default) => {
                type $backend = $crate::backend::ConcurrentMap<Std>;
                $body
            }
            (BackendKind::ConcurrentMap, HashFunction::XxHash) => {
                type $backend = $crate::backend::ConcurrentMap<Xx>;
                $body
            }
            (BackendKind::Arena, HashFunction::Default) => {
                type $backend = $crate::backend::ArenaCache<Std>;
                $body
            }
            (BackendKind::Arena, HashFunction::XxHash) => {
                type $backend = $crate::backend::ArenaCache<Xx>;
                $body
            }
            (BackendKind::NativeMap, _) => Err($crate::Error::not_concurrent(
                BackendKind::NativeMap.as_str(),
            )),
        }
    }};
}
