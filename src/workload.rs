//! Deterministic synthetic workloads.
//!
//! Every record is a pure function of its index (or worker id and counter),
//! so any trial can recompute the value it expects to read back.

use crate::error::{Error, Result};

/// Width of the zero-padded index carried at the end of every value.
pub const INDEX_WIDTH: usize = 10;

/// Prefix shared by every generated key.
pub const KEY_PREFIX: &str = "key-";

/// Largest worker id a parallel key can carry.
pub const MAX_WORKER_ID: u32 = 9_999;

/// Counters at or above this wrap into the worker id slot of the checksum.
const COUNTER_SPAN: u64 = 1_000_000;

/// A generated key/value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Cache key
    pub key: String,
    /// Value bytes; the trailing [`INDEX_WIDTH`] bytes encode the index
    pub value: Vec<u8>,
}

/// Key for a sequential record: `key-` plus the index padded to 10 digits.
pub fn key(index: u64) -> String {
    format!("{KEY_PREFIX}{index:010}")
}

/// Key for a parallel record: `key-<worker:04>-<counter:06>`.
pub fn parallel_key(worker_id: u32, counter: u64) -> String {
    format!("{KEY_PREFIX}{worker_id:04}-{counter:06}")
}

/// Generate the record for `index`.
///
/// Fails when `value_size` cannot hold the 10 digit suffix.
pub fn generate(index: u64, value_size: usize) -> Result<Record> {
    Ok(Record {
        key: key(index),
        value: expected_value(index, value_size)?,
    })
}

/// Generate a record for a parallel worker.
///
/// The value suffix is `worker_id * 1_000_000 + counter`, which lets a
/// read-back pass verify entries written by many workers at once.
pub fn parallel_generate(worker_id: u32, counter: u64, value_size: usize) -> Result<Record> {
    Ok(Record {
        key: parallel_key(worker_id, counter),
        value: expected_value(parallel_checksum(worker_id, counter), value_size)?,
    })
}

/// The value [`generate`] produces for `index`.
pub fn expected_value(index: u64, value_size: usize) -> Result<Vec<u8>> {
    if value_size < INDEX_WIDTH {
        return Err(Error::InvalidValueSize {
            value_size,
            min: INDEX_WIDTH,
        });
    }

    let mut value = vec![0u8; value_size - INDEX_WIDTH];
    value.extend_from_slice(format!("{index:010}").as_bytes());
    Ok(value)
}

/// Checksum embedded in the value of a parallel record.
pub fn parallel_checksum(worker_id: u32, counter: u64) -> u64 {
    u64::from(worker_id) * COUNTER_SPAN + counter
}

/// Read the index back out of a generated value, if it has the right shape.
pub fn embedded_index(value: &[u8]) -> Option<u64> {
    if value.len() < INDEX_WIDTH {
        return None;
    }
    let (padding, digits) = value.split_at(value.len() - INDEX_WIDTH);
    if padding.iter().any(|b| *b != 0) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_record() {
        let record = generate(1, 100).unwrap();

        assert_eq!(record.key, "key-0000000001");
        assert_eq!(record.value.len(), 100);
        assert_eq!(&record.value[90..], b"0000000001");
        assert!(record.value[..90].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_generate_is_deterministic() {
        assert_eq!(generate(42, 64).unwrap(), generate(42, 64).unwrap());
        assert_ne!(generate(42, 64).unwrap(), generate(43, 64).unwrap());
    }

    #[test]
    fn test_value_size_minimum() {
        let record = generate(7, INDEX_WIDTH).unwrap();
        assert_eq!(record.value, b"0000000007");

        let err = generate(7, INDEX_WIDTH - 1).unwrap_err();
        assert!(matches!(err, Error::InvalidValueSize { value_size: 9, .. }));
    }

    #[test]
    fn test_parallel_key_format() {
        assert_eq!(parallel_key(7, 42), "key-0007-000042");
        assert_eq!(parallel_key(MAX_WORKER_ID, 999_999), "key-9999-999999");
    }

    #[test]
    fn test_parallel_record_checksum() {
        let record = parallel_generate(12, 345, 32).unwrap();
        assert_eq!(record.key, "key-0012-000345");
        assert_eq!(embedded_index(&record.value), Some(12_000_345));
    }

    #[test]
    fn test_embedded_index_rejects_garbage() {
        assert_eq!(embedded_index(b"short"), None);

        let mut value = expected_value(5, 20).unwrap();
        value[0] = 1;
        assert_eq!(embedded_index(&value), None);
    }
}
