//! Key-value storage
//!
//! The registry persists everything in one ordered byte store. This module
//! provides the store abstraction, an in-memory implementation, a
//! write-buffering branch, the composite key codec, the key layout and the
//! presence-only index store built on top of them.

use std::collections::BTreeMap;

pub mod cache;
pub mod codec;
pub mod index;
pub mod keys;

pub use cache::CacheStore;
pub use index::IndexedStore;

/// Ordered, prefix-iterable key-value store
///
/// Keys iterate in lexicographic byte order. Implementations must not be
/// mutated from inside an `iterate_prefix` visitor.
pub trait KvStore {
    /// Value stored under `key`
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&mut self, key: &[u8], value: &[u8]);

    /// Remove `key`; removing an absent key is a no-op
    fn delete(&mut self, key: &[u8]);

    /// Visit every entry whose key starts with `prefix` in key order,
    /// stopping early when `visit` returns false
    fn iterate_prefix(&self, prefix: &[u8], visit: &mut dyn FnMut(&[u8], &[u8]) -> bool);

    /// Whether `key` is present
    fn has(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Every key under `prefix`, in key order
    fn keys_with_prefix(&self, prefix: &[u8]) -> Vec<Vec<u8>> {
        let mut keys = Vec::new();
        self.iterate_prefix(prefix, &mut |key, _| {
            keys.push(key.to_vec());
            true
        });
        keys
    }
}

impl<T: KvStore + ?Sized> KvStore for &mut T {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &[u8], value: &[u8]) {
        (**self).set(key, value)
    }

    fn delete(&mut self, key: &[u8]) {
        (**self).delete(key)
    }

    fn iterate_prefix(&self, prefix: &[u8], visit: &mut dyn FnMut(&[u8], &[u8]) -> bool) {
        (**self).iterate_prefix(prefix, visit)
    }
}

/// In-memory ordered store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &[u8], value: &[u8]) {
        self.entries.insert(key.to_vec(), value.to_vec());
    }

    fn delete(&mut self, key: &[u8]) {
        self.entries.remove(key);
    }

    fn iterate_prefix(&self, prefix: &[u8], visit: &mut dyn FnMut(&[u8], &[u8]) -> bool) {
        for (key, value) in self.entries.range(prefix.to_vec()..) {
            if !key.starts_with(prefix) || !visit(key, value) {
                break;
            }
        }
    }
}
