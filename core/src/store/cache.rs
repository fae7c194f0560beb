//! Write-buffering store branch
//!
//! A [`CacheStore`] records writes on top of a parent store. Nothing reaches
//! the parent until [`CacheStore::write`] is called; dropping the branch
//! discards every buffered write.

use std::collections::BTreeMap;

use super::KvStore;

/// Store branch buffering writes over a parent store
#[derive(Debug)]
pub struct CacheStore<P: KvStore> {
    parent: P,
    /// `None` marks a buffered delete
    dirty: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<P: KvStore> CacheStore<P> {
    /// Create a branch over `parent`
    pub fn new(parent: P) -> Self {
        CacheStore {
            parent,
            dirty: BTreeMap::new(),
        }
    }

    /// Number of buffered writes
    pub fn pending(&self) -> usize {
        self.dirty.len()
    }

    /// Apply every buffered write to the parent, in key order
    pub fn write(mut self) -> P {
        for (key, value) in std::mem::take(&mut self.dirty) {
            match value {
                Some(value) => self.parent.set(&key, &value),
                None => self.parent.delete(&key),
            }
        }
        self.parent
    }
}

impl<P: KvStore> KvStore for CacheStore<P> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.dirty.get(key) {
            Some(value) => value.clone(),
            None => self.parent.get(key),
        }
    }

    fn set(&mut self, key: &[u8], value: &[u8]) {
        self.dirty.insert(key.to_vec(), Some(value.to_vec()));
    }

    fn delete(&mut self, key: &[u8]) {
        self.dirty.insert(key.to_vec(), None);
    }

    fn iterate_prefix(&self, prefix: &[u8], visit: &mut dyn FnMut(&[u8], &[u8]) -> bool) {
        let mut merged = BTreeMap::new();
        self.parent.iterate_prefix(prefix, &mut |key, value| {
            merged.insert(key.to_vec(), value.to_vec());
            true
        });
        for (key, value) in self.dirty.range(prefix.to_vec()..) {
            if !key.starts_with(prefix) {
                break;
            }
            match value {
                Some(value) => merged.insert(key.clone(), value.clone()),
                None => merged.remove(key),
            };
        }
        for (key, value) in &merged {
            if !visit(key, value) {
                break;
            }
        }
    }
}
