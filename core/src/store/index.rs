//! Presence-only index store
//!
//! An [`IndexedStore`] is scoped to `index prefix | subject` and records which
//! objects are associated with that subject. Values are empty markers; the
//! object key itself is the information.

use crate::models::Address;
use super::KvStore;

const MARKER: &[u8] = &[];

/// Set of object keys associated with one index subject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedStore {
    scope: Vec<u8>,
}

impl IndexedStore {
    /// Scope an index store to `index_prefix | subject_key`
    pub fn new(index_prefix: &[u8], subject_key: &[u8]) -> Self {
        let mut scope = Vec::with_capacity(index_prefix.len() + subject_key.len());
        scope.extend_from_slice(index_prefix);
        scope.extend_from_slice(subject_key);
        IndexedStore { scope }
    }

    /// Index store whose subject is an owner address
    ///
    /// # Panics
    ///
    /// Panics on [`Address::NONE`]: nothing may be indexed under the
    /// "no owner" sentinel, so reaching this is a validation gap upstream.
    pub fn address_indexer(index_prefix: &[u8], address: &Address) -> Self {
        assert!(
            !address.is_none(),
            "cannot index under the empty owner address"
        );
        Self::new(index_prefix, address.as_bytes())
    }

    /// Index store whose subject is a plain string
    pub fn string_indexer(index_prefix: &[u8], subject: &str) -> Self {
        Self::new(index_prefix, subject.as_bytes())
    }

    fn full_key(&self, object_key: &[u8]) -> Vec<u8> {
        let mut key = Vec::with_capacity(self.scope.len() + object_key.len());
        key.extend_from_slice(&self.scope);
        key.extend_from_slice(object_key);
        key
    }

    /// Associate `object_key` with the subject; idempotent
    pub fn set<S: KvStore + ?Sized>(&self, store: &mut S, object_key: &[u8]) {
        store.set(&self.full_key(object_key), MARKER);
    }

    /// Remove the association, returning whether it existed
    pub fn delete<S: KvStore + ?Sized>(&self, store: &mut S, object_key: &[u8]) -> bool {
        let key = self.full_key(object_key);
        if !store.has(&key) {
            return false;
        }
        store.delete(&key);
        true
    }

    /// Whether `object_key` is associated with the subject
    pub fn contains<S: KvStore + ?Sized>(&self, store: &S, object_key: &[u8]) -> bool {
        store.has(&self.full_key(object_key))
    }

    /// Visit every object key in store order until `visit` returns false
    pub fn iterate_keys<S, F>(&self, store: &S, mut visit: F)
    where
        S: KvStore + ?Sized,
        F: FnMut(&[u8]) -> bool,
    {
        let scope_len = self.scope.len();
        store.iterate_prefix(&self.scope, &mut |key, _| visit(&key[scope_len..]));
    }

    /// Every object key, in store order
    pub fn keys<S: KvStore + ?Sized>(&self, store: &S) -> Vec<Vec<u8>> {
        let mut keys = Vec::new();
        self.iterate_keys(store, |key| {
            keys.push(key.to_vec());
            true
        });
        keys
    }
}
