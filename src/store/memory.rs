// src/store/memory.rs

//! In-memory record store
//!
//! Backs tests and ephemeral use. Every call yields to the scheduler once
//! before touching the map, so concurrently issued writes interleave the way
//! they would against a remote store.

use super::{Record, Table};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// An ordered in-memory table for one record kind
pub struct MemoryTable<R: Record> {
    records: Mutex<BTreeMap<R::Key, R>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    failing_keys: Mutex<BTreeSet<R::Key>>,
}

impl<R: Record> MemoryTable<R> {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            failing_keys: Mutex::new(BTreeSet::new()),
        }
    }

    /// Number of `get` and `find_all` calls served
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `create` and `remove` calls that were applied
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of records currently held
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    /// Make every subsequent `get` and `find_all` fail with a store error
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent write fail with a store error
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make writes to one key fail with a store error
    pub fn fail_key(&self, key: R::Key) {
        if let Ok(mut keys) = self.failing_keys.lock() {
            keys.insert(key);
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<R::Key, R>>> {
        self.records.lock().map_err(|_| Error::LockPoisoned)
    }

    fn check_read(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::Store(format!("{} read rejected", R::KIND)));
        }
        Ok(())
    }

    fn check_write(&self, key: &R::Key) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Store(format!("{} write rejected", R::KIND)));
        }
        let failing = self
            .failing_keys
            .lock()
            .map_err(|_| Error::LockPoisoned)?
            .contains(key);
        if failing {
            return Err(Error::Store(format!("{} write rejected for {:?}", R::KIND, key)));
        }
        Ok(())
    }
}

impl<R: Record> Default for MemoryTable<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: Record> Table<R> for MemoryTable<R> {
    async fn create(&self, record: R) -> Result<R> {
        tokio::task::yield_now().await;
        let key = record.key();
        self.check_write(&key)?;

        debug!("{} create {:?}", R::KIND, key);
        self.lock()?.insert(key, record.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(record)
    }

    async fn get(&self, key: &R::Key) -> Result<Option<R>> {
        tokio::task::yield_now().await;
        self.check_read()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.lock()?.get(key).cloned())
    }

    async fn find_all(&self, scope: &R::Scope) -> Result<Vec<R>> {
        tokio::task::yield_now().await;
        self.check_read()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        let records = self
            .lock()?
            .values()
            .filter(|record| record.in_scope(scope))
            .cloned()
            .collect();
        Ok(records)
    }

    async fn remove(&self, key: &R::Key) -> Result<()> {
        tokio::task::yield_now().await;
        self.check_write(key)?;

        debug!("{} remove {:?}", R::KIND, key);
        self.lock()?.remove(key);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Dependent, DependentKey, VersionKey};

    fn dep(version: &str, name: &str, dependent_version: &str) -> Dependent {
        Dependent::new(
            "release-test".to_string(),
            version.to_string(),
            name.to_string(),
            dependent_version.to_string(),
        )
    }

    #[tokio::test]
    async fn test_create_overwrites_same_key() {
        let table = MemoryTable::<Dependent>::new();
        table.create(dep("1.0.0", "a", "1.0.0")).await.unwrap();
        table.create(dep("1.0.0", "a", "2.0.0")).await.unwrap();

        let found = table
            .get(&DependentKey::new("release-test", "1.0.0", "a"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.dependent_version, "2.0.0");
        assert_eq!(table.len().unwrap(), 1);
        assert_eq!(table.writes(), 2);
    }

    #[tokio::test]
    async fn test_find_all_filters_by_scope() {
        let table = MemoryTable::<Dependent>::new();
        table.create(dep("1.0.0", "a", "1.0.0")).await.unwrap();
        table.create(dep("1.0.0", "b", "1.0.0")).await.unwrap();
        table.create(dep("2.0.0", "a", "1.0.0")).await.unwrap();

        let found = table
            .find_all(&VersionKey::new("release-test", "1.0.0"))
            .await
            .unwrap();
        assert_eq!(found.len(), 2);

        let none = table
            .find_all(&VersionKey::new("release-test", "3.0.0"))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let table = MemoryTable::<Dependent>::new();
        let key = DependentKey::new("release-test", "1.0.0", "missing");
        table.remove(&key).await.unwrap();
        table.remove(&key).await.unwrap();
        assert!(table.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_fault_injection() {
        let table = MemoryTable::<Dependent>::new();
        table.fail_key(DependentKey::new("release-test", "1.0.0", "bad"));

        assert!(table.create(dep("1.0.0", "good", "1.0.0")).await.is_ok());
        let err = table.create(dep("1.0.0", "bad", "1.0.0")).await.unwrap_err();
        assert!(matches!(err, Error::Store(_)));

        table.fail_writes(true);
        assert!(table.create(dep("1.0.0", "good", "2.0.0")).await.is_err());
        assert_eq!(table.writes(), 1);
    }

    #[tokio::test]
    async fn test_read_fault_injection() {
        let table = MemoryTable::<Dependent>::new();
        table.create(dep("1.0.0", "a", "1.0.0")).await.unwrap();
        table.fail_reads(true);

        let key = DependentKey::new("release-test", "1.0.0", "a");
        assert!(matches!(table.get(&key).await, Err(Error::Store(_))));
        assert_eq!(table.reads(), 0);

        // Writes are unaffected
        table.remove(&key).await.unwrap();
        assert!(table.is_empty().unwrap());
    }
}
