//! Durable client-local storage seam.
//!
//! The cart store only needs a tiny key-value contract: read one record and
//! overwrite it. The storefront backs it with the visitor's session record;
//! tests use [`MemoryStorage`].

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use thiserror::Error;

/// Errors from a [`ClientStorage`] backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The backend could not be reached or refused the operation.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The record would not fit in the space the backend allows.
    #[error("storage quota exceeded ({size} bytes, limit {limit})")]
    QuotaExceeded {
        /// Size of the rejected record.
        size: usize,
        /// Maximum record size.
        limit: usize,
    },
}

/// Per-client key-value storage that survives page reloads.
///
/// Operations are awaited to completion before the caller continues, so
/// from the cart's point of view they are synchronous.
pub trait ClientStorage: Send + Sync {
    /// Read the record stored under `key`, if any.
    fn read(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Overwrite the record stored under `key`.
    fn write(&self, key: &str, value: String)
    -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// In-process storage.
///
/// Clones share the same records, which makes a clone the natural way to
/// simulate the same browser coming back after a reload. Failures can be
/// switched on to exercise degraded operation.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    records: Mutex<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    quota: Mutex<Option<usize>>,
}

impl MemoryStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent read fail (storage disabled).
    pub fn fail_reads(&self, fail: bool) {
        self.inner.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent write fail (storage disabled).
    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Reject records larger than `limit` bytes.
    pub fn set_quota(&self, limit: Option<usize>) {
        if let Ok(mut quota) = self.inner.quota.lock() {
            *quota = limit;
        }
    }

    /// Store a raw record directly, bypassing quota and failure switches.
    pub fn insert_raw(&self, key: &str, value: &str) {
        if let Ok(mut records) = self.inner.records.lock() {
            records.insert(key.to_string(), value.to_string());
        }
    }

    /// Raw record under `key`, bypassing failure switches.
    #[must_use]
    pub fn get_raw(&self, key: &str) -> Option<String> {
        self.inner
            .records
            .lock()
            .ok()
            .and_then(|records| records.get(key).cloned())
    }

    fn poisoned() -> StorageError {
        StorageError::Unavailable("memory storage lock poisoned".to_string())
    }
}

impl ClientStorage for MemoryStorage {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.inner.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("reads disabled".to_string()));
        }
        let records = self.inner.records.lock().map_err(|_| Self::poisoned())?;
        Ok(records.get(key).cloned())
    }

    async fn write(&self, key: &str, value: String) -> Result<(), StorageError> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("writes disabled".to_string()));
        }
        let limit = *self.inner.quota.lock().map_err(|_| Self::poisoned())?;
        if let Some(limit) = limit {
            if value.len() > limit {
                return Err(StorageError::QuotaExceeded {
                    size: value.len(),
                    limit,
                });
            }
        }
        let mut records = self.inner.records.lock().map_err(|_| Self::poisoned())?;
        records.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clones_share_records() {
        let storage = MemoryStorage::new();
        let other = storage.clone();

        storage.write("k", "v".to_string()).await.unwrap();
        assert_eq!(other.read("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(other.read("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failure_switches() {
        let storage = MemoryStorage::new();
        storage.fail_reads(true);
        assert!(matches!(
            storage.read("k").await,
            Err(StorageError::Unavailable(_))
        ));

        storage.fail_writes(true);
        assert!(storage.write("k", "v".to_string()).await.is_err());
        assert_eq!(storage.get_raw("k"), None);
    }

    #[tokio::test]
    async fn test_quota() {
        let storage = MemoryStorage::new();
        storage.set_quota(Some(4));
        assert!(storage.write("k", "1234".to_string()).await.is_ok());
        assert_eq!(
            storage.write("k", "12345".to_string()).await,
            Err(StorageError::QuotaExceeded { size: 5, limit: 4 })
        );
        assert_eq!(storage.get_raw("k").as_deref(), Some("1234"));
    }
}
