//! Object store abstraction.
//!
//! The upload pipeline touches storage through this trait so the reassembly
//! logic and the API handlers can run against R2 in production and against
//! [`MemoryStore`] in tests and local development.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{StorageError, StorageResult};

/// A stored object's key and size.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ObjectEntry {
    /// Object key
    pub key: String,
    /// Size in bytes
    pub size: u64,
}

/// Key-addressed binary storage.
///
/// Writes are last-write-wins per key; there is no locking or versioning
/// spanning multiple operations.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `bytes` under `key`, overwriting any existing object.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> StorageResult<()>;

    /// Read the object under `key` as raw bytes.
    async fn get(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Delete the given keys. Returns the number of keys submitted.
    async fn delete(&self, keys: &[String]) -> StorageResult<u32>;

    /// Check whether an object exists under `key`.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// List objects whose key starts with `prefix`.
    async fn list(&self, prefix: &str) -> StorageResult<Vec<ObjectEntry>>;

    /// Publicly resolvable locator for the object under `key`.
    fn public_url(&self, key: &str) -> String;
}

/// In-memory object store.
///
/// Used by the test suites and by the API's `STORAGE_BACKEND=memory` mode.
/// BTreeMap keeps listings in key order, matching S3 behavior.
#[derive(Default)]
pub struct MemoryStore {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> StorageResult<()> {
        self.objects.write().await.insert(key.to_string(), bytes);
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::not_found(key))
    }

    async fn delete(&self, keys: &[String]) -> StorageResult<u32> {
        let mut objects = self.objects.write().await;
        for key in keys {
            objects.remove(key);
        }
        Ok(keys.len() as u32)
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.objects.read().await.contains_key(key))
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<ObjectEntry>> {
        Ok(self
            .objects
            .read()
            .await
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| ObjectEntry {
                key: k.clone(),
                size: v.len() as u64,
            })
            .collect())
    }

    fn public_url(&self, key: &str) -> String {
        format!("memory://{}", key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let store = MemoryStore::new();
        store.put("a", b"hello".to_vec(), "text/plain").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let store = MemoryStore::new();
        store.put("a", b"first".to_vec(), "text/plain").await.unwrap();
        store.put("a", b"second".to_vec(), "text/plain").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), b"second");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store.get("nope").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_and_list() {
        let store = MemoryStore::new();
        store.put("x.chunk.0", vec![1], "b").await.unwrap();
        store.put("x.chunk.1", vec![2, 3], "b").await.unwrap();
        store.put("y", vec![4], "b").await.unwrap();

        let listed = store.list("x.").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].key, "x.chunk.0");
        assert_eq!(listed[1].size, 2);

        store.delete(&["x.chunk.0".to_string()]).await.unwrap();
        assert!(!store.exists("x.chunk.0").await.unwrap());
        assert!(store.exists("x.chunk.1").await.unwrap());
    }
}
