//! Directory backend contract.
//!
//! The directory stores data about an appfile across runs. The core treats
//! it as opaque: it only threads the backend through the shared context
//! into plugin implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

/// Directory backend errors
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory backend failure: {0}")]
    Backend(String),
}

/// Keyed blob storage shared by plugin implementations.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Store a value under `key`, replacing any previous value.
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), DirectoryError>;

    /// Fetch the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, DirectoryError>;

    /// Remove the value stored under `key`; returns whether one existed.
    async fn delete(&self, key: &str) -> Result<bool, DirectoryError>;
}

/// In-memory implementation for development and testing
pub struct InMemoryDirectory {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryDirectory {
    /// Create a new empty in-memory directory
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), DirectoryError> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, DirectoryError> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<bool, DirectoryError> {
        let mut entries = self.entries.write().await;
        Ok(entries.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_delete_round_trip() {
        tokio_test::block_on(async {
            let dir = InMemoryDirectory::new();

            dir.put("deploy/web", b"state".to_vec()).await.expect("put");
            assert_eq!(
                dir.get("deploy/web").await.expect("get"),
                Some(b"state".to_vec())
            );

            assert!(dir.delete("deploy/web").await.expect("delete"));
            assert!(!dir.delete("deploy/web").await.expect("delete again"));
            assert_eq!(dir.get("deploy/web").await.expect("get"), None);
        });
    }
}
