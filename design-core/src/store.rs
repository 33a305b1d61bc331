//! Persistence collaborators for serialized design documents.
//!
//! A [`DesignStore`] maps a key (typically a product id) to the JSON text of
//! a [`crate::schema::DesignDocument`]. The engine never touches storage
//! directly; hosts pick an implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The internal lock was poisoned by a panicking thread.
    #[error("Lock poisoned")]
    LockPoisoned,
    /// Nothing is stored under the key.
    #[error("Document not found: {0}")]
    NotFound(String),
    /// The key cannot be mapped to a storage location.
    #[error("Invalid document key: {0:?}")]
    InvalidKey(String),
    /// An I/O error occurred during persistence.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Keyed storage for serialized documents.
#[async_trait]
pub trait DesignStore: Send + Sync {
    /// Fetch the document stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if nothing is stored under `key`.
    async fn load(&self, key: &str) -> Result<String, StoreError>;

    /// Store `document` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    async fn save(&self, key: &str, document: &str) -> Result<(), StoreError>;

    /// Keys currently stored, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be listed.
    async fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// Process-local store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DesignStore for MemoryStore {
    async fn load(&self, key: &str) -> Result<String, StoreError> {
        let documents = self.documents.read().map_err(|_| StoreError::LockPoisoned)?;
        documents
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn save(&self, key: &str, document: &str) -> Result<(), StoreError> {
        let mut documents = self.documents.write().map_err(|_| StoreError::LockPoisoned)?;
        documents.insert(key.to_string(), document.to_string());
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        let documents = self.documents.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut keys: Vec<String> = documents.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(feature = "fs")]
pub use directory::DirectoryStore;

#[cfg(feature = "fs")]
mod directory {
    use std::path::{Path, PathBuf};

    use async_trait::async_trait;

    use super::{sanitize_key, DesignStore, StoreError};

    /// Stores each document as `<key>.json` in a directory.
    #[derive(Debug, Clone)]
    pub struct DirectoryStore {
        root: PathBuf,
    }

    impl DirectoryStore {
        /// Store rooted at `root`. The directory is created on first save.
        #[must_use]
        pub fn new(root: impl Into<PathBuf>) -> Self {
            Self { root: root.into() }
        }

        /// Root directory.
        #[must_use]
        pub fn root(&self) -> &Path {
            &self.root
        }

        fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
            let name = sanitize_key(key)?;
            Ok(self.root.join(format!("{name}.json")))
        }
    }

    #[async_trait]
    impl DesignStore for DirectoryStore {
        async fn load(&self, key: &str) -> Result<String, StoreError> {
            let path = self.path_for(key)?;
            match tokio::fs::read_to_string(&path).await {
                Ok(text) => {
                    tracing::debug!(path = %path.display(), "loaded document");
                    Ok(text)
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    Err(StoreError::NotFound(key.to_string()))
                }
                Err(e) => Err(e.into()),
            }
        }

        async fn save(&self, key: &str, document: &str) -> Result<(), StoreError> {
            let path = self.path_for(key)?;
            tokio::fs::create_dir_all(&self.root).await?;
            // Write then rename so readers never see a torn file.
            let tmp = path.with_extension("json.tmp");
            tokio::fs::write(&tmp, document).await?;
            tokio::fs::rename(&tmp, &path).await?;
            tracing::debug!(path = %path.display(), bytes = document.len(), "saved document");
            Ok(())
        }

        async fn keys(&self) -> Result<Vec<String>, StoreError> {
            let mut entries = match tokio::fs::read_dir(&self.root).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(e.into()),
            };
            let mut keys = Vec::new();
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "json") {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        keys.push(stem.to_string());
                    }
                }
            }
            keys.sort();
            Ok(keys)
        }
    }
}

/// Map a key onto a safe file stem. Characters outside `[A-Za-z0-9_-]`
/// become `_`.
#[cfg_attr(not(feature = "fs"), allow(dead_code))]
fn sanitize_key(key: &str) -> Result<String, StoreError> {
    if key.is_empty() {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key("mug-01").expect("key"), "mug-01");
        assert_eq!(sanitize_key("../etc/passwd").expect("key"), "___etc_passwd");
        assert!(sanitize_key("").is_err());
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(matches!(store.load("a").await, Err(StoreError::NotFound(_))));
        store.save("b", "{}").await.expect("save");
        store.save("a", "[]").await.expect("save");
        assert_eq!(store.load("a").await.expect("load"), "[]");
        assert_eq!(store.keys().await.expect("keys"), vec!["a", "b"]);
    }

    #[cfg(feature = "fs")]
    #[tokio::test]
    async fn test_directory_store_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DirectoryStore::new(dir.path().join("designs"));
        assert!(store.keys().await.expect("keys").is_empty());
        assert!(matches!(store.load("mug").await, Err(StoreError::NotFound(_))));

        store.save("mug", r#"{"version":1}"#).await.expect("save");
        store.save("mug", r#"{"version":1,"title":"x"}"#).await.expect("overwrite");
        assert_eq!(
            store.load("mug").await.expect("load"),
            r#"{"version":1,"title":"x"}"#
        );
        assert_eq!(store.keys().await.expect("keys"), vec!["mug"]);
        assert!(dir.path().join("designs/mug.json").exists());
    }
}
