//! Load/save boundary for documents, keyed by page id.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagecraft_document::Document;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Page not found: {0}")]
    NotFound(String),

    #[error("Invalid page id: {0:?}")]
    InvalidPageId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Persistence failed: {0}")]
    PersistenceFailure(String),
}

/// Opaque persistence for page documents.
///
/// `save` followed by `load` of the same page id must return an equal
/// document.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn load(&self, page_id: &str) -> Result<Document, StorageError>;

    async fn save(&self, page_id: &str, document: &Document) -> Result<(), StorageError>;
}

/// In-memory store, shared between clones
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pages: Arc<RwLock<HashMap<String, Document>>>,
    saves: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub async fn contains(&self, page_id: &str) -> bool {
        self.pages.read().await.contains_key(page_id)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn load(&self, page_id: &str) -> Result<Document, StorageError> {
        self.pages
            .read()
            .await
            .get(page_id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(page_id.to_string()))
    }

    async fn save(&self, page_id: &str, document: &Document) -> Result<(), StorageError> {
        self.pages
            .write()
            .await
            .insert(page_id.to_string(), document.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredPage {
    page_id: String,
    saved_at: DateTime<Utc>,
    document: Document,
}

/// One JSON file per page under a root directory.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// crash mid-write never leaves a truncated page behind.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, page_id: &str) -> Result<PathBuf, StorageError> {
        let valid = !page_id.is_empty()
            && page_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::InvalidPageId(page_id.to_string()));
        }
        Ok(self.root.join(format!("{page_id}.json")))
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn load(&self, page_id: &str) -> Result<Document, StorageError> {
        let path = self.path_for(page_id)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(page_id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        let stored: StoredPage = serde_json::from_str(&content)?;
        debug!(page_id, path = %path.display(), "Loaded page");
        Ok(stored.document)
    }

    async fn save(&self, page_id: &str, document: &Document) -> Result<(), StorageError> {
        let path = self.path_for(page_id)?;
        tokio::fs::create_dir_all(&self.root).await?;

        let stored = StoredPage {
            page_id: page_id.to_string(),
            saved_at: Utc::now(),
            document: document.clone(),
        };
        let json = serde_json::to_string_pretty(&stored)?;

        let tmp = self.root.join(format!(".{page_id}.json.tmp"));
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(page_id, path = %path.display(), "Saved page");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_document::{Node, NodeId};

    fn sample() -> Document {
        Document::from_parts(
            vec![NodeId::from("a")],
            vec![Node::new(NodeId::from("a"), "Spacer")],
        )
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.load("home").await,
            Err(StorageError::NotFound(_))
        ));

        store.save("home", &sample()).await.unwrap();
        assert_eq!(store.load("home").await.unwrap(), sample());
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("pages"));

        store.save("home", &sample()).await.unwrap();
        assert!(dir.path().join("pages/home.json").exists());
        assert!(!dir.path().join("pages/.home.json.tmp").exists());
        assert_eq!(store.load("home").await.unwrap(), sample());
    }

    #[tokio::test]
    async fn test_file_store_missing_page() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(matches!(
            store.load("nope").await,
            Err(StorageError::NotFound(page)) if page == "nope"
        ));
    }

    #[test]
    fn test_page_id_sanitization() {
        let store = FileStore::new("/tmp/pages");
        assert!(store.path_for("landing_page-2").is_ok());
        for bad in ["", "../etc/passwd", "a/b", "a.json"] {
            assert!(matches!(
                store.path_for(bad),
                Err(StorageError::InvalidPageId(_))
            ));
        }
    }
}
