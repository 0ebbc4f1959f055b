use super::memory::{Collections, MemoryDocumentStore};
use super::{Document, DocumentStore, Fields, Query, SetMode, StoreError};
use async_trait::async_trait;
use bincode::{deserialize, serialize};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Gzip-compressed bincode snapshot of every collection.
struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    fn load(&self) -> Result<Collections, StoreError> {
        if !self.path.exists() {
            debug!("Store snapshot {:?} does not exist, starting empty", self.path);
            return Ok(Collections::new());
        }

        let data = std::fs::read(&self.path)?;
        let mut decoder = GzDecoder::new(&data[..]);
        let mut decoded = Vec::new();
        decoder.read_to_end(&mut decoded)?;

        match deserialize::<Collections>(&decoded) {
            Ok(collections) => Ok(collections),
            Err(e) => {
                // Unreadable snapshot: keep a copy and start over
                let backup_path = self.path.with_extension("bin.bak");
                if let Err(backup_err) = std::fs::copy(&self.path, &backup_path) {
                    warn!("Failed to back up unreadable store snapshot: {}", backup_err);
                } else {
                    info!(
                        "Store snapshot unreadable ({}). Backed up to {:?} and starting empty.",
                        e, backup_path
                    );
                }
                Ok(Collections::new())
            }
        }
    }

    fn save(&self, collections: &Collections) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let serialized = serialize(collections)?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&serialized)?;
        let encoded = encoder.finish()?;

        // write to temp file, then rename
        let temp_path = self.path.with_extension("tmp");
        std::fs::write(&temp_path, encoded)?;
        std::fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

/// Document store kept in memory and snapshotted to disk after every write.
pub struct LocalDocumentStore {
    inner: MemoryDocumentStore,
    file: SnapshotFile,
    write_lock: Mutex<()>,
}

impl LocalDocumentStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let file = SnapshotFile { path: path.to_path_buf() };
        let collections = file.load()?;
        info!(
            "Opened local store {:?} ({} collections)",
            path,
            collections.len()
        );
        Ok(Self {
            inner: MemoryDocumentStore::from_collections(collections),
            file,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.file.path
    }

    /// Snapshot to disk. When that fails the document goes back to
    /// `previous`, so memory never holds a change the file lacks.
    async fn persist_or_restore(&self, collection: &str, id: &str, previous: Option<Document>) -> Result<(), StoreError> {
        let snapshot = self.inner.snapshot().await;
        if let Err(e) = self.file.save(&snapshot) {
            warn!("Failed to persist store snapshot, reverting {}/{}: {}", collection, id, e);
            self.inner
                .restore(collection, id, previous.map(|doc| doc.fields))
                .await;
            return Err(e);
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for LocalDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.inner.get(collection, id).await
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields, mode: SetMode) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let previous = self.inner.get(collection, id).await?;
        self.inner.set(collection, id, fields, mode).await?;
        self.persist_or_restore(collection, id, previous).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let previous = self.inner.get(collection, id).await?;
        self.inner.delete(collection, id).await?;
        self.persist_or_restore(collection, id, previous).await
    }

    async fn increment(&self, collection: &str, id: &str, deltas: &[(&str, i64)]) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let previous = self.inner.get(collection, id).await?;
        self.inner.increment(collection, id, deltas).await?;
        self.persist_or_restore(collection, id, previous).await
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        self.inner.query(collection, query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{fields, FieldValue};
    use chrono::Utc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_writes_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("store.bin");
        let now = Utc::now();

        {
            let store = LocalDocumentStore::open(&path).unwrap();
            store
                .set(
                    "myList",
                    "u1_42",
                    fields([("userId", FieldValue::from("u1")), ("addedAt", FieldValue::from(now))]),
                    SetMode::Overwrite,
                )
                .await
                .unwrap();
            store.increment("content", "42", &[("viewCount", 2)]).await.unwrap();
        }

        let reopened = LocalDocumentStore::open(&path).unwrap();
        let doc = reopened.get("myList", "u1_42").await.unwrap().unwrap();
        assert_eq!(doc.get_str("userId"), Some("u1"));
        assert_eq!(doc.get_timestamp("addedAt"), Some(now));
        let counters = reopened.get("content", "42").await.unwrap().unwrap();
        assert_eq!(counters.get_i64("viewCount"), Some(2));
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_backed_up() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.bin");
        std::fs::write(&path, b"definitely not gzip").unwrap();

        // gzip header failure surfaces as an error rather than data loss
        assert!(LocalDocumentStore::open(&path).is_err());

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"\xff\xff\xff\xff\xff\xff\xff\xff\xff").unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();

        let store = LocalDocumentStore::open(&path).unwrap();
        assert!(store.get("likes", "x").await.unwrap().is_none());
        assert!(path.with_extension("bin.bak").exists());
    }

    #[tokio::test]
    async fn test_failed_snapshot_reverts_write() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();
        // the snapshot's parent is a file, so every save fails
        let store = LocalDocumentStore::open(&blocker.join("store.bin")).unwrap();

        let err = store
            .set("likes", "u1_42", fields([("userId", "u1")]), SetMode::Overwrite)
            .await;
        assert!(matches!(err, Err(StoreError::Persistence(_))));
        assert!(store.get("likes", "u1_42").await.unwrap().is_none());

        assert!(store.increment("content", "42", &[("likeCount", 1)]).await.is_err());
        assert!(store.get("content", "42").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let store = LocalDocumentStore::open(&dir.path().join("none.bin")).unwrap();
        assert!(store.query("likes", &Query::new()).await.unwrap().is_empty());
    }
}
