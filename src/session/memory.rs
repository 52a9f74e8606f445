//! In-process document store
//!
//! Backs `--offline` runs and tests. Optionally mirrored to a JSON file so a
//! session started by one command can be resumed by the next.

use super::{Document, DocumentPath, DocumentStore, FieldValue, Fields, StoreError, StoreFuture};
use crate::util::write_atomic;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::warn;

type Documents = BTreeMap<DocumentPath, Fields>;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    docs: Arc<Mutex<Documents>>,
    file: Option<PathBuf>,
}

impl MemoryStore {
    /// Load documents from `path` (missing file = empty store) and write back on every change
    pub fn with_file(path: &Path) -> Result<Self, StoreError> {
        let docs = match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| StoreError::Malformed(format!("{}: {}", path.display(), e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Documents::new(),
            Err(e) => return Err(StoreError::Io(e)),
        };
        Ok(Self {
            docs: Arc::new(Mutex::new(docs)),
            file: Some(path.to_path_buf()),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Documents> {
        // A panic while holding the lock leaves plain data behind; keep serving it
        self.docs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, docs: &Documents) -> Result<(), StoreError> {
        let Some(path) = &self.file else {
            return Ok(());
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = serde_json::to_string_pretty(docs)
            .map_err(|e| StoreError::Malformed(e.to_string()))?;
        write_atomic(path, &content).map_err(|e| {
            warn!(path = %path.display(), error = %e, "failed to persist offline store");
            StoreError::Io(e)
        })
    }

    fn query_first_sync(&self, collection: &str, field: &str, value: &str) -> Option<Document> {
        let docs = self.lock();
        docs.iter()
            .filter(|(path, _)| path.collection() == collection)
            .find(|(_, fields)| {
                matches!(fields.get(field), Some(FieldValue::Text(v)) if v == value)
            })
            .map(|(path, fields)| Document {
                path: path.clone(),
                fields: fields.clone(),
            })
    }

    fn write_sync(&self, path: &DocumentPath, fields: Fields, merge: bool) -> Result<(), StoreError> {
        let mut docs = self.lock();
        // Only publish the change once it is on disk
        let mut next = docs.clone();
        if merge {
            next.entry(path.clone()).or_default().extend(fields);
        } else {
            next.insert(path.clone(), fields);
        }
        self.persist(&next)?;
        *docs = next;
        Ok(())
    }
}

impl DocumentStore for MemoryStore {
    fn query_first<'a>(
        &'a self,
        collection: &'a str,
        field: &'a str,
        value: &'a str,
    ) -> StoreFuture<'a, Option<Document>> {
        Box::pin(async move { Ok(self.query_first_sync(collection, field, value)) })
    }

    fn get<'a>(&'a self, path: &'a DocumentPath) -> StoreFuture<'a, Option<Document>> {
        Box::pin(async move {
            Ok(self.lock().get(path).map(|fields| Document {
                path: path.clone(),
                fields: fields.clone(),
            }))
        })
    }

    fn merge<'a>(&'a self, path: &'a DocumentPath, fields: Fields) -> StoreFuture<'a, ()> {
        Box::pin(async move { self.write_sync(path, fields, true) })
    }

    fn set<'a>(&'a self, path: &'a DocumentPath, fields: Fields) -> StoreFuture<'a, ()> {
        Box::pin(async move { self.write_sync(path, fields, false) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one(key: &str, value: &str) -> Fields {
        let mut fields = Fields::new();
        fields.insert(key.to_string(), FieldValue::from(value));
        fields
    }

    #[tokio::test]
    async fn test_query_first_filters_by_collection_and_value() {
        let store = MemoryStore::default();
        let a = DocumentPath::session_record("a");
        let b = DocumentPath::session_record("b");
        let other = DocumentPath::waitlist("x@example.com").expect("path");
        store.merge(&other, one("sessionId", "s1")).await.expect("write");
        store.merge(&b, one("sessionId", "s1")).await.expect("write");
        store.merge(&a, one("sessionId", "s2")).await.expect("write");

        let found = store
            .query_first("features", "sessionId", "s1")
            .await
            .expect("query")
            .expect("match");
        assert_eq!(found.path, b);
        assert!(store
            .query_first("features", "sessionId", "nope")
            .await
            .expect("query")
            .is_none());
    }

    #[tokio::test]
    async fn test_set_replaces_merge_extends() {
        let store = MemoryStore::default();
        let path = DocumentPath::session_record("d");
        store.merge(&path, one("a", "1")).await.expect("merge");
        store.merge(&path, one("b", "2")).await.expect("merge");
        assert_eq!(store.get(&path).await.expect("get").expect("doc").fields.len(), 2);

        store.set(&path, one("c", "3")).await.expect("set");
        let doc = store.get(&path).await.expect("get").expect("doc");
        assert_eq!(doc.fields.len(), 1);
        assert_eq!(doc.fields.get("c"), Some(&FieldValue::from("3")));
    }

    #[tokio::test]
    async fn test_last_write_wins_for_same_field() {
        let store = MemoryStore::default();
        let path = DocumentPath::session_record("d");
        store.merge(&path, one("hypothesis", "first")).await.expect("merge");
        store.merge(&path, one("hypothesis", "second")).await.expect("merge");
        let doc = store.get(&path).await.expect("get").expect("doc");
        assert_eq!(doc.fields.get("hypothesis"), Some(&FieldValue::from("second")));
    }

    #[tokio::test]
    async fn test_file_backed_store_survives_reload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("store.json");
        let path = DocumentPath::session_record("d");

        let store = MemoryStore::with_file(&file).expect("open");
        store.merge(&path, one("sessionId", "s1")).await.expect("merge");

        let reopened = MemoryStore::with_file(&file).expect("reopen");
        let doc = reopened.get(&path).await.expect("get").expect("doc");
        assert_eq!(doc.fields.get("sessionId"), Some(&FieldValue::from("s1")));
    }

    #[tokio::test]
    async fn test_failed_persist_leaves_store_unchanged() {
        let dir = tempfile::tempdir().expect("tempdir");
        let parent = dir.path().join("offline");
        let store = MemoryStore::with_file(&parent.join("store.json")).expect("open");
        // A regular file where the store's directory should be
        fs::write(&parent, "x").expect("write blocker");
        let path = DocumentPath::session_record("d");

        assert!(store.merge(&path, one("featureName", "X")).await.is_err());
        assert!(store.get(&path).await.expect("get").is_none());
        assert!(store
            .set(&path, one("featureName", "Y"))
            .await
            .is_err());
        assert!(store.get(&path).await.expect("get").is_none());
    }
}
