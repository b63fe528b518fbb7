//! JSON snapshot of a document store, served from memory.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use popularity_core::{
    Document, DocumentPath, DocumentSnapshot, DocumentStore, PathError, StoreError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fs;

/// Errors raised while reading or writing snapshot and event files.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Reading the file failed.
    #[error("failed to read {path}")]
    Read {
        /// File that could not be read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file was not valid JSON of the expected shape.
    #[error("failed to parse {path}")]
    Parse {
        /// File that could not be parsed.
        path: Utf8PathBuf,
        /// Source error produced by `serde_json`.
        #[source]
        source: serde_json::Error,
    },
    /// A collection name or document id could not form a document path.
    #[error("snapshot holds an invalid document {collection:?}/{id:?}")]
    InvalidDocument {
        /// Collection key as stored.
        collection: String,
        /// Document key as stored.
        id: String,
        /// Why the pair was rejected.
        #[source]
        source: PathError,
    },
    /// Serializing the snapshot failed.
    #[error("failed to serialize snapshot")]
    Serialize {
        /// Source error produced by `serde_json`.
        #[source]
        source: serde_json::Error,
    },
    /// Creating the destination's parent directory failed.
    #[error("failed to create parent directory of {path}")]
    CreateDirectory {
        /// Destination whose parent could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Writing the destination file failed.
    #[error("failed to write {path}")]
    Write {
        /// Destination file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

type Collections = BTreeMap<String, BTreeMap<String, Document>>;

#[derive(Debug, Default, Serialize, Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    collections: Collections,
}

/// [`DocumentStore`] backed by a JSON snapshot of every collection.
///
/// The file is read once by [`SnapshotStore::load`]; reads and updates then
/// operate on memory until [`SnapshotStore::persist`] writes the state back.
///
/// ```json
/// {"collections": {"Suggestions": {"a": {"likes": {"integerValue": 10}}}}}
/// ```
#[derive(Debug, Default)]
pub struct SnapshotStore {
    collections: Mutex<Collections>,
}

impl SnapshotStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the snapshot file at `path`.
    ///
    /// # Errors
    /// Returns [`SnapshotError`] when the file cannot be read, is not a
    /// snapshot, or holds keys that are not valid path segments.
    pub fn load(path: &Utf8Path) -> Result<Self, SnapshotError> {
        let raw = fs::read_to_string(path).map_err(|source| SnapshotError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self::parse(&raw, path)?;
        info!("loaded {} documents from {path}", store.document_count());
        Ok(store)
    }

    /// Parse a snapshot from JSON text.
    ///
    /// # Errors
    /// Returns [`SnapshotError::Parse`] for malformed JSON and
    /// [`SnapshotError::InvalidDocument`] for keys that cannot form a path.
    pub fn from_json(raw: &str) -> Result<Self, SnapshotError> {
        Self::parse(raw, Utf8Path::new("<inline>"))
    }

    fn parse(raw: &str, origin: &Utf8Path) -> Result<Self, SnapshotError> {
        let file: SnapshotFile = crate::parse_json(raw, origin)?;
        for (collection, docs) in &file.collections {
            for id in docs.keys() {
                DocumentPath::new(collection.as_str(), id.as_str()).map_err(|source| {
                    SnapshotError::InvalidDocument {
                        collection: collection.clone(),
                        id: id.clone(),
                        source,
                    }
                })?;
            }
        }
        Ok(Self {
            collections: Mutex::new(file.collections),
        })
    }

    /// Render the current state as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns [`SnapshotError::Serialize`] when serialization fails.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        let file = SnapshotFile {
            collections: self.lock().clone(),
        };
        serde_json::to_string_pretty(&file).map_err(|source| SnapshotError::Serialize { source })
    }

    /// Write the current state to `path`, creating parent directories.
    ///
    /// # Errors
    /// Returns [`SnapshotError`] when serialization, directory creation or
    /// the write fails.
    pub fn persist(&self, path: &Utf8Path) -> Result<(), SnapshotError> {
        let json = self.to_json()?;
        fs::ensure_parent_dir(path).map_err(|source| SnapshotError::CreateDirectory {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write_atomically(path, json.as_bytes()).map_err(|source| SnapshotError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!("persisted {} documents to {path}", self.document_count());
        Ok(())
    }

    /// Place `doc` at `path`, replacing any existing document.
    pub fn insert(&self, path: &DocumentPath, doc: Document) {
        self.lock()
            .entry(path.collection().to_owned())
            .or_default()
            .insert(path.id().to_owned(), doc);
    }

    /// Drop the document at `path`, if present.
    pub fn remove(&self, path: &DocumentPath) {
        let mut collections = self.lock();
        if let Some(docs) = collections.get_mut(path.collection()) {
            docs.remove(path.id());
        }
    }

    /// Current contents of the document at `path`.
    #[must_use]
    pub fn document(&self, path: &DocumentPath) -> Option<Document> {
        self.lock()
            .get(path.collection())
            .and_then(|docs| docs.get(path.id()))
            .cloned()
    }

    /// Total number of documents across all collections.
    #[must_use]
    pub fn document_count(&self) -> usize {
        self.lock().values().map(BTreeMap::len).sum()
    }

    fn lock(&self) -> MutexGuard<'_, Collections> {
        self.collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl DocumentStore for SnapshotStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        Ok(self.document(path))
    }

    async fn list(&self, collection: &str) -> Result<Vec<DocumentSnapshot>, StoreError> {
        let collections = self.lock();
        let Some(docs) = collections.get(collection) else {
            debug!("collection {collection} is empty");
            return Ok(Vec::new());
        };
        docs.iter()
            .map(|(id, fields)| {
                DocumentPath::new(collection, id.as_str())
                    .map(|path| DocumentSnapshot::new(path, fields.clone()))
                    .map_err(|err| StoreError::Unavailable {
                        message: err.to_string(),
                    })
            })
            .collect()
    }

    async fn update(&self, path: &DocumentPath, fields: Document) -> Result<(), StoreError> {
        let mut collections = self.lock();
        let current = collections
            .get_mut(path.collection())
            .and_then(|docs| docs.get_mut(path.id()))
            .ok_or_else(|| StoreError::NotFound { path: path.clone() })?;
        current.merge(fields);
        debug!("updated {path}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    const SNAPSHOT: &str = r#"{
        "collections": {
            "Suggestions": {
                "a": {"likes": {"integerValue": 10}},
                "b": {"likes": {"integerValue": 3}}
            }
        }
    }"#;

    #[fixture]
    fn store() -> SnapshotStore {
        SnapshotStore::from_json(SNAPSHOT).expect("snapshot parses")
    }

    fn path(raw: &str) -> DocumentPath {
        raw.parse().expect("valid path")
    }

    #[rstest]
    #[tokio::test]
    async fn lists_collection_in_id_order(store: SnapshotStore) {
        let docs = store.list("Suggestions").await.expect("list succeeds");
        let ids: Vec<&str> = docs.iter().map(|doc| doc.path.id()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[rstest]
    #[tokio::test]
    async fn update_merges_fields(store: SnapshotStore) {
        store
            .update(
                &path("Suggestions/a"),
                Document::new().with_field("popularity", 1.5_f64),
            )
            .await
            .expect("update succeeds");
        let doc = store.document(&path("Suggestions/a")).expect("exists");
        assert_eq!(doc.number("likes"), Some(10.0));
        assert_eq!(doc.number("popularity"), Some(1.5));
    }

    #[rstest]
    #[tokio::test]
    async fn update_of_missing_document_is_not_found(store: SnapshotStore) {
        let err = store
            .update(&path("Suggestions/zz"), Document::new())
            .await
            .expect_err("document is missing");
        assert_eq!(
            err,
            StoreError::NotFound {
                path: path("Suggestions/zz")
            }
        );
    }

    #[rstest]
    #[tokio::test]
    async fn non_finite_scores_survive_a_round_trip(store: SnapshotStore) {
        store
            .update(
                &path("Suggestions/a"),
                Document::new().with_field("popularity", f64::INFINITY),
            )
            .await
            .expect("update succeeds");
        store
            .update(
                &path("Suggestions/b"),
                Document::new().with_field("popularity", f64::NAN),
            )
            .await
            .expect("update succeeds");

        let json = store.to_json().expect("snapshot serializes");
        let reloaded = SnapshotStore::from_json(&json).expect("snapshot reloads");

        let infinite = reloaded
            .document(&path("Suggestions/a"))
            .and_then(|doc| doc.number("popularity"));
        assert_eq!(infinite, Some(f64::INFINITY));
        let undefined = reloaded
            .document(&path("Suggestions/b"))
            .and_then(|doc| doc.number("popularity"));
        assert!(undefined.is_some_and(f64::is_nan));
    }

    #[rstest]
    fn remove_drops_only_the_named_document(store: SnapshotStore) {
        store.remove(&path("Suggestions/a"));
        store.remove(&path("Missing/x"));
        assert!(store.document(&path("Suggestions/a")).is_none());
        assert_eq!(store.document_count(), 1);
    }

    #[rstest]
    fn empty_object_is_an_empty_snapshot() {
        let store = SnapshotStore::from_json("{}").expect("snapshot parses");
        assert_eq!(store.document_count(), 0);
    }

    #[rstest]
    fn nested_ids_are_rejected() {
        let err = SnapshotStore::from_json(r#"{"collections": {"Suggestions": {"a/b": {}}}}"#)
            .expect_err("nested id");
        assert!(matches!(err, SnapshotError::InvalidDocument { .. }));
    }

    #[rstest]
    fn malformed_json_is_a_parse_error() {
        let err = SnapshotStore::from_json("[").expect_err("not a snapshot");
        assert!(matches!(err, SnapshotError::Parse { .. }));
    }
}
