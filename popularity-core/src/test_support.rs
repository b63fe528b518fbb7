//! Test-only, in-memory `DocumentStore` and clock used by unit and behaviour
//! tests across the workspace.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    Change, ChangeEvent, Clock, Document, DocumentPath, DocumentSnapshot, DocumentStore,
    StoreError,
};

/// In-memory `DocumentStore`.
///
/// Every successful update is recorded as a [`ChangeEvent`] in a journal,
/// mimicking the notifications the hosted store would emit. Tests drain the
/// journal to check what a handler wrote or to feed the writes back through
/// the dispatcher.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    collections: BTreeMap<String, BTreeMap<String, Document>>,
    journal: Vec<ChangeEvent>,
    rejected: BTreeSet<DocumentPath>,
    unavailable: bool,
}

impl MemoryState {
    fn document(&self, path: &DocumentPath) -> Option<&Document> {
        self.collections
            .get(path.collection())
            .and_then(|docs| docs.get(path.id()))
    }
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the store with `doc` placed at `path`, without journaling.
    #[must_use]
    pub fn with_document(self, path: &DocumentPath, doc: Document) -> Self {
        self.insert(path, doc);
        self
    }

    /// Place `doc` at `path`, replacing any existing document, without
    /// journaling.
    pub fn insert(&self, path: &DocumentPath, doc: Document) {
        self.lock()
            .collections
            .entry(path.collection().to_owned())
            .or_default()
            .insert(path.id().to_owned(), doc);
    }

    /// Current contents of the document at `path`.
    #[must_use]
    pub fn document(&self, path: &DocumentPath) -> Option<Document> {
        self.lock().document(path).cloned()
    }

    /// Make every subsequent update to `path` fail with
    /// [`StoreError::Rejected`].
    pub fn reject_writes_to(&self, path: &DocumentPath) {
        self.lock().rejected.insert(path.clone());
    }

    /// Make every subsequent operation fail with [`StoreError::Unavailable`].
    pub fn go_offline(&self) {
        self.lock().unavailable = true;
    }

    /// Remove and return the journaled change events.
    #[must_use]
    pub fn take_journal(&self) -> Vec<ChangeEvent> {
        std::mem::take(&mut self.lock().journal)
    }

    /// Number of journaled writes not yet taken.
    #[must_use]
    pub fn pending_writes(&self) -> usize {
        self.lock().journal.len()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn online(state: &MemoryState) -> Result<(), StoreError> {
        if state.unavailable {
            return Err(StoreError::Unavailable {
                message: "memory store is offline".to_owned(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        let state = self.lock();
        Self::online(&state)?;
        Ok(state.document(path).cloned())
    }

    async fn list(&self, collection: &str) -> Result<Vec<DocumentSnapshot>, StoreError> {
        let state = self.lock();
        Self::online(&state)?;
        let Some(docs) = state.collections.get(collection) else {
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
        let mut state = self.lock();
        Self::online(&state)?;
        if state.rejected.contains(path) {
            return Err(StoreError::Rejected {
                path: path.clone(),
                message: "write rejected by test store".to_owned(),
            });
        }
        let Some(current) = state
            .collections
            .get_mut(path.collection())
            .and_then(|docs| docs.get_mut(path.id()))
        else {
            return Err(StoreError::NotFound { path: path.clone() });
        };
        let before = current.clone();
        current.merge(fields);
        let after = current.clone();
        state
            .journal
            .push(ChangeEvent::new(path.clone(), Change::update(before, after)));
        Ok(())
    }
}

/// `Clock` frozen at a single instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    /// Freeze the clock at `now`.
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

/// Drive `future` to completion on a fresh current-thread runtime.
///
/// Behaviour-test steps are synchronous; this bridges them to the async
/// handlers.
///
/// # Panics
/// Panics when the runtime cannot be built.
#[expect(
    clippy::expect_used,
    reason = "test helper; a runtime that cannot start aborts the test"
)]
pub fn block_on_for_tests<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("test runtime should build")
        .block_on(future)
}
