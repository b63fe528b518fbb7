//! Access to the managed document store.
//!
//! The [`DocumentStore`] trait is the only seam between the handlers and the
//! hosted database. It covers exactly what the handlers need: point reads,
//! whole-collection reads and partial updates.

use async_trait::async_trait;
use thiserror::Error;

use crate::{Document, DocumentPath, DocumentSnapshot};

/// Read and update documents in a hosted document store.
///
/// Implementations must be shareable across tasks because the parameter
/// handler issues updates concurrently.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use popularity_core::{Document, DocumentPath, DocumentSnapshot, DocumentStore, StoreError};
///
/// struct EmptyStore;
///
/// #[async_trait]
/// impl DocumentStore for EmptyStore {
///     async fn get(&self, _path: &DocumentPath) -> Result<Option<Document>, StoreError> {
///         Ok(None)
///     }
///
///     async fn list(&self, _collection: &str) -> Result<Vec<DocumentSnapshot>, StoreError> {
///         Ok(Vec::new())
///     }
///
///     async fn update(&self, path: &DocumentPath, _fields: Document) -> Result<(), StoreError> {
///         Err(StoreError::NotFound { path: path.clone() })
///     }
/// }
/// ```
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read the document at `path`, returning `None` when it does not exist.
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError>;

    /// Read every document in `collection`.
    async fn list(&self, collection: &str) -> Result<Vec<DocumentSnapshot>, StoreError>;

    /// Merge `fields` into the existing document at `path`.
    ///
    /// Implementations must return [`StoreError::NotFound`] rather than
    /// creating a missing document.
    async fn update(&self, path: &DocumentPath, fields: Document) -> Result<(), StoreError>;
}

/// Errors surfaced by [`DocumentStore`] implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// An update targeted a document that does not exist.
    #[error("document {path} does not exist")]
    NotFound {
        /// Requested document.
        path: DocumentPath,
    },
    /// The store refused a write to a specific document.
    #[error("write to {path} was rejected: {message}")]
    Rejected {
        /// Target document.
        path: DocumentPath,
        /// Reason reported by the store.
        message: String,
    },
    /// The store could not be reached or failed internally.
    #[error("document store unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },
}
