//! Error types raised by the trigger handlers.

use std::fmt;

use popularity_core::{DocumentError, DocumentPath, PathError, StoreError};
use thiserror::Error;

/// Errors raised while building handlers from a [`crate::TriggerConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The parameter document path was malformed.
    #[error("invalid parameter document: {0}")]
    InvalidParametersPath(#[from] PathError),
    /// The item collection name was empty or nested.
    #[error("invalid item collection {name:?}")]
    InvalidCollection {
        /// Name as configured.
        name: String,
    },
    /// The fan-out limit was zero.
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
}

/// Errors that abort a handler invocation.
#[derive(Debug, Error)]
pub enum TriggerError {
    /// The singleton parameter document could not be found.
    #[error("parameter document {path} does not exist")]
    MissingParameters {
        /// Configured parameter document.
        path: DocumentPath,
    },
    /// A change that must carry an after state did not.
    #[error("change to {path} has no after state")]
    MissingAfterState {
        /// Document the change addressed.
        path: DocumentPath,
    },
    /// A document lacked a field the handler needs.
    #[error(transparent)]
    Document(#[from] DocumentError),
    /// The store failed a read or write.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// One or more updates of a full recompute failed.
    #[error(transparent)]
    FanOut(#[from] FanOutError),
}

/// Reason a single item could not be rescored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    /// The item document lacked a scoring input.
    #[error(transparent)]
    Document(#[from] DocumentError),
    /// Writing the new score failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ItemError> for TriggerError {
    fn from(error: ItemError) -> Self {
        match error {
            ItemError::Document(source) => Self::Document(source),
            ItemError::Store(source) => Self::Store(source),
        }
    }
}

/// A failed update within a full recompute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    /// Item that was not updated.
    pub path: DocumentPath,
    /// Why it was not updated.
    pub error: ItemError,
}

/// Aggregate outcome of a full recompute in which some updates failed.
///
/// Updates that succeeded stay written; there is no rollback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct FanOutError {
    /// Number of items whose popularity was written.
    pub updated: usize,
    /// Every item that was not updated.
    pub failures: Vec<ItemFailure>,
}

impl FanOutError {
    /// Number of items the recompute attempted.
    #[must_use]
    pub const fn attempted(&self) -> usize {
        self.updated.saturating_add(self.failures.len())
    }
}

impl fmt::Display for FanOutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} popularity updates failed",
            self.failures.len(),
            self.attempted()
        )?;
        for (index, failure) in self.failures.iter().enumerate() {
            let separator = if index == 0 { ": " } else { "; " };
            write!(f, "{separator}{} ({})", failure.path, failure.error)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn path(raw: &str) -> DocumentPath {
        raw.parse().expect("valid path")
    }

    #[rstest]
    fn fan_out_message_names_every_failed_item() {
        let error = FanOutError {
            updated: 3,
            failures: vec![
                ItemFailure {
                    path: path("Suggestions/b"),
                    error: ItemError::Document(DocumentError::MissingField {
                        path: path("Suggestions/b"),
                        field: "likes",
                    }),
                },
                ItemFailure {
                    path: path("Suggestions/d"),
                    error: ItemError::Store(StoreError::Unavailable {
                        message: "offline".to_owned(),
                    }),
                },
            ],
        };
        assert_eq!(
            error.to_string(),
            "2 of 5 popularity updates failed: \
             Suggestions/b (document Suggestions/b has no `likes` field); \
             Suggestions/d (document store unavailable: offline)"
        );
    }
}
