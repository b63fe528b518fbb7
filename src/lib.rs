//! Facade crate for the popularity engine.
//!
//! This crate re-exports the scoring model, the trigger handlers and, behind
//! the `store-snapshot` feature, the file-backed snapshot store.

#![forbid(unsafe_code)]

pub use popularity_core::{
    Change, ChangeError, ChangeEvent, ChangeKind, Clock, Document, DocumentError, DocumentPath,
    DocumentSnapshot, DocumentStore, FieldValue, PathError, PopularityParameters, StoreError,
    Suggestion, SystemClock, elapsed_days, elapsed_days_since, popularity,
};
pub use popularity_triggers::{
    ConfigError, DispatchOutcome, FanOutError, ItemChangeHandler, ItemError, ItemFailure,
    ItemOutcome, ParameterChangeHandler, ParameterRecomputation, SkipReason, TriggerConfig,
    TriggerDispatcher, TriggerError,
};

#[cfg(feature = "store-snapshot")]
pub use popularity_data::{SnapshotError, SnapshotStore, load_change_event};
