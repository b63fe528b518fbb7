//! File-backed adapters for the popularity engine.
//!
//! Responsibilities:
//! - Provide [`SnapshotStore`], a [`popularity_core::DocumentStore`] loaded
//!   from and persisted to a JSON export of the store's collections.
//! - Read change events recorded as JSON files.
//!
//! Boundaries:
//! - Do not encode scoring or trigger rules (live in `popularity-core` and
//!   `popularity-triggers`).
//! - File access goes through `cap-std` with ambient authority resolved once
//!   per path.
//!
//! Invariants:
//! - Every document held by a [`SnapshotStore`] has a valid
//!   [`popularity_core::DocumentPath`].
//! - No global mutable state.

#![forbid(unsafe_code)]

mod event;
mod fs;
mod snapshot;

use camino::Utf8Path;
use serde::de::DeserializeOwned;

pub use event::load_change_event;
pub use snapshot::{SnapshotError, SnapshotStore};

fn parse_json<T: DeserializeOwned>(raw: &str, origin: &Utf8Path) -> Result<T, SnapshotError> {
    serde_json::from_str(raw).map_err(|source| SnapshotError::Parse {
        path: origin.to_path_buf(),
        source,
    })
}
