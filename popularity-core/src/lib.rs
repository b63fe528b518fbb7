//! Core domain types for the popularity engine.
//!
//! Responsibilities:
//! - Model schemaless store documents ([`Document`], [`FieldValue`]) and the
//!   typed records read from them ([`PopularityParameters`], [`Suggestion`]).
//! - Describe change notifications delivered by the hosting platform
//!   ([`Change`], [`ChangeEvent`]).
//! - Provide the time-decayed popularity formula and the elapsed-days helper.
//! - Define the [`DocumentStore`] seam consumed by the trigger handlers.
//!
//! Boundaries:
//! - No I/O lives here; adapters belong in `popularity-data`.
//! - No handler logic; see `popularity-triggers`.
//!
//! # Examples
//!
//! ```
//! use popularity_core::{PopularityParameters, popularity};
//!
//! let params = PopularityParameters::new(2.0, 1.5);
//! let score = popularity(10.0, 1.0, params.time_offset, params.gravity);
//! assert!((score - 1.9245).abs() < 1e-4);
//! ```

#![forbid(unsafe_code)]

mod change;
mod clock;
mod document;
mod formula;
mod records;
mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use change::{Change, ChangeError, ChangeEvent, ChangeKind};
pub use clock::{Clock, SystemClock};
pub use document::{Document, DocumentError, DocumentPath, DocumentSnapshot, FieldValue, PathError};
pub use formula::{MILLIS_PER_DAY, elapsed_days, elapsed_days_since, popularity};
pub use records::{PopularityParameters, Suggestion};
pub use store::{DocumentStore, StoreError};
