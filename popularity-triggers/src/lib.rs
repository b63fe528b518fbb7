//! Change handlers that keep item popularity scores current.
//!
//! Two triggers are registered by [`TriggerDispatcher`]:
//! - updates of the singleton parameter document run a full recompute
//!   through [`ParameterChangeHandler`], fanning out with bounded
//!   concurrency and reporting partial failure as a [`FanOutError`];
//! - writes of any item run [`ItemChangeHandler`], which recomputes only when
//!   `likes` or `dateCreated` changed. The engine's own `popularity` writes
//!   therefore terminate instead of re-triggering forever.
//!
//! Handlers read and write through [`popularity_core::DocumentStore`] and
//! read time from a [`popularity_core::Clock`], so tests run against the
//! in-memory store with a fixed clock.
//!
//! # Examples
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use popularity_core::test_support::{FixedClock, MemoryStore};
//! use popularity_core::{Change, ChangeEvent, Document, DocumentPath, PopularityParameters};
//! use popularity_triggers::{DispatchOutcome, ItemOutcome, TriggerConfig, TriggerDispatcher};
//!
//! # tokio::runtime::Builder::new_current_thread().build()?.block_on(async {
//! let now = Utc
//!     .with_ymd_and_hms(2024, 3, 2, 0, 0, 0)
//!     .single()
//!     .ok_or("invalid instant")?;
//! let config = TriggerConfig::default();
//! let parameters: DocumentPath = "PopularityParameters/NhaJD2HJZfHGrohUSpzm".parse()?;
//! let store = MemoryStore::new().with_document(
//!     &parameters,
//!     PopularityParameters::new(2.0, 1.5).to_document(),
//! );
//! let dispatcher = TriggerDispatcher::with_clock(store, FixedClock::new(now), &config)?;
//!
//! let item = Document::new()
//!     .with_field("likes", 10_i64)
//!     .with_field("dateCreated", now - Duration::days(1));
//! let path: DocumentPath = "Suggestions/a".parse()?;
//! dispatcher.store().insert(&path, item.clone());
//! let event = ChangeEvent::new(path, Change::create(item));
//! let outcome = dispatcher.dispatch(&event).await?;
//! let DispatchOutcome::Item(ItemOutcome::Recomputed { popularity, .. }) = outcome else {
//!     panic!("expected a recompute");
//! };
//! assert!((popularity - 1.9245).abs() < 1e-4);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # })?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]

mod config;
mod dispatch;
mod error;
mod items;
mod parameters;
mod rescore;

pub use config::{
    DEFAULT_CONCURRENCY, DEFAULT_ITEMS_COLLECTION, DEFAULT_PARAMETERS_COLLECTION,
    DEFAULT_PARAMETERS_ID, TriggerConfig,
};
pub use dispatch::{
    DispatchOutcome, DocumentPattern, EventContext, ITEM_ID_PARAM, Trigger, TriggerDispatcher,
    TriggerKind,
};
pub use error::{ConfigError, FanOutError, ItemError, ItemFailure, TriggerError};
pub use items::{ItemChangeHandler, ItemOutcome, SkipReason};
pub use parameters::{ParameterChangeHandler, ParameterRecomputation};
