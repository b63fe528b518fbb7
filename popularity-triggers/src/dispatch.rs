//! Trigger registration and routing of change events to handlers.
//!
//! The hosting platform delivers a change event for every document write.
//! A [`Trigger`] pairs a [`DocumentPattern`] with the [`TriggerKind`] of
//! writes it reacts to; the [`TriggerDispatcher`] owns the two triggers the
//! engine registers and forwards each event to the matching handler.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use log::debug;
use popularity_core::{
    ChangeEvent, ChangeKind, Clock, DocumentPath, DocumentStore, PathError, SystemClock,
};

use crate::config::Settings;
use crate::{
    ConfigError, ItemChangeHandler, ItemOutcome, ParameterChangeHandler, ParameterRecomputation,
    TriggerConfig, TriggerError,
};

/// Document selector of a trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentPattern {
    /// A single, fixed document.
    Exact(DocumentPath),
    /// Any document in `collection`; its id is captured as `param`.
    Wildcard {
        /// Watched collection.
        collection: String,
        /// Name under which the matched id is captured.
        param: String,
    },
}

impl DocumentPattern {
    /// Match `path`, returning the wildcard captures on success.
    #[must_use]
    pub fn captures(&self, path: &DocumentPath) -> Option<BTreeMap<String, String>> {
        match self {
            Self::Exact(expected) => (expected == path).then(BTreeMap::new),
            Self::Wildcard { collection, param } => (collection == path.collection())
                .then(|| BTreeMap::from([(param.clone(), path.id().to_owned())])),
        }
    }
}

impl FromStr for DocumentPattern {
    type Err = PathError;

    /// Parse `"collection/id"` or `"collection/{param}"`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let path: DocumentPath = raw.parse()?;
        let id = path.id();
        match id.strip_prefix('{').and_then(|rest| rest.strip_suffix('}')) {
            Some(param) if !param.is_empty() => Ok(Self::Wildcard {
                collection: path.collection().to_owned(),
                param: param.to_owned(),
            }),
            Some(_) => Err(PathError::EmptySegment),
            None => Ok(Self::Exact(path)),
        }
    }
}

impl fmt::Display for DocumentPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(path) => write!(f, "{path}"),
            Self::Wildcard { collection, param } => write!(f, "{collection}/{{{param}}}"),
        }
    }
}

/// Writes a trigger reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    /// Updates of an existing document only.
    Update,
    /// Creations, updates and deletions.
    Write,
}

impl TriggerKind {
    /// Report whether a write of `kind` fires this trigger.
    #[must_use]
    pub const fn accepts(self, kind: ChangeKind) -> bool {
        match self {
            Self::Update => matches!(kind, ChangeKind::Update),
            Self::Write => true,
        }
    }
}

/// Metadata accompanying a fired trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventContext {
    /// Platform event identifier, if the event carried one.
    pub event_id: Option<String>,
    /// Wildcard captures keyed by parameter name.
    pub params: BTreeMap<String, String>,
}

/// A document pattern subscribed to a kind of write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    /// Documents watched.
    pub pattern: DocumentPattern,
    /// Writes reacted to.
    pub kind: TriggerKind,
}

impl Trigger {
    /// Subscribe to `kind` writes of documents matching `pattern`.
    #[must_use]
    pub const fn new(pattern: DocumentPattern, kind: TriggerKind) -> Self {
        Self { pattern, kind }
    }

    /// Return the event context when `event` fires this trigger.
    #[must_use]
    pub fn fire(&self, event: &ChangeEvent) -> Option<EventContext> {
        if !self.kind.accepts(event.change.kind()) {
            return None;
        }
        self.pattern.captures(&event.path).map(|params| EventContext {
            event_id: event.event_id.clone(),
            params,
        })
    }
}

/// Result of routing one change event.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// The parameter trigger fired and every item was rescored.
    Parameters(ParameterRecomputation),
    /// The item trigger fired.
    Item(ItemOutcome),
    /// No trigger matched the event.
    Ignored,
}

/// Owns the store, clock and triggers, and routes change events.
///
/// # Examples
///
/// ```
/// use popularity_core::test_support::MemoryStore;
/// use popularity_triggers::{TriggerConfig, TriggerDispatcher};
///
/// let dispatcher = TriggerDispatcher::new(MemoryStore::new(), &TriggerConfig::default())?;
/// assert_eq!(
///     dispatcher.item_trigger().pattern.to_string(),
///     "Suggestions/{docId}"
/// );
/// # Ok::<(), popularity_triggers::ConfigError>(())
/// ```
#[derive(Debug)]
pub struct TriggerDispatcher<S, C = SystemClock> {
    store: S,
    clock: C,
    settings: Settings,
    parameters_trigger: Trigger,
    item_trigger: Trigger,
}

/// Name under which the item trigger captures the document id.
pub const ITEM_ID_PARAM: &str = "docId";

impl<S: DocumentStore> TriggerDispatcher<S> {
    /// Build a dispatcher reading wall-clock time.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when `config` is invalid.
    pub fn new(store: S, config: &TriggerConfig) -> Result<Self, ConfigError> {
        Self::with_clock(store, SystemClock, config)
    }
}

impl<S: DocumentStore, C: Clock> TriggerDispatcher<S, C> {
    /// Build a dispatcher with an explicit clock.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when `config` is invalid.
    pub fn with_clock(store: S, clock: C, config: &TriggerConfig) -> Result<Self, ConfigError> {
        let settings = config.resolve()?;
        let parameters_trigger = Trigger::new(
            DocumentPattern::Exact(settings.parameters.clone()),
            TriggerKind::Update,
        );
        let item_trigger = Trigger::new(
            DocumentPattern::Wildcard {
                collection: settings.items.clone(),
                param: ITEM_ID_PARAM.to_owned(),
            },
            TriggerKind::Write,
        );
        Ok(Self {
            store,
            clock,
            settings,
            parameters_trigger,
            item_trigger,
        })
    }

    /// Handler for parameter document updates.
    #[must_use]
    pub const fn parameter_handler(&self) -> ParameterChangeHandler<'_, S, C> {
        ParameterChangeHandler::new(&self.store, &self.clock, &self.settings)
    }

    /// Handler for item writes.
    #[must_use]
    pub const fn item_handler(&self) -> ItemChangeHandler<'_, S, C> {
        ItemChangeHandler::new(&self.store, &self.clock, &self.settings)
    }

    /// Trigger subscribed to updates of the parameter document.
    #[must_use]
    pub const fn parameters_trigger(&self) -> &Trigger {
        &self.parameters_trigger
    }

    /// Trigger subscribed to writes of any item.
    #[must_use]
    pub const fn item_trigger(&self) -> &Trigger {
        &self.item_trigger
    }

    /// Underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Consume the dispatcher and return its store.
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }

    /// Route `event` to the handler whose trigger it fires.
    ///
    /// # Errors
    /// Propagates the handler's [`TriggerError`].
    pub async fn dispatch(&self, event: &ChangeEvent) -> Result<DispatchOutcome, TriggerError> {
        if let Some(context) = self.parameters_trigger.fire(event) {
            debug!(
                "event {:?} on {} fired {}",
                context.event_id, event.path, self.parameters_trigger.pattern
            );
            let summary = self.parameter_handler().handle(&event.change).await?;
            return Ok(DispatchOutcome::Parameters(summary));
        }
        if let Some(context) = self.item_trigger.fire(event) {
            debug!(
                "event {:?} on {} fired {} with {:?}",
                context.event_id, event.path, self.item_trigger.pattern, context.params
            );
            let outcome = self.item_handler().handle(&event.path, &event.change).await?;
            return Ok(DispatchOutcome::Item(outcome));
        }
        debug!("no trigger matches {:?} on {}", event.change.kind(), event.path);
        Ok(DispatchOutcome::Ignored)
    }
}
