//! Full recompute when the global decay parameters change.

use log::info;
use popularity_core::{Change, Clock, DocumentPath, DocumentStore, PopularityParameters};

use crate::TriggerError;
use crate::config::Settings;
use crate::rescore::rescore_all;

/// Summary of a completed full recompute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterRecomputation {
    /// Parameters read from the updated configuration document.
    pub parameters: PopularityParameters,
    /// Number of items whose popularity was rewritten.
    pub updated: usize,
}

/// Rescores every item after the singleton parameter document is updated.
///
/// The new parameters are taken from the change's after state, not re-read
/// from the store. Each item is rescored independently; one failing item
/// does not stop the others, but any failure fails the invocation with a
/// [`crate::FanOutError`].
#[derive(Debug)]
pub struct ParameterChangeHandler<'a, S: ?Sized, C: ?Sized> {
    store: &'a S,
    clock: &'a C,
    settings: &'a Settings,
}

impl<'a, S, C> ParameterChangeHandler<'a, S, C>
where
    S: DocumentStore + ?Sized,
    C: Clock + ?Sized,
{
    pub(crate) const fn new(store: &'a S, clock: &'a C, settings: &'a Settings) -> Self {
        Self {
            store,
            clock,
            settings,
        }
    }

    /// Configured location of the parameter document.
    #[must_use]
    pub const fn parameters_path(&self) -> &DocumentPath {
        &self.settings.parameters
    }

    /// React to an update of the parameter document.
    ///
    /// # Errors
    /// Returns [`TriggerError::MissingAfterState`] when the change deleted the
    /// document, [`TriggerError::Document`] when the new state lacks
    /// `timeOffset` or `gravity`, [`TriggerError::Store`] when the item
    /// collection cannot be read, and [`TriggerError::FanOut`] when any item
    /// update fails.
    pub async fn handle(&self, change: &Change) -> Result<ParameterRecomputation, TriggerError> {
        let path = self.parameters_path();
        let after = change
            .after()
            .ok_or_else(|| TriggerError::MissingAfterState { path: path.clone() })?;
        let parameters = PopularityParameters::from_document(path, after)?;
        let items = self.store.list(&self.settings.items).await?;
        info!(
            "recomputing popularity of {} items in {} (timeOffset={}, gravity={})",
            items.len(),
            self.settings.items,
            parameters.time_offset,
            parameters.gravity
        );
        let updated =
            rescore_all(self.store, self.clock, parameters, items, self.settings).await?;
        info!("updated popularity of {updated} items");
        Ok(ParameterRecomputation {
            parameters,
            updated,
        })
    }
}
