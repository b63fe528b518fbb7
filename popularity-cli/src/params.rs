//! `params-changed`: rescore every item after the decay parameters change.

use camino::Utf8PathBuf;
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use popularity_core::{Change, Clock};
use popularity_data::load_change_event;
use popularity_triggers::TriggerError;
use serde::{Deserialize, Serialize};

use crate::{
    ARG_CONCURRENCY, ARG_EVENT, ARG_ITEMS_COLLECTION, ARG_OUTPUT, ARG_PARAMETERS_DOCUMENT,
    ARG_SNAPSHOT, CliError, ENV_PARAMS_SNAPSHOT, Report, StoreConfig, StoreOptions,
};

/// CLI arguments for the `params-changed` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "params-changed",
    long_about = "Replay an update of the decay parameter document. Without \
                 --event the snapshot's current parameters are treated as the \
                 new state and every item is rescored with them.",
    about = "Rescore every item with the current decay parameters"
)]
#[ortho_config(prefix = "POPULARITY")]
pub(crate) struct ParamsChangedArgs {
    /// Path to the JSON store snapshot.
    #[arg(long = ARG_SNAPSHOT, value_name = "path")]
    #[serde(default)]
    pub(crate) snapshot: Option<Utf8PathBuf>,
    /// Where to write the updated snapshot (defaults to --snapshot).
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
    /// Change event for the parameter document, as JSON.
    #[arg(long = ARG_EVENT, value_name = "path")]
    #[serde(default)]
    pub(crate) event: Option<Utf8PathBuf>,
    /// Maximum number of concurrent item updates.
    #[arg(long = ARG_CONCURRENCY, value_name = "n")]
    #[serde(default)]
    pub(crate) concurrency: Option<usize>,
    /// Collection holding the scored items.
    #[arg(long = ARG_ITEMS_COLLECTION, value_name = "name")]
    #[serde(default)]
    pub(crate) items_collection: Option<String>,
    /// Parameter document as `collection/id`.
    #[arg(long = ARG_PARAMETERS_DOCUMENT, value_name = "path")]
    #[serde(default)]
    pub(crate) parameters_document: Option<String>,
}

impl ParamsChangedArgs {
    pub(crate) fn into_config(self) -> Result<ParamsChangedConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ParamsChangedConfig::try_from(merged)
    }
}

/// Resolved `params-changed` configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParamsChangedConfig {
    pub(crate) store: StoreConfig,
    pub(crate) event: Option<Utf8PathBuf>,
}

impl TryFrom<ParamsChangedArgs> for ParamsChangedConfig {
    type Error = CliError;

    fn try_from(args: ParamsChangedArgs) -> Result<Self, Self::Error> {
        let options = StoreOptions {
            snapshot: args.snapshot,
            output: args.output,
            concurrency: args.concurrency,
            items_collection: args.items_collection,
            parameters_document: args.parameters_document,
        };
        Ok(Self {
            store: StoreConfig::resolve(options, ENV_PARAMS_SNAPSHOT)?,
            event: args.event,
        })
    }
}

/// Run the parameter handler over the snapshot and persist the result.
///
/// Items updated before a partial failure stay updated, so the snapshot is
/// written even when the handler reports an error.
pub(crate) async fn run_params_changed<C: Clock>(
    config: ParamsChangedConfig,
    clock: C,
) -> Result<Report, CliError> {
    let dispatcher = config.store.open(clock)?;
    let handler = dispatcher.parameter_handler();
    let expected = handler.parameters_path();

    let change = if let Some(event_path) = &config.event {
        let event = load_change_event(event_path)?;
        if &event.path != expected {
            return Err(CliError::UnexpectedEventTarget {
                event: event_path.clone(),
                found: event.path,
            });
        }
        event.change
    } else {
        let current = dispatcher
            .store()
            .document(expected)
            .ok_or_else(|| TriggerError::MissingParameters {
                path: expected.clone(),
            })?;
        info!("replaying current parameters of {expected}");
        Change::update(current.clone(), current)
    };

    let outcome = handler.handle(&change).await;
    dispatcher.store().persist(&config.store.output)?;
    Ok(Report::Parameters(outcome?))
}
