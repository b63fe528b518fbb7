//! `item-written`: rescore one item after it changed.

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use popularity_core::{ChangeEvent, Clock};
use popularity_data::{SnapshotStore, load_change_event};
use popularity_triggers::DispatchOutcome;
use serde::{Deserialize, Serialize};

use crate::{
    ARG_CONCURRENCY, ARG_EVENT, ARG_ITEMS_COLLECTION, ARG_OUTPUT, ARG_PARAMETERS_DOCUMENT,
    ARG_SNAPSHOT, CliError, ENV_ITEM_EVENT, ENV_ITEM_SNAPSHOT, Report, StoreConfig, StoreOptions,
};

/// CLI arguments for the `item-written` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "item-written",
    long_about = "Replay a write of a single item. The event file names the \
                 item and carries its before and after states. The after \
                 state is applied to the snapshot first, then the item is \
                 rescored only when its like count or creation date changed.",
    about = "Rescore one item from a recorded change event"
)]
#[ortho_config(prefix = "POPULARITY")]
pub(crate) struct ItemWrittenArgs {
    /// Path to the JSON store snapshot.
    #[arg(long = ARG_SNAPSHOT, value_name = "path")]
    #[serde(default)]
    pub(crate) snapshot: Option<Utf8PathBuf>,
    /// Where to write the updated snapshot (defaults to --snapshot).
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
    /// Change event for the item, as JSON.
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

impl ItemWrittenArgs {
    pub(crate) fn into_config(self) -> Result<ItemWrittenConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ItemWrittenConfig::try_from(merged)
    }
}

/// Resolved `item-written` configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ItemWrittenConfig {
    pub(crate) store: StoreConfig,
    pub(crate) event: Utf8PathBuf,
}

impl TryFrom<ItemWrittenArgs> for ItemWrittenConfig {
    type Error = CliError;

    fn try_from(args: ItemWrittenArgs) -> Result<Self, Self::Error> {
        let event = args.event.ok_or(CliError::MissingArgument {
            field: ARG_EVENT,
            env: ENV_ITEM_EVENT,
        })?;
        let options = StoreOptions {
            snapshot: args.snapshot,
            output: args.output,
            concurrency: args.concurrency,
            items_collection: args.items_collection,
            parameters_document: args.parameters_document,
        };
        Ok(Self {
            store: StoreConfig::resolve(options, ENV_ITEM_SNAPSHOT)?,
            event,
        })
    }
}

/// Apply the recorded write to the snapshot, route the event through the
/// triggers and persist the result.
///
/// Nothing is written when the handler fails.
pub(crate) async fn run_item_written<C: Clock>(
    config: ItemWrittenConfig,
    clock: C,
) -> Result<Report, CliError> {
    let dispatcher = config.store.open(clock)?;
    let event = load_change_event(&config.event)?;
    apply_write(dispatcher.store(), &event);
    let report = match dispatcher.dispatch(&event).await? {
        DispatchOutcome::Item(outcome) => Report::Item(outcome),
        DispatchOutcome::Parameters(summary) => Report::Parameters(summary),
        DispatchOutcome::Ignored => Report::Ignored(event.path),
    };
    dispatcher.store().persist(&config.store.output)?;
    Ok(report)
}

/// Bring the snapshot in line with the write the event records.
///
/// Triggers fire after a write commits, so the handler must read the after
/// state rather than whatever an older snapshot holds.
fn apply_write(store: &SnapshotStore, event: &ChangeEvent) {
    let Some(after) = event.change.after() else {
        store.remove(&event.path);
        return;
    };
    store.insert(&event.path, after.clone());
}
