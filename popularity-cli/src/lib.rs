//! Command-line interface for replaying store changes against a snapshot.
//!
//! Each command loads a JSON snapshot of the document store, runs one
//! trigger handler over it, and writes the resulting state back out.
#![forbid(unsafe_code)]

use std::fmt;
use std::io::Write;

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use popularity_core::{Clock, DocumentPath, SystemClock};
use popularity_data::SnapshotStore;
use popularity_triggers::{
    ItemOutcome, ParameterRecomputation, SkipReason, TriggerConfig, TriggerDispatcher,
};

mod error;
mod item;
mod params;

pub use error::CliError;

use item::ItemWrittenArgs;
use params::ParamsChangedArgs;

pub(crate) const ARG_SNAPSHOT: &str = "snapshot";
pub(crate) const ARG_OUTPUT: &str = "output";
pub(crate) const ARG_EVENT: &str = "event";
pub(crate) const ARG_CONCURRENCY: &str = "concurrency";
pub(crate) const ARG_ITEMS_COLLECTION: &str = "items-collection";
pub(crate) const ARG_PARAMETERS_DOCUMENT: &str = "parameters-document";
pub(crate) const ENV_PARAMS_SNAPSHOT: &str = "POPULARITY_CMDS_PARAMS_CHANGED_SNAPSHOT";
pub(crate) const ENV_ITEM_SNAPSHOT: &str = "POPULARITY_CMDS_ITEM_WRITTEN_SNAPSHOT";
pub(crate) const ENV_ITEM_EVENT: &str = "POPULARITY_CMDS_ITEM_WRITTEN_EVENT";

/// Run the popularity CLI with the current process arguments and environment.
///
/// # Errors
/// Returns [`CliError`] when argument parsing, configuration, file access or
/// the trigger handler fails.
pub async fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let report = execute(cli.command, SystemClock).await?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{report}").map_err(CliError::WriteReport)
}

async fn execute<C: Clock>(command: Command, clock: C) -> Result<Report, CliError> {
    match command {
        Command::ParamsChanged(args) => {
            params::run_params_changed(args.into_config()?, clock).await
        }
        Command::ItemWritten(args) => item::run_item_written(args.into_config()?, clock).await,
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "popularity",
    about = "Recompute time-decayed popularity scores over a store snapshot",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rescore every item after the decay parameters change.
    ParamsChanged(ParamsChangedArgs),
    /// Rescore one item after it was created, updated or deleted.
    ItemWritten(ItemWrittenArgs),
}

/// Options shared by every command, before defaults are applied.
#[derive(Debug, Default)]
pub(crate) struct StoreOptions {
    pub(crate) snapshot: Option<Utf8PathBuf>,
    pub(crate) output: Option<Utf8PathBuf>,
    pub(crate) concurrency: Option<usize>,
    pub(crate) items_collection: Option<String>,
    pub(crate) parameters_document: Option<String>,
}

/// Where the snapshot lives and how the handlers are configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StoreConfig {
    pub(crate) snapshot: Utf8PathBuf,
    pub(crate) output: Utf8PathBuf,
    pub(crate) trigger: TriggerConfig,
}

impl StoreConfig {
    pub(crate) fn resolve(
        options: StoreOptions,
        snapshot_env: &'static str,
    ) -> Result<Self, CliError> {
        let snapshot = options.snapshot.ok_or(CliError::MissingArgument {
            field: ARG_SNAPSHOT,
            env: snapshot_env,
        })?;
        let output = options.output.unwrap_or_else(|| snapshot.clone());

        let mut trigger = TriggerConfig::default();
        if let Some(raw) = options.parameters_document {
            let path: DocumentPath = raw.parse().map_err(|source| CliError::InvalidDocumentPath {
                field: ARG_PARAMETERS_DOCUMENT,
                value: raw.clone(),
                source,
            })?;
            trigger = trigger.with_parameters_document(path.collection(), path.id());
        }
        if let Some(collection) = options.items_collection {
            trigger = trigger.with_items_collection(collection);
        }
        if let Some(limit) = options.concurrency {
            trigger = trigger.with_concurrency(limit);
        }

        Ok(Self {
            snapshot,
            output,
            trigger,
        })
    }

    /// Load the snapshot and wire it to the trigger handlers.
    pub(crate) fn open<C: Clock>(
        &self,
        clock: C,
    ) -> Result<TriggerDispatcher<SnapshotStore, C>, CliError> {
        let store = SnapshotStore::load(&self.snapshot)?;
        Ok(TriggerDispatcher::with_clock(store, clock, &self.trigger)?)
    }
}

/// Human-readable summary of a command run.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Report {
    /// Every item was rescored.
    Parameters(ParameterRecomputation),
    /// One item change was handled.
    Item(ItemOutcome),
    /// The event matched no trigger.
    Ignored(DocumentPath),
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parameters(summary) => write!(
                f,
                "rescored {} items (timeOffset={}, gravity={})",
                summary.updated, summary.parameters.time_offset, summary.parameters.gravity
            ),
            Self::Item(ItemOutcome::Recomputed { path, popularity }) => {
                write!(f, "{path}: popularity {popularity}")
            }
            Self::Item(ItemOutcome::Skipped { path, reason }) => {
                let why = match reason {
                    SkipReason::ScoringInputsUnchanged => "scoring inputs unchanged",
                    SkipReason::Deleted => "deleted",
                };
                write!(f, "{path}: skipped ({why})")
            }
            Self::Ignored(path) => write!(f, "{path}: no trigger matches"),
        }
    }
}

#[cfg(test)]
mod tests;
