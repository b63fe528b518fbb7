//! Error types emitted by the popularity CLI.
//!
//! Keep this error type reasonably small, as every command helper returns
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use popularity_core::{DocumentPath, PathError};
use popularity_data::SnapshotError;
use popularity_triggers::{ConfigError, TriggerError};
use thiserror::Error;

/// Errors emitted by the popularity CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Long flag name of the option.
        field: &'static str,
        /// Environment variable that can supply it.
        env: &'static str,
    },
    /// The parameter document option was not a `collection/id` path.
    #[error("invalid {field} {value:?}: {source}")]
    InvalidDocumentPath {
        /// Long flag name of the option.
        field: &'static str,
        /// Value as supplied.
        value: String,
        /// Why it was rejected.
        #[source]
        source: PathError,
    },
    /// The merged options do not form a valid trigger configuration.
    #[error("invalid trigger configuration: {0}")]
    TriggerConfig(#[from] ConfigError),
    /// A parameter event addressed a different document.
    #[error("event in {event:?} targets {found}, not the parameter document")]
    UnexpectedEventTarget {
        /// Event file.
        event: Utf8PathBuf,
        /// Document the event addressed.
        found: DocumentPath,
    },
    /// Reading or writing a snapshot or event file failed.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    /// The trigger handler failed.
    #[error(transparent)]
    Trigger(#[from] TriggerError),
    /// Writing the command report failed.
    #[error("failed to write report: {0}")]
    WriteReport(#[source] std::io::Error),
}
