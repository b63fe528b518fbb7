//! Fixtures for building snapshot and event files on disk.

use chrono::{DateTime, Duration, TimeZone, Utc};
use popularity_core::{
    ChangeEvent, Document, PopularityParameters, Suggestion, test_support::FixedClock,
};
use popularity_triggers::{DEFAULT_PARAMETERS_COLLECTION, DEFAULT_PARAMETERS_ID};
use tempfile::TempDir;

use super::*;

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
        .single()
        .expect("fixed instant should be valid")
}

pub(super) fn clock() -> FixedClock {
    FixedClock::new(now())
}

pub(super) fn parameters_path() -> DocumentPath {
    DocumentPath::new(DEFAULT_PARAMETERS_COLLECTION, DEFAULT_PARAMETERS_ID)
        .expect("default parameter path is valid")
}

pub(super) fn item_path(id: &str) -> DocumentPath {
    DocumentPath::new("Suggestions", id).expect("valid item path")
}

pub(super) fn suggestion(likes: i64, hours_ago: i64) -> Document {
    Document::new()
        .with_field(Suggestion::LIKES_FIELD, likes)
        .with_field(
            Suggestion::DATE_CREATED_FIELD,
            now() - Duration::hours(hours_ago),
        )
}

/// Temporary directory holding a snapshot under construction.
pub(super) struct Workspace {
    dir: TempDir,
    pub(super) store: SnapshotStore,
}

impl Workspace {
    pub(super) fn new() -> Self {
        Self {
            dir: TempDir::new().expect("tempdir"),
            store: SnapshotStore::new(),
        }
    }

    pub(super) fn path(&self, relative: &str) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(self.dir.path().join(relative)).expect("utf-8 workspace")
    }

    pub(super) fn with_parameters(&self, time_offset: f64, gravity: f64) {
        self.store.insert(
            &parameters_path(),
            PopularityParameters::new(time_offset, gravity).to_document(),
        );
    }

    pub(super) fn save_snapshot(&self) -> Utf8PathBuf {
        let path = self.path("snapshot.json");
        self.store.persist(&path).expect("persist snapshot");
        path
    }

    pub(super) fn save_event(&self, event: &ChangeEvent) -> Utf8PathBuf {
        let path = self.path("event.json");
        let json = serde_json::to_string(event).expect("serialize event");
        std::fs::write(&path, json).expect("write event");
        path
    }
}

pub(super) fn run_cli(argv: &[String]) -> Result<Report, CliError> {
    let cli = Cli::try_parse_from(argv)?;
    popularity_core::test_support::block_on_for_tests(execute(cli.command, clock()))
}
