//! Behavioural coverage for loading and persisting snapshot files.

use std::cell::RefCell;

use camino::{Utf8Path, Utf8PathBuf};
use popularity_core::test_support::block_on_for_tests;
use popularity_core::{Document, DocumentPath, DocumentStore};
use popularity_data::{SnapshotError, SnapshotStore};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

/// World state for snapshot scenarios.
struct SnapshotWorld {
    root: TempDir,
    store: RefCell<Option<SnapshotStore>>,
    load_error: RefCell<Option<SnapshotError>>,
}

impl SnapshotWorld {
    fn path(&self, relative: &str) -> Utf8PathBuf {
        let root = Utf8Path::from_path(self.root.path()).expect("temp dir is UTF-8");
        root.join(relative)
    }
}

fn item(id: &str) -> DocumentPath {
    DocumentPath::new("Suggestions", id).expect("valid item path")
}

#[fixture]
fn world() -> SnapshotWorld {
    SnapshotWorld {
        root: TempDir::new().expect("create temp dir"),
        store: RefCell::new(None),
        load_error: RefCell::new(None),
    }
}

#[given("a snapshot file holding suggestion {id:word} with {likes} likes")]
fn given_snapshot(world: &SnapshotWorld, id: String, likes: i64) {
    let json = format!(
        r#"{{"collections": {{"Suggestions": {{"{id}": {{"likes": {{"integerValue": {likes}}}}}}}}}}}"#
    );
    let path = world.path("snapshot.json");
    std::fs::write(&path, json).expect("write snapshot");
    let store = SnapshotStore::load(&path).expect("snapshot loads");
    world.store.replace(Some(store));
}

#[when("the popularity of suggestion {id:word} is set to {score}")]
fn when_popularity_set(world: &SnapshotWorld, id: String, score: f64) {
    let store = world.store.borrow();
    let store = store.as_ref().expect("store is loaded");
    block_on_for_tests(store.update(&item(&id), Document::new().with_field("popularity", score)))
        .expect("update succeeds");
}

#[when("the store is persisted to {target}")]
fn when_persisted(world: &SnapshotWorld, target: String) {
    let store = world.store.borrow();
    store
        .as_ref()
        .expect("store is loaded")
        .persist(&world.path(&target))
        .expect("persist succeeds");
}

#[when("the snapshot {name} is loaded")]
fn when_loaded(world: &SnapshotWorld, name: String) {
    match SnapshotStore::load(&world.path(&name)) {
        Ok(store) => {
            world.store.replace(Some(store));
        }
        Err(error) => {
            world.load_error.replace(Some(error));
        }
    }
}

#[then("reloading {target} shows suggestion {id:word} with popularity {score} and {likes} likes")]
fn then_reloaded(world: &SnapshotWorld, target: String, id: String, score: f64, likes: f64) {
    let reloaded = SnapshotStore::load(&world.path(&target)).expect("persisted snapshot loads");
    let doc = reloaded.document(&item(&id)).expect("suggestion persisted");
    assert_eq!(doc.number("popularity"), Some(score));
    assert_eq!(doc.number("likes"), Some(likes));
}

#[then("loading fails with a read error")]
fn then_read_error(world: &SnapshotWorld) {
    let error = world.load_error.borrow();
    assert!(
        matches!(error.as_ref(), Some(SnapshotError::Read { .. })),
        "expected a read error, got {error:?}"
    );
}

#[scenario(path = "tests/features/snapshot_store.feature", index = 0)]
fn updates_survive_reload(world: SnapshotWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/snapshot_store.feature", index = 1)]
fn missing_snapshot_fails(world: SnapshotWorld) {
    let _ = world;
}
