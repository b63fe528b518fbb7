//! Behavioural coverage for scoring suggestions read from documents.

use std::cell::{Cell, RefCell};

use chrono::{DateTime, Duration, TimeZone, Utc};
use popularity_core::{
    Clock, Document, DocumentPath, PopularityParameters, Suggestion, elapsed_days_since,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

/// Clock pinned to the scenario's reference instant.
struct ScenarioClock;

impl Clock for ScenarioClock {
    fn now(&self) -> DateTime<Utc> {
        now()
    }
}

/// Scenario state shared between steps.
pub struct DecayWorld {
    clock: ScenarioClock,
    params: Cell<Option<PopularityParameters>>,
    item: RefCell<Option<Document>>,
    score: Cell<Option<f64>>,
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0)
        .single()
        .unwrap_or_else(|| panic!("fixed instant should be valid"))
}

#[fixture]
fn world() -> DecayWorld {
    DecayWorld {
        clock: ScenarioClock,
        params: Cell::new(None),
        item: RefCell::new(None),
        score: Cell::new(None),
    }
}

#[given("decay parameters with offset {offset} and gravity {gravity}")]
fn given_parameters(world: &DecayWorld, offset: f64, gravity: f64) {
    world
        .params
        .set(Some(PopularityParameters::new(offset, gravity)));
}

#[given("a suggestion with {likes} likes created {hours} hours ago")]
fn given_suggestion(world: &DecayWorld, likes: i64, hours: i64) {
    let created = now() - Duration::hours(hours);
    let doc = Document::new()
        .with_field(Suggestion::LIKES_FIELD, likes)
        .with_field(Suggestion::DATE_CREATED_FIELD, created);
    world.item.replace(Some(doc));
}

#[when("I score the suggestion")]
fn when_scored(world: &DecayWorld) {
    let path = DocumentPath::new("Suggestions", "scenario")
        .unwrap_or_else(|err| panic!("valid path: {err}"));
    let params = world
        .params
        .get()
        .unwrap_or_else(|| panic!("parameters must be given"));
    let binding = world.item.borrow();
    let doc = binding
        .as_ref()
        .unwrap_or_else(|| panic!("suggestion must be given"));
    let item = Suggestion::from_document(&path, doc)
        .unwrap_or_else(|err| panic!("suggestion should decode: {err}"));
    let days = elapsed_days_since(item.date_created, &world.clock);
    world.score.set(Some(params.score(item.likes, days)));
}

#[then("the popularity is approximately {expected}")]
#[expect(
    clippy::float_arithmetic,
    reason = "assertions compare floating-point scores"
)]
fn then_approximately(world: &DecayWorld, expected: f64) {
    let score = world
        .score
        .get()
        .unwrap_or_else(|| panic!("score must be recorded"));
    assert!(
        (score - expected).abs() < 1e-4,
        "expected about {expected}, got {score}"
    );
}

#[then("the popularity is below {bound}")]
fn then_below(world: &DecayWorld, bound: f64) {
    let score = world
        .score
        .get()
        .unwrap_or_else(|| panic!("score must be recorded"));
    assert!(score < bound, "expected below {bound}, got {score}");
}

#[scenario(path = "tests/features/decay.feature", index = 0)]
fn day_old_suggestion(world: DecayWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/decay.feature", index = 1)]
fn fresh_suggestion(world: DecayWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/decay.feature", index = 2)]
fn older_suggestion_decays(world: DecayWorld) {
    let _ = world;
}
