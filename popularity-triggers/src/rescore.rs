//! Per-item recomputation shared by both handlers.

use futures_util::stream::{self, StreamExt};
use log::{debug, warn};
use popularity_core::{
    Clock, Document, DocumentPath, DocumentSnapshot, DocumentStore, PopularityParameters,
    Suggestion, elapsed_days_since,
};

use crate::{FanOutError, ItemError, ItemFailure};
use crate::config::Settings;

/// Score the item held in `doc` and write the result back to `path`.
///
/// Non-finite scores are written unchanged.
pub(crate) async fn rescore<S, C>(
    store: &S,
    clock: &C,
    params: PopularityParameters,
    path: &DocumentPath,
    doc: &Document,
) -> Result<f64, ItemError>
where
    S: DocumentStore + ?Sized,
    C: Clock + ?Sized,
{
    let item = Suggestion::from_document(path, doc)?;
    let days = elapsed_days_since(item.date_created, clock);
    let score = params.score(item.likes, days);
    if !score.is_finite() {
        warn!("popularity of {path} is not finite ({score}); writing it anyway");
    }
    store
        .update(path, Suggestion::popularity_update(score))
        .await?;
    debug!("popularity of {path} set to {score}");
    Ok(score)
}

/// Rescore every snapshot with at most `settings.concurrency` updates in
/// flight, attempting all of them regardless of individual failures.
///
/// Returns the number of items updated, or an aggregate error listing every
/// item that failed alongside the count that succeeded.
pub(crate) async fn rescore_all<S, C>(
    store: &S,
    clock: &C,
    params: PopularityParameters,
    items: Vec<DocumentSnapshot>,
    settings: &Settings,
) -> Result<usize, FanOutError>
where
    S: DocumentStore + ?Sized,
    C: Clock + ?Sized,
{
    let results: Vec<(DocumentPath, Result<f64, ItemError>)> = stream::iter(items)
        .map(|snapshot| async move {
            let outcome = rescore(store, clock, params, &snapshot.path, &snapshot.fields).await;
            (snapshot.path, outcome)
        })
        .buffer_unordered(settings.concurrency.get())
        .collect()
        .await;

    let mut updated = 0_usize;
    let mut failures = Vec::new();
    for (path, outcome) in results {
        match outcome {
            Ok(_) => updated = updated.saturating_add(1),
            Err(error) => {
                warn!("failed to update popularity of {path}: {error}");
                failures.push(ItemFailure { path, error });
            }
        }
    }

    if failures.is_empty() {
        Ok(updated)
    } else {
        failures.sort_by(|left, right| left.path.cmp(&right.path));
        Err(FanOutError { updated, failures })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TriggerConfig;
    use chrono::{TimeZone, Utc};
    use popularity_core::test_support::{FixedClock, MemoryStore};
    use rstest::rstest;

    fn clock() -> FixedClock {
        FixedClock::new(
            Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0)
                .single()
                .expect("valid instant"),
        )
    }

    fn snapshot(id: &str, doc: Document) -> DocumentSnapshot {
        DocumentSnapshot::new(
            DocumentPath::new("Suggestions", id).expect("valid path"),
            doc,
        )
    }

    #[rstest]
    #[tokio::test]
    async fn malformed_items_are_reported_with_the_rest_written() {
        let created = Utc
            .with_ymd_and_hms(2024, 6, 1, 0, 0, 0)
            .single()
            .expect("valid instant");
        let good = Document::new()
            .with_field("likes", 10_i64)
            .with_field("dateCreated", created);
        let bad = Document::new().with_field("likes", 3_i64);
        let items = vec![snapshot("good", good), snapshot("bad", bad)];
        let store = MemoryStore::new();
        for item in &items {
            store.insert(&item.path, item.fields.clone());
        }
        let settings = TriggerConfig::default()
            .with_concurrency(1)
            .resolve()
            .expect("valid config");

        let error = rescore_all(
            &store,
            &clock(),
            PopularityParameters::new(2.0, 1.5),
            items,
            &settings,
        )
        .await
        .expect_err("one item lacks dateCreated");

        assert_eq!(error.updated, 1);
        assert_eq!(error.attempted(), 2);
        let [failure] = error.failures.as_slice() else {
            panic!("expected a single failure, got {:?}", error.failures);
        };
        assert_eq!(failure.path.id(), "bad");
        assert!(matches!(failure.error, ItemError::Document(_)));
        assert_eq!(store.pending_writes(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn empty_collection_updates_nothing() {
        let settings = TriggerConfig::default().resolve().expect("valid config");
        let updated = rescore_all(
            &MemoryStore::new(),
            &clock(),
            PopularityParameters::new(2.0, 1.5),
            Vec::new(),
            &settings,
        )
        .await
        .expect("nothing to fail");
        assert_eq!(updated, 0);
    }
}
