//! Single-item recompute when an item's scoring inputs change.

use chrono::{DateTime, Utc};
use log::{debug, info};
use popularity_core::{
    Change, Clock, Document, DocumentPath, DocumentStore, PopularityParameters, Suggestion,
};

use crate::TriggerError;
use crate::config::Settings;
use crate::rescore::rescore;

/// Why an item change did not lead to a recompute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Neither `likes` nor `dateCreated` changed.
    ScoringInputsUnchanged,
    /// The item was deleted.
    Deleted,
}

/// Result of handling one item change.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    /// Popularity was recomputed and written.
    Recomputed {
        /// Item that was updated.
        path: DocumentPath,
        /// Score written.
        popularity: f64,
    },
    /// No write was issued.
    Skipped {
        /// Item the change addressed.
        path: DocumentPath,
        /// Why nothing was written.
        reason: SkipReason,
    },
}

/// The fields whose change warrants a recompute.
///
/// Derived fields must never appear here. The handler writes `popularity`
/// and that write is delivered back to it as a new change, so comparing it
/// would re-trigger the handler forever.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ScoringInputs {
    likes: Option<f64>,
    date_created: Option<DateTime<Utc>>,
}

impl ScoringInputs {
    pub(crate) fn of(doc: &Document) -> Self {
        Self {
            likes: doc.number(Suggestion::LIKES_FIELD),
            date_created: doc.timestamp(Suggestion::DATE_CREATED_FIELD),
        }
    }
}

impl From<&Suggestion> for ScoringInputs {
    fn from(item: &Suggestion) -> Self {
        Self {
            likes: Some(item.likes),
            date_created: Some(item.date_created),
        }
    }
}

/// Rescores one item when its like count or creation date changes.
///
/// Creations always recompute. Deletions are ignored. Updates recompute only
/// when `likes` or `dateCreated` differ between the before and after states.
/// The after state must carry both inputs even when the guard would skip.
#[derive(Debug)]
pub struct ItemChangeHandler<'a, S: ?Sized, C: ?Sized> {
    store: &'a S,
    clock: &'a C,
    settings: &'a Settings,
}

impl<'a, S, C> ItemChangeHandler<'a, S, C>
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

    /// React to a write of the item at `path`.
    ///
    /// # Errors
    /// Returns [`TriggerError::Document`] when the item's after state lacks
    /// `likes` or `dateCreated` or holds them with the wrong type,
    /// [`TriggerError::MissingParameters`] when the parameter document does
    /// not exist, and [`TriggerError::Store`] when the read or write fails.
    /// Malformed parameters are also reported as [`TriggerError::Document`].
    pub async fn handle(
        &self,
        path: &DocumentPath,
        change: &Change,
    ) -> Result<ItemOutcome, TriggerError> {
        let Some(after) = change.after() else {
            debug!("{path} was deleted; nothing to score");
            return Ok(skipped(path, SkipReason::Deleted));
        };
        let item = Suggestion::from_document(path, after)?;
        if let Some(before) = change.before()
            && ScoringInputs::of(before) == ScoringInputs::from(&item)
        {
            debug!("scoring inputs of {path} unchanged; skipping");
            return Ok(skipped(path, SkipReason::ScoringInputsUnchanged));
        }

        let parameters = self.fetch_parameters().await?;
        let popularity = rescore(self.store, self.clock, parameters, path, after).await?;
        info!("recomputed popularity of {path}: {popularity}");
        Ok(ItemOutcome::Recomputed {
            path: path.clone(),
            popularity,
        })
    }

    async fn fetch_parameters(&self) -> Result<PopularityParameters, TriggerError> {
        let path = &self.settings.parameters;
        let doc = self
            .store
            .get(path)
            .await?
            .ok_or_else(|| TriggerError::MissingParameters { path: path.clone() })?;
        Ok(PopularityParameters::from_document(path, &doc)?)
    }
}

fn skipped(path: &DocumentPath, reason: SkipReason) -> ItemOutcome {
    ItemOutcome::Skipped {
        path: path.clone(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0)
            .single()
            .expect("valid instant")
    }

    fn item(likes: i64) -> Document {
        Document::new()
            .with_field("likes", likes)
            .with_field("dateCreated", created())
    }

    #[rstest]
    fn popularity_is_not_a_scoring_input() {
        let before = item(5).with_field("popularity", 1.0_f64);
        let after = item(5).with_field("popularity", 1.92_f64);
        assert_eq!(ScoringInputs::of(&before), ScoringInputs::of(&after));
    }

    #[rstest]
    fn likes_are_compared_numerically() {
        let before = item(5);
        let after = Document::new()
            .with_field("likes", 5.0_f64)
            .with_field("dateCreated", created());
        assert_eq!(ScoringInputs::of(&before), ScoringInputs::of(&after));
    }

    #[rstest]
    fn validated_after_state_matches_unchanged_before_state() {
        let path: DocumentPath = "Suggestions/a".parse().expect("valid path");
        let decoded = Suggestion::from_document(&path, &item(5)).expect("item decodes");
        assert_eq!(ScoringInputs::of(&item(5)), ScoringInputs::from(&decoded));
    }

    #[rstest]
    fn creation_date_is_a_scoring_input() {
        let before = item(5);
        let after = Document::new()
            .with_field("likes", 5_i64)
            .with_field("dateCreated", created() + chrono::Duration::seconds(1));
        assert_ne!(ScoringInputs::of(&before), ScoringInputs::of(&after));
    }
}
