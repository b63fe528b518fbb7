//! Change notifications delivered by the hosting platform.
//!
//! A [`Change`] carries the state of one document before and after a write.
//! An absent side encodes creation (no `before`) or deletion (no `after`).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Document, DocumentPath};

/// Kind of write a [`Change`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// The document did not exist before the write.
    Create,
    /// The document existed before and after the write.
    Update,
    /// The document no longer exists after the write.
    Delete,
}

/// Before and after state of a single document write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawChange", into = "RawChange")]
pub struct Change {
    before: Option<Document>,
    after: Option<Document>,
}

impl Change {
    /// Build a change from optional before/after states.
    ///
    /// # Errors
    /// Returns [`ChangeError::Empty`] when both sides are absent.
    pub fn new(before: Option<Document>, after: Option<Document>) -> Result<Self, ChangeError> {
        if before.is_none() && after.is_none() {
            return Err(ChangeError::Empty);
        }
        Ok(Self { before, after })
    }

    /// A document was created with `after` as its initial state.
    #[must_use]
    pub const fn create(after: Document) -> Self {
        Self {
            before: None,
            after: Some(after),
        }
    }

    /// A document moved from `before` to `after`.
    #[must_use]
    pub const fn update(before: Document, after: Document) -> Self {
        Self {
            before: Some(before),
            after: Some(after),
        }
    }

    /// A document holding `before` was deleted.
    #[must_use]
    pub const fn delete(before: Document) -> Self {
        Self {
            before: Some(before),
            after: None,
        }
    }

    /// State prior to the write.
    #[must_use]
    pub const fn before(&self) -> Option<&Document> {
        self.before.as_ref()
    }

    /// State following the write.
    #[must_use]
    pub const fn after(&self) -> Option<&Document> {
        self.after.as_ref()
    }

    /// Classify the write.
    #[must_use]
    pub const fn kind(&self) -> ChangeKind {
        match (&self.before, &self.after) {
            (None, _) => ChangeKind::Create,
            (Some(_), Some(_)) => ChangeKind::Update,
            (Some(_), None) => ChangeKind::Delete,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct RawChange {
    #[serde(default)]
    before: Option<Document>,
    #[serde(default)]
    after: Option<Document>,
}

impl TryFrom<RawChange> for Change {
    type Error = ChangeError;

    fn try_from(raw: RawChange) -> Result<Self, Self::Error> {
        Self::new(raw.before, raw.after)
    }
}

impl From<Change> for RawChange {
    fn from(change: Change) -> Self {
        Self {
            before: change.before,
            after: change.after,
        }
    }
}

/// Errors raised while constructing a [`Change`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChangeError {
    /// Neither a before nor an after state was supplied.
    #[error("a change needs a before state, an after state, or both")]
    Empty,
}

/// A change addressed to a specific document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    /// Platform-assigned identifier, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Document that was written.
    pub path: DocumentPath,
    /// Before and after state.
    #[serde(flatten)]
    pub change: Change,
}

impl ChangeEvent {
    /// Address `change` to `path`.
    #[must_use]
    pub const fn new(path: DocumentPath, change: Change) -> Self {
        Self {
            event_id: None,
            path,
            change,
        }
    }

    /// Attach a platform event identifier.
    #[must_use]
    pub fn with_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn classifies_writes() {
        let doc = Document::new().with_field("likes", 1_i64);
        assert_eq!(Change::create(doc.clone()).kind(), ChangeKind::Create);
        assert_eq!(
            Change::update(doc.clone(), doc.clone()).kind(),
            ChangeKind::Update
        );
        assert_eq!(Change::delete(doc).kind(), ChangeKind::Delete);
    }

    #[rstest]
    fn rejects_change_without_states() {
        assert_eq!(Change::new(None, None), Err(ChangeError::Empty));
    }

    #[rstest]
    fn decodes_event_json() {
        let json = r#"{
            "path": "Suggestions/abc",
            "before": null,
            "after": { "likes": { "integerValue": 2 } }
        }"#;
        let event: ChangeEvent = serde_json::from_str(json).expect("event should decode");
        assert_eq!(event.path.id(), "abc");
        assert_eq!(event.change.kind(), ChangeKind::Create);
        assert!(event.event_id.is_none());
    }

    #[rstest]
    fn rejects_event_json_without_states() {
        let json = r#"{ "path": "Suggestions/abc" }"#;
        assert!(serde_json::from_str::<ChangeEvent>(json).is_err());
    }
}
