//! Typed views over the two kinds of document the engine reads.

use chrono::{DateTime, Utc};

use crate::{Document, DocumentError, DocumentPath, popularity};

/// Global decay parameters held in the singleton configuration document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopularityParameters {
    /// Constant added to an item's age in days.
    pub time_offset: f64,
    /// Exponent applied to the offset age.
    pub gravity: f64,
}

impl PopularityParameters {
    /// Field holding the time offset.
    pub const TIME_OFFSET_FIELD: &'static str = "timeOffset";
    /// Field holding the gravity exponent.
    pub const GRAVITY_FIELD: &'static str = "gravity";

    /// Construct parameters directly.
    #[must_use]
    pub const fn new(time_offset: f64, gravity: f64) -> Self {
        Self {
            time_offset,
            gravity,
        }
    }

    /// Read parameters from the configuration document at `path`.
    ///
    /// # Errors
    /// Returns [`DocumentError`] when either field is absent or not numeric.
    pub fn from_document(path: &DocumentPath, doc: &Document) -> Result<Self, DocumentError> {
        Ok(Self {
            time_offset: doc.require_number(path, Self::TIME_OFFSET_FIELD)?,
            gravity: doc.require_number(path, Self::GRAVITY_FIELD)?,
        })
    }

    /// Encode the parameters as a configuration document.
    #[must_use]
    pub fn to_document(&self) -> Document {
        Document::new()
            .with_field(Self::TIME_OFFSET_FIELD, self.time_offset)
            .with_field(Self::GRAVITY_FIELD, self.gravity)
    }

    /// Score `likes` at the given age using these parameters.
    #[must_use]
    pub fn score(&self, likes: f64, elapsed_days: f64) -> f64 {
        popularity(likes, elapsed_days, self.time_offset, self.gravity)
    }
}

/// An item whose popularity the engine maintains.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    /// Engagement count.
    pub likes: f64,
    /// Creation instant; the origin of decay.
    pub date_created: DateTime<Utc>,
    /// Last computed popularity, if any. Output only.
    pub popularity: Option<f64>,
}

impl Suggestion {
    /// Field holding the like count.
    pub const LIKES_FIELD: &'static str = "likes";
    /// Field holding the creation timestamp.
    pub const DATE_CREATED_FIELD: &'static str = "dateCreated";
    /// Field the engine writes the derived score into.
    pub const POPULARITY_FIELD: &'static str = "popularity";

    /// Read a suggestion from the item document at `path`.
    ///
    /// `popularity` is optional; the scoring inputs are required.
    ///
    /// # Errors
    /// Returns [`DocumentError`] when `likes` or `dateCreated` is absent or
    /// has the wrong type.
    pub fn from_document(path: &DocumentPath, doc: &Document) -> Result<Self, DocumentError> {
        Ok(Self {
            likes: doc.require_number(path, Self::LIKES_FIELD)?,
            date_created: doc.require_timestamp(path, Self::DATE_CREATED_FIELD)?,
            popularity: doc.number(Self::POPULARITY_FIELD),
        })
    }

    /// Partial update writing only the popularity field.
    #[must_use]
    pub fn popularity_update(score: f64) -> Document {
        Document::new().with_field(Self::POPULARITY_FIELD, score)
    }
}
