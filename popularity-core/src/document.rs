//! Schemaless documents as held by the managed document store.
//!
//! Documents are ordered maps from field name to [`FieldValue`]. Values use
//! the externally tagged encoding of the store's REST interface, so a JSON
//! export round-trips without a schema:
//!
//! ```json
//! { "likes": { "integerValue": "10" }, "dateCreated": { "timestampValue": "2024-05-01T12:00:00Z" } }
//! ```
//!
//! The REST interface sends integers as decimal strings and non-finite
//! doubles as `"NaN"`, `"Infinity"` or `"-Infinity"`. Both are accepted on
//! input. Integers and finite doubles are written as plain JSON numbers;
//! non-finite doubles keep their string names so they survive a round trip.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single typed value stored in a document field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Explicit null.
    #[serde(rename = "nullValue")]
    Null,
    /// Boolean flag.
    #[serde(rename = "booleanValue")]
    Boolean(bool),
    /// Signed 64-bit integer.
    #[serde(rename = "integerValue")]
    Integer(#[serde(deserialize_with = "integer_value::deserialize")] i64),
    /// IEEE-754 double, including infinities and NaN.
    #[serde(rename = "doubleValue")]
    Double(#[serde(with = "double_value")] f64),
    /// Instant in UTC.
    #[serde(rename = "timestampValue")]
    Timestamp(DateTime<Utc>),
    /// UTF-8 string.
    #[serde(rename = "stringValue")]
    String(String),
}

impl FieldValue {
    /// Name of the value's type, used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Double(_) => "double",
            Self::Timestamp(_) => "timestamp",
            Self::String(_) => "string",
        }
    }

    /// Interpret the value as a number.
    ///
    /// Integers and doubles are both accepted because JSON clients of the
    /// store cannot tell them apart.
    #[expect(
        clippy::cast_precision_loss,
        reason = "like counts far below 2^53 convert exactly"
    )]
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Integer(value) => Some(*value as f64),
            Self::Double(value) => Some(*value),
            _ => None,
        }
    }

    /// Interpret the value as a timestamp.
    #[must_use]
    pub const fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(value) => Some(*value),
            _ => None,
        }
    }
}

/// A numeric value as either a JSON number or its string spelling.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText<T> {
    Number(T),
    Text(String),
}

mod integer_value {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};

    use super::NumberOrText;

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        match NumberOrText::<i64>::deserialize(deserializer)? {
            NumberOrText::Number(value) => Ok(value),
            NumberOrText::Text(text) => text
                .parse()
                .map_err(|_| D::Error::custom(format!("invalid integerValue {text:?}"))),
        }
    }
}

mod double_value {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::NumberOrText;

    const NAN: &str = "NaN";
    const INFINITY: &str = "Infinity";
    const NEG_INFINITY: &str = "-Infinity";

    #[expect(
        clippy::trivially_copy_pass_by_ref,
        reason = "serde's `with` contract passes the field by reference"
    )]
    pub(super) fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_str(NAN)
        } else if value.is_infinite() && value.is_sign_positive() {
            serializer.serialize_str(INFINITY)
        } else if value.is_infinite() {
            serializer.serialize_str(NEG_INFINITY)
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match NumberOrText::<f64>::deserialize(deserializer)? {
            NumberOrText::Number(value) => Ok(value),
            NumberOrText::Text(text) => match text.as_str() {
                NAN => Ok(f64::NAN),
                INFINITY => Ok(f64::INFINITY),
                NEG_INFINITY => Ok(f64::NEG_INFINITY),
                _ => Err(D::Error::custom(format!("invalid doubleValue {text:?}"))),
            },
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

/// Field map of a single document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    fields: BTreeMap<String, FieldValue>,
}

impl Document {
    /// Create an empty document.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Return the document with `name` set to `value`.
    ///
    /// # Examples
    ///
    /// ```
    /// use popularity_core::{Document, FieldValue};
    ///
    /// let doc = Document::new().with_field("likes", 3_i64);
    /// assert_eq!(doc.get("likes"), Some(&FieldValue::Integer(3)));
    /// ```
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set `name` to `value`, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Look up a field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Merge `other` into this document, overwriting fields it names.
    ///
    /// This is the semantics of a partial update: fields absent from `other`
    /// keep their current value.
    pub fn merge(&mut self, other: Self) {
        self.fields.extend(other.fields);
    }

    /// Iterate over fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Report whether the document has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Numeric value of `name`, if present and numeric.
    #[must_use]
    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(FieldValue::as_number)
    }

    /// Timestamp value of `name`, if present and a timestamp.
    #[must_use]
    pub fn timestamp(&self, name: &str) -> Option<DateTime<Utc>> {
        self.get(name).and_then(FieldValue::as_timestamp)
    }

    /// Read a required numeric field.
    ///
    /// # Errors
    /// Returns [`DocumentError::MissingField`] when the field is absent and
    /// [`DocumentError::UnexpectedType`] when it is not a number.
    pub fn require_number(
        &self,
        path: &DocumentPath,
        field: &'static str,
    ) -> Result<f64, DocumentError> {
        let value = self.require(path, field)?;
        value
            .as_number()
            .ok_or_else(|| DocumentError::UnexpectedType {
                path: path.clone(),
                field,
                expected: "number",
                found: value.type_name(),
            })
    }

    /// Read a required timestamp field.
    ///
    /// # Errors
    /// Returns [`DocumentError::MissingField`] when the field is absent and
    /// [`DocumentError::UnexpectedType`] when it is not a timestamp.
    pub fn require_timestamp(
        &self,
        path: &DocumentPath,
        field: &'static str,
    ) -> Result<DateTime<Utc>, DocumentError> {
        let value = self.require(path, field)?;
        value
            .as_timestamp()
            .ok_or_else(|| DocumentError::UnexpectedType {
                path: path.clone(),
                field,
                expected: "timestamp",
                found: value.type_name(),
            })
    }

    fn require(&self, path: &DocumentPath, field: &'static str) -> Result<&FieldValue, DocumentError> {
        self.get(field).ok_or_else(|| DocumentError::MissingField {
            path: path.clone(),
            field,
        })
    }
}

impl<K: Into<String>> FromIterator<(K, FieldValue)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        }
    }
}

/// Errors raised while reading typed fields from a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// A required field was absent.
    #[error("document {path} has no `{field}` field")]
    MissingField {
        /// Document that was read.
        path: DocumentPath,
        /// Name of the absent field.
        field: &'static str,
    },
    /// A field held a value of the wrong type.
    #[error("field `{field}` of {path} should be a {expected}, found {found}")]
    UnexpectedType {
        /// Document that was read.
        path: DocumentPath,
        /// Name of the offending field.
        field: &'static str,
        /// Type the reader expected.
        expected: &'static str,
        /// Type actually stored.
        found: &'static str,
    },
}

/// Location of a document: a collection name and a document id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentPath {
    collection: String,
    id: String,
}

impl DocumentPath {
    /// Build a path from its segments.
    ///
    /// # Errors
    /// Returns [`PathError`] when either segment is empty or contains `/`.
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Result<Self, PathError> {
        let collection_name = collection.into();
        let document_id = id.into();
        validate_segment(&collection_name)?;
        validate_segment(&document_id)?;
        Ok(Self {
            collection: collection_name,
            id: document_id,
        })
    }

    /// Collection holding the document.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Document id within the collection.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

fn validate_segment(segment: &str) -> Result<(), PathError> {
    if segment.is_empty() {
        return Err(PathError::EmptySegment);
    }
    if segment.contains('/') {
        return Err(PathError::NestedSegment {
            segment: segment.to_owned(),
        });
    }
    Ok(())
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

impl FromStr for DocumentPath {
    type Err = PathError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (collection, id) = raw.split_once('/').ok_or_else(|| PathError::Malformed {
            raw: raw.to_owned(),
        })?;
        Self::new(collection, id)
    }
}

impl TryFrom<String> for DocumentPath {
    type Error = PathError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<DocumentPath> for String {
    fn from(path: DocumentPath) -> Self {
        path.to_string()
    }
}

/// Errors raised while parsing a [`DocumentPath`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The path did not have the `collection/id` shape.
    #[error("document path {raw:?} must have the form `collection/id`")]
    Malformed {
        /// Input as supplied.
        raw: String,
    },
    /// A segment was empty.
    #[error("document path segments must not be empty")]
    EmptySegment,
    /// A segment contained a further `/`.
    #[error("document path segment {segment:?} must not contain `/`")]
    NestedSegment {
        /// Offending segment.
        segment: String,
    },
}

/// A document together with its location, as returned by collection reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    /// Where the document lives.
    pub path: DocumentPath,
    /// Field values at read time.
    pub fields: Document,
}

impl DocumentSnapshot {
    /// Pair a path with its fields.
    #[must_use]
    pub const fn new(path: DocumentPath, fields: Document) -> Self {
        Self { path, fields }
    }
}
