//! Configuration shared by the trigger handlers.

use std::num::NonZeroUsize;

use popularity_core::DocumentPath;

use crate::ConfigError;

/// Collection holding the singleton parameter document.
pub const DEFAULT_PARAMETERS_COLLECTION: &str = "PopularityParameters";
/// Id of the singleton parameter document.
pub const DEFAULT_PARAMETERS_ID: &str = "NhaJD2HJZfHGrohUSpzm";
/// Collection holding the scored items.
pub const DEFAULT_ITEMS_COLLECTION: &str = "Suggestions";
/// Maximum number of popularity updates in flight during a full recompute.
pub const DEFAULT_CONCURRENCY: usize = 16;

/// Where the handlers find their documents and how wide they fan out.
///
/// # Examples
///
/// ```
/// use popularity_triggers::TriggerConfig;
///
/// let config = TriggerConfig::default()
///     .with_items_collection("Posts")
///     .with_concurrency(4);
/// assert_eq!(config.items_collection, "Posts");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerConfig {
    /// Collection of the singleton parameter document.
    pub parameters_collection: String,
    /// Id of the singleton parameter document.
    pub parameters_id: String,
    /// Collection of scored items.
    pub items_collection: String,
    /// Upper bound on concurrent updates. Must be positive.
    pub concurrency: usize,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            parameters_collection: DEFAULT_PARAMETERS_COLLECTION.to_owned(),
            parameters_id: DEFAULT_PARAMETERS_ID.to_owned(),
            items_collection: DEFAULT_ITEMS_COLLECTION.to_owned(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl TriggerConfig {
    /// Point the handlers at a different parameter document.
    #[must_use]
    pub fn with_parameters_document(
        mut self,
        collection: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        self.parameters_collection = collection.into();
        self.parameters_id = id.into();
        self
    }

    /// Point the handlers at a different item collection.
    #[must_use]
    pub fn with_items_collection(mut self, collection: impl Into<String>) -> Self {
        self.items_collection = collection.into();
        self
    }

    /// Set the fan-out limit.
    #[must_use]
    pub const fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub(crate) fn resolve(&self) -> Result<Settings, ConfigError> {
        let parameters = DocumentPath::new(
            self.parameters_collection.as_str(),
            self.parameters_id.as_str(),
        )?;
        if self.items_collection.is_empty() || self.items_collection.contains('/') {
            return Err(ConfigError::InvalidCollection {
                name: self.items_collection.clone(),
            });
        }
        let concurrency = NonZeroUsize::new(self.concurrency).ok_or(ConfigError::ZeroConcurrency)?;
        Ok(Settings {
            parameters,
            items: self.items_collection.clone(),
            concurrency,
        })
    }
}

/// Validated form of [`TriggerConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Settings {
    pub(crate) parameters: DocumentPath,
    pub(crate) items: String,
    pub(crate) concurrency: NonZeroUsize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn defaults_resolve() {
        let settings = TriggerConfig::default().resolve().expect("defaults are valid");
        assert_eq!(
            settings.parameters.to_string(),
            "PopularityParameters/NhaJD2HJZfHGrohUSpzm"
        );
        assert_eq!(settings.items, "Suggestions");
        assert_eq!(settings.concurrency.get(), DEFAULT_CONCURRENCY);
    }

    #[rstest]
    fn zero_concurrency_is_rejected() {
        let err = TriggerConfig::default()
            .with_concurrency(0)
            .resolve()
            .expect_err("zero is invalid");
        assert_eq!(err, ConfigError::ZeroConcurrency);
    }

    #[rstest]
    #[case("")]
    #[case("Suggestions/nested")]
    fn malformed_item_collections_are_rejected(#[case] name: &str) {
        let err = TriggerConfig::default()
            .with_items_collection(name)
            .resolve()
            .expect_err("collection is invalid");
        assert!(matches!(err, ConfigError::InvalidCollection { .. }));
    }

    #[rstest]
    fn empty_parameter_id_is_rejected() {
        let err = TriggerConfig::default()
            .with_parameters_document("PopularityParameters", "")
            .resolve()
            .expect_err("id is invalid");
        assert!(matches!(err, ConfigError::InvalidParametersPath(_)));
    }
}
