use crate::core::ErrorEntry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why the persistence context refused to write a pending change.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveFailureKind {
    /// An insert hit an existing row with the same key.
    DuplicateKey,
    /// An update or removal targeted a row that no longer exists.
    MissingRow,
}

/// Details of a storage-level save failure handed to [`SaveErrorHandler`].
#[derive(Debug, Clone, PartialEq)]
pub struct SaveFailure {
    pub kind: SaveFailureKind,
    pub entity: &'static str,
    pub key: String,
}

/// Turns a storage failure into a user-facing error, or `None` to keep the default text.
pub type SaveErrorHandler = fn(&SaveFailure) -> Option<ErrorEntry>;

/// Process-wide defaults for every CRUD operation.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Reading a single row that does not exist sets a message instead of an error.
    pub no_error_on_read_single_null: bool,

    /// Validate entities on save when the caller works with entity types directly.
    pub direct_access_validate_on_save: bool,

    /// Validate entities on save when the caller works through a transfer type.
    pub dto_access_validate_on_save: bool,

    /// Optional translation of storage failures into friendlier errors.
    #[serde(skip)]
    pub save_error_handler: Option<SaveErrorHandler>,
}

impl GlobalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn no_error_on_read_single_null(mut self, enabled: bool) -> Self {
        self.no_error_on_read_single_null = enabled;
        self
    }

    pub fn direct_access_validate_on_save(mut self, enabled: bool) -> Self {
        self.direct_access_validate_on_save = enabled;
        self
    }

    pub fn dto_access_validate_on_save(mut self, enabled: bool) -> Self {
        self.dto_access_validate_on_save = enabled;
        self
    }

    pub fn save_error_handler(mut self, handler: SaveErrorHandler) -> Self {
        self.save_error_handler = Some(handler);
        self
    }

    /// Parse from a JSON document; absent keys keep their defaults.
    ///
    /// # Examples
    ///
    /// ```
    /// # use rustcrud::GlobalConfig;
    /// let config = GlobalConfig::from_json(r#"{ "no_error_on_read_single_null": true }"#).unwrap();
    /// assert!(config.no_error_on_read_single_null);
    /// assert!(!config.dto_access_validate_on_save);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| e.to_string())
    }

    /// Translate a storage failure using the configured handler, if any.
    pub fn describe_save_failure(&self, failure: &SaveFailure) -> ErrorEntry {
        if let Some(handler) = self.save_error_handler {
            if let Some(entry) = handler(failure) {
                return entry;
            }
        }
        match failure.kind {
            SaveFailureKind::DuplicateKey => ErrorEntry::general(format!(
                "Cannot add the {} with key {}: that key already exists.",
                failure.entity, failure.key
            )),
            SaveFailureKind::MissingRow => ErrorEntry::general(format!(
                "The {} with key {} no longer exists.",
                failure.entity, failure.key
            )),
        }
    }
}

impl fmt::Debug for GlobalConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalConfig")
            .field(
                "no_error_on_read_single_null",
                &self.no_error_on_read_single_null,
            )
            .field(
                "direct_access_validate_on_save",
                &self.direct_access_validate_on_save,
            )
            .field(
                "dto_access_validate_on_save",
                &self.dto_access_validate_on_save,
            )
            .field("save_error_handler", &self.save_error_handler.is_some())
            .finish()
    }
}

/// Per transfer type overrides of [`GlobalConfig`]. `None` keeps the global value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerTypeConfig {
    pub validate_on_save: Option<bool>,
    pub no_error_on_read_single_null: Option<bool>,
}

impl PerTypeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate_on_save(mut self, enabled: bool) -> Self {
        self.validate_on_save = Some(enabled);
        self
    }

    pub fn no_error_on_read_single_null(mut self, enabled: bool) -> Self {
        self.no_error_on_read_single_null = Some(enabled);
        self
    }

    pub(crate) fn merged_validate_on_save(&self, global: &GlobalConfig) -> bool {
        self.validate_on_save
            .unwrap_or(global.dto_access_validate_on_save)
    }

    pub(crate) fn merged_no_error_on_read_single_null(&self, global: &GlobalConfig) -> bool {
        self.no_error_on_read_single_null
            .unwrap_or(global.no_error_on_read_single_null)
    }
}
