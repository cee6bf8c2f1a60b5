use thiserror::Error;

/// Usage and configuration faults.
///
/// These signal a programming or setup mistake, never a data condition, so
/// callers should not retry them. Data-state problems (not found, validation
/// failures) travel in a [`Status`](crate::core::Status) instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CrudError {
    #[error(
        "The transfer type '{0}' is not registered. Register it with ServiceSetup before using it with CrudServices"
    )]
    NotRegistered(String),

    #[error("Sorry, but the transfer type '{0}' must be public to be used with CrudServices")]
    NotPublic(String),

    #[error("The transfer type '{0}' must support parameterless construction to be projected")]
    NotBlankConstructible(String),

    #[error("The entity '{0}' has no primary key in the persistence model")]
    NoPrimaryKey(String),

    #[error("Key field '{field}' of entity '{entity}' is not a field of that entity")]
    UnknownKeyField { entity: String, field: String },

    #[error("You cannot delete via the transfer type '{0}'. You must provide a real entity type")]
    DeleteViaTransfer(String),

    #[error(
        "The primary key was not set on the entity '{0}'. An update expects the key(s) to be set, use create instead"
    )]
    KeyNotSet(String),

    #[error("Key mismatch for entity '{entity}': {detail}")]
    KeyMismatch { entity: String, detail: String },

    #[error("The transfer type '{transfer}' does not expose the key field '{field}'")]
    MissingKeyField { transfer: String, field: String },

    #[error("More than one '{0}' matched a single-row read")]
    MultipleMatches(String),

    #[error("Could not find a method called '{method}' on '{entity}' that the transfer type can supply")]
    MethodNotFound { entity: String, method: String },

    #[error("Several methods on '{entity}' match equally well: {candidates}. Name the one to use")]
    AmbiguousMethod { entity: String, candidates: String },

    #[error("Could not find a constructor or static factory on '{entity}' that '{transfer}' can supply")]
    NoConstructor { entity: String, transfer: String },

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Lock error: {0}")]
    LockError(String),
}

pub type Result<T> = std::result::Result<T, CrudError>;

impl<T> From<std::sync::PoisonError<T>> for CrudError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

/// Failure to move a [`Value`](crate::core::Value) in or out of a typed field.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    #[error("Field '{field}' expects {expected} but got {actual}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Field '{field}' cannot hold {value}: out of range")]
    OutOfRange { field: String, value: String },

    #[error("Field '{0}' is missing")]
    Missing(String),

    #[error("Field '{0}' cannot be written")]
    NotWritable(String),
}

impl FieldError {
    pub fn field(&self) -> &str {
        match self {
            Self::TypeMismatch { field, .. } | Self::OutOfRange { field, .. } => field,
            Self::Missing(field) | Self::NotWritable(field) => field,
        }
    }

    /// Re-labels the error with the field it was raised for.
    pub fn for_field(self, name: &str) -> Self {
        match self {
            Self::TypeMismatch {
                expected, actual, ..
            } => Self::TypeMismatch {
                field: name.to_string(),
                expected,
                actual,
            },
            Self::OutOfRange { value, .. } => Self::OutOfRange {
                field: name.to_string(),
                value,
            },
            Self::Missing(_) => Self::Missing(name.to_string()),
            Self::NotWritable(_) => Self::NotWritable(name.to_string()),
        }
    }
}
