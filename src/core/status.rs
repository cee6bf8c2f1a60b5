use crate::core::FieldError;
use serde::Serialize;
use std::fmt;

/// One recorded problem, optionally scoped to a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEntry {
    pub field: Option<String>,
    pub message: String,
}

impl ErrorEntry {
    pub fn general(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }

    pub fn for_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{}: {}", field, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Aggregated validity, message and errors of one logical operation.
///
/// Validity is derived from the error list, so once an error has been
/// recorded the status can never become valid again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Status {
    message: String,
    errors: Vec<ErrorEntry>,
}

impl Status {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn with_error(message: impl Into<String>) -> Self {
        let mut status = Self::new();
        status.add_error(message);
        status
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ErrorEntry] {
        &self.errors
    }

    /// The success message, or an error count once the status is invalid.
    pub fn message(&self) -> String {
        if self.is_valid() {
            return self.message.clone();
        }
        match self.errors.len() {
            1 => "Failed with 1 error".to_string(),
            n => format!("Failed with {} errors", n),
        }
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    pub fn add_error(&mut self, message: impl Into<String>) -> &mut Self {
        self.errors.push(ErrorEntry::general(message));
        self
    }

    pub fn add_field_error(
        &mut self,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> &mut Self {
        self.errors.push(ErrorEntry::for_field(field, message));
        self
    }

    pub fn push(&mut self, entry: ErrorEntry) -> &mut Self {
        self.errors.push(entry);
        self
    }

    /// Merges a sub-operation's status into this one.
    ///
    /// Errors are appended in order. The other status's message replaces ours
    /// only while both are still valid and it actually carries one.
    pub fn combine(&mut self, other: Status) -> &mut Self {
        let Status { message, errors } = other;
        if !errors.is_empty() {
            self.errors.extend(errors);
        } else if self.is_valid() && !message.is_empty() {
            self.message = message;
        }
        self
    }

    pub fn error_string(&self) -> String {
        self.errors
            .iter()
            .map(ErrorEntry::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<FieldError> for Status {
    fn from(err: FieldError) -> Self {
        let mut status = Status::new();
        status.add_field_error(err.field().to_string(), err.to_string());
        status
    }
}

impl From<ErrorEntry> for Status {
    fn from(entry: ErrorEntry) -> Self {
        let mut status = Status::new();
        status.push(entry);
        status
    }
}

/// A value plus the status of the operation that produced it.
///
/// The value is only present while the status is valid.
#[derive(Debug, Clone)]
pub struct Outcome<T> {
    pub value: Option<T>,
    pub status: Status,
}

impl<T> Outcome<T> {
    pub fn new(value: Option<T>, status: Status) -> Self {
        let value = if status.is_valid() { value } else { None };
        Self { value, status }
    }

    pub fn ok(value: T, status: Status) -> Self {
        Self::new(Some(value), status)
    }

    pub fn failed(status: Status) -> Self {
        Self {
            value: None,
            status,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status.is_valid()
    }

    pub fn into_value(self) -> Option<T> {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: self.value.map(f),
            status: self.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_makes_status_invalid_for_good() {
        let mut status = Status::with_message("ok");
        assert!(status.is_valid());
        status.add_error("boom");
        status.combine(Status::with_message("later success"));
        assert!(!status.is_valid());
        assert_eq!(status.message(), "Failed with 1 error");
    }

    #[test]
    fn test_combine_takes_last_message_while_valid() {
        let mut status = Status::with_message("first");
        status.combine(Status::with_message("second"));
        assert_eq!(status.message(), "second");

        status.combine(Status::new());
        assert_eq!(status.message(), "second");
    }

    #[test]
    fn test_combine_concatenates_errors_in_order() {
        let mut status = Status::new();
        status.add_field_error("title", "required");
        let mut other = Status::new();
        other.add_error("a");
        other.add_error("b");
        status.combine(other);

        let messages: Vec<_> = status.errors().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["required", "a", "b"]);
        assert_eq!(status.message(), "Failed with 3 errors");
        assert_eq!(status.errors()[0].field.as_deref(), Some("title"));
    }

    #[test]
    fn test_outcome_drops_value_when_invalid() {
        let outcome = Outcome::new(Some(5), Status::with_error("nope"));
        assert!(outcome.value.is_none());
        assert!(!outcome.is_valid());
    }
}
