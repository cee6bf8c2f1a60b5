pub mod error;
pub mod status;
pub mod value;

pub use error::{CrudError, FieldError, Result};
pub use status::{ErrorEntry, Outcome, Status};
pub use value::{FieldType, Value, ValueKind};
