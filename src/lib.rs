//! Generic CRUD services over persisted entities and the transfer types
//! (DTOs) mapped onto them.
//!
//! Creating and reading an entity through a transfer type:
//!
//! ```
//! use rustcrud::prelude::dx::*;
//! use std::sync::Arc;
//!
//! #[derive(Debug, Clone, PartialEq, Default)]
//! pub struct Book {
//!     pub book_id: i64,
//!     pub title: String,
//! }
//! impl_shape!(Book: Default {
//!     book_id: i64 = Public,
//!     title: String = Public,
//! });
//! impl CrudType for Book {
//!     type Entity = Book;
//! }
//! impl Entity for Book {}
//!
//! #[derive(Debug, Clone, Default)]
//! pub struct BookDto {
//!     pub book_id: i64,
//!     pub title: String,
//! }
//! impl_shape!(BookDto: Default {
//!     book_id: i64 = Public,
//!     title: String = Public,
//! });
//! impl CrudType for BookDto {
//!     type Entity = Book;
//! }
//!
//! # fn main() -> rustcrud::Result<()> {
//! let db = InMemoryDatabase::new();
//! let (setup, mut services) = ServiceSetup::with_cache(
//!     &db.context(),
//!     Arc::new(rustcrud::MetadataCache::new()),
//!     Arc::new(GlobalConfig::new()),
//! )
//! .register::<Book>()
//! .register::<BookDto>()
//! .into_services(db.context(), rustcrud::ConventionMapper);
//! assert!(setup.is_valid());
//!
//! let dto = BookDto { book_id: 0, title: "Dune".into() };
//! let created = services.create_and_save(dto, None)?;
//! assert_eq!(created.value.map(|b| b.book_id), Some(1));
//!
//! let read = services.read_single::<BookDto>(&[Value::from(1)])?;
//! assert_eq!(read.value.map(|b| b.title), Some("Dune".to_string()));
//! # Ok(())
//! # }
//! ```

// ============================================================================
// rustcrud Library
// ============================================================================

pub mod config;
pub mod context;
pub mod core;
pub mod crud;
pub mod decode;
pub mod mapping;
pub mod prelude;
pub mod setup;
pub mod shape;

// Re-export main types for convenience
pub use config::{GlobalConfig, PerTypeConfig, SaveErrorHandler, SaveFailure, SaveFailureKind};
pub use context::{InMemoryContext, InMemoryDatabase, PersistenceContext, Query};
pub use crate::core::{CrudError, ErrorEntry, FieldError, Outcome, Result, Status, Value, ValueKind};
pub use crud::CrudServices;
pub use decode::MetadataCache;
pub use mapping::{ConventionMapper, Mapper, MappingProfile};
pub use setup::ServiceSetup;
pub use shape::{
    CrudType, Entity, EntityConstructor, EntityMethod, FieldAccess, FieldValues, Shape,
    Visibility,
};
