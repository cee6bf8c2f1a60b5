#![allow(dead_code)]

use rustcrud::prelude::dx::*;
use rustcrud::prelude::advanced::{FieldInfo, Shape};
use rustcrud::{
    ConventionMapper, ErrorEntry, FieldError, InMemoryContext, MetadataCache, PersistenceContext,
    ValueKind,
};
use std::sync::Arc;

// ============================================================================
// Entities
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalEntity {
    pub id: i64,
    pub my_int: i32,
    pub my_string: String,
}

impl_shape!(NormalEntity: Default {
    id: i64 = Public,
    my_int: i32 = Public,
    my_string: String = Public,
});

impl CrudType for NormalEntity {
    type Entity = NormalEntity;
}

impl Entity for NormalEntity {
    fn validate(&self) -> Vec<ErrorEntry> {
        if self.my_int < 0 {
            vec![ErrorEntry::for_field("my_int", "MyInt must not be negative.")]
        } else {
            Vec::new()
        }
    }
}

/// Composite key `(my_string, my_int)`, only constructible through `create`.
#[derive(Debug, Clone, PartialEq)]
pub struct DddCompositeIntString {
    pub my_string: String,
    pub my_int: i32,
    pub note: String,
}

impl_shape!(DddCompositeIntString {
    my_string: String = PrivateSet,
    my_int: i32 = PrivateSet,
    note: String = PrivateSet,
});

impl DddCompositeIntString {
    pub fn create(my_string: String, my_int: i32) -> Result<Self, Status> {
        if my_int <= 0 {
            let mut status = Status::new();
            status.add_field_error("my_int", "MyInt must be positive.");
            return Err(status);
        }
        Ok(Self {
            my_string,
            my_int,
            note: String::new(),
        })
    }
}

impl CrudType for DddCompositeIntString {
    type Entity = DddCompositeIntString;
}

impl Entity for DddCompositeIntString {
    fn constructors() -> Vec<EntityConstructor<Self>> {
        vec![EntityConstructor::new("create", &["my_string", "my_int"], |v| {
            Self::create(v.require("my_string")?, v.require("my_int")?)
        })]
    }

    fn update_methods() -> Vec<EntityMethod<Self>> {
        vec![EntityMethod::new("set_note", &["note"], |e, v| {
            e.note = v.require("note")?;
            Ok(())
        })]
    }
}

/// A book with private setters, changed only through its methods.
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    pub book_id: i64,
    pub title: String,
    pub author: String,
    pub price: f64,
}

impl_shape!(Book {
    book_id: i64 = Public,
    title: String = PrivateSet,
    author: String = PrivateSet,
    price: f64 = PrivateSet,
});

impl Book {
    pub fn create_book(title: String, author: String) -> Result<Self, Status> {
        Self::create_with_price(title, author, 0.0)
    }

    pub fn create_with_price(title: String, author: String, price: f64) -> Result<Self, Status> {
        if title.trim().is_empty() {
            let mut status = Status::new();
            status.add_field_error("title", "A book must have a title.");
            return Err(status);
        }
        Ok(Self {
            book_id: 0,
            title,
            author,
            price,
        })
    }

    pub fn change_price(&mut self, price: f64) -> Result<(), Status> {
        if price < 0.0 {
            let mut status = Status::new();
            status.add_field_error("price", "The price cannot be negative.");
            return Err(status);
        }
        self.price = price;
        Ok(())
    }
}

impl CrudType for Book {
    type Entity = Book;
}

impl Entity for Book {
    fn constructors() -> Vec<EntityConstructor<Self>> {
        vec![
            EntityConstructor::new("create_book", &["title", "author"], |v| {
                Book::create_book(v.require("title")?, v.require("author")?)
            }),
            EntityConstructor::new("create_with_price", &["title", "author", "price"], |v| {
                Book::create_with_price(v.require("title")?, v.require("author")?, v.require("price")?)
            }),
        ]
    }

    fn update_methods() -> Vec<EntityMethod<Self>> {
        vec![
            EntityMethod::new("change_title", &["title"], |b, v| {
                b.title = v.require("title")?;
                Ok(())
            }),
            EntityMethod::new("change_price", &["price"], |b, v| {
                b.change_price(v.require("price")?)
            }),
        ]
    }
}

/// No `id` and no `{type}_id` field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Orphan {
    pub name: String,
}

impl_shape!(Orphan: Default {
    name: String = Public,
});

impl CrudType for Orphan {
    type Entity = Orphan;
}

impl Entity for Orphan {}

// ============================================================================
// Transfer types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalEntityDto {
    pub id: i64,
    pub my_int: i32,
    pub my_string: String,
}

impl_shape!(NormalEntityDto: Default {
    id: i64 = Public,
    my_int: i32 = Public,
    my_string: String = Public,
});

impl CrudType for NormalEntityDto {
    type Entity = NormalEntity;
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalEntityKeyPrivateSetDto {
    pub id: i64,
    pub my_int: i32,
}

impl_shape!(NormalEntityKeyPrivateSetDto: Default {
    id: i64 = PrivateSet,
    my_int: i32 = Public,
});

impl CrudType for NormalEntityKeyPrivateSetDto {
    type Entity = NormalEntity;
}

/// Declares `id` without storage of its own.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalEntityKeyAbstractDto {
    pub id: i64,
    pub my_string: String,
}

impl_shape!(NormalEntityKeyAbstractDto: Default {
    id: i64 = Abstract,
    my_string: String = Public,
});

impl CrudType for NormalEntityKeyAbstractDto {
    type Entity = NormalEntity;
}

/// Validates on save whatever the global setting says.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StrictNormalEntityDto {
    pub id: i64,
    pub my_int: i32,
}

impl_shape!(StrictNormalEntityDto: Default {
    id: i64 = Public,
    my_int: i32 = Public,
});

impl CrudType for StrictNormalEntityDto {
    type Entity = NormalEntity;

    fn per_type_config() -> PerTypeConfig {
        PerTypeConfig::new()
            .validate_on_save(true)
            .no_error_on_read_single_null(true)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HiddenDto {
    pub id: i64,
}

impl Shape for HiddenDto {
    const TYPE_NAME: &'static str = "HiddenDto";
    const VISIBILITY: Visibility = Visibility::Restricted;

    fn fields() -> &'static [FieldInfo] {
        const FIELDS: &[FieldInfo] = &[FieldInfo::new(
            "id",
            ValueKind::Integer,
            false,
            FieldAccess::Public,
        )];
        FIELDS
    }

    fn get(&self, field: &str) -> Option<Value> {
        (field == "id").then(|| Value::from(self.id))
    }

    fn set(&mut self, field: &str, value: Value) -> Result<(), FieldError> {
        match field {
            "id" => {
                self.id = value.as_i64().ok_or_else(|| FieldError::Missing("id".into()))?;
                Ok(())
            }
            _ => Err(FieldError::Missing(field.to_string())),
        }
    }

    fn blank() -> Option<Self> {
        Some(Self::default())
    }
}

impl CrudType for HiddenDto {
    type Entity = NormalEntity;
}

/// A transfer type without parameterless construction.
#[derive(Debug, Clone, PartialEq)]
pub struct NoBlankDto {
    pub id: i64,
}

impl_shape!(NoBlankDto {
    id: i64 = Public,
});

impl CrudType for NoBlankDto {
    type Entity = NormalEntity;
}

/// Field order differs from the key order on purpose.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DddCompositeIntStringCreateDto {
    pub my_int: i32,
    pub my_string: String,
}

impl_shape!(DddCompositeIntStringCreateDto: Default {
    my_int: i32 = Public,
    my_string: String = Public,
});

impl CrudType for DddCompositeIntStringCreateDto {
    type Entity = DddCompositeIntString;
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DddCompositeIntStringNoteDto {
    pub my_int: i32,
    pub my_string: String,
    pub note: String,
}

impl_shape!(DddCompositeIntStringNoteDto: Default {
    my_int: i32 = Public,
    my_string: String = Public,
    note: String = Public,
});

impl CrudType for DddCompositeIntStringNoteDto {
    type Entity = DddCompositeIntString;
}

/// Supplies only half of the composite key.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DddHalfKeyDto {
    pub my_string: String,
}

impl_shape!(DddHalfKeyDto: Default {
    my_string: String = Public,
});

impl CrudType for DddHalfKeyDto {
    type Entity = DddCompositeIntString;
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CreateBookDto {
    pub book_id: i64,
    pub title: String,
    pub author: String,
}

impl_shape!(CreateBookDto: Default {
    book_id: i64 = Public,
    title: String = Public,
    author: String = Public,
});

impl CrudType for CreateBookDto {
    type Entity = Book;
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CreateBookWithPriceDto {
    pub book_id: i64,
    pub title: String,
    pub author: String,
    pub price: f64,
}

impl_shape!(CreateBookWithPriceDto: Default {
    book_id: i64 = Public,
    title: String = Public,
    author: String = Public,
    price: f64 = Public,
});

impl CrudType for CreateBookWithPriceDto {
    type Entity = Book;
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChangeTitleDto {
    pub book_id: i64,
    pub title: String,
}

impl_shape!(ChangeTitleDto: Default {
    book_id: i64 = Public,
    title: String = Public,
});

impl CrudType for ChangeTitleDto {
    type Entity = Book;
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChangePriceDto {
    pub book_id: i64,
    pub price: f64,
}

impl_shape!(ChangePriceDto: Default {
    book_id: i64 = Public,
    price: f64 = Public,
});

impl CrudType for ChangePriceDto {
    type Entity = Book;
}

/// Read-only list view with a renamed field and an ignored one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BookListDto {
    pub book_id: i64,
    pub title: String,
    pub written_by: String,
    pub price: String,
}

impl_shape!(BookListDto: Default {
    book_id: i64 = PrivateSet,
    title: String = PrivateSet,
    written_by: String = PrivateSet,
    price: String = Public,
});

impl CrudType for BookListDto {
    type Entity = Book;

    fn mapping_profile() -> MappingProfile {
        MappingProfile::new()
            .rename("written_by", "author")
            .ignore("price")
    }
}

/// Exposes the `NormalEntity` key and text under its own names.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenamedKeyDto {
    pub normal_id: i64,
    pub label: String,
}

impl_shape!(RenamedKeyDto: Default {
    normal_id: i64 = Public,
    label: String = Public,
});

impl CrudType for RenamedKeyDto {
    type Entity = NormalEntity;

    fn mapping_profile() -> MappingProfile {
        MappingProfile::new()
            .rename("normal_id", "id")
            .rename("label", "my_string")
    }
}

// ============================================================================
// Helpers
// ============================================================================

pub type Services = CrudServices<InMemoryContext, ConventionMapper>;

/// A store with the composite key of [`DddCompositeIntString`] declared.
pub fn database() -> InMemoryDatabase {
    InMemoryDatabase::new().with_key::<DddCompositeIntString>(&["my_string", "my_int"])
}

/// Services over `db` with every well-formed fixture registered in a private cache.
pub fn services(db: &InMemoryDatabase, config: GlobalConfig) -> Services {
    let (status, services) = ServiceSetup::with_cache(
        &db.context(),
        Arc::new(MetadataCache::new()),
        Arc::new(config),
    )
    .register::<NormalEntity>()
    .register::<NormalEntityDto>()
    .register::<NormalEntityKeyPrivateSetDto>()
    .register::<NormalEntityKeyAbstractDto>()
    .register::<StrictNormalEntityDto>()
    .register::<DddCompositeIntString>()
    .register::<DddCompositeIntStringCreateDto>()
    .register::<DddCompositeIntStringNoteDto>()
    .register::<DddHalfKeyDto>()
    .register::<Book>()
    .register::<CreateBookDto>()
    .register::<CreateBookWithPriceDto>()
    .register::<ChangeTitleDto>()
    .register::<ChangePriceDto>()
    .register::<BookListDto>()
    .register::<RenamedKeyDto>()
    .into_services(db.context(), ConventionMapper);
    assert!(status.is_valid(), "{}", status.error_string());
    services
}

pub fn seed_normal(db: &InMemoryDatabase, rows: &[(i32, &str)]) {
    let mut ctx = db.context();
    for (my_int, my_string) in rows {
        let mut row = NormalEntity {
            id: 0,
            my_int: *my_int,
            my_string: my_string.to_string(),
        };
        ctx.add(&mut row);
    }
    let status = ctx.save_changes(false, &GlobalConfig::new());
    assert!(status.is_valid(), "{}", status.error_string());
}

pub fn seed_book(db: &InMemoryDatabase, title: &str, author: &str, price: f64) -> i64 {
    let mut ctx = db.context();
    let mut book = Book {
        book_id: 0,
        title: title.to_string(),
        author: author.to_string(),
        price,
    };
    ctx.add(&mut book);
    let status = ctx.save_changes(false, &GlobalConfig::new());
    assert!(status.is_valid(), "{}", status.error_string());
    book.book_id
}
