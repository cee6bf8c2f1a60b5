//! Capability traits every entity and transfer type implements.
//!
//! A `Shape` is the static description the descriptor cache decodes: the
//! field list with kinds and write access, plus by-name access to field values.
//! Implement it by hand or with [`impl_shape!`](crate::impl_shape).

mod macros;
mod methods;

pub use methods::{ApplyFn, BuildFn, EntityConstructor, EntityMethod, FieldValues};

pub(crate) use methods::Callable;

use crate::config::PerTypeConfig;
use crate::core::{ErrorEntry, FieldError, Value, ValueKind};
use crate::mapping::MappingProfile;
use std::fmt;

/// How a field can be written from outside the type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldAccess {
    /// Anyone may write it.
    Public,
    /// Only the type itself (and projection) may write it.
    PrivateSet,
    /// A declared accessor without backing storage of its own.
    Abstract,
}

impl FieldAccess {
    pub const fn is_public_writable(&self) -> bool {
        matches!(self, Self::Public)
    }

    pub const fn has_storage(&self) -> bool {
        !matches!(self, Self::Abstract)
    }
}

/// Static description of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: &'static str,
    pub kind: ValueKind,
    pub nullable: bool,
    pub access: FieldAccess,
}

impl FieldInfo {
    pub const fn new(
        name: &'static str,
        kind: ValueKind,
        nullable: bool,
        access: FieldAccess,
    ) -> Self {
        Self {
            name,
            kind,
            nullable,
            access,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Restricted,
}

pub trait Shape: Send + Sync + 'static {
    const TYPE_NAME: &'static str;
    const VISIBILITY: Visibility = Visibility::Public;

    fn fields() -> &'static [FieldInfo];

    fn get(&self, field: &str) -> Option<Value>;

    /// Stores `value` into `field` whatever its [`FieldAccess`]; callers decide
    /// whether they are allowed to write.
    fn set(&mut self, field: &str, value: Value) -> Result<(), FieldError>;

    /// Parameterless construction, when the type supports it.
    fn blank() -> Option<Self>
    where
        Self: Sized,
    {
        None
    }

    fn field_info(name: &str) -> Option<&'static FieldInfo>
    where
        Self: Sized,
    {
        Self::fields().iter().find(|f| f.name == name)
    }
}

/// A type the CRUD services accept: an entity (linked to itself) or a transfer
/// type linked to exactly one entity.
pub trait CrudType: Shape + Clone {
    type Entity: Entity;

    fn per_type_config() -> PerTypeConfig {
        PerTypeConfig::default()
    }

    fn mapping_profile() -> MappingProfile {
        MappingProfile::default()
    }
}

/// A persisted type identified by a key.
pub trait Entity: CrudType<Entity = Self> + PartialEq + fmt::Debug {
    /// Constructors and static factories a transfer type can create it through.
    fn constructors() -> Vec<EntityConstructor<Self>> {
        Vec::new()
    }

    /// Named methods a transfer type can update it through.
    fn update_methods() -> Vec<EntityMethod<Self>> {
        Vec::new()
    }

    /// Checked by the persistence context when a save asks for validation.
    fn validate(&self) -> Vec<ErrorEntry> {
        Vec::new()
    }
}

/// Human readable name of a type: transfer suffixes dropped, words split.
///
/// `BookListDto` becomes `Book List`.
pub fn display_name(type_name: &str) -> String {
    let trimmed = ["ViewModel", "Dto", "Vm", "DTO", "VM"]
        .iter()
        .find_map(|suffix| {
            type_name
                .strip_suffix(suffix)
                .filter(|rest| !rest.is_empty())
        })
        .unwrap_or(type_name);

    let mut out = String::with_capacity(trimmed.len() + 4);
    let chars: Vec<char> = trimmed.chars().collect();
    for (i, ch) in chars.iter().enumerate() {
        if i > 0 && ch.is_uppercase() {
            let prev_lower = chars[i - 1].is_lowercase();
            let next_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
            if prev_lower || (next_lower && chars[i - 1].is_uppercase()) {
                out.push(' ');
            }
        }
        out.push(*ch);
    }
    out
}
