use crate::core::{FieldError, FieldType, Status, Value};
use std::collections::BTreeMap;

/// Named values read from a transfer instance, keyed by entity-side field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldValues {
    values: BTreeMap<String, Value>,
}

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn get_value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Typed read of a value that must be present.
    pub fn require<T: FieldType>(&self, name: &str) -> Result<T, FieldError> {
        let value = self
            .values
            .get(name)
            .cloned()
            .ok_or_else(|| FieldError::Missing(name.to_string()))?;
        T::from_value(value).map_err(|e| e.for_field(name))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

pub type BuildFn<E> = fn(&FieldValues) -> Result<E, Status>;
pub type ApplyFn<E> = fn(&mut E, &FieldValues) -> Result<(), Status>;

/// A constructor or static factory that builds an entity from named values.
///
/// Errors returned by `build` are data errors; they end up in the caller's status.
pub struct EntityConstructor<E> {
    pub name: &'static str,
    pub params: &'static [&'static str],
    pub build: BuildFn<E>,
}

impl<E> EntityConstructor<E> {
    pub fn new(name: &'static str, params: &'static [&'static str], build: BuildFn<E>) -> Self {
        Self {
            name,
            params,
            build,
        }
    }
}

/// A named update method on an entity.
#[derive(Debug)]
pub struct EntityMethod<E> {
    pub name: &'static str,
    pub params: &'static [&'static str],
    pub apply: ApplyFn<E>,
}

impl<E> EntityMethod<E> {
    pub fn new(name: &'static str, params: &'static [&'static str], apply: ApplyFn<E>) -> Self {
        Self {
            name,
            params,
            apply,
        }
    }
}

/// Something with a name and a parameter list that a transfer type may satisfy.
pub(crate) trait Callable {
    fn name(&self) -> &'static str;
    fn params(&self) -> &'static [&'static str];
}

impl<E> Callable for EntityConstructor<E> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn params(&self) -> &'static [&'static str] {
        self.params
    }
}

impl<E> Callable for EntityMethod<E> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn params(&self) -> &'static [&'static str] {
        self.params
    }
}
