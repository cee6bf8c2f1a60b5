use crate::core::{CrudError, Result, Value, ValueKind};
use crate::shape::{Entity, FieldInfo, Shape, display_name};
use std::any::TypeId;

/// One component of an entity's primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyComponent {
    pub name: &'static str,
    pub kind: ValueKind,
    pub position: usize,
}

impl KeyComponent {
    /// Kinds the store assigns on insert when left at their default.
    pub fn is_generated(&self) -> bool {
        matches!(self.kind, ValueKind::Integer | ValueKind::Uuid)
    }
}

/// Decoded static facts about an entity type.
#[derive(Debug, Clone)]
pub struct EntityDescriptor {
    entity_type: TypeId,
    type_name: &'static str,
    display_name: String,
    key_components: Vec<KeyComponent>,
    fields: &'static [FieldInfo],
}

impl EntityDescriptor {
    /// Decodes `E` using the key order reported by the persistence model.
    pub fn build<E: Entity>(key_order: &[&'static str]) -> Result<Self> {
        if key_order.is_empty() {
            return Err(CrudError::NoPrimaryKey(E::TYPE_NAME.to_string()));
        }

        let key_components = key_order
            .iter()
            .enumerate()
            .map(|(position, name)| {
                let field = E::field_info(name).ok_or_else(|| CrudError::UnknownKeyField {
                    entity: E::TYPE_NAME.to_string(),
                    field: name.to_string(),
                })?;
                Ok(KeyComponent {
                    name: field.name,
                    kind: field.kind,
                    position,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            entity_type: TypeId::of::<E>(),
            type_name: E::TYPE_NAME,
            display_name: display_name(E::TYPE_NAME),
            key_components,
            fields: E::fields(),
        })
    }

    pub fn entity_type(&self) -> TypeId {
        self.entity_type
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn key_components(&self) -> &[KeyComponent] {
        &self.key_components
    }

    pub fn key_names(&self) -> Vec<&'static str> {
        self.key_components.iter().map(|k| k.name).collect()
    }

    pub fn is_composite_key(&self) -> bool {
        self.key_components.len() > 1
    }

    pub fn fields(&self) -> &'static [FieldInfo] {
        self.fields
    }

    /// Key values of `entity` in key order; missing fields read as null.
    pub fn keys_of<S: Shape>(&self, entity: &S) -> Vec<Value> {
        self.key_components
            .iter()
            .map(|k| entity.get(k.name).unwrap_or(Value::Null))
            .collect()
    }

    /// A store-generated key (a single integer or UUID component) is unset
    /// while it holds its default value. Any other key is set once every
    /// component has a value, defaults included.
    pub fn is_key_set<S: Shape>(&self, entity: &S) -> bool {
        let values = self.keys_of(entity);
        match (self.key_components.as_slice(), values.as_slice()) {
            ([component], [value]) if component.is_generated() => !value.is_default(),
            _ => values.iter().all(|v| !v.is_null()),
        }
    }

    pub fn key_matches<S: Shape>(&self, entity: &S, keys: &[Value]) -> bool {
        self.keys_of(entity).as_slice() == keys
    }

    /// Checks caller-supplied key values against the key components.
    pub fn check_keys(&self, keys: &[Value]) -> Result<()> {
        if keys.len() != self.key_components.len() {
            return Err(CrudError::KeyMismatch {
                entity: self.type_name.to_string(),
                detail: format!(
                    "expected {} key value(s), got {}",
                    self.key_components.len(),
                    keys.len()
                ),
            });
        }
        for (component, value) in self.key_components.iter().zip(keys) {
            if !component.kind.is_compatible(value, false) {
                return Err(CrudError::KeyMismatch {
                    entity: self.type_name.to_string(),
                    detail: format!(
                        "key '{}' expects {} but got {}",
                        component.name,
                        component.kind,
                        value.type_name()
                    ),
                });
            }
        }
        Ok(())
    }

    /// Renders key values for messages, e.g. `(1, 'Hello')`.
    pub fn format_key(keys: &[Value]) -> String {
        let parts: Vec<String> = keys.iter().map(Value::to_string).collect();
        format!("({})", parts.join(", "))
    }
}
