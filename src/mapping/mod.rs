//! Field mapping between entities and transfer types.

mod convention;
pub(crate) mod create;
mod select;
pub(crate) mod update;

pub use convention::ConventionMapper;

use crate::context::Query;
use crate::core::{Status, ValueKind};
use crate::shape::{CrudType, FieldInfo, FieldValues, Shape};
use log::warn;

/// Projects entity queries to transfer types and copies transfer values back.
pub trait Mapper {
    /// Lazily turns a query of entities into a query of `D`.
    fn project<D: CrudType>(&self, source: Query<D::Entity>, mapping: &MappingConfig) -> Query<D>;

    /// Copies the mapped fields of `source` onto `target`.
    ///
    /// Conversion failures are reported per field in the returned status.
    fn copy_to_entity<D: CrudType>(
        &self,
        source: &D,
        target: &mut D::Entity,
        mapping: &MappingConfig,
    ) -> Status;
}

/// Declarative mapping overrides supplied by a transfer type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingProfile {
    renames: Vec<(&'static str, &'static str)>,
    ignored: Vec<&'static str>,
}

impl MappingProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps the transfer field `transfer` to the entity field `entity`.
    pub fn rename(mut self, transfer: &'static str, entity: &'static str) -> Self {
        self.renames.retain(|(t, _)| *t != transfer);
        self.renames.push((transfer, entity));
        self
    }

    /// Leaves the transfer field out of every mapping.
    pub fn ignore(mut self, transfer: &'static str) -> Self {
        if !self.ignored.contains(&transfer) {
            self.ignored.push(transfer);
        }
        self
    }

    pub fn is_ignored(&self, transfer: &str) -> bool {
        self.ignored.contains(&transfer)
    }

    /// Entity-side name of a transfer field.
    pub fn entity_name(&self, transfer: &'static str) -> &'static str {
        self.renames
            .iter()
            .find(|(t, _)| *t == transfer)
            .map(|(_, e)| *e)
            .unwrap_or(transfer)
    }
}

/// A transfer field linked to an entity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPair {
    pub transfer: &'static str,
    pub entity: &'static str,
}

/// Field pairs resolved once per transfer type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingConfig {
    /// Entity to transfer, used by projection.
    pub read_pairs: Vec<FieldPair>,
    /// Transfer to entity, used when copying onto an existing entity.
    pub write_pairs: Vec<FieldPair>,
    /// Transfer to entity including public key fields, used on creation.
    pub create_pairs: Vec<FieldPair>,
    /// Every stored, non-ignored transfer field under its entity-side name.
    pub value_names: Vec<FieldPair>,
}

impl MappingConfig {
    /// Resolves the pairs between `D` and its entity.
    ///
    /// Pairs whose kinds cannot be converted are skipped with a warning.
    pub fn resolve<D: CrudType>(key_names: &[&'static str]) -> Self {
        let profile = D::mapping_profile();
        let entity_fields = <D::Entity as Shape>::fields();
        let mut config = MappingConfig::default();

        for field in D::fields() {
            if profile.is_ignored(field.name) || !field.access.has_storage() {
                continue;
            }
            let entity_name = profile.entity_name(field.name);
            let pair = FieldPair {
                transfer: field.name,
                entity: entity_name,
            };
            config.value_names.push(pair);

            let Some(target) = entity_fields.iter().find(|f| f.name == entity_name) else {
                continue;
            };

            if convertible(target, field) {
                config.read_pairs.push(pair);
            } else {
                warn!(
                    "Skipping {}.{} -> {}.{}: {} cannot be read as {}",
                    <D::Entity as Shape>::TYPE_NAME,
                    target.name,
                    D::TYPE_NAME,
                    field.name,
                    target.kind,
                    field.kind
                );
            }

            if target.access.is_public_writable() && convertible(field, target) {
                config.create_pairs.push(pair);
                if !key_names.contains(&target.name) {
                    config.write_pairs.push(pair);
                }
            }
        }
        config
    }

    /// The same mapping, with key fields writable.
    pub fn for_create(&self) -> MappingConfig {
        MappingConfig {
            write_pairs: self.create_pairs.clone(),
            ..self.clone()
        }
    }

    /// Reads the transfer's values keyed by entity-side names.
    pub fn source_values<D: Shape>(&self, source: &D) -> FieldValues {
        let mut values = FieldValues::new();
        for pair in &self.value_names {
            if let Some(value) = source.get(pair.transfer) {
                values.insert(pair.entity, value);
            }
        }
        values
    }
}

fn convertible(from: &FieldInfo, to: &FieldInfo) -> bool {
    let kinds_ok = from.kind.can_assign_to(&to.kind)
        || (from.kind == ValueKind::Text && to.kind == ValueKind::Uuid);
    kinds_ok && (to.nullable || !from.nullable)
}
