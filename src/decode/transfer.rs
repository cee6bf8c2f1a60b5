use super::EntityDescriptor;
use super::keys::transfer_field_for;
use crate::config::{GlobalConfig, PerTypeConfig};
use crate::core::{CrudError, Result};
use crate::mapping::MappingConfig;
use crate::shape::{CrudType, Shape};
use std::any::TypeId;
use std::sync::Arc;

/// Where a key component lives on a transfer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyFieldBinding {
    pub key_name: &'static str,
    /// Transfer-side field name, after the type's renames.
    pub transfer_field: &'static str,
    /// The transfer type has a stored field mapped to the key.
    pub present: bool,
    /// That field is publicly writable, so generated keys can be copied back.
    pub writable: bool,
}

/// Decoded facts about a transfer type and its link to an entity.
#[derive(Debug, Clone)]
pub struct TransferDescriptor {
    transfer_type: TypeId,
    type_name: &'static str,
    entity: Arc<EntityDescriptor>,
    key_bindings: Vec<KeyFieldBinding>,
    mapping: MappingConfig,
    per_type: PerTypeConfig,
}

impl TransferDescriptor {
    pub fn build<D: CrudType>(
        entity: Arc<EntityDescriptor>,
        per_type: &PerTypeConfig,
    ) -> Result<Self> {
        if D::blank().is_none() {
            return Err(CrudError::NotBlankConstructible(D::TYPE_NAME.to_string()));
        }

        let profile = D::mapping_profile();
        let key_bindings = entity
            .key_components()
            .iter()
            .map(|key| {
                let field = transfer_field_for::<D>(&profile, key.name);
                KeyFieldBinding {
                    key_name: key.name,
                    transfer_field: field.map_or(key.name, |f| f.name),
                    present: field.is_some(),
                    writable: field.is_some_and(|f| f.access.is_public_writable()),
                }
            })
            .collect();

        let mapping = MappingConfig::resolve::<D>(&entity.key_names());

        Ok(Self {
            transfer_type: TypeId::of::<D>(),
            type_name: D::TYPE_NAME,
            entity,
            key_bindings,
            mapping,
            per_type: per_type.clone(),
        })
    }

    pub fn transfer_type(&self) -> TypeId {
        self.transfer_type
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn entity(&self) -> &Arc<EntityDescriptor> {
        &self.entity
    }

    pub fn key_bindings(&self) -> &[KeyFieldBinding] {
        &self.key_bindings
    }

    pub fn mapping(&self) -> &MappingConfig {
        &self.mapping
    }

    pub fn per_type_config(&self) -> &PerTypeConfig {
        &self.per_type
    }

    /// The type's override, or `global.dto_access_validate_on_save`.
    pub fn validate_on_save(&self, global: &GlobalConfig) -> bool {
        self.per_type.merged_validate_on_save(global)
    }

    pub fn no_error_on_read_single_null(&self, global: &GlobalConfig) -> bool {
        self.per_type.merged_no_error_on_read_single_null(global)
    }
}
