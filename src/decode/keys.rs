//! Moving primary key values between transfer instances and entities.

use super::{EntityDescriptor, TransferDescriptor};
use crate::core::{CrudError, Result, Value};
use crate::mapping::MappingProfile;
use crate::shape::{CrudType, FieldInfo, Shape};
use log::warn;

/// Reads the key values off a transfer instance, in entity key order.
///
/// Every key component must map to a stored field of the transfer type.
pub fn extract_keys_in_order<D: Shape>(
    source: &D,
    descriptor: &TransferDescriptor,
) -> Result<Vec<Value>> {
    descriptor
        .key_bindings()
        .iter()
        .map(|binding| {
            let missing = || CrudError::MissingKeyField {
                transfer: descriptor.type_name().to_string(),
                field: binding.key_name.to_string(),
            };
            if !binding.present {
                return Err(missing());
            }
            source.get(binding.transfer_field).ok_or_else(missing)
        })
        .collect()
}

/// Copies the entity's key values onto the transfer instance.
///
/// Only publicly writable transfer fields are written. Anything else is
/// skipped, and a value that will not convert is logged and skipped.
pub fn copy_keys_back<E: Shape, D: CrudType>(entity: &E, target: &mut D, descriptor: &EntityDescriptor) {
    let profile = D::mapping_profile();
    for key in descriptor.key_components() {
        let Some(field) = transfer_field_for::<D>(&profile, key.name)
            .filter(|f| f.access.is_public_writable())
        else {
            continue;
        };
        let Some(value) = entity.get(key.name) else {
            continue;
        };
        if let Err(err) = target.set(field.name, value) {
            warn!(
                "Could not copy key {} of {} back to {}: {}",
                key.name,
                E::TYPE_NAME,
                D::TYPE_NAME,
                err
            );
        }
    }
}

/// The stored, non-ignored transfer field that maps onto entity field `key`.
pub(crate) fn transfer_field_for<D: Shape>(
    profile: &MappingProfile,
    key: &str,
) -> Option<&'static FieldInfo> {
    D::fields().iter().find(|f| {
        f.access.has_storage() && !profile.is_ignored(f.name) && profile.entity_name(f.name) == key
    })
}
