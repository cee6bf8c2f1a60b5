use super::Mapper;
use super::select::select;
use crate::core::{Result, Status};
use crate::decode::TransferDescriptor;
use crate::shape::{CrudType, Entity, Shape};
use log::debug;

/// Applies a transfer instance to an entity that was read for update.
///
/// Without a `method` name an update method is only picked when its
/// parameters are exactly the transfer's non-key values; otherwise the
/// writable fields are copied one by one.
pub(crate) fn apply_to_entity<D, M>(
    source: &D,
    target: &mut D::Entity,
    descriptor: &TransferDescriptor,
    mapper: &M,
    method: Option<&str>,
) -> Result<Status>
where
    D: CrudType,
    M: Mapper,
{
    let entity_name = <D::Entity as Shape>::TYPE_NAME;
    let values = descriptor.mapping().source_values(source);
    let keys = descriptor.entity().key_names();
    let supplied: Vec<&str> = values
        .iter()
        .map(|(name, _)| name)
        .filter(|name| !keys.iter().any(|key| key == name))
        .collect();
    let methods = <D::Entity as Entity>::update_methods();

    let chosen = select(entity_name, &methods, method, |params| {
        if method.is_some() {
            params.iter().all(|p| values.contains(p))
        } else {
            params.len() == supplied.len() && params.iter().all(|p| supplied.contains(p))
        }
    })?;

    match chosen {
        Some(update) => {
            debug!("Updating {} through {}", entity_name, update.name);
            Ok(match (update.apply)(target, &values) {
                Ok(()) => Status::new(),
                Err(mut status) => {
                    if status.is_valid() {
                        status.add_error(format!("{} could not be updated.", entity_name));
                    }
                    status
                }
            })
        }
        None => Ok(mapper.copy_to_entity(source, target, descriptor.mapping())),
    }
}
