use super::Mapper;
use super::select::select;
use crate::core::{CrudError, Outcome, Result, Status};
use crate::decode::TransferDescriptor;
use crate::shape::{CrudType, Entity, Shape};
use log::debug;

/// Builds a new entity from a transfer instance.
///
/// A named constructor is used when `method` is given. Otherwise the
/// constructor whose parameters the transfer covers best is used, falling
/// back to a blank entity filled field by field.
pub(crate) fn build_entity<D, M>(
    source: &D,
    descriptor: &TransferDescriptor,
    mapper: &M,
    method: Option<&str>,
) -> Result<Outcome<D::Entity>>
where
    D: CrudType,
    M: Mapper,
{
    let entity_name = <D::Entity as Shape>::TYPE_NAME;
    let values = descriptor.mapping().source_values(source);
    let constructors = <D::Entity as Entity>::constructors();

    let chosen = select(entity_name, &constructors, method, |params| {
        params.iter().all(|p| values.contains(p))
    })?;

    if let Some(constructor) = chosen {
        debug!("Creating {} through {}", entity_name, constructor.name);
        return Ok(match (constructor.build)(&values) {
            Ok(entity) => Outcome::ok(entity, Status::new()),
            Err(mut status) => {
                if status.is_valid() {
                    status.add_error(format!("{} could not be created.", entity_name));
                }
                Outcome::failed(status)
            }
        });
    }

    let Some(mut entity) = <D::Entity as Shape>::blank() else {
        return Err(CrudError::NoConstructor {
            entity: entity_name.to_string(),
            transfer: D::TYPE_NAME.to_string(),
        });
    };
    let status = mapper.copy_to_entity(source, &mut entity, &descriptor.mapping().for_create());
    Ok(Outcome::new(Some(entity), status))
}
