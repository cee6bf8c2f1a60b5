use super::{Mapper, MappingConfig};
use crate::context::Query;
use crate::core::Status;
use crate::shape::{CrudType, Shape};
use log::{debug, error};

/// Maps fields with the same (or renamed) name and a convertible kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConventionMapper;

impl Mapper for ConventionMapper {
    fn project<D: CrudType>(&self, source: Query<D::Entity>, mapping: &MappingConfig) -> Query<D> {
        let pairs = mapping.read_pairs.clone();
        source.filter_map(move |entity| {
            let Some(mut dto) = D::blank() else {
                error!("{} lost parameterless construction", D::TYPE_NAME);
                return None;
            };
            for pair in &pairs {
                let Some(value) = entity.get(pair.entity) else {
                    continue;
                };
                if let Err(err) = dto.set(pair.transfer, value) {
                    debug!("{}: {}", D::TYPE_NAME, err);
                }
            }
            Some(dto)
        })
    }

    fn copy_to_entity<D: CrudType>(
        &self,
        source: &D,
        target: &mut D::Entity,
        mapping: &MappingConfig,
    ) -> Status {
        let mut status = Status::new();
        for pair in &mapping.write_pairs {
            let Some(value) = source.get(pair.transfer) else {
                continue;
            };
            if let Err(err) = target.set(pair.entity, value) {
                status.add_field_error(pair.transfer, err.to_string());
            }
        }
        status
    }
}
