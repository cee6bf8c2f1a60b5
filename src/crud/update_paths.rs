use super::{CrudServices, Route, cast};
use crate::context::{EntityState, PersistenceContext};
use crate::core::{CrudError, Result, Status};
use crate::decode::extract_keys_in_order;
use crate::mapping::{Mapper, update::apply_to_entity};
use crate::shape::{CrudType, Shape};
use tracing::{Level, event, info_span};

impl<C: PersistenceContext, M: Mapper> CrudServices<C, M> {
    /// Saves changes held in `instance`.
    ///
    /// An entity must already carry its key. A transfer instance is applied
    /// to the stored entity through the update method named by `method`, an
    /// update method taking exactly its non-key fields, or a field copy.
    pub fn update_and_save<T: CrudType>(&mut self, instance: T, method: Option<&str>) -> Result<Status> {
        let span = info_span!("crud.update", ty = T::TYPE_NAME, method = ?method);
        let _enter = span.enter();

        let (entity, route) = self.resolve::<T>()?;
        let mut status = Status::with_message(format!(
            "Successfully updated the {}",
            entity.display_name()
        ));

        match route {
            Route::Direct => {
                let updated: T::Entity = cast(instance)?;
                if !entity.is_key_set(&updated) {
                    return Err(CrudError::KeyNotSet(<T::Entity as Shape>::TYPE_NAME.to_string()));
                }
                if self.context.entity_state(&updated) == EntityState::Detached {
                    self.context.mark_for_update(updated);
                }
                status.combine(
                    self.context
                        .save_changes(self.config.direct_access_validate_on_save, &self.config),
                );
            }
            Route::Mapped(transfer) => {
                let keys = extract_keys_in_order(&instance, &transfer)?;
                entity.check_keys(&keys)?;
                let Some(mut stored) = self.context.find_by_key::<T::Entity>(&keys) else {
                    status.add_error(format!(
                        "Sorry, I could not find the {} you were trying to update.",
                        entity.display_name()
                    ));
                    event!(Level::DEBUG, "update target missing");
                    return Ok(status);
                };

                status.combine(apply_to_entity(
                    &instance,
                    &mut stored,
                    &transfer,
                    &self.mapper,
                    method,
                )?);
                if status.is_valid() {
                    self.context.mark_for_update(stored);
                    status.combine(
                        self.context
                            .save_changes(transfer.validate_on_save(&self.config), &self.config),
                    );
                }
            }
        }

        if status.is_valid() {
            event!(Level::DEBUG, "update saved");
        } else {
            event!(Level::WARN, errors = status.errors().len(), "update rejected");
        }
        Ok(status)
    }
}
