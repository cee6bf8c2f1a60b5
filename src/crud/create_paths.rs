use super::{CrudServices, Route, cast};
use crate::context::PersistenceContext;
use crate::core::{Outcome, Result, Status};
use crate::decode::copy_keys_back;
use crate::mapping::{Mapper, create::build_entity};
use crate::shape::CrudType;
use tracing::{Level, event, info_span};

impl<C: PersistenceContext, M: Mapper> CrudServices<C, M> {
    /// Creates and saves a new entity from `instance`.
    ///
    /// On the mapped route the entity is built through the constructor named
    /// by `method`, or the best matching one, or a blank entity filled from
    /// the transfer's fields. Generated keys are copied back onto the returned
    /// transfer instance.
    pub fn create_and_save<T: CrudType>(
        &mut self,
        instance: T,
        method: Option<&str>,
    ) -> Result<Outcome<T>> {
        let span = info_span!("crud.create", ty = T::TYPE_NAME, method = ?method);
        let _enter = span.enter();

        let (entity, route) = self.resolve::<T>()?;
        let mut status = Status::with_message(format!(
            "Successfully created a {}",
            entity.display_name()
        ));

        let outcome = match route {
            Route::Direct => {
                let mut created: T::Entity = cast(instance)?;
                self.context.add(&mut created);
                status.combine(
                    self.context
                        .save_changes(self.config.direct_access_validate_on_save, &self.config),
                );
                Outcome::new(Some(cast::<T::Entity, T>(created)?), status)
            }
            Route::Mapped(transfer) => {
                let mut instance = instance;
                let built = build_entity(&instance, &transfer, &self.mapper, method)?;
                status.combine(built.status);
                if let (true, Some(mut created)) = (status.is_valid(), built.value) {
                    self.context.add(&mut created);
                    status.combine(
                        self.context
                            .save_changes(transfer.validate_on_save(&self.config), &self.config),
                    );
                    if status.is_valid() {
                        copy_keys_back(&created, &mut instance, &entity);
                    }
                }
                Outcome::new(Some(instance), status)
            }
        };

        if outcome.is_valid() {
            event!(Level::DEBUG, "create saved");
        } else {
            event!(Level::WARN, errors = outcome.status.errors().len(), "create rejected");
        }
        Ok(outcome)
    }
}
