use super::{CrudServices, is_entity};
use crate::context::PersistenceContext;
use crate::core::{CrudError, Result, Status, Value};
use crate::mapping::Mapper;
use crate::shape::CrudType;
use tracing::{Level, event, info_span};

impl<C: PersistenceContext, M: Mapper> CrudServices<C, M> {
    /// Deletes the entity with the given key values.
    pub fn delete_and_save<E: CrudType>(&mut self, keys: &[Value]) -> Result<Status> {
        self.delete_with_action_and_save::<E, _>(|_, _| Status::new(), keys)
    }

    /// Deletes the entity with the given key values after `action` has
    /// approved it.
    ///
    /// `action` sees the context and the entity about to be removed. Any error
    /// it reports stops the delete before anything is removed or saved, and
    /// changes the action queued are discarded.
    pub fn delete_with_action_and_save<E, F>(&mut self, action: F, keys: &[Value]) -> Result<Status>
    where
        E: CrudType,
        F: FnOnce(&mut C, &E::Entity) -> Status,
    {
        let span = info_span!("crud.delete", ty = E::TYPE_NAME, keys = ?keys);
        let _enter = span.enter();

        let entity = self.cache.entity_for::<E, C>(&self.context)?;
        if !is_entity::<E>() {
            return Err(CrudError::DeleteViaTransfer(E::TYPE_NAME.to_string()));
        }
        entity.check_keys(keys)?;

        let mut status = Status::with_message(format!(
            "Successfully deleted a {}",
            entity.display_name()
        ));
        let Some(target) = self.context.find_by_key::<E::Entity>(keys) else {
            status.add_error(format!(
                "Sorry, I could not find the {} you wanted to delete.",
                entity.display_name()
            ));
            event!(Level::DEBUG, "delete target missing");
            return Ok(status);
        };

        let queued_before = self.context.pending_changes();
        status.combine(action(&mut self.context, &target));
        if !status.is_valid() {
            self.context.discard_changes_after(queued_before);
            event!(Level::WARN, errors = status.errors().len(), "delete stopped by action");
            return Ok(status);
        }

        self.context.remove(target);
        status.combine(
            self.context
                .save_changes(self.config.direct_access_validate_on_save, &self.config),
        );
        event!(Level::DEBUG, valid = status.is_valid(), "delete finished");
        Ok(status)
    }
}
