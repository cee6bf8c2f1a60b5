use super::{CrudServices, Route, cast};
use crate::context::{PersistenceContext, Query, SingleRow};
use crate::core::{CrudError, Outcome, Result, Status, Value};
use crate::decode::EntityDescriptor;
use crate::mapping::Mapper;
use crate::shape::{CrudType, Entity, display_name};
use tracing::{Level, event, info_span};

impl<C: PersistenceContext, M: Mapper> CrudServices<C, M> {
    /// Reads one `T` by primary key, values given in key order.
    pub fn read_single<T: CrudType>(&self, keys: &[Value]) -> Result<Outcome<T>> {
        let span = info_span!("crud.read_single", ty = T::TYPE_NAME, keys = ?keys);
        let _enter = span.enter();

        let (entity, route) = self.resolve::<T>()?;
        entity.check_keys(keys)?;

        let (found, no_error) = match &route {
            Route::Direct => {
                let found = self
                    .context
                    .find_by_key::<T::Entity>(keys)
                    .map(cast::<T::Entity, T>)
                    .transpose()?;
                (found, self.config.no_error_on_read_single_null)
            }
            Route::Mapped(transfer) => {
                let matcher = entity.clone();
                let wanted = keys.to_vec();
                let rows = self
                    .context
                    .untracked_set::<T::Entity>()
                    .filter(move |row| matcher.key_matches(row, &wanted));
                let projected = self.mapper.project::<T>(rows, transfer.mapping());
                (
                    single_row(projected, T::TYPE_NAME)?,
                    transfer.no_error_on_read_single_null(&self.config),
                )
            }
        };
        Ok(finish_single(found, &entity, no_error))
    }

    /// Reads the one `T` satisfying `predicate`.
    ///
    /// More than one match is a usage fault.
    pub fn read_single_where<T, P>(&self, predicate: P) -> Result<Outcome<T>>
    where
        T: CrudType,
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let span = info_span!("crud.read_single_where", ty = T::TYPE_NAME);
        let _enter = span.enter();

        let (entity, route) = self.resolve::<T>()?;
        let (query, no_error) = match &route {
            Route::Direct => (
                self.direct_query::<T>(),
                self.config.no_error_on_read_single_null,
            ),
            Route::Mapped(transfer) => (
                self.mapper
                    .project::<T>(self.context.untracked_set::<T::Entity>(), transfer.mapping()),
                transfer.no_error_on_read_single_null(&self.config),
            ),
        };
        let found = single_row(query.filter(predicate), T::TYPE_NAME)?;
        Ok(finish_single(found, &entity, no_error))
    }

    /// All `T`, as a lazy query. Nothing is read until the query is enumerated.
    pub fn read_many<T: CrudType>(&self) -> Result<Outcome<Query<T>>> {
        let (_, route) = self.resolve::<T>()?;
        let query = match &route {
            Route::Direct => self.direct_query::<T>(),
            Route::Mapped(transfer) => self
                .mapper
                .project::<T>(self.context.untracked_set::<T::Entity>(), transfer.mapping()),
        };
        event!(Level::DEBUG, ty = T::TYPE_NAME, "read many prepared");
        Ok(Outcome::ok(
            query,
            Status::with_message(format!("Successfully read many {}", display_name(T::TYPE_NAME))),
        ))
    }

    /// Shapes the entity query with `transform` (filtering, ordering, paging)
    /// before it is projected to `D`.
    pub fn read_many_with_pre_query<E, D, F>(&self, transform: F) -> Result<Outcome<Query<D>>>
    where
        E: Entity,
        D: CrudType<Entity = E>,
        F: FnOnce(Query<E>) -> Query<E>,
    {
        let (_, route) = self.resolve::<D>()?;
        let shaped = transform(self.context.untracked_set::<E>());
        let query = match &route {
            Route::Direct => shaped.filter_map(|entity| cast::<E, D>(entity).ok()),
            Route::Mapped(transfer) => self.mapper.project::<D>(shaped, transfer.mapping()),
        };
        Ok(Outcome::ok(
            query,
            Status::with_message(format!("Successfully read many {}", display_name(D::TYPE_NAME))),
        ))
    }
}

fn single_row<T: Send + 'static>(query: Query<T>, type_name: &str) -> Result<Option<T>> {
    match query.single() {
        SingleRow::None => Ok(None),
        SingleRow::One(row) => Ok(Some(row)),
        SingleRow::Many => {
            event!(Level::WARN, ty = type_name, "single read matched several rows");
            Err(CrudError::MultipleMatches(type_name.to_string()))
        }
    }
}

fn finish_single<T>(found: Option<T>, entity: &EntityDescriptor, no_error: bool) -> Outcome<T> {
    match found {
        Some(value) => {
            event!(Level::DEBUG, "single read found");
            Outcome::ok(value, Status::new())
        }
        None if no_error => Outcome::failed(Status::with_message(format!(
            "The {} was not found.",
            entity.display_name()
        ))),
        None => {
            event!(Level::DEBUG, "single read found nothing");
            Outcome::failed(Status::with_error(format!(
                "Sorry, I could not find the {} you were looking for.",
                entity.display_name()
            )))
        }
    }
}
