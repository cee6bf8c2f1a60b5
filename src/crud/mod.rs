//! Generic create, read, update and delete over entities and transfer types.
//!
//! Every operation accepts either an entity type, which is persisted as is, or
//! a registered transfer type, which is mapped to and from its linked entity.
//! Usage mistakes come back as `Err(CrudError)`; everything that depends on
//! the data (not found, validation, storage conflicts) is reported in the
//! returned [`Status`](crate::core::Status).

mod create_paths;
mod delete_paths;
mod read_paths;
mod update_paths;

use crate::config::GlobalConfig;
use crate::context::{PersistenceContext, Query};
use crate::core::{CrudError, Result};
use crate::decode::{EntityDescriptor, MetadataCache, TransferDescriptor};
use crate::mapping::{ConventionMapper, Mapper};
use crate::shape::CrudType;
use std::any::{Any, TypeId, type_name};
use std::sync::Arc;

/// How an operation reaches the entity.
#[derive(Debug, Clone)]
pub(crate) enum Route {
    /// The caller's type is the entity.
    Direct,
    /// The caller's type is mapped through this descriptor.
    Mapped(Arc<TransferDescriptor>),
}

/// CRUD operations over one persistence context.
pub struct CrudServices<C, M = ConventionMapper> {
    context: C,
    mapper: M,
    cache: Arc<MetadataCache>,
    config: Arc<GlobalConfig>,
}

impl<C: PersistenceContext> CrudServices<C, ConventionMapper> {
    /// Services using the global cache, default configuration and convention mapping.
    pub fn with_defaults(context: C) -> Self {
        Self::new(
            context,
            ConventionMapper,
            Arc::clone(MetadataCache::global()),
            Arc::new(GlobalConfig::default()),
        )
    }
}

impl<C: PersistenceContext, M: Mapper> CrudServices<C, M> {
    pub fn new(context: C, mapper: M, cache: Arc<MetadataCache>, config: Arc<GlobalConfig>) -> Self {
        Self {
            context,
            mapper,
            cache,
            config,
        }
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    pub fn into_context(self) -> C {
        self.context
    }

    pub fn cache(&self) -> &Arc<MetadataCache> {
        &self.cache
    }

    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    /// Decodes the entity behind `T` and decides how to reach it.
    pub(crate) fn resolve<T: CrudType>(&self) -> Result<(Arc<EntityDescriptor>, Route)> {
        let entity = self.cache.entity_for::<T, C>(&self.context)?;
        if is_entity::<T>() {
            return Ok((entity, Route::Direct));
        }
        let transfer = self.cache.require_transfer::<T>()?;
        Ok((entity, Route::Mapped(transfer)))
    }

    /// The untracked entity set, seen as `T` on the direct route.
    fn direct_query<T: CrudType>(&self) -> Query<T> {
        self.context
            .untracked_set::<T::Entity>()
            .filter_map(|entity| cast::<T::Entity, T>(entity).ok())
    }
}

pub(crate) fn is_entity<T: CrudType>() -> bool {
    TypeId::of::<T>() == TypeId::of::<T::Entity>()
}

/// Moves a value between two names of the same type.
pub(crate) fn cast<A: 'static, B: 'static>(value: A) -> Result<B> {
    let boxed: Box<dyn Any> = Box::new(value);
    boxed.downcast::<B>().map(|b| *b).map_err(|_| {
        CrudError::TypeMismatch(format!(
            "{} cannot be used as {}",
            type_name::<A>(),
            type_name::<B>()
        ))
    })
}
