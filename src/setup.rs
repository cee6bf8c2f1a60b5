use crate::config::GlobalConfig;
use crate::context::PersistenceContext;
use crate::core::Status;
use crate::crud::CrudServices;
use crate::decode::MetadataCache;
use crate::mapping::Mapper;
use crate::shape::CrudType;
use log::{info, warn};
use std::sync::Arc;

/// Registers entity and transfer types up front.
///
/// Every type is decoded once here so that setup problems surface together
/// in one status, before any CRUD call needs them.
///
/// ```ignore
/// let status = ServiceSetup::new(&ctx)
///     .register::<Book>()
///     .register::<BookDto>()
///     .finish();
/// assert!(status.is_valid(), "{}", status.error_string());
/// ```
pub struct ServiceSetup<'a, C> {
    context: &'a C,
    cache: Arc<MetadataCache>,
    config: Arc<GlobalConfig>,
    status: Status,
    registered: usize,
}

impl<'a, C: PersistenceContext> ServiceSetup<'a, C> {
    /// Setup against the global cache with default configuration.
    pub fn new(context: &'a C) -> Self {
        Self::with_cache(
            context,
            Arc::clone(MetadataCache::global()),
            Arc::new(GlobalConfig::default()),
        )
    }

    pub fn with_cache(context: &'a C, cache: Arc<MetadataCache>, config: Arc<GlobalConfig>) -> Self {
        Self {
            context,
            cache,
            config,
            status: Status::new(),
            registered: 0,
        }
    }

    pub fn register<T: CrudType>(mut self) -> Self {
        let result = self.cache.register_transfer::<T, C>(self.context);
        if result.is_valid() {
            self.registered += 1;
        } else {
            warn!("Registration of {} failed: {}", T::TYPE_NAME, result.error_string());
        }
        self.status.combine(result);
        self
    }

    /// The aggregated registration status.
    pub fn finish(mut self) -> Status {
        if self.status.is_valid() {
            info!("Registered {} type(s)", self.registered);
            self.status
                .set_message(format!("Registered {} type(s)", self.registered));
        }
        self.status
    }

    /// Finishes setup and hands back services over `context` sharing this
    /// setup's cache and configuration.
    pub fn into_services<M: Mapper, X: PersistenceContext>(
        self,
        context: X,
        mapper: M,
    ) -> (Status, CrudServices<X, M>) {
        let cache = Arc::clone(&self.cache);
        let config = Arc::clone(&self.config);
        let status = self.finish();
        (status, CrudServices::new(context, mapper, cache, config))
    }
}
