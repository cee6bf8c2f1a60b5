use super::{EntityDescriptor, TransferDescriptor};
use crate::config::PerTypeConfig;
use crate::context::PersistenceContext;
use crate::core::{CrudError, Result, Status};
use crate::shape::{CrudType, Entity, Shape, Visibility};
use lazy_static::lazy_static;
use log::debug;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// A descriptor slot. The slot mutex is held while the descriptor is built,
/// so concurrent first requests for one type wait for a single build.
type Slot<T> = Arc<Mutex<Option<Arc<T>>>>;
type SlotMap<T> = RwLock<HashMap<TypeId, Slot<T>>>;

lazy_static! {
    static ref GLOBAL_METADATA_CACHE: Arc<MetadataCache> = Arc::new(MetadataCache::new());
}

/// Counters describing the cache's contents and work done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entities: usize,
    pub transfers: usize,
    pub entity_builds: usize,
    pub transfer_builds: usize,
}

/// Thread-safe store of decoded entity and transfer descriptors.
///
/// Each type is decoded at most once; later requests share the same
/// `Arc`. Requests for different types never wait on each other's build.
#[derive(Debug, Default)]
pub struct MetadataCache {
    entities: SlotMap<EntityDescriptor>,
    transfers: SlotMap<TransferDescriptor>,
    entity_builds: AtomicUsize,
    transfer_builds: AtomicUsize,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache.
    pub fn global() -> &'static Arc<MetadataCache> {
        &GLOBAL_METADATA_CACHE
    }

    pub fn get_or_create_entity<E, C>(&self, context: &C) -> Result<Arc<EntityDescriptor>>
    where
        E: Entity,
        C: PersistenceContext,
    {
        get_or_build(&self.entities, TypeId::of::<E>(), || {
            let descriptor = EntityDescriptor::build::<E>(&context.key_order::<E>())?;
            self.entity_builds.fetch_add(1, Ordering::Relaxed);
            debug!(
                "Decoded entity {} with key ({})",
                E::TYPE_NAME,
                descriptor.key_names().join(", ")
            );
            Ok(descriptor)
        })
    }

    /// Descriptor of the entity `T` is stored as: `T` itself for an entity,
    /// the linked entity for a transfer type.
    pub fn entity_for<T, C>(&self, context: &C) -> Result<Arc<EntityDescriptor>>
    where
        T: CrudType,
        C: PersistenceContext,
    {
        self.get_or_create_entity::<T::Entity, C>(context)
    }

    /// Rejects restricted types before anything is cached for them.
    pub fn get_or_create_transfer<D: CrudType>(
        &self,
        entity: Arc<EntityDescriptor>,
        per_type: &PerTypeConfig,
    ) -> Result<Arc<TransferDescriptor>> {
        if D::VISIBILITY != Visibility::Public {
            return Err(CrudError::NotPublic(D::TYPE_NAME.to_string()));
        }
        get_or_build(&self.transfers, TypeId::of::<D>(), || {
            let descriptor = TransferDescriptor::build::<D>(entity, per_type)?;
            self.transfer_builds.fetch_add(1, Ordering::Relaxed);
            debug!(
                "Decoded transfer {} for entity {} ({} read pairs, {} write pairs)",
                D::TYPE_NAME,
                descriptor.entity().type_name(),
                descriptor.mapping().read_pairs.len(),
                descriptor.mapping().write_pairs.len()
            );
            Ok(descriptor)
        })
    }

    pub fn lookup_entity(&self, id: TypeId) -> Option<Arc<EntityDescriptor>> {
        lookup(&self.entities, id)
    }

    pub fn lookup_transfer(&self, id: TypeId) -> Option<Arc<TransferDescriptor>> {
        lookup(&self.transfers, id)
    }

    pub fn require_transfer<D: CrudType>(&self) -> Result<Arc<TransferDescriptor>> {
        self.lookup_transfer(TypeId::of::<D>())
            .ok_or_else(|| CrudError::NotRegistered(D::TYPE_NAME.to_string()))
    }

    /// Decodes `D` and its entity, reporting problems in the status.
    pub fn register_transfer<D, C>(&self, context: &C) -> Status
    where
        D: CrudType,
        C: PersistenceContext,
    {
        let registered = self.entity_for::<D, C>(context).and_then(|entity| {
            if TypeId::of::<D>() == TypeId::of::<D::Entity>() {
                return Ok(());
            }
            self.get_or_create_transfer::<D>(entity, &D::per_type_config())
                .map(|_| ())
        });

        match registered {
            Ok(()) => Status::with_message(format!("Registered {}", D::TYPE_NAME)),
            Err(err) => Status::with_error(err.to_string()),
        }
    }

    /// Empties both maps.
    ///
    /// Only for test setup: descriptors handed out earlier stay alive, and a
    /// build running concurrently may land in the new, empty map.
    pub fn clear_all(&self) {
        self.entities
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.transfers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entities: count_built(&self.entities),
            transfers: count_built(&self.transfers),
            entity_builds: self.entity_builds.load(Ordering::Relaxed),
            transfer_builds: self.transfer_builds.load(Ordering::Relaxed),
        }
    }
}

fn slot<T>(map: &SlotMap<T>, id: TypeId) -> Result<Slot<T>> {
    if let Some(slot) = map.read()?.get(&id) {
        return Ok(Arc::clone(slot));
    }
    let mut map = map.write()?;
    Ok(Arc::clone(map.entry(id).or_default()))
}

fn get_or_build<T, F>(map: &SlotMap<T>, id: TypeId, build: F) -> Result<Arc<T>>
where
    F: FnOnce() -> Result<T>,
{
    let slot = slot(map, id)?;
    let mut guard = slot.lock()?;
    if let Some(existing) = guard.as_ref() {
        return Ok(Arc::clone(existing));
    }
    let built = Arc::new(build()?);
    *guard = Some(Arc::clone(&built));
    Ok(built)
}

fn lookup<T>(map: &SlotMap<T>, id: TypeId) -> Option<Arc<T>> {
    let slot = map.read().ok()?.get(&id).cloned()?;
    let guard = slot.lock().ok()?;
    guard.clone()
}

fn count_built<T>(map: &SlotMap<T>) -> usize {
    map.read()
        .map(|m| {
            m.values()
                .filter(|slot| slot.lock().map(|s| s.is_some()).unwrap_or(false))
                .count()
        })
        .unwrap_or(0)
}
