//! The unit of work the CRUD services persist through.

mod memory;
mod query;

pub use memory::{ContextStats, InMemoryContext, InMemoryDatabase};
pub use query::{Query, SingleRow};

use crate::config::GlobalConfig;
use crate::core::{Status, Value};
use crate::shape::Entity;

/// Whether the context already tracks an entity instance for saving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    Attached,
    Detached,
}

/// Persistence operations the services need from a storage backend.
pub trait PersistenceContext {
    /// Primary key field names of `E`, in key order. Empty if `E` has no key.
    fn key_order<E: Entity>(&self) -> Vec<&'static str>;

    fn find_by_key<E: Entity>(&self, keys: &[Value]) -> Option<E>;

    /// Queues an insert. Generated keys are assigned to `entity` immediately.
    fn add<E: Entity>(&mut self, entity: &mut E);

    fn mark_for_update<E: Entity>(&mut self, entity: E);

    fn remove<E: Entity>(&mut self, entity: E);

    fn entity_state<E: Entity>(&self, entity: &E) -> EntityState;

    /// Lazy query over the committed rows of `E`.
    fn untracked_set<E: Entity>(&self) -> Query<E>;

    /// Number of queued changes not yet saved.
    fn pending_changes(&self) -> usize;

    /// Drops every change queued after the first `keep` ones.
    fn discard_changes_after(&mut self, keep: usize);

    /// Writes all queued changes, validating them first when asked.
    fn save_changes(&mut self, validate: bool, config: &GlobalConfig) -> Status;
}
