use super::{EntityState, PersistenceContext, Query};
use crate::config::{GlobalConfig, SaveFailure, SaveFailureKind};
use crate::core::{ErrorEntry, Status, Value, ValueKind};
use crate::decode::EntityDescriptor;
use crate::shape::{Entity, Shape};
use log::{debug, warn};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use uuid::Uuid;

type Table = Arc<dyn Any + Send + Sync>;

/// Committed rows, one `Arc<Vec<E>>` per entity type.
///
/// Cloning is cheap; a save works on a clone and swaps it in on success.
#[derive(Clone, Default)]
struct StoreState {
    tables: HashMap<TypeId, Table>,
}

impl StoreState {
    fn rows<E: Entity>(&self) -> Option<Arc<Vec<E>>> {
        self.tables
            .get(&TypeId::of::<E>())
            .and_then(|table| Arc::clone(table).downcast::<Vec<E>>().ok())
    }

    fn replace_rows<E: Entity>(&mut self, rows: Vec<E>) {
        self.tables.insert(TypeId::of::<E>(), Arc::new(rows));
    }
}

/// Counters of work done against an [`InMemoryDatabase`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextStats {
    /// Enumerations of untracked queries.
    pub queries: u64,
    /// Saves that committed.
    pub saves: u64,
    /// Saves rejected by validation or storage checks.
    pub failed_saves: u64,
}

#[derive(Default)]
struct DatabaseInner {
    state: RwLock<StoreState>,
    keys: RwLock<HashMap<TypeId, Vec<&'static str>>>,
    sequences: Mutex<HashMap<TypeId, i64>>,
    queries: AtomicU64,
    saves: AtomicU64,
    failed_saves: AtomicU64,
}

/// An in-process store shared by any number of [`InMemoryContext`]s.
#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    inner: Arc<DatabaseInner>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the key fields of `E`, overriding the `id` / `{type}_id` convention.
    pub fn with_key<E: Entity>(self, fields: &[&'static str]) -> Self {
        self.inner
            .keys
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(TypeId::of::<E>(), fields.to_vec());
        self
    }

    /// A fresh unit of work.
    pub fn context(&self) -> InMemoryContext {
        InMemoryContext {
            db: self.clone(),
            pending: Vec::new(),
        }
    }

    /// Committed rows of `E`, not counted as a query.
    pub fn rows<E: Entity>(&self) -> Vec<E> {
        self.read_state()
            .rows::<E>()
            .map(|rows| rows.as_ref().clone())
            .unwrap_or_default()
    }

    pub fn stats(&self) -> ContextStats {
        ContextStats {
            queries: self.inner.queries.load(Ordering::Relaxed),
            saves: self.inner.saves.load(Ordering::Relaxed),
            failed_saves: self.inner.failed_saves.load(Ordering::Relaxed),
        }
    }

    fn read_state(&self) -> StoreState {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn key_order<E: Entity>(&self) -> Vec<&'static str> {
        let declared = self
            .inner
            .keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&TypeId::of::<E>())
            .cloned();
        if let Some(keys) = declared {
            return keys;
        }

        let conventional = format!("{}_id", snake_case(E::TYPE_NAME));
        E::fields()
            .iter()
            .find(|f| f.name == "id")
            .or_else(|| E::fields().iter().find(|f| f.name == conventional))
            .map(|f| vec![f.name])
            .unwrap_or_default()
    }

    fn next_integer_key<E: Entity>(&self, key: &str) -> i64 {
        let committed_max = self
            .read_state()
            .rows::<E>()
            .and_then(|rows| rows.iter().filter_map(|r| r.get(key)?.as_i64()).max())
            .unwrap_or(0);
        let mut sequences = self
            .inner
            .sequences
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let last = sequences.entry(TypeId::of::<E>()).or_insert(0);
        *last = (*last).max(committed_max) + 1;
        *last
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChangeKind {
    Insert,
    Update,
    Remove,
}

trait PendingChange: Send {
    fn validate(&self) -> Vec<ErrorEntry>;
    fn apply(&self, state: &mut StoreState) -> Result<(), SaveFailure>;
    fn tracks(&self, entity: &dyn Any) -> bool;
}

struct Change<E> {
    kind: ChangeKind,
    entity: E,
    key_names: Vec<&'static str>,
    key: Vec<Value>,
}

impl<E: Entity> PendingChange for Change<E> {
    fn validate(&self) -> Vec<ErrorEntry> {
        match self.kind {
            ChangeKind::Insert | ChangeKind::Update => self.entity.validate(),
            ChangeKind::Remove => Vec::new(),
        }
    }

    fn apply(&self, state: &mut StoreState) -> Result<(), SaveFailure> {
        let mut rows = state
            .rows::<E>()
            .map(|rows| rows.as_ref().clone())
            .unwrap_or_default();
        let position = rows
            .iter()
            .position(|row| key_of(row, &self.key_names) == self.key);

        let failure = |kind| SaveFailure {
            kind,
            entity: E::TYPE_NAME,
            key: EntityDescriptor::format_key(&self.key),
        };

        match (self.kind, position) {
            (ChangeKind::Insert, Some(_)) => return Err(failure(SaveFailureKind::DuplicateKey)),
            (ChangeKind::Insert, None) => rows.push(self.entity.clone()),
            (ChangeKind::Update, Some(index)) => rows[index] = self.entity.clone(),
            (ChangeKind::Remove, Some(index)) => {
                rows.remove(index);
            }
            (_, None) => return Err(failure(SaveFailureKind::MissingRow)),
        }
        state.replace_rows(rows);
        Ok(())
    }

    fn tracks(&self, entity: &dyn Any) -> bool {
        self.kind != ChangeKind::Remove
            && entity
                .downcast_ref::<E>()
                .is_some_and(|candidate| *candidate == self.entity)
    }
}

/// A unit of work over an [`InMemoryDatabase`].
///
/// Changes are queued until [`save_changes`](PersistenceContext::save_changes),
/// which commits all of them or none.
pub struct InMemoryContext {
    db: InMemoryDatabase,
    pending: Vec<Box<dyn PendingChange>>,
}

impl InMemoryContext {
    pub fn database(&self) -> &InMemoryDatabase {
        &self.db
    }

    fn queue<E: Entity>(&mut self, kind: ChangeKind, entity: E) {
        let key_names = self.db.key_order::<E>();
        let key = key_of(&entity, &key_names);
        self.pending.push(Box::new(Change {
            kind,
            entity,
            key_names,
            key,
        }));
    }

    fn assign_generated_key<E: Entity>(&self, entity: &mut E, key: &str) {
        let Some(info) = E::field_info(key) else {
            return;
        };
        if !entity.get(key).unwrap_or(Value::Null).is_default() {
            return;
        }
        let generated = match info.kind {
            ValueKind::Integer => Value::Integer(self.db.next_integer_key::<E>(key)),
            ValueKind::Uuid => Value::Uuid(Uuid::new_v4()),
            _ => return,
        };
        if let Err(err) = entity.set(key, generated) {
            warn!("Could not assign generated key to {}: {}", E::TYPE_NAME, err);
        }
    }
}

impl PersistenceContext for InMemoryContext {
    fn key_order<E: Entity>(&self) -> Vec<&'static str> {
        self.db.key_order::<E>()
    }

    fn find_by_key<E: Entity>(&self, keys: &[Value]) -> Option<E> {
        let key_names = self.db.key_order::<E>();
        self.db
            .read_state()
            .rows::<E>()?
            .iter()
            .find(|row| key_of(*row, &key_names).as_slice() == keys)
            .cloned()
    }

    fn add<E: Entity>(&mut self, entity: &mut E) {
        if let [key] = self.db.key_order::<E>().as_slice() {
            self.assign_generated_key(entity, key);
        }
        self.queue(ChangeKind::Insert, entity.clone());
    }

    fn mark_for_update<E: Entity>(&mut self, entity: E) {
        self.queue(ChangeKind::Update, entity);
    }

    fn remove<E: Entity>(&mut self, entity: E) {
        self.queue(ChangeKind::Remove, entity);
    }

    fn entity_state<E: Entity>(&self, entity: &E) -> EntityState {
        if self.pending.iter().any(|change| change.tracks(entity)) {
            EntityState::Attached
        } else {
            EntityState::Detached
        }
    }

    fn pending_changes(&self) -> usize {
        self.pending.len()
    }

    fn discard_changes_after(&mut self, keep: usize) {
        if self.pending.len() > keep {
            debug!("Discarding {} queued change(s)", self.pending.len() - keep);
            self.pending.truncate(keep);
        }
    }

    fn untracked_set<E: Entity>(&self) -> Query<E> {
        let inner = Arc::clone(&self.db.inner);
        Query::from_fn(move || {
            inner.queries.fetch_add(1, Ordering::Relaxed);
            let rows = inner
                .state
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .rows::<E>()
                .unwrap_or_default();
            (0..rows.len()).map(move |i| rows[i].clone())
        })
    }

    fn save_changes(&mut self, validate: bool, config: &GlobalConfig) -> Status {
        let pending = std::mem::take(&mut self.pending);
        let mut status = Status::new();

        if validate {
            for change in &pending {
                for entry in change.validate() {
                    status.push(entry);
                }
            }
        }

        if status.is_valid() {
            let mut state = self
                .db
                .inner
                .state
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let mut next = state.clone();
            for change in &pending {
                if let Err(failure) = change.apply(&mut next) {
                    status.push(config.describe_save_failure(&failure));
                }
            }
            if status.is_valid() {
                *state = next;
            }
        }

        if status.is_valid() {
            self.db.inner.saves.fetch_add(1, Ordering::Relaxed);
            debug!("Saved {} change(s)", pending.len());
        } else {
            self.db.inner.failed_saves.fetch_add(1, Ordering::Relaxed);
            debug!(
                "Discarded {} change(s): {}",
                pending.len(),
                status.error_string()
            );
        }
        status
    }
}

fn key_of<E: Shape>(entity: &E, key_names: &[&'static str]) -> Vec<Value> {
    key_names
        .iter()
        .map(|name| entity.get(name).unwrap_or(Value::Null))
        .collect()
}

fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
