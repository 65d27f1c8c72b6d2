//! Thread-safe in-memory entity store.

use super::transaction::InMemoryTransaction;
use crate::roster::{
    domain::{Task, TaskId, User, UserId},
    ports::{
        EntityStore, ListWindow, StoreError, StoreResult, StoreTransaction, TaskFilter,
        TransactionGrant,
    },
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A committed record together with the version that last wrote it.
#[derive(Debug, Clone)]
pub(super) struct Versioned<T> {
    pub version: u64,
    pub record: T,
}

#[derive(Debug, Default)]
pub(super) struct StoreState {
    pub tasks: HashMap<TaskId, Versioned<Task>>,
    pub users: HashMap<UserId, Versioned<User>>,
    pub last_version: u64,
    pub committed_writes: u64,
}

/// Thread-safe in-memory entity store.
///
/// Transactions buffer their writes privately and validate, at commit, that
/// every record they read or wrote still carries the version they first
/// observed. A stale record fails the commit with [`StoreError::Conflict`],
/// which makes concurrent transactions serializable. Dropping a transaction
/// without committing discards its writes.
///
/// Only the roster services open transactions; outside code reads committed
/// state through [`EntityStore`] and cannot write records directly:
///
/// ```compile_fail
/// use tasklink::roster::adapters::memory::InMemoryEntityStore;
///
/// let store = InMemoryEntityStore::new();
/// let _transaction = store.begin();
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryEntityStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryEntityStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a transaction that must be committed explicitly.
    #[must_use]
    pub(crate) fn begin(&self) -> InMemoryTransaction {
        InMemoryTransaction::new(Arc::clone(&self.state))
    }

    /// Returns the number of record writes and removals committed so far.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] when the store lock is poisoned.
    pub fn committed_writes(&self) -> StoreResult<u64> {
        Ok(read_state(&self.state)?.committed_writes)
    }
}

pub(super) fn read_state(
    state: &RwLock<StoreState>,
) -> StoreResult<RwLockReadGuard<'_, StoreState>> {
    state
        .read()
        .map_err(|err| StoreError::persistence(std::io::Error::other(err.to_string())))
}

pub(super) fn write_state(
    state: &RwLock<StoreState>,
) -> StoreResult<RwLockWriteGuard<'_, StoreState>> {
    state
        .write()
        .map_err(|err| StoreError::persistence(std::io::Error::other(err.to_string())))
}

fn sorted_tasks<'a>(tasks: impl Iterator<Item = &'a Task>) -> Vec<&'a Task> {
    let mut ordered: Vec<&Task> = tasks.collect();
    ordered.sort_by_key(|task| (task.created_at(), task.id()));
    ordered
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn with_transaction<T, E, F>(&self, _grant: TransactionGrant, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTransaction) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
    {
        let mut transaction = self.begin();
        let value = work(&mut transaction)?;
        transaction.commit()?;
        Ok(value)
    }

    async fn find_task(&self, id: TaskId) -> StoreResult<Option<Task>> {
        let state = read_state(&self.state)?;
        Ok(state.tasks.get(&id).map(|entry| entry.record.clone()))
    }

    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
        let state = read_state(&self.state)?;
        Ok(state.users.get(&id).map(|entry| entry.record.clone()))
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
        let state = read_state(&self.state)?;
        let matching = sorted_tasks(
            state
                .tasks
                .values()
                .map(|entry| &entry.record)
                .filter(|task| filter.matches(task)),
        );
        Ok(filter.window.apply(matching.into_iter().cloned()))
    }

    async fn count_tasks(&self, filter: &TaskFilter) -> StoreResult<usize> {
        let state = read_state(&self.state)?;
        Ok(state
            .tasks
            .values()
            .filter(|entry| filter.matches(&entry.record))
            .count())
    }

    async fn list_users(&self, window: &ListWindow) -> StoreResult<Vec<User>> {
        let state = read_state(&self.state)?;
        let mut users: Vec<&User> = state.users.values().map(|entry| &entry.record).collect();
        users.sort_by_key(|user| (user.created_at(), user.id()));
        Ok(window.apply(users.into_iter().cloned()))
    }
}
