//! Optimistic transaction over the in-memory entity store.

use super::store::{StoreState, Versioned, read_state, write_state};
use crate::roster::{
    domain::{EmailAddress, Task, TaskId, User, UserId},
    ports::{StoreError, StoreResult, StoreTransaction},
};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, RwLock};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum RecordKey {
    Task(TaskId),
    User(UserId),
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Task(id) => write!(f, "task {id}"),
            Self::User(id) => write!(f, "user {id}"),
        }
    }
}

/// An open transaction against an [`super::InMemoryEntityStore`].
///
/// Writes stay private to the transaction until [`Self::commit`]; dropping
/// the transaction rolls it back.
#[derive(Debug)]
pub(crate) struct InMemoryTransaction {
    state: Arc<RwLock<StoreState>>,
    observed: HashMap<RecordKey, Option<u64>>,
    tasks: HashMap<TaskId, Option<Task>>,
    users: HashMap<UserId, Option<User>>,
}

impl InMemoryTransaction {
    pub(super) fn new(state: Arc<RwLock<StoreState>>) -> Self {
        Self {
            state,
            observed: HashMap::new(),
            tasks: HashMap::new(),
            users: HashMap::new(),
        }
    }

    /// Records the version of `key` seen by this transaction, failing when a
    /// concurrent commit has replaced the version seen earlier.
    fn observe(&mut self, key: RecordKey, current: Option<u64>) -> StoreResult<()> {
        match self.observed.entry(key) {
            Entry::Occupied(seen) if *seen.get() != current => {
                Err(StoreError::Conflict(format!("{key} changed during transaction")))
            }
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(slot) => {
                slot.insert(current);
                Ok(())
            }
        }
    }

    fn committed_task(&mut self, id: TaskId) -> StoreResult<Option<Task>> {
        let entry = read_state(&self.state)?.tasks.get(&id).cloned();
        self.observe(RecordKey::Task(id), entry.as_ref().map(|e| e.version))?;
        Ok(entry.map(|e| e.record))
    }

    fn committed_user(&mut self, id: UserId) -> StoreResult<Option<User>> {
        let entry = read_state(&self.state)?.users.get(&id).cloned();
        self.observe(RecordKey::User(id), entry.as_ref().map(|e| e.version))?;
        Ok(entry.map(|e| e.record))
    }

    fn observe_current_task(&mut self, id: TaskId) -> StoreResult<()> {
        let version = read_state(&self.state)?.tasks.get(&id).map(|e| e.version);
        self.observe(RecordKey::Task(id), version)
    }

    fn observe_current_user(&mut self, id: UserId) -> StoreResult<()> {
        let version = read_state(&self.state)?.users.get(&id).map(|e| e.version);
        self.observe(RecordKey::User(id), version)
    }

    /// Validates observed versions and email uniqueness, then applies every
    /// buffered write atomically.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when a record read or written by
    /// this transaction was changed by a concurrent commit,
    /// [`StoreError::DuplicateEmail`] when the result would hold two users
    /// with one email, or [`StoreError::Persistence`] when the store lock is
    /// poisoned. Nothing is applied on error.
    pub(crate) fn commit(self) -> StoreResult<()> {
        let Self {
            state,
            observed,
            tasks,
            users,
        } = self;
        let mut guard = write_state(&state)?;

        for (key, seen) in &observed {
            let current = match key {
                RecordKey::Task(id) => guard.tasks.get(id).map(|e| e.version),
                RecordKey::User(id) => guard.users.get(id).map(|e| e.version),
            };
            if current != *seen {
                return Err(StoreError::Conflict(format!(
                    "{key} was modified by a concurrent transaction"
                )));
            }
        }

        for user in users.values().flatten() {
            let taken_by_committed = guard.users.values().any(|entry| {
                entry.record.id() != user.id()
                    && entry.record.email() == user.email()
                    && !users.contains_key(&entry.record.id())
            });
            let taken_by_pending = users
                .values()
                .flatten()
                .any(|other| other.id() != user.id() && other.email() == user.email());
            if taken_by_committed || taken_by_pending {
                return Err(StoreError::DuplicateEmail(user.email().clone()));
            }
        }

        let write_count = tasks.len() + users.len();
        for (id, task) in tasks {
            guard.last_version += 1;
            let version = guard.last_version;
            match task {
                Some(record) => {
                    guard.tasks.insert(id, Versioned { version, record });
                }
                None => {
                    guard.tasks.remove(&id);
                }
            }
        }
        for (id, user) in users {
            guard.last_version += 1;
            let version = guard.last_version;
            match user {
                Some(record) => {
                    guard.users.insert(id, Versioned { version, record });
                }
                None => {
                    guard.users.remove(&id);
                }
            }
        }
        guard.committed_writes += u64::try_from(write_count).unwrap_or(u64::MAX);

        debug!(records = write_count, "in-memory transaction committed");
        Ok(())
    }
}

impl StoreTransaction for InMemoryTransaction {
    fn get_task(&mut self, id: TaskId) -> StoreResult<Option<Task>> {
        match self.tasks.get(&id) {
            Some(pending) => Ok(pending.clone()),
            None => self.committed_task(id),
        }
    }

    fn get_user(&mut self, id: UserId) -> StoreResult<Option<User>> {
        match self.users.get(&id) {
            Some(pending) => Ok(pending.clone()),
            None => self.committed_user(id),
        }
    }

    fn put_task(&mut self, task: &Task) -> StoreResult<()> {
        self.observe_current_task(task.id())?;
        self.tasks.insert(task.id(), Some(task.clone()));
        Ok(())
    }

    fn put_user(&mut self, user: &User) -> StoreResult<()> {
        self.observe_current_user(user.id())?;
        self.users.insert(user.id(), Some(user.clone()));
        Ok(())
    }

    fn delete_task(&mut self, id: TaskId) -> StoreResult<()> {
        self.observe_current_task(id)?;
        self.tasks.insert(id, None);
        Ok(())
    }

    fn delete_user(&mut self, id: UserId) -> StoreResult<()> {
        self.observe_current_user(id)?;
        self.users.insert(id, None);
        Ok(())
    }

    fn find_user_by_email(&mut self, email: &EmailAddress) -> StoreResult<Option<User>> {
        if let Some(pending) = self
            .users
            .values()
            .flatten()
            .find(|user| user.email() == email)
        {
            return Ok(Some(pending.clone()));
        }

        let committed = read_state(&self.state)?
            .users
            .values()
            .find(|entry| {
                entry.record.email() == email && !self.users.contains_key(&entry.record.id())
            })
            .cloned();
        match committed {
            Some(entry) => {
                self.observe(RecordKey::User(entry.record.id()), Some(entry.version))?;
                Ok(Some(entry.record))
            }
            None => Ok(None),
        }
    }

    fn find_tasks_by_assignee(&mut self, user: UserId) -> StoreResult<Vec<Task>> {
        let committed: Vec<Versioned<Task>> = read_state(&self.state)?
            .tasks
            .values()
            .filter(|entry| {
                entry.record.assigned_user() == Some(user)
                    && !self.tasks.contains_key(&entry.record.id())
            })
            .cloned()
            .collect();

        let mut assigned = Vec::with_capacity(committed.len());
        for entry in committed {
            self.observe(RecordKey::Task(entry.record.id()), Some(entry.version))?;
            assigned.push(entry.record);
        }
        assigned.extend(
            self.tasks
                .values()
                .flatten()
                .filter(|task| task.assigned_user() == Some(user))
                .cloned(),
        );
        assigned.sort_by_key(|task| (task.created_at(), task.id()));
        Ok(assigned)
    }
}
