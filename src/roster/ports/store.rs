//! Entity store port: keyed record storage with atomic transactions.

use crate::roster::domain::{EmailAddress, Task, TaskId, User, UserId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for entity store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Context handle for the reads and writes of one open transaction.
///
/// Reads observe the transaction's own earlier writes. Nothing written
/// through the handle is visible to other transactions until the enclosing
/// [`EntityStore::with_transaction`] call commits.
#[cfg_attr(test, mockall::automock)]
pub trait StoreTransaction {
    /// Loads a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the underlying store fails.
    fn get_task(&mut self, id: TaskId) -> StoreResult<Option<Task>>;

    /// Loads a user by identifier.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the underlying store fails.
    fn get_user(&mut self, id: UserId) -> StoreResult<Option<User>>;

    /// Inserts or replaces a task record.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the underlying store fails.
    fn put_task(&mut self, task: &Task) -> StoreResult<()>;

    /// Inserts or replaces a user record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateEmail`] when another user already holds
    /// the email address, or another [`StoreError`] on store failure.
    fn put_user(&mut self, user: &User) -> StoreResult<()>;

    /// Removes a task record. Removing a missing record is not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the underlying store fails.
    fn delete_task(&mut self, id: TaskId) -> StoreResult<()>;

    /// Removes a user record. Removing a missing record is not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the underlying store fails.
    fn delete_user(&mut self, id: UserId) -> StoreResult<()>;

    /// Finds the user holding the given email address.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the underlying store fails.
    fn find_user_by_email(&mut self, email: &EmailAddress) -> StoreResult<Option<User>>;

    /// Returns every task whose assignee is `user`, completed or not.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the underlying store fails.
    fn find_tasks_by_assignee(&mut self, user: UserId) -> StoreResult<Vec<Task>>;
}

/// Assignee criterion for task listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AssigneeFilter {
    /// Any assignment state.
    #[default]
    Any,
    /// Only tasks without an assignee.
    Unassigned,
    /// Only tasks assigned to the given user.
    User(UserId),
}

/// Skip/limit window over an ordered listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListWindow {
    /// Number of leading records to skip.
    pub skip: usize,
    /// Maximum number of records to return; `None` is unbounded.
    pub limit: Option<usize>,
}

impl ListWindow {
    /// Applies the window to an already ordered iterator.
    pub fn apply<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        let skipped = items.into_iter().skip(self.skip);
        match self.limit {
            Some(limit) => skipped.take(limit).collect(),
            None => skipped.collect(),
        }
    }
}

/// Criteria for task listings. Results are ordered by creation time, then id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Completion flag to match, or `None` for both.
    pub completed: Option<bool>,
    /// Assignee criterion.
    pub assignee: AssigneeFilter,
    /// Result window.
    pub window: ListWindow,
}

impl TaskFilter {
    /// Returns whether `task` satisfies the completion and assignee criteria.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        let completion_matches = self
            .completed
            .is_none_or(|completed| task.is_completed() == completed);
        let assignee_matches = match self.assignee {
            AssigneeFilter::Any => true,
            AssigneeFilter::Unassigned => task.assigned_user().is_none(),
            AssigneeFilter::User(user) => task.assigned_user() == Some(user),
        };
        completion_matches && assignee_matches
    }
}

mod sealed {
    /// Permission to open a write transaction.
    ///
    /// Only this crate can issue one, so records are written solely through
    /// the roster services that keep tasks and users in agreement.
    #[derive(Debug, Clone, Copy)]
    pub struct TransactionGrant(());

    impl TransactionGrant {
        pub(crate) const fn issue() -> Self {
            Self(())
        }
    }
}

pub(crate) use sealed::TransactionGrant;

/// Durable, transactional record storage for tasks and users.
///
/// Committed state can be read by anyone holding the store. Transactions can
/// only be opened from inside this crate.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Runs `work` inside one transaction.
    ///
    /// The transaction commits when `work` returns `Ok` and rolls back when
    /// it returns `Err`; either way it is released before this call returns.
    /// A failed commit is converted into the caller's error type.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `work`, or a converted [`StoreError`]
    /// when the transaction cannot be opened or committed.
    async fn with_transaction<T, E, F>(&self, grant: TransactionGrant, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTransaction) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static;

    /// Reads a committed task.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the underlying store fails.
    async fn find_task(&self, id: TaskId) -> StoreResult<Option<Task>>;

    /// Reads a committed user.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the underlying store fails.
    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>>;

    /// Lists committed tasks matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the underlying store fails.
    async fn list_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>>;

    /// Counts committed tasks matching `filter`, ignoring its window.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the underlying store fails.
    async fn count_tasks(&self, filter: &TaskFilter) -> StoreResult<usize>;

    /// Lists committed users ordered by creation time, then id.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the underlying store fails.
    async fn list_users(&self, window: &ListWindow) -> StoreResult<Vec<User>>;
}

/// Errors returned by entity store implementations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// A concurrent transaction modified a record this one depends on.
    #[error("transaction conflict: {0}")]
    Conflict(String),

    /// Another user already holds the email address.
    #[error("duplicate email: {0}")]
    DuplicateEmail(EmailAddress),

    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A stored record could not be turned back into a domain value.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
