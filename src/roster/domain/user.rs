//! User aggregate and its pending-task list.

use super::{EmailAddress, TaskId, UserId, UserName};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::Serialize;

/// Parameter object for creating a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Validated display name.
    pub name: UserName,
    /// Validated, globally unique email address.
    pub email: EmailAddress,
}

/// User aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: UserId,
    name: UserName,
    email: EmailAddress,
    pending_tasks: Vec<TaskId>,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted user aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PersistedUserData {
    pub id: UserId,
    pub name: UserName,
    pub email: EmailAddress,
    pub pending_tasks: Vec<TaskId>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a user with an empty pending list.
    #[must_use]
    pub fn new(data: NewUser, clock: &impl Clock) -> Self {
        Self {
            id: UserId::new(),
            name: data.name,
            email: data.email,
            pending_tasks: Vec::new(),
            created_at: clock.utc(),
        }
    }

    /// Reconstructs a user from persisted storage.
    pub(crate) fn from_persisted(data: PersistedUserData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            email: data.email,
            pending_tasks: data.pending_tasks,
            created_at: data.created_at,
        }
    }

    /// Returns the user identifier.
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub const fn name(&self) -> &UserName {
        &self.name
    }

    /// Returns the email address.
    #[must_use]
    pub const fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Returns the pending task identifiers in insertion order.
    #[must_use]
    pub fn pending_tasks(&self) -> &[TaskId] {
        &self.pending_tasks
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns whether `task` appears in the pending list.
    #[must_use]
    pub fn has_pending(&self, task: TaskId) -> bool {
        self.pending_tasks.contains(&task)
    }

    /// Replaces the display name.
    pub(in crate::roster) fn rename(&mut self, name: UserName) {
        self.name = name;
    }

    /// Replaces the email address.
    pub(in crate::roster) fn change_email(&mut self, email: EmailAddress) {
        self.email = email;
    }

    pub(in crate::roster) fn push_pending(&mut self, task: TaskId) {
        self.pending_tasks.push(task);
    }

    /// Removes every occurrence of `task`; returns whether any was present.
    pub(in crate::roster) fn remove_pending(&mut self, task: TaskId) -> bool {
        let before = self.pending_tasks.len();
        self.pending_tasks.retain(|id| *id != task);
        self.pending_tasks.len() != before
    }

    pub(in crate::roster) fn replace_pending(&mut self, tasks: Vec<TaskId>) -> Vec<TaskId> {
        std::mem::replace(&mut self.pending_tasks, tasks)
    }
}
