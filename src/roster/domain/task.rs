//! Task aggregate and its assignment reference.

use super::{TaskId, TaskName, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::Serialize;

/// Denormalized assignee name shown while a task has no assignee.
pub const UNASSIGNED_USER_NAME: &str = "unassigned";

/// Parameter object for creating a task.
///
/// Assignment is not part of the task's own construction; the lifecycle
/// service attaches the task to its assignee inside the creating
/// transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Validated task name.
    pub name: TaskName,
    /// Task deadline.
    pub deadline: DateTime<Utc>,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Initial completion flag.
    pub completed: bool,
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    id: TaskId,
    name: TaskName,
    deadline: DateTime<Utc>,
    description: Option<String>,
    completed: bool,
    assigned_user: Option<UserId>,
    assigned_user_name: String,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PersistedTaskData {
    pub id: TaskId,
    pub name: TaskName,
    pub deadline: DateTime<Utc>,
    pub description: Option<String>,
    pub completed: bool,
    pub assigned_user: Option<UserId>,
    pub assigned_user_name: String,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new, unassigned task.
    #[must_use]
    pub fn new(data: NewTask, clock: &impl Clock) -> Self {
        Self {
            id: TaskId::new(),
            name: data.name,
            deadline: data.deadline,
            description: data.description,
            completed: data.completed,
            assigned_user: None,
            assigned_user_name: UNASSIGNED_USER_NAME.to_owned(),
            created_at: clock.utc(),
        }
    }

    /// Reconstructs a task from persisted storage.
    pub(crate) fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            deadline: data.deadline,
            description: data.description,
            completed: data.completed,
            assigned_user: data.assigned_user,
            assigned_user_name: data.assigned_user_name,
            created_at: data.created_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the task name.
    #[must_use]
    pub const fn name(&self) -> &TaskName {
        &self.name
    }

    /// Returns the task deadline.
    #[must_use]
    pub const fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns whether the task is completed.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.completed
    }

    /// Returns the assigned user, or `None` when unassigned.
    #[must_use]
    pub const fn assigned_user(&self) -> Option<UserId> {
        self.assigned_user
    }

    /// Returns the denormalized assignee name.
    ///
    /// Equals [`UNASSIGNED_USER_NAME`] while the task is unassigned, unless a
    /// caller overrode it explicitly.
    #[must_use]
    pub fn assigned_user_name(&self) -> &str {
        &self.assigned_user_name
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns whether this task belongs in `user`'s pending list.
    #[must_use]
    pub fn is_pending_for(&self, user: UserId) -> bool {
        !self.completed && self.assigned_user == Some(user)
    }

    /// Replaces the task name.
    pub fn rename(&mut self, name: TaskName) {
        self.name = name;
    }

    /// Replaces the deadline.
    pub const fn reschedule(&mut self, deadline: DateTime<Utc>) {
        self.deadline = deadline;
    }

    /// Replaces the description.
    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    pub(in crate::roster) const fn set_completed(&mut self, completed: bool) {
        self.completed = completed;
    }

    pub(in crate::roster) const fn set_assigned_user(&mut self, user: UserId) {
        self.assigned_user = Some(user);
    }

    pub(in crate::roster) fn set_assigned_user_name(&mut self, name: impl Into<String>) {
        self.assigned_user_name = name.into();
    }

    /// Drops the assignee and resets the name to the unassigned sentinel.
    pub(in crate::roster) fn release(&mut self) {
        self.assigned_user = None;
        self.assigned_user_name = UNASSIGNED_USER_NAME.to_owned();
    }
}
