//! Task lifecycle service: creation, update, deletion, and task reads.

use super::{
    association::{assign, attach_to_user, detach_from_user, reattach_to_user, release},
    error::{RosterError, RosterResult},
    transaction::TransactionOrchestrator,
};
use crate::config::TransactionConfig;
use crate::roster::{
    domain::{NewTask, Task, TaskId, TaskName, UserId},
    ports::{EntityStore, TaskFilter},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use tracing::info;

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    name: String,
    deadline: DateTime<Utc>,
    description: Option<String>,
    completed: bool,
    assigned_user: Option<UserId>,
    assigned_user_name: Option<String>,
}

impl CreateTaskRequest {
    /// Creates a request with the required task fields.
    #[must_use]
    pub fn new(name: impl Into<String>, deadline: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            deadline,
            description: None,
            completed: false,
            assigned_user: None,
            assigned_user_name: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the initial completion flag.
    #[must_use]
    pub const fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    /// Assigns the task to `user` on creation.
    #[must_use]
    pub const fn with_assigned_user(mut self, user: UserId) -> Self {
        self.assigned_user = Some(user);
        self
    }

    /// Overrides the denormalized assignee name.
    #[must_use]
    pub fn with_assigned_user_name(mut self, name: impl Into<String>) -> Self {
        self.assigned_user_name = Some(name.into());
        self
    }
}

/// Request payload for updating a task. Unset fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTaskRequest {
    task_id: TaskId,
    name: Option<String>,
    deadline: Option<DateTime<Utc>>,
    description: Option<Option<String>>,
    completed: Option<bool>,
    assigned_user: Option<Option<UserId>>,
    assigned_user_name: Option<String>,
}

impl UpdateTaskRequest {
    /// Creates an empty patch for `task_id`.
    #[must_use]
    pub const fn new(task_id: TaskId) -> Self {
        Self {
            task_id,
            name: None,
            deadline: None,
            description: None,
            completed: None,
            assigned_user: None,
            assigned_user_name: None,
        }
    }

    /// Returns the targeted task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Sets a new name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets a new deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets a new description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(Some(description.into()));
        self
    }

    /// Clears the description.
    #[must_use]
    pub fn without_description(mut self) -> Self {
        self.description = Some(None);
        self
    }

    /// Sets the completion flag.
    #[must_use]
    pub const fn with_completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    /// Reassigns the task to `user`.
    #[must_use]
    pub const fn assign_to(mut self, user: UserId) -> Self {
        self.assigned_user = Some(Some(user));
        self
    }

    /// Removes the task's assignee.
    #[must_use]
    pub const fn unassign(mut self) -> Self {
        self.assigned_user = Some(None);
        self
    }

    /// Overrides the denormalized assignee name after reassignment.
    #[must_use]
    pub fn with_assigned_user_name(mut self, name: impl Into<String>) -> Self {
        self.assigned_user_name = Some(name.into());
        self
    }
}

/// Task lifecycle orchestration service.
pub struct TaskLifecycleService<S, C>
where
    S: EntityStore,
    C: Clock + Send + Sync + 'static,
{
    orchestrator: TransactionOrchestrator<S, C>,
}

impl<S, C> Clone for TaskLifecycleService<S, C>
where
    S: EntityStore,
    C: Clock + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            orchestrator: self.orchestrator.clone(),
        }
    }
}

impl<S, C> TaskLifecycleService<S, C>
where
    S: EntityStore,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a task lifecycle service with the default transaction settings.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self::with_orchestrator(TransactionOrchestrator::new(
            store,
            clock,
            TransactionConfig::default(),
        ))
    }

    /// Creates a task lifecycle service sharing an existing orchestrator.
    #[must_use]
    pub const fn with_orchestrator(orchestrator: TransactionOrchestrator<S, C>) -> Self {
        Self { orchestrator }
    }

    /// Creates a task, attaching it to its assignee when one is given.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::Validation`] for a blank name,
    /// [`RosterError::UserNotFound`] when the assignee does not exist, or
    /// [`RosterError::TransactionAborted`] on store failure.
    pub async fn create_task(&self, request: CreateTaskRequest) -> RosterResult<Task> {
        let CreateTaskRequest {
            name,
            deadline,
            description,
            completed,
            assigned_user,
            assigned_user_name,
        } = request;
        let new_task = NewTask {
            name: TaskName::new(name)?,
            deadline,
            description,
            completed,
        };
        let mut task = Task::new(new_task, self.orchestrator.clock());

        let created = self
            .orchestrator
            .run_atomic("create_task", move |unit| {
                if let Some(user_id) = assigned_user {
                    let user = if task.is_completed() {
                        unit.load_user(user_id)?
                    } else {
                        attach_to_user(unit, user_id, &task)?
                    };
                    assign(&mut task, &user);
                }
                if let Some(name_override) = assigned_user_name {
                    task.set_assigned_user_name(name_override);
                }
                unit.save_task(&task)?;
                Ok(task)
            })
            .await?;

        info!(task_id = %created.id(), assigned_user = ?created.assigned_user(), "task created");
        Ok(created)
    }

    /// Applies a patch to a task and repairs both sides of its assignment.
    ///
    /// Field changes apply first, then completion, then reassignment, then
    /// any explicit assignee-name override. Completion detaches the task
    /// from its assignee's pending list; un-completion re-attaches it.
    /// Reassignment detaches from the previous assignee and, for an open
    /// task, attaches to the new one.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::TaskNotFound`], [`RosterError::AlreadyCompleted`]
    /// when the task is already completed, [`RosterError::UserNotFound`] when
    /// a referenced user is missing, [`RosterError::Validation`] for a blank
    /// name, or [`RosterError::TransactionAborted`]. On any error nothing is
    /// written.
    pub async fn update_task(&self, request: UpdateTaskRequest) -> RosterResult<Task> {
        let UpdateTaskRequest {
            task_id,
            name: raw_name,
            deadline: new_deadline,
            description: new_description,
            completed: new_completed,
            assigned_user: new_assignee,
            assigned_user_name,
        } = request;
        let new_name = raw_name.map(TaskName::new).transpose()?;

        let updated = self
            .orchestrator
            .run_atomic("update_task", move |unit| {
                let mut task = unit.load_task(task_id)?;
                if task.is_completed() {
                    return Err(RosterError::AlreadyCompleted(task_id));
                }

                if let Some(name) = new_name {
                    task.rename(name);
                }
                if let Some(deadline) = new_deadline {
                    task.reschedule(deadline);
                }
                if let Some(description) = new_description {
                    task.set_description(description);
                }

                if let Some(completed) = new_completed {
                    task.set_completed(completed);
                    if let Some(user) = task.assigned_user() {
                        if completed {
                            detach_from_user(unit, user, task_id)?;
                        } else {
                            reattach_to_user(unit, user, &task)?;
                        }
                    }
                }

                if let Some(assignee) = new_assignee {
                    if let Some(previous) = task.assigned_user() {
                        detach_from_user(unit, previous, task_id)?;
                    }
                    match assignee {
                        Some(user_id) => {
                            let user = if task.is_completed() {
                                unit.load_user(user_id)?
                            } else {
                                attach_to_user(unit, user_id, &task)?
                            };
                            assign(&mut task, &user);
                        }
                        None => release(&mut task),
                    }
                }

                if let Some(name_override) = assigned_user_name {
                    task.set_assigned_user_name(name_override);
                }

                unit.save_task(&task)?;
                Ok(task)
            })
            .await?;

        info!(
            task_id = %task_id,
            completed = updated.is_completed(),
            assigned_user = ?updated.assigned_user(),
            "task updated"
        );
        Ok(updated)
    }

    /// Deletes a task, detaching it from its assignee's pending list first.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::TaskNotFound`], [`RosterError::UserNotFound`]
    /// when an open task references a missing user, or
    /// [`RosterError::TransactionAborted`].
    pub async fn delete_task(&self, task_id: TaskId) -> RosterResult<()> {
        self.orchestrator
            .run_atomic("delete_task", move |unit| {
                let task = unit.load_task(task_id)?;
                if let Some(user) = task.assigned_user().filter(|_| !task.is_completed()) {
                    detach_from_user(unit, user, task_id)?;
                }
                unit.remove_task(task_id)
            })
            .await?;

        info!(task_id = %task_id, "task deleted");
        Ok(())
    }

    /// Reads a committed task.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::TaskNotFound`] or
    /// [`RosterError::TransactionAborted`] on store failure.
    pub async fn get_task(&self, task_id: TaskId) -> RosterResult<Task> {
        self.orchestrator
            .store()
            .find_task(task_id)
            .await?
            .ok_or(RosterError::TaskNotFound(task_id))
    }

    /// Lists committed tasks matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::TransactionAborted`] on store failure.
    pub async fn list_tasks(&self, filter: &TaskFilter) -> RosterResult<Vec<Task>> {
        Ok(self.orchestrator.store().list_tasks(filter).await?)
    }

    /// Counts committed tasks matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::TransactionAborted`] on store failure.
    pub async fn count_tasks(&self, filter: &TaskFilter) -> RosterResult<usize> {
        Ok(self.orchestrator.store().count_tasks(filter).await?)
    }
}
