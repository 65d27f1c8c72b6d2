//! User lifecycle service: creation, update, deletion, and user reads.

use super::{
    association::{claim_for, release, replace_pending_list, sync_assigned_name},
    error::{RosterError, RosterResult},
    transaction::{TransactionOrchestrator, UnitOfWork},
};
use crate::config::TransactionConfig;
use crate::roster::{
    domain::{EmailAddress, NewUser, TaskId, User, UserId, UserName},
    ports::{EntityStore, ListWindow},
};
use mockable::Clock;
use std::sync::Arc;
use tracing::info;

/// Request payload for creating a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUserRequest {
    name: String,
    email: String,
    pending_tasks: Vec<TaskId>,
}

impl CreateUserRequest {
    /// Creates a request with the required user fields.
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            pending_tasks: Vec::new(),
        }
    }

    /// Sets the initial pending task list.
    #[must_use]
    pub fn with_pending_tasks(mut self, tasks: impl IntoIterator<Item = TaskId>) -> Self {
        self.pending_tasks = tasks.into_iter().collect();
        self
    }
}

/// Request payload for updating a user. Unset fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateUserRequest {
    user_id: UserId,
    name: Option<String>,
    email: Option<String>,
    pending_tasks: Option<Vec<TaskId>>,
}

impl UpdateUserRequest {
    /// Creates an empty patch for `user_id`.
    #[must_use]
    pub const fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            name: None,
            email: None,
            pending_tasks: None,
        }
    }

    /// Returns the targeted user.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Sets a new display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets a new email address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Replaces the pending task list wholesale.
    ///
    /// Order is kept and duplicates are not removed.
    #[must_use]
    pub fn with_pending_tasks(mut self, tasks: impl IntoIterator<Item = TaskId>) -> Self {
        self.pending_tasks = Some(tasks.into_iter().collect());
        self
    }
}

/// User lifecycle orchestration service.
pub struct UserLifecycleService<S, C>
where
    S: EntityStore,
    C: Clock + Send + Sync + 'static,
{
    orchestrator: TransactionOrchestrator<S, C>,
}

impl<S, C> Clone for UserLifecycleService<S, C>
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

impl<S, C> UserLifecycleService<S, C>
where
    S: EntityStore,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a user lifecycle service with the default transaction settings.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self::with_orchestrator(TransactionOrchestrator::new(
            store,
            clock,
            TransactionConfig::default(),
        ))
    }

    /// Creates a user lifecycle service sharing an existing orchestrator.
    #[must_use]
    pub const fn with_orchestrator(orchestrator: TransactionOrchestrator<S, C>) -> Self {
        Self { orchestrator }
    }

    /// Creates a user, assigning any initial pending tasks to them.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::Validation`] for invalid fields,
    /// [`RosterError::DuplicateEmail`] when the email is taken,
    /// [`RosterError::TaskNotFound`] or [`RosterError::TaskAlreadyCompleted`]
    /// for an unusable initial task, or [`RosterError::TransactionAborted`].
    pub async fn create_user(&self, request: CreateUserRequest) -> RosterResult<User> {
        let CreateUserRequest {
            name,
            email,
            pending_tasks,
        } = request;
        let new_user = NewUser {
            name: UserName::new(name)?,
            email: EmailAddress::new(email)?,
        };
        let mut user = User::new(new_user, self.orchestrator.clock());

        let created = self
            .orchestrator
            .run_atomic("create_user", move |unit| {
                ensure_email_available(unit, user.email(), user.id())?;
                for task_id in &pending_tasks {
                    claim_for(unit, &user, *task_id)?;
                }
                user.replace_pending(pending_tasks);
                unit.save_user(&user)?;
                Ok(user)
            })
            .await?;

        info!(user_id = %created.id(), pending = created.pending_tasks().len(), "user created");
        Ok(created)
    }

    /// Applies a patch to a user.
    ///
    /// Replacing the pending list is a full swap: every task on the old list
    /// is released, then every task on the new list is assigned to this
    /// user, detaching it from any other user that still lists it. Tasks on
    /// both lists are therefore written twice. A rename re-syncs the assignee
    /// name on every task assigned to the user.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::UserNotFound`], [`RosterError::TaskNotFound`]
    /// for a missing listed task, [`RosterError::TaskAlreadyCompleted`] for a
    /// completed listed task, [`RosterError::DuplicateEmail`],
    /// [`RosterError::Validation`], or [`RosterError::TransactionAborted`].
    /// On any error nothing is written.
    pub async fn update_user(&self, request: UpdateUserRequest) -> RosterResult<User> {
        let UpdateUserRequest {
            user_id,
            name: raw_name,
            email: raw_email,
            pending_tasks: replacement,
        } = request;
        let new_name = raw_name.map(UserName::new).transpose()?;
        let new_email = raw_email.map(EmailAddress::new).transpose()?;

        let updated = self
            .orchestrator
            .run_atomic("update_user", move |unit| {
                let mut user = unit.load_user(user_id)?;
                let renamed = new_name.as_ref().is_some_and(|name| name != user.name());

                if let Some(name) = new_name {
                    user.rename(name);
                }
                if let Some(email) = new_email {
                    if &email != user.email() {
                        ensure_email_available(unit, &email, user_id)?;
                    }
                    user.change_email(email);
                }

                if let Some(pending_tasks) = replacement {
                    replace_pending_list(unit, &mut user, pending_tasks)?;
                }

                if renamed {
                    resync_assigned_names(unit, &user)?;
                }

                unit.save_user(&user)?;
                Ok(user)
            })
            .await?;

        info!(
            user_id = %user_id,
            pending = updated.pending_tasks().len(),
            "user updated"
        );
        Ok(updated)
    }

    /// Deletes a user, releasing each open task on their pending list.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::UserNotFound`], [`RosterError::TaskNotFound`]
    /// for a listed task that no longer exists, or
    /// [`RosterError::TransactionAborted`].
    pub async fn delete_user(&self, user_id: UserId) -> RosterResult<()> {
        self.orchestrator
            .run_atomic("delete_user", move |unit| {
                let user = unit.load_user(user_id)?;
                for task_id in user.pending_tasks() {
                    let mut task = unit.load_task(*task_id)?;
                    if !task.is_completed() {
                        release(&mut task);
                        unit.save_task(&task)?;
                    }
                }
                unit.remove_user(user_id)
            })
            .await?;

        info!(user_id = %user_id, "user deleted");
        Ok(())
    }

    /// Reads a committed user.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::UserNotFound`] or
    /// [`RosterError::TransactionAborted`] on store failure.
    pub async fn get_user(&self, user_id: UserId) -> RosterResult<User> {
        self.orchestrator
            .store()
            .find_user(user_id)
            .await?
            .ok_or(RosterError::UserNotFound(user_id))
    }

    /// Lists committed users.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::TransactionAborted`] on store failure.
    pub async fn list_users(&self, window: &ListWindow) -> RosterResult<Vec<User>> {
        Ok(self.orchestrator.store().list_users(window).await?)
    }
}

fn ensure_email_available(
    unit: &mut UnitOfWork<'_>,
    email: &EmailAddress,
    owner: UserId,
) -> RosterResult<()> {
    match unit.find_user_by_email(email)? {
        Some(holder) if holder.id() != owner => Err(RosterError::DuplicateEmail(email.clone())),
        _ => Ok(()),
    }
}

fn resync_assigned_names(unit: &mut UnitOfWork<'_>, user: &User) -> RosterResult<()> {
    for mut task in unit.tasks_assigned_to(user.id())? {
        if task.assigned_user_name() != user.name().as_str() {
            sync_assigned_name(&mut task, Some(user));
            unit.save_task(&task)?;
        }
    }
    Ok(())
}
