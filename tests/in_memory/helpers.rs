//! Shared test helpers for in-memory roster integration tests.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use mockable::DefaultClock;
use rstest::fixture;
use tasklink::config::TransactionConfig;
use tasklink::roster::{
    adapters::memory::InMemoryEntityStore,
    domain::{Task, TaskId, UNASSIGNED_USER_NAME, User, UserId},
    ports::{ListWindow, TaskFilter},
    services::{CreateTaskRequest, CreateUserRequest, Roster, RosterError},
};

/// Roster type used by integration tests.
pub type TestRoster = Roster<InMemoryEntityStore, DefaultClock>;

/// Provides a roster over a fresh in-memory store.
#[fixture]
pub fn roster() -> TestRoster {
    Roster::new(
        Arc::new(InMemoryEntityStore::new()),
        Arc::new(DefaultClock),
        TransactionConfig::default(),
    )
}

/// Creates a user whose email is derived from `name`.
///
/// # Errors
///
/// Returns the roster error when creation fails.
pub async fn create_user(roster: &TestRoster, name: &str) -> Result<User, RosterError> {
    let email = format!("{}@example.com", name.to_lowercase().replace(' ', "."));
    roster
        .users
        .create_user(CreateUserRequest::new(name, email))
        .await
}

/// Creates an open task due in a week, optionally assigned.
///
/// # Errors
///
/// Returns the roster error when creation fails.
pub async fn create_task(
    roster: &TestRoster,
    name: &str,
    assignee: Option<UserId>,
) -> Result<Task, RosterError> {
    let mut request = CreateTaskRequest::new(name, Utc::now() + Duration::days(7));
    if let Some(user) = assignee {
        request = request.with_assigned_user(user);
    }
    roster.tasks.create_task(request).await
}

/// Reads every committed task and user.
///
/// # Errors
///
/// Returns the roster error when a listing fails.
pub async fn snapshot(roster: &TestRoster) -> Result<(Vec<Task>, Vec<User>), RosterError> {
    let tasks = roster.tasks.list_tasks(&TaskFilter::default()).await?;
    let users = roster.users.list_users(&ListWindow::default()).await?;
    Ok((tasks, users))
}

/// Checks the mutual-reference invariants over one committed snapshot.
///
/// A completed task may keep pointing at a deleted user; such history is
/// exempt from the name check.
///
/// # Errors
///
/// Returns a description of the first violated invariant.
pub fn check_invariants(tasks: &[Task], users: &[User]) -> Result<(), String> {
    let tasks_by_id: HashMap<TaskId, &Task> = tasks.iter().map(|task| (task.id(), task)).collect();
    let users_by_id: HashMap<UserId, &User> = users.iter().map(|user| (user.id(), user)).collect();

    for task in tasks {
        match task.assigned_user() {
            None => {
                if task.assigned_user_name() != UNASSIGNED_USER_NAME {
                    return Err(format!("unassigned task {} shows a name", task.id()));
                }
            }
            Some(user_id) => {
                let owner = users_by_id.get(&user_id);
                if !task.is_completed() && !owner.is_some_and(|user| user.has_pending(task.id())) {
                    return Err(format!("open task {} missing from its user's list", task.id()));
                }
                if let Some(user) = owner {
                    if task.assigned_user_name() != user.name().as_str() {
                        return Err(format!("task {} shows a stale user name", task.id()));
                    }
                }
            }
        }
    }

    let mut holders: HashMap<TaskId, UserId> = HashMap::new();
    for user in users {
        for task_id in user.pending_tasks() {
            let Some(task) = tasks_by_id.get(task_id) else {
                return Err(format!("user {} lists missing task {task_id}", user.id()));
            };
            if !task.is_pending_for(user.id()) {
                return Err(format!("user {} lists completed or foreign task {task_id}", user.id()));
            }
            if let Some(other) = holders.insert(*task_id, user.id()) {
                if other != user.id() {
                    return Err(format!("task {task_id} is pending for two users"));
                }
            }
        }
    }
    Ok(())
}
