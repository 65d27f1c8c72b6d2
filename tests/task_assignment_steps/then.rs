//! Then steps for task assignment BDD scenarios.

use super::world::AssignmentWorld;
use rstest_bdd_macros::then;
use tasklink::roster::{domain::UNASSIGNED_USER_NAME, services::RosterError};

#[then(r#"task "{task}" is assigned to "{user}""#)]
fn task_assigned_to(
    world: &AssignmentWorld,
    task: String,
    user: String,
) -> Result<(), eyre::Report> {
    let record = world.fetch_task(&task)?;
    let user_id = world.user_id(&user)?;

    eyre::ensure!(
        record.assigned_user() == Some(user_id),
        "expected {task} to be assigned to {user}, found {:?}",
        record.assigned_user()
    );
    eyre::ensure!(
        record.assigned_user_name() == user,
        "expected assignee name {user}, found {}",
        record.assigned_user_name()
    );
    Ok(())
}

#[then(r#"task "{task}" is unassigned"#)]
fn task_unassigned(world: &AssignmentWorld, task: String) -> Result<(), eyre::Report> {
    let record = world.fetch_task(&task)?;

    eyre::ensure!(
        record.assigned_user().is_none(),
        "expected {task} to be unassigned"
    );
    eyre::ensure!(
        record.assigned_user_name() == UNASSIGNED_USER_NAME,
        "expected the unassigned name, found {}",
        record.assigned_user_name()
    );
    Ok(())
}

#[then(r#"task "{task}" is completed"#)]
fn task_is_completed(world: &AssignmentWorld, task: String) -> Result<(), eyre::Report> {
    let record = world.fetch_task(&task)?;
    eyre::ensure!(record.is_completed(), "expected {task} to be completed");
    eyre::ensure!(
        record.name().as_str() == task,
        "expected {task} to keep its name, found {}",
        record.name()
    );
    Ok(())
}

#[then(r#""{user}" has pending task "{task}""#)]
fn user_has_pending_task(
    world: &AssignmentWorld,
    user: String,
    task: String,
) -> Result<(), eyre::Report> {
    let record = world.fetch_user(&user)?;
    let task_id = world.task_id(&task)?;

    eyre::ensure!(
        record.pending_tasks() == [task_id].as_slice(),
        "expected {user} to hold only {task}, found {:?}",
        record.pending_tasks()
    );
    Ok(())
}

#[then(r#""{user}" has no pending tasks"#)]
fn user_has_no_pending_tasks(world: &AssignmentWorld, user: String) -> Result<(), eyre::Report> {
    let record = world.fetch_user(&user)?;
    eyre::ensure!(
        record.pending_tasks().is_empty(),
        "expected {user} to hold no tasks, found {:?}",
        record.pending_tasks()
    );
    Ok(())
}

#[then("the operation fails because the task is already completed")]
fn fails_already_completed(world: &AssignmentWorld) -> Result<(), eyre::Report> {
    match &world.last_error {
        Some(RosterError::AlreadyCompleted(_)) => Ok(()),
        other => Err(eyre::eyre!("expected AlreadyCompleted, got {other:?}")),
    }
}

#[then("the operation fails because a listed task is already completed")]
fn fails_listed_task_completed(world: &AssignmentWorld) -> Result<(), eyre::Report> {
    match &world.last_error {
        Some(RosterError::TaskAlreadyCompleted(_)) => Ok(()),
        other => Err(eyre::eyre!("expected TaskAlreadyCompleted, got {other:?}")),
    }
}
