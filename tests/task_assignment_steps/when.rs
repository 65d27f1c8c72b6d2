//! When steps for task assignment BDD scenarios.

use super::world::{AssignmentWorld, run_async};
use rstest_bdd_macros::when;
use tasklink::roster::services::{UpdateTaskRequest, UpdateUserRequest};

#[when(r#""{user}" takes task "{task}""#)]
fn user_takes_task(
    world: &mut AssignmentWorld,
    user: String,
    task: String,
) -> Result<(), eyre::Report> {
    let request = UpdateTaskRequest::new(world.task_id(&task)?).assign_to(world.user_id(&user)?);
    world.last_error = run_async(world.roster.tasks.update_task(request)).err();
    Ok(())
}

#[when(r#"task "{task}" is marked completed"#)]
fn mark_completed(world: &mut AssignmentWorld, task: String) -> Result<(), eyre::Report> {
    let request = UpdateTaskRequest::new(world.task_id(&task)?).with_completed(true);
    world.last_error = run_async(world.roster.tasks.update_task(request)).err();
    Ok(())
}

#[when(r#"task "{task}" is renamed to "{name}""#)]
fn rename_task(
    world: &mut AssignmentWorld,
    task: String,
    name: String,
) -> Result<(), eyre::Report> {
    let request = UpdateTaskRequest::new(world.task_id(&task)?).with_name(name);
    world.last_error = run_async(world.roster.tasks.update_task(request)).err();
    Ok(())
}

#[when(r#"the pending tasks of "{user}" are replaced with "{task}""#)]
fn replace_pending(
    world: &mut AssignmentWorld,
    user: String,
    task: String,
) -> Result<(), eyre::Report> {
    let request =
        UpdateUserRequest::new(world.user_id(&user)?).with_pending_tasks([world.task_id(&task)?]);
    world.last_error = run_async(world.roster.users.update_user(request)).err();
    Ok(())
}

#[when(r#"user "{user}" is deleted"#)]
fn delete_user(world: &mut AssignmentWorld, user: String) -> Result<(), eyre::Report> {
    let user_id = world.user_id(&user)?;
    world.last_error = run_async(world.roster.users.delete_user(user_id)).err();
    Ok(())
}
