//! Given steps for task assignment BDD scenarios.

use super::world::{AssignmentWorld, run_async};
use chrono::{Duration, Utc};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use tasklink::roster::services::{CreateTaskRequest, CreateUserRequest, UpdateTaskRequest};

#[given(r#"a user named "{name}""#)]
fn user_named(world: &mut AssignmentWorld, name: String) -> Result<(), eyre::Report> {
    let email = format!("{}@example.com", name.to_lowercase());
    let user = run_async(
        world
            .roster
            .users
            .create_user(CreateUserRequest::new(name.clone(), email)),
    )
    .wrap_err("create user for scenario")?;
    world.users.insert(name, user.id());
    Ok(())
}

#[given(r#"an unassigned task named "{task}""#)]
fn unassigned_task(world: &mut AssignmentWorld, task: String) -> Result<(), eyre::Report> {
    let request = CreateTaskRequest::new(task.clone(), Utc::now() + Duration::days(7));
    let created = run_async(world.roster.tasks.create_task(request))
        .wrap_err("create unassigned task for scenario")?;
    world.tasks.insert(task, created.id());
    Ok(())
}

#[given(r#"a task named "{task}" assigned to "{user}""#)]
fn assigned_task(
    world: &mut AssignmentWorld,
    task: String,
    user: String,
) -> Result<(), eyre::Report> {
    let user_id = world.user_id(&user)?;
    let request = CreateTaskRequest::new(task.clone(), Utc::now() + Duration::days(7))
        .with_assigned_user(user_id);
    let created = run_async(world.roster.tasks.create_task(request))
        .wrap_err("create assigned task for scenario")?;
    world.tasks.insert(task, created.id());
    Ok(())
}

#[given(r#"task "{task}" has been completed"#)]
fn task_completed(world: &mut AssignmentWorld, task: String) -> Result<(), eyre::Report> {
    let task_id = world.task_id(&task)?;
    run_async(
        world
            .roster
            .tasks
            .update_task(UpdateTaskRequest::new(task_id).with_completed(true)),
    )
    .wrap_err("complete task in scenario setup")?;
    Ok(())
}
