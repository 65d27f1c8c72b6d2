//! End-to-end assignment flows against the public roster API.

use super::helpers::{TestRoster, check_invariants, create_task, create_user, roster, snapshot};
use eyre::ensure;
use rstest::rstest;
use tasklink::roster::{
    domain::{TaskId, UNASSIGNED_USER_NAME},
    services::{RosterError, StatusClass, UpdateTaskRequest, UpdateUserRequest},
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn task_changes_hands_and_completes(roster: TestRoster) -> eyre::Result<()> {
    let ada = create_user(&roster, "Ada").await?;
    let grace = create_user(&roster, "Grace").await?;
    let task = create_task(&roster, "Port the compiler", None).await?;

    roster
        .tasks
        .update_task(UpdateTaskRequest::new(task.id()).assign_to(ada.id()))
        .await?;
    roster
        .users
        .update_user(UpdateUserRequest::new(grace.id()).with_pending_tasks([task.id()]))
        .await?;
    let done = roster
        .tasks
        .update_task(UpdateTaskRequest::new(task.id()).with_completed(true))
        .await?;

    ensure!(done.assigned_user() == Some(grace.id()), "Grace should own the task");
    ensure!(done.assigned_user_name() == "Grace", "name should follow the owner");
    let (tasks, users) = snapshot(&roster).await?;
    check_invariants(&tasks, &users).map_err(|violation| eyre::eyre!(violation))?;
    ensure!(
        users.iter().all(|user| user.pending_tasks().is_empty()),
        "no user should hold the completed task"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_claims_leave_a_single_owner(roster: TestRoster) -> eyre::Result<()> {
    let ada = create_user(&roster, "Ada").await?;
    let grace = create_user(&roster, "Grace").await?;
    let task = create_task(&roster, "Contested", None).await?;

    let first = tokio::spawn({
        let roster = roster.clone();
        let task_id = task.id();
        async move {
            roster
                .users
                .update_user(UpdateUserRequest::new(ada.id()).with_pending_tasks([task_id]))
                .await
        }
    });
    let second = tokio::spawn({
        let roster = roster.clone();
        let task_id = task.id();
        async move {
            roster
                .users
                .update_user(UpdateUserRequest::new(grace.id()).with_pending_tasks([task_id]))
                .await
        }
    });

    for outcome in [first.await?, second.await?] {
        if let Err(err) = outcome {
            ensure!(err.is_retryable(), "only conflicts may fail, got {err}");
        }
    }

    let (tasks, users) = snapshot(&roster).await?;
    check_invariants(&tasks, &users).map_err(|violation| eyre::eyre!(violation))?;
    let holders = users.iter().filter(|user| user.has_pending(task.id())).count();
    ensure!(holders == 1, "exactly one user should hold the task, found {holders}");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_users_and_tasks_repairs_counterparts(roster: TestRoster) -> eyre::Result<()> {
    let ada = create_user(&roster, "Ada").await?;
    let first = create_task(&roster, "First", Some(ada.id())).await?;
    let second = create_task(&roster, "Second", Some(ada.id())).await?;

    roster.tasks.delete_task(first.id()).await?;
    let remaining = roster.users.get_user(ada.id()).await?;
    ensure!(
        remaining.pending_tasks() == [second.id()].as_slice(),
        "deleted task should leave the pending list"
    );

    roster.users.delete_user(ada.id()).await?;
    let orphan = roster.tasks.get_task(second.id()).await?;
    ensure!(orphan.assigned_user().is_none(), "task should be released");
    ensure!(
        orphan.assigned_user_name() == UNASSIGNED_USER_NAME,
        "released task should show the unassigned name"
    );

    let (tasks, users) = snapshot(&roster).await?;
    check_invariants(&tasks, &users).map_err(|violation| eyre::eyre!(violation))?;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn errors_map_to_stable_status_classes(roster: TestRoster) -> eyre::Result<()> {
    let ada = create_user(&roster, "Ada").await?;
    let duplicate = create_user(&roster, "Ada").await;
    let missing = roster.tasks.get_task(TaskId::new()).await;

    ensure!(
        matches!(&duplicate, Err(RosterError::DuplicateEmail(_))),
        "second Ada should clash on email"
    );
    ensure!(
        duplicate.err().map(|err| err.status_class()) == Some(StatusClass::InvalidRequest),
        "duplicate email is an invalid request"
    );
    ensure!(
        missing.err().map(|err| err.status_class()) == Some(StatusClass::NotFound),
        "missing task is not found"
    );
    ensure!(
        roster.users.get_user(ada.id()).await.is_ok(),
        "original user should remain"
    );
    Ok(())
}
