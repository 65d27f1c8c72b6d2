//! Association invariant enforcement between tasks and users.
//!
//! These functions are the only writers of `Task::assigned_user`,
//! `Task::assigned_user_name`, and `User::pending_tasks`. They work on
//! records inside an open [`UnitOfWork`] and never commit on their own; the
//! lifecycle services compose them into whole transitions.

use super::{
    error::{RosterError, RosterResult},
    transaction::UnitOfWork,
};
use crate::roster::domain::{Task, TaskId, UNASSIGNED_USER_NAME, User, UserId};

/// Removes `task` from `user`'s pending list.
///
/// A user that does not reference the task is left untouched and nothing is
/// written.
pub(crate) fn detach_from_user(
    unit: &mut UnitOfWork<'_>,
    user: UserId,
    task: TaskId,
) -> RosterResult<()> {
    let mut record = unit.load_user(user)?;
    if record.remove_pending(task) {
        unit.save_user(&record)?;
    }
    Ok(())
}

/// Appends `task` to `user`'s pending list and returns the updated user.
///
/// Completed tasks never enter a pending list.
pub(crate) fn attach_to_user(
    unit: &mut UnitOfWork<'_>,
    user: UserId,
    task: &Task,
) -> RosterResult<User> {
    if task.is_completed() {
        return Err(RosterError::TaskAlreadyCompleted(task.id()));
    }
    let mut record = unit.load_user(user)?;
    record.push_pending(task.id());
    unit.save_user(&record)?;
    Ok(record)
}

/// Moves `task` to the end of `user`'s pending list, leaving one occurrence.
pub(crate) fn reattach_to_user(
    unit: &mut UnitOfWork<'_>,
    user: UserId,
    task: &Task,
) -> RosterResult<User> {
    if task.is_completed() {
        return Err(RosterError::TaskAlreadyCompleted(task.id()));
    }
    let mut record = unit.load_user(user)?;
    record.remove_pending(task.id());
    record.push_pending(task.id());
    unit.save_user(&record)?;
    Ok(record)
}

/// Copies the user's name onto the task, or the unassigned sentinel.
pub(crate) fn sync_assigned_name(task: &mut Task, user: Option<&User>) {
    match user {
        Some(record) => task.set_assigned_user_name(record.name().as_str()),
        None => task.set_assigned_user_name(UNASSIGNED_USER_NAME),
    }
}

/// Points the task at `user` and syncs the denormalized name.
pub(crate) fn assign(task: &mut Task, user: &User) {
    task.set_assigned_user(user.id());
    sync_assigned_name(task, Some(user));
}

/// Clears the task's assignee and resets its name to the sentinel.
pub(crate) fn release(task: &mut Task) {
    task.release();
}

/// Builds the assignment of `task_id` to `owner`, as one element of a
/// pending-list replacement.
///
/// The task is detached from any other user that still lists it, pointed
/// at `owner`, and written. The owner's own list is not touched; the caller
/// sets it verbatim.
pub(crate) fn claim_for(
    unit: &mut UnitOfWork<'_>,
    owner: &User,
    task_id: TaskId,
) -> RosterResult<()> {
    let mut task = unit.load_task(task_id)?;
    if task.is_completed() {
        return Err(RosterError::TaskAlreadyCompleted(task_id));
    }
    if let Some(previous) = task.assigned_user().filter(|previous| *previous != owner.id()) {
        detach_from_user(unit, previous, task_id)?;
    }
    assign(&mut task, owner);
    unit.save_task(&task)
}

/// Replaces `owner`'s pending list with `pending_tasks`.
///
/// Every task on the old list is released and written, then every task on
/// the new list is claimed and written, so a task on both lists is written
/// twice. Order and duplicates are kept. The owner is updated in place and
/// left for the caller to save.
pub(crate) fn replace_pending_list(
    unit: &mut UnitOfWork<'_>,
    owner: &mut User,
    pending_tasks: Vec<TaskId>,
) -> RosterResult<()> {
    for task_id in owner.replace_pending(Vec::new()) {
        let mut task = unit.load_task(task_id)?;
        if task.is_completed() {
            return Err(RosterError::TaskAlreadyCompleted(task_id));
        }
        release(&mut task);
        unit.save_task(&task)?;
    }
    for task_id in &pending_tasks {
        claim_for(unit, owner, *task_id)?;
    }
    owner.replace_pending(pending_tasks);
    Ok(())
}
