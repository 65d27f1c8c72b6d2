//! Property tests: random operation sequences never break the
//! mutual-reference invariants of committed state.

use super::helpers::{TestRoster, check_invariants, create_task, create_user, roster, snapshot};
use proptest::prelude::*;
use tasklink::roster::{
    domain::{TaskId, UserId},
    services::{CreateUserRequest, UpdateTaskRequest, UpdateUserRequest},
};

#[derive(Clone, Debug)]
enum Op {
    CreateUser { pending: Vec<usize> },
    CreateTask { assignee: Option<usize> },
    Assign { task: usize, user: Option<usize> },
    SetCompleted { task: usize, completed: bool },
    ReplacePending { user: usize, tasks: Vec<usize> },
    RenameUser { user: usize },
    DeleteTask { task: usize },
    DeleteUser { user: usize },
}

fn arb_op() -> impl Strategy<Value = Op> {
    let index = 0..8_usize;
    prop_oneof![
        prop::collection::vec(index.clone(), 0..3).prop_map(|pending| Op::CreateUser { pending }),
        prop::option::of(index.clone()).prop_map(|assignee| Op::CreateTask { assignee }),
        (index.clone(), prop::option::of(index.clone()))
            .prop_map(|(task, user)| Op::Assign { task, user }),
        (index.clone(), any::<bool>())
            .prop_map(|(task, completed)| Op::SetCompleted { task, completed }),
        (index.clone(), prop::collection::vec(index.clone(), 0..4))
            .prop_map(|(user, tasks)| Op::ReplacePending { user, tasks }),
        index.clone().prop_map(|user| Op::RenameUser { user }),
        index.clone().prop_map(|task| Op::DeleteTask { task }),
        index.prop_map(|user| Op::DeleteUser { user }),
    ]
}

/// Every identifier ever created, so operations may also target deleted
/// records and exercise the not-found paths.
#[derive(Default)]
struct Known {
    users: Vec<UserId>,
    tasks: Vec<TaskId>,
}

impl Known {
    fn user(&self, index: usize) -> Option<UserId> {
        index
            .checked_rem(self.users.len())
            .and_then(|slot| self.users.get(slot).copied())
    }

    fn task(&self, index: usize) -> Option<TaskId> {
        index
            .checked_rem(self.tasks.len())
            .and_then(|slot| self.tasks.get(slot).copied())
    }

    fn tasks(&self, indices: &[usize]) -> Vec<TaskId> {
        indices.iter().filter_map(|index| self.task(*index)).collect()
    }
}

/// Applies one operation and reports whether it committed. A rejected
/// operation must leave the committed state as consistent as a successful
/// one.
async fn apply(roster: &TestRoster, known: &mut Known, op: &Op, step: usize) -> bool {
    match op {
        Op::CreateUser { pending } => {
            let request = CreateUserRequest::new(
                format!("User {step}"),
                format!("user{step}@example.com"),
            )
            .with_pending_tasks(known.tasks(pending));
            match roster.users.create_user(request).await {
                Ok(user) => {
                    known.users.push(user.id());
                    true
                }
                Err(_) => false,
            }
        }
        Op::CreateTask { assignee } => {
            let user = assignee.and_then(|index| known.user(index));
            match create_task(roster, &format!("Task {step}"), user).await {
                Ok(task) => {
                    known.tasks.push(task.id());
                    true
                }
                Err(_) => false,
            }
        }
        Op::Assign { task, user } => {
            let Some(task_id) = known.task(*task) else {
                return false;
            };
            let request = match user.and_then(|index| known.user(index)) {
                Some(user_id) => UpdateTaskRequest::new(task_id).assign_to(user_id),
                None => UpdateTaskRequest::new(task_id).unassign(),
            };
            roster.tasks.update_task(request).await.is_ok()
        }
        Op::SetCompleted { task, completed } => {
            let Some(task_id) = known.task(*task) else {
                return false;
            };
            let request = UpdateTaskRequest::new(task_id).with_completed(*completed);
            roster.tasks.update_task(request).await.is_ok()
        }
        Op::ReplacePending { user, tasks } => {
            let Some(user_id) = known.user(*user) else {
                return false;
            };
            let request = UpdateUserRequest::new(user_id).with_pending_tasks(known.tasks(tasks));
            roster.users.update_user(request).await.is_ok()
        }
        Op::RenameUser { user } => {
            let Some(user_id) = known.user(*user) else {
                return false;
            };
            let request = UpdateUserRequest::new(user_id).with_name(format!("Renamed {step}"));
            roster.users.update_user(request).await.is_ok()
        }
        Op::DeleteTask { task } => match known.task(*task) {
            Some(task_id) => roster.tasks.delete_task(task_id).await.is_ok(),
            None => false,
        },
        Op::DeleteUser { user } => match known.user(*user) {
            Some(user_id) => roster.users.delete_user(user_id).await.is_ok(),
            None => false,
        },
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn committed_state_always_satisfies_invariants(
        ops in prop::collection::vec(arb_op(), 1..40)
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| TestCaseError::fail(err.to_string()))?;

        let outcome: Result<(), String> = runtime.block_on(async {
            let roster = roster();
            let mut known = Known::default();
            create_user(&roster, "Seed")
                .await
                .map(|user| known.users.push(user.id()))
                .map_err(|err| err.to_string())?;

            for (step, op) in ops.iter().enumerate() {
                let committed = apply(&roster, &mut known, op, step).await;
                let (tasks, users) = snapshot(&roster).await.map_err(|err| err.to_string())?;
                check_invariants(&tasks, &users).map_err(|violation| {
                    format!("after {op:?} (committed: {committed}) at step {step}: {violation}")
                })?;
            }
            Ok::<(), String>(())
        });

        prop_assert!(outcome.is_ok(), "{}", outcome.err().unwrap_or_default());
    }
}
