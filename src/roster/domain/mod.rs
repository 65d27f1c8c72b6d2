//! Domain model for the task and user roster.
//!
//! Aggregates expose their assignment cross-references read-only. Only the
//! association services inside [`crate::roster`] can rewrite them, which
//! keeps every writer of `assigned_user` and `pending_tasks` behind one
//! module boundary.

mod error;
mod ids;
mod task;
mod user;
mod values;

pub use error::RosterDomainError;
pub use ids::{TaskId, UserId};
pub use task::{NewTask, Task, UNASSIGNED_USER_NAME};
pub use user::{NewUser, User};
pub use values::{EmailAddress, MAX_FIELD_CHARS, TaskName, UserName};

pub(crate) use task::PersistedTaskData;
pub(crate) use user::PersistedUserData;
