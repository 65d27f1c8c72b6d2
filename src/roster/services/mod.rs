//! Application services for roster lifecycle orchestration.

pub(crate) mod association;
mod error;
mod roster;
mod task_lifecycle;
mod transaction;
mod user_lifecycle;

pub use error::{AbortCause, RosterError, RosterResult, StatusClass};
pub use roster::Roster;
pub use task_lifecycle::{CreateTaskRequest, TaskLifecycleService, UpdateTaskRequest};
pub use transaction::TransactionOrchestrator;
pub(crate) use transaction::UnitOfWork;
pub use user_lifecycle::{CreateUserRequest, UpdateUserRequest, UserLifecycleService};
