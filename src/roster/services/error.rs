//! Error taxonomy for roster lifecycle operations.

use crate::roster::{
    domain::{EmailAddress, RosterDomainError, TaskId, UserId},
    ports::StoreError,
};
use std::time::Duration;
use thiserror::Error;

/// Reason a unit of work was aborted by the infrastructure rather than by a
/// domain rule.
#[derive(Debug, Clone, Error)]
pub enum AbortCause {
    /// The entity store failed or detected a conflicting transaction.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The unit of work outlived its configured deadline.
    #[error("unit of work exceeded its {0:?} deadline")]
    DeadlineExceeded(Duration),
}

/// Service-level errors for roster lifecycle operations.
#[derive(Debug, Clone, Error)]
pub enum RosterError {
    /// No task exists with the given identifier.
    #[error("task {0} not found")]
    TaskNotFound(TaskId),

    /// No user exists with the given identifier.
    #[error("user {0} not found")]
    UserNotFound(UserId),

    /// The task being updated is already completed and frozen.
    #[error("task {0} is already completed")]
    AlreadyCompleted(TaskId),

    /// A task named in a pending list is already completed.
    #[error("task {0} to assign is already completed")]
    TaskAlreadyCompleted(TaskId),

    /// Another user already holds the email address.
    #[error("email {0} already exists")]
    DuplicateEmail(EmailAddress),

    /// Field validation failed.
    #[error(transparent)]
    Validation(#[from] RosterDomainError),

    /// The transaction was aborted by the store or by its deadline.
    #[error("transaction aborted: {0}")]
    TransactionAborted(#[source] AbortCause),
}

/// Result type for roster lifecycle operations.
pub type RosterResult<T> = Result<T, RosterError>;

/// Coarse outcome class used by transport layers to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// The addressed record does not exist.
    NotFound,
    /// The request conflicts with validation or lifecycle rules.
    InvalidRequest,
    /// The store failed or aborted the transaction.
    Internal,
}

impl RosterError {
    /// Returns the stable status class for this error.
    #[must_use]
    pub const fn status_class(&self) -> StatusClass {
        match self {
            Self::TaskNotFound(_) | Self::UserNotFound(_) => StatusClass::NotFound,
            Self::AlreadyCompleted(_)
            | Self::TaskAlreadyCompleted(_)
            | Self::DuplicateEmail(_)
            | Self::Validation(_) => StatusClass::InvalidRequest,
            Self::TransactionAborted(_) => StatusClass::Internal,
        }
    }

    /// Returns whether retrying the whole operation may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TransactionAborted(AbortCause::Store(StoreError::Conflict(_)))
        )
    }
}

impl From<StoreError> for RosterError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail(email) => Self::DuplicateEmail(email),
            other => Self::TransactionAborted(AbortCause::Store(other)),
        }
    }
}
