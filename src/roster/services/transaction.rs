//! Transaction orchestration: one atomic unit of work per lifecycle call.

use super::error::{AbortCause, RosterError, RosterResult};
use crate::config::TransactionConfig;
use crate::roster::{
    domain::{EmailAddress, Task, TaskId, User, UserId},
    ports::{EntityStore, StoreTransaction, TransactionGrant},
};
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline {
    expires_at: DateTime<Utc>,
    budget: Duration,
}

impl Deadline {
    pub(crate) fn starting_at(started_at: DateTime<Utc>, budget: Duration) -> Option<Self> {
        let delta = TimeDelta::from_std(budget).unwrap_or(TimeDelta::MAX);
        started_at
            .checked_add_signed(delta)
            .map(|expires_at| Self { expires_at, budget })
    }
}

/// Context handle for one open unit of work.
///
/// Every store access first checks the unit's deadline, so a unit that runs
/// too long aborts at its next read or write and the whole transaction rolls
/// back. Missing records surface as the matching not-found error. Writes are
/// crate-internal so that only the association rules touch cross-references.
pub(crate) struct UnitOfWork<'tx> {
    tx: &'tx mut dyn StoreTransaction,
    clock: &'tx dyn Clock,
    deadline: Option<Deadline>,
    writes: usize,
}

impl<'tx> UnitOfWork<'tx> {
    pub(crate) fn new(
        tx: &'tx mut dyn StoreTransaction,
        clock: &'tx dyn Clock,
        deadline: Option<Deadline>,
    ) -> Self {
        Self {
            tx,
            clock,
            deadline,
            writes: 0,
        }
    }

    /// Fails once the unit of work has outlived its deadline.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::TransactionAborted`] with
    /// [`AbortCause::DeadlineExceeded`] after the deadline.
    pub fn ensure_active(&self) -> RosterResult<()> {
        match self.deadline {
            Some(deadline) if self.clock.utc() > deadline.expires_at => Err(
                RosterError::TransactionAborted(AbortCause::DeadlineExceeded(deadline.budget)),
            ),
            _ => Ok(()),
        }
    }

    /// Number of records written or removed so far.
    #[must_use]
    pub const fn writes(&self) -> usize {
        self.writes
    }

    /// Loads a task.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::TaskNotFound`] when the task does not exist.
    pub fn load_task(&mut self, id: TaskId) -> RosterResult<Task> {
        self.ensure_active()?;
        self.tx.get_task(id)?.ok_or(RosterError::TaskNotFound(id))
    }

    /// Loads a user.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::UserNotFound`] when the user does not exist.
    pub fn load_user(&mut self, id: UserId) -> RosterResult<User> {
        self.ensure_active()?;
        self.tx.get_user(id)?.ok_or(RosterError::UserNotFound(id))
    }

    /// Finds the user holding `email`.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::TransactionAborted`] on store failure.
    pub fn find_user_by_email(&mut self, email: &EmailAddress) -> RosterResult<Option<User>> {
        self.ensure_active()?;
        Ok(self.tx.find_user_by_email(email)?)
    }

    /// Returns every task assigned to `user`.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::TransactionAborted`] on store failure.
    pub fn tasks_assigned_to(&mut self, user: UserId) -> RosterResult<Vec<Task>> {
        self.ensure_active()?;
        Ok(self.tx.find_tasks_by_assignee(user)?)
    }

    /// Writes a task.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::TransactionAborted`] on store failure.
    pub(crate) fn save_task(&mut self, task: &Task) -> RosterResult<()> {
        self.ensure_active()?;
        self.tx.put_task(task)?;
        self.writes += 1;
        Ok(())
    }

    /// Writes a user.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::DuplicateEmail`] when the store's uniqueness
    /// constraint rejects the email, or [`RosterError::TransactionAborted`]
    /// on store failure.
    pub(crate) fn save_user(&mut self, user: &User) -> RosterResult<()> {
        self.ensure_active()?;
        self.tx.put_user(user)?;
        self.writes += 1;
        Ok(())
    }

    /// Removes a task.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::TransactionAborted`] on store failure.
    pub(crate) fn remove_task(&mut self, id: TaskId) -> RosterResult<()> {
        self.ensure_active()?;
        self.tx.delete_task(id)?;
        self.writes += 1;
        Ok(())
    }

    /// Removes a user.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::TransactionAborted`] on store failure.
    pub(crate) fn remove_user(&mut self, id: UserId) -> RosterResult<()> {
        self.ensure_active()?;
        self.tx.delete_user(id)?;
        self.writes += 1;
        Ok(())
    }
}

/// Runs units of work atomically against an [`EntityStore`].
///
/// Each lifecycle operation makes exactly one atomic run; units of work
/// never nest. Sharing one orchestrator lets several services use the same
/// store, clock, and deadline settings.
///
/// Units of work are run by the lifecycle services only:
///
/// ```compile_fail
/// use std::sync::Arc;
///
/// use mockable::DefaultClock;
/// use tasklink::config::TransactionConfig;
/// use tasklink::roster::{
///     adapters::memory::InMemoryEntityStore, services::TransactionOrchestrator,
/// };
///
/// let orchestrator = TransactionOrchestrator::new(
///     Arc::new(InMemoryEntityStore::new()),
///     Arc::new(DefaultClock),
///     TransactionConfig::default(),
/// );
/// let _pending = orchestrator.run_atomic("detached", |_unit| Ok(()));
/// ```
pub struct TransactionOrchestrator<S, C>
where
    S: EntityStore,
    C: Clock + Send + Sync + 'static,
{
    store: Arc<S>,
    clock: Arc<C>,
    config: TransactionConfig,
}

impl<S, C> Clone for TransactionOrchestrator<S, C>
where
    S: EntityStore,
    C: Clock + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            config: self.config,
        }
    }
}

impl<S, C> TransactionOrchestrator<S, C>
where
    S: EntityStore,
    C: Clock + Send + Sync + 'static,
{
    /// Creates an orchestrator over the given store and clock.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>, config: TransactionConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Returns the underlying store for committed-state reads.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the clock shared with units of work.
    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Executes `work` in one transaction.
    ///
    /// All writes become visible together when `work` succeeds. When `work`
    /// fails, runs past its deadline, or the commit is rejected, no write is
    /// kept.
    ///
    /// # Errors
    ///
    /// Returns the domain error raised by `work` unchanged, or
    /// [`RosterError::TransactionAborted`] for store failures and deadline
    /// expiry.
    pub(crate) async fn run_atomic<T, F>(&self, operation: &'static str, work: F) -> RosterResult<T>
    where
        F: FnOnce(&mut UnitOfWork<'_>) -> RosterResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let clock = Arc::clone(&self.clock);
        let deadline = self
            .config
            .timeout
            .and_then(|budget| Deadline::starting_at(clock.utc(), budget));

        debug!(operation, "beginning unit of work");
        let outcome = self
            .store
            .with_transaction(TransactionGrant::issue(), move |tx| {
                let mut unit = UnitOfWork::new(tx, &*clock, deadline);
                let value = work(&mut unit)?;
                unit.ensure_active()?;
                Ok::<_, RosterError>((value, unit.writes()))
            })
            .await;

        match outcome {
            Ok((value, writes)) => {
                debug!(operation, writes, "unit of work committed");
                Ok(value)
            }
            Err(err) => {
                warn!(operation, error = %err, "unit of work rolled back");
                Err(err)
            }
        }
    }
}
