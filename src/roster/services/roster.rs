//! Facade bundling both lifecycle services over one store.

use super::{
    task_lifecycle::TaskLifecycleService, transaction::TransactionOrchestrator,
    user_lifecycle::UserLifecycleService,
};
use crate::config::TransactionConfig;
use crate::roster::ports::EntityStore;
use mockable::Clock;
use std::sync::Arc;

/// Task and user lifecycle services sharing one orchestrator.
pub struct Roster<S, C>
where
    S: EntityStore,
    C: Clock + Send + Sync + 'static,
{
    /// Task operations.
    pub tasks: TaskLifecycleService<S, C>,
    /// User operations.
    pub users: UserLifecycleService<S, C>,
}

impl<S, C> Clone for Roster<S, C>
where
    S: EntityStore,
    C: Clock + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            tasks: self.tasks.clone(),
            users: self.users.clone(),
        }
    }
}

impl<S, C> Roster<S, C>
where
    S: EntityStore,
    C: Clock + Send + Sync + 'static,
{
    /// Creates both services over `store`.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<C>, config: TransactionConfig) -> Self {
        let orchestrator = TransactionOrchestrator::new(store, clock, config);
        Self {
            tasks: TaskLifecycleService::with_orchestrator(orchestrator.clone()),
            users: UserLifecycleService::with_orchestrator(orchestrator),
        }
    }
}
