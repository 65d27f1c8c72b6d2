//! Shared world state for task assignment BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use tasklink::config::TransactionConfig;
use tasklink::roster::{
    adapters::memory::InMemoryEntityStore,
    domain::{Task, TaskId, User, UserId},
    services::{Roster, RosterError},
};

/// Roster type used by the BDD world.
pub type TestRoster = Roster<InMemoryEntityStore, DefaultClock>;

/// Scenario world for task assignment behaviour tests.
pub struct AssignmentWorld {
    pub roster: TestRoster,
    pub users: HashMap<String, UserId>,
    pub tasks: HashMap<String, TaskId>,
    pub last_error: Option<RosterError>,
}

impl AssignmentWorld {
    /// Creates a world over an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        let roster = Roster::new(
            Arc::new(InMemoryEntityStore::new()),
            Arc::new(DefaultClock),
            TransactionConfig::default(),
        );

        Self {
            roster,
            users: HashMap::new(),
            tasks: HashMap::new(),
            last_error: None,
        }
    }

    /// Resolves a user created earlier in the scenario.
    pub fn user_id(&self, name: &str) -> Result<UserId, eyre::Report> {
        self.users
            .get(name)
            .copied()
            .ok_or_else(|| eyre::eyre!("no user named {name} in scenario world"))
    }

    /// Resolves a task created earlier in the scenario.
    pub fn task_id(&self, name: &str) -> Result<TaskId, eyre::Report> {
        self.tasks
            .get(name)
            .copied()
            .ok_or_else(|| eyre::eyre!("no task named {name} in scenario world"))
    }

    /// Reads the committed state of a named task.
    pub fn fetch_task(&self, name: &str) -> Result<Task, eyre::Report> {
        let id = self.task_id(name)?;
        Ok(run_async(self.roster.tasks.get_task(id))?)
    }

    /// Reads the committed state of a named user.
    pub fn fetch_user(&self, name: &str) -> Result<User, eyre::Report> {
        let id = self.user_id(name)?;
        Ok(run_async(self.roster.users.get_user(id))?)
    }
}

impl Default for AssignmentWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> AssignmentWorld {
    AssignmentWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
