//! Tasklink: a task and user roster with consistent, transactional
//! assignment tracking.
//!
//! Every task records the user it is assigned to, and every user records
//! the open tasks assigned to them. The roster services keep both sides in
//! agreement by performing each mutation as one atomic unit of work against
//! an [`EntityStore`](roster::ports::EntityStore).
//!
//! # Architecture
//!
//! Tasklink follows hexagonal architecture principles:
//!
//! - **Domain**: Tasks, users, and their validated value types
//! - **Ports**: The transactional entity store interface
//! - **Adapters**: In-memory and `PostgreSQL` store implementations
//! - **Services**: Task and user lifecycles plus the association rules
//!
//! # Modules
//!
//! - [`config`]: Environment-driven engine configuration
//! - [`roster`]: Task and user management

pub mod config;
pub mod roster;
