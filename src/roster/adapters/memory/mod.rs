//! In-memory entity store.
//!
//! Suitable for tests and single-process deployments without database
//! dependencies.

mod store;
mod transaction;

pub use store::InMemoryEntityStore;
pub(crate) use transaction::InMemoryTransaction;
