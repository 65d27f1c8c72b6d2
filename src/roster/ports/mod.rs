//! Port contracts for roster persistence.
//!
//! Ports define infrastructure-agnostic interfaces used by roster services.

pub mod store;

#[cfg(test)]
pub use store::MockStoreTransaction;
pub(crate) use store::TransactionGrant;
pub use store::{
    AssigneeFilter, EntityStore, ListWindow, StoreError, StoreResult, StoreTransaction, TaskFilter,
};
