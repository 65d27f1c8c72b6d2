//! Task and user roster with bidirectional assignment consistency.
//!
//! A task may be assigned to at most one user, and each user holds the list
//! of tasks currently pending for them. Every mutation that touches either
//! side of that relation runs as one atomic unit of work, so committed state
//! always satisfies the mutual-reference invariants. The module follows
//! hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Entity store contracts in [`ports`]
//! - Store implementations in [`adapters`]
//! - Lifecycle orchestration in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
