//! Entity store adapters for the roster module.
//!
//! # Available Adapters
//!
//! - [`memory::InMemoryEntityStore`]: Thread-safe in-memory storage with
//!   optimistic, version-checked transactions
//! - [`postgres::PostgresEntityStore`]: `PostgreSQL` persistence using Diesel
//!   with `SERIALIZABLE` transactions

pub mod memory;
pub mod postgres;
