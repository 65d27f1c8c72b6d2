//! `PostgreSQL` adapter for roster persistence.

mod models;
mod schema;
mod store;

pub use store::{PostgresEntityStore, RosterPgPool};
