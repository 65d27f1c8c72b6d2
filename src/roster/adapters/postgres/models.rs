//! Diesel row models for roster persistence.

use super::schema::{tasks, users};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

/// Task row, used for reads, inserts, and upserts.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct TaskRow {
    /// Task identifier.
    pub id: Uuid,
    /// Task name.
    pub name: String,
    /// Task deadline.
    pub deadline: DateTime<Utc>,
    /// Optional description.
    pub description: Option<String>,
    /// Completion flag.
    pub completed: bool,
    /// Assigned user, if any.
    pub assigned_user: Option<Uuid>,
    /// Denormalized assignee name.
    pub assigned_user_name: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// User row, used for reads, inserts, and upserts.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    /// User identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Unique email address.
    pub email: String,
    /// Ordered pending task identifiers.
    pub pending_tasks: Vec<Uuid>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
