//! Diesel schema for roster persistence.

diesel::table! {
    /// Task records.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Task name.
        #[max_length = 255]
        name -> Varchar,
        /// Task deadline.
        deadline -> Timestamptz,
        /// Optional description.
        description -> Nullable<Text>,
        /// Completion flag.
        completed -> Bool,
        /// Assigned user, null when unassigned.
        assigned_user -> Nullable<Uuid>,
        /// Denormalized assignee name.
        assigned_user_name -> Text,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// User records.
    users (id) {
        /// User identifier.
        id -> Uuid,
        /// Display name.
        #[max_length = 255]
        name -> Varchar,
        /// Unique email address.
        #[max_length = 255]
        email -> Varchar,
        /// Ordered pending task identifiers.
        pending_tasks -> Array<Uuid>,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(tasks, users);
