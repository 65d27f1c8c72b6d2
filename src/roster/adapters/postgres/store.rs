//! `PostgreSQL` entity store implementation.

use super::{
    models::{TaskRow, UserRow},
    schema::{tasks, users},
};
use crate::config::DatabaseConfig;
use crate::roster::{
    domain::{
        EmailAddress, PersistedTaskData, PersistedUserData, Task, TaskId, TaskName, User, UserId,
        UserName,
    },
    ports::{
        AssigneeFilter, EntityStore, ListWindow, StoreError, StoreResult, StoreTransaction,
        TaskFilter, TransactionGrant,
    },
};
use async_trait::async_trait;
use diesel::dsl::count_star;
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by the roster store.
pub type RosterPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed entity store.
///
/// Units of work run inside `SERIALIZABLE` transactions on the blocking
/// thread pool. Serialization failures surface as [`StoreError::Conflict`]
/// and are not retried here.
#[derive(Debug, Clone)]
pub struct PostgresEntityStore {
    pool: RosterPgPool,
}

impl PostgresEntityStore {
    /// Creates a store from an existing connection pool.
    #[must_use]
    pub const fn new(pool: RosterPgPool) -> Self {
        Self { pool }
    }

    /// Builds a connection pool from `config` and checks connectivity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when the pool cannot establish
    /// its connections.
    pub fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(config.url.as_str());
        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .build(manager)
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        Ok(Self::new(pool))
    }

    async fn run_blocking<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool
                .get()
                .map_err(|err| StoreError::Unavailable(err.to_string()))?;
            f(&mut connection)
        })
        .await
        .map_err(|err| StoreError::Unavailable(format!("task join error: {err}")))?
    }
}

/// Failure of a Diesel-managed transaction: either the unit of work's own
/// error or a database error raised by `BEGIN`/`COMMIT`.
enum TransactionFailure<E> {
    Work(E),
    Database(DieselError),
}

impl<E> From<DieselError> for TransactionFailure<E> {
    fn from(err: DieselError) -> Self {
        Self::Database(err)
    }
}

#[async_trait]
impl EntityStore for PostgresEntityStore {
    async fn with_transaction<T, E, F>(&self, _grant: TransactionGrant, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTransaction) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
    {
        let pool = self.pool.clone();
        let joined = tokio::task::spawn_blocking(move || -> Result<T, E> {
            let mut connection = pool
                .get()
                .map_err(|err| E::from(StoreError::Unavailable(err.to_string())))?;
            connection
                .build_transaction()
                .serializable()
                .run::<T, TransactionFailure<E>, _>(|conn| {
                    let mut transaction = PgStoreTransaction { conn };
                    work(&mut transaction).map_err(TransactionFailure::Work)
                })
                .map_err(|failure| match failure {
                    TransactionFailure::Work(err) => err,
                    TransactionFailure::Database(err) => E::from(map_diesel_error(err)),
                })
        })
        .await;

        joined.map_err(|err| E::from(StoreError::Unavailable(format!("task join error: {err}"))))?
    }

    async fn find_task(&self, id: TaskId) -> StoreResult<Option<Task>> {
        self.run_blocking(move |connection| load_task(connection, id)).await
    }

    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
        self.run_blocking(move |connection| load_user(connection, id)).await
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
        let task_filter = *filter;
        self.run_blocking(move |connection| {
            let query = tasks::table.select(TaskRow::as_select()).into_boxed();
            let mut windowed = apply_task_filter(query, &task_filter)
                .order((tasks::created_at.asc(), tasks::id.asc()))
                .offset(to_sql_count(task_filter.window.skip));
            if let Some(limit) = task_filter.window.limit {
                windowed = windowed.limit(to_sql_count(limit));
            }
            let rows = windowed
                .load::<TaskRow>(connection)
                .map_err(map_diesel_error)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn count_tasks(&self, filter: &TaskFilter) -> StoreResult<usize> {
        let task_filter = *filter;
        self.run_blocking(move |connection| {
            let query = tasks::table.select(count_star()).into_boxed();
            let count = apply_task_filter(query, &task_filter)
                .get_result::<i64>(connection)
                .map_err(map_diesel_error)?;
            usize::try_from(count).map_err(|err| StoreError::Corrupt(err.to_string()))
        })
        .await
    }

    async fn list_users(&self, window: &ListWindow) -> StoreResult<Vec<User>> {
        let user_window = *window;
        self.run_blocking(move |connection| {
            let mut query = users::table
                .select(UserRow::as_select())
                .into_boxed()
                .order((users::created_at.asc(), users::id.asc()))
                .offset(to_sql_count(user_window.skip));
            if let Some(limit) = user_window.limit {
                query = query.limit(to_sql_count(limit));
            }
            let rows = query.load::<UserRow>(connection).map_err(map_diesel_error)?;
            rows.into_iter().map(row_to_user).collect()
        })
        .await
    }
}

/// Store transaction bound to a connection inside an open `SERIALIZABLE`
/// transaction.
struct PgStoreTransaction<'conn> {
    conn: &'conn mut PgConnection,
}

impl StoreTransaction for PgStoreTransaction<'_> {
    fn get_task(&mut self, id: TaskId) -> StoreResult<Option<Task>> {
        load_task(self.conn, id)
    }

    fn get_user(&mut self, id: UserId) -> StoreResult<Option<User>> {
        load_user(self.conn, id)
    }

    fn put_task(&mut self, task: &Task) -> StoreResult<()> {
        let row = task_to_row(task);
        diesel::insert_into(tasks::table)
            .values(&row)
            .on_conflict(tasks::id)
            .do_update()
            .set(&row)
            .execute(self.conn)
            .map_err(map_diesel_error)?;
        Ok(())
    }

    fn put_user(&mut self, user: &User) -> StoreResult<()> {
        let row = user_to_row(user);
        diesel::insert_into(users::table)
            .values(&row)
            .on_conflict(users::id)
            .do_update()
            .set(&row)
            .execute(self.conn)
            .map_err(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    StoreError::DuplicateEmail(user.email().clone())
                }
                other => map_diesel_error(other),
            })?;
        Ok(())
    }

    fn delete_task(&mut self, id: TaskId) -> StoreResult<()> {
        diesel::delete(tasks::table.find(id.into_inner()))
            .execute(self.conn)
            .map_err(map_diesel_error)?;
        Ok(())
    }

    fn delete_user(&mut self, id: UserId) -> StoreResult<()> {
        diesel::delete(users::table.find(id.into_inner()))
            .execute(self.conn)
            .map_err(map_diesel_error)?;
        Ok(())
    }

    fn find_user_by_email(&mut self, email: &EmailAddress) -> StoreResult<Option<User>> {
        let row = users::table
            .filter(users::email.eq(email.as_str()))
            .select(UserRow::as_select())
            .first::<UserRow>(self.conn)
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_user).transpose()
    }

    fn find_tasks_by_assignee(&mut self, user: UserId) -> StoreResult<Vec<Task>> {
        let rows = tasks::table
            .filter(tasks::assigned_user.eq(user.into_inner()))
            .order((tasks::created_at.asc(), tasks::id.asc()))
            .select(TaskRow::as_select())
            .load::<TaskRow>(self.conn)
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_task).collect()
    }
}

fn load_task(connection: &mut PgConnection, id: TaskId) -> StoreResult<Option<Task>> {
    let row = tasks::table
        .find(id.into_inner())
        .select(TaskRow::as_select())
        .first::<TaskRow>(connection)
        .optional()
        .map_err(map_diesel_error)?;
    row.map(row_to_task).transpose()
}

fn load_user(connection: &mut PgConnection, id: UserId) -> StoreResult<Option<User>> {
    let row = users::table
        .find(id.into_inner())
        .select(UserRow::as_select())
        .first::<UserRow>(connection)
        .optional()
        .map_err(map_diesel_error)?;
    row.map(row_to_user).transpose()
}

fn apply_task_filter<'a, ST>(
    query: tasks::BoxedQuery<'a, Pg, ST>,
    filter: &TaskFilter,
) -> tasks::BoxedQuery<'a, Pg, ST> {
    let by_completion = match filter.completed {
        Some(completed) => query.filter(tasks::completed.eq(completed)),
        None => query,
    };
    match filter.assignee {
        AssigneeFilter::Any => by_completion,
        AssigneeFilter::Unassigned => by_completion.filter(tasks::assigned_user.is_null()),
        AssigneeFilter::User(user) => {
            by_completion.filter(tasks::assigned_user.eq(user.into_inner()))
        }
    }
}

fn to_sql_count(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn map_diesel_error(err: DieselError) -> StoreError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, ref info) => {
            StoreError::Conflict(info.message().to_owned())
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, ref info) => {
            StoreError::Unavailable(info.message().to_owned())
        }
        other => StoreError::persistence(other),
    }
}

pub(super) fn task_to_row(task: &Task) -> TaskRow {
    TaskRow {
        id: task.id().into_inner(),
        name: task.name().as_str().to_owned(),
        deadline: task.deadline(),
        description: task.description().map(str::to_owned),
        completed: task.is_completed(),
        assigned_user: task.assigned_user().map(UserId::into_inner),
        assigned_user_name: task.assigned_user_name().to_owned(),
        created_at: task.created_at(),
    }
}

pub(super) fn row_to_task(row: TaskRow) -> StoreResult<Task> {
    let TaskRow {
        id,
        name,
        deadline,
        description,
        completed,
        assigned_user,
        assigned_user_name,
        created_at,
    } = row;

    let task_name =
        TaskName::new(name).map_err(|err| StoreError::Corrupt(format!("task {id}: {err}")))?;

    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(id),
        name: task_name,
        deadline,
        description,
        completed,
        assigned_user: assigned_user.map(UserId::from_uuid),
        assigned_user_name,
        created_at,
    }))
}

pub(super) fn user_to_row(user: &User) -> UserRow {
    UserRow {
        id: user.id().into_inner(),
        name: user.name().as_str().to_owned(),
        email: user.email().as_str().to_owned(),
        pending_tasks: user
            .pending_tasks()
            .iter()
            .copied()
            .map(TaskId::into_inner)
            .collect(),
        created_at: user.created_at(),
    }
}

pub(super) fn row_to_user(row: UserRow) -> StoreResult<User> {
    let UserRow {
        id,
        name,
        email,
        pending_tasks,
        created_at,
    } = row;

    let user_name =
        UserName::new(name).map_err(|err| StoreError::Corrupt(format!("user {id}: {err}")))?;
    let address =
        EmailAddress::new(email).map_err(|err| StoreError::Corrupt(format!("user {id}: {err}")))?;

    Ok(User::from_persisted(PersistedUserData {
        id: UserId::from_uuid(id),
        name: user_name,
        email: address,
        pending_tasks: pending_tasks.into_iter().map(TaskId::from_uuid).collect(),
        created_at,
    }))
}
