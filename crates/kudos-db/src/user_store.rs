//! User persistence: registration and profile reads.

use kudos_types::{User, UserId};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::convert::rank_to_db;
use crate::error::{DbError, is_unique_violation};
use crate::ledger_store::parse_rank;

/// Operations on the `users` table.
pub struct UserStore<'a> {
    pool: &'a PgPool,
}

impl<'a> UserStore<'a> {
    /// Create a new user store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new user. Registration starts at zero points with the
    /// lowest rank and no login history.
    ///
    /// Returns `Ok(false)` when the username is already taken; the
    /// unique constraint on `users.username` settles racing
    /// registrations.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails for any
    /// reason other than a duplicate username.
    pub async fn insert(conn: &mut PgConnection, user: &User) -> Result<bool, DbError> {
        let result = sqlx::query(
            r"INSERT INTO users (id, username, total_points, rank, login_streak, last_login_day, created_at)
              VALUES ($1, $2, $3, $4::user_rank, $5, $6, $7)",
        )
        .bind(user.id.into_inner())
        .bind(&user.username)
        .bind(user.total_points)
        .bind(rank_to_db(user.rank))
        .bind(user.login_streak)
        .bind(user.last_login_day)
        .bind(user.created_at)
        .execute(conn)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(ref err) if is_unique_violation(err) => Ok(false),
            Err(err) => Err(DbError::Postgres(err)),
        }
    }

    /// Fetch a user by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::RowNotFound`] if no such user exists, or
    /// [`DbError::Postgres`] if the query fails.
    pub async fn fetch(&self, user_id: UserId) -> Result<User, DbError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"SELECT id, username, total_points, rank::TEXT AS rank, login_streak, last_login_day, created_at
              FROM users
              WHERE id = $1",
        )
        .bind(user_id.into_inner())
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::RowNotFound(format!("user {user_id}")))?;

        row.into_user()
    }

    /// Fetch a user by username.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::RowNotFound`] if no such user exists, or
    /// [`DbError::Postgres`] if the query fails.
    pub async fn fetch_by_username(&self, username: &str) -> Result<User, DbError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"SELECT id, username, total_points, rank::TEXT AS rank, login_streak, last_login_day, created_at
              FROM users
              WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::RowNotFound(format!("user {username}")))?;

        row.into_user()
    }
}

/// A row from the `users` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    total_points: i64,
    rank: String,
    login_streak: i32,
    last_login_day: Option<chrono::NaiveDate>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<User, DbError> {
        Ok(User {
            id: UserId::from(self.id),
            username: self.username,
            total_points: self.total_points,
            rank: parse_rank(&self.rank)?,
            login_streak: self.login_streak,
            last_login_day: self.last_login_day,
            created_at: self.created_at,
        })
    }
}
