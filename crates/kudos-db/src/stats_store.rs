//! Per-user engagement statistics, read as a single consistent
//! snapshot for badge evaluation and profile display.

use kudos_types::{StatsSnapshot, UserId};
use sqlx::{PgConnection, PgPool};

use crate::error::DbError;
use crate::ledger_store::parse_rank;

/// Aggregate reads across `users`, `memes`, `likes`, and `comments`.
pub struct StatsStore<'a> {
    pool: &'a PgPool,
}

impl<'a> StatsStore<'a> {
    /// Create a new stats store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A consistent snapshot of one user's engagement counters.
    ///
    /// All counters come from a single statement so they reflect one
    /// point in time. Likes received are counted across all of the
    /// user's memes, not per meme.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::RowNotFound`] if the user does not exist,
    /// or [`DbError::Postgres`] if the query fails.
    pub async fn snapshot_for(&self, user_id: UserId) -> Result<StatsSnapshot, DbError> {
        let mut conn = self.pool.acquire().await?;
        Self::snapshot_on(&mut conn, user_id).await
    }

    /// Snapshot variant on an explicit connection, for callers that
    /// need the read inside an existing transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::RowNotFound`] if the user does not exist,
    /// or [`DbError::Postgres`] if the query fails.
    pub async fn snapshot_on(
        conn: &mut PgConnection,
        user_id: UserId,
    ) -> Result<StatsSnapshot, DbError> {
        let row = sqlx::query_as::<_, SnapshotRow>(
            r"SELECT
                  u.total_points,
                  u.rank::TEXT AS rank,
                  u.login_streak,
                  (SELECT COUNT(*) FROM memes m WHERE m.owner_id = u.id) AS memes_created,
                  (SELECT COUNT(*) FROM likes l
                     JOIN memes m ON m.id = l.meme_id
                    WHERE m.owner_id = u.id) AS likes_received,
                  (SELECT COUNT(*) FROM comments c WHERE c.author_id = u.id) AS comments_made
              FROM users u
              WHERE u.id = $1",
        )
        .bind(user_id.into_inner())
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| DbError::RowNotFound(format!("user {user_id}")))?;

        Ok(StatsSnapshot {
            user_id,
            memes_created: row.memes_created,
            likes_received: row.likes_received,
            comments_made: row.comments_made,
            login_streak: row.login_streak,
            total_points: row.total_points,
            rank: parse_rank(&row.rank)?,
        })
    }
}

/// A stats aggregate row.
#[derive(Debug, Clone, sqlx::FromRow)]
struct SnapshotRow {
    total_points: i64,
    rank: String,
    login_streak: i32,
    memes_created: i64,
    likes_received: i64,
    comments_made: i64,
}
