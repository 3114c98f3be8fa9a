//! Leaderboard and trending reads.
//!
//! The leaderboard is computed directly from `users` under the
//! `users_leaderboard_idx` ordering. Trending has two paths: a live
//! query over recent likes and comments, and a materialized
//! `trending_scores` table rebuilt on a schedule for cheap reads.

use chrono::{DateTime, Utc};
use kudos_types::{LeaderboardEntry, MemeId, TrendingScore, UserId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbError;
use crate::ledger_store::parse_rank;

/// Weight of one like in a trending score.
const LIKE_WEIGHT: i64 = 1;
/// Weight of one comment in a trending score.
const COMMENT_WEIGHT: i64 = 2;

/// Read operations for leaderboards and trending memes.
pub struct RankingsStore<'a> {
    pool: &'a PgPool,
}

impl<'a> RankingsStore<'a> {
    /// Create a new rankings store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A page of the leaderboard: points descending, earlier account
    /// wins ties, id as the final stable tiebreak. Positions are
    /// absolute (offset-based), starting at 1.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn top_by_points(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LeaderboardEntry>, DbError> {
        let rows = sqlx::query_as::<_, LeaderboardRow>(
            r"SELECT id, username, total_points, rank::TEXT AS rank
              FROM users
              ORDER BY total_points DESC, created_at ASC, id ASC
              LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .enumerate()
            .map(|(i, row)| {
                let position = offset
                    .saturating_add(i64::try_from(i).unwrap_or(i64::MAX))
                    .saturating_add(1);
                Ok(LeaderboardEntry {
                    position,
                    user_id: UserId::from(row.id),
                    username: row.username,
                    total_points: row.total_points,
                    rank: parse_rank(&row.rank)?,
                })
            })
            .collect()
    }

    /// Trending scores computed live from likes and comments strictly
    /// newer than `cutoff` (an interaction exactly at the cutoff has
    /// aged out, matching the pure window model). Memes with no
    /// interactions in the window are absent rather than listed at
    /// zero.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn trending_live(
        &self,
        cutoff: DateTime<Utc>,
        window_hours: i64,
        limit: i64,
    ) -> Result<Vec<TrendingScore>, DbError> {
        let computed_at = Utc::now();
        let rows = sqlx::query_as::<_, ScoreRow>(
            r"SELECT meme_id, SUM(weight)::BIGINT AS score
              FROM (
                  SELECT meme_id, $2::BIGINT AS weight FROM likes WHERE created_at > $1
                  UNION ALL
                  SELECT meme_id, $3::BIGINT AS weight FROM comments WHERE created_at > $1
              ) interactions
              GROUP BY meme_id
              ORDER BY score DESC, meme_id ASC
              LIMIT $4",
        )
        .bind(cutoff)
        .bind(LIKE_WEIGHT)
        .bind(COMMENT_WEIGHT)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| TrendingScore {
                meme_id: MemeId::from(row.meme_id),
                score: row.score,
                window_hours,
                computed_at,
            })
            .collect())
    }

    /// Rebuild the materialized `trending_scores` table for the given
    /// window. Delete and repopulate happen in one transaction so
    /// readers see either the old view or the new one, never a mix.
    ///
    /// Returns the number of memes scored.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the rebuild fails.
    pub async fn rebuild_trending(
        &self,
        cutoff: DateTime<Utc>,
        window_hours: i64,
    ) -> Result<u64, DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(r"DELETE FROM trending_scores")
            .execute(&mut *tx)
            .await?;

        let inserted = sqlx::query(
            r"INSERT INTO trending_scores (meme_id, score, window_hours, computed_at)
              SELECT meme_id, SUM(weight)::BIGINT, $4, now()
              FROM (
                  SELECT meme_id, $2::BIGINT AS weight FROM likes WHERE created_at > $1
                  UNION ALL
                  SELECT meme_id, $3::BIGINT AS weight FROM comments WHERE created_at > $1
              ) interactions
              GROUP BY meme_id",
        )
        .bind(cutoff)
        .bind(LIKE_WEIGHT)
        .bind(COMMENT_WEIGHT)
        .bind(window_hours)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;
        tracing::debug!(memes = inserted, window_hours, "Rebuilt trending scores");
        Ok(inserted)
    }

    /// The cached trending view, highest score first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn cached_trending(&self, limit: i64) -> Result<Vec<TrendingScore>, DbError> {
        let rows = sqlx::query_as::<_, CachedScoreRow>(
            r"SELECT meme_id, score, window_hours, computed_at
              FROM trending_scores
              ORDER BY score DESC, meme_id ASC
              LIMIT $1",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| TrendingScore {
                meme_id: MemeId::from(row.meme_id),
                score: row.score,
                window_hours: row.window_hours,
                computed_at: row.computed_at,
            })
            .collect())
    }
}

/// A leaderboard row read from `users`.
#[derive(Debug, Clone, sqlx::FromRow)]
struct LeaderboardRow {
    id: Uuid,
    username: String,
    total_points: i64,
    rank: String,
}

/// A live trending aggregate row.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ScoreRow {
    meme_id: Uuid,
    score: i64,
}

/// A row from the `trending_scores` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct CachedScoreRow {
    meme_id: Uuid,
    score: i64,
    window_hours: i64,
    computed_at: DateTime<Utc>,
}
