//! Badge award persistence.
//!
//! Awards are once-per-user-per-badge by primary key; a replayed or
//! racing evaluation that tries to award the same badge again simply
//! loses the insert and reports so.

use kudos_types::{BadgeAward, UserId};
use sqlx::{PgConnection, PgPool};

use crate::error::DbError;

/// Operations on the `badge_awards` table.
pub struct BadgeStore<'a> {
    pool: &'a PgPool,
}

impl<'a> BadgeStore<'a> {
    /// Create a new badge store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Award a badge to a user unless it is already held.
    ///
    /// Returns `Ok(true)` when this call performed the award and
    /// `Ok(false)` when the (user, badge) pair already existed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails.
    pub async fn try_award(conn: &mut PgConnection, award: &BadgeAward) -> Result<bool, DbError> {
        let inserted = sqlx::query(
            r"INSERT INTO badge_awards (user_id, badge_slug, awarded_at)
              VALUES ($1, $2, $3)
              ON CONFLICT (user_id, badge_slug) DO NOTHING",
        )
        .bind(award.user_id.into_inner())
        .bind(&award.badge_slug)
        .bind(award.awarded_at)
        .execute(conn)
        .await?
        .rows_affected();

        Ok(inserted > 0)
    }

    /// Slugs of every badge a user holds.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn slugs_for(&self, user_id: UserId) -> Result<Vec<String>, DbError> {
        let slugs = sqlx::query_scalar(
            r"SELECT badge_slug FROM badge_awards WHERE user_id = $1 ORDER BY awarded_at",
        )
        .bind(user_id.into_inner())
        .fetch_all(self.pool)
        .await?;
        Ok(slugs)
    }

    /// All awards for a user, in award order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn awards_for(&self, user_id: UserId) -> Result<Vec<BadgeAward>, DbError> {
        let rows = sqlx::query_as::<_, AwardRow>(
            r"SELECT user_id, badge_slug, awarded_at
              FROM badge_awards
              WHERE user_id = $1
              ORDER BY awarded_at",
        )
        .bind(user_id.into_inner())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(AwardRow::into_award).collect())
    }
}

/// A row from the `badge_awards` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct AwardRow {
    user_id: uuid::Uuid,
    badge_slug: String,
    awarded_at: chrono::DateTime<chrono::Utc>,
}

impl AwardRow {
    fn into_award(self) -> BadgeAward {
        BadgeAward {
            user_id: UserId::from(self.user_id),
            badge_slug: self.badge_slug,
            awarded_at: self.awarded_at,
        }
    }
}
