//! Activity log persistence.
//!
//! The `activities` table is an append-only feed of everything a user
//! does that the engine reacts to. Entries are written in the same
//! transaction as the action they describe, so the feed never shows an
//! action whose effects were rolled back.

use kudos_types::{Activity, ActivityId, ActivityKind, UserId};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::convert::{kind_from_db, kind_to_db};
use crate::error::DbError;

/// Operations on the `activities` table.
pub struct ActivityStore<'a> {
    pool: &'a PgPool,
}

impl<'a> ActivityStore<'a> {
    /// Create a new activity store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Append an activity entry.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails.
    pub async fn append(conn: &mut PgConnection, activity: &Activity) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO activities (id, user_id, kind, reference_id, created_at)
              VALUES ($1, $2, $3::activity_kind, $4, $5)",
        )
        .bind(activity.id.into_inner())
        .bind(activity.user_id.into_inner())
        .bind(kind_to_db(activity.kind))
        .bind(activity.reference_id)
        .bind(activity.created_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// The most recent activity entries for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails, or
    /// [`DbError::RowNotFound`] if a stored kind string no longer
    /// parses.
    pub async fn recent_for_user(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> Result<Vec<Activity>, DbError> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            r"SELECT id, user_id, kind::TEXT AS kind, reference_id, created_at
              FROM activities
              WHERE user_id = $1
              ORDER BY created_at DESC, id DESC
              LIMIT $2",
        )
        .bind(user_id.into_inner())
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(ActivityRow::into_activity).collect()
    }
}

/// A row from the `activities` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ActivityRow {
    id: Uuid,
    user_id: Uuid,
    kind: String,
    reference_id: Option<Uuid>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl ActivityRow {
    fn into_activity(self) -> Result<Activity, DbError> {
        let kind = kind_from_db(&self.kind)
            .ok_or_else(|| DbError::RowNotFound(format!("unknown activity kind {}", self.kind)))?;
        Ok(Activity {
            id: ActivityId::from(self.id),
            user_id: UserId::from(self.user_id),
            kind,
            reference_id: self.reference_id,
            created_at: self.created_at,
        })
    }
}

/// Build an activity entry stamped now, for appending alongside the
/// action it records.
#[must_use]
pub fn activity_now(user_id: UserId, kind: ActivityKind, reference_id: Option<Uuid>) -> Activity {
    Activity {
        id: ActivityId::new(),
        user_id,
        kind,
        reference_id,
        created_at: chrono::Utc::now(),
    }
}
