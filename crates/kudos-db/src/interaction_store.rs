//! Meme, like, and comment persistence.
//!
//! Likes are guarded by the `likes_user_meme_key` unique constraint:
//! at most one live like per (user, meme) pair, enforced by the
//! database so concurrent double-likes settle to a single row. The
//! denormalized `like_count` and `comment_count` columns on `memes`
//! move in the same transaction as the interaction row.

use kudos_types::{Comment, CommentId, Like, LikeId, Meme, MemeId, UserId};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{DbError, is_unique_violation};

/// Operations on the `memes`, `likes`, and `comments` tables.
pub struct InteractionStore<'a> {
    pool: &'a PgPool,
}

impl<'a> InteractionStore<'a> {
    /// Create a new interaction store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new meme.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails.
    pub async fn insert_meme(conn: &mut PgConnection, meme: &Meme) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO memes (id, owner_id, content_ref, like_count, comment_count, created_at)
              VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(meme.id.into_inner())
        .bind(meme.owner_id.into_inner())
        .bind(&meme.content_ref)
        .bind(meme.like_count)
        .bind(meme.comment_count)
        .bind(meme.created_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Owner of a meme, if the meme exists.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn meme_owner(
        conn: &mut PgConnection,
        meme_id: MemeId,
    ) -> Result<Option<UserId>, DbError> {
        let owner: Option<Uuid> =
            sqlx::query_scalar(r"SELECT owner_id FROM memes WHERE id = $1")
                .bind(meme_id.into_inner())
                .fetch_optional(conn)
                .await?;
        Ok(owner.map(UserId::from))
    }

    /// Insert a like and bump the meme's like count.
    ///
    /// Returns `Ok(false)` when this user already likes this meme; the
    /// unique constraint on `(user_id, meme_id)` settles the race and
    /// nothing is counted twice.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails for any
    /// reason other than a duplicate like.
    pub async fn add_like(conn: &mut PgConnection, like: &Like) -> Result<bool, DbError> {
        let result = sqlx::query(
            r"INSERT INTO likes (id, user_id, meme_id, created_at)
              VALUES ($1, $2, $3, $4)",
        )
        .bind(like.id.into_inner())
        .bind(like.user_id.into_inner())
        .bind(like.meme_id.into_inner())
        .bind(like.created_at)
        .execute(&mut *conn)
        .await;

        match result {
            Ok(_) => {}
            Err(ref err) if is_unique_violation(err) => return Ok(false),
            Err(err) => return Err(DbError::Postgres(err)),
        }

        sqlx::query(r"UPDATE memes SET like_count = like_count + 1 WHERE id = $1")
            .bind(like.meme_id.into_inner())
            .execute(conn)
            .await?;
        Ok(true)
    }

    /// Remove a user's like from a meme and lower the like count.
    ///
    /// Returns the id of the deleted like row, or `None` when there
    /// was no like to remove.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the delete fails.
    pub async fn remove_like(
        conn: &mut PgConnection,
        user_id: UserId,
        meme_id: MemeId,
    ) -> Result<Option<LikeId>, DbError> {
        let deleted: Option<Uuid> = sqlx::query_scalar(
            r"DELETE FROM likes WHERE user_id = $1 AND meme_id = $2 RETURNING id",
        )
        .bind(user_id.into_inner())
        .bind(meme_id.into_inner())
        .fetch_optional(&mut *conn)
        .await?;

        let Some(like_id) = deleted else {
            return Ok(None);
        };

        sqlx::query(
            r"UPDATE memes SET like_count = GREATEST(like_count - 1, 0) WHERE id = $1",
        )
        .bind(meme_id.into_inner())
        .execute(conn)
        .await?;
        Ok(Some(LikeId::from(like_id)))
    }

    /// Whether a comment exists on the given meme. Used to validate a
    /// reply's parent before inserting it.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn parent_on_meme(
        conn: &mut PgConnection,
        parent_id: CommentId,
        meme_id: MemeId,
    ) -> Result<bool, DbError> {
        let found: Option<i32> = sqlx::query_scalar(
            r"SELECT 1 FROM comments WHERE id = $1 AND meme_id = $2",
        )
        .bind(parent_id.into_inner())
        .bind(meme_id.into_inner())
        .fetch_optional(conn)
        .await?;
        Ok(found.is_some())
    }

    /// Insert a comment and bump the meme's comment count.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails.
    pub async fn add_comment(conn: &mut PgConnection, comment: &Comment) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO comments (id, meme_id, author_id, parent_id, body, created_at)
              VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(comment.id.into_inner())
        .bind(comment.meme_id.into_inner())
        .bind(comment.author_id.into_inner())
        .bind(comment.parent_id.map(CommentId::into_inner))
        .bind(&comment.body)
        .bind(comment.created_at)
        .execute(&mut *conn)
        .await?;

        sqlx::query(r"UPDATE memes SET comment_count = comment_count + 1 WHERE id = $1")
            .bind(comment.meme_id.into_inner())
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Fetch a meme by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::RowNotFound`] if no such meme exists, or
    /// [`DbError::Postgres`] if the query fails.
    pub async fn fetch_meme(&self, meme_id: MemeId) -> Result<Meme, DbError> {
        let row = sqlx::query_as::<_, MemeRow>(
            r"SELECT id, owner_id, content_ref, like_count, comment_count, created_at
              FROM memes
              WHERE id = $1",
        )
        .bind(meme_id.into_inner())
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::RowNotFound(format!("meme {meme_id}")))?;

        Ok(row.into_meme())
    }
}

/// A row from the `memes` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct MemeRow {
    id: Uuid,
    owner_id: Uuid,
    content_ref: String,
    like_count: i64,
    comment_count: i64,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl MemeRow {
    fn into_meme(self) -> Meme {
        Meme {
            id: MemeId::from(self.id),
            owner_id: UserId::from(self.owner_id),
            content_ref: self.content_ref,
            like_count: self.like_count,
            comment_count: self.comment_count,
            created_at: self.created_at,
        }
    }
}
