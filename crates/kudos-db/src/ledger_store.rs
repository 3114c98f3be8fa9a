//! Point ledger persistence: append-only transaction records plus the
//! denormalized `users.total_points` running balance.
//!
//! Every credit goes through [`LedgerStore::record`], which settles
//! idempotency on the `point_transactions.idempotency_key` unique
//! constraint: the first writer of a key wins, later writers (retries,
//! racing duplicates) get the already-recorded transaction back.
//!
//! Mutating operations take a `&mut PgConnection` so callers can
//! compose them with other writes inside a single database
//! transaction. Read operations are bound to the pool.

use chrono::NaiveDate;
use kudos_types::{PointEvent, PointTransaction, Rank, TransactionId, UserId};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::convert::{rank_from_db, rank_to_db, reason_from_db, reason_to_db};
use crate::error::DbError;

/// Result of recording a point event against the ledger.
#[derive(Debug, Clone)]
pub enum RecordOutcome {
    /// The event was new: a transaction row was inserted and the
    /// user's balance moved from `previous_total` to `new_total`.
    Applied {
        /// The transaction that was written.
        transaction: PointTransaction,
        /// Balance before the credit.
        previous_total: i64,
        /// Balance after the credit.
        new_total: i64,
    },
    /// The idempotency key was already settled; the balance did not
    /// move. Carries the transaction recorded by the first writer.
    AlreadyApplied {
        /// The previously recorded transaction.
        transaction: PointTransaction,
    },
}

impl RecordOutcome {
    /// The transaction backing this outcome, whichever variant.
    #[must_use]
    pub const fn transaction(&self) -> &PointTransaction {
        match self {
            Self::Applied { transaction, .. } | Self::AlreadyApplied { transaction } => transaction,
        }
    }

    /// Whether the event was applied by this call.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Outcome of a daily login credit, including streak bookkeeping.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// The underlying ledger outcome.
    pub record: RecordOutcome,
    /// The user's login streak after this login.
    pub login_streak: i32,
}

/// Operations on the `point_transactions` table and the running
/// balance columns of `users`.
pub struct LedgerStore<'a> {
    pool: &'a PgPool,
}

impl<'a> LedgerStore<'a> {
    /// Create a new ledger store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a point event, settling duplicates on the idempotency
    /// key.
    ///
    /// The insert uses `ON CONFLICT (idempotency_key) DO NOTHING`; a
    /// zero row count means another writer already settled the key,
    /// and the existing transaction is fetched and returned instead of
    /// crediting twice. On a fresh insert the user's `total_points` is
    /// bumped atomically and the stored rank is refreshed from the
    /// new balance.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::RowNotFound`] if the user does not exist,
    /// or [`DbError::Postgres`] on query failure.
    pub async fn record(
        conn: &mut PgConnection,
        event: &PointEvent,
    ) -> Result<RecordOutcome, DbError> {
        let id = TransactionId::new();
        let created_at = chrono::Utc::now();

        let inserted = sqlx::query(
            r"INSERT INTO point_transactions (id, user_id, reason, amount, idempotency_key, created_at)
              VALUES ($1, $2, $3::point_reason, $4, $5, $6)
              ON CONFLICT ON CONSTRAINT point_transactions_idempotency_key DO NOTHING",
        )
        .bind(id.into_inner())
        .bind(event.user_id.into_inner())
        .bind(reason_to_db(event.reason))
        .bind(event.amount)
        .bind(&event.idempotency_key)
        .bind(created_at)
        .execute(&mut *conn)
        .await?
        .rows_affected();

        if inserted == 0 {
            let transaction = Self::fetch_by_key(conn, &event.idempotency_key).await?;
            tracing::debug!(
                user_id = %event.user_id,
                idempotency_key = %event.idempotency_key,
                "Point event already settled"
            );
            return Ok(RecordOutcome::AlreadyApplied { transaction });
        }

        let new_total: i64 = sqlx::query_scalar(
            r"UPDATE users SET total_points = total_points + $2
              WHERE id = $1
              RETURNING total_points",
        )
        .bind(event.user_id.into_inner())
        .bind(event.amount)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::RowNotFound(format!("user {}", event.user_id)))?;

        let previous_total = new_total.saturating_sub(event.amount);
        Self::refresh_rank(conn, event.user_id, new_total).await?;

        tracing::debug!(
            user_id = %event.user_id,
            reason = reason_to_db(event.reason),
            amount = event.amount,
            new_total,
            "Recorded point event"
        );

        Ok(RecordOutcome::Applied {
            transaction: PointTransaction {
                id,
                user_id: event.user_id,
                reason: event.reason,
                amount: event.amount,
                idempotency_key: event.idempotency_key.clone(),
                created_at,
            },
            previous_total,
            new_total,
        })
    }

    /// Record a daily login credit and advance the login streak.
    ///
    /// The streak update only runs when the ledger credit applies, so
    /// replayed logins for the same day leave both the balance and the
    /// streak untouched. A login the day after the previous one
    /// extends the streak; any gap resets it to 1.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::RowNotFound`] if the user does not exist,
    /// or [`DbError::Postgres`] on query failure.
    pub async fn record_login(
        conn: &mut PgConnection,
        event: &PointEvent,
        day: NaiveDate,
    ) -> Result<LoginOutcome, DbError> {
        let record = Self::record(conn, event).await?;

        let login_streak: i32 = if record.is_applied() {
            sqlx::query_scalar(
                r"UPDATE users
                  SET login_streak = CASE
                          WHEN last_login_day = $2::date - 1 THEN login_streak + 1
                          ELSE 1
                      END,
                      last_login_day = $2
                  WHERE id = $1
                  RETURNING login_streak",
            )
            .bind(event.user_id.into_inner())
            .bind(day)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| DbError::RowNotFound(format!("user {}", event.user_id)))?
        } else {
            sqlx::query_scalar(r"SELECT login_streak FROM users WHERE id = $1")
                .bind(event.user_id.into_inner())
                .fetch_optional(&mut *conn)
                .await?
                .ok_or_else(|| DbError::RowNotFound(format!("user {}", event.user_id)))?
        };

        Ok(LoginOutcome {
            record,
            login_streak,
        })
    }

    /// Refresh the stored rank from a freshly computed balance.
    ///
    /// The stored rank is a denormalization of `total_points`; keeping
    /// it in the same transaction as the balance update means readers
    /// never observe the two out of step.
    async fn refresh_rank(
        conn: &mut PgConnection,
        user_id: UserId,
        total_points: i64,
    ) -> Result<(), DbError> {
        let rank = Rank::for_points(total_points);
        sqlx::query(r"UPDATE users SET rank = $2::user_rank WHERE id = $1 AND rank <> $2::user_rank")
            .bind(user_id.into_inner())
            .bind(rank_to_db(rank))
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Fetch the transaction settled under an idempotency key.
    async fn fetch_by_key(
        conn: &mut PgConnection,
        idempotency_key: &str,
    ) -> Result<PointTransaction, DbError> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r"SELECT id, user_id, reason::TEXT AS reason, amount, idempotency_key, created_at
              FROM point_transactions
              WHERE idempotency_key = $1",
        )
        .bind(idempotency_key)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| DbError::RowNotFound(format!("transaction for key {idempotency_key}")))?;

        row.into_transaction()
    }

    /// Current point balance for a user.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::RowNotFound`] if the user does not exist,
    /// or [`DbError::Postgres`] on query failure.
    pub async fn balance_of(&self, user_id: UserId) -> Result<i64, DbError> {
        sqlx::query_scalar(r"SELECT total_points FROM users WHERE id = $1")
            .bind(user_id.into_inner())
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::RowNotFound(format!("user {user_id}")))
    }

    /// Sum of every ledger entry for a user, computed from the
    /// transaction log rather than the denormalized balance. Equal to
    /// [`Self::balance_of`] when the ledger is consistent.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn ledger_sum_of(&self, user_id: UserId) -> Result<i64, DbError> {
        let sum: Option<i64> = sqlx::query_scalar(
            r"SELECT SUM(amount)::BIGINT FROM point_transactions WHERE user_id = $1",
        )
        .bind(user_id.into_inner())
        .fetch_one(self.pool)
        .await?;
        Ok(sum.unwrap_or(0))
    }

    /// All transactions for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails, or
    /// [`DbError::RowNotFound`] if a stored reason string no longer
    /// parses.
    pub async fn transactions_for_user(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> Result<Vec<PointTransaction>, DbError> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r"SELECT id, user_id, reason::TEXT AS reason, amount, idempotency_key, created_at
              FROM point_transactions
              WHERE user_id = $1
              ORDER BY created_at DESC, id DESC
              LIMIT $2",
        )
        .bind(user_id.into_inner())
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TransactionRow::into_transaction).collect()
    }
}

/// A row from the `point_transactions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    user_id: Uuid,
    reason: String,
    amount: i64,
    idempotency_key: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl TransactionRow {
    fn into_transaction(self) -> Result<PointTransaction, DbError> {
        let reason = reason_from_db(&self.reason)
            .ok_or_else(|| DbError::RowNotFound(format!("unknown point reason {}", self.reason)))?;
        Ok(PointTransaction {
            id: TransactionId::from(self.id),
            user_id: UserId::from(self.user_id),
            reason,
            amount: self.amount,
            idempotency_key: self.idempotency_key,
            created_at: self.created_at,
        })
    }
}

/// Parse a stored rank string, used by sibling stores reading `users`.
pub(crate) fn parse_rank(value: &str) -> Result<Rank, DbError> {
    rank_from_db(value).ok_or_else(|| DbError::RowNotFound(format!("unknown rank {value}")))
}
