//! Core data structures for the Kudos engagement engine.
//!
//! These mirror the durable schema in `kudos-db/migrations` plus the
//! in-memory values exchanged between the rule layer and the stores.
//! Derived fields (`total_points`, `rank`, `like_count`,
//! `comment_count`) are aggregates over append-only tables and are
//! only ever written inside the same transaction as the write that
//! changes them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ActivityKind, PointReason, Rank};
use crate::ids::{ActivityId, CommentId, LikeId, MemeId, TransactionId, UserId};

// ---------------------------------------------------------------------------
// Accounts and content
// ---------------------------------------------------------------------------

/// A user account as seen by the engagement engine.
///
/// Identity is supplied by an external provider; the engine trusts the
/// [`UserId`] it is handed and performs no authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct User {
    /// Stable user identifier.
    pub id: UserId,
    /// Display name, unique per account.
    pub username: String,
    /// Derived point balance. Invariant: equals the sum of all
    /// [`PointTransaction::amount`] rows for this user.
    pub total_points: i64,
    /// Derived rank, a pure function of `total_points`.
    pub rank: Rank,
    /// Consecutive-day login streak length.
    pub login_streak: i32,
    /// Calendar day of the most recent credited login, if any.
    pub last_login_day: Option<NaiveDate>,
    /// Account creation time. Earlier accounts win leaderboard ties.
    pub created_at: DateTime<Utc>,
}

/// A meme. The content itself (image, caption) is opaque to this
/// engine; `content_ref` points into the external storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Meme {
    /// Meme identifier.
    pub id: MemeId,
    /// The creator, credited when the meme is liked.
    pub owner_id: UserId,
    /// Opaque reference to the stored content.
    pub content_ref: String,
    /// Derived count of current likes.
    pub like_count: i64,
    /// Derived count of comments.
    pub comment_count: i64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// A like on a meme.
///
/// At most one like exists per `(user, meme)` pair at any time,
/// enforced by a storage unique constraint. The row id seeds the
/// ledger idempotency key (`like:{id}` / `unlike:{id}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Like {
    /// Like identifier.
    pub id: LikeId,
    /// The liking user.
    pub user_id: UserId,
    /// The liked meme.
    pub meme_id: MemeId,
    /// When the like was placed.
    pub created_at: DateTime<Utc>,
}

/// A comment on a meme, optionally replying to another comment on the
/// same meme. Parent chains form a finite tree, never a graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Comment {
    /// Comment identifier.
    pub id: CommentId,
    /// The meme being commented on.
    pub meme_id: MemeId,
    /// The commenting user (credited `comment_made`).
    pub author_id: UserId,
    /// Parent comment, if this is a reply. Always on the same meme.
    pub parent_id: Option<CommentId>,
    /// Comment body, never empty.
    pub body: String,
    /// When the comment was posted.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// A point-affecting event, validated by the point policy and ready to
/// be recorded. Carries the idempotency key unique to the originating
/// action, so replays of the same source event never double-credit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointEvent {
    /// The user whose balance this event affects.
    pub user_id: UserId,
    /// Why the points move.
    pub reason: PointReason,
    /// Signed point amount decided by the policy.
    pub amount: i64,
    /// Caller-supplied key ensuring at-most-once application.
    pub idempotency_key: String,
}

/// An immutable ledger entry: the durable record of one applied
/// [`PointEvent`]. Never updated or deleted once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PointTransaction {
    /// Transaction identifier.
    pub id: TransactionId,
    /// The affected user.
    pub user_id: UserId,
    /// Signed point amount.
    pub amount: i64,
    /// Why the points moved.
    pub reason: PointReason,
    /// The key under which this entry was applied, unique in the ledger.
    pub idempotency_key: String,
    /// When the entry was written.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Badges and activity
// ---------------------------------------------------------------------------

/// A permanent record that a user satisfied a badge's criteria at
/// least once. At most one award per `(user, badge)` pair ever.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BadgeAward {
    /// The awarded user.
    pub user_id: UserId,
    /// Stable slug of the badge (catalog key).
    pub badge_slug: String,
    /// When the award was made.
    pub awarded_at: DateTime<Utc>,
}

/// An append-only audit trail entry for profile/history display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Activity {
    /// Activity identifier.
    pub id: ActivityId,
    /// The acting user.
    pub user_id: UserId,
    /// What happened.
    pub kind: ActivityKind,
    /// The meme/comment/like/transaction this refers to, if any.
    pub reference_id: Option<uuid::Uuid>,
    /// When it happened.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Derived views
// ---------------------------------------------------------------------------

/// A read-only snapshot of one user's qualifying statistics, the sole
/// input to badge evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StatsSnapshot {
    /// The user the snapshot describes.
    pub user_id: UserId,
    /// Total memes created.
    pub memes_created: i64,
    /// Total likes currently held across the user's memes.
    pub likes_received: i64,
    /// Total comments the user has made.
    pub comments_made: i64,
    /// Current consecutive-day login streak.
    pub login_streak: i32,
    /// Current point balance.
    pub total_points: i64,
    /// Current rank.
    pub rank: Rank,
}

/// One row of the points leaderboard. Derived and rebuildable; never a
/// source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LeaderboardEntry {
    /// Position, starting at 1 for the highest balance.
    pub position: i64,
    /// The ranked user.
    pub user_id: UserId,
    /// Display name.
    pub username: String,
    /// Point balance at query time.
    pub total_points: i64,
    /// Rank at query time.
    pub rank: Rank,
}

/// A meme's time-windowed popularity score: likes weighted 1 and
/// comments weighted 2, counted strictly within the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TrendingScore {
    /// The scored meme.
    pub meme_id: MemeId,
    /// Weighted interaction total within the window.
    pub score: i64,
    /// Window length in hours.
    pub window_hours: i64,
    /// When the score was computed.
    pub computed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_event_roundtrip_serde() {
        let event = PointEvent {
            user_id: UserId::new(),
            reason: PointReason::LikeReceived,
            amount: 5,
            idempotency_key: format!("like:{}", LikeId::new()),
        };
        let json = serde_json::to_string(&event).ok();
        assert!(json.is_some());
        let restored: Result<PointEvent, _> =
            serde_json::from_str(json.as_deref().unwrap_or(""));
        assert_eq!(restored.ok(), Some(event));
    }

    #[test]
    fn stats_snapshot_is_copy() {
        let snapshot = StatsSnapshot {
            user_id: UserId::new(),
            memes_created: 1,
            likes_received: 0,
            comments_made: 0,
            login_streak: 1,
            total_points: 10,
            rank: Rank::Newbie,
        };
        let copied = snapshot;
        assert_eq!(copied, snapshot);
    }
}
