//! The point policy: how much each action is worth, and under which
//! idempotency key it is applied.
//!
//! Every point-affecting action maps to exactly one [`PointEvent`]
//! whose key is derived from the originating row or calendar day, so a
//! retried upstream call replays the same key and is applied at most
//! once. Key formats:
//!
//! | Action           | Key                        |
//! |------------------|----------------------------|
//! | Meme created     | `meme:{meme_id}`           |
//! | Like received    | `like:{like_id}`           |
//! | Like removed     | `unlike:{like_id}`         |
//! | Comment made     | `comment:{comment_id}`     |
//! | Daily login      | `login:{user_id}:{date}`   |
//! | Caller bonus     | `bonus:{source}`           |
//! | Milestone bonus  | `milestone:{user_id}:{n}`  |

use chrono::NaiveDate;
use serde::Deserialize;

use kudos_types::{CommentId, LikeId, MemeId, PointEvent, PointReason, UserId};

/// Default points for creating a meme.
const MEME_CREATED_POINTS: i64 = 10;

/// Default points credited to the meme owner per like received.
const LIKE_RECEIVED_POINTS: i64 = 5;

/// Default points for making a comment.
const COMMENT_MADE_POINTS: i64 = 2;

/// Default points for the first login of a calendar day.
const DAILY_LOGIN_POINTS: i64 = 1;

/// Smallest allowed bonus.
const BONUS_MIN: i64 = 20;

/// Largest allowed bonus.
const BONUS_MAX: i64 = 100;

/// Meme-count milestones and the bonus each one pays, ascending.
///
/// Taken from the original milestone table, with values clamped into
/// the bonus band.
const MILESTONES: [(i64, i64); 5] = [(5, 25), (10, 50), (25, 75), (50, 100), (100, 100)];

/// The point values the engine credits per action.
///
/// All fields default to the contract table; deployments may override
/// them through the engine configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PointPolicy {
    /// Points for creating a meme.
    pub meme_created: i64,
    /// Points credited to the meme owner per like received. The
    /// reversal on unlike debits the same amount.
    pub like_received: i64,
    /// Points for making a comment (credited to the commenter).
    pub comment_made: i64,
    /// Points for the first login of a calendar day.
    pub daily_login: i64,
    /// Inclusive lower bound for bonus amounts.
    pub bonus_min: i64,
    /// Inclusive upper bound for bonus amounts.
    pub bonus_max: i64,
}

impl Default for PointPolicy {
    fn default() -> Self {
        Self {
            meme_created: MEME_CREATED_POINTS,
            like_received: LIKE_RECEIVED_POINTS,
            comment_made: COMMENT_MADE_POINTS,
            daily_login: DAILY_LOGIN_POINTS,
            bonus_min: BONUS_MIN,
            bonus_max: BONUS_MAX,
        }
    }
}

impl PointPolicy {
    /// Event crediting a creator for a new meme.
    pub fn meme_created(&self, owner: UserId, meme: MemeId) -> PointEvent {
        PointEvent {
            user_id: owner,
            reason: PointReason::MemeCreated,
            amount: self.meme_created,
            idempotency_key: format!("meme:{meme}"),
        }
    }

    /// Event crediting a meme owner for a like. The key is minted from
    /// the like row id, so a re-like after an unlike is a fresh logical
    /// event while a retried insert is not.
    pub fn like_received(&self, owner: UserId, like: LikeId) -> PointEvent {
        PointEvent {
            user_id: owner,
            reason: PointReason::LikeReceived,
            amount: self.like_received,
            idempotency_key: format!("like:{like}"),
        }
    }

    /// Reversal event debiting a meme owner when a like is removed, so
    /// the balance always reflects the current like count's
    /// contribution, not a historical peak.
    pub fn like_removed(&self, owner: UserId, like: LikeId) -> PointEvent {
        PointEvent {
            user_id: owner,
            reason: PointReason::LikeRemovedReversal,
            amount: self.like_received.saturating_neg(),
            idempotency_key: format!("unlike:{like}"),
        }
    }

    /// Event crediting a commenter (not the meme owner).
    pub fn comment_made(&self, author: UserId, comment: CommentId) -> PointEvent {
        PointEvent {
            user_id: author,
            reason: PointReason::CommentMade,
            amount: self.comment_made,
            idempotency_key: format!("comment:{comment}"),
        }
    }

    /// Event crediting the first login of `day`. The key is keyed by
    /// calendar day, which is what enforces at-most-once-per-day.
    pub fn daily_login(&self, user: UserId, day: NaiveDate) -> PointEvent {
        PointEvent {
            user_id: user,
            reason: PointReason::DailyLogin,
            amount: self.daily_login,
            idempotency_key: format!("login:{user}:{}", day.format("%Y-%m-%d")),
        }
    }

    /// Event for a caller-specified bonus. The amount is clamped into
    /// the policy's bonus band and audited under `bonus:{source}`;
    /// `source` must uniquely name the originating grant.
    pub fn bonus(&self, user: UserId, amount: i64, source: &str) -> PointEvent {
        PointEvent {
            user_id: user,
            reason: PointReason::Bonus,
            amount: amount.clamp(self.bonus_min, self.bonus_max),
            idempotency_key: format!("bonus:{source}"),
        }
    }

    /// Bonus event for reaching a meme-count milestone, if
    /// `memes_created` sits exactly on one. Keys embed the milestone
    /// count, so re-evaluating after later memes never re-pays it.
    pub fn milestone_bonus(&self, user: UserId, memes_created: i64) -> Option<PointEvent> {
        MILESTONES
            .iter()
            .find(|(count, _)| *count == memes_created)
            .map(|(count, bonus)| PointEvent {
                user_id: user,
                reason: PointReason::Bonus,
                amount: (*bonus).clamp(self.bonus_min, self.bonus_max),
                idempotency_key: format!("milestone:{user}:{count}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_amounts_match_contract_table() {
        let policy = PointPolicy::default();
        assert_eq!(policy.meme_created, 10);
        assert_eq!(policy.like_received, 5);
        assert_eq!(policy.comment_made, 2);
        assert_eq!(policy.daily_login, 1);
    }

    #[test]
    fn like_and_unlike_amounts_cancel() {
        let policy = PointPolicy::default();
        let owner = UserId::new();
        let like = LikeId::new();
        let credit = policy.like_received(owner, like);
        let debit = policy.like_removed(owner, like);
        assert_eq!(credit.amount.saturating_add(debit.amount), 0);
        assert_ne!(credit.idempotency_key, debit.idempotency_key);
    }

    #[test]
    fn login_key_is_stable_per_day() {
        let policy = PointPolicy::default();
        let user = UserId::new();
        let day = NaiveDate::from_ymd_opt(2026, 3, 14);
        assert!(day.is_some());
        if let Some(day) = day {
            let first = policy.daily_login(user, day);
            let second = policy.daily_login(user, day);
            assert_eq!(first.idempotency_key, second.idempotency_key);
            assert_eq!(first.idempotency_key, format!("login:{user}:2026-03-14"));
        }
    }

    #[test]
    fn bonus_is_clamped_into_band() {
        let policy = PointPolicy::default();
        let user = UserId::new();
        assert_eq!(policy.bonus(user, 5, "promo-1").amount, 20);
        assert_eq!(policy.bonus(user, 60, "promo-2").amount, 60);
        assert_eq!(policy.bonus(user, 10_000, "promo-3").amount, 100);
    }

    #[test]
    fn milestones_only_fire_exactly_on_the_count() {
        let policy = PointPolicy::default();
        let user = UserId::new();
        assert!(policy.milestone_bonus(user, 4).is_none());
        assert!(policy.milestone_bonus(user, 6).is_none());
        let at_five = policy.milestone_bonus(user, 5);
        assert_eq!(at_five.as_ref().map(|e| e.amount), Some(25));
        assert_eq!(
            at_five.map(|e| e.idempotency_key),
            Some(format!("milestone:{user}:5")),
        );
        // The original pays 200 at 100 memes; clamped into the band.
        assert_eq!(policy.milestone_bonus(user, 100).map(|e| e.amount), Some(100));
    }

    #[test]
    fn policy_deserializes_with_defaults() {
        let policy: Result<PointPolicy, _> = serde_json::from_str(r#"{"like_received": 7}"#);
        assert_eq!(
            policy.ok(),
            Some(PointPolicy {
                like_received: 7,
                ..PointPolicy::default()
            }),
        );
    }
}
