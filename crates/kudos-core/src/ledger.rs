//! The in-memory reference ledger: an append-only log of point
//! transactions with at-most-once application per idempotency key.
//!
//! The durable ledger lives in `PostgreSQL` (`kudos-db`); this model
//! implements the identical semantics without I/O and is what the
//! engine's accounting properties are tested against.
//!
//! # Design
//!
//! - **Append-only**: entries are never modified or deleted.
//! - **Idempotent**: a key already present makes `apply` a no-op that
//!   returns the existing entry.
//! - **Derived balances**: per-user balances are updated together with
//!   every append and can be re-derived from the log at any time;
//!   [`PointLedger::verify_balances`] checks the two agree.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use kudos_types::{PointEvent, PointTransaction, Rank, TransactionId, UserId};

use crate::RuleError;

/// Result of applying a [`PointEvent`] to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The event was new; a ledger entry was appended and the balance
    /// moved.
    Applied(PointTransaction),
    /// The event's idempotency key had already been applied. The
    /// existing entry is returned and nothing changed.
    AlreadyApplied(PointTransaction),
}

impl ApplyOutcome {
    /// The ledger entry for this event, whether new or pre-existing.
    pub const fn transaction(&self) -> &PointTransaction {
        match self {
            Self::Applied(tx) | Self::AlreadyApplied(tx) => tx,
        }
    }
}

/// Append-only in-memory point ledger with derived balances.
#[derive(Debug, Default)]
pub struct PointLedger {
    /// All entries, in application order.
    entries: Vec<PointTransaction>,
    /// Index from idempotency key to position in `entries`.
    by_key: BTreeMap<String, usize>,
    /// Derived per-user balances.
    balances: BTreeMap<UserId, i64>,
}

impl PointLedger {
    /// Create a new empty ledger.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            by_key: BTreeMap::new(),
            balances: BTreeMap::new(),
        }
    }

    /// Return the number of entries in the ledger.
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return whether the ledger has no entries.
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply a point event.
    ///
    /// If the event's idempotency key is already present the existing
    /// entry is returned as [`ApplyOutcome::AlreadyApplied`] and the
    /// ledger is untouched -- this is how retried or duplicated
    /// upstream calls are tolerated without double-crediting.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::ZeroAmount`] for zero-amount events and
    /// [`RuleError::EmptyIdempotencyKey`] for events without a key.
    pub fn apply(&mut self, event: &PointEvent) -> Result<ApplyOutcome, RuleError> {
        if event.amount == 0 {
            return Err(RuleError::ZeroAmount);
        }
        if event.idempotency_key.is_empty() {
            return Err(RuleError::EmptyIdempotencyKey);
        }

        if let Some(&index) = self.by_key.get(&event.idempotency_key) {
            if let Some(existing) = self.entries.get(index) {
                return Ok(ApplyOutcome::AlreadyApplied(existing.clone()));
            }
        }

        let transaction = PointTransaction {
            id: TransactionId::new(),
            user_id: event.user_id,
            amount: event.amount,
            reason: event.reason,
            idempotency_key: event.idempotency_key.clone(),
            created_at: Utc::now(),
        };

        let balance = self.balances.entry(event.user_id).or_insert(0);
        *balance = balance.saturating_add(event.amount);

        self.by_key
            .insert(event.idempotency_key.clone(), self.entries.len());
        self.entries.push(transaction.clone());

        Ok(ApplyOutcome::Applied(transaction))
    }

    /// Current balance for a user (0 if the user has no entries).
    pub fn balance(&self, user: UserId) -> i64 {
        self.balances.get(&user).copied().unwrap_or(0)
    }

    /// Current rank for a user, a pure function of the balance.
    pub fn rank_of(&self, user: UserId) -> Rank {
        Rank::for_points(self.balance(user))
    }

    /// All entries, in application order.
    pub fn all_entries(&self) -> &[PointTransaction] {
        &self.entries
    }

    /// All entries affecting a user, in application order.
    pub fn entries_for(&self, user: UserId) -> Vec<&PointTransaction> {
        self.entries.iter().filter(|t| t.user_id == user).collect()
    }

    /// Re-derive every balance from the log and compare against the
    /// maintained balances. Returns `true` when they agree -- the
    /// ledger's core invariant.
    pub fn verify_balances(&self) -> bool {
        let mut derived: BTreeMap<UserId, i64> = BTreeMap::new();
        for entry in &self.entries {
            let balance = derived.entry(entry.user_id).or_insert(0);
            *balance = balance.saturating_add(entry.amount);
        }
        derived == self.balances
    }

    /// Rank users by balance: points descending, ties broken by the
    /// earliest account creation time (earlier account wins).
    ///
    /// `created` supplies each user's account creation time; users
    /// without an entry sort after those with one.
    pub fn leaderboard(
        &self,
        created: &BTreeMap<UserId, DateTime<Utc>>,
        limit: usize,
        offset: usize,
    ) -> Vec<(UserId, i64)> {
        let mut rows: Vec<(UserId, i64)> = self
            .balances
            .iter()
            .map(|(&user, &points)| (user, points))
            .collect();
        rows.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then_with(|| {
                    match (created.get(&a.0), created.get(&b.0)) {
                        (Some(x), Some(y)) => x.cmp(y),
                        (Some(_), None) => core::cmp::Ordering::Less,
                        (None, Some(_)) => core::cmp::Ordering::Greater,
                        (None, None) => core::cmp::Ordering::Equal,
                    }
                })
                .then_with(|| a.0.cmp(&b.0))
        });
        rows.into_iter().skip(offset).take(limit).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::points::PointPolicy;
    use kudos_types::{LikeId, MemeId, PointReason};

    fn event(user: UserId, amount: i64, key: &str) -> PointEvent {
        PointEvent {
            user_id: user,
            reason: PointReason::Bonus,
            amount,
            idempotency_key: key.to_owned(),
        }
    }

    #[test]
    fn new_ledger_is_empty() {
        let ledger = PointLedger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.len(), 0);
    }

    #[test]
    fn apply_appends_and_moves_balance() {
        let mut ledger = PointLedger::new();
        let user = UserId::new();

        let outcome = ledger.apply(&event(user, 25, "bonus:welcome"));
        assert!(matches!(outcome, Ok(ApplyOutcome::Applied(_))));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.balance(user), 25);
        assert!(ledger.verify_balances());
    }

    #[test]
    fn replay_is_a_noop_returning_the_existing_entry() {
        let mut ledger = PointLedger::new();
        let user = UserId::new();

        let first = ledger.apply(&event(user, 25, "bonus:welcome"));
        let first_id = match first {
            Ok(ApplyOutcome::Applied(tx)) => Some(tx.id),
            _ => None,
        };

        // Replaying any number of times produces exactly one entry and
        // leaves the balance unchanged after the first application.
        for _ in 0..5 {
            let replay = ledger.apply(&event(user, 25, "bonus:welcome"));
            assert!(matches!(&replay, Ok(ApplyOutcome::AlreadyApplied(_))));
            if let Ok(ApplyOutcome::AlreadyApplied(tx)) = replay {
                assert_eq!(Some(tx.id), first_id);
            }
        }
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.balance(user), 25);
        assert!(ledger.verify_balances());
    }

    #[test]
    fn zero_amount_rejected() {
        let mut ledger = PointLedger::new();
        let result = ledger.apply(&event(UserId::new(), 0, "bonus:zero"));
        assert!(matches!(result, Err(RuleError::ZeroAmount)));
        assert!(ledger.is_empty());
    }

    #[test]
    fn empty_key_rejected() {
        let mut ledger = PointLedger::new();
        let result = ledger.apply(&event(UserId::new(), 5, ""));
        assert!(matches!(result, Err(RuleError::EmptyIdempotencyKey)));
        assert!(ledger.is_empty());
    }

    #[test]
    fn balance_is_sum_of_entries() {
        let mut ledger = PointLedger::new();
        let user = UserId::new();
        let other = UserId::new();

        let _ = ledger.apply(&event(user, 10, "a"));
        let _ = ledger.apply(&event(user, -5, "b"));
        let _ = ledger.apply(&event(other, 2, "c"));
        let _ = ledger.apply(&event(user, 20, "d"));

        let summed: i64 = ledger
            .entries_for(user)
            .iter()
            .map(|t| t.amount)
            .fold(0, i64::saturating_add);
        assert_eq!(ledger.balance(user), summed);
        assert_eq!(ledger.balance(user), 25);
        assert_eq!(ledger.balance(other), 2);
        assert!(ledger.verify_balances());
    }

    #[test]
    fn rank_follows_balance() {
        let mut ledger = PointLedger::new();
        let user = UserId::new();
        assert_eq!(ledger.rank_of(user), Rank::Newbie);

        let _ = ledger.apply(&event(user, 60, "a"));
        assert_eq!(ledger.rank_of(user), Rank::RookieMemer);

        let _ = ledger.apply(&event(user, 1000, "b"));
        assert_eq!(ledger.rank_of(user), Rank::MemeLegend);
    }

    /// End-to-end accounting scenario: create, like, duplicate like,
    /// unlike, comment, leaderboard.
    #[test]
    fn like_unlike_comment_scenario() {
        let policy = PointPolicy::default();
        let mut ledger = PointLedger::new();
        let mut created = BTreeMap::new();

        let alice = UserId::new();
        let carol = UserId::new();
        created.insert(alice, Utc::now());
        created.insert(carol, Utc::now());

        // Alice creates a meme: +10.
        let meme = MemeId::new();
        let _ = ledger.apply(&policy.meme_created(alice, meme));
        assert_eq!(ledger.balance(alice), 10);
        assert_eq!(ledger.rank_of(alice), Rank::Newbie);

        // Bob likes it: +5 to Alice.
        let like = LikeId::new();
        let _ = ledger.apply(&policy.like_received(alice, like));
        assert_eq!(ledger.balance(alice), 15);

        // Bob's like is retried: no-op, total stays 15.
        let replay = ledger.apply(&policy.like_received(alice, like));
        assert!(matches!(replay, Ok(ApplyOutcome::AlreadyApplied(_))));
        assert_eq!(ledger.balance(alice), 15);

        // Bob removes the like: -5 reversal.
        let _ = ledger.apply(&policy.like_removed(alice, like));
        assert_eq!(ledger.balance(alice), 10);

        // Carol comments: +2 to Carol, not to Alice.
        let comment = kudos_types::CommentId::new();
        let _ = ledger.apply(&policy.comment_made(carol, comment));
        assert_eq!(ledger.balance(carol), 2);
        assert_eq!(ledger.balance(alice), 10);

        // Leaderboard with limit 2: [Alice(10), Carol(2)].
        let board = ledger.leaderboard(&created, 2, 0);
        assert_eq!(board, vec![(alice, 10), (carol, 2)]);
        assert!(ledger.verify_balances());
    }

    #[test]
    fn double_login_credits_exactly_once() {
        let policy = PointPolicy::default();
        let mut ledger = PointLedger::new();
        let user = UserId::new();
        let day = chrono::NaiveDate::from_ymd_opt(2026, 8, 29);
        assert!(day.is_some());
        if let Some(day) = day {
            let _ = ledger.apply(&policy.daily_login(user, day));
            let _ = ledger.apply(&policy.daily_login(user, day));
            // Point total increases by exactly 1, not 2.
            assert_eq!(ledger.balance(user), 1);
            assert_eq!(ledger.len(), 1);
        }
    }

    #[test]
    fn leaderboard_ties_break_toward_earlier_account() {
        let mut ledger = PointLedger::new();
        let mut created = BTreeMap::new();

        let older = UserId::new();
        let newer = UserId::new();
        let base = Utc::now();
        created.insert(older, base - chrono::Duration::days(10));
        created.insert(newer, base);

        let _ = ledger.apply(&event(older, 50, "a"));
        let _ = ledger.apply(&event(newer, 50, "b"));

        let board = ledger.leaderboard(&created, 10, 0);
        assert_eq!(board.first().map(|r| r.0), Some(older));
    }

    #[test]
    fn leaderboard_pagination_skips_and_takes() {
        let mut ledger = PointLedger::new();
        let mut created = BTreeMap::new();
        let mut users = Vec::new();
        for points in [40, 30, 20, 10] {
            let user = UserId::new();
            created.insert(user, Utc::now());
            let _ = ledger.apply(&event(user, points, &format!("seed:{user}")));
            users.push((user, points));
        }
        let page = ledger.leaderboard(&created, 2, 1);
        assert_eq!(page.iter().map(|r| r.1).collect::<Vec<_>>(), vec![30, 20]);
    }
}
