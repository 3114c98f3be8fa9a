//! The engagement engine: one entry point per user-facing action.
//!
//! Each mutating operation runs as a single database transaction that
//! writes the interaction row, the ledger credit, and the activity
//! entry together, so a failure anywhere rolls the whole action back.
//! Push notifications and badge evaluation happen after commit; both
//! are idempotent, so a crash between commit and either of them loses
//! nothing but latency.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use kudos_core::{
    BadgeSpec, LevelInfo, NextRankInfo, PointPolicy, default_catalog, level_for_points,
    newly_satisfied, next_rank_info,
};
use kudos_db::{
    ActivityStore, BadgeStore, InteractionStore, LedgerStore, RankingsStore, RecordOutcome,
    StatsStore, UserStore, activity_now,
};
use kudos_types::{
    Activity, ActivityKind, BadgeAward, Comment, CommentId, LeaderboardEntry, Like, LikeId, Meme,
    MemeId, PointEvent, Rank, StatsSnapshot, TrendingScore, User, UserId,
};
use sqlx::{PgConnection, PgPool};

use crate::error::EngineError;
use crate::notify::{EngagementUpdate, UpdateBus};

/// Orchestrates points, ranks, badges, interactions, and rankings.
///
/// Cheap to clone; all state lives in `PostgreSQL` behind the pool.
#[derive(Debug, Clone)]
pub struct EngagementEngine {
    pool: PgPool,
    policy: PointPolicy,
    catalog: Vec<BadgeSpec>,
    trending_window_hours: i64,
    bus: UpdateBus,
}

impl EngagementEngine {
    /// Create an engine over an existing pool with the default badge
    /// catalog.
    #[must_use]
    pub fn new(pool: PgPool, policy: PointPolicy, trending_window_hours: i64) -> Self {
        Self {
            pool,
            policy,
            catalog: default_catalog(),
            trending_window_hours,
            bus: UpdateBus::new(),
        }
    }

    /// Replace the badge catalog.
    #[must_use]
    pub fn with_catalog(mut self, catalog: Vec<BadgeSpec>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Subscribe to post-commit engagement updates.
    #[must_use]
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<EngagementUpdate> {
        self.bus.subscribe()
    }

    // -----------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------

    /// Register a new user with zero points and the lowest rank.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PolicyViolation`] for an empty username,
    /// [`EngineError::DuplicateAction`] when the username is taken, or
    /// [`EngineError::Store`] on storage failure.
    pub async fn register_user(&self, username: &str) -> Result<User, EngineError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(EngineError::PolicyViolation(
                "username must not be empty".to_owned(),
            ));
        }

        let user = User {
            id: UserId::new(),
            username: username.to_owned(),
            total_points: 0,
            rank: Rank::Newbie,
            login_streak: 0,
            last_login_day: None,
            created_at: Utc::now(),
        };

        let mut conn = self.pool.acquire().await.map_err(kudos_db::DbError::from)?;
        if !UserStore::insert(&mut conn, &user).await? {
            return Err(EngineError::DuplicateAction(format!(
                "username {username} is already taken"
            )));
        }

        tracing::info!(user_id = %user.id, username, "Registered user");
        Ok(user)
    }

    /// Fetch a user's profile.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] when the user does not exist or
    /// the read fails.
    pub async fn profile(&self, user_id: UserId) -> Result<User, EngineError> {
        Ok(UserStore::new(&self.pool).fetch(user_id).await?)
    }

    // -----------------------------------------------------------------
    // Memes
    // -----------------------------------------------------------------

    /// Create a meme, credit its creator, and pay any meme-count
    /// milestone the creation lands on.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PolicyViolation`] for an empty content
    /// reference, or [`EngineError::Store`] on storage failure.
    pub async fn create_meme(
        &self,
        owner_id: UserId,
        content_ref: &str,
    ) -> Result<Meme, EngineError> {
        if content_ref.trim().is_empty() {
            return Err(EngineError::PolicyViolation(
                "content reference must not be empty".to_owned(),
            ));
        }

        let meme = Meme {
            id: MemeId::new(),
            owner_id,
            content_ref: content_ref.to_owned(),
            like_count: 0,
            comment_count: 0,
            created_at: Utc::now(),
        };

        let mut tx = self.pool.begin().await.map_err(kudos_db::DbError::from)?;
        InteractionStore::insert_meme(&mut tx, &meme).await?;

        let mut updates =
            Self::credit(&mut tx, &self.policy.meme_created(owner_id, meme.id)).await?;

        // Milestone bonuses key on the meme count at creation time, so
        // a replay after later memes never re-pays an old milestone.
        let memes_created = StatsStore::snapshot_on(&mut tx, owner_id).await?.memes_created;
        if let Some(bonus) = self.policy.milestone_bonus(owner_id, memes_created) {
            updates.extend(Self::credit(&mut tx, &bonus).await?);
        }

        ActivityStore::append(
            &mut tx,
            &activity_now(owner_id, ActivityKind::MemeCreated, Some(meme.id.into_inner())),
        )
        .await?;
        tx.commit().await.map_err(kudos_db::DbError::from)?;

        self.publish_all(updates);
        self.evaluate_badges_post_commit(owner_id).await;
        tracing::info!(meme_id = %meme.id, owner_id = %owner_id, "Created meme");
        Ok(meme)
    }

    // -----------------------------------------------------------------
    // Likes
    // -----------------------------------------------------------------

    /// Like a meme on behalf of `user_id`, crediting the meme owner.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidReference`] when the meme does
    /// not exist, [`EngineError::PolicyViolation`] for a self-like,
    /// [`EngineError::DuplicateAction`] when the user already likes
    /// this meme, or [`EngineError::Store`] on storage failure.
    pub async fn add_like(&self, user_id: UserId, meme_id: MemeId) -> Result<Like, EngineError> {
        let mut tx = self.pool.begin().await.map_err(kudos_db::DbError::from)?;

        let owner_id = InteractionStore::meme_owner(&mut tx, meme_id)
            .await?
            .ok_or_else(|| EngineError::InvalidReference(format!("meme {meme_id} not found")))?;
        if owner_id == user_id {
            return Err(EngineError::PolicyViolation(
                "users may not like their own memes".to_owned(),
            ));
        }

        let like = Like {
            id: LikeId::new(),
            user_id,
            meme_id,
            created_at: Utc::now(),
        };
        if !InteractionStore::add_like(&mut tx, &like).await? {
            return Err(EngineError::DuplicateAction(format!(
                "user {user_id} already likes meme {meme_id}"
            )));
        }

        let updates = Self::credit(&mut tx, &self.policy.like_received(owner_id, like.id)).await?;
        ActivityStore::append(
            &mut tx,
            &activity_now(user_id, ActivityKind::MemeLiked, Some(meme_id.into_inner())),
        )
        .await?;
        tx.commit().await.map_err(kudos_db::DbError::from)?;

        self.publish_all(updates);
        self.evaluate_badges_post_commit(owner_id).await;
        Ok(like)
    }

    /// Remove a user's like from a meme, reversing the owner's credit.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidReference`] when the meme does
    /// not exist or the user does not currently like it, or
    /// [`EngineError::Store`] on storage failure.
    pub async fn remove_like(&self, user_id: UserId, meme_id: MemeId) -> Result<(), EngineError> {
        let mut tx = self.pool.begin().await.map_err(kudos_db::DbError::from)?;

        let owner_id = InteractionStore::meme_owner(&mut tx, meme_id)
            .await?
            .ok_or_else(|| EngineError::InvalidReference(format!("meme {meme_id} not found")))?;

        let like_id = InteractionStore::remove_like(&mut tx, user_id, meme_id)
            .await?
            .ok_or_else(|| {
                EngineError::InvalidReference(format!(
                    "user {user_id} does not like meme {meme_id}"
                ))
            })?;

        // The reversal keys on the deleted like row, pairing it with
        // the credit that row earned.
        let updates = Self::credit(&mut tx, &self.policy.like_removed(owner_id, like_id)).await?;
        ActivityStore::append(
            &mut tx,
            &activity_now(user_id, ActivityKind::LikeRemoved, Some(meme_id.into_inner())),
        )
        .await?;
        tx.commit().await.map_err(kudos_db::DbError::from)?;

        self.publish_all(updates);
        Ok(())
    }

    // -----------------------------------------------------------------
    // Comments
    // -----------------------------------------------------------------

    /// Comment on a meme, crediting the commenter.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PolicyViolation`] for an empty body,
    /// [`EngineError::InvalidReference`] when the meme does not exist
    /// or `parent_id` is not a comment on the same meme, or
    /// [`EngineError::Store`] on storage failure.
    pub async fn add_comment(
        &self,
        author_id: UserId,
        meme_id: MemeId,
        parent_id: Option<CommentId>,
        body: &str,
    ) -> Result<Comment, EngineError> {
        if body.trim().is_empty() {
            return Err(EngineError::PolicyViolation(
                "comment body must not be empty".to_owned(),
            ));
        }

        let mut tx = self.pool.begin().await.map_err(kudos_db::DbError::from)?;

        InteractionStore::meme_owner(&mut tx, meme_id)
            .await?
            .ok_or_else(|| EngineError::InvalidReference(format!("meme {meme_id} not found")))?;

        if let Some(parent) = parent_id {
            if !InteractionStore::parent_on_meme(&mut tx, parent, meme_id).await? {
                return Err(EngineError::InvalidReference(format!(
                    "comment {parent} is not on meme {meme_id}"
                )));
            }
        }

        let comment = Comment {
            id: CommentId::new(),
            meme_id,
            author_id,
            parent_id,
            body: body.to_owned(),
            created_at: Utc::now(),
        };
        InteractionStore::add_comment(&mut tx, &comment).await?;

        let updates =
            Self::credit(&mut tx, &self.policy.comment_made(author_id, comment.id)).await?;
        ActivityStore::append(
            &mut tx,
            &activity_now(
                author_id,
                ActivityKind::CommentAdded,
                Some(comment.id.into_inner()),
            ),
        )
        .await?;
        tx.commit().await.map_err(kudos_db::DbError::from)?;

        self.publish_all(updates);
        self.evaluate_badges_post_commit(author_id).await;
        Ok(comment)
    }

    // -----------------------------------------------------------------
    // Logins and bonuses
    // -----------------------------------------------------------------

    /// Credit the first login of `day` and advance the login streak.
    /// Repeated calls for the same day resolve to the original outcome.
    ///
    /// Returns the user's streak after the login.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] on storage failure.
    pub async fn daily_login(&self, user_id: UserId, day: NaiveDate) -> Result<i32, EngineError> {
        let event = self.policy.daily_login(user_id, day);

        let mut tx = self.pool.begin().await.map_err(kudos_db::DbError::from)?;
        let outcome = LedgerStore::record_login(&mut tx, &event, day).await?;
        let updates = if let RecordOutcome::Applied {
            previous_total,
            new_total,
            ..
        } = outcome.record
        {
            ActivityStore::append(&mut tx, &activity_now(user_id, ActivityKind::LoggedIn, None))
                .await?;
            Self::updates_for(&mut tx, user_id, event.amount, previous_total, new_total).await?
        } else {
            Vec::new()
        };
        tx.commit().await.map_err(kudos_db::DbError::from)?;

        self.publish_all(updates);
        self.evaluate_badges_post_commit(user_id).await;
        Ok(outcome.login_streak)
    }

    /// Grant a discretionary bonus, clamped into the policy's bonus
    /// band. `source` names the originating grant and doubles as the
    /// idempotency scope: the same source never pays twice.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PolicyViolation`] for an empty source,
    /// or [`EngineError::Store`] on storage failure.
    pub async fn grant_bonus(
        &self,
        user_id: UserId,
        amount: i64,
        source: &str,
    ) -> Result<(), EngineError> {
        if source.trim().is_empty() {
            return Err(EngineError::PolicyViolation(
                "bonus source must not be empty".to_owned(),
            ));
        }
        let event = self.policy.bonus(user_id, amount, source);

        let mut tx = self.pool.begin().await.map_err(kudos_db::DbError::from)?;
        let updates = Self::credit(&mut tx, &event).await?;
        if !updates.is_empty() {
            ActivityStore::append(
                &mut tx,
                &activity_now(user_id, ActivityKind::BonusGranted, None),
            )
            .await?;
        }
        tx.commit().await.map_err(kudos_db::DbError::from)?;

        self.publish_all(updates);
        self.evaluate_badges_post_commit(user_id).await;
        Ok(())
    }

    // -----------------------------------------------------------------
    // Badges
    // -----------------------------------------------------------------

    /// Evaluate the badge catalog against the user's current stats and
    /// award anything newly satisfied. Safe to call at any time; the
    /// storage layer's conditional insert makes every award once-only
    /// even across concurrent evaluations.
    ///
    /// Returns the awards performed by this call.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] on storage failure.
    pub async fn evaluate_badges(&self, user_id: UserId) -> Result<Vec<BadgeAward>, EngineError> {
        let snapshot = StatsStore::new(&self.pool).snapshot_for(user_id).await?;
        let held: BTreeSet<String> = BadgeStore::new(&self.pool)
            .slugs_for(user_id)
            .await?
            .into_iter()
            .collect();

        let mut awarded = Vec::new();
        for spec in newly_satisfied(&self.catalog, &snapshot, &held) {
            let award = BadgeAward {
                user_id,
                badge_slug: spec.slug.clone(),
                awarded_at: Utc::now(),
            };

            let mut tx = self.pool.begin().await.map_err(kudos_db::DbError::from)?;
            let fresh = BadgeStore::try_award(&mut tx, &award).await?;
            if fresh {
                ActivityStore::append(
                    &mut tx,
                    &activity_now(user_id, ActivityKind::BadgeEarned, None),
                )
                .await?;
            }
            tx.commit().await.map_err(kudos_db::DbError::from)?;

            if fresh {
                tracing::info!(user_id = %user_id, badge = %spec.slug, "Awarded badge");
                self.bus.publish(EngagementUpdate::BadgeEarned {
                    user_id,
                    badge_slug: spec.slug.clone(),
                });
                awarded.push(award);
            }
        }
        Ok(awarded)
    }

    /// The badges a user holds, in award order.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] on storage failure.
    pub async fn badges_for(&self, user_id: UserId) -> Result<Vec<BadgeAward>, EngineError> {
        Ok(BadgeStore::new(&self.pool).awards_for(user_id).await?)
    }

    // -----------------------------------------------------------------
    // Rankings and feeds
    // -----------------------------------------------------------------

    /// A page of the leaderboard, positions starting at 1.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] on storage failure.
    pub async fn leaderboard(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LeaderboardEntry>, EngineError> {
        Ok(RankingsStore::new(&self.pool).top_by_points(limit, offset).await?)
    }

    /// Trending memes computed live over the configured window.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] on storage failure.
    pub async fn trending(&self, limit: i64) -> Result<Vec<TrendingScore>, EngineError> {
        let cutoff = self.window_cutoff();
        Ok(RankingsStore::new(&self.pool)
            .trending_live(cutoff, self.trending_window_hours, limit)
            .await?)
    }

    /// Trending memes from the materialized view, refreshed by
    /// [`Self::refresh_trending`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] on storage failure.
    pub async fn trending_cached(&self, limit: i64) -> Result<Vec<TrendingScore>, EngineError> {
        Ok(RankingsStore::new(&self.pool).cached_trending(limit).await?)
    }

    /// Rebuild the materialized trending view. Returns the number of
    /// memes scored.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] on storage failure.
    pub async fn refresh_trending(&self) -> Result<u64, EngineError> {
        let cutoff = self.window_cutoff();
        Ok(RankingsStore::new(&self.pool)
            .rebuild_trending(cutoff, self.trending_window_hours)
            .await?)
    }

    /// The most recent activity entries for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] on storage failure.
    pub async fn recent_activity(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> Result<Vec<Activity>, EngineError> {
        Ok(ActivityStore::new(&self.pool).recent_for_user(user_id, limit).await?)
    }

    /// A consistent snapshot of a user's engagement counters.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] on storage failure.
    pub async fn stats_for(&self, user_id: UserId) -> Result<StatsSnapshot, EngineError> {
        Ok(StatsStore::new(&self.pool).snapshot_for(user_id).await?)
    }

    /// Rank and level progression for a user's profile page.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] on storage failure.
    pub async fn progress_for(
        &self,
        user_id: UserId,
    ) -> Result<(NextRankInfo, LevelInfo), EngineError> {
        let points = LedgerStore::new(&self.pool).balance_of(user_id).await?;
        Ok((next_rank_info(points), level_for_points(points)))
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    /// Start of the trending window. An out-of-range window (only
    /// possible with an absurd configured width) falls back to the
    /// epoch floor, which counts every interaction.
    fn window_cutoff(&self) -> DateTime<Utc> {
        Utc::now()
            .checked_sub_signed(Duration::hours(self.trending_window_hours))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Badge evaluation after a committed mutation. The action has
    /// already durably succeeded, so a storage failure here must not
    /// turn into the caller's error (a retry would repeat the whole
    /// action); it is logged, and the next evaluation for this user
    /// picks the award up.
    async fn evaluate_badges_post_commit(&self, user_id: UserId) {
        if let Err(error) = self.evaluate_badges(user_id).await {
            tracing::warn!(user_id = %user_id, %error, "Post-commit badge evaluation failed");
        }
    }

    /// Record a credit inside the caller's transaction and collect the
    /// updates to publish after commit. An already-settled key yields
    /// no updates.
    async fn credit(
        conn: &mut PgConnection,
        event: &PointEvent,
    ) -> Result<Vec<EngagementUpdate>, EngineError> {
        match LedgerStore::record(conn, event).await? {
            RecordOutcome::Applied {
                previous_total,
                new_total,
                ..
            } => {
                Self::updates_for(conn, event.user_id, event.amount, previous_total, new_total)
                    .await
            }
            RecordOutcome::AlreadyApplied { .. } => Ok(Vec::new()),
        }
    }

    /// Build post-commit updates for an applied credit, appending a
    /// rank-change activity when the balance crossed a threshold.
    async fn updates_for(
        conn: &mut PgConnection,
        user_id: UserId,
        amount: i64,
        previous_total: i64,
        new_total: i64,
    ) -> Result<Vec<EngagementUpdate>, EngineError> {
        let mut updates = vec![EngagementUpdate::PointsAwarded {
            user_id,
            amount,
            new_total,
        }];

        let from = Rank::for_points(previous_total);
        let to = Rank::for_points(new_total);
        if from != to {
            ActivityStore::append(conn, &activity_now(user_id, ActivityKind::RankChanged, None))
                .await?;
            tracing::info!(user_id = %user_id, from = %from, to = %to, "Rank changed");
            updates.push(EngagementUpdate::RankChanged { user_id, from, to });
        }
        Ok(updates)
    }

    fn publish_all(&self, updates: Vec<EngagementUpdate>) {
        for update in updates {
            self.bus.publish(update);
        }
    }
}
