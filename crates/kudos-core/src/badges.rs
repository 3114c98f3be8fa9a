//! Badge criteria, the default catalog, and snapshot evaluation.
//!
//! A badge is a pure predicate over a read-only [`StatsSnapshot`].
//! Criteria form a closed set of tagged variants, so new badges are
//! added by extending the catalog (data), not by branching logic in
//! the evaluator. The catalog ships with defaults and can be replaced
//! wholesale from configuration; criteria deserialize via serde.
//!
//! Awarding is not done here: the evaluator only reports which badges
//! are *newly* satisfied, and `kudos-db` performs the conditional
//! insert guarded by the `(user, badge)` uniqueness invariant.

use std::collections::BTreeSet;

use serde::Deserialize;

use kudos_types::{BadgeCategory, StatsSnapshot};

// ---------------------------------------------------------------------------
// Criteria
// ---------------------------------------------------------------------------

/// A counter in the statistics snapshot that threshold criteria can
/// target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum StatCounter {
    /// Total memes created.
    MemesCreated,
    /// Total likes currently held across the user's memes.
    LikesReceived,
    /// Total comments made.
    CommentsMade,
    /// Current point balance.
    TotalPoints,
}

impl StatCounter {
    /// Read this counter out of a snapshot.
    const fn read(self, snapshot: &StatsSnapshot) -> i64 {
        match self {
            Self::MemesCreated => snapshot.memes_created,
            Self::LikesReceived => snapshot.likes_received,
            Self::CommentsMade => snapshot.comments_made,
            Self::TotalPoints => snapshot.total_points,
        }
    }
}

/// The closed set of badge predicates.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub enum BadgeCriteria {
    /// A snapshot counter is at or above a threshold.
    CounterAtLeast {
        /// The counter to read.
        counter: StatCounter,
        /// Inclusive threshold.
        threshold: i64,
    },
    /// The consecutive-day login streak is at or above a length.
    StreakAtLeast {
        /// Inclusive streak length in days.
        days: i32,
    },
    /// The user averages at least `likes_per_meme` likes per created
    /// meme, having created at least `min_memes` memes. Evaluated in
    /// integer arithmetic: `likes_received >= likes_per_meme * memes`.
    LikeRatioAtLeast {
        /// Required average likes per meme.
        likes_per_meme: i64,
        /// Minimum meme count before the ratio is meaningful.
        min_memes: i64,
    },
    /// Every inner criterion is satisfied.
    AllOf {
        /// The composed criteria.
        all: Vec<BadgeCriteria>,
    },
}

impl BadgeCriteria {
    /// Evaluate this predicate against a snapshot.
    pub fn satisfied_by(&self, snapshot: &StatsSnapshot) -> bool {
        match self {
            Self::CounterAtLeast { counter, threshold } => counter.read(snapshot) >= *threshold,
            Self::StreakAtLeast { days } => snapshot.login_streak >= *days,
            Self::LikeRatioAtLeast {
                likes_per_meme,
                min_memes,
            } => {
                snapshot.memes_created >= *min_memes
                    && snapshot.likes_received
                        >= snapshot.memes_created.saturating_mul(*likes_per_meme)
            }
            Self::AllOf { all } => all.iter().all(|c| c.satisfied_by(snapshot)),
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// A badge definition: stable slug, display metadata, and criteria.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BadgeSpec {
    /// Stable catalog key; what `badge_awards` stores.
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Display description.
    pub description: String,
    /// Classification only; does not change evaluation.
    pub category: BadgeCategory,
    /// The predicate.
    pub criteria: BadgeCriteria,
}

/// Shorthand for a counter-threshold badge spec.
fn counter_badge(
    slug: &str,
    name: &str,
    description: &str,
    category: BadgeCategory,
    counter: StatCounter,
    threshold: i64,
) -> BadgeSpec {
    BadgeSpec {
        slug: slug.to_owned(),
        name: name.to_owned(),
        description: description.to_owned(),
        category,
        criteria: BadgeCriteria::CounterAtLeast { counter, threshold },
    }
}

/// The built-in badge catalog.
///
/// Thresholds follow the original badge table; predicates the snapshot
/// counters cannot express (weekend/night activity, template usage)
/// are deliberately absent rather than approximated.
pub fn default_catalog() -> Vec<BadgeSpec> {
    use BadgeCategory::{Achievement, Creator, Quality, Social, TimeBased};
    use StatCounter::{CommentsMade, LikesReceived, MemesCreated, TotalPoints};

    vec![
        // Creation badges.
        counter_badge("first-steps", "First Steps", "Created your first meme", Creator, MemesCreated, 1),
        counter_badge("getting-started", "Getting Started", "Created 5 memes", Creator, MemesCreated, 5),
        counter_badge("meme-machine", "Meme Machine", "Created 25 memes", Creator, MemesCreated, 25),
        counter_badge("prolific-creator", "Prolific Creator", "Created 50 memes", Creator, MemesCreated, 50),
        counter_badge("meme-master", "Meme Master", "Created 100 memes", Creator, MemesCreated, 100),
        // Popularity badges.
        counter_badge("first-fan", "First Fan", "Received your first like", Achievement, LikesReceived, 1),
        counter_badge("rising-star", "Rising Star", "Received 25 likes", Achievement, LikesReceived, 25),
        counter_badge("popular", "Popular", "Received 100 likes", Achievement, LikesReceived, 100),
        counter_badge("viral-sensation", "Viral Sensation", "Received 500 likes", Achievement, LikesReceived, 500),
        counter_badge("internet-famous", "Internet Famous", "Received 1000 likes", Achievement, LikesReceived, 1000),
        // Engagement badges.
        counter_badge("commentator", "Commentator", "Made 10 comments", Social, CommentsMade, 10),
        counter_badge("social-butterfly", "Social Butterfly", "Made 50 comments", Social, CommentsMade, 50),
        counter_badge("community-helper", "Community Helper", "Made 100 comments", Social, CommentsMade, 100),
        // Time-based badges.
        BadgeSpec {
            slug: "early-bird".to_owned(),
            name: "Early Bird".to_owned(),
            description: "7-day login streak".to_owned(),
            category: TimeBased,
            criteria: BadgeCriteria::StreakAtLeast { days: 7 },
        },
        // Quality badges.
        BadgeSpec {
            slug: "quality-creator".to_owned(),
            name: "Quality Creator".to_owned(),
            description: "Averages 10+ likes per meme".to_owned(),
            category: Quality,
            criteria: BadgeCriteria::LikeRatioAtLeast {
                likes_per_meme: 10,
                min_memes: 1,
            },
        },
        // Point milestone.
        counter_badge("meme-royalty", "Meme Royalty", "Reached 1000 points", Achievement, TotalPoints, 1000),
    ]
}

/// Return the catalog badges that `snapshot` satisfies and that are
/// not in `held` (the user's existing award slugs).
///
/// Exactly-once awarding is *not* guaranteed here: two concurrent
/// evaluations can both report the same badge. The storage layer's
/// conditional insert settles that race; this function only keeps the
/// common case cheap.
pub fn newly_satisfied<'a>(
    catalog: &'a [BadgeSpec],
    snapshot: &StatsSnapshot,
    held: &BTreeSet<String>,
) -> Vec<&'a BadgeSpec> {
    catalog
        .iter()
        .filter(|spec| !held.contains(&spec.slug))
        .filter(|spec| spec.criteria.satisfied_by(snapshot))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kudos_types::{Rank, UserId};

    fn snapshot(memes: i64, likes: i64, comments: i64, streak: i32, points: i64) -> StatsSnapshot {
        StatsSnapshot {
            user_id: UserId::new(),
            memes_created: memes,
            likes_received: likes,
            comments_made: comments,
            login_streak: streak,
            total_points: points,
            rank: Rank::for_points(points),
        }
    }

    #[test]
    fn catalog_slugs_are_unique() {
        let catalog = default_catalog();
        let slugs: BTreeSet<&str> = catalog.iter().map(|s| s.slug.as_str()).collect();
        assert_eq!(slugs.len(), catalog.len());
        assert_eq!(catalog.len(), 16);
    }

    #[test]
    fn first_meme_satisfies_first_steps_only_once() {
        let catalog = default_catalog();
        let stats = snapshot(1, 0, 0, 1, 10);

        let fresh = newly_satisfied(&catalog, &stats, &BTreeSet::new());
        assert!(fresh.iter().any(|b| b.slug == "first-steps"));

        // A second evaluation after another meme does not re-award.
        let held: BTreeSet<String> = fresh.iter().map(|b| b.slug.clone()).collect();
        let again = newly_satisfied(&catalog, &snapshot(2, 0, 0, 1, 20), &held);
        assert!(!again.iter().any(|b| b.slug == "first-steps"));
    }

    #[test]
    fn streak_badge_requires_seven_days() {
        let catalog = default_catalog();
        let six = newly_satisfied(&catalog, &snapshot(0, 0, 0, 6, 6), &BTreeSet::new());
        assert!(!six.iter().any(|b| b.slug == "early-bird"));
        let seven = newly_satisfied(&catalog, &snapshot(0, 0, 0, 7, 7), &BTreeSet::new());
        assert!(seven.iter().any(|b| b.slug == "early-bird"));
    }

    #[test]
    fn like_ratio_needs_at_least_one_meme() {
        let none = BadgeCriteria::LikeRatioAtLeast {
            likes_per_meme: 10,
            min_memes: 1,
        };
        // Plenty of likes but no memes: predicate is false.
        assert!(!none.satisfied_by(&snapshot(0, 50, 0, 0, 0)));
        // 2 memes, 20 likes: exactly on the ratio.
        assert!(none.satisfied_by(&snapshot(2, 20, 0, 0, 0)));
        // 3 memes, 20 likes: below the ratio.
        assert!(!none.satisfied_by(&snapshot(3, 20, 0, 0, 0)));
    }

    #[test]
    fn all_of_composes() {
        let composite = BadgeCriteria::AllOf {
            all: vec![
                BadgeCriteria::CounterAtLeast {
                    counter: StatCounter::MemesCreated,
                    threshold: 5,
                },
                BadgeCriteria::StreakAtLeast { days: 3 },
            ],
        };
        assert!(composite.satisfied_by(&snapshot(5, 0, 0, 3, 0)));
        assert!(!composite.satisfied_by(&snapshot(5, 0, 0, 2, 0)));
        assert!(!composite.satisfied_by(&snapshot(4, 0, 0, 3, 0)));
    }

    #[test]
    fn criteria_deserialize_from_config() {
        let json = r#"{
            "slug": "night-owl",
            "name": "Night Owl",
            "description": "Custom badge",
            "category": "TimeBased",
            "criteria": {"StreakAtLeast": {"days": 30}}
        }"#;
        let spec: Result<BadgeSpec, _> = serde_json::from_str(json);
        assert_eq!(
            spec.ok().map(|s| s.criteria),
            Some(BadgeCriteria::StreakAtLeast { days: 30 }),
        );
    }

    #[test]
    fn categories_do_not_change_evaluation() {
        let mut spec = counter_badge(
            "x", "X", "x", BadgeCategory::Creator, StatCounter::MemesCreated, 1,
        );
        let stats = snapshot(1, 0, 0, 0, 0);
        assert!(spec.criteria.satisfied_by(&stats));
        spec.category = BadgeCategory::Quality;
        assert!(spec.criteria.satisfied_by(&stats));
    }
}
