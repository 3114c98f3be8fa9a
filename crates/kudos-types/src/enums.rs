//! Enumeration types for the Kudos engagement engine.
//!
//! Closed sets of reasons, ranks, categories, and activity kinds. The
//! database-side string representations live in `kudos-db`, next to
//! the queries that use them.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Point transaction reasons
// ---------------------------------------------------------------------------

/// Why a point transaction was recorded.
///
/// Every ledger entry carries exactly one reason. Reasons are audit
/// metadata; the credited amount is decided by the point policy at
/// event-construction time and stored alongside the reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum PointReason {
    /// The user created a meme (+10, credited to the creator).
    MemeCreated,
    /// Someone liked the user's meme (+5, credited to the meme owner).
    LikeReceived,
    /// The user commented on a meme (+2, credited to the commenter).
    CommentMade,
    /// First login of a calendar day (+1).
    DailyLogin,
    /// A caller-specified bonus (+20 to +100, audited).
    Bonus,
    /// A like was removed; reverses the earlier credit (-5).
    LikeRemovedReversal,
}

// ---------------------------------------------------------------------------
// Ranks
// ---------------------------------------------------------------------------

/// A discrete tier derived deterministically from total points.
///
/// Rank is a monotonic step function of the balance: increasing
/// total points never decreases rank. Ties at a threshold resolve
/// toward the higher rank (`>=` comparison).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Rank {
    /// 0 or more points.
    Newbie,
    /// 50 or more points.
    RookieMemer,
    /// 200 or more points.
    MemeEnthusiast,
    /// 500 or more points.
    ProMemer,
    /// 1000 or more points.
    MemeLegend,
}

impl Rank {
    /// All ranks in ascending threshold order.
    pub const ALL: [Self; 5] = [
        Self::Newbie,
        Self::RookieMemer,
        Self::MemeEnthusiast,
        Self::ProMemer,
        Self::MemeLegend,
    ];

    /// The minimum point balance required to hold this rank.
    pub const fn points_required(self) -> i64 {
        match self {
            Self::Newbie => 0,
            Self::RookieMemer => 50,
            Self::MemeEnthusiast => 200,
            Self::ProMemer => 500,
            Self::MemeLegend => 1000,
        }
    }

    /// Compute the rank for a given point balance.
    ///
    /// Negative balances (possible only transiently, e.g. a reversal
    /// racing a fresh account) map to [`Rank::Newbie`].
    pub const fn for_points(points: i64) -> Self {
        if points >= Self::MemeLegend.points_required() {
            Self::MemeLegend
        } else if points >= Self::ProMemer.points_required() {
            Self::ProMemer
        } else if points >= Self::MemeEnthusiast.points_required() {
            Self::MemeEnthusiast
        } else if points >= Self::RookieMemer.points_required() {
            Self::RookieMemer
        } else {
            Self::Newbie
        }
    }

    /// The next rank above this one, or `None` at the top tier.
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Newbie => Some(Self::RookieMemer),
            Self::RookieMemer => Some(Self::MemeEnthusiast),
            Self::MemeEnthusiast => Some(Self::ProMemer),
            Self::ProMemer => Some(Self::MemeLegend),
            Self::MemeLegend => None,
        }
    }

    /// Human-readable rank title.
    pub const fn title(self) -> &'static str {
        match self {
            Self::Newbie => "Newbie",
            Self::RookieMemer => "Rookie Memer",
            Self::MemeEnthusiast => "Meme Enthusiast",
            Self::ProMemer => "Pro Memer",
            Self::MemeLegend => "Meme Legend",
        }
    }
}

impl core::fmt::Display for Rank {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.title())
    }
}

// ---------------------------------------------------------------------------
// Badge categories
// ---------------------------------------------------------------------------

/// The classification of a badge.
///
/// Categories group badges for display only; they do not change
/// evaluation semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum BadgeCategory {
    /// Earned by creating memes.
    Creator,
    /// Earned by participating in discussions.
    Social,
    /// Earned by reaching popularity or point milestones.
    Achievement,
    /// Earned by sustained activity over time (streaks).
    TimeBased,
    /// Earned by a high likes-per-meme ratio.
    Quality,
}

// ---------------------------------------------------------------------------
// Activity kinds
// ---------------------------------------------------------------------------

/// The kind of a user-visible activity log entry.
///
/// The activity log is display/audit only; it is never an input to
/// point or badge computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ActivityKind {
    /// The user created a meme.
    MemeCreated,
    /// The user liked a meme.
    MemeLiked,
    /// The user removed a like.
    LikeRemoved,
    /// The user commented on a meme.
    CommentAdded,
    /// The user logged in (first login of the day).
    LoggedIn,
    /// The user received a bonus.
    BonusGranted,
    /// The user's rank changed.
    RankChanged,
    /// The user earned a badge.
    BadgeEarned,
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    #[test]
    fn rank_thresholds_match_table() {
        assert_eq!(Rank::for_points(0), Rank::Newbie);
        assert_eq!(Rank::for_points(49), Rank::Newbie);
        assert_eq!(Rank::for_points(50), Rank::RookieMemer);
        assert_eq!(Rank::for_points(200), Rank::MemeEnthusiast);
        assert_eq!(Rank::for_points(499), Rank::MemeEnthusiast);
        assert_eq!(Rank::for_points(500), Rank::ProMemer);
        assert_eq!(Rank::for_points(1000), Rank::MemeLegend);
        assert_eq!(Rank::for_points(1_000_000), Rank::MemeLegend);
    }

    #[test]
    fn rank_is_monotonic_in_points() {
        let mut previous = Rank::for_points(-10);
        for points in -10..1200 {
            let rank = Rank::for_points(points);
            assert!(rank >= previous, "rank decreased at {points} points");
            previous = rank;
        }
    }

    #[test]
    fn negative_balance_is_newbie() {
        assert_eq!(Rank::for_points(-5), Rank::Newbie);
    }

    #[test]
    fn rank_next_chain_terminates_at_legend() {
        let mut rank = Rank::Newbie;
        let mut hops = 0;
        while let Some(next) = rank.next() {
            assert!(next > rank);
            rank = next;
            hops += 1;
        }
        assert_eq!(rank, Rank::MemeLegend);
        assert_eq!(hops, 4);
    }

    #[test]
    fn rank_titles_are_stable() {
        assert_eq!(Rank::RookieMemer.to_string(), "Rookie Memer");
        assert_eq!(Rank::MemeLegend.title(), "Meme Legend");
    }
}
