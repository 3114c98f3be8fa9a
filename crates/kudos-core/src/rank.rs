//! Rank and level progression helpers for profile display.
//!
//! Rank itself is defined on [`Rank`] in `kudos-types`; this module
//! adds the presentation-facing derivations: how far a user is from
//! the next rank, and the 100-points-per-level progress bar.

use serde::Serialize;

use kudos_types::Rank;

/// Points per level for the linear level curve.
const POINTS_PER_LEVEL: i64 = 100;

/// Progress from the current rank toward the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NextRankInfo {
    /// The rank held at `current_points`.
    pub current_rank: Rank,
    /// Balance the info was computed for.
    pub current_points: i64,
    /// The next rank, or `None` at the top tier.
    pub next_rank: Option<Rank>,
    /// Threshold of the next rank, if any.
    pub next_threshold: Option<i64>,
    /// Points still needed to reach the next rank, if any.
    pub points_needed: Option<i64>,
}

/// Level progress derived from the balance: one level per 100 points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelInfo {
    /// Level number, starting at 1.
    pub level: i64,
    /// Points accumulated within the current level.
    pub points_in_level: i64,
    /// Points remaining until the next level.
    pub points_to_next: i64,
}

/// Compute rank progression for a balance.
///
/// At the top tier `next_rank`, `next_threshold`, and `points_needed`
/// are all `None`.
pub fn next_rank_info(points: i64) -> NextRankInfo {
    let current_rank = Rank::for_points(points);
    let next_rank = current_rank.next();
    let next_threshold = next_rank.map(Rank::points_required);
    let points_needed = next_threshold.map(|t| t.saturating_sub(points).max(0));
    NextRankInfo {
        current_rank,
        current_points: points,
        next_rank,
        next_threshold,
        points_needed,
    }
}

/// Compute level progress for a balance. Negative balances clamp to
/// level 1 with no progress.
pub fn level_for_points(points: i64) -> LevelInfo {
    let points = points.max(0);
    let level = points.div_euclid(POINTS_PER_LEVEL).saturating_add(1);
    let points_in_level = points.rem_euclid(POINTS_PER_LEVEL);
    LevelInfo {
        level,
        points_in_level,
        points_to_next: POINTS_PER_LEVEL.saturating_sub(points_in_level),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newbie_progresses_toward_rookie() {
        let info = next_rank_info(10);
        assert_eq!(info.current_rank, Rank::Newbie);
        assert_eq!(info.next_rank, Some(Rank::RookieMemer));
        assert_eq!(info.next_threshold, Some(50));
        assert_eq!(info.points_needed, Some(40));
    }

    #[test]
    fn threshold_point_belongs_to_the_higher_rank() {
        let info = next_rank_info(50);
        assert_eq!(info.current_rank, Rank::RookieMemer);
        assert_eq!(info.points_needed, Some(150));
    }

    #[test]
    fn top_tier_has_no_next_rank() {
        let info = next_rank_info(5000);
        assert_eq!(info.current_rank, Rank::MemeLegend);
        assert_eq!(info.next_rank, None);
        assert_eq!(info.points_needed, None);
    }

    #[test]
    fn levels_step_every_hundred_points() {
        assert_eq!(level_for_points(0).level, 1);
        assert_eq!(level_for_points(99).level, 1);
        assert_eq!(level_for_points(100).level, 2);
        assert_eq!(level_for_points(250).level, 3);
        assert_eq!(level_for_points(250).points_in_level, 50);
        assert_eq!(level_for_points(250).points_to_next, 50);
    }

    #[test]
    fn negative_balance_clamps_to_level_one() {
        let info = level_for_points(-40);
        assert_eq!(info.level, 1);
        assert_eq!(info.points_in_level, 0);
    }
}
