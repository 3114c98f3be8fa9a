//! Conversions between domain enums and their `PostgreSQL` enum
//! strings, shared by the stores.

use kudos_types::{ActivityKind, PointReason, Rank};

/// Convert a [`PointReason`] to its `PostgreSQL` enum string.
pub(crate) const fn reason_to_db(reason: PointReason) -> &'static str {
    match reason {
        PointReason::MemeCreated => "meme_created",
        PointReason::LikeReceived => "like_received",
        PointReason::CommentMade => "comment_made",
        PointReason::DailyLogin => "daily_login",
        PointReason::Bonus => "bonus",
        PointReason::LikeRemovedReversal => "like_removed_reversal",
    }
}

/// Parse a `PostgreSQL` `point_reason` string. Unknown strings map to
/// `None` so a schema drift surfaces as a typed failure, not a panic.
pub(crate) fn reason_from_db(value: &str) -> Option<PointReason> {
    match value {
        "meme_created" => Some(PointReason::MemeCreated),
        "like_received" => Some(PointReason::LikeReceived),
        "comment_made" => Some(PointReason::CommentMade),
        "daily_login" => Some(PointReason::DailyLogin),
        "bonus" => Some(PointReason::Bonus),
        "like_removed_reversal" => Some(PointReason::LikeRemovedReversal),
        _ => None,
    }
}

/// Convert a [`Rank`] to its `PostgreSQL` enum string.
pub(crate) const fn rank_to_db(rank: Rank) -> &'static str {
    match rank {
        Rank::Newbie => "newbie",
        Rank::RookieMemer => "rookie_memer",
        Rank::MemeEnthusiast => "meme_enthusiast",
        Rank::ProMemer => "pro_memer",
        Rank::MemeLegend => "meme_legend",
    }
}

/// Parse a `PostgreSQL` `user_rank` string.
pub(crate) fn rank_from_db(value: &str) -> Option<Rank> {
    match value {
        "newbie" => Some(Rank::Newbie),
        "rookie_memer" => Some(Rank::RookieMemer),
        "meme_enthusiast" => Some(Rank::MemeEnthusiast),
        "pro_memer" => Some(Rank::ProMemer),
        "meme_legend" => Some(Rank::MemeLegend),
        _ => None,
    }
}

/// Convert an [`ActivityKind`] to its `PostgreSQL` enum string.
pub(crate) const fn kind_to_db(kind: ActivityKind) -> &'static str {
    match kind {
        ActivityKind::MemeCreated => "meme_created",
        ActivityKind::MemeLiked => "meme_liked",
        ActivityKind::LikeRemoved => "like_removed",
        ActivityKind::CommentAdded => "comment_added",
        ActivityKind::LoggedIn => "logged_in",
        ActivityKind::BonusGranted => "bonus_granted",
        ActivityKind::RankChanged => "rank_changed",
        ActivityKind::BadgeEarned => "badge_earned",
    }
}

/// Parse a `PostgreSQL` `activity_kind` string.
pub(crate) fn kind_from_db(value: &str) -> Option<ActivityKind> {
    match value {
        "meme_created" => Some(ActivityKind::MemeCreated),
        "meme_liked" => Some(ActivityKind::MemeLiked),
        "like_removed" => Some(ActivityKind::LikeRemoved),
        "comment_added" => Some(ActivityKind::CommentAdded),
        "logged_in" => Some(ActivityKind::LoggedIn),
        "bonus_granted" => Some(ActivityKind::BonusGranted),
        "rank_changed" => Some(ActivityKind::RankChanged),
        "badge_earned" => Some(ActivityKind::BadgeEarned),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_strings_roundtrip() {
        for reason in [
            PointReason::MemeCreated,
            PointReason::LikeReceived,
            PointReason::CommentMade,
            PointReason::DailyLogin,
            PointReason::Bonus,
            PointReason::LikeRemovedReversal,
        ] {
            assert_eq!(reason_from_db(reason_to_db(reason)), Some(reason));
        }
    }

    #[test]
    fn rank_strings_roundtrip() {
        for rank in Rank::ALL {
            assert_eq!(rank_from_db(rank_to_db(rank)), Some(rank));
        }
    }

    #[test]
    fn unknown_strings_are_none() {
        assert_eq!(reason_from_db("gather"), None);
        assert_eq!(rank_from_db(""), None);
        assert_eq!(kind_from_db("tick_start"), None);
    }
}
