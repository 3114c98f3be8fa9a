//! Shared type definitions for the Kudos engagement engine.
//!
//! This crate is the single source of truth for all types used across
//! the Kudos workspace. Types defined here flow downstream to
//! `TypeScript` via `ts-rs` for the presentation layer.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all entity identifiers
//! - [`enums`] -- Enumeration types (reasons, ranks, categories, kinds)
//! - [`structs`] -- Core entity structs (users, memes, ledger, views)

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{ActivityKind, BadgeCategory, PointReason, Rank};
pub use ids::{ActivityId, CommentId, LikeId, MemeId, TransactionId, UserId};
pub use structs::{
    Activity, BadgeAward, Comment, LeaderboardEntry, Like, Meme, PointEvent, PointTransaction,
    StatsSnapshot, TrendingScore, User,
};

#[cfg(test)]
mod tests {
    //! Integration tests for type exports and `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs generates TypeScript bindings when types with
        // #[ts(export)] are used. Importing them here triggers generation.
        // The actual files are written to the `bindings/` directory
        // relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::UserId::export_all();
        let _ = crate::ids::MemeId::export_all();
        let _ = crate::ids::LikeId::export_all();
        let _ = crate::ids::CommentId::export_all();
        let _ = crate::ids::TransactionId::export_all();
        let _ = crate::ids::ActivityId::export_all();

        // Enums
        let _ = crate::enums::PointReason::export_all();
        let _ = crate::enums::Rank::export_all();
        let _ = crate::enums::BadgeCategory::export_all();
        let _ = crate::enums::ActivityKind::export_all();

        // Structs
        let _ = crate::structs::User::export_all();
        let _ = crate::structs::Meme::export_all();
        let _ = crate::structs::Like::export_all();
        let _ = crate::structs::Comment::export_all();
        let _ = crate::structs::PointTransaction::export_all();
        let _ = crate::structs::BadgeAward::export_all();
        let _ = crate::structs::Activity::export_all();
        let _ = crate::structs::StatsSnapshot::export_all();
        let _ = crate::structs::LeaderboardEntry::export_all();
        let _ = crate::structs::TrendingScore::export_all();
    }
}
