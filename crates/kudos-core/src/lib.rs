//! Point policy, rank progression, badge rules, and trending math for
//! the Kudos engagement engine.
//!
//! Everything in this crate is pure: no I/O, no clocks it does not
//! receive as arguments, no storage. The durable semantics live in
//! `kudos-db`; this crate decides *what* a user action is worth, *which*
//! rank a balance maps to, *whether* a badge predicate is satisfied,
//! and *how* a trending score is computed -- and provides an in-memory
//! reference ledger against which those semantics are property-tested.
//!
//! # Modules
//!
//! - [`points`] -- The [`PointPolicy`]: per-reason amounts, bonus
//!   clamping, milestone schedule, and idempotency-key construction.
//! - [`ledger`] -- The [`PointLedger`] reference model: append-only
//!   log with at-most-once application per idempotency key.
//! - [`rank`] -- Rank progression helpers (next rank, level).
//! - [`badges`] -- Tagged badge criteria, the default catalog, and
//!   snapshot evaluation.
//! - [`trending`] -- Windowed weighted interaction scores, computed
//!   both incrementally and by full recomputation.
//!
//! # Invariants
//!
//! For every user U at all times:
//!
//! ```text
//! balance(U) == sum(amount for t in ledger where t.user == U)
//! ```
//!
//! Applying an event whose idempotency key is already present is a
//! defined no-op success, never an error, and never changes a balance.

pub mod badges;
pub mod ledger;
pub mod points;
pub mod rank;
pub mod trending;

// Re-export primary types at crate root.
pub use badges::{BadgeCriteria, BadgeSpec, StatCounter, default_catalog, newly_satisfied};
pub use ledger::{ApplyOutcome, PointLedger};
pub use points::PointPolicy;
pub use rank::{LevelInfo, NextRankInfo, level_for_points, next_rank_info};
pub use trending::{
    Interaction, InteractionKind, TrendingAccumulator, TrendingWindow, compute_scores, ranked,
};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when constructing or applying point events.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// A point event must move a non-zero amount.
    #[error("point event amount must be non-zero")]
    ZeroAmount,

    /// A point event must carry an idempotency key.
    #[error("point event idempotency key must not be empty")]
    EmptyIdempotencyKey,
}
