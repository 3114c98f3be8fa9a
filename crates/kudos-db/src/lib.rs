//! Persistence layer for the Kudos engagement engine (`PostgreSQL`).
//!
//! `PostgreSQL` is the single source of truth. The ledger and the
//! activity feed are append-only; balances, ranks, and interaction
//! counts are denormalized aggregates updated in the same transaction
//! as the write that changes them. Race conditions (double likes,
//! replayed credits, repeated badge awards) are settled by unique
//! constraints, never by application-level locking.
//!
//! # Architecture
//!
//! ```text
//! Engine operation (one DB transaction)
//!     |-- InteractionStore  (memes, likes, comments)
//!     |-- LedgerStore       (point_transactions + users balance/rank)
//!     +-- ActivityStore     (append-only activity feed)
//!
//! Read paths
//!     |-- UserStore         (profiles)
//!     |-- StatsStore        (per-user aggregate snapshot)
//!     |-- BadgeStore        (awards held)
//!     +-- RankingsStore     (leaderboard + trending, live or cached)
//! ```
//!
//! # Modules
//!
//! - [`postgres`] -- `PostgreSQL` connection pool and configuration
//! - [`user_store`] -- Registration and profile reads
//! - [`ledger_store`] -- Idempotent point recording and balance reads
//! - [`interaction_store`] -- Memes, likes, and comments
//! - [`badge_store`] -- Once-only badge awards
//! - [`activity_store`] -- Append-only activity feed
//! - [`stats_store`] -- Per-user engagement snapshots
//! - [`rankings_store`] -- Leaderboard and trending queries
//! - [`error`] -- Shared error types

pub mod activity_store;
pub mod badge_store;
pub mod error;
pub mod interaction_store;
pub mod ledger_store;
pub mod postgres;
pub mod rankings_store;
pub mod stats_store;
pub mod user_store;

mod convert;

// Re-export primary types for convenience.
pub use activity_store::{ActivityStore, activity_now};
pub use badge_store::BadgeStore;
pub use error::{DbError, is_unique_violation};
pub use interaction_store::InteractionStore;
pub use ledger_store::{LedgerStore, LoginOutcome, RecordOutcome};
pub use postgres::{PostgresConfig, PostgresPool};
pub use rankings_store::RankingsStore;
pub use stats_store::StatsStore;
pub use user_store::UserStore;
