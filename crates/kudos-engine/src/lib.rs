//! Engagement engine for the Kudos meme platform.
//!
//! Wires the pure rules from `kudos-core` to the `PostgreSQL` stores
//! in `kudos-db` and exposes one method per user-facing action:
//! register, create meme, like, unlike, comment, daily login, bonus
//! grant, plus the read surfaces (profile, stats, badges, leaderboard,
//! trending, activity feed).
//!
//! # Modules
//!
//! - [`engine`] -- The [`engine::EngagementEngine`] orchestrator
//! - [`notify`] -- Best-effort post-commit update broadcasting
//! - [`config`] -- YAML configuration loading
//! - [`error`] -- Engine error types

pub mod config;
pub mod engine;
pub mod error;
pub mod notify;

// Re-export primary types for convenience.
pub use config::{ConfigError, EngineConfig, InfrastructureConfig, TrendingConfig};
pub use engine::EngagementEngine;
pub use error::EngineError;
pub use notify::{EngagementUpdate, UpdateBus};
