//! Error types for the engagement engine.

use kudos_db::DbError;

/// Errors surfaced by engine operations.
///
/// Replays of already-settled work are not errors: they resolve to
/// their original outcome. These variants cover requests that are
/// actually wrong (bad references, policy violations) or a storage
/// layer that is actually down.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The action was already performed and may not repeat, such as a
    /// user liking a meme they currently like.
    #[error("duplicate action: {0}")]
    DuplicateAction(String),

    /// The request referenced a row that does not exist, or exists in
    /// the wrong place (a reply parent on a different meme).
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// The request is well-formed but disallowed, such as a self-like
    /// or an empty comment body.
    #[error("policy violation: {0}")]
    PolicyViolation(String),

    /// The persistence layer failed.
    #[error("store error: {0}")]
    Store(#[from] DbError),
}

impl EngineError {
    /// Whether this error is a client fault rather than a system
    /// fault, for callers deciding whether to retry.
    #[must_use]
    pub const fn is_client_fault(&self) -> bool {
        matches!(
            self,
            Self::DuplicateAction(_) | Self::InvalidReference(_) | Self::PolicyViolation(_)
        )
    }
}
