//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every entity in the engagement engine has a strongly-typed ID to
//! prevent accidental mixing of identifiers at compile time (a
//! `UserId` can never be passed where a `MemeId` is expected). All IDs
//! use UUID v7 (time-ordered) for efficient database indexing.
//!
//! IDs are generated app-side via the `new()` constructors so that
//! idempotency keys derived from them (e.g. `like:{like_id}`) exist
//! before the row is inserted.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a user account.
    UserId
}

define_id! {
    /// Unique identifier for a meme.
    MemeId
}

define_id! {
    /// Unique identifier for a like. A re-like after an unlike mints a
    /// fresh `LikeId`, so the derived idempotency key is a new logical
    /// event while a retried insert is not.
    LikeId
}

define_id! {
    /// Unique identifier for a comment.
    CommentId
}

define_id! {
    /// Unique identifier for a point transaction (ledger entry).
    TransactionId
}

define_id! {
    /// Unique identifier for an activity log entry.
    ActivityId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let user = UserId::new();
        let meme = MemeId::new();
        // These are different types -- the compiler enforces no mixing.
        assert_ne!(user.into_inner(), Uuid::nil());
        assert_ne!(meme.into_inner(), Uuid::nil());
    }

    #[test]
    fn id_roundtrip_serde() {
        let original = LikeId::new();
        let json = serde_json::to_string(&original).ok();
        assert!(json.is_some());
        let restored: Result<LikeId, _> = serde_json::from_str(json.as_deref().unwrap_or(""));
        assert!(restored.is_ok());
    }

    #[test]
    fn id_display_matches_uuid() {
        let id = CommentId::new();
        assert_eq!(id.to_string(), id.into_inner().to_string());
    }

    #[test]
    fn ids_are_time_ordered() {
        let first = TransactionId::new();
        let second = TransactionId::new();
        // UUID v7 embeds a millisecond timestamp; two IDs minted in
        // sequence never sort backwards.
        assert!(first <= second);
    }
}
