//! Best-effort push notifications for engagement updates.
//!
//! The engine publishes an [`EngagementUpdate`] after each committed
//! state change. Delivery is fire-and-forget over a [`broadcast`]
//! channel: the source of truth is always the database, and a missed
//! or lagged update costs a subscriber nothing but freshness.

use kudos_types::{Rank, UserId};
use tokio::sync::broadcast;

/// Capacity of the broadcast channel for engagement updates.
///
/// If a subscriber falls behind by more than this many messages it
/// will receive a [`broadcast::error::RecvError::Lagged`] and skip to
/// the newest message.
const BROADCAST_CAPACITY: usize = 256;

/// JSON-serializable update pushed to subscribers after a commit.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngagementUpdate {
    /// A user's balance moved.
    PointsAwarded {
        /// The credited user.
        user_id: UserId,
        /// Signed amount of the credit.
        amount: i64,
        /// Balance after the credit.
        new_total: i64,
    },
    /// A user crossed a rank threshold, in either direction.
    RankChanged {
        /// The affected user.
        user_id: UserId,
        /// Rank before the change.
        from: Rank,
        /// Rank after the change.
        to: Rank,
    },
    /// A user earned a badge.
    BadgeEarned {
        /// The awarded user.
        user_id: UserId,
        /// Slug of the earned badge.
        badge_slug: String,
    },
}

/// Publisher handle for engagement updates.
#[derive(Debug, Clone)]
pub struct UpdateBus {
    sender: broadcast::Sender<EngagementUpdate>,
}

impl UpdateBus {
    /// Create a new bus with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { sender }
    }

    /// Subscribe to future updates.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EngagementUpdate> {
        self.sender.subscribe()
    }

    /// Publish an update to all current subscribers.
    ///
    /// Zero subscribers is a success: push is an optimization, not a
    /// delivery guarantee.
    pub fn publish(&self, update: EngagementUpdate) {
        let receivers = self.sender.receiver_count();
        if self.sender.send(update).is_err() {
            tracing::trace!("No subscribers for engagement update");
        } else {
            tracing::trace!(receivers, "Published engagement update");
        }
    }
}

impl Default for UpdateBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_without_subscribers_is_fine() {
        let bus = UpdateBus::new();
        bus.publish(EngagementUpdate::PointsAwarded {
            user_id: UserId::new(),
            amount: 10,
            new_total: 10,
        });
    }

    #[tokio::test]
    async fn subscriber_receives_updates_in_order() {
        let bus = UpdateBus::new();
        let mut rx = bus.subscribe();

        let user_id = UserId::new();
        bus.publish(EngagementUpdate::PointsAwarded {
            user_id,
            amount: 10,
            new_total: 10,
        });
        bus.publish(EngagementUpdate::RankChanged {
            user_id,
            from: Rank::Newbie,
            to: Rank::RookieMemer,
        });

        let first = rx.recv().await;
        assert!(matches!(
            first,
            Ok(EngagementUpdate::PointsAwarded { amount: 10, .. })
        ));
        let second = rx.recv().await;
        assert!(matches!(second, Ok(EngagementUpdate::RankChanged { .. })));
    }
}
