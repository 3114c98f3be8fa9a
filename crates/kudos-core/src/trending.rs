//! Windowed trending scores for memes.
//!
//! A meme's trending score over a time window is the weighted sum of
//! the likes and comments it received strictly within that window:
//! likes weigh 1, comments weigh 2. Two computation strategies are
//! provided and must converge to the same values -- that convergence
//! is the testable contract, not the mechanism:
//!
//! - [`compute_scores`] -- full recomputation over an interaction log.
//! - [`TrendingAccumulator`] -- incremental maintenance: observe each
//!   qualifying event as it happens, retract removed likes, expire
//!   events that age out of the window.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use kudos_types::MemeId;

/// Default trending window length in hours.
const DEFAULT_WINDOW_HOURS: i64 = 24;

/// A qualifying interaction on a meme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    /// A like (weight 1).
    Like,
    /// A comment (weight 2).
    Comment,
}

impl InteractionKind {
    /// The score contribution of one interaction of this kind.
    pub const fn weight(self) -> i64 {
        match self {
            Self::Like => 1,
            Self::Comment => 2,
        }
    }
}

/// One like or comment event, as the aggregator sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interaction {
    /// The meme that received the interaction.
    pub meme_id: MemeId,
    /// Like or comment.
    pub kind: InteractionKind,
    /// When the interaction happened.
    pub occurred_at: DateTime<Utc>,
}

/// A half-open time window `(now - hours, now]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendingWindow {
    /// Window length in hours.
    pub hours: i64,
}

impl TrendingWindow {
    /// A window of the given length in hours (minimum 1).
    pub const fn from_hours(hours: i64) -> Self {
        Self {
            hours: if hours < 1 { 1 } else { hours },
        }
    }

    /// Whether `at` falls strictly within the window ending at `now`.
    pub fn contains(self, now: DateTime<Utc>, at: DateTime<Utc>) -> bool {
        at <= now && now.signed_duration_since(at) < Duration::hours(self.hours)
    }
}

impl Default for TrendingWindow {
    fn default() -> Self {
        Self::from_hours(DEFAULT_WINDOW_HOURS)
    }
}

/// Full recomputation: fold every in-window interaction into per-meme
/// totals. Memes with no in-window interactions have no entry (score 0).
pub fn compute_scores(
    interactions: &[Interaction],
    window: TrendingWindow,
    now: DateTime<Utc>,
) -> BTreeMap<MemeId, i64> {
    let mut scores: BTreeMap<MemeId, i64> = BTreeMap::new();
    for interaction in interactions {
        if !window.contains(now, interaction.occurred_at) {
            continue;
        }
        let score = scores.entry(interaction.meme_id).or_insert(0);
        *score = score.saturating_add(interaction.kind.weight());
    }
    scores
}

/// Rank a score map: score descending, meme id ascending for
/// determinism. Zero and negative scores are dropped.
pub fn ranked(scores: &BTreeMap<MemeId, i64>, limit: usize) -> Vec<(MemeId, i64)> {
    let mut rows: Vec<(MemeId, i64)> = scores
        .iter()
        .filter(|&(_, &score)| score > 0)
        .map(|(&meme, &score)| (meme, score))
        .collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    rows.truncate(limit);
    rows
}

/// Incremental trending maintenance.
///
/// Holds the in-window interaction set and a running per-meme total.
/// After any sequence of [`observe`](Self::observe) /
/// [`retract`](Self::retract) / [`expire`](Self::expire) calls, the
/// totals equal what [`compute_scores`] returns over the same events.
#[derive(Debug, Clone)]
pub struct TrendingAccumulator {
    window: TrendingWindow,
    /// In-window events in arrival order (arrival order approximates
    /// time order; `expire` scans the whole set, so out-of-order
    /// arrivals only cost time, not correctness).
    events: Vec<Interaction>,
    scores: BTreeMap<MemeId, i64>,
}

impl TrendingAccumulator {
    /// Create an empty accumulator over the given window.
    pub const fn new(window: TrendingWindow) -> Self {
        Self {
            window,
            events: Vec::new(),
            scores: BTreeMap::new(),
        }
    }

    /// Record a qualifying event, adding its weight to the meme's
    /// total.
    pub fn observe(&mut self, interaction: Interaction) {
        let score = self.scores.entry(interaction.meme_id).or_insert(0);
        *score = score.saturating_add(interaction.kind.weight());
        self.events.push(interaction);
    }

    /// Remove a previously observed event (a like that was unliked),
    /// subtracting its weight. Unknown events are ignored.
    pub fn retract(&mut self, interaction: &Interaction) {
        let Some(position) = self.events.iter().position(|e| e == interaction) else {
            return;
        };
        self.events.swap_remove(position);
        if let Some(score) = self.scores.get_mut(&interaction.meme_id) {
            *score = score.saturating_sub(interaction.kind.weight());
            if *score <= 0 {
                self.scores.remove(&interaction.meme_id);
            }
        }
    }

    /// Drop events that have aged out of the window as of `now`,
    /// subtracting their weight.
    pub fn expire(&mut self, now: DateTime<Utc>) {
        let window = self.window;
        let mut kept = Vec::with_capacity(self.events.len());
        for event in self.events.drain(..) {
            if window.contains(now, event.occurred_at) {
                kept.push(event);
            } else if let Some(score) = self.scores.get_mut(&event.meme_id) {
                *score = score.saturating_sub(event.kind.weight());
                if *score <= 0 {
                    self.scores.remove(&event.meme_id);
                }
            }
        }
        self.events = kept;
    }

    /// Current per-meme totals.
    pub const fn scores(&self) -> &BTreeMap<MemeId, i64> {
        &self.scores
    }

    /// Current top memes: score descending, meme id ascending.
    pub fn top(&self, limit: usize) -> Vec<(MemeId, i64)> {
        ranked(&self.scores, limit)
    }
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    fn at(now: DateTime<Utc>, hours_ago: i64) -> DateTime<Utc> {
        now - Duration::hours(hours_ago)
    }

    fn like(meme: MemeId, when: DateTime<Utc>) -> Interaction {
        Interaction {
            meme_id: meme,
            kind: InteractionKind::Like,
            occurred_at: when,
        }
    }

    fn comment(meme: MemeId, when: DateTime<Utc>) -> Interaction {
        Interaction {
            meme_id: meme,
            kind: InteractionKind::Comment,
            occurred_at: when,
        }
    }

    #[test]
    fn weights_are_one_and_two() {
        assert_eq!(InteractionKind::Like.weight(), 1);
        assert_eq!(InteractionKind::Comment.weight(), 2);
    }

    #[test]
    fn full_recompute_counts_only_in_window_events() {
        let now = Utc::now();
        let meme = MemeId::new();
        let events = vec![
            like(meme, at(now, 1)),
            comment(meme, at(now, 2)),
            // Outside the 24h window: ignored.
            like(meme, at(now, 30)),
        ];
        let scores = compute_scores(&events, TrendingWindow::default(), now);
        assert_eq!(scores.get(&meme).copied(), Some(3));
    }

    #[test]
    fn incremental_and_full_recompute_converge() {
        let now = Utc::now();
        let window = TrendingWindow::from_hours(24);
        let meme_a = MemeId::new();
        let meme_b = MemeId::new();

        let events = vec![
            like(meme_a, at(now, 1)),
            comment(meme_a, at(now, 2)),
            like(meme_b, at(now, 3)),
            like(meme_a, at(now, 25)), // will expire
            comment(meme_b, at(now, 5)),
            like(meme_b, at(now, 48)), // will expire
        ];

        let mut accumulator = TrendingAccumulator::new(window);
        for event in &events {
            accumulator.observe(*event);
        }
        // The retracted like must vanish from both strategies.
        let retracted = like(meme_b, at(now, 3));
        accumulator.retract(&retracted);
        accumulator.expire(now);

        let mut log: Vec<Interaction> = events;
        if let Some(position) = log.iter().position(|e| *e == retracted) {
            log.swap_remove(position);
        }
        let full = compute_scores(&log, window, now);

        assert_eq!(accumulator.scores(), &full);
        assert_eq!(full.get(&meme_a).copied(), Some(3));
        assert_eq!(full.get(&meme_b).copied(), Some(2));
    }

    #[test]
    fn retracting_unknown_event_is_a_noop() {
        let now = Utc::now();
        let mut accumulator = TrendingAccumulator::new(TrendingWindow::default());
        accumulator.retract(&like(MemeId::new(), now));
        assert!(accumulator.scores().is_empty());
    }

    #[test]
    fn ranking_is_deterministic_under_ties() {
        let now = Utc::now();
        let mut accumulator = TrendingAccumulator::new(TrendingWindow::default());
        let meme_a = MemeId::new();
        let meme_b = MemeId::new();
        accumulator.observe(like(meme_a, at(now, 1)));
        accumulator.observe(like(meme_b, at(now, 1)));

        let top = accumulator.top(10);
        // Equal scores: lower meme id first.
        let expected_first = meme_a.min(meme_b);
        assert_eq!(top.first().map(|r| r.0), Some(expected_first));
        assert_eq!(top.len(), 2);
    }

    #[test]
    fn expiry_leaves_the_accumulator_rebuildable() {
        let now = Utc::now();
        let window = TrendingWindow::from_hours(2);
        let meme = MemeId::new();

        let mut accumulator = TrendingAccumulator::new(window);
        accumulator.observe(like(meme, at(now, 1)));
        accumulator.observe(comment(meme, at(now, 1)));
        assert_eq!(accumulator.scores().get(&meme).copied(), Some(3));

        // Three hours later everything has aged out.
        let later = now + Duration::hours(3);
        accumulator.expire(later);
        assert!(accumulator.scores().is_empty());
        assert!(accumulator.top(10).is_empty());
    }

    #[test]
    fn window_boundary_is_exclusive_at_the_old_edge() {
        let now = Utc::now();
        let window = TrendingWindow::from_hours(24);
        // Exactly 24h old: outside.
        assert!(!window.contains(now, at(now, 24)));
        // A future timestamp is not in the window either.
        assert!(!window.contains(now, now + Duration::hours(1)));
        assert!(window.contains(now, now));
    }
}
