//! Query handlers for the scoring flow.

use serde::Serialize;
use zerohour_core::boundary::LeaderboardEntry;

use crate::domain::aggregates::ScoreCard;

/// One displayed leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardRow {
    /// One-based rank, by position in the archive's ordering.
    pub rank: usize,
    /// Display name.
    pub name: String,
    /// Days survived.
    pub days: u32,
    /// Score.
    pub score: i64,
    /// `true` for rows submitted under the local session identifier.
    pub is_local: bool,
}

/// Read-only view of the ranked leaderboard.
#[derive(Debug, Serialize)]
pub struct LeaderboardView {
    /// Rows in the archive's order.
    pub rows: Vec<LeaderboardRow>,
}

/// Builds rows from `entries` in the order given, highlighting those
/// submitted by `local_user_id`. Rows are never re-sorted.
#[must_use]
pub fn rank_rows(entries: &[LeaderboardEntry], local_user_id: &str) -> Vec<LeaderboardRow> {
    entries
        .iter()
        .enumerate()
        .map(|(position, entry)| LeaderboardRow {
            rank: position + 1,
            name: entry.name.clone(),
            days: entry.days,
            score: entry.score,
            is_local: entry.user_id == local_user_id,
        })
        .collect()
}

/// Builds the leaderboard view of `card`.
#[must_use]
pub fn get_leaderboard_view(card: &ScoreCard) -> LeaderboardView {
    LeaderboardView {
        rows: rank_rows(card.leaderboard(), card.user_id()),
    }
}
