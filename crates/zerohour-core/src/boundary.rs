//! Remote boundary abstractions.
//!
//! The simulation service decides narrative content, choice sets, and stat
//! changes; the archive stores scores and ranks them. The engine only knows
//! them through the traits and wire payloads defined here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::choice::{Choice, ChoiceIndex};
use crate::error::DomainError;
use crate::history::{EventHistory, EventId};
use crate::stats::Stats;

/// Payload sent to the simulation service for one turn.
///
/// `choice_index` is `None` exactly when `is_init` is `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRequest {
    /// Stats before the turn.
    pub stats: Stats,
    /// Zero-based selection from the previously offered choices.
    pub choice_index: Option<ChoiceIndex>,
    /// Identifier of the event currently on screen.
    pub last_event_id: Option<EventId>,
    /// Events already shown this session.
    pub used_events: EventHistory,
    /// `true` only for the first turn of a session.
    pub is_init: bool,
}

/// Payload returned by the simulation service for one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnResponse {
    /// Stats after the turn.
    pub stats: Stats,
    /// Identifier of the new event. An ending prefix terminates the session.
    pub event_id: EventId,
    /// Events shown so far, including the new one.
    pub used_events: EventHistory,
    /// Narrative text for the new event.
    pub narrative: String,
    /// Options for the next turn. May be empty for an ending.
    #[serde(default)]
    pub choices: Vec<Choice>,
}

/// The remote simulation service.
#[async_trait]
pub trait SimulationBoundary: Send + Sync {
    /// Runs one turn of the simulation.
    async fn simulate(&self, request: &TurnRequest) -> Result<TurnResponse, DomainError>;
}

/// A final score submitted to the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    /// Persisted session identifier of the player.
    pub user_id: String,
    /// Display name entered by the player.
    pub name: String,
    /// Stats at the ending.
    pub stats: Stats,
    /// Identifier of the ending event.
    pub ending: EventId,
}

/// Requests understood by the archive endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ArchiveRequest {
    /// Store a final score.
    SubmitScore(ScoreSubmission),
    /// Fetch the ranked leaderboard.
    GetLeaderboard,
}

/// One ranked row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Session identifier the row was submitted under.
    pub user_id: String,
    /// Display name.
    pub name: String,
    /// Days survived.
    pub days: u32,
    /// Score derived by the archive.
    pub score: i64,
}

/// Leaderboard payload returned by the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardResponse {
    /// Rows, already sorted by descending score.
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// The remote score archive.
#[async_trait]
pub trait ArchiveBoundary: Send + Sync {
    /// Submits a final score. The acknowledgement body is ignored.
    async fn submit_score(&self, submission: &ScoreSubmission) -> Result<(), DomainError>;

    /// Fetches the leaderboard in the order the archive ranked it.
    async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, DomainError>;
}
