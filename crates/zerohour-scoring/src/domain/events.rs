//! Domain events for the scoring flow.

use serde::{Deserialize, Serialize};
use zerohour_core::boundary::{LeaderboardEntry, ScoreSubmission};
use zerohour_core::event::{DomainEvent, EventMetadata};

/// Which archive call a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringStage {
    /// Submitting the score.
    Submit,
    /// Fetching the leaderboard.
    Leaderboard,
}

/// Emitted when the archive accepted the score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreSubmitted {
    /// What was submitted.
    pub submission: ScoreSubmission,
}

/// Emitted when the ranked leaderboard has been received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardRanked {
    /// Rows in the order the archive ranked them.
    pub entries: Vec<LeaderboardEntry>,
}

/// Emitted when an archive call failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringFailed {
    /// The call that failed.
    pub stage: ScoringStage,
    /// Why it failed.
    pub reason: String,
}

/// Event payload variants for the scoring flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScoringEventKind {
    /// The score was accepted.
    ScoreSubmitted(ScoreSubmitted),
    /// The leaderboard was received.
    LeaderboardRanked(LeaderboardRanked),
    /// An archive call failed.
    ScoringFailed(ScoringFailed),
}

impl ScoringEventKind {
    /// Event type name for this payload.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ScoreSubmitted(_) => "scoring.score_submitted",
            Self::LeaderboardRanked(_) => "scoring.leaderboard_ranked",
            Self::ScoringFailed(_) => "scoring.scoring_failed",
        }
    }
}

/// Domain event envelope for the scoring flow.
#[derive(Debug, Clone)]
pub struct ScoringEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: ScoringEventKind,
}

impl DomainEvent for ScoringEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        serde_json::to_value(&self.kind).unwrap_or(serde_json::Value::Null)
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
