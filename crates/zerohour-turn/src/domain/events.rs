//! Domain events for the turn engine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zerohour_core::choice::{Choice, ChoiceIndex};
use zerohour_core::event::{DomainEvent, EventMetadata};
use zerohour_core::history::{EventHistory, EventId};
use zerohour_core::stats::Stats;

/// Emitted when the player activates the session from `boot`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionActivated {
    /// The session being activated.
    pub session_id: Uuid,
}

/// Emitted when the intro has been fully revealed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntroRevealed {
    /// The session.
    pub session_id: Uuid,
}

/// Emitted when the player advances from the intro into play.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayStarted {
    /// The session.
    pub session_id: Uuid,
}

/// Emitted when a turn request is handed to the simulation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnSubmitted {
    /// Zero-based selection, `None` for the opening turn.
    pub choice_index: Option<ChoiceIndex>,
    /// `true` for the opening turn.
    pub is_init: bool,
}

/// Emitted when an ordinary response is applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnApplied {
    /// New stats.
    pub stats: Stats,
    /// New active event.
    pub event_id: EventId,
    /// History as returned by the service.
    pub used_events: EventHistory,
    /// Options for the next turn.
    pub choices: Vec<Choice>,
}

/// Emitted when a response carries an ending identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndingReached {
    /// Final stats.
    pub stats: Stats,
    /// The ending identifier.
    pub event_id: EventId,
    /// History as returned by the service.
    pub used_events: EventHistory,
    /// Ending narrative, kept for the scoring flow.
    pub narrative: String,
}

/// Emitted when a turn fails in transport or protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnFailed {
    /// Why the turn failed.
    pub reason: String,
}

/// Emitted when the score has been archived and ranked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionScored {
    /// The session.
    pub session_id: Uuid,
}

/// Event payload variants for the turn engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEventKind {
    /// The session left `boot`.
    SessionActivated(SessionActivated),
    /// The intro finished revealing.
    IntroRevealed(IntroRevealed),
    /// The session entered `playing`.
    PlayStarted(PlayStarted),
    /// A turn request is outstanding.
    TurnSubmitted(TurnSubmitted),
    /// A response was applied.
    TurnApplied(TurnApplied),
    /// The session reached an ending.
    EndingReached(EndingReached),
    /// A turn failed and input was re-armed.
    TurnFailed(TurnFailed),
    /// The session was scored.
    SessionScored(SessionScored),
}

impl SessionEventKind {
    /// Event type name for this payload.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SessionActivated(_) => "session.activated",
            Self::IntroRevealed(_) => "session.intro_revealed",
            Self::PlayStarted(_) => "session.play_started",
            Self::TurnSubmitted(_) => "session.turn_submitted",
            Self::TurnApplied(_) => "session.turn_applied",
            Self::EndingReached(_) => "session.ending_reached",
            Self::TurnFailed(_) => "session.turn_failed",
            Self::SessionScored(_) => "session.scored",
        }
    }
}

/// Domain event envelope for the turn engine.
#[derive(Debug, Clone)]
pub struct SessionEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: SessionEventKind,
}

impl DomainEvent for SessionEvent {
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
