//! Query handlers for the turn engine.
//!
//! Views are read-only snapshots for the front end; building one never
//! changes the session.

use serde::Serialize;
use uuid::Uuid;
use zerohour_core::aggregate::AggregateRoot;
use zerohour_core::choice::ChoiceIndex;
use zerohour_core::stats::Stats;

use crate::domain::aggregates::TurnEngine;
use crate::domain::input::TurnSelection;

/// Read-only view of a session.
#[derive(Debug, Serialize)]
pub struct SessionView {
    /// The session aggregate identifier.
    pub session_id: Uuid,
    /// Current phase name.
    pub phase: &'static str,
    /// Current stats.
    pub stats: Stats,
    /// `true` when infection is above the critical threshold.
    pub infection_critical: bool,
    /// Identifier of the event on screen.
    pub current_event: Option<String>,
    /// Number of events shown so far.
    pub events_seen: usize,
    /// Texts of the armed choices, in order.
    pub choices: Vec<String>,
    /// `true` while a turn is outstanding.
    pub busy: bool,
    /// One-based option number of the outstanding turn.
    pub pending_choice: Option<usize>,
    /// `true` when a typed option number would be accepted.
    pub accepts_choice: bool,
    /// Ending identifier, once reached.
    pub ending: Option<String>,
    /// Current version (event count).
    pub version: i64,
}

/// Builds the view of `engine`.
#[must_use]
pub fn get_session_view(engine: &TurnEngine) -> SessionView {
    let stats = *engine.stats();
    SessionView {
        session_id: engine.aggregate_id(),
        phase: engine.phase().name(),
        stats,
        infection_critical: stats.infection_critical(),
        current_event: engine.current_event().map(ToString::to_string),
        events_seen: engine.history().len(),
        choices: engine
            .choices()
            .iter()
            .map(|choice| choice.text.clone())
            .collect(),
        busy: engine.is_busy(),
        pending_choice: engine
            .pending_selection()
            .and_then(TurnSelection::choice_index)
            .map(ChoiceIndex::one_based),
        accepts_choice: engine.accepts_choice(),
        ending: engine.ending().map(|ending| ending.event_id.to_string()),
        version: engine.version(),
    }
}
