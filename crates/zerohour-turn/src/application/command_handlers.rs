//! Command handlers for the turn engine.
//!
//! Each handler runs one command against the session: it asks the aggregate
//! to validate and record the transition, talks to the simulation service
//! when a turn is involved, appends the resulting log entries, and drains
//! the recorded events.

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use zerohour_core::aggregate::AggregateRoot;
use zerohour_core::boundary::SimulationBoundary;
use zerohour_core::choice::ChoiceIndex;
use zerohour_core::clock::Clock;
use zerohour_core::command::Command;
use zerohour_core::error::DomainError;
use zerohour_core::event::DomainEvent;
use zerohour_reveal::log::{LogEntry, SharedLog, lock};

use crate::domain::aggregates::{TurnEngine, TurnOutcome};
use crate::domain::commands::{
    ActivateSession, CompleteIntro, RequestOpening, StartPlay, SubmitChoice,
};
use crate::domain::events::SessionEvent;
use crate::domain::input::{TurnSelection, parse_selection};

/// Log line appended when a turn cannot be completed.
pub const DISCONNECTED_DIAGNOSTIC: &str = "ERROR: MAINFRAME DISCONNECTED.";

/// Log line acknowledging the choice about to be transmitted.
#[must_use]
pub fn command_echo(index: ChoiceIndex) -> String {
    format!(">> COMMAND CONFIRMED: OPTION {index}")
}

/// The result of a command that ran a turn.
#[derive(Debug)]
pub struct TurnReport {
    /// How the turn changed the session.
    pub outcome: TurnOutcome,
    /// Events recorded while handling the command.
    pub events: Vec<SessionEvent>,
}

pub(crate) fn drain_events(engine: &mut TurnEngine) -> Vec<SessionEvent> {
    let events = engine.uncommitted_events().to_vec();
    engine.clear_uncommitted_events();
    for event in &events {
        debug!(
            event_type = event.event_type(),
            sequence_number = event.metadata().sequence_number,
            payload = %event.to_payload(),
            "recorded event"
        );
    }
    events
}

/// Handles the `ActivateSession` command: leaves `boot` for `intro`.
///
/// # Errors
///
/// Returns `DomainError::InvalidPhase` unless the session is in `boot`.
#[instrument(
    skip_all,
    fields(
        session_id = %engine.id,
        correlation_id = %command.correlation_id,
        command_type = command.command_type()
    )
)]
pub fn handle_activate(
    command: &ActivateSession,
    engine: &mut TurnEngine,
    clock: &dyn Clock,
) -> Result<Vec<SessionEvent>, DomainError> {
    engine.activate(command.correlation_id, clock)?;
    info!("session activated");
    Ok(drain_events(engine))
}

/// Handles the `CompleteIntro` command: records that the intro reveal has
/// finished so the player may advance.
///
/// # Errors
///
/// Returns `DomainError::InvalidPhase` unless the session is in `intro`.
#[instrument(
    skip_all,
    fields(
        session_id = %engine.id,
        correlation_id = %command.correlation_id,
        command_type = command.command_type()
    )
)]
pub fn handle_complete_intro(
    command: &CompleteIntro,
    engine: &mut TurnEngine,
    clock: &dyn Clock,
) -> Result<Vec<SessionEvent>, DomainError> {
    engine.complete_intro(command.correlation_id, clock)?;
    Ok(drain_events(engine))
}

/// Handles the `StartPlay` command: enters `playing` and runs the opening
/// turn.
///
/// # Errors
///
/// Returns `DomainError::InvalidPhase` unless the session is in `intro`, and
/// `DomainError::Validation` if the intro has not finished revealing. A
/// failed opening turn is not an error; it is reported in the outcome.
#[instrument(
    skip_all,
    fields(
        session_id = %engine.id,
        correlation_id = %command.correlation_id,
        command_type = command.command_type()
    )
)]
pub async fn handle_start_play(
    command: &StartPlay,
    engine: &mut TurnEngine,
    log: &SharedLog,
    clock: &dyn Clock,
    simulation: &dyn SimulationBoundary,
) -> Result<TurnReport, DomainError> {
    engine.start_play(command.correlation_id, clock)?;
    info!("play started");
    run_turn(
        TurnSelection::Opening,
        command.correlation_id,
        engine,
        log,
        clock,
        simulation,
    )
    .await
}

/// Handles the `RequestOpening` command: retries the opening turn after it
/// failed.
///
/// # Errors
///
/// Returns `DomainError::InvalidPhase` or `DomainError::TurnInFlight` if no
/// turn may be submitted, and `DomainError::Validation` if the opening turn
/// has already been played.
#[instrument(
    skip_all,
    fields(
        session_id = %engine.id,
        correlation_id = %command.correlation_id,
        command_type = command.command_type()
    )
)]
pub async fn handle_request_opening(
    command: &RequestOpening,
    engine: &mut TurnEngine,
    log: &SharedLog,
    clock: &dyn Clock,
    simulation: &dyn SimulationBoundary,
) -> Result<TurnReport, DomainError> {
    run_turn(
        TurnSelection::Opening,
        command.correlation_id,
        engine,
        log,
        clock,
        simulation,
    )
    .await
}

/// Handles the `SubmitChoice` command: validates the typed option number
/// and runs the turn.
///
/// Input is checked before anything else happens. Rejected input leaves the
/// session and the log untouched and never reaches the simulation service.
///
/// # Errors
///
/// Returns `DomainError::InvalidPhase` outside `playing`,
/// `DomainError::TurnInFlight` while a turn is outstanding, and
/// `DomainError::Validation` if the choices are still being revealed or the
/// input is not an offered option number.
#[instrument(
    skip_all,
    fields(
        session_id = %engine.id,
        correlation_id = %command.correlation_id,
        command_type = command.command_type()
    )
)]
pub async fn handle_submit_choice(
    command: &SubmitChoice,
    engine: &mut TurnEngine,
    log: &SharedLog,
    clock: &dyn Clock,
    simulation: &dyn SimulationBoundary,
) -> Result<TurnReport, DomainError> {
    engine.ensure_ready_for_turn()?;
    if !lock(log).tail_revealed() {
        return Err(DomainError::Validation(
            "choices are still being revealed".to_owned(),
        ));
    }
    let index = parse_selection(&command.input, engine.choices().len()).inspect_err(|err| {
        debug!(error = %err, "rejected choice input");
    })?;
    run_turn(
        TurnSelection::Choice(index),
        command.correlation_id,
        engine,
        log,
        clock,
        simulation,
    )
    .await
}

async fn run_turn(
    selection: TurnSelection,
    correlation_id: Uuid,
    engine: &mut TurnEngine,
    log: &SharedLog,
    clock: &dyn Clock,
    simulation: &dyn SimulationBoundary,
) -> Result<TurnReport, DomainError> {
    let request = engine.begin_turn(selection, correlation_id, clock)?;
    if let TurnSelection::Choice(index) = selection {
        lock(log).append(LogEntry::instant(command_echo(index)));
    }

    let completed = match simulation.simulate(&request).await {
        Ok(response) => engine.complete_turn(response, correlation_id, clock),
        Err(err) => Err(err),
    };

    let outcome = match completed {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(error = %err, boundary = err.is_boundary_failure(), "turn failed");
            engine.fail_turn(err.to_string(), correlation_id, clock)?
        }
    };

    let entry = match &outcome {
        TurnOutcome::Applied { narrative } => {
            info!(day = engine.stats().day, "turn applied");
            LogEntry::typewriter(narrative.as_str(), Some(engine.choices().to_vec()))
        }
        TurnOutcome::Ending {
            event_id,
            narrative,
        } => {
            info!(ending = %event_id, day = engine.stats().day, "ending reached");
            LogEntry::typewriter(narrative.as_str(), None)
        }
        TurnOutcome::Failed { .. } => LogEntry::instant(DISCONNECTED_DIAGNOSTIC),
    };
    lock(log).append(entry);

    Ok(TurnReport {
        outcome,
        events: drain_events(engine),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use uuid::Uuid;
    use zerohour_core::error::DomainError;
    use zerohour_core::event::DomainEvent;
    use zerohour_core::history::{EventHistory, EventId};
    use zerohour_core::stats::Stats;
    use zerohour_reveal::audio::{AudioChannel, SilentCue};
    use zerohour_reveal::log::{RevealMode, SessionLog, SharedLog, lock};
    use zerohour_reveal::renderer::RevealRenderer;
    use zerohour_test_support::{
        FailingSimulation, FixedClock, RecordingRevealView, ScriptedSimulation, turn_response,
    };

    use super::*;
    use crate::domain::aggregates::SessionPhase;

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap())
    }

    fn submit(input: &str) -> SubmitChoice {
        SubmitChoice {
            correlation_id: Uuid::new_v4(),
            input: input.to_owned(),
        }
    }

    async fn reveal_all(log: &SharedLog) {
        RevealRenderer::new(
            AudioChannel::new(Arc::new(SilentCue)),
            Arc::new(RecordingRevealView::default()),
        )
        .with_tick(Duration::from_millis(1))
        .with_chunk(4096)
        .reveal_tail(log)
        .await;
    }

    async fn started(simulation: &ScriptedSimulation) -> (TurnEngine, SharedLog) {
        let clock = clock();
        let mut engine = TurnEngine::new(Uuid::new_v4());
        let log = SessionLog::new().into_shared();
        handle_activate(
            &ActivateSession {
                correlation_id: Uuid::new_v4(),
            },
            &mut engine,
            &clock,
        )
        .unwrap();
        handle_complete_intro(
            &CompleteIntro {
                correlation_id: Uuid::new_v4(),
            },
            &mut engine,
            &clock,
        )
        .unwrap();
        handle_start_play(
            &StartPlay {
                correlation_id: Uuid::new_v4(),
            },
            &mut engine,
            &log,
            &clock,
            simulation,
        )
        .await
        .unwrap();
        reveal_all(&log).await;
        (engine, log)
    }

    #[test]
    fn test_handle_activate_returns_activated_event() {
        // Arrange
        let clock = clock();
        let mut engine = TurnEngine::new(Uuid::new_v4());
        let command = ActivateSession {
            correlation_id: Uuid::new_v4(),
        };

        // Act
        let events = handle_activate(&command, &mut engine, &clock).unwrap();

        // Assert
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), "session.activated");
        assert_eq!(events[0].metadata().correlation_id, command.correlation_id);
        assert!(engine.uncommitted_events().is_empty());
    }

    #[tokio::test]
    async fn test_start_play_sends_opening_request_and_appends_typewriter_entry() {
        // Arrange
        let simulation = ScriptedSimulation::responding(vec![turn_response(
            "evt_01",
            1,
            &["evt_01"],
            &["Close schools", "Wait"],
        )]);

        // Act
        let (engine, log) = started(&simulation).await;

        // Assert
        let requests = simulation.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].is_init);
        assert_eq!(requests[0].choice_index, None);
        assert_eq!(requests[0].stats, Stats::initial());
        assert_eq!(engine.phase(), SessionPhase::Playing);
        let log = lock(&log);
        assert_eq!(log.len(), 1);
        assert_eq!(log.get(0).unwrap().mode(), RevealMode::Typewriter);
        assert_eq!(log.get(0).unwrap().choices().map(<[_]>::len), Some(2));
    }

    #[tokio::test]
    async fn test_choice_applies_response_and_appends_echo_then_narrative() {
        // Arrange
        let simulation = ScriptedSimulation::responding(vec![
            turn_response("evt_01", 1, &["evt_01"], &["A", "B"]),
            turn_response("evt_02", 2, &["evt_01"], &["A", "B"]),
        ]);
        let (mut engine, log) = started(&simulation).await;

        // Act
        let report = handle_submit_choice(&submit("1"), &mut engine, &log, &clock(), &simulation)
            .await
            .unwrap();

        // Assert
        assert!(matches!(report.outcome, TurnOutcome::Applied { .. }));
        let types: Vec<&str> = report.events.iter().map(DomainEvent::event_type).collect();
        assert_eq!(types, vec!["session.turn_submitted", "session.turn_applied"]);
        assert_eq!(engine.stats().day, 2);
        assert_eq!(engine.current_event(), Some(&EventId::new("evt_02")));

        let requests = simulation.requests();
        assert_eq!(requests[1].choice_index.map(ChoiceIndex::get), Some(0));
        assert!(!requests[1].is_init);

        let log = lock(&log);
        assert_eq!(log.len(), 3);
        let echo = log.get(1).unwrap();
        assert_eq!(echo.text(), ">> COMMAND CONFIRMED: OPTION 1");
        assert_eq!(echo.mode(), RevealMode::Instant);
        let tail = log.tail().unwrap();
        assert_eq!(tail.mode(), RevealMode::Typewriter);
        assert_eq!(tail.choices().map(<[_]>::len), Some(2));
    }

    #[tokio::test]
    async fn test_history_sent_equals_history_previously_returned() {
        let simulation = ScriptedSimulation::responding(vec![
            turn_response("evt_01", 1, &["evt_01"], &["A", "B"]),
            turn_response("evt_07", 2, &["evt_01", "evt_07"], &["A", "B"]),
            turn_response("evt_03", 3, &["evt_01", "evt_07", "evt_03"], &["A"]),
        ]);
        let (mut engine, log) = started(&simulation).await;

        handle_submit_choice(&submit("2"), &mut engine, &log, &clock(), &simulation)
            .await
            .unwrap();
        reveal_all(&log).await;
        handle_submit_choice(&submit("1"), &mut engine, &log, &clock(), &simulation)
            .await
            .unwrap();

        let requests = simulation.requests();
        let returned: EventHistory = ["evt_01", "evt_07"].into_iter().map(EventId::new).collect();
        assert_eq!(requests[2].used_events, returned);
        assert_eq!(requests[2].last_event_id, Some(EventId::new("evt_07")));
        assert_eq!(engine.history().len(), 3);
    }

    #[tokio::test]
    async fn test_ending_response_enters_ending_with_no_choices() {
        // Arrange
        let simulation = ScriptedSimulation::responding(vec![
            turn_response("evt_01", 1, &["evt_01"], &["A", "B"]),
            turn_response("ending_quarantine", 6, &["evt_01"], &[]),
        ]);
        let (mut engine, log) = started(&simulation).await;

        // Act
        let report = handle_submit_choice(&submit("2"), &mut engine, &log, &clock(), &simulation)
            .await
            .unwrap();

        // Assert
        assert!(matches!(report.outcome, TurnOutcome::Ending { .. }));
        assert_eq!(engine.phase(), SessionPhase::Ending);
        assert!(engine.choices().is_empty());
        assert!(lock(&log).tail().unwrap().choices().is_none());
        assert_eq!(
            engine.ending().unwrap().narrative,
            "Narrative for ending_quarantine."
        );
    }

    #[tokio::test]
    async fn test_out_of_range_input_never_reaches_the_service() {
        // Arrange
        let simulation = ScriptedSimulation::responding(vec![turn_response(
            "evt_01",
            1,
            &["evt_01"],
            &["A", "B"],
        )]);
        let (mut engine, log) = started(&simulation).await;
        let entries_before = lock(&log).len();

        // Act
        let result =
            handle_submit_choice(&submit("5"), &mut engine, &log, &clock(), &simulation).await;

        // Assert
        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(simulation.requests().len(), 1);
        assert_eq!(lock(&log).len(), entries_before);
        assert_eq!(engine.stats().day, 1);
        assert!(!engine.is_busy());
    }

    #[tokio::test]
    async fn test_input_before_reveal_completes_is_rejected() {
        let simulation = ScriptedSimulation::responding(vec![turn_response(
            "evt_01",
            1,
            &["evt_01"],
            &["A", "B"],
        )]);
        let clock = clock();
        let mut engine = TurnEngine::new(Uuid::new_v4());
        let log = SessionLog::new().into_shared();
        engine.activate(Uuid::new_v4(), &clock).unwrap();
        engine.complete_intro(Uuid::new_v4(), &clock).unwrap();
        handle_start_play(
            &StartPlay {
                correlation_id: Uuid::new_v4(),
            },
            &mut engine,
            &log,
            &clock,
            &simulation,
        )
        .await
        .unwrap();

        let result = handle_submit_choice(&submit("1"), &mut engine, &log, &clock, &simulation).await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(simulation.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_leaves_state_and_appends_one_diagnostic() {
        // Arrange
        let simulation = ScriptedSimulation::new(vec![
            Ok(turn_response("evt_01", 1, &["evt_01"], &["A", "B"])),
            Err(DomainError::Transport("502 Bad Gateway".into())),
        ]);
        let (mut engine, log) = started(&simulation).await;
        let stats = *engine.stats();
        let event = engine.current_event().cloned();
        let choices = engine.choices().to_vec();
        let entries_before = lock(&log).len();

        // Act
        let report = handle_submit_choice(&submit("2"), &mut engine, &log, &clock(), &simulation)
            .await
            .unwrap();

        // Assert
        assert!(matches!(report.outcome, TurnOutcome::Failed { .. }));
        assert_eq!(*engine.stats(), stats);
        assert_eq!(engine.current_event().cloned(), event);
        assert_eq!(engine.choices(), choices.as_slice());
        assert!(!engine.is_busy());

        let log = lock(&log);
        let diagnostics = log
            .entries()
            .iter()
            .filter(|entry| entry.text() == DISCONNECTED_DIAGNOSTIC)
            .count();
        assert_eq!(diagnostics, 1);
        assert_eq!(log.len(), entries_before + 2);
        assert_eq!(log.tail().unwrap().mode(), RevealMode::Instant);
    }

    #[tokio::test]
    async fn test_malformed_response_follows_failure_path_and_allows_retry() {
        // Arrange
        let simulation = ScriptedSimulation::new(vec![
            Ok(turn_response("evt_01", 1, &["evt_01"], &["A", "B"])),
            Ok(turn_response("evt_02", 2, &["evt_01"], &[])),
            Ok(turn_response("evt_02", 2, &["evt_01", "evt_02"], &["C"])),
        ]);
        let (mut engine, log) = started(&simulation).await;

        // Act
        let failed = handle_submit_choice(&submit("1"), &mut engine, &log, &clock(), &simulation)
            .await
            .unwrap();
        let retried = handle_submit_choice(&submit("1"), &mut engine, &log, &clock(), &simulation)
            .await
            .unwrap();

        // Assert
        assert!(matches!(failed.outcome, TurnOutcome::Failed { .. }));
        assert!(matches!(retried.outcome, TurnOutcome::Applied { .. }));
        assert_eq!(engine.choices().len(), 1);
        let requests = simulation.requests();
        assert_eq!(requests[1], requests[2]);
    }

    #[tokio::test]
    async fn test_day_regression_appends_one_diagnostic_and_keeps_state() {
        // Arrange
        let simulation = ScriptedSimulation::responding(vec![
            turn_response("evt_01", 3, &["evt_01"], &["A", "B"]),
            turn_response("evt_02", 2, &["evt_01", "evt_02"], &["C"]),
        ]);
        let (mut engine, log) = started(&simulation).await;
        let stats = *engine.stats();
        let event = engine.current_event().cloned();
        let choices = engine.choices().to_vec();
        let history = engine.history().clone();

        // Act
        let report = handle_submit_choice(&submit("1"), &mut engine, &log, &clock(), &simulation)
            .await
            .unwrap();

        // Assert
        assert!(matches!(report.outcome, TurnOutcome::Failed { .. }));
        assert_eq!(*engine.stats(), stats);
        assert_eq!(engine.stats().day, 3);
        assert_eq!(engine.current_event().cloned(), event);
        assert_eq!(engine.choices(), choices.as_slice());
        assert_eq!(*engine.history(), history);
        assert!(!engine.is_busy());

        let log = lock(&log);
        let diagnostics = log
            .entries()
            .iter()
            .filter(|entry| entry.text() == DISCONNECTED_DIAGNOSTIC)
            .count();
        assert_eq!(diagnostics, 1);
        assert_eq!(log.tail().unwrap().text(), DISCONNECTED_DIAGNOSTIC);
    }

    #[tokio::test]
    async fn test_drained_events_carry_their_payload() {
        // Arrange
        let simulation = ScriptedSimulation::responding(vec![
            turn_response("evt_01", 1, &["evt_01"], &["A", "B"]),
            turn_response("evt_02", 2, &["evt_01", "evt_02"], &["C"]),
        ]);
        let (mut engine, log) = started(&simulation).await;

        // Act
        let report = handle_submit_choice(&submit("2"), &mut engine, &log, &clock(), &simulation)
            .await
            .unwrap();

        // Assert
        let submitted = report.events[0].to_payload();
        assert_eq!(submitted["TurnSubmitted"]["is_init"], serde_json::json!(false));
        let applied = report.events[1].to_payload();
        assert_eq!(applied["TurnApplied"]["event_id"], serde_json::json!("evt_02"));
        assert_eq!(applied["TurnApplied"]["stats"]["day"], serde_json::json!(2));
        assert_eq!(
            applied["TurnApplied"]["used_events"],
            serde_json::json!(["evt_01", "evt_02"])
        );
    }

    #[test]
    fn test_commands_name_their_type() {
        assert_eq!(submit("1").command_type(), "session.submit_choice");
        let start = StartPlay {
            correlation_id: Uuid::new_v4(),
        };
        assert_eq!(start.command_type(), "session.start_play");
    }

    #[tokio::test]
    async fn test_failed_opening_can_be_requested_again() {
        let simulation = ScriptedSimulation::new(vec![
            Err(DomainError::Transport("connection refused".into())),
            Ok(turn_response("evt_01", 1, &["evt_01"], &["A"])),
        ]);
        let (mut engine, log) = started(&simulation).await;
        assert!(!engine.is_opened());
        assert_eq!(lock(&log).tail().unwrap().text(), DISCONNECTED_DIAGNOSTIC);

        let report = handle_request_opening(
            &RequestOpening {
                correlation_id: Uuid::new_v4(),
            },
            &mut engine,
            &log,
            &clock(),
            &simulation,
        )
        .await
        .unwrap();

        assert!(matches!(report.outcome, TurnOutcome::Applied { .. }));
        assert!(engine.is_opened());
        assert!(simulation.requests().iter().all(|r| r.is_init));
    }

    #[tokio::test]
    async fn test_choice_outside_playing_is_invalid_phase() {
        let simulation = FailingSimulation::default();
        let mut engine = TurnEngine::new(Uuid::new_v4());
        let log = SessionLog::new().into_shared();

        let result =
            handle_submit_choice(&submit("1"), &mut engine, &log, &clock(), &simulation).await;

        assert!(matches!(result, Err(DomainError::InvalidPhase { .. })));
        assert_eq!(simulation.calls(), 0);
        assert!(lock(&log).is_empty());
    }

    #[tokio::test]
    async fn test_choice_while_turn_in_flight_is_rejected() {
        let simulation = ScriptedSimulation::responding(vec![turn_response(
            "evt_01",
            1,
            &["evt_01"],
            &["A", "B"],
        )]);
        let (mut engine, log) = started(&simulation).await;
        engine
            .begin_turn(
                TurnSelection::Choice(ChoiceIndex::new(0)),
                Uuid::new_v4(),
                &clock(),
            )
            .unwrap();

        let result =
            handle_submit_choice(&submit("2"), &mut engine, &log, &clock(), &simulation).await;

        assert!(matches!(result, Err(DomainError::TurnInFlight)));
        assert_eq!(simulation.requests().len(), 1);
    }

    #[test]
    fn test_command_echo_is_one_based() {
        assert_eq!(
            command_echo(ChoiceIndex::new(2)),
            ">> COMMAND CONFIRMED: OPTION 3"
        );
    }
}
