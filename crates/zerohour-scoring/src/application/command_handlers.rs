//! Command handlers for the scoring flow.

use tracing::{debug, info, instrument, warn};
use zerohour_core::aggregate::AggregateRoot;
use zerohour_core::boundary::ArchiveBoundary;
use zerohour_core::clock::Clock;
use zerohour_core::command::Command;
use zerohour_core::error::DomainError;
use zerohour_core::event::DomainEvent;
use zerohour_reveal::log::{LogEntry, SharedLog, lock};
use zerohour_turn::domain::aggregates::{SessionPhase, TurnEngine};

use crate::domain::aggregates::{ScoreCard, ScorePhase};
use crate::domain::commands::SubmitScore;
use crate::domain::events::{ScoringEvent, ScoringStage};
use crate::domain::name::PlayerName;

/// Log line appended when the archive cannot be reached.
pub const ARCHIVE_DIAGNOSTIC: &str = "ERROR: ARCHIVE UNREACHABLE.";

/// How a scoring attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreOutcome {
    /// The score is archived and the leaderboard received. The session is
    /// now scored.
    Ranked,
    /// An archive call failed. The session stays in `ending` and the
    /// player may try again.
    Failed {
        /// The call that failed.
        stage: ScoringStage,
        /// Why it failed.
        reason: String,
    },
}

/// The result of a scoring attempt.
#[derive(Debug)]
pub struct ScoreReport {
    /// How the attempt ended.
    pub outcome: ScoreOutcome,
    /// Events recorded while handling the command.
    pub events: Vec<ScoringEvent>,
}

fn drain_events(card: &mut ScoreCard) -> Vec<ScoringEvent> {
    let events = card.uncommitted_events().to_vec();
    card.clear_uncommitted_events();
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

/// Handles the `SubmitScore` command.
///
/// Submits the score, then fetches the leaderboard as a separate request.
/// Either call failing appends one diagnostic entry to the log and leaves
/// the session in `ending`; nothing is retried automatically. A retry after
/// the score was accepted only fetches the leaderboard again.
///
/// # Errors
///
/// Returns `DomainError::InvalidPhase` unless the session is in `ending`,
/// and `DomainError::Validation` for a blank name. Neither contacts the
/// archive.
#[instrument(
    skip_all,
    fields(
        card_id = %card.id,
        correlation_id = %command.correlation_id,
        command_type = command.command_type()
    )
)]
pub async fn handle_submit_score(
    command: &SubmitScore,
    card: &mut ScoreCard,
    engine: &mut TurnEngine,
    log: &SharedLog,
    clock: &dyn Clock,
    archive: &dyn ArchiveBoundary,
) -> Result<ScoreReport, DomainError> {
    let ending = match engine.ending() {
        Some(ending) if engine.phase() == SessionPhase::Ending => ending.clone(),
        _ => {
            return Err(DomainError::InvalidPhase {
                expected: SessionPhase::Ending.name(),
                actual: engine.phase().name(),
            });
        }
    };
    let name = PlayerName::parse(&command.name)?;
    let correlation_id = command.correlation_id;

    if card.phase() == ScorePhase::AwaitingName {
        let submission = card.prepare(&name, &ending);
        if let Err(err) = archive.submit_score(&submission).await {
            return Ok(fail(card, log, ScoringStage::Submit, &err, command, clock));
        }
        card.record_submitted(submission, correlation_id, clock)?;
        info!(name = %name, days = ending.stats.day, "score submitted");
    }

    let entries = match archive.leaderboard().await {
        Ok(entries) => entries,
        Err(err) => {
            return Ok(fail(card, log, ScoringStage::Leaderboard, &err, command, clock));
        }
    };
    info!(rows = entries.len(), "leaderboard received");
    card.record_ranked(entries, correlation_id, clock)?;
    engine.mark_scored(correlation_id, clock)?;

    Ok(ScoreReport {
        outcome: ScoreOutcome::Ranked,
        events: drain_events(card),
    })
}

fn fail(
    card: &mut ScoreCard,
    log: &SharedLog,
    stage: ScoringStage,
    err: &DomainError,
    command: &SubmitScore,
    clock: &dyn Clock,
) -> ScoreReport {
    warn!(error = %err, ?stage, "archive call failed");
    let reason = err.to_string();
    card.record_failed(stage, reason.clone(), command.correlation_id, clock);
    lock(log).append(LogEntry::instant(ARCHIVE_DIAGNOSTIC));
    ScoreReport {
        outcome: ScoreOutcome::Failed { stage, reason },
        events: drain_events(card),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;
    use zerohour_core::boundary::LeaderboardEntry;
    use zerohour_core::history::EventId;
    use zerohour_reveal::log::SessionLog;
    use zerohour_test_support::{FailingArchive, FixedClock, RecordingArchive, turn_response};
    use zerohour_turn::domain::input::TurnSelection;

    use super::*;

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap())
    }

    fn ended_engine() -> TurnEngine {
        let clock = clock();
        let mut engine = TurnEngine::new(Uuid::new_v4());
        engine.activate(Uuid::new_v4(), &clock).unwrap();
        engine.complete_intro(Uuid::new_v4(), &clock).unwrap();
        engine.start_play(Uuid::new_v4(), &clock).unwrap();
        engine
            .begin_turn(TurnSelection::Opening, Uuid::new_v4(), &clock)
            .unwrap();
        engine
            .complete_turn(
                turn_response("ending_quarantine", 8, &["evt_01"], &[]),
                Uuid::new_v4(),
                &clock,
            )
            .unwrap();
        engine
    }

    fn submit(name: &str) -> SubmitScore {
        SubmitScore {
            correlation_id: Uuid::new_v4(),
            name: name.to_owned(),
        }
    }

    fn board() -> Vec<LeaderboardEntry> {
        vec![
            LeaderboardEntry {
                user_id: "other".to_owned(),
                name: "Grace".to_owned(),
                days: 20,
                score: 1500,
            },
            LeaderboardEntry {
                user_id: "user-1".to_owned(),
                name: "Ada".to_owned(),
                days: 8,
                score: 640,
            },
        ]
    }

    #[tokio::test]
    async fn test_submit_then_fetch_leaderboard_and_mark_scored() {
        // Arrange
        let mut engine = ended_engine();
        let mut card = ScoreCard::new(Uuid::new_v4(), "user-1");
        let log = SessionLog::new().into_shared();
        let archive = RecordingArchive::new(board());

        // Act
        let report = handle_submit_score(
            &submit("  Ada "),
            &mut card,
            &mut engine,
            &log,
            &clock(),
            &archive,
        )
        .await
        .unwrap();

        // Assert
        assert_eq!(report.outcome, ScoreOutcome::Ranked);
        let submissions = archive.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].user_id, "user-1");
        assert_eq!(submissions[0].name, "Ada");
        assert_eq!(submissions[0].stats.day, 8);
        assert_eq!(submissions[0].ending, EventId::new("ending_quarantine"));
        assert_eq!(archive.leaderboard_calls(), 1);
        assert_eq!(card.leaderboard(), board().as_slice());
        assert_eq!(engine.phase(), SessionPhase::Scored);
        assert!(lock(&log).is_empty());
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected_without_contacting_archive() {
        let mut engine = ended_engine();
        let mut card = ScoreCard::new(Uuid::new_v4(), "user-1");
        let log = SessionLog::new().into_shared();
        let archive = FailingArchive::default();

        let result = handle_submit_score(
            &submit("   "),
            &mut card,
            &mut engine,
            &log,
            &clock(),
            &archive,
        )
        .await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(archive.calls(), 0);
        assert!(lock(&log).is_empty());
        assert_eq!(engine.phase(), SessionPhase::Ending);
    }

    #[tokio::test]
    async fn test_scoring_outside_ending_is_invalid_phase() {
        let mut engine = TurnEngine::new(Uuid::new_v4());
        let mut card = ScoreCard::new(Uuid::new_v4(), "user-1");
        let log = SessionLog::new().into_shared();
        let archive = FailingArchive::default();

        let result = handle_submit_score(
            &submit("Ada"),
            &mut card,
            &mut engine,
            &log,
            &clock(),
            &archive,
        )
        .await;

        assert!(matches!(result, Err(DomainError::InvalidPhase { .. })));
        assert_eq!(archive.calls(), 0);
    }

    #[tokio::test]
    async fn test_submit_failure_appends_one_diagnostic_and_stays_in_ending() {
        // Arrange
        let mut engine = ended_engine();
        let mut card = ScoreCard::new(Uuid::new_v4(), "user-1");
        let log = SessionLog::new().into_shared();
        let archive = FailingArchive::default();

        // Act
        let report = handle_submit_score(
            &submit("Ada"),
            &mut card,
            &mut engine,
            &log,
            &clock(),
            &archive,
        )
        .await
        .unwrap();

        // Assert
        assert!(matches!(
            report.outcome,
            ScoreOutcome::Failed {
                stage: ScoringStage::Submit,
                ..
            }
        ));
        assert_eq!(archive.calls(), 1);
        assert_eq!(engine.phase(), SessionPhase::Ending);
        assert_eq!(card.phase(), ScorePhase::AwaitingName);
        let log = lock(&log);
        assert_eq!(log.len(), 1);
        assert_eq!(log.tail().unwrap().text(), ARCHIVE_DIAGNOSTIC);
    }

    #[tokio::test]
    async fn test_leaderboard_failure_then_retry_does_not_resubmit() {
        // Arrange
        let mut engine = ended_engine();
        let mut card = ScoreCard::new(Uuid::new_v4(), "user-1");
        let log = SessionLog::new().into_shared();
        let flaky = RecordingArchive::failing_leaderboard();
        let healthy = RecordingArchive::new(board());

        // Act
        let first = handle_submit_score(
            &submit("Ada"),
            &mut card,
            &mut engine,
            &log,
            &clock(),
            &flaky,
        )
        .await
        .unwrap();
        let second = handle_submit_score(
            &submit("Ada"),
            &mut card,
            &mut engine,
            &log,
            &clock(),
            &healthy,
        )
        .await
        .unwrap();

        // Assert
        assert!(matches!(
            first.outcome,
            ScoreOutcome::Failed {
                stage: ScoringStage::Leaderboard,
                ..
            }
        ));
        assert_eq!(flaky.submissions().len(), 1);
        assert_eq!(lock(&log).len(), 1);
        assert_eq!(second.outcome, ScoreOutcome::Ranked);
        assert!(healthy.submissions().is_empty());
        assert_eq!(healthy.leaderboard_calls(), 1);
        assert_eq!(engine.phase(), SessionPhase::Scored);
    }
}
