//! Aggregate root for the end-of-game score.

use uuid::Uuid;
use zerohour_core::aggregate::AggregateRoot;
use zerohour_core::boundary::{LeaderboardEntry, ScoreSubmission};
use zerohour_core::clock::Clock;
use zerohour_core::error::DomainError;
use zerohour_core::event::EventMetadata;
use zerohour_turn::domain::aggregates::Ending;

use super::events::{
    LeaderboardRanked, ScoreSubmitted, ScoringEvent, ScoringEventKind, ScoringFailed,
    ScoringStage,
};
use super::name::PlayerName;

/// Progress of the scoring handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScorePhase {
    /// Waiting for a name; nothing has reached the archive.
    AwaitingName,
    /// The archive accepted the score; the leaderboard is still missing.
    Submitted,
    /// The leaderboard has been received.
    Ranked,
}

/// The aggregate root for one session's score.
#[derive(Debug)]
pub struct ScoreCard {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Current version (event count).
    pub(crate) version: i64,
    /// Session identifier the score is attributed to.
    pub(crate) user_id: String,
    /// Current phase.
    pub(crate) phase: ScorePhase,
    /// The accepted submission.
    pub(crate) submission: Option<ScoreSubmission>,
    /// The ranked rows, once received.
    pub(crate) leaderboard: Vec<LeaderboardEntry>,
    /// Events recorded since the last drain.
    uncommitted_events: Vec<ScoringEvent>,
}

impl ScoreCard {
    /// Creates a card attributed to `user_id`.
    #[must_use]
    pub fn new(id: Uuid, user_id: impl Into<String>) -> Self {
        Self {
            id,
            version: 0,
            user_id: user_id.into(),
            phase: ScorePhase::AwaitingName,
            submission: None,
            leaderboard: Vec::new(),
            uncommitted_events: Vec::new(),
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> ScorePhase {
        self.phase
    }

    /// Session identifier the score is attributed to.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The submission the archive accepted.
    #[must_use]
    pub fn submission(&self) -> Option<&ScoreSubmission> {
        self.submission.as_ref()
    }

    /// The ranked rows. Empty until ranked.
    #[must_use]
    pub fn leaderboard(&self) -> &[LeaderboardEntry] {
        &self.leaderboard
    }

    /// Builds the submission for `ending` under `name`.
    #[must_use]
    pub fn prepare(&self, name: &PlayerName, ending: &Ending) -> ScoreSubmission {
        ScoreSubmission {
            user_id: self.user_id.clone(),
            name: name.as_str().to_owned(),
            stats: ending.stats,
            ending: ending.event_id.clone(),
        }
    }

    fn record(&mut self, kind: ScoringEventKind, correlation_id: Uuid, clock: &dyn Clock) {
        let event = ScoringEvent {
            metadata: EventMetadata {
                id: Uuid::new_v4(),
                event_type: kind.event_type().to_owned(),
                aggregate_id: self.id,
                sequence_number: self.version + 1,
                correlation_id,
                causation_id: correlation_id,
                occurred_at: clock.now(),
            },
            kind,
        };
        self.apply(&event);
        self.uncommitted_events.push(event);
    }

    /// Records that the archive accepted `submission`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` unless the card is awaiting a name.
    pub fn record_submitted(
        &mut self,
        submission: ScoreSubmission,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if self.phase != ScorePhase::AwaitingName {
            return Err(DomainError::Validation(
                "score has already been submitted".to_owned(),
            ));
        }
        self.record(
            ScoringEventKind::ScoreSubmitted(ScoreSubmitted { submission }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Records the ranked leaderboard.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` unless the score has been submitted
    /// and not yet ranked.
    pub fn record_ranked(
        &mut self,
        entries: Vec<LeaderboardEntry>,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if self.phase != ScorePhase::Submitted {
            return Err(DomainError::Validation(
                "no submitted score is waiting for a leaderboard".to_owned(),
            ));
        }
        self.record(
            ScoringEventKind::LeaderboardRanked(LeaderboardRanked { entries }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Records a failed archive call. The phase is left as it was, so a
    /// retry picks up where the handshake stopped.
    pub fn record_failed(
        &mut self,
        stage: ScoringStage,
        reason: String,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) {
        self.record(
            ScoringEventKind::ScoringFailed(ScoringFailed { stage, reason }),
            correlation_id,
            clock,
        );
    }
}

impl AggregateRoot for ScoreCard {
    type Event = ScoringEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match &event.kind {
            ScoringEventKind::ScoreSubmitted(payload) => {
                self.submission = Some(payload.submission.clone());
                self.phase = ScorePhase::Submitted;
            }
            ScoringEventKind::LeaderboardRanked(payload) => {
                self.leaderboard = payload.entries.clone();
                self.phase = ScorePhase::Ranked;
            }
            ScoringEventKind::ScoringFailed(_) => {}
        }
        self.version += 1;
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}
