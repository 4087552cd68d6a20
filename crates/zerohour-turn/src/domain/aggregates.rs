//! Aggregate root for a game session.

use std::fmt;

use tracing::{debug, warn};
use uuid::Uuid;
use zerohour_core::aggregate::AggregateRoot;
use zerohour_core::boundary::{TurnRequest, TurnResponse};
use zerohour_core::choice::Choice;
use zerohour_core::clock::Clock;
use zerohour_core::error::DomainError;
use zerohour_core::event::EventMetadata;
use zerohour_core::history::{EventHistory, EventId};
use zerohour_core::stats::Stats;

use super::events::{
    EndingReached, IntroRevealed, PlayStarted, SessionActivated, SessionEvent, SessionEventKind,
    SessionScored, TurnApplied, TurnFailed, TurnSubmitted,
};
use super::input::TurnSelection;

/// Session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Waiting for the player to activate the session.
    Boot,
    /// Revealing the intro; waiting for the player to advance.
    Intro,
    /// Steady state: one turn at a time.
    Playing,
    /// An ending was reached; only name capture is accepted.
    Ending,
    /// The score was archived. Terminal until a full reset.
    Scored,
}

impl SessionPhase {
    /// Lowercase phase name for errors and logs.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Boot => "boot",
            Self::Intro => "intro",
            Self::Playing => "playing",
            Self::Ending => "ending",
            Self::Scored => "scored",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The outstanding turn while the simulation service is working.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PendingTurn {
    pub selection: TurnSelection,
    pub correlation_id: Uuid,
}

/// What the session ended on, kept for the scoring flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ending {
    /// The ending identifier.
    pub event_id: EventId,
    /// Stats at the ending.
    pub stats: Stats,
    /// Ending narrative.
    pub narrative: String,
}

/// How a completed turn changed the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// An ordinary response was applied; new choices are armed.
    Applied {
        /// Narrative for the new log entry.
        narrative: String,
    },
    /// The response ended the session.
    Ending {
        /// The ending identifier.
        event_id: EventId,
        /// Ending narrative.
        narrative: String,
    },
    /// The turn failed; the session is as it was before the turn.
    Failed {
        /// Why the turn failed.
        reason: String,
    },
}

/// The aggregate root for one game session.
#[derive(Debug)]
pub struct TurnEngine {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Current version (event count).
    pub(crate) version: i64,
    /// Current phase.
    pub(crate) phase: SessionPhase,
    /// Set once the intro has been fully revealed.
    pub(crate) intro_revealed: bool,
    /// Set once the opening turn has been applied.
    pub(crate) opened: bool,
    /// The turn awaiting a response. `Some` is the busy guard.
    pub(crate) in_flight: Option<PendingTurn>,
    /// Current stats.
    pub(crate) stats: Stats,
    /// Identifier of the event on screen.
    pub(crate) current_event: Option<EventId>,
    /// Events shown this session, as last returned by the service.
    pub(crate) history: EventHistory,
    /// Options armed for the next turn.
    pub(crate) choices: Vec<Choice>,
    /// Set when the session reached an ending.
    pub(crate) ending: Option<Ending>,
    /// Events recorded since the last drain.
    uncommitted_events: Vec<SessionEvent>,
}

impl TurnEngine {
    /// Creates a session in `boot` with the initial stats.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            version: 0,
            phase: SessionPhase::Boot,
            intro_revealed: false,
            opened: false,
            in_flight: None,
            stats: Stats::initial(),
            current_event: None,
            history: EventHistory::new(),
            choices: Vec::new(),
            ending: None,
            uncommitted_events: Vec::new(),
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Current stats.
    #[must_use]
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Identifier of the event on screen.
    #[must_use]
    pub fn current_event(&self) -> Option<&EventId> {
        self.current_event.as_ref()
    }

    /// Events shown this session.
    #[must_use]
    pub fn history(&self) -> &EventHistory {
        &self.history
    }

    /// Options armed for the next turn. Empty while waiting or after the
    /// session has ended.
    #[must_use]
    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    /// The ending, once reached.
    #[must_use]
    pub fn ending(&self) -> Option<&Ending> {
        self.ending.as_ref()
    }

    /// Returns `true` while a turn request is outstanding.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// The selection of the outstanding turn, if any.
    #[must_use]
    pub fn pending_selection(&self) -> Option<TurnSelection> {
        self.in_flight.map(|pending| pending.selection)
    }

    /// Returns `true` once the intro reveal has finished.
    #[must_use]
    pub fn intro_revealed(&self) -> bool {
        self.intro_revealed
    }

    /// Returns `true` once the opening turn has been applied.
    #[must_use]
    pub fn is_opened(&self) -> bool {
        self.opened
    }

    /// Returns `true` when a typed choice would be accepted.
    #[must_use]
    pub fn accepts_choice(&self) -> bool {
        self.phase == SessionPhase::Playing
            && self.in_flight.is_none()
            && self.opened
            && !self.choices.is_empty()
    }

    fn require_phase(&self, expected: SessionPhase) -> Result<(), DomainError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(DomainError::InvalidPhase {
                expected: expected.name(),
                actual: self.phase.name(),
            })
        }
    }

    fn record(&mut self, kind: SessionEventKind, correlation_id: Uuid, clock: &dyn Clock) {
        let event = SessionEvent {
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

    /// Leaves `boot` for `intro`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPhase` unless in `boot`.
    pub fn activate(&mut self, correlation_id: Uuid, clock: &dyn Clock) -> Result<(), DomainError> {
        self.require_phase(SessionPhase::Boot)?;
        let session_id = self.id;
        self.record(
            SessionEventKind::SessionActivated(SessionActivated { session_id }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Records that the intro has been fully revealed. Repeated calls are
    /// no-ops.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPhase` unless in `intro`.
    pub fn complete_intro(
        &mut self,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.require_phase(SessionPhase::Intro)?;
        if !self.intro_revealed {
            let session_id = self.id;
            self.record(
                SessionEventKind::IntroRevealed(IntroRevealed { session_id }),
                correlation_id,
                clock,
            );
        }
        Ok(())
    }

    /// Leaves `intro` for `playing`. Never happens on its own: the player
    /// must advance explicitly after the intro has finished revealing.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPhase` unless in `intro`, and
    /// `DomainError::Validation` if the intro is still revealing.
    pub fn start_play(&mut self, correlation_id: Uuid, clock: &dyn Clock) -> Result<(), DomainError> {
        self.require_phase(SessionPhase::Intro)?;
        if !self.intro_revealed {
            return Err(DomainError::Validation(
                "intro has not finished revealing".to_owned(),
            ));
        }
        let session_id = self.id;
        self.record(
            SessionEventKind::PlayStarted(PlayStarted { session_id }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Checks that a new turn may be submitted: the session is `playing`
    /// and no request is outstanding.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPhase` outside `playing` and
    /// `DomainError::TurnInFlight` while a request is outstanding.
    pub fn ensure_ready_for_turn(&self) -> Result<(), DomainError> {
        self.require_phase(SessionPhase::Playing)?;
        if self.in_flight.is_some() {
            return Err(DomainError::TurnInFlight);
        }
        Ok(())
    }

    /// Builds the request for a turn and marks it outstanding.
    ///
    /// The opening turn carries no index; every later turn must carry an
    /// index into the currently armed choices, checked here regardless of
    /// any validation the caller already did.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPhase` or `DomainError::TurnInFlight` if
    /// a turn may not be submitted now, and `DomainError::Validation` if the
    /// selection does not fit the session.
    pub fn begin_turn(
        &mut self,
        selection: TurnSelection,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<TurnRequest, DomainError> {
        self.ensure_ready_for_turn()?;
        match selection {
            TurnSelection::Opening if self.opened => {
                return Err(DomainError::Validation(
                    "the opening turn has already been played".to_owned(),
                ));
            }
            TurnSelection::Choice(_) if !self.opened => {
                return Err(DomainError::Validation(
                    "the opening turn has not been played".to_owned(),
                ));
            }
            TurnSelection::Choice(index) if !index.is_within(&self.choices) => {
                return Err(DomainError::Validation(format!(
                    "option {index} is not between 1 and {}",
                    self.choices.len()
                )));
            }
            _ => {}
        }

        let request = TurnRequest {
            stats: self.stats,
            choice_index: selection.choice_index(),
            last_event_id: self.current_event.clone(),
            used_events: self.history.clone(),
            is_init: selection.is_init(),
        };

        self.record(
            SessionEventKind::TurnSubmitted(TurnSubmitted {
                choice_index: request.choice_index,
                is_init: request.is_init,
            }),
            correlation_id,
            clock,
        );

        Ok(request)
    }

    fn check_response(&self, response: &TurnResponse) -> Result<(), DomainError> {
        if response.event_id.as_str().is_empty() {
            return Err(DomainError::Protocol("response has an empty event_id".to_owned()));
        }
        if response.stats.day < self.stats.day {
            return Err(DomainError::Protocol(format!(
                "day went back from {} to {}",
                self.stats.day, response.stats.day
            )));
        }
        if !response.event_id.is_ending() && response.choices.is_empty() {
            return Err(DomainError::Protocol(format!(
                "event {} offers no choices",
                response.event_id
            )));
        }
        Ok(())
    }

    /// Applies the response to the outstanding turn.
    ///
    /// Stats, active event, history, and choices are replaced together. An
    /// ending identifier moves the session to `ending` and arms no choices.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if no turn is outstanding and
    /// `DomainError::Protocol` if the response breaks the exchange contract.
    /// On error nothing is applied.
    pub fn complete_turn(
        &mut self,
        response: TurnResponse,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<TurnOutcome, DomainError> {
        if self.in_flight.is_none() {
            return Err(DomainError::Validation("no turn is in flight".to_owned()));
        }
        self.check_response(&response)?;
        if !response.used_events.is_superset_of(&self.history) {
            warn!(
                sent = self.history.len(),
                returned = response.used_events.len(),
                "service returned a history missing sent events"
            );
        }

        let TurnResponse {
            stats,
            event_id,
            used_events,
            narrative,
            choices,
        } = response;

        if event_id.is_ending() {
            self.record(
                SessionEventKind::EndingReached(EndingReached {
                    stats,
                    event_id: event_id.clone(),
                    used_events,
                    narrative: narrative.clone(),
                }),
                correlation_id,
                clock,
            );
            Ok(TurnOutcome::Ending {
                event_id,
                narrative,
            })
        } else {
            self.record(
                SessionEventKind::TurnApplied(TurnApplied {
                    stats,
                    event_id,
                    used_events,
                    choices,
                }),
                correlation_id,
                clock,
            );
            Ok(TurnOutcome::Applied { narrative })
        }
    }

    /// Abandons the outstanding turn after a transport or protocol failure.
    /// Nothing else changes, so the same or another choice can be retried.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if no turn is outstanding.
    pub fn fail_turn(
        &mut self,
        reason: String,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<TurnOutcome, DomainError> {
        let Some(pending) = self.in_flight else {
            return Err(DomainError::Validation("no turn is in flight".to_owned()));
        };
        debug!(submitted_by = %pending.correlation_id, "abandoning outstanding turn");
        self.record(
            SessionEventKind::TurnFailed(TurnFailed {
                reason: reason.clone(),
            }),
            correlation_id,
            clock,
        );
        Ok(TurnOutcome::Failed { reason })
    }

    /// Moves an ended session to `scored`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPhase` unless in `ending`.
    pub fn mark_scored(&mut self, correlation_id: Uuid, clock: &dyn Clock) -> Result<(), DomainError> {
        self.require_phase(SessionPhase::Ending)?;
        let session_id = self.id;
        self.record(
            SessionEventKind::SessionScored(SessionScored { session_id }),
            correlation_id,
            clock,
        );
        Ok(())
    }
}

impl AggregateRoot for TurnEngine {
    type Event = SessionEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match &event.kind {
            SessionEventKind::SessionActivated(_) => {
                self.phase = SessionPhase::Intro;
            }
            SessionEventKind::IntroRevealed(_) => {
                self.intro_revealed = true;
            }
            SessionEventKind::PlayStarted(_) => {
                self.phase = SessionPhase::Playing;
            }
            SessionEventKind::TurnSubmitted(payload) => {
                let selection = payload
                    .choice_index
                    .map_or(TurnSelection::Opening, TurnSelection::Choice);
                self.in_flight = Some(PendingTurn {
                    selection,
                    correlation_id: event.metadata.correlation_id,
                });
            }
            SessionEventKind::TurnApplied(payload) => {
                self.stats = payload.stats;
                self.current_event = Some(payload.event_id.clone());
                self.history = payload.used_events.clone();
                self.choices = payload.choices.clone();
                self.opened = true;
                self.in_flight = None;
            }
            SessionEventKind::EndingReached(payload) => {
                self.stats = payload.stats;
                self.current_event = Some(payload.event_id.clone());
                self.history = payload.used_events.clone();
                self.choices.clear();
                self.ending = Some(Ending {
                    event_id: payload.event_id.clone(),
                    stats: payload.stats,
                    narrative: payload.narrative.clone(),
                });
                self.opened = true;
                self.in_flight = None;
                self.phase = SessionPhase::Ending;
            }
            SessionEventKind::TurnFailed(_) => {
                self.in_flight = None;
            }
            SessionEventKind::SessionScored(_) => {
                self.phase = SessionPhase::Scored;
            }
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
