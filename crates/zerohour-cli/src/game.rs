//! The interactive game driver.
//!
//! Reads one line per prompt and drives a session from boot through
//! scoring. Every failure that is not a terminal I/O error returns to a
//! prompt; end of input ends the program.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};
use uuid::Uuid;
use zerohour_core::boundary::{ArchiveBoundary, SimulationBoundary, TurnRequest, TurnResponse};
use zerohour_core::clock::Clock;
use zerohour_core::error::DomainError;
use zerohour_core::rng::DeterministicRng;
use zerohour_core::storage::IdentityStore;
use zerohour_identity::application::command_handlers::handle_get_or_create_identifier;
use zerohour_identity::domain::identifier::{Persistence, SessionIdentity};
use zerohour_reveal::audio::AudioChannel;
use zerohour_reveal::intro::IntroScript;
use zerohour_reveal::log::{SessionLog, SharedLog, lock};
use zerohour_reveal::renderer::{RevealRenderer, RevealView};
use zerohour_scoring::application::command_handlers::{ScoreOutcome, handle_submit_score};
use zerohour_scoring::application::query_handlers::get_leaderboard_view;
use zerohour_scoring::domain::aggregates::ScoreCard;
use zerohour_scoring::domain::commands::SubmitScore;
use zerohour_turn::application::command_handlers::{
    TurnReport, handle_activate, handle_complete_intro, handle_request_opening,
    handle_start_play, handle_submit_choice,
};
use zerohour_turn::application::query_handlers::get_session_view;
use zerohour_turn::domain::aggregates::{SessionPhase, TurnEngine};
use zerohour_turn::domain::commands::{
    ActivateSession, CompleteIntro, RequestOpening, StartPlay, SubmitChoice,
};

use crate::error::AppError;
use crate::terminal::{Console, TerminalView, leaderboard_lines, stat_footer};

/// Header printed once at startup.
pub const HEADER: &str = "SYS.OP.2025 :: CONNECTED";
/// Prompt that activates a session.
pub const BOOT_PROMPT: &str = "BOOT SYSTEM_ [ENTER] ";
/// Prompt that leaves the intro.
pub const INITIALIZE_PROMPT: &str = "INITIALIZE PROTOCOLS [ENTER] ";
/// Prompt for an option number.
pub const CHOICE_PROMPT: &str = ">> ENTER OPTION ID: ";
/// Prompt that retries a failed opening turn.
pub const RECONNECT_PROMPT: &str = ">> RECONNECT [ENTER] ";
/// Prompt for the archive name.
pub const NAME_PROMPT: &str = ">> ENTER NAME FOR THE ARCHIVE: ";
/// Prompt offered once the session is scored.
pub const REBOOT_PROMPT: &str = "REBOOT SYSTEM_ [ENTER] ";
/// Shown while a turn is outstanding.
pub const WAITING: &str = "CALCULATING PROJECTIONS...";
/// Shown for rejected input.
pub const INVALID_INPUT: &str = "ERR";

/// The collaborators a game talks to.
#[derive(Clone, Copy)]
pub struct Boundaries<'a> {
    /// The simulation service.
    pub simulation: &'a dyn SimulationBoundary,
    /// The score archive.
    pub archive: &'a dyn ArchiveBoundary,
    /// Durable storage for the session identifier.
    pub identity: &'a dyn IdentityStore,
    /// Time source for domain events.
    pub clock: &'a dyn Clock,
}

/// Reveal settings.
#[derive(Debug, Clone)]
pub struct Pacing {
    /// Narrative tick.
    pub tick: Duration,
    /// Intro tick.
    pub intro_tick: Duration,
    /// The intro to play.
    pub intro: IntroScript,
}

enum SessionEnd {
    Reboot,
    Quit,
}

/// One terminal game, possibly spanning several sessions.
pub struct Game<'a, R> {
    input: R,
    console: Console,
    boundaries: Boundaries<'a>,
    audio: AudioChannel,
    pacing: Pacing,
}

impl<'a, R> Game<'a, R>
where
    R: AsyncBufRead + Unpin,
{
    /// Creates a game reading from `input` and writing to `console`.
    pub fn new(
        input: R,
        console: Console,
        boundaries: Boundaries<'a>,
        audio: AudioChannel,
        pacing: Pacing,
    ) -> Self {
        Self {
            input,
            console,
            boundaries,
            audio,
            pacing,
        }
    }

    /// Runs sessions until the input ends.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the terminal cannot be read or written.
    pub async fn run(mut self, rng: &mut dyn DeterministicRng) -> Result<(), AppError> {
        let identity = handle_get_or_create_identifier(self.boundaries.identity, rng).await;
        if identity.persistence == Persistence::Ephemeral {
            warn!("session identifier will not survive a restart");
        }
        self.console.line(HEADER)?;

        loop {
            match self.play_session(&identity).await? {
                SessionEnd::Reboot => info!("rebooting"),
                SessionEnd::Quit => return Ok(()),
            }
        }
    }

    async fn read_line(&mut self, prompt: &str) -> Result<Option<String>, AppError> {
        self.console.prompt(prompt)?;
        let mut line = String::new();
        let read = self.input.read_line(&mut line).await?;
        self.console.end_line();
        if read == 0 {
            debug!("input closed");
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_owned()))
    }

    fn announced(&self) -> Announced<'_> {
        Announced {
            console: &self.console,
            inner: self.boundaries.simulation,
        }
    }

    fn renderer(&self, tick: Duration) -> RevealRenderer {
        let view: Arc<dyn RevealView> = Arc::new(TerminalView::new(self.console.clone()));
        RevealRenderer::new(self.audio.clone(), view).with_tick(tick)
    }

    async fn play_session(&mut self, identity: &SessionIdentity) -> Result<SessionEnd, AppError> {
        let clock = self.boundaries.clock;
        let mut engine = TurnEngine::new(Uuid::new_v4());
        let log = SessionLog::new().into_shared();
        let renderer = self.renderer(self.pacing.tick);

        if self.read_line(BOOT_PROMPT).await?.is_none() {
            return Ok(SessionEnd::Quit);
        }
        note_rejection(handle_activate(
            &ActivateSession {
                correlation_id: Uuid::new_v4(),
            },
            &mut engine,
            clock,
        ));

        let intro_log = self.pacing.intro.to_log().into_shared();
        self.renderer(self.pacing.intro_tick)
            .reveal_tail(&intro_log)
            .await;
        let signed_off = lock(&intro_log)
            .tail()
            .is_some_and(|entry| self.pacing.intro.sign_off_visible(entry.visible_text()));
        if signed_off {
            self.console.highlight_line(self.pacing.intro.sign_off())?;
        }
        note_rejection(handle_complete_intro(
            &CompleteIntro {
                correlation_id: Uuid::new_v4(),
            },
            &mut engine,
            clock,
        ));
        if self.read_line(INITIALIZE_PROMPT).await?.is_none() {
            return Ok(SessionEnd::Quit);
        }

        let started = handle_start_play(
            &StartPlay {
                correlation_id: Uuid::new_v4(),
            },
            &mut engine,
            &log,
            clock,
            &self.announced(),
        )
        .await;
        note_rejection(started);

        let mut drawn = 0;
        loop {
            drawn = self.show_new_entries(&renderer, &log, drawn).await;
            self.console.line(&stat_footer(&get_session_view(&engine)))?;

            match engine.phase() {
                SessionPhase::Playing => {}
                SessionPhase::Ending => break,
                other => {
                    warn!(phase = other.name(), "unexpected phase during play");
                    return Ok(SessionEnd::Quit);
                }
            }

            let report = if engine.is_opened() {
                self.next_choice(&mut engine, &log).await?
            } else {
                if self.read_line(RECONNECT_PROMPT).await?.is_none() {
                    return Ok(SessionEnd::Quit);
                }
                Some(
                    handle_request_opening(
                        &RequestOpening {
                            correlation_id: Uuid::new_v4(),
                        },
                        &mut engine,
                        &log,
                        clock,
                        &self.announced(),
                    )
                    .await,
                )
            };
            match report {
                None => return Ok(SessionEnd::Quit),
                Some(report) => note_rejection(report),
            }
        }

        if !self.score(&mut engine, &log, &renderer, identity, drawn).await? {
            return Ok(SessionEnd::Quit);
        }
        if self.read_line(REBOOT_PROMPT).await?.is_none() {
            return Ok(SessionEnd::Quit);
        }
        Ok(SessionEnd::Reboot)
    }

    /// Prompts until the player types an acceptable option number, then
    /// runs the turn. `None` means the input ended.
    async fn next_choice(
        &mut self,
        engine: &mut TurnEngine,
        log: &SharedLog,
    ) -> Result<Option<Result<TurnReport, DomainError>>, AppError> {
        loop {
            let Some(input) = self.read_line(CHOICE_PROMPT).await? else {
                return Ok(None);
            };
            let command = SubmitChoice {
                correlation_id: Uuid::new_v4(),
                input,
            };
            let result = handle_submit_choice(
                &command,
                engine,
                log,
                self.boundaries.clock,
                &self.announced(),
            )
            .await;
            match result {
                Err(DomainError::Validation(reason)) => {
                    debug!(%reason, "input rejected");
                    self.console.line(INVALID_INPUT)?;
                }
                other => return Ok(Some(other)),
            }
        }
    }

    /// Runs the scoring flow. Returns `false` if the input ended.
    async fn score(
        &mut self,
        engine: &mut TurnEngine,
        log: &SharedLog,
        renderer: &RevealRenderer,
        identity: &SessionIdentity,
        mut drawn: usize,
    ) -> Result<bool, AppError> {
        if let Some(ending) = engine.ending() {
            self.console
                .line(&format!("SIMULATION TERMINATED :: {}", ending.event_id))?;
        }
        let mut card = ScoreCard::new(Uuid::new_v4(), identity.id.as_str());

        loop {
            let Some(name) = self.read_line(NAME_PROMPT).await? else {
                return Ok(false);
            };
            let result = handle_submit_score(
                &SubmitScore {
                    correlation_id: Uuid::new_v4(),
                    name,
                },
                &mut card,
                engine,
                log,
                self.boundaries.clock,
                self.boundaries.archive,
            )
            .await;
            match result {
                Ok(report) if report.outcome == ScoreOutcome::Ranked => {
                    for line in leaderboard_lines(&get_leaderboard_view(&card)) {
                        self.console.line(&line)?;
                    }
                    return Ok(true);
                }
                Ok(_) => {
                    drawn = self.show_new_entries(renderer, log, drawn).await;
                }
                Err(DomainError::Validation(reason)) => {
                    debug!(%reason, "name rejected");
                    self.console.line(INVALID_INPUT)?;
                }
                Err(err) => {
                    warn!(error = %err, "scoring unavailable");
                    return Ok(true);
                }
            }
        }
    }

    /// Brings the screen up to date with the log and, if entries were
    /// appended since `drawn`, reveals the tail. Returns the new count of
    /// drawn entries.
    async fn show_new_entries(
        &self,
        renderer: &RevealRenderer,
        log: &SharedLog,
        drawn: usize,
    ) -> usize {
        let len = {
            let guard = lock(log);
            renderer.redraw(&guard);
            guard.len()
        };
        if len > drawn {
            let outcome = renderer.spawn_tail(Arc::clone(log)).join().await;
            debug!(?outcome, "tail revealed");
        }
        len
    }
}

/// Shows the waiting indicator whenever a turn actually reaches the
/// simulation service.
struct Announced<'s> {
    console: &'s Console,
    inner: &'s dyn SimulationBoundary,
}

#[async_trait]
impl SimulationBoundary for Announced<'_> {
    async fn simulate(&self, request: &TurnRequest) -> Result<TurnResponse, DomainError> {
        if let Err(err) = self.console.line(WAITING) {
            warn!(error = %err, "terminal write failed");
        }
        self.inner.simulate(request).await
    }
}

fn note_rejection<T>(result: Result<T, DomainError>) {
    if let Err(err) = result {
        warn!(error = %err, "command rejected");
    }
}
