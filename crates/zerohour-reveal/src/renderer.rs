//! Incremental text reveal.
//!
//! The renderer has two halves. [`frame`] is a pure function describing what
//! an entry looks like right now; a view may call it as often as it likes.
//! [`RevealRenderer::reveal_tail`] is the only code that animates, and it
//! claims the tail entry first, so at most one reveal ever runs per entry.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};
use zerohour_core::choice::Choice;

use crate::audio::{AudioChannel, AudioLease};
use crate::log::{LogEntry, RevealMode, RevealState, SessionLog, SharedLog, lock};

/// Tick interval for narrative entries.
pub const NARRATIVE_TICK: Duration = Duration::from_millis(15);

/// Tick interval for the intro.
pub const INTRO_TICK: Duration = Duration::from_millis(40);

/// Output surface the renderer draws on.
pub trait RevealView: Send + Sync {
    /// Replaces the visible text of entry `index`.
    fn show_text(&self, index: usize, visible: &str);

    /// Scrolls the view so the newest text is on screen.
    fn scroll_to_bottom(&self);

    /// Shows the choice list attached to entry `index`.
    fn show_choices(&self, index: usize, choices: &[Choice]);
}

/// What an entry looks like at this moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryFrame<'a> {
    /// Text to draw.
    pub text: &'a str,
    /// Choices to draw, once the text is fully visible.
    pub choices: Option<&'a [Choice]>,
}

/// Describes how to draw `entry`.
///
/// Entries behind the tail and `instant` entries are always drawn complete.
/// The typewriter tail shows its current prefix and hides its choices until
/// the reveal is done.
#[must_use]
pub fn frame(entry: &LogEntry, is_tail: bool) -> EntryFrame<'_> {
    let complete = !is_tail || entry.mode() == RevealMode::Instant || entry.is_revealed();
    if complete {
        EntryFrame {
            text: entry.text(),
            choices: entry.choices(),
        }
    } else {
        EntryFrame {
            text: entry.visible_text(),
            choices: None,
        }
    }
}

/// How a call to [`RevealRenderer::reveal_tail`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    /// The tail was animated to completion in `ticks` increments.
    Completed {
        /// Number of timer ticks that extended the text.
        ticks: usize,
    },
    /// The tail needed no animation and was drawn complete.
    Frozen,
    /// Another reveal already owns the tail.
    AlreadyClaimed,
    /// A newer entry was appended while animating.
    Superseded,
    /// The reveal task was cancelled before it finished.
    Cancelled,
    /// The log has no entries.
    Empty,
}

/// Animates the tail entry of a log.
#[derive(Clone)]
pub struct RevealRenderer {
    tick: Duration,
    chunk: usize,
    audio: AudioChannel,
    view: Arc<dyn RevealView>,
}

impl std::fmt::Debug for RevealRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevealRenderer")
            .field("tick", &self.tick)
            .field("chunk", &self.chunk)
            .field("audio", &self.audio)
            .finish_non_exhaustive()
    }
}

impl RevealRenderer {
    /// Creates a renderer that reveals one character every [`NARRATIVE_TICK`].
    pub fn new(audio: AudioChannel, view: Arc<dyn RevealView>) -> Self {
        Self {
            tick: NARRATIVE_TICK,
            chunk: 1,
            audio,
            view,
        }
    }

    /// Sets the tick interval.
    #[must_use]
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Sets the number of characters revealed per tick.
    #[must_use]
    pub fn with_chunk(mut self, chunk: usize) -> Self {
        self.chunk = chunk.max(1);
        self
    }

    /// The tick interval.
    #[must_use]
    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Draws one entry as it currently stands. Never starts an animation.
    pub fn draw_entry(&self, log: &SessionLog, index: usize) {
        let Some(entry) = log.get(index) else {
            return;
        };
        let frame = frame(entry, log.is_tail(index));
        self.view.show_text(index, frame.text);
        if let Some(choices) = frame.choices {
            self.view.show_choices(index, choices);
        }
    }

    /// Draws every entry as it currently stands, e.g. after the view was
    /// rebuilt. Never restarts an animation.
    pub fn redraw(&self, log: &SessionLog) {
        for index in 0..log.len() {
            self.draw_entry(log, index);
        }
        self.view.scroll_to_bottom();
    }

    /// Reveals the tail entry.
    ///
    /// Claims the tail, starts the audio cue, and extends the visible prefix
    /// by one chunk per tick, scrolling after each tick. The cue stops the
    /// moment the full text is visible, and only then are the entry's choices
    /// shown. A tail that is `instant` or already done is drawn complete; a
    /// tail that another reveal owns is left alone.
    ///
    /// Dropping the returned future mid-reveal stops the cue and freezes the
    /// entry fully visible, so no timer or sound outlives the reveal.
    pub async fn reveal_tail(&self, log: &SharedLog) -> RevealOutcome {
        let index = {
            let mut guard = lock(log);
            let Some(index) = guard.len().checked_sub(1) else {
                return RevealOutcome::Empty;
            };
            let Some(entry) = guard.entry_mut(index) else {
                return RevealOutcome::Empty;
            };
            match (entry.mode(), entry.reveal_state()) {
                (RevealMode::Instant, _) | (_, RevealState::Done) => {
                    self.draw_entry(&guard, index);
                    self.view.scroll_to_bottom();
                    return RevealOutcome::Frozen;
                }
                (_, RevealState::Animating) => {
                    debug!(index, "tail already being revealed");
                    return RevealOutcome::AlreadyClaimed;
                }
                (_, RevealState::Pending) => {
                    entry.claim();
                    if entry.is_revealed() {
                        self.draw_entry(&guard, index);
                        return RevealOutcome::Completed { ticks: 0 };
                    }
                }
            }
            index
        };

        let lease = self.audio.try_acquire();
        if lease.is_none() {
            warn!(index, "audio cue busy, revealing silently");
        }
        let mut teardown = Teardown {
            log,
            index,
            lease,
            finished: false,
        };

        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of an interval fires immediately.
        ticker.tick().await;

        let mut ticks = 0;
        loop {
            ticker.tick().await;

            let step = {
                let mut guard = lock(log);
                match guard.entry_mut(index) {
                    Some(entry) if entry.reveal_state() == RevealState::Animating => {
                        let done = entry.advance(self.chunk);
                        let choices = done.then(|| entry.choices().map(<[Choice]>::to_vec));
                        Some((entry.visible_text().to_owned(), choices))
                    }
                    _ => None,
                }
            };

            let Some((visible, choices)) = step else {
                teardown.finish();
                debug!(index, ticks, "reveal superseded");
                return RevealOutcome::Superseded;
            };

            ticks += 1;
            self.view.show_text(index, &visible);
            self.view.scroll_to_bottom();

            if let Some(choices) = choices {
                teardown.finish();
                if let Some(choices) = choices {
                    self.view.show_choices(index, &choices);
                }
                debug!(index, ticks, "reveal completed");
                return RevealOutcome::Completed { ticks };
            }
        }
    }

    /// Runs [`Self::reveal_tail`] as a task. Dropping the handle cancels it.
    pub fn spawn_tail(&self, log: SharedLog) -> RevealHandle {
        let renderer = self.clone();
        let task = tokio::spawn(async move { renderer.reveal_tail(&log).await });
        RevealHandle { task: Some(task) }
    }
}

/// Stops the cue and freezes the entry if a reveal ends before completing.
struct Teardown<'a> {
    log: &'a SharedLog,
    index: usize,
    lease: Option<AudioLease>,
    finished: bool,
}

impl Teardown<'_> {
    fn finish(&mut self) {
        self.finished = true;
        self.lease.take();
    }
}

impl Drop for Teardown<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Some(entry) = lock(self.log).entry_mut(self.index) {
            if entry.reveal_state() == RevealState::Animating {
                entry.freeze();
            }
        }
        self.lease.take();
        debug!(index = self.index, "reveal torn down");
    }
}

/// A reveal running as a task.
#[derive(Debug)]
pub struct RevealHandle {
    task: Option<JoinHandle<RevealOutcome>>,
}

impl RevealHandle {
    /// Waits for the reveal to end.
    pub async fn join(mut self) -> RevealOutcome {
        match self.task.take() {
            Some(task) => task.await.unwrap_or(RevealOutcome::Cancelled),
            None => RevealOutcome::Cancelled,
        }
    }
}

impl Drop for RevealHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::audio::tests::CueLog;
    use crate::log::{LogEntry, SessionLog};

    #[derive(Debug, Default)]
    struct ViewLog {
        texts: Mutex<Vec<(usize, String)>>,
        scrolls: Mutex<usize>,
        choices: Mutex<Vec<(usize, usize)>>,
    }

    impl RevealView for ViewLog {
        fn show_text(&self, index: usize, visible: &str) {
            self.texts.lock().unwrap().push((index, visible.to_owned()));
        }

        fn scroll_to_bottom(&self) {
            *self.scrolls.lock().unwrap() += 1;
        }

        fn show_choices(&self, index: usize, choices: &[Choice]) {
            self.choices.lock().unwrap().push((index, choices.len()));
        }
    }

    fn renderer() -> (RevealRenderer, Arc<CueLog>, Arc<ViewLog>) {
        let cue = Arc::new(CueLog::default());
        let view = Arc::new(ViewLog::default());
        let renderer = RevealRenderer::new(AudioChannel::new(cue.clone()), view.clone());
        (renderer, cue, view)
    }

    fn two_choices() -> Option<Vec<Choice>> {
        Some(vec![Choice::new("A"), Choice::new("B")])
    }

    #[test]
    fn test_frame_hides_choices_of_unrevealed_tail() {
        let entry = LogEntry::typewriter("Day 2", two_choices());

        let tail = frame(&entry, true);
        assert_eq!(tail.text, "");
        assert!(tail.choices.is_none());

        let behind = frame(&entry, false);
        assert_eq!(behind.text, "Day 2");
        assert_eq!(behind.choices.map(<[Choice]>::len), Some(2));
    }

    #[test]
    fn test_frame_shows_instant_tail_complete() {
        let entry = LogEntry::instant("ERROR");
        assert_eq!(frame(&entry, true).text, "ERROR");
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_runs_start_increments_stop_then_choices() {
        // Arrange
        let (renderer, cue, view) = renderer();
        let mut log = SessionLog::new();
        log.append(LogEntry::typewriter("abcd", two_choices()));
        let log = log.into_shared();

        // Act
        let outcome = renderer.reveal_tail(&log).await;

        // Assert
        assert_eq!(outcome, RevealOutcome::Completed { ticks: 4 });
        assert_eq!(*cue.0.lock().unwrap(), vec!["start", "stop"]);
        let texts: Vec<String> = view.texts.lock().unwrap().iter().map(|(_, t)| t.clone()).collect();
        assert_eq!(texts, vec!["a", "ab", "abc", "abcd"]);
        assert_eq!(*view.scrolls.lock().unwrap(), 4);
        assert_eq!(*view.choices.lock().unwrap(), vec![(0, 2)]);
        assert!(lock(&log).tail_revealed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_ticks_at_configured_interval() {
        // Arrange
        let (renderer, _cue, _view) = renderer();
        let renderer = renderer.with_tick(Duration::from_millis(40));
        let mut log = SessionLog::new();
        log.append(LogEntry::typewriter("abc", None));
        let log = log.into_shared();
        let started = tokio::time::Instant::now();

        // Act
        renderer.reveal_tail(&log).await;

        // Assert
        assert_eq!(started.elapsed(), Duration::from_millis(120));
    }

    #[tokio::test(start_paused = true)]
    async fn test_chunked_reveal_uses_fewer_ticks() {
        let (renderer, _cue, _view) = renderer();
        let renderer = renderer.with_chunk(2);
        let mut log = SessionLog::new();
        log.append(LogEntry::typewriter("abcde", None));
        let log = log.into_shared();

        let outcome = renderer.reveal_tail(&log).await;

        assert_eq!(outcome, RevealOutcome::Completed { ticks: 3 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_reveal_of_same_entry_is_a_no_op() {
        // Arrange
        let (renderer, cue, view) = renderer();
        let mut log = SessionLog::new();
        log.append(LogEntry::typewriter("abcdef", None));
        let log = log.into_shared();
        let first = renderer.spawn_tail(Arc::clone(&log));
        tokio::time::sleep(Duration::from_millis(35)).await;

        // Act: the view is rebuilt mid-animation and asks again.
        renderer.redraw(&lock(&log));
        let second = renderer.reveal_tail(&log).await;
        let first = first.join().await;

        // Assert
        assert_eq!(second, RevealOutcome::AlreadyClaimed);
        assert_eq!(first, RevealOutcome::Completed { ticks: 6 });
        assert_eq!(*cue.0.lock().unwrap(), vec!["start", "stop"]);
        let increments = view
            .texts
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, text)| !text.is_empty())
            .count();
        // Six ticks plus the one redraw of the partial prefix.
        assert_eq!(increments, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_of_completed_entry_does_not_replay() {
        let (renderer, cue, _view) = renderer();
        let mut log = SessionLog::new();
        log.append(LogEntry::typewriter("ab", None));
        let log = log.into_shared();
        renderer.reveal_tail(&log).await;

        let again = renderer.reveal_tail(&log).await;

        assert_eq!(again, RevealOutcome::Frozen);
        assert_eq!(*cue.0.lock().unwrap(), vec!["start", "stop"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_instant_tail_is_drawn_without_audio() {
        let (renderer, cue, view) = renderer();
        let mut log = SessionLog::new();
        log.append(LogEntry::instant("ERROR: MAINFRAME DISCONNECTED."));
        let log = log.into_shared();

        let outcome = renderer.reveal_tail(&log).await;

        assert_eq!(outcome, RevealOutcome::Frozen);
        assert!(cue.0.lock().unwrap().is_empty());
        assert_eq!(
            view.texts.lock().unwrap().as_slice(),
            &[(0, "ERROR: MAINFRAME DISCONNECTED.".to_owned())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_stops_audio_and_freezes_entry() {
        // Arrange
        let (renderer, cue, view) = renderer();
        let mut log = SessionLog::new();
        log.append(LogEntry::typewriter("abcdefghij", two_choices()));
        let log = log.into_shared();
        let handle = renderer.spawn_tail(Arc::clone(&log));
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Act
        drop(handle);
        tokio::time::sleep(Duration::from_millis(100)).await;

        // Assert
        assert_eq!(*cue.0.lock().unwrap(), vec!["start", "stop"]);
        let ticks_seen = view.texts.lock().unwrap().len();
        assert!(ticks_seen < 10);
        let guard = lock(&log);
        let entry = guard.get(0).unwrap();
        assert_eq!(entry.reveal_state(), RevealState::Done);
        assert_eq!(entry.visible_text(), "abcdefghij");
        drop(guard);

        // A later reveal attempt does not restart the animation.
        assert_eq!(renderer.reveal_tail(&log).await, RevealOutcome::Frozen);
        assert_eq!(cue.0.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_appending_mid_reveal_supersedes_it() {
        // Arrange
        let (renderer, cue, _view) = renderer();
        let mut log = SessionLog::new();
        log.append(LogEntry::typewriter("abcdefghij", None));
        let log = log.into_shared();
        let handle = renderer.spawn_tail(Arc::clone(&log));
        tokio::time::sleep(Duration::from_millis(35)).await;

        // Act
        lock(&log).append(LogEntry::instant("next"));
        let outcome = handle.join().await;

        // Assert
        assert_eq!(outcome, RevealOutcome::Superseded);
        assert_eq!(*cue.0.lock().unwrap(), vec!["start", "stop"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_audio_channel_reveals_silently() {
        let (renderer, cue, _view) = renderer();
        let held = renderer.audio.try_acquire();
        let mut log = SessionLog::new();
        log.append(LogEntry::typewriter("ab", None));
        let log = log.into_shared();

        let outcome = renderer.reveal_tail(&log).await;

        assert_eq!(outcome, RevealOutcome::Completed { ticks: 2 });
        assert_eq!(*cue.0.lock().unwrap(), vec!["start"]);
        drop(held);
    }

    #[tokio::test]
    async fn test_empty_log_has_nothing_to_reveal() {
        let (renderer, _cue, _view) = renderer();
        let log = SessionLog::new().into_shared();
        assert_eq!(renderer.reveal_tail(&log).await, RevealOutcome::Empty);
    }
}
