//! The append-only narrative log.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use zerohour_core::choice::Choice;

/// How an entry is disclosed when it first appears at the tail of the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealMode {
    /// Shown fully and immediately, without audio.
    Instant,
    /// Disclosed one unit per tick while the typing cue plays.
    Typewriter,
}

/// Progress of an entry's reveal.
///
/// Only the renderer moves an entry forward; the log itself only snaps a
/// superseded tail to `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealState {
    /// Appended but not yet claimed by a reveal.
    Pending,
    /// A reveal has claimed the entry and is extending the visible prefix.
    Animating,
    /// Fully visible. Immutable from here on.
    Done,
}

/// One narrative entry.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    text: String,
    choices: Option<Vec<Choice>>,
    mode: RevealMode,
    state: RevealState,
    /// Number of characters currently visible.
    visible: usize,
    /// Number of characters in `text`.
    length: usize,
}

impl LogEntry {
    /// Creates an entry that animates when it reaches the tail of the log.
    pub fn typewriter(text: impl Into<String>, choices: Option<Vec<Choice>>) -> Self {
        let text = text.into();
        let length = text.chars().count();
        Self {
            text,
            choices,
            mode: RevealMode::Typewriter,
            state: RevealState::Pending,
            visible: 0,
            length,
        }
    }

    /// Creates an entry that is fully visible from the start.
    pub fn instant(text: impl Into<String>) -> Self {
        let text = text.into();
        let length = text.chars().count();
        Self {
            text,
            choices: None,
            mode: RevealMode::Instant,
            state: RevealState::Done,
            visible: length,
            length,
        }
    }

    /// The full narrative text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The choice set that was active when the entry was produced.
    #[must_use]
    pub fn choices(&self) -> Option<&[Choice]> {
        self.choices.as_deref()
    }

    /// The reveal mode tag.
    #[must_use]
    pub fn mode(&self) -> RevealMode {
        self.mode
    }

    /// Current reveal progress.
    #[must_use]
    pub fn reveal_state(&self) -> RevealState {
        self.state
    }

    /// Returns `true` once the full text is visible.
    #[must_use]
    pub fn is_revealed(&self) -> bool {
        self.state == RevealState::Done
    }

    /// Number of characters in the text.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.length
    }

    /// The prefix of the text that is currently visible.
    #[must_use]
    pub fn visible_text(&self) -> &str {
        match self.text.char_indices().nth(self.visible) {
            Some((end, _)) => &self.text[..end],
            None => &self.text,
        }
    }

    /// Moves a pending entry to `Animating`. Returns `false` if the entry was
    /// already claimed or is done.
    pub(crate) fn claim(&mut self) -> bool {
        if self.state != RevealState::Pending {
            return false;
        }
        if self.length == 0 {
            self.state = RevealState::Done;
        } else {
            self.state = RevealState::Animating;
        }
        true
    }

    /// Extends the visible prefix by `units` characters. Returns `true` when
    /// the whole text has become visible.
    pub(crate) fn advance(&mut self, units: usize) -> bool {
        if self.state != RevealState::Animating {
            return self.is_revealed();
        }
        self.visible = self.visible.saturating_add(units).min(self.length);
        if self.visible == self.length {
            self.state = RevealState::Done;
        }
        self.is_revealed()
    }

    /// Makes the full text visible without animation.
    pub(crate) fn freeze(&mut self) {
        self.visible = self.length;
        self.state = RevealState::Done;
    }
}

/// Ordered, append-only sequence of entries for one session.
///
/// Only the tail may be unrevealed: appending snaps the previous tail to
/// `Done`.
#[derive(Debug, Default, Clone, Serialize)]
pub struct SessionLog {
    entries: Vec<LogEntry>,
}

/// A log shared between the engine's handlers and a running reveal.
pub type SharedLog = Arc<Mutex<SessionLog>>;

impl SessionLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps the log for sharing with a reveal task.
    #[must_use]
    pub fn into_shared(self) -> SharedLog {
        Arc::new(Mutex::new(self))
    }

    /// Appends an entry and returns its index.
    pub fn append(&mut self, entry: LogEntry) -> usize {
        if let Some(tail) = self.entries.last_mut() {
            if !tail.is_revealed() {
                tail.freeze();
            }
        }
        self.entries.push(entry);
        self.entries.len() - 1
    }

    /// All entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Entry at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&LogEntry> {
        self.entries.get(index)
    }

    /// The most recently appended entry.
    #[must_use]
    pub fn tail(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    /// Returns `true` if `index` addresses the most recent entry.
    #[must_use]
    pub fn is_tail(&self, index: usize) -> bool {
        index + 1 == self.entries.len()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` once the tail is fully revealed, which is when its
    /// choices become visible and answerable.
    #[must_use]
    pub fn tail_revealed(&self) -> bool {
        self.tail().is_none_or(LogEntry::is_revealed)
    }

    pub(crate) fn entry_mut(&mut self, index: usize) -> Option<&mut LogEntry> {
        self.entries.get_mut(index)
    }
}

/// Locks a shared log, recovering the data if a previous holder panicked.
pub fn lock(log: &SharedLog) -> MutexGuard<'_, SessionLog> {
    log.lock().unwrap_or_else(PoisonError::into_inner)
}
