//! The one-shot introduction shown before play begins.

use crate::log::{LogEntry, SessionLog};

const BRIEFING: &str = "Welcome to the command group.\n\n\
Our nation has just noted a novel infection.\n\n\
You are recruited to guide the decision makers.\n\n";

const SIGN_OFF: &str = "Stay prepared to lead from the shadows.";

/// Intro text: a briefing followed by a closing line the view highlights
/// once it has been fully revealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntroScript {
    briefing: String,
    sign_off: String,
}

impl IntroScript {
    /// Creates a script from its two parts.
    pub fn new(briefing: impl Into<String>, sign_off: impl Into<String>) -> Self {
        Self {
            briefing: briefing.into(),
            sign_off: sign_off.into(),
        }
    }

    /// The closing line. Shown highlighted once fully revealed.
    #[must_use]
    pub fn sign_off(&self) -> &str {
        &self.sign_off
    }

    /// Both parts, as revealed.
    #[must_use]
    pub fn full_text(&self) -> String {
        format!("{}{}", self.briefing, self.sign_off)
    }

    /// Returns `true` once `visible` includes the whole closing line.
    #[must_use]
    pub fn sign_off_visible(&self, visible: &str) -> bool {
        visible.len() >= self.briefing.len() + self.sign_off.len() && visible.ends_with(&self.sign_off)
    }

    /// A single-entry log the renderer can reveal.
    #[must_use]
    pub fn to_log(&self) -> SessionLog {
        let mut log = SessionLog::new();
        log.append(LogEntry::typewriter(self.full_text(), None));
        log
    }
}

impl Default for IntroScript {
    fn default() -> Self {
        Self::new(BRIEFING, SIGN_OFF)
    }
}
