//! Selectable options offered to the player each turn.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One selectable option. Position in the offered sequence is its only
/// address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// Display text.
    pub text: String,
}

impl Choice {
    /// Creates a choice with the given display text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Zero-based position into the choice sequence offered on the previous
/// turn, as sent to the simulation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChoiceIndex(usize);

impl ChoiceIndex {
    /// Wraps a zero-based position.
    #[must_use]
    pub const fn new(zero_based: usize) -> Self {
        Self(zero_based)
    }

    /// Zero-based position, as transmitted.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }

    /// One-based position, as shown to and typed by the player.
    #[must_use]
    pub const fn one_based(self) -> usize {
        self.0 + 1
    }

    /// Returns `true` if the index addresses an option of `choices`.
    #[must_use]
    pub fn is_within(self, choices: &[Choice]) -> bool {
        self.0 < choices.len()
    }
}

impl fmt::Display for ChoiceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.one_based())
    }
}
