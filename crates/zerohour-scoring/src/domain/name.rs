//! The display name captured at the end of a game.

use std::fmt;

use serde::Serialize;
use zerohour_core::error::DomainError;

/// A display name with surrounding whitespace removed. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PlayerName(String);

impl PlayerName {
    /// Parses the name as typed.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `raw` is empty or only
    /// whitespace.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::Validation("name must not be blank".to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// The name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
