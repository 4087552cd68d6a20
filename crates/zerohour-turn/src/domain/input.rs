//! Validation of the player's typed selection.

use zerohour_core::choice::ChoiceIndex;
use zerohour_core::error::DomainError;

/// What a turn submits to the simulation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnSelection {
    /// The first turn of a session; carries no choice.
    Opening,
    /// A selection from the previously offered choices.
    Choice(ChoiceIndex),
}

impl TurnSelection {
    /// The index to transmit, `None` for the opening turn.
    #[must_use]
    pub fn choice_index(self) -> Option<ChoiceIndex> {
        match self {
            Self::Opening => None,
            Self::Choice(index) => Some(index),
        }
    }

    /// `true` for the opening turn.
    #[must_use]
    pub fn is_init(self) -> bool {
        matches!(self, Self::Opening)
    }
}

/// Parses the one-based option number typed by the player.
///
/// # Errors
///
/// Returns `DomainError::Validation` unless `input` is an integer in
/// `[1, offered]`.
pub fn parse_selection(input: &str, offered: usize) -> Result<ChoiceIndex, DomainError> {
    let trimmed = input.trim();
    let number: i64 = trimmed
        .parse()
        .map_err(|_| DomainError::Validation(format!("`{trimmed}` is not an option number")))?;
    usize::try_from(number)
        .ok()
        .filter(|n| (1..=offered).contains(n))
        .map(|n| ChoiceIndex::new(n - 1))
        .ok_or_else(|| {
            DomainError::Validation(format!("option {number} is not between 1 and {offered}"))
        })
}
