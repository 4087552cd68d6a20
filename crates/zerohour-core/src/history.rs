//! Narrative event identifiers and the per-session history of shown events.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix reserved for identifiers that end the session.
pub const ENDING_PREFIX: &str = "ending_";

/// Opaque token naming a narrative beat chosen by the simulation service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Wraps a raw identifier.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if this identifier terminates the session.
    ///
    /// The reserved prefix is the only termination signal.
    #[must_use]
    pub fn is_ending(&self) -> bool {
        self.0.starts_with(ENDING_PREFIX)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifiers of events already shown this session.
///
/// The client only carries this collection: it is sent with every turn and
/// replaced wholesale by the value the service returns. It never filters,
/// merges, or reorders entries, so the service keeps sole authority over
/// which events are still unseen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventHistory(Vec<EventId>);

impl EventHistory {
    /// Creates an empty history for a new session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `id` has been shown.
    #[must_use]
    pub fn contains(&self, id: &EventId) -> bool {
        self.0.contains(id)
    }

    /// Returns `true` if every identifier in `other` is also in `self`.
    #[must_use]
    pub fn is_superset_of(&self, other: &Self) -> bool {
        other.0.iter().all(|id| self.contains(id))
    }

    /// Number of identifiers carried.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no events have been shown.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates identifiers in the order the service returned them.
    pub fn iter(&self) -> impl Iterator<Item = &EventId> {
        self.0.iter()
    }
}

impl FromIterator<EventId> for EventHistory {
    fn from_iter<I: IntoIterator<Item = EventId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
