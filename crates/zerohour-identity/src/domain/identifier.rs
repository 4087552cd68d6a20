//! The persisted session identifier.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::{Builder, Uuid};
use zerohour_core::rng::DeterministicRng;

/// Storage key the identifier is persisted under.
pub const SESSION_ID_KEY: &str = "zerohour_user_id";

/// Opaque token correlating a player's leaderboard rows across visits.
///
/// Used only for attribution; it is not a credential.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generates a random version 4 UUID token.
    pub fn generate(rng: &mut dyn DeterministicRng) -> Self {
        let mut bytes = [0u8; 16];
        rng.fill_bytes(&mut bytes);
        let uuid: Uuid = Builder::from_random_bytes(bytes).into_uuid();
        Self(uuid.hyphenated().to_string())
    }

    /// Wraps a previously stored token. Blank values are rejected.
    #[must_use]
    pub fn from_stored(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_owned()))
    }

    /// The raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether the identifier survives a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persistence {
    /// Read from, or written to, durable storage.
    Durable,
    /// Storage was unavailable; the identifier lives for this run only.
    Ephemeral,
}

/// The identifier in use for this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    /// The identifier.
    pub id: SessionId,
    /// Whether it was persisted.
    pub persistence: Persistence,
}

#[cfg(test)]
mod tests {
    use super::*;
    use zerohour_test_support::SequenceRng;

    #[test]
    fn test_generate_produces_canonical_v4_token() {
        let mut rng = SequenceRng::new(vec![0xAB]);

        let id = SessionId::generate(&mut rng);

        let parsed = Uuid::parse_str(id.as_str()).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
        assert_eq!(parsed.get_variant(), uuid::Variant::RFC4122);
        assert_eq!(id.as_str().len(), 36);
        assert_eq!(id.as_str(), "abababab-abab-4bab-abab-abababababab");
    }

    #[test]
    fn test_generate_uses_rng_bytes() {
        let first = SessionId::generate(&mut SequenceRng::new(vec![1, 2, 3]));
        let second = SessionId::generate(&mut SequenceRng::new(vec![4, 5, 6]));
        assert_ne!(first, second);
    }

    #[test]
    fn test_from_stored_keeps_value_and_rejects_blank() {
        assert_eq!(
            SessionId::from_stored("legacy-token").unwrap().as_str(),
            "legacy-token"
        );
        assert!(SessionId::from_stored("   ").is_none());
    }
}
