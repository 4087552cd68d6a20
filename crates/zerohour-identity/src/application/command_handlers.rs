//! Command handlers for the session identity context.

use tracing::{info, instrument, warn};
use zerohour_core::rng::DeterministicRng;
use zerohour_core::storage::IdentityStore;

use crate::domain::identifier::{Persistence, SESSION_ID_KEY, SessionId, SessionIdentity};

/// Returns the persisted session identifier, creating and storing one on
/// first use.
///
/// Idempotent across restarts: once a value is stored it is returned
/// unchanged. If storage cannot be read or written, a freshly generated
/// identifier is returned as [`Persistence::Ephemeral`] and the session
/// carries on with it.
#[instrument(skip_all)]
pub async fn handle_get_or_create_identifier(
    store: &dyn IdentityStore,
    rng: &mut dyn DeterministicRng,
) -> SessionIdentity {
    match store.read(SESSION_ID_KEY).await {
        Ok(Some(raw)) => {
            if let Some(id) = SessionId::from_stored(&raw) {
                return SessionIdentity {
                    id,
                    persistence: Persistence::Durable,
                };
            }
            warn!("stored session identifier is blank, replacing it");
        }
        Ok(None) => {}
        Err(err) => {
            warn!(error = %err, "identity storage unavailable, using ephemeral identifier");
            return SessionIdentity {
                id: SessionId::generate(rng),
                persistence: Persistence::Ephemeral,
            };
        }
    }

    let id = SessionId::generate(rng);
    match store.write(SESSION_ID_KEY, id.as_str()).await {
        Ok(()) => {
            info!(session_id = %id, "created session identifier");
            SessionIdentity {
                id,
                persistence: Persistence::Durable,
            }
        }
        Err(err) => {
            warn!(error = %err, "could not persist session identifier, using it for this run only");
            SessionIdentity {
                id,
                persistence: Persistence::Ephemeral,
            }
        }
    }
}
