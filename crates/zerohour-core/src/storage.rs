//! Durable local storage abstraction.

use async_trait::async_trait;

use crate::error::DomainError;

/// Key-value storage that survives restarts.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Reads the value stored under `key`, or `None` if nothing was written.
    async fn read(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Writes `value` under `key`, replacing any previous value.
    async fn write(&self, key: &str, value: &str) -> Result<(), DomainError>;
}
