//! Test identity stores — in-memory and failing `IdentityStore`
//! implementations.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use zerohour_core::error::DomainError;
use zerohour_core::storage::IdentityStore;

/// An in-memory store that counts writes.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    values: Mutex<HashMap<String, String>>,
    writes: Mutex<usize>,
}

impl MemoryIdentityStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `value` under `key`.
    #[must_use]
    pub fn with_value(key: &str, value: &str) -> Self {
        let store = Self::default();
        store
            .values
            .lock()
            .unwrap()
            .insert(key.to_owned(), value.to_owned());
        store
    }

    /// Returns the value currently stored under `key`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    /// Returns the number of successful writes.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn writes(&self) -> usize {
        *self.writes.lock().unwrap()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn read(&self, key: &str) -> Result<Option<String>, DomainError> {
        Ok(self.value(key))
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), DomainError> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_owned(), value.to_owned());
        *self.writes.lock().unwrap() += 1;
        Ok(())
    }
}

/// A store that reads as empty but rejects every write.
#[derive(Debug)]
pub struct ReadOnlyIdentityStore;

#[async_trait]
impl IdentityStore for ReadOnlyIdentityStore {
    async fn read(&self, _key: &str) -> Result<Option<String>, DomainError> {
        Ok(None)
    }

    async fn write(&self, _key: &str, _value: &str) -> Result<(), DomainError> {
        Err(DomainError::Storage("read-only file system".into()))
    }
}

/// A store that fails every operation.
#[derive(Debug)]
pub struct UnavailableIdentityStore;

#[async_trait]
impl IdentityStore for UnavailableIdentityStore {
    async fn read(&self, _key: &str) -> Result<Option<String>, DomainError> {
        Err(DomainError::Storage("storage unavailable".into()))
    }

    async fn write(&self, _key: &str, _value: &str) -> Result<(), DomainError> {
        Err(DomainError::Storage("storage unavailable".into()))
    }
}
