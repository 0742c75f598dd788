//! Session-backed client storage.
//!
//! The visitor's tower-sessions record plays the part of browser local
//! storage: it is private to one client, identified by the session cookie,
//! and persisted in `SQLite` so it survives reloads and restarts.

use amadasun_core::{ClientStorage, StorageError};
use tower_sessions::Session;

use crate::middleware::report_write_errors;

/// [`ClientStorage`] over the current request's session.
#[derive(Debug, Clone)]
pub struct SessionStorage {
    session: Session,
}

impl SessionStorage {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

impl ClientStorage for SessionStorage {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.session
            .get::<String>(key)
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))
    }

    /// Update the record and write it to the store before returning, so a
    /// failing database surfaces here rather than after the response.
    async fn write(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.session
            .insert(key, value)
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        report_write_errors(self.session.save())
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))
    }
}
