//! Session middleware configuration.
//!
//! Sets up `SQLite`-backed sessions using tower-sessions. The session record
//! is the visitor's durable client storage; see [`crate::storage`].

use async_trait::async_trait;
use sqlx::SqlitePool;
use tower_sessions::{
    Expiry, SessionManagerLayer, SessionStore,
    session::{Id, Record},
    session_store,
};
use tower_sessions_sqlx_store::SqliteStore;

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "amadasun_session";

/// Session expiry time in seconds (30 days of inactivity).
const SESSION_EXPIRY_SECONDS: i64 = 30 * 24 * 60 * 60;

tokio::task_local! {
    /// Present while a caller saves the session itself and wants failures back.
    static REPORT_WRITE_ERRORS: ();
}

/// Run a session save that reports store write failures to its caller.
///
/// Outside of this scope [`ResilientStore`] logs and drops write failures.
pub async fn report_write_errors<F: Future>(save: F) -> F::Output {
    REPORT_WRITE_ERRORS.scope((), save).await
}

/// Session store whose write failures never replace the handler's response.
///
/// The session layer saves modified sessions after the handler returns and
/// answers 500 if that save fails. Wrapping the store keeps the rendered
/// response: the failure is logged and the session lives for this request
/// only.
#[derive(Debug, Clone)]
pub struct ResilientStore<S> {
    inner: S,
}

impl<S> ResilientStore<S> {
    #[must_use]
    pub const fn new(inner: S) -> Self {
        Self { inner }
    }

    fn settle(
        result: session_store::Result<()>,
        operation: &'static str,
    ) -> session_store::Result<()> {
        match result {
            Err(e) if REPORT_WRITE_ERRORS.try_with(|()| ()).is_err() => {
                tracing::warn!(error = %e, operation, "Session write failed, response kept");
                Ok(())
            }
            other => other,
        }
    }
}

#[async_trait]
impl<S: SessionStore> SessionStore for ResilientStore<S> {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        let result = self.inner.create(record).await;
        Self::settle(result, "create")
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        let result = self.inner.save(record).await;
        Self::settle(result, "save")
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        self.inner.load(session_id).await
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.inner.delete(session_id).await
    }
}

/// Create the `SQLite` session store and its table.
///
/// # Errors
///
/// Returns `sqlx::Error` if the session table cannot be created.
pub async fn create_session_store(pool: &SqlitePool) -> Result<SqliteStore, sqlx::Error> {
    let store = SqliteStore::new(pool.clone());
    store.migrate().await?;
    Ok(store)
}

/// Create the session layer over an existing store.
///
/// # Arguments
///
/// * `store` - `SQLite` session store
/// * `config` - Storefront configuration (for cookie security)
#[must_use]
pub fn create_session_layer(
    store: SqliteStore,
    config: &StorefrontConfig,
) -> SessionManagerLayer<ResilientStore<SqliteStore>> {
    SessionManagerLayer::new(ResilientStore::new(store))
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::{MemoryStore, Session};

    use super::*;

    /// Store whose writes always fail.
    #[derive(Debug, Clone, Default)]
    struct BrokenStore;

    #[async_trait]
    impl SessionStore for BrokenStore {
        async fn create(&self, _record: &mut Record) -> session_store::Result<()> {
            Err(session_store::Error::Backend("disk full".to_string()))
        }

        async fn save(&self, _record: &Record) -> session_store::Result<()> {
            Err(session_store::Error::Backend("disk full".to_string()))
        }

        async fn load(&self, _session_id: &Id) -> session_store::Result<Option<Record>> {
            Ok(None)
        }

        async fn delete(&self, _session_id: &Id) -> session_store::Result<()> {
            Ok(())
        }
    }

    fn broken_session() -> Session {
        Session::new(None, Arc::new(ResilientStore::new(BrokenStore)), None)
    }

    #[tokio::test]
    async fn test_failed_write_is_absorbed_by_default() {
        let session = broken_session();
        session.insert("k", "v").await.unwrap();
        assert!(session.save().await.is_ok());
    }

    #[tokio::test]
    async fn test_failed_write_is_reported_when_asked() {
        let session = broken_session();
        session.insert("k", "v").await.unwrap();
        assert!(report_write_errors(session.save()).await.is_err());
    }

    #[tokio::test]
    async fn test_working_store_saves_normally() {
        let store = ResilientStore::new(MemoryStore::default());
        let session = Session::new(None, Arc::new(store), None);
        session.insert("k", "v").await.unwrap();
        assert!(report_write_errors(session.save()).await.is_ok());
        assert!(session.id().is_some());
    }
}
