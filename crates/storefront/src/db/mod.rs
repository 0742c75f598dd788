//! `SQLite` connection pool for the session store.
//!
//! # Database
//!
//! The storefront keeps no data of its own beyond visitor sessions. Each
//! session record is that visitor's durable client storage and holds their
//! serialized cart (see [`crate::storage`]).
//!
//! ## Tables
//!
//! - `tower_sessions` - created by [`tower_sessions_sqlx_store::SqliteStore::migrate`]

use std::str::FromStr;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

/// Create a `SQLite` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `SQLite` URL (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is invalid or the database cannot be opened.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url.expose_secret())?;

    SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}
