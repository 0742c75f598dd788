//! Integration tests for Amadasun.
//!
//! The storefront router is driven in-process with
//! `tower::ServiceExt::oneshot`; sessions live in an in-memory `SQLite`
//! database, so no external services are needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p amadasun-integration-tests
//! ```

use std::path::Path;

use amadasun_storefront::{
    app, catalog::load_catalog, config::StorefrontConfig, middleware, state::AppState,
};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode, header},
};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use tower::ServiceExt;

/// Upper bound on response bodies read by tests.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Response parts the tests look at.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// Value of a response header as text.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// The storefront router plus the session cookie of one visitor.
pub struct TestApp {
    router: Router,
    pool: SqlitePool,
    cookie: Option<String>,
}

impl TestApp {
    /// Build the storefront over a fresh in-memory session database and the
    /// bundled product catalog.
    ///
    /// # Panics
    ///
    /// Panics if the database or catalog cannot be set up.
    #[allow(clippy::expect_used)]
    pub async fn new() -> Self {
        // A single connection that never recycles keeps the in-memory
        // database alive for the whole test.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to open in-memory database");
        let session_store = middleware::create_session_store(&pool)
            .await
            .expect("Failed to migrate session store");

        let config = StorefrontConfig::from_lookup(|_| None).expect("Default config is valid");
        let catalog_path =
            Path::new(env!("CARGO_MANIFEST_DIR")).join("../storefront/content/products.json");
        let catalog = load_catalog(&catalog_path).expect("Failed to load catalog");

        let state = AppState::new(config, pool.clone(), catalog);
        Self {
            router: app(state, session_store),
            pool,
            cookie: None,
        }
    }

    /// Drop the session table so every session read and write fails.
    ///
    /// # Panics
    ///
    /// Panics if the statement cannot run.
    #[allow(clippy::expect_used)]
    pub async fn break_session_database(&self) {
        sqlx::query("DROP TABLE tower_sessions")
            .execute(&self.pool)
            .await
            .expect("Failed to drop session table");
    }

    /// Forget the session cookie, as a new visitor would.
    pub fn clear_cookie(&mut self) {
        self.cookie = None;
    }

    /// Send a GET request.
    pub async fn get(&mut self, uri: &str, htmx: bool) -> TestResponse {
        self.send("GET", uri, None, htmx).await
    }

    /// Send a form-encoded POST request.
    pub async fn post(&mut self, uri: &str, form: &str, htmx: bool) -> TestResponse {
        self.send("POST", uri, Some(form), htmx).await
    }

    /// Send a request carrying the visitor's session cookie, keeping any
    /// cookie the response sets.
    ///
    /// # Panics
    ///
    /// Panics if the router fails or the body is not UTF-8.
    #[allow(clippy::expect_used)]
    pub async fn send(
        &mut self,
        method: &str,
        uri: &str,
        form: Option<&str>,
        htmx: bool,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        if htmx {
            builder = builder.header("hx-request", "true");
        }
        let body = match form {
            Some(form) => {
                builder = builder.header(
                    header::CONTENT_TYPE,
                    "application/x-www-form-urlencoded",
                );
                Body::from(form.to_string())
            }
            None => Body::empty(),
        };
        let request = builder.body(body).expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");

        if let Some(cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
        {
            self.cookie = Some(cookie.to_string());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), MAX_BODY_BYTES)
            .await
            .expect("Failed to read body");
        let body = String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8");

        TestResponse {
            status,
            headers,
            body,
        }
    }
}
