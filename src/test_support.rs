use std::sync::{Arc, OnceLock};

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::api;
use crate::core::{config::Settings, security, state::AppState};
use crate::db::models::User;
use crate::db::types::UserRole;
use crate::repositories::{memory::MemoryStore, postgres::PgStore};

const TEST_SECRET_KEY: &str = "test-secret";

pub(crate) struct TestContext {
    pub(crate) state: AppState,
    pub(crate) app: api::router::App,
    _guard: OwnedMutexGuard<()>,
}

/// Serialises tests that read or write process environment variables.
pub(crate) async fn env_lock() -> OwnedMutexGuard<()> {
    static LOCK: OnceLock<Arc<Mutex<()>>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Arc::new(Mutex::new(()))).clone();
    lock.lock_owned().await
}

pub(crate) fn set_test_env() {
    std::env::set_var("EDU_ENV", "test");
    std::env::set_var("EDU_STRICT_CONFIG", "0");
    std::env::set_var("STORAGE_BACKEND", "memory");
    std::env::set_var("SECRET_KEY", TEST_SECRET_KEY);
    std::env::set_var("PROMETHEUS_ENABLED", "0");
    for key in [
        "API_PREFIX",
        "ACCESS_TOKEN_EXPIRE_MINUTES",
        "ALGORITHM",
        "PROJECT_NAME",
        "BACKEND_CORS_ORIGINS",
        "FIRST_SUPERUSER_NAME",
        "FIRST_SUPERUSER_EMAIL",
        "FIRST_SUPERUSER_PASSWORD",
        "EDU_HOST",
        "EDU_PORT",
    ] {
        std::env::remove_var(key);
    }
}

/// State over a fresh in-memory store, built from the current environment.
/// Callers hold the env lock.
pub(crate) fn memory_state() -> AppState {
    let settings = Settings::load().expect("settings");
    AppState::new(settings, Arc::new(MemoryStore::new()))
}

pub(crate) async fn setup_test_context() -> TestContext {
    let guard = env_lock().await;
    set_test_env();

    let state = memory_state();
    let app = api::router::router(state.clone());

    TestContext { state, app, _guard: guard }
}

/// A migrated store over `DATABASE_URL`, or `None` when no database is configured.
pub(crate) async fn pg_store() -> Option<PgStore> {
    let database_url = std::env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty())?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("db pool");
    crate::db::run_migrations(&pool).await.expect("migrations");

    Some(PgStore::new(pool))
}

pub(crate) async fn insert_user(state: &AppState, name: &str, email: &str, role: UserRole) -> User {
    state.identity().create_user(name, email, "password-1", role).await.expect("insert user")
}

pub(crate) fn bearer_token(user: &User, state: &AppState) -> String {
    security::create_access_token(&user.id, &user.name, user.role, state.settings().security(), None)
        .expect("token")
}

pub(crate) fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    if let Some(body) = body {
        let bytes = serde_json::to_vec(&body).expect("serialize body");
        builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(bytes))
            .expect("request body")
    } else {
        builder.body(Body::empty()).expect("request body")
    }
}

pub(crate) async fn read_json(response: axum::response::Response<Body>) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("response body");
    serde_json::from_slice(&body).unwrap_or_else(|err| {
        let body_text = String::from_utf8_lossy(&body);
        panic!("json parse: {err}; body: {body_text}");
    })
}
