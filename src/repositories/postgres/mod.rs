mod courses;
mod users;


use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::config::StorageBackend;
use crate::repositories::{RepoError, Store};

/// PostgreSQL-backed store. Roster and grade writes rely on primary keys and
/// `ON CONFLICT` so concurrent requests cannot produce duplicate rows.
#[derive(Clone)]
pub(crate) struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Postgres
    }

    async fn ping(&self) -> Result<(), RepoError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db_error) => db_error.code().as_deref() == Some("23505"),
        _ => false,
    }
}
