use async_trait::async_trait;

use super::{is_unique_violation, PgStore};
use crate::db::models::User;
use crate::db::types::UserRole;
use crate::repositories::{CreateUser, RepoError, UserRepository};

const COLUMNS: &str = "id, name, email, hashed_password, role, created_at, updated_at";

#[async_trait]
impl UserRepository for PgStore {
    async fn insert_user(&self, params: CreateUser<'_>) -> Result<User, RepoError> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, name, email, hashed_password, role, created_at, updated_at)
             VALUES ($1,$2,$3,$4,$5,$6,$6)
             RETURNING {COLUMNS}",
        ))
        .bind(params.id)
        .bind(params.name)
        .bind(params.email)
        .bind(params.hashed_password)
        .bind(params.role)
        .bind(params.created_at)
        .fetch_one(self.pool())
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                RepoError::UniqueViolation("email")
            } else {
                RepoError::Database(err)
            }
        })
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let user =
            sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE email = $1"))
                .bind(email)
                .fetch_optional(self.pool())
                .await?;
        Ok(user)
    }

    async fn find_users(&self, ids: &[String]) -> Result<Vec<User>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let users =
            sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = ANY($1)"))
                .bind(ids)
                .fetch_all(self.pool())
                .await?;
        Ok(users)
    }

    async fn list_users_by_role(&self, role: UserRole) -> Result<Vec<User>, RepoError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {COLUMNS} FROM users WHERE role = $1 ORDER BY created_at, id"
        ))
        .bind(role)
        .fetch_all(self.pool())
        .await?;
        Ok(users)
    }
}
