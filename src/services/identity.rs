use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::core::config::SecuritySettings;
use crate::core::security::{self, SecurityError};
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::db::types::UserRole;
use crate::repositories::{CreateUser, RepoError, Store};

#[derive(Debug, Error)]
pub(crate) enum IdentityError {
    #[error("User already exists")]
    DuplicateEmail,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("User not found")]
    NotFound,
    #[error(transparent)]
    Security(#[from] SecurityError),
    #[error(transparent)]
    Repository(#[from] RepoError),
}

/// A freshly issued session token and the account it was issued for.
#[derive(Debug)]
pub(crate) struct Session {
    pub(crate) token: String,
    pub(crate) user: User,
}

/// Accounts and credentials. Role restrictions on who may call what live in
/// the request guards, not here.
#[derive(Clone)]
pub(crate) struct IdentityService {
    store: Arc<dyn Store>,
    security: SecuritySettings,
}

impl IdentityService {
    pub(crate) fn new(store: Arc<dyn Store>, security: SecuritySettings) -> Self {
        Self { store, security }
    }

    /// Self-registration always yields a Student.
    pub(crate) async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, IdentityError> {
        let user = self.create_user(name, email, password, UserRole::Student).await?;
        let token = self.issue_token(&user)?;
        Ok(Session { token, user })
    }

    pub(crate) async fn create_teacher(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, IdentityError> {
        self.create_user(name, email, password, UserRole::Teacher).await
    }

    /// Unknown email and wrong password are reported identically.
    pub(crate) async fn login(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let Some(user) = self.store.find_user_by_email(email).await? else {
            security::verify_placeholder_password(password);
            return Err(IdentityError::InvalidCredentials);
        };

        let verified = security::verify_password(password, &user.hashed_password).map_err(|err| {
            tracing::warn!(user_id = %user.id, error = %err, "Stored password hash is unreadable");
            IdentityError::InvalidCredentials
        })?;
        if !verified {
            return Err(IdentityError::InvalidCredentials);
        }

        let token = self.issue_token(&user)?;
        Ok(Session { token, user })
    }

    pub(crate) async fn get_profile(&self, user_id: &str) -> Result<User, IdentityError> {
        self.store.find_user(user_id).await?.ok_or(IdentityError::NotFound)
    }

    pub(crate) async fn list_by_role(&self, role: UserRole) -> Result<Vec<User>, IdentityError> {
        Ok(self.store.list_users_by_role(role).await?)
    }

    /// Inserts an account with an explicit role. Also used by startup bootstrap for the first Admin.
    pub(crate) async fn create_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: UserRole,
    ) -> Result<User, IdentityError> {
        if self.store.find_user_by_email(email).await?.is_some() {
            return Err(IdentityError::DuplicateEmail);
        }

        let hashed_password = security::hash_password(password)?;
        let id = Uuid::new_v4().to_string();

        let user = self
            .store
            .insert_user(CreateUser {
                id: &id,
                name,
                email,
                hashed_password,
                role,
                created_at: primitive_now_utc(),
            })
            .await
            .map_err(|err| match err {
                RepoError::UniqueViolation(_) => IdentityError::DuplicateEmail,
                other => IdentityError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, role = %user.role, "User account created");
        Ok(user)
    }

    fn issue_token(&self, user: &User) -> Result<String, IdentityError> {
        Ok(security::create_access_token(&user.id, &user.name, user.role, &self.security, None)?)
    }
}
