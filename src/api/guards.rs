use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::{security, state::AppState};
use crate::db::models::User;
use crate::db::types::UserRole;

const NOT_AUTHORIZED: &str = "Not authorized";
const ACCESS_DENIED: &str = "Access denied";

/// Any authenticated account.
pub(crate) struct CurrentUser(pub(crate) User);
pub(crate) struct CurrentAdmin(pub(crate) User);
pub(crate) struct CurrentTeacher(pub(crate) User);
pub(crate) struct CurrentStudent(pub(crate) User);
/// Admin or Teacher.
pub(crate) struct CurrentStaff(pub(crate) User);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RolePolicy {
    Admin,
    Teacher,
    Student,
    Staff,
}

impl RolePolicy {
    fn allows(self, role: UserRole) -> bool {
        match (self, role) {
            (Self::Admin, UserRole::Admin) => true,
            (Self::Admin, UserRole::Teacher | UserRole::Student) => false,
            (Self::Teacher, UserRole::Teacher) => true,
            (Self::Teacher, UserRole::Admin | UserRole::Student) => false,
            (Self::Student, UserRole::Student) => true,
            (Self::Student, UserRole::Admin | UserRole::Teacher) => false,
            (Self::Staff, UserRole::Admin | UserRole::Teacher) => true,
            (Self::Staff, UserRole::Student) => false,
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized(NOT_AUTHORIZED))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::Unauthorized(NOT_AUTHORIZED))?;

        let claims = security::verify_token(token, app_state.settings().security())
            .map_err(|_| ApiError::Unauthorized(NOT_AUTHORIZED))?;

        let user = app_state
            .store()
            .find_user(&claims.sub)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load user"))?;

        let Some(user) = user else {
            tracing::debug!(subject = %claims.sub, "Token subject no longer exists");
            return Err(ApiError::Unauthorized(NOT_AUTHORIZED));
        };

        Ok(CurrentUser(user))
    }
}

async fn require_role(
    parts: &mut Parts,
    state: &AppState,
    policy: RolePolicy,
) -> Result<User, ApiError> {
    let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

    if policy.allows(user.role) {
        Ok(user)
    } else {
        tracing::debug!(user_id = %user.id, role = %user.role, ?policy, "Role check rejected");
        Err(ApiError::Forbidden(ACCESS_DENIED))
    }
}

macro_rules! role_extractor {
    ($name:ident, $policy:expr) => {
        #[async_trait]
        impl FromRequestParts<AppState> for $name {
            type Rejection = ApiError;

            async fn from_request_parts(
                parts: &mut Parts,
                state: &AppState,
            ) -> Result<Self, Self::Rejection> {
                require_role(parts, state, $policy).await.map($name)
            }
        }
    };
}

role_extractor!(CurrentAdmin, RolePolicy::Admin);
role_extractor!(CurrentTeacher, RolePolicy::Teacher);
role_extractor!(CurrentStudent, RolePolicy::Student);
role_extractor!(CurrentStaff, RolePolicy::Staff);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policies_match_role_sets() {
        let roles = [UserRole::Admin, UserRole::Teacher, UserRole::Student];
        let allowed = |policy: RolePolicy| -> Vec<UserRole> {
            roles.iter().copied().filter(|role| policy.allows(*role)).collect()
        };

        assert_eq!(allowed(RolePolicy::Admin), vec![UserRole::Admin]);
        assert_eq!(allowed(RolePolicy::Teacher), vec![UserRole::Teacher]);
        assert_eq!(allowed(RolePolicy::Student), vec![UserRole::Student]);
        assert_eq!(allowed(RolePolicy::Staff), vec![UserRole::Admin, UserRole::Teacher]);
    }
}
