use serde::Serialize;

use crate::db::types::UserRole;

#[derive(Debug, Serialize)]
pub(crate) struct TokenResponse {
    pub(crate) token: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginResponse {
    pub(crate) token: String,
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) role: UserRole,
}
