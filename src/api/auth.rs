use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

use crate::api::errors::ApiError;
use crate::api::validation::ValidatedJson;
use crate::core::state::AppState;
use crate::schemas::auth::{LoginResponse, TokenResponse};
use crate::schemas::user::{LoginRequest, RegisterRequest};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/register", post(register)).route("/login", post(login))
}

async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let session =
        state.identity().register(&payload.name, &payload.email, &payload.password).await?;

    Ok((StatusCode::CREATED, Json(TokenResponse { token: session.token })))
}

async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let session = state.identity().login(&payload.email, &payload.password).await?;

    Ok(Json(LoginResponse {
        token: session.token,
        id: session.user.id,
        name: session.user.name,
        role: session.user.role,
    }))
}
