use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentStaff, CurrentUser};
use crate::api::validation::ValidatedJson;
use crate::core::state::AppState;
use crate::db::types::UserRole;
use crate::schemas::user::{TeacherCreate, TeacherCreatedResponse, UserResponse};

#[cfg(test)]
mod tests;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/create-teacher", post(create_teacher))
        .route("/profile", get(profile))
        .route("/teachers", get(list_teachers))
        .route("/students", get(list_students))
}

async fn create_teacher(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<TeacherCreate>,
) -> Result<(StatusCode, Json<TeacherCreatedResponse>), ApiError> {
    let teacher =
        state.identity().create_teacher(&payload.name, &payload.email, &payload.password).await?;

    tracing::info!(admin_id = %admin.id, teacher_id = %teacher.id, "Teacher account created");

    Ok((
        StatusCode::CREATED,
        Json(TeacherCreatedResponse {
            message: "Teacher created successfully".to_string(),
            teacher: UserResponse::from_db(teacher),
        }),
    ))
}

async fn profile(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.identity().get_profile(&user.id).await?;
    Ok(Json(UserResponse::from_db(user)))
}

async fn list_teachers(
    CurrentStaff(_user): CurrentStaff,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    list_by_role(&state, UserRole::Teacher).await
}

async fn list_students(
    CurrentStaff(_user): CurrentStaff,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    list_by_role(&state, UserRole::Student).await
}

async fn list_by_role(state: &AppState, role: UserRole) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.identity().list_by_role(role).await?;
    Ok(Json(users.into_iter().map(UserResponse::from_db).collect()))
}
