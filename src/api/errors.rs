use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::courses::CourseError;
use crate::services::identity::IdentityError;

const SERVER_ERROR_MESSAGE: &str = "Server Error";

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    message: String,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    Unauthorized(&'static str),
    Forbidden(&'static str),
    BadRequest(String),
    NotFound(String),
    /// Duplicate email, already enrolled. Reported as 400 like any other rejected input.
    Conflict(String),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) | Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::Unauthorized(message) | Self::Forbidden(message) => message.to_string(),
            Self::BadRequest(message) | Self::NotFound(message) | Self::Conflict(message) => message,
            // Context was logged where the error was raised.
            Self::Internal(_) => SERVER_ERROR_MESSAGE.to_string(),
        };

        let mut response =
            (status, Json(ErrorResponse { status: status.as_u16(), message })).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::DuplicateEmail => Self::Conflict(err.to_string()),
            IdentityError::InvalidCredentials => Self::BadRequest(err.to_string()),
            IdentityError::NotFound => Self::NotFound(err.to_string()),
            IdentityError::Security(inner) => Self::internal(inner, "Security primitive failed"),
            IdentityError::Repository(inner) => Self::internal(inner, "User store failed"),
        }
    }
}

impl From<CourseError> for ApiError {
    fn from(err: CourseError) -> Self {
        match err {
            CourseError::AlreadyEnrolled | CourseError::StudentAlreadyEnrolled => {
                Self::Conflict(err.to_string())
            }
            CourseError::NotEnrolled => Self::BadRequest(err.to_string()),
            CourseError::Forbidden => {
                Self::Forbidden("You do not have permission to remove this student")
            }
            CourseError::NotFound
            | CourseError::NoGradesFound
            | CourseError::NoGradeFound
            | CourseError::NoCoursesFound(_) => Self::NotFound(err.to_string()),
            CourseError::Repository(inner) => Self::internal(inner, "Course store failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::RepoError;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        serde_json::from_slice(&body).expect("json")
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let err = ApiError::from(CourseError::Repository(RepoError::UniqueViolation("email")));
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["message"], "Server Error");
        assert_eq!(json["status"], 500);
    }

    #[tokio::test]
    async fn unauthorized_sets_challenge_header() {
        let response = ApiError::Unauthorized("Not authorized").into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }

    #[test]
    fn domain_errors_map_to_expected_status() {
        let cases = [
            (ApiError::from(IdentityError::DuplicateEmail), StatusCode::BAD_REQUEST),
            (ApiError::from(IdentityError::InvalidCredentials), StatusCode::BAD_REQUEST),
            (ApiError::from(CourseError::AlreadyEnrolled), StatusCode::BAD_REQUEST),
            (ApiError::from(CourseError::StudentAlreadyEnrolled), StatusCode::BAD_REQUEST),
            (ApiError::from(CourseError::NotEnrolled), StatusCode::BAD_REQUEST),
            (ApiError::from(CourseError::Forbidden), StatusCode::FORBIDDEN),
            (ApiError::from(CourseError::NoGradesFound), StatusCode::NOT_FOUND),
            (ApiError::from(CourseError::NoCoursesFound("none")), StatusCode::NOT_FOUND),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status(), expected);
        }
    }
}
