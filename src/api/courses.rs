use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentStaff, CurrentStudent, CurrentTeacher, CurrentUser};
use crate::api::validation::ValidatedJson;
use crate::core::state::AppState;
use crate::schemas::course::{
    CourseCreate, CourseDetailResponse, CourseMessageResponse, CourseUpdate,
    EnrollStudentRequest, GradeAssign, GradeResponse,
};
use crate::schemas::MessageResponse;


pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_course).get(list_courses))
        .route("/teacher/courses", get(list_teacher_courses))
        .route("/student/enrolled", get(list_enrolled_courses))
        .route("/:course_id", get(get_course).put(update_course).delete(delete_course))
        .route("/:course_id/enroll", post(enroll))
        .route("/:course_id/enroll-student", post(enroll_student))
        .route("/:course_id/students/:student_id", delete(remove_student))
        .route("/:course_id/grade", post(assign_grade))
        .route("/:course_id/student/grades", get(my_grades))
        .route("/:course_id/student/grade", get(my_grade))
}

async fn create_course(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CourseCreate>,
) -> Result<(StatusCode, Json<CourseMessageResponse>), ApiError> {
    let course = state.courses().create(payload.into_new_course()).await?;

    tracing::info!(
        admin_id = %admin.id,
        course_id = %course.course.id,
        teacher_id = %course.course.teacher_id,
        "Course created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CourseMessageResponse::new("Course created successfully", course)),
    ))
}

async fn list_courses(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseDetailResponse>>, ApiError> {
    let courses = state.courses().list_all().await?;
    Ok(Json(courses.into_iter().map(CourseDetailResponse::from_view).collect()))
}

async fn get_course(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<CourseDetailResponse>, ApiError> {
    let course = state.courses().get_by_id(&course_id).await?;
    Ok(Json(CourseDetailResponse::from_view(course)))
}

async fn update_course(
    CurrentStaff(user): CurrentStaff,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    ValidatedJson(payload): ValidatedJson<CourseUpdate>,
) -> Result<Json<CourseMessageResponse>, ApiError> {
    let course = state.courses().update(&course_id, payload.into_changes()).await?;

    tracing::info!(user_id = %user.id, course_id = %course_id, "Course updated");
    Ok(Json(CourseMessageResponse::new("Course updated successfully", course)))
}

async fn delete_course(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.courses().delete(&course_id).await?;

    tracing::info!(admin_id = %admin.id, course_id = %course_id, "Course deleted");
    Ok(Json(MessageResponse::new("Course deleted successfully")))
}

async fn enroll(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<CourseMessageResponse>, ApiError> {
    let course = state.courses().enroll(&course_id, &student.id).await?;
    Ok(Json(CourseMessageResponse::new("Enrolled in course successfully", course)))
}

async fn enroll_student(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    ValidatedJson(payload): ValidatedJson<EnrollStudentRequest>,
) -> Result<Json<CourseMessageResponse>, ApiError> {
    let course = state.courses().enroll_by_admin(&course_id, &payload.student_id).await?;

    tracing::info!(
        admin_id = %admin.id,
        course_id = %course_id,
        student_id = %payload.student_id,
        "Student enrolled by admin"
    );
    Ok(Json(CourseMessageResponse::new("Student enrolled successfully", course)))
}

async fn remove_student(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path((course_id, student_id)): Path<(String, String)>,
) -> Result<Json<CourseMessageResponse>, ApiError> {
    let course =
        state.courses().remove_student(&course_id, &student_id, &user.id, user.role).await?;
    Ok(Json(CourseMessageResponse::new("Student removed from course", course)))
}

async fn assign_grade(
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    ValidatedJson(payload): ValidatedJson<GradeAssign>,
) -> Result<Json<CourseMessageResponse>, ApiError> {
    let course =
        state.courses().assign_grade(&course_id, &payload.student_id, payload.grade).await?;

    tracing::info!(
        teacher_id = %teacher.id,
        course_id = %course_id,
        student_id = %payload.student_id,
        "Grade assigned"
    );
    Ok(Json(CourseMessageResponse::new("Grade assigned successfully", course)))
}

async fn my_grades(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<Vec<GradeResponse>>, ApiError> {
    let grades = state.courses().grades_for_student(&course_id, &student.id).await?;
    Ok(Json(grades.into_iter().map(GradeResponse::from_view).collect()))
}

async fn my_grade(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<GradeResponse>, ApiError> {
    let grade = state.courses().grade_for_student(&course_id, &student.id).await?;
    Ok(Json(GradeResponse::from_view(grade)))
}

async fn list_teacher_courses(
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseDetailResponse>>, ApiError> {
    let courses = state.courses().list_for_teacher(&teacher.id).await?;
    Ok(Json(courses.into_iter().map(CourseDetailResponse::from_view).collect()))
}

async fn list_enrolled_courses(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseDetailResponse>>, ApiError> {
    let courses = state.courses().list_for_student(&student.id).await?;
    Ok(Json(courses.into_iter().map(CourseDetailResponse::from_view).collect()))
}
