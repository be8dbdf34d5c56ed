pub(crate) mod memory;
pub(crate) mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use time::{Date, PrimitiveDateTime};

use crate::core::config::StorageBackend;
use crate::db::models::{CourseAggregate, User};
use crate::db::types::UserRole;

#[derive(Debug, Error)]
pub(crate) enum RepoError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("unique constraint violated on {0}")]
    UniqueViolation(&'static str),
}

pub(crate) struct CreateUser<'a> {
    pub(crate) id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) email: &'a str,
    pub(crate) hashed_password: String,
    pub(crate) role: UserRole,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) struct CreateCourse<'a> {
    pub(crate) id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: &'a str,
    pub(crate) start_date: Date,
    pub(crate) end_date: Date,
    pub(crate) teacher_id: &'a str,
    pub(crate) created_at: PrimitiveDateTime,
}

/// Field-level merge; `None` keeps the stored value. Roster and grades are not editable here.
#[derive(Debug, Default)]
pub(crate) struct UpdateCourse {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) start_date: Option<Date>,
    pub(crate) end_date: Option<Date>,
    pub(crate) teacher_id: Option<String>,
    pub(crate) updated_at: Option<PrimitiveDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EnrollOutcome {
    Enrolled,
    AlreadyEnrolled,
    CourseMissing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GradeOutcome {
    Inserted,
    Overwritten,
    NotEnrolled,
    CourseMissing,
}

#[async_trait]
pub(crate) trait UserRepository: Send + Sync {
    async fn insert_user(&self, params: CreateUser<'_>) -> Result<User, RepoError>;

    async fn find_user(&self, id: &str) -> Result<Option<User>, RepoError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Users with any of `ids`, in no particular order; unknown ids are skipped.
    async fn find_users(&self, ids: &[String]) -> Result<Vec<User>, RepoError>;

    async fn list_users_by_role(&self, role: UserRole) -> Result<Vec<User>, RepoError>;
}

#[async_trait]
pub(crate) trait CourseRepository: Send + Sync {
    async fn insert_course(&self, params: CreateCourse<'_>) -> Result<CourseAggregate, RepoError>;

    async fn find_course(&self, id: &str) -> Result<Option<CourseAggregate>, RepoError>;

    async fn list_courses(&self) -> Result<Vec<CourseAggregate>, RepoError>;

    async fn list_courses_for_teacher(
        &self,
        teacher_id: &str,
    ) -> Result<Vec<CourseAggregate>, RepoError>;

    async fn list_courses_for_student(
        &self,
        student_id: &str,
    ) -> Result<Vec<CourseAggregate>, RepoError>;

    /// Returns `false` when the course does not exist.
    async fn update_course(&self, id: &str, params: UpdateCourse) -> Result<bool, RepoError>;

    /// Removes the course with its roster and grades. Returns `false` when absent.
    async fn delete_course(&self, id: &str) -> Result<bool, RepoError>;

    /// Adds the student unless already present; the check and the write are one step.
    async fn add_student(
        &self,
        course_id: &str,
        student_id: &str,
        enrolled_at: PrimitiveDateTime,
    ) -> Result<EnrollOutcome, RepoError>;

    /// Drops the student from the roster, leaving grades alone. Absent students are a no-op.
    async fn remove_student(&self, course_id: &str, student_id: &str) -> Result<(), RepoError>;

    /// Writes the grade only if the student is on the roster at the time of the write.
    async fn upsert_grade(
        &self,
        course_id: &str,
        student_id: &str,
        grade: f64,
        at: PrimitiveDateTime,
    ) -> Result<GradeOutcome, RepoError>;
}

#[async_trait]
pub(crate) trait Store: UserRepository + CourseRepository {
    fn backend(&self) -> StorageBackend;

    async fn ping(&self) -> Result<(), RepoError>;
}
