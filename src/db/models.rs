use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, PrimitiveDateTime};

use crate::db::types::UserRole;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) hashed_password: String,
    pub(crate) role: UserRole,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Course {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) start_date: Date,
    pub(crate) end_date: Date,
    pub(crate) teacher_id: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Enrollment {
    pub(crate) course_id: String,
    pub(crate) student_id: String,
    pub(crate) enrolled_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub(crate) struct Grade {
    pub(crate) course_id: String,
    pub(crate) student_id: String,
    pub(crate) grade: f64,
    pub(crate) assigned_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// A course together with the roster and grade book it owns.
/// `students` is ordered by enrollment time, `grades` by first assignment.
#[derive(Debug, Clone)]
pub(crate) struct CourseAggregate {
    pub(crate) course: Course,
    pub(crate) students: Vec<String>,
    pub(crate) grades: Vec<Grade>,
}

impl CourseAggregate {
    pub(crate) fn has_student(&self, student_id: &str) -> bool {
        self.students.iter().any(|id| id == student_id)
    }

    pub(crate) fn grades_for<'a>(&'a self, student_id: &'a str) -> impl Iterator<Item = &'a Grade> {
        self.grades.iter().filter(move |grade| grade.student_id == student_id)
    }
}
