use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use time::Date;
use validator::Validate;

use crate::core::time::{format_date, format_primitive, parse_date_flexible};
use crate::db::models::{CourseAggregate, Grade};
use crate::schemas::user::UserSummary;
use crate::services::courses::{CourseChanges, CourseView, GradeView, NewCourse};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CourseCreate {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    pub(crate) description: String,
    #[serde(alias = "startDate", deserialize_with = "deserialize_date_flexible")]
    pub(crate) start_date: Date,
    #[serde(alias = "endDate", deserialize_with = "deserialize_date_flexible")]
    pub(crate) end_date: Date,
    #[serde(alias = "teacherId", alias = "teacher")]
    #[validate(length(min = 1, message = "teacher_id must not be empty"))]
    pub(crate) teacher_id: String,
}

impl CourseCreate {
    pub(crate) fn into_new_course(self) -> NewCourse {
        NewCourse {
            title: self.title,
            description: self.description,
            start_date: self.start_date,
            end_date: self.end_date,
            teacher_id: self.teacher_id,
        }
    }
}

/// Partial update. Fields outside this set (roster, grades, ids) are ignored.
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CourseUpdate {
    #[serde(default)]
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(
        default,
        alias = "startDate",
        deserialize_with = "deserialize_option_date_flexible"
    )]
    pub(crate) start_date: Option<Date>,
    #[serde(default, alias = "endDate", deserialize_with = "deserialize_option_date_flexible")]
    pub(crate) end_date: Option<Date>,
    #[serde(default, alias = "teacherId", alias = "teacher")]
    #[validate(length(min = 1, message = "teacher_id must not be empty"))]
    pub(crate) teacher_id: Option<String>,
}

impl CourseUpdate {
    pub(crate) fn into_changes(self) -> CourseChanges {
        CourseChanges {
            title: self.title,
            description: self.description,
            start_date: self.start_date,
            end_date: self.end_date,
            teacher_id: self.teacher_id,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct EnrollStudentRequest {
    #[serde(alias = "studentId")]
    #[validate(length(min = 1, message = "student_id must not be empty"))]
    pub(crate) student_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct GradeAssign {
    #[serde(alias = "studentId")]
    #[validate(length(min = 1, message = "student_id must not be empty"))]
    pub(crate) student_id: String,
    pub(crate) grade: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct GradeEntry {
    pub(crate) student_id: String,
    pub(crate) grade: f64,
}

impl GradeEntry {
    fn from_db(grade: Grade) -> Self {
        Self { student_id: grade.student_id, grade: grade.grade }
    }
}

/// Course as stored: teacher and students by id.
#[derive(Debug, Serialize)]
pub(crate) struct CourseResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) start_date: String,
    pub(crate) end_date: String,
    pub(crate) teacher_id: String,
    pub(crate) students: Vec<String>,
    pub(crate) grades: Vec<GradeEntry>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl CourseResponse {
    pub(crate) fn from_db(aggregate: CourseAggregate) -> Self {
        let CourseAggregate { course, students, grades } = aggregate;
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            start_date: format_date(course.start_date),
            end_date: format_date(course.end_date),
            teacher_id: course.teacher_id,
            students,
            grades: grades.into_iter().map(GradeEntry::from_db).collect(),
            created_at: format_primitive(course.created_at),
            updated_at: format_primitive(course.updated_at),
        }
    }
}

/// Course with teacher and students resolved to profiles.
#[derive(Debug, Serialize)]
pub(crate) struct CourseDetailResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) start_date: String,
    pub(crate) end_date: String,
    pub(crate) teacher_id: String,
    pub(crate) teacher: Option<UserSummary>,
    pub(crate) students: Vec<UserSummary>,
    pub(crate) grades: Vec<GradeEntry>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl CourseDetailResponse {
    pub(crate) fn from_view(view: CourseView) -> Self {
        let CourseAggregate { course, grades, .. } = view.aggregate;
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            start_date: format_date(course.start_date),
            end_date: format_date(course.end_date),
            teacher_id: course.teacher_id,
            teacher: view.teacher.map(UserSummary::from_db),
            students: view.students.into_iter().map(UserSummary::from_db).collect(),
            grades: grades.into_iter().map(GradeEntry::from_db).collect(),
            created_at: format_primitive(course.created_at),
            updated_at: format_primitive(course.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseMessageResponse {
    pub(crate) message: String,
    pub(crate) course: CourseResponse,
}

impl CourseMessageResponse {
    pub(crate) fn new(message: &str, course: CourseAggregate) -> Self {
        Self { message: message.to_string(), course: CourseResponse::from_db(course) }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct GradeResponse {
    pub(crate) course_id: String,
    pub(crate) student_id: String,
    pub(crate) student: Option<UserSummary>,
    pub(crate) grade: f64,
    pub(crate) assigned_at: String,
    pub(crate) updated_at: String,
}

impl GradeResponse {
    pub(crate) fn from_view(view: GradeView) -> Self {
        let GradeView { grade, student } = view;
        Self {
            course_id: grade.course_id,
            student_id: grade.student_id,
            student: student.map(UserSummary::from_db),
            grade: grade.grade,
            assigned_at: format_primitive(grade.assigned_at),
            updated_at: format_primitive(grade.updated_at),
        }
    }
}

fn deserialize_date_flexible<'de, D>(deserializer: D) -> Result<Date, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date_flexible(&raw).ok_or_else(|| D::Error::custom(format!("invalid date: {raw}")))
}

fn deserialize_option_date_flexible<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
        Some(raw) => parse_date_flexible(&raw)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid date: {raw}"))),
        None => Ok(None),
    }
}
