use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use time::PrimitiveDateTime;

use super::PgStore;
use crate::db::models::{Course, CourseAggregate, Enrollment, Grade};
use crate::repositories::{
    CourseRepository, CreateCourse, EnrollOutcome, GradeOutcome, RepoError, UpdateCourse,
};

const COURSE_COLUMNS: &str =
    "id, title, description, start_date, end_date, teacher_id, created_at, updated_at";

#[async_trait]
impl CourseRepository for PgStore {
    async fn insert_course(&self, params: CreateCourse<'_>) -> Result<CourseAggregate, RepoError> {
        let course = sqlx::query_as::<_, Course>(&format!(
            "INSERT INTO courses (
                id, title, description, start_date, end_date, teacher_id, created_at, updated_at
             ) VALUES ($1,$2,$3,$4,$5,$6,$7,$7)
             RETURNING {COURSE_COLUMNS}",
        ))
        .bind(params.id)
        .bind(params.title)
        .bind(params.description)
        .bind(params.start_date)
        .bind(params.end_date)
        .bind(params.teacher_id)
        .bind(params.created_at)
        .fetch_one(self.pool())
        .await?;

        Ok(CourseAggregate { course, students: Vec::new(), grades: Vec::new() })
    }

    async fn find_course(&self, id: &str) -> Result<Option<CourseAggregate>, RepoError> {
        let course = sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        let Some(course) = course else {
            return Ok(None);
        };

        let mut aggregates = load_aggregates(self.pool(), vec![course]).await?;
        Ok(aggregates.pop())
    }

    async fn list_courses(&self) -> Result<Vec<CourseAggregate>, RepoError> {
        let courses = sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses ORDER BY created_at, id"
        ))
        .fetch_all(self.pool())
        .await?;

        Ok(load_aggregates(self.pool(), courses).await?)
    }

    async fn list_courses_for_teacher(
        &self,
        teacher_id: &str,
    ) -> Result<Vec<CourseAggregate>, RepoError> {
        let courses = sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE teacher_id = $1 ORDER BY created_at, id"
        ))
        .bind(teacher_id)
        .fetch_all(self.pool())
        .await?;

        Ok(load_aggregates(self.pool(), courses).await?)
    }

    async fn list_courses_for_student(
        &self,
        student_id: &str,
    ) -> Result<Vec<CourseAggregate>, RepoError> {
        let courses = sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses
             WHERE id IN (SELECT course_id FROM course_students WHERE student_id = $1)
             ORDER BY created_at, id"
        ))
        .bind(student_id)
        .fetch_all(self.pool())
        .await?;

        Ok(load_aggregates(self.pool(), courses).await?)
    }

    async fn update_course(&self, id: &str, params: UpdateCourse) -> Result<bool, RepoError> {
        let result = sqlx::query(
            "UPDATE courses SET
                title = COALESCE($1, title),
                description = COALESCE($2, description),
                start_date = COALESCE($3, start_date),
                end_date = COALESCE($4, end_date),
                teacher_id = COALESCE($5, teacher_id),
                updated_at = COALESCE($6, updated_at)
             WHERE id = $7",
        )
        .bind(params.title)
        .bind(params.description)
        .bind(params.start_date)
        .bind(params.end_date)
        .bind(params.teacher_id)
        .bind(params.updated_at)
        .bind(id)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_course(&self, id: &str) -> Result<bool, RepoError> {
        let result =
            sqlx::query("DELETE FROM courses WHERE id = $1").bind(id).execute(self.pool()).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_student(
        &self,
        course_id: &str,
        student_id: &str,
        enrolled_at: PrimitiveDateTime,
    ) -> Result<EnrollOutcome, RepoError> {
        let result = sqlx::query(
            "INSERT INTO course_students (course_id, student_id, enrolled_at)
             SELECT id, $2, $3 FROM courses WHERE id = $1
             ON CONFLICT (course_id, student_id) DO NOTHING",
        )
        .bind(course_id)
        .bind(student_id)
        .bind(enrolled_at)
        .execute(self.pool())
        .await?;

        if result.rows_affected() > 0 {
            return Ok(EnrollOutcome::Enrolled);
        }

        if course_exists(self.pool(), course_id).await? {
            Ok(EnrollOutcome::AlreadyEnrolled)
        } else {
            Ok(EnrollOutcome::CourseMissing)
        }
    }

    async fn remove_student(&self, course_id: &str, student_id: &str) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM course_students WHERE course_id = $1 AND student_id = $2")
            .bind(course_id)
            .bind(student_id)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    async fn upsert_grade(
        &self,
        course_id: &str,
        student_id: &str,
        grade: f64,
        at: PrimitiveDateTime,
    ) -> Result<GradeOutcome, RepoError> {
        // xmax is zero only for freshly inserted tuples.
        let inserted: Option<bool> = sqlx::query_scalar(
            "INSERT INTO course_grades (course_id, student_id, grade, assigned_at, updated_at)
             SELECT course_id, student_id, $3, $4, $4
             FROM course_students WHERE course_id = $1 AND student_id = $2
             ON CONFLICT (course_id, student_id)
             DO UPDATE SET grade = EXCLUDED.grade, updated_at = EXCLUDED.updated_at
             RETURNING (xmax = 0)",
        )
        .bind(course_id)
        .bind(student_id)
        .bind(grade)
        .bind(at)
        .fetch_optional(self.pool())
        .await?;

        match inserted {
            Some(true) => Ok(GradeOutcome::Inserted),
            Some(false) => Ok(GradeOutcome::Overwritten),
            None => {
                if course_exists(self.pool(), course_id).await? {
                    Ok(GradeOutcome::NotEnrolled)
                } else {
                    Ok(GradeOutcome::CourseMissing)
                }
            }
        }
    }
}

async fn course_exists(pool: &PgPool, course_id: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM courses WHERE id = $1)")
        .bind(course_id)
        .fetch_one(pool)
        .await
}

async fn load_aggregates(
    pool: &PgPool,
    courses: Vec<Course>,
) -> Result<Vec<CourseAggregate>, sqlx::Error> {
    if courses.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<String> = courses.iter().map(|course| course.id.clone()).collect();

    let enrollments = sqlx::query_as::<_, Enrollment>(
        "SELECT course_id, student_id, enrolled_at
         FROM course_students
         WHERE course_id = ANY($1)
         ORDER BY enrolled_at, student_id",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let grades = sqlx::query_as::<_, Grade>(
        "SELECT course_id, student_id, grade, assigned_at, updated_at
         FROM course_grades
         WHERE course_id = ANY($1)
         ORDER BY assigned_at, student_id",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let mut students_by_course: HashMap<String, Vec<String>> = HashMap::new();
    for enrollment in enrollments {
        students_by_course.entry(enrollment.course_id).or_default().push(enrollment.student_id);
    }

    let mut grades_by_course: HashMap<String, Vec<Grade>> = HashMap::new();
    for grade in grades {
        grades_by_course.entry(grade.course_id.clone()).or_default().push(grade);
    }

    Ok(courses
        .into_iter()
        .map(|course| CourseAggregate {
            students: students_by_course.remove(&course.id).unwrap_or_default(),
            grades: grades_by_course.remove(&course.id).unwrap_or_default(),
            course,
        })
        .collect())
}
