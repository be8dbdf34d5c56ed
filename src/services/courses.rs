use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use time::Date;
use uuid::Uuid;

use crate::core::time::primitive_now_utc;
use crate::db::models::{CourseAggregate, Grade, User};
use crate::db::types::UserRole;
use crate::repositories::{
    CreateCourse, EnrollOutcome, GradeOutcome, RepoError, Store, UpdateCourse,
};

#[derive(Debug, Error)]
pub(crate) enum CourseError {
    #[error("Course not found")]
    NotFound,
    #[error("Student is already enrolled in this course")]
    AlreadyEnrolled,
    #[error("Student is already enrolled")]
    StudentAlreadyEnrolled,
    #[error("Student is not enrolled in this course")]
    NotEnrolled,
    #[error("You do not have permission to remove this student")]
    Forbidden,
    #[error("No grades found for this student")]
    NoGradesFound,
    #[error("No grade found for this student")]
    NoGradeFound,
    #[error("{0}")]
    NoCoursesFound(&'static str),
    #[error(transparent)]
    Repository(#[from] RepoError),
}

pub(crate) struct NewCourse {
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) start_date: Date,
    pub(crate) end_date: Date,
    pub(crate) teacher_id: String,
}

#[derive(Debug, Default)]
pub(crate) struct CourseChanges {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) start_date: Option<Date>,
    pub(crate) end_date: Option<Date>,
    pub(crate) teacher_id: Option<String>,
}

/// A course with its teacher and roster resolved to accounts. References
/// that no longer resolve are dropped from `students` and leave `teacher` empty.
#[derive(Debug)]
pub(crate) struct CourseView {
    pub(crate) aggregate: CourseAggregate,
    pub(crate) teacher: Option<User>,
    pub(crate) students: Vec<User>,
}

#[derive(Debug)]
pub(crate) struct GradeView {
    pub(crate) grade: Grade,
    pub(crate) student: Option<User>,
}

/// Owner of every course's roster and grade book.
#[derive(Clone)]
pub(crate) struct CourseService {
    store: Arc<dyn Store>,
}

impl CourseService {
    pub(crate) fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub(crate) async fn create(&self, new: NewCourse) -> Result<CourseAggregate, CourseError> {
        let id = Uuid::new_v4().to_string();
        let course = self
            .store
            .insert_course(CreateCourse {
                id: &id,
                title: &new.title,
                description: &new.description,
                start_date: new.start_date,
                end_date: new.end_date,
                teacher_id: &new.teacher_id,
                created_at: primitive_now_utc(),
            })
            .await?;
        Ok(course)
    }

    pub(crate) async fn update(
        &self,
        course_id: &str,
        changes: CourseChanges,
    ) -> Result<CourseAggregate, CourseError> {
        let updated = self
            .store
            .update_course(
                course_id,
                UpdateCourse {
                    title: changes.title,
                    description: changes.description,
                    start_date: changes.start_date,
                    end_date: changes.end_date,
                    teacher_id: changes.teacher_id,
                    updated_at: Some(primitive_now_utc()),
                },
            )
            .await?;
        if !updated {
            return Err(CourseError::NotFound);
        }

        self.load(course_id).await
    }

    pub(crate) async fn delete(&self, course_id: &str) -> Result<(), CourseError> {
        if self.store.delete_course(course_id).await? {
            Ok(())
        } else {
            Err(CourseError::NotFound)
        }
    }

    pub(crate) async fn list_all(&self) -> Result<Vec<CourseView>, CourseError> {
        let courses = self.store.list_courses().await?;
        self.resolve(courses).await
    }

    pub(crate) async fn get_by_id(&self, course_id: &str) -> Result<CourseView, CourseError> {
        let course = self.load(course_id).await?;
        let mut views = self.resolve(vec![course]).await?;
        views.pop().ok_or(CourseError::NotFound)
    }

    /// Self-service enrollment by the student.
    pub(crate) async fn enroll(
        &self,
        course_id: &str,
        student_id: &str,
    ) -> Result<CourseAggregate, CourseError> {
        self.add_student(course_id, student_id).await
    }

    /// Enrollment performed by an Admin on a student's behalf.
    pub(crate) async fn enroll_by_admin(
        &self,
        course_id: &str,
        student_id: &str,
    ) -> Result<CourseAggregate, CourseError> {
        self.add_student(course_id, student_id).await.map_err(|err| match err {
            CourseError::AlreadyEnrolled => CourseError::StudentAlreadyEnrolled,
            other => other,
        })
    }

    /// Staff may remove anyone; students only themselves. Removing an absent
    /// student succeeds unchanged, and any grade row for the student is kept.
    pub(crate) async fn remove_student(
        &self,
        course_id: &str,
        student_id: &str,
        caller_id: &str,
        caller_role: UserRole,
    ) -> Result<CourseAggregate, CourseError> {
        self.load(course_id).await?;

        if !caller_role.is_staff() && caller_id != student_id {
            return Err(CourseError::Forbidden);
        }

        self.store.remove_student(course_id, student_id).await?;
        self.load(course_id).await
    }

    pub(crate) async fn assign_grade(
        &self,
        course_id: &str,
        student_id: &str,
        grade: f64,
    ) -> Result<CourseAggregate, CourseError> {
        match self.store.upsert_grade(course_id, student_id, grade, primitive_now_utc()).await? {
            GradeOutcome::Inserted | GradeOutcome::Overwritten => self.load(course_id).await,
            GradeOutcome::NotEnrolled => Err(CourseError::NotEnrolled),
            GradeOutcome::CourseMissing => Err(CourseError::NotFound),
        }
    }

    /// Every grade row of the caller in the course. An empty result covers both
    /// "not enrolled" and "not graded yet".
    pub(crate) async fn grades_for_student(
        &self,
        course_id: &str,
        caller_id: &str,
    ) -> Result<Vec<GradeView>, CourseError> {
        let course = self.load(course_id).await?;
        let grades: Vec<Grade> = course.grades_for(caller_id).cloned().collect();
        if grades.is_empty() {
            return Err(CourseError::NoGradesFound);
        }

        let student = self.store.find_user(caller_id).await?;
        Ok(grades.into_iter().map(|grade| GradeView { grade, student: student.clone() }).collect())
    }

    pub(crate) async fn grade_for_student(
        &self,
        course_id: &str,
        caller_id: &str,
    ) -> Result<GradeView, CourseError> {
        let course = self.load(course_id).await?;
        let Some(grade) = course.grades_for(caller_id).next().cloned() else {
            return Err(CourseError::NoGradeFound);
        };

        let student = self.store.find_user(caller_id).await?;
        Ok(GradeView { grade, student })
    }

    pub(crate) async fn list_for_teacher(
        &self,
        teacher_id: &str,
    ) -> Result<Vec<CourseView>, CourseError> {
        let courses = self.store.list_courses_for_teacher(teacher_id).await?;
        if courses.is_empty() {
            return Err(CourseError::NoCoursesFound("No courses assigned to this teacher"));
        }
        self.resolve(courses).await
    }

    pub(crate) async fn list_for_student(
        &self,
        student_id: &str,
    ) -> Result<Vec<CourseView>, CourseError> {
        let courses = self.store.list_courses_for_student(student_id).await?;
        if courses.is_empty() {
            return Err(CourseError::NoCoursesFound("No courses enrolled"));
        }
        self.resolve(courses).await
    }

    async fn add_student(
        &self,
        course_id: &str,
        student_id: &str,
    ) -> Result<CourseAggregate, CourseError> {
        match self.store.add_student(course_id, student_id, primitive_now_utc()).await? {
            EnrollOutcome::Enrolled => self.load(course_id).await,
            EnrollOutcome::AlreadyEnrolled => Err(CourseError::AlreadyEnrolled),
            EnrollOutcome::CourseMissing => Err(CourseError::NotFound),
        }
    }

    async fn load(&self, course_id: &str) -> Result<CourseAggregate, CourseError> {
        self.store.find_course(course_id).await?.ok_or(CourseError::NotFound)
    }

    /// Resolves teachers and students of all courses with a single user lookup.
    async fn resolve(&self, courses: Vec<CourseAggregate>) -> Result<Vec<CourseView>, CourseError> {
        let mut ids: Vec<String> = Vec::new();
        for course in &courses {
            ids.push(course.course.teacher_id.clone());
            ids.extend(course.students.iter().cloned());
        }
        ids.sort();
        ids.dedup();

        let users: HashMap<String, User> = self
            .store
            .find_users(&ids)
            .await?
            .into_iter()
            .map(|user| (user.id.clone(), user))
            .collect();

        Ok(courses
            .into_iter()
            .map(|aggregate| {
                let teacher = users.get(&aggregate.course.teacher_id).cloned();
                let students =
                    aggregate.students.iter().filter_map(|id| users.get(id).cloned()).collect();
                CourseView { aggregate, teacher, students }
            })
            .collect())
    }
}
