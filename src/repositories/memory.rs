use async_trait::async_trait;
use time::PrimitiveDateTime;
use tokio::sync::RwLock;

use crate::core::config::StorageBackend;
use crate::db::models::{Course, CourseAggregate, Grade, User};
use crate::db::types::UserRole;
use crate::repositories::{
    CourseRepository, CreateCourse, CreateUser, EnrollOutcome, GradeOutcome, RepoError, Store,
    UpdateCourse, UserRepository,
};

/// Process-local store. Every mutation happens under the write lock, so each
/// check-then-write is atomic with respect to other requests.
#[derive(Default)]
pub(crate) struct MemoryStore {
    state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    users: Vec<User>,
    courses: Vec<CourseAggregate>,
}

impl MemoryState {
    fn course_mut(&mut self, id: &str) -> Option<&mut CourseAggregate> {
        self.courses.iter_mut().find(|aggregate| aggregate.course.id == id)
    }
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, params: CreateUser<'_>) -> Result<User, RepoError> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|user| user.email == params.email) {
            return Err(RepoError::UniqueViolation("email"));
        }

        let user = User {
            id: params.id.to_string(),
            name: params.name.to_string(),
            email: params.email.to_string(),
            hashed_password: params.hashed_password,
            role: params.role,
            created_at: params.created_at,
            updated_at: params.created_at,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>, RepoError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|user| user.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|user| user.email == email).cloned())
    }

    async fn find_users(&self, ids: &[String]) -> Result<Vec<User>, RepoError> {
        let state = self.state.read().await;
        Ok(state.users.iter().filter(|user| ids.contains(&user.id)).cloned().collect())
    }

    async fn list_users_by_role(&self, role: UserRole) -> Result<Vec<User>, RepoError> {
        let state = self.state.read().await;
        Ok(state.users.iter().filter(|user| user.role == role).cloned().collect())
    }
}

#[async_trait]
impl CourseRepository for MemoryStore {
    async fn insert_course(&self, params: CreateCourse<'_>) -> Result<CourseAggregate, RepoError> {
        let aggregate = CourseAggregate {
            course: Course {
                id: params.id.to_string(),
                title: params.title.to_string(),
                description: params.description.to_string(),
                start_date: params.start_date,
                end_date: params.end_date,
                teacher_id: params.teacher_id.to_string(),
                created_at: params.created_at,
                updated_at: params.created_at,
            },
            students: Vec::new(),
            grades: Vec::new(),
        };

        self.state.write().await.courses.push(aggregate.clone());
        Ok(aggregate)
    }

    async fn find_course(&self, id: &str) -> Result<Option<CourseAggregate>, RepoError> {
        let state = self.state.read().await;
        Ok(state.courses.iter().find(|aggregate| aggregate.course.id == id).cloned())
    }

    async fn list_courses(&self) -> Result<Vec<CourseAggregate>, RepoError> {
        Ok(self.state.read().await.courses.clone())
    }

    async fn list_courses_for_teacher(
        &self,
        teacher_id: &str,
    ) -> Result<Vec<CourseAggregate>, RepoError> {
        let state = self.state.read().await;
        Ok(state
            .courses
            .iter()
            .filter(|aggregate| aggregate.course.teacher_id == teacher_id)
            .cloned()
            .collect())
    }

    async fn list_courses_for_student(
        &self,
        student_id: &str,
    ) -> Result<Vec<CourseAggregate>, RepoError> {
        let state = self.state.read().await;
        Ok(state
            .courses
            .iter()
            .filter(|aggregate| aggregate.has_student(student_id))
            .cloned()
            .collect())
    }

    async fn update_course(&self, id: &str, params: UpdateCourse) -> Result<bool, RepoError> {
        let mut state = self.state.write().await;
        let Some(aggregate) = state.course_mut(id) else {
            return Ok(false);
        };

        let course = &mut aggregate.course;
        if let Some(title) = params.title {
            course.title = title;
        }
        if let Some(description) = params.description {
            course.description = description;
        }
        if let Some(start_date) = params.start_date {
            course.start_date = start_date;
        }
        if let Some(end_date) = params.end_date {
            course.end_date = end_date;
        }
        if let Some(teacher_id) = params.teacher_id {
            course.teacher_id = teacher_id;
        }
        if let Some(updated_at) = params.updated_at {
            course.updated_at = updated_at;
        }

        Ok(true)
    }

    async fn delete_course(&self, id: &str) -> Result<bool, RepoError> {
        let mut state = self.state.write().await;
        let before = state.courses.len();
        state.courses.retain(|aggregate| aggregate.course.id != id);
        Ok(state.courses.len() != before)
    }

    async fn add_student(
        &self,
        course_id: &str,
        student_id: &str,
        _enrolled_at: PrimitiveDateTime,
    ) -> Result<EnrollOutcome, RepoError> {
        let mut state = self.state.write().await;
        let Some(aggregate) = state.course_mut(course_id) else {
            return Ok(EnrollOutcome::CourseMissing);
        };

        if aggregate.has_student(student_id) {
            return Ok(EnrollOutcome::AlreadyEnrolled);
        }

        aggregate.students.push(student_id.to_string());
        Ok(EnrollOutcome::Enrolled)
    }

    async fn remove_student(&self, course_id: &str, student_id: &str) -> Result<(), RepoError> {
        let mut state = self.state.write().await;
        if let Some(aggregate) = state.course_mut(course_id) {
            aggregate.students.retain(|id| id != student_id);
        }
        Ok(())
    }

    async fn upsert_grade(
        &self,
        course_id: &str,
        student_id: &str,
        grade: f64,
        at: PrimitiveDateTime,
    ) -> Result<GradeOutcome, RepoError> {
        let mut state = self.state.write().await;
        let Some(aggregate) = state.course_mut(course_id) else {
            return Ok(GradeOutcome::CourseMissing);
        };

        if !aggregate.has_student(student_id) {
            return Ok(GradeOutcome::NotEnrolled);
        }

        if let Some(existing) =
            aggregate.grades.iter_mut().find(|entry| entry.student_id == student_id)
        {
            existing.grade = grade;
            existing.updated_at = at;
            return Ok(GradeOutcome::Overwritten);
        }

        aggregate.grades.push(Grade {
            course_id: course_id.to_string(),
            student_id: student_id.to_string(),
            grade,
            assigned_at: at,
            updated_at: at,
        });
        Ok(GradeOutcome::Inserted)
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Memory
    }

    async fn ping(&self) -> Result<(), RepoError> {
        Ok(())
    }
}
