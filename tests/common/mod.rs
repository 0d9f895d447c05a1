#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;

use classroom_server::{
    app_state::{AppState, Repositories},
    auth::Caller,
    config::Config,
    errors::{AppError, AppResult},
    models::{
        domain::{
            Assignment, AssignmentSubmission, CourseOffering, Enrollment, Material, OfferingStatus,
            Quiz, QuizAttempt, QuizQuestion, Section, SubmissionKind, User, UserRole,
        },
        dto::request::OfferingFilter,
    },
    repositories::{
        AssignmentRepository, CourseOfferingRepository, EnrollmentRepository, GradeRecord,
        MaterialRepository, QuizAttemptRepository, QuizRepository, SectionRepository,
        SubmissionRepository, UserRepository,
    },
    storage::FileStorage,
};

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, User>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> AppResult<User> {
        let mut users = self.users.write().await;
        let clash = users.values().any(|u| {
            u.username == user.username
                || (user.student_number.is_some() && u.student_number == user.student_number)
        });
        if clash || users.contains_key(&user.id) {
            return Err(AppError::AlreadyExists(format!("user {}", user.username)));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_identifier(&self, identifier: &str) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.username == identifier || u.student_number.as_deref() == Some(identifier))
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<User>> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn find_all(&self) -> AppResult<Vec<User>> {
        Ok(self.users.read().await.values().cloned().collect())
    }
}

#[derive(Default)]
pub struct InMemoryCourseOfferingRepository {
    offerings: RwLock<HashMap<String, CourseOffering>>,
}

#[async_trait]
impl CourseOfferingRepository for InMemoryCourseOfferingRepository {
    async fn create(&self, offering: CourseOffering) -> AppResult<CourseOffering> {
        self.offerings
            .write()
            .await
            .insert(offering.id.clone(), offering.clone());
        Ok(offering)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<CourseOffering>> {
        Ok(self.offerings.read().await.get(id).cloned())
    }

    async fn list(&self, filter: &OfferingFilter) -> AppResult<Vec<CourseOffering>> {
        let offerings = self.offerings.read().await;
        Ok(offerings
            .values()
            .filter(|o| filter.term.as_ref().map_or(true, |t| &o.term == t))
            .filter(|o| filter.status.map_or(true, |s| o.status == s))
            .cloned()
            .collect())
    }

    async fn list_by_instructor(
        &self,
        instructor_id: &str,
        status: Option<OfferingStatus>,
    ) -> AppResult<Vec<CourseOffering>> {
        let offerings = self.offerings.read().await;
        Ok(offerings
            .values()
            .filter(|o| o.is_taught_by(instructor_id))
            .filter(|o| status.map_or(true, |s| o.status == s))
            .cloned()
            .collect())
    }

    async fn update(&self, offering: CourseOffering) -> AppResult<CourseOffering> {
        let mut offerings = self.offerings.write().await;
        if !offerings.contains_key(&offering.id) {
            return Err(AppError::NotFound(format!("course offering {}", offering.id)));
        }
        offerings.insert(offering.id.clone(), offering.clone());
        Ok(offering)
    }

    async fn update_status(
        &self,
        id: &str,
        status: OfferingStatus,
        now: DateTime<Utc>,
    ) -> AppResult<Option<CourseOffering>> {
        let mut offerings = self.offerings.write().await;
        Ok(offerings.get_mut(id).map(|o| {
            o.status = status;
            o.modified_at = Some(now);
            o.clone()
        }))
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        Ok(self.offerings.write().await.remove(id).is_some())
    }
}

#[derive(Default)]
pub struct InMemoryEnrollmentRepository {
    enrollments: RwLock<HashMap<String, Enrollment>>,
}

#[async_trait]
impl EnrollmentRepository for InMemoryEnrollmentRepository {
    async fn create(&self, enrollment: Enrollment) -> AppResult<Enrollment> {
        let mut enrollments = self.enrollments.write().await;
        if enrollments.values().any(|e| {
            e.course_offering_id == enrollment.course_offering_id
                && e.student_id == enrollment.student_id
        }) {
            return Err(AppError::AlreadyExists("enrollment".to_string()));
        }
        enrollments.insert(enrollment.id.clone(), enrollment.clone());
        Ok(enrollment)
    }

    async fn find(
        &self,
        course_offering_id: &str,
        student_id: &str,
    ) -> AppResult<Option<Enrollment>> {
        let enrollments = self.enrollments.read().await;
        Ok(enrollments
            .values()
            .find(|e| e.course_offering_id == course_offering_id && e.student_id == student_id)
            .cloned())
    }

    async fn find_active(
        &self,
        course_offering_id: &str,
        student_id: &str,
    ) -> AppResult<Option<Enrollment>> {
        Ok(self
            .find(course_offering_id, student_id)
            .await?
            .filter(Enrollment::is_active))
    }

    async fn update(&self, enrollment: Enrollment) -> AppResult<Enrollment> {
        let mut enrollments = self.enrollments.write().await;
        if !enrollments.contains_key(&enrollment.id) {
            return Err(AppError::NotFound(format!("enrollment {}", enrollment.id)));
        }
        enrollments.insert(enrollment.id.clone(), enrollment.clone());
        Ok(enrollment)
    }

    async fn list_by_offering(&self, course_offering_id: &str) -> AppResult<Vec<Enrollment>> {
        let enrollments = self.enrollments.read().await;
        Ok(enrollments
            .values()
            .filter(|e| e.course_offering_id == course_offering_id)
            .cloned()
            .collect())
    }

    async fn list_active_by_offering(
        &self,
        course_offering_id: &str,
    ) -> AppResult<Vec<Enrollment>> {
        let mut rows = self.list_by_offering(course_offering_id).await?;
        rows.retain(Enrollment::is_active);
        Ok(rows)
    }

    async fn count_active(&self, course_offering_id: &str) -> AppResult<u64> {
        Ok(self.list_active_by_offering(course_offering_id).await?.len() as u64)
    }

    async fn delete_by_offering(&self, course_offering_id: &str) -> AppResult<u64> {
        let mut enrollments = self.enrollments.write().await;
        let before = enrollments.len();
        enrollments.retain(|_, e| e.course_offering_id != course_offering_id);
        Ok((before - enrollments.len()) as u64)
    }
}

impl InMemoryEnrollmentRepository {
    pub async fn len(&self) -> usize {
        self.enrollments.read().await.len()
    }
}

#[derive(Default)]
pub struct InMemorySectionRepository {
    sections: RwLock<HashMap<String, Section>>,
}

#[async_trait]
impl SectionRepository for InMemorySectionRepository {
    async fn create(&self, section: Section) -> AppResult<Section> {
        let mut sections = self.sections.write().await;
        if sections.values().any(|s| {
            s.course_offering_id == section.course_offering_id && s.order == section.order
        }) {
            return Err(AppError::AlreadyExists("section order".to_string()));
        }
        sections.insert(section.id.clone(), section.clone());
        Ok(section)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Section>> {
        Ok(self.sections.read().await.get(id).cloned())
    }

    async fn update(&self, section: Section) -> AppResult<Section> {
        let mut sections = self.sections.write().await;
        if !sections.contains_key(&section.id) {
            return Err(AppError::NotFound(format!("section {}", section.id)));
        }
        if sections.values().any(|s| {
            s.id != section.id
                && s.course_offering_id == section.course_offering_id
                && s.order == section.order
        }) {
            return Err(AppError::AlreadyExists("section order".to_string()));
        }
        sections.insert(section.id.clone(), section.clone());
        Ok(section)
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        Ok(self.sections.write().await.remove(id).is_some())
    }

    async fn find_by_order(
        &self,
        course_offering_id: &str,
        order: i32,
    ) -> AppResult<Option<Section>> {
        let sections = self.sections.read().await;
        Ok(sections
            .values()
            .find(|s| s.course_offering_id == course_offering_id && s.order == order)
            .cloned())
    }

    async fn max_order(&self, course_offering_id: &str) -> AppResult<Option<i32>> {
        let sections = self.sections.read().await;
        Ok(sections
            .values()
            .filter(|s| s.course_offering_id == course_offering_id)
            .map(|s| s.order)
            .max())
    }

    async fn list_by_offering(&self, course_offering_id: &str) -> AppResult<Vec<Section>> {
        let sections = self.sections.read().await;
        let mut rows: Vec<Section> = sections
            .values()
            .filter(|s| s.course_offering_id == course_offering_id)
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.order);
        Ok(rows)
    }

    async fn delete_by_offering(&self, course_offering_id: &str) -> AppResult<u64> {
        let mut sections = self.sections.write().await;
        let before = sections.len();
        sections.retain(|_, s| s.course_offering_id != course_offering_id);
        Ok((before - sections.len()) as u64)
    }
}

#[derive(Default)]
pub struct InMemoryAssignmentRepository {
    assignments: RwLock<HashMap<String, Assignment>>,
}

#[async_trait]
impl AssignmentRepository for InMemoryAssignmentRepository {
    async fn create(&self, assignment: Assignment) -> AppResult<Assignment> {
        self.assignments
            .write()
            .await
            .insert(assignment.id.clone(), assignment.clone());
        Ok(assignment)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Assignment>> {
        Ok(self.assignments.read().await.get(id).cloned())
    }

    async fn update(&self, assignment: Assignment) -> AppResult<Assignment> {
        let mut assignments = self.assignments.write().await;
        if !assignments.contains_key(&assignment.id) {
            return Err(AppError::NotFound(format!("assignment {}", assignment.id)));
        }
        assignments.insert(assignment.id.clone(), assignment.clone());
        Ok(assignment)
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        Ok(self.assignments.write().await.remove(id).is_some())
    }

    async fn list_by_section(&self, section_id: &str) -> AppResult<Vec<Assignment>> {
        self.list_by_sections(&[section_id.to_string()]).await
    }

    async fn list_by_sections(&self, section_ids: &[String]) -> AppResult<Vec<Assignment>> {
        let assignments = self.assignments.read().await;
        let mut rows: Vec<Assignment> = assignments
            .values()
            .filter(|a| section_ids.contains(&a.section_id))
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.created_at);
        Ok(rows)
    }

    async fn delete_by_sections(&self, section_ids: &[String]) -> AppResult<u64> {
        let mut assignments = self.assignments.write().await;
        let before = assignments.len();
        assignments.retain(|_, a| !section_ids.contains(&a.section_id));
        Ok((before - assignments.len()) as u64)
    }
}

#[derive(Default)]
pub struct InMemoryQuizRepository {
    quizzes: RwLock<HashMap<String, Quiz>>,
}

#[async_trait]
impl QuizRepository for InMemoryQuizRepository {
    async fn create(&self, quiz: Quiz) -> AppResult<Quiz> {
        self.quizzes
            .write()
            .await
            .insert(quiz.id.clone(), quiz.clone());
        Ok(quiz)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Quiz>> {
        Ok(self.quizzes.read().await.get(id).cloned())
    }

    async fn update(&self, quiz: Quiz) -> AppResult<Quiz> {
        let mut quizzes = self.quizzes.write().await;
        if !quizzes.contains_key(&quiz.id) {
            return Err(AppError::NotFound(format!("quiz {}", quiz.id)));
        }
        quizzes.insert(quiz.id.clone(), quiz.clone());
        Ok(quiz)
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        Ok(self.quizzes.write().await.remove(id).is_some())
    }

    async fn list_by_section(&self, section_id: &str) -> AppResult<Vec<Quiz>> {
        self.list_by_sections(&[section_id.to_string()]).await
    }

    async fn list_by_sections(&self, section_ids: &[String]) -> AppResult<Vec<Quiz>> {
        let quizzes = self.quizzes.read().await;
        let mut rows: Vec<Quiz> = quizzes
            .values()
            .filter(|q| section_ids.contains(&q.section_id))
            .cloned()
            .collect();
        rows.sort_by_key(|q| q.created_at);
        Ok(rows)
    }

    async fn delete_by_sections(&self, section_ids: &[String]) -> AppResult<u64> {
        let mut quizzes = self.quizzes.write().await;
        let before = quizzes.len();
        quizzes.retain(|_, q| !section_ids.contains(&q.section_id));
        Ok((before - quizzes.len()) as u64)
    }
}

#[derive(Default)]
pub struct InMemoryMaterialRepository {
    materials: RwLock<HashMap<String, Material>>,
}

#[async_trait]
impl MaterialRepository for InMemoryMaterialRepository {
    async fn create(&self, material: Material) -> AppResult<Material> {
        self.materials
            .write()
            .await
            .insert(material.id.clone(), material.clone());
        Ok(material)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Material>> {
        Ok(self.materials.read().await.get(id).cloned())
    }

    async fn update(&self, material: Material) -> AppResult<Material> {
        let mut materials = self.materials.write().await;
        if !materials.contains_key(&material.id) {
            return Err(AppError::NotFound(format!("material {}", material.id)));
        }
        materials.insert(material.id.clone(), material.clone());
        Ok(material)
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        Ok(self.materials.write().await.remove(id).is_some())
    }

    async fn list_by_section(&self, section_id: &str) -> AppResult<Vec<Material>> {
        self.list_by_sections(&[section_id.to_string()]).await
    }

    async fn list_by_sections(&self, section_ids: &[String]) -> AppResult<Vec<Material>> {
        let materials = self.materials.read().await;
        let mut rows: Vec<Material> = materials
            .values()
            .filter(|m| section_ids.contains(&m.section_id))
            .cloned()
            .collect();
        rows.sort_by_key(|m| m.created_at);
        Ok(rows)
    }

    async fn delete_by_sections(&self, section_ids: &[String]) -> AppResult<u64> {
        let mut materials = self.materials.write().await;
        let before = materials.len();
        materials.retain(|_, m| !section_ids.contains(&m.section_id));
        Ok((before - materials.len()) as u64)
    }
}

#[derive(Default)]
pub struct InMemorySubmissionRepository {
    submissions: RwLock<HashMap<String, AssignmentSubmission>>,
}

#[async_trait]
impl SubmissionRepository for InMemorySubmissionRepository {
    async fn create(&self, submission: AssignmentSubmission) -> AppResult<AssignmentSubmission> {
        let mut submissions = self.submissions.write().await;
        if submissions.values().any(|s| {
            s.assignment_id == submission.assignment_id && s.student_id == submission.student_id
        }) {
            return Err(AppError::AlreadyExists("submission".to_string()));
        }
        submissions.insert(submission.id.clone(), submission.clone());
        Ok(submission)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<AssignmentSubmission>> {
        Ok(self.submissions.read().await.get(id).cloned())
    }

    async fn find_for_student(
        &self,
        assignment_id: &str,
        student_id: &str,
    ) -> AppResult<Option<AssignmentSubmission>> {
        let submissions = self.submissions.read().await;
        Ok(submissions
            .values()
            .find(|s| s.assignment_id == assignment_id && s.student_id == student_id)
            .cloned())
    }

    async fn replace_artifact_if_unchanged(
        &self,
        submission: &AssignmentSubmission,
        expected_submitted_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut submissions = self.submissions.write().await;
        match submissions.get_mut(&submission.id) {
            Some(stored) if stored.submitted_at == expected_submitted_at => {
                stored.file_path = submission.file_path.clone();
                stored.url = submission.url.clone();
                stored.submitted_at = submission.submitted_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn record_grade(
        &self,
        id: &str,
        grade: GradeRecord,
    ) -> AppResult<Option<AssignmentSubmission>> {
        let mut submissions = self.submissions.write().await;
        Ok(submissions.get_mut(id).map(|s| {
            s.score = Some(grade.score);
            s.feedback = grade.feedback;
            s.graded_by = Some(grade.graded_by);
            s.graded_at = Some(grade.graded_at);
            s.clone()
        }))
    }

    async fn list_by_assignment(
        &self,
        assignment_id: &str,
    ) -> AppResult<Vec<AssignmentSubmission>> {
        self.list_by_assignments(&[assignment_id.to_string()]).await
    }

    async fn list_by_assignments(
        &self,
        assignment_ids: &[String],
    ) -> AppResult<Vec<AssignmentSubmission>> {
        let submissions = self.submissions.read().await;
        let mut rows: Vec<AssignmentSubmission> = submissions
            .values()
            .filter(|s| assignment_ids.contains(&s.assignment_id))
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.submitted_at);
        Ok(rows)
    }

    async fn delete_by_assignments(&self, assignment_ids: &[String]) -> AppResult<u64> {
        let mut submissions = self.submissions.write().await;
        let before = submissions.len();
        submissions.retain(|_, s| !assignment_ids.contains(&s.assignment_id));
        Ok((before - submissions.len()) as u64)
    }
}

#[derive(Default)]
pub struct InMemoryQuizAttemptRepository {
    attempts: RwLock<HashMap<String, QuizAttempt>>,
}

#[async_trait]
impl QuizAttemptRepository for InMemoryQuizAttemptRepository {
    async fn create(&self, attempt: QuizAttempt) -> AppResult<QuizAttempt> {
        let mut attempts = self.attempts.write().await;
        if attempts.values().any(|a| {
            a.quiz_id == attempt.quiz_id
                && a.student_id == attempt.student_id
                && a.attempt_number == attempt.attempt_number
        }) {
            return Err(AppError::AlreadyExists("attempt number".to_string()));
        }
        attempts.insert(attempt.id.clone(), attempt.clone());
        Ok(attempt)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<QuizAttempt>> {
        Ok(self.attempts.read().await.get(id).cloned())
    }

    async fn find_unfinished(
        &self,
        quiz_id: &str,
        student_id: &str,
    ) -> AppResult<Option<QuizAttempt>> {
        let attempts = self.attempts.read().await;
        Ok(attempts
            .values()
            .find(|a| a.quiz_id == quiz_id && a.student_id == student_id && !a.is_finished())
            .cloned())
    }

    async fn max_attempt_number(&self, quiz_id: &str, student_id: &str) -> AppResult<Option<i32>> {
        let attempts = self.attempts.read().await;
        Ok(attempts
            .values()
            .filter(|a| a.quiz_id == quiz_id && a.student_id == student_id)
            .map(|a| a.attempt_number)
            .max())
    }

    async fn list_for_student(
        &self,
        quiz_id: &str,
        student_id: &str,
    ) -> AppResult<Vec<QuizAttempt>> {
        let attempts = self.attempts.read().await;
        let mut rows: Vec<QuizAttempt> = attempts
            .values()
            .filter(|a| a.quiz_id == quiz_id && a.student_id == student_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.attempt_number.cmp(&a.attempt_number));
        Ok(rows)
    }

    async fn list_by_quiz(&self, quiz_id: &str) -> AppResult<Vec<QuizAttempt>> {
        self.list_by_quizzes(&[quiz_id.to_string()]).await
    }

    async fn list_by_quizzes(&self, quiz_ids: &[String]) -> AppResult<Vec<QuizAttempt>> {
        let attempts = self.attempts.read().await;
        Ok(attempts
            .values()
            .filter(|a| quiz_ids.contains(&a.quiz_id))
            .cloned()
            .collect())
    }

    async fn finish_if_unfinished(
        &self,
        id: &str,
        answers: Vec<Value>,
        score: i32,
        finished_at: DateTime<Utc>,
    ) -> AppResult<Option<QuizAttempt>> {
        let mut attempts = self.attempts.write().await;
        Ok(match attempts.get_mut(id) {
            Some(attempt) if !attempt.is_finished() => {
                attempt.answers = Some(answers);
                attempt.score = Some(score);
                attempt.finished_at = Some(finished_at);
                Some(attempt.clone())
            }
            _ => None,
        })
    }

    async fn delete_by_quizzes(&self, quiz_ids: &[String]) -> AppResult<u64> {
        let mut attempts = self.attempts.write().await;
        let before = attempts.len();
        attempts.retain(|_, a| !quiz_ids.contains(&a.quiz_id));
        Ok((before - attempts.len()) as u64)
    }
}

/// Keeps uploads in memory; paths follow the `<dir>/<n>-<filename>` shape.
#[derive(Default)]
pub struct InMemoryFileStorage {
    files: RwLock<HashMap<String, Vec<u8>>>,
    stored: AtomicUsize,
}

impl InMemoryFileStorage {
    pub async fn contains(&self, path: &str) -> bool {
        self.files.read().await.contains_key(path)
    }

    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }
}

#[async_trait]
impl FileStorage for InMemoryFileStorage {
    async fn store(&self, dir: &str, filename: &str, bytes: &[u8]) -> AppResult<String> {
        let n = self.stored.fetch_add(1, Ordering::SeqCst) + 1;
        let path = format!("{}/{}-{}", dir, n, filename);
        let mut files = self.files.write().await;
        files.insert(path.clone(), bytes.to_vec());
        Ok(path)
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        self.files.write().await.remove(path);
        Ok(())
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        Ok(self.contains(path).await)
    }

    fn url_for(&self, path: &str) -> String {
        format!("http://files.test/{}", path)
    }
}

/// In-memory stores plus an `AppState` wired over them.
pub struct TestApp {
    pub users: Arc<InMemoryUserRepository>,
    pub offerings: Arc<InMemoryCourseOfferingRepository>,
    pub enrollments: Arc<InMemoryEnrollmentRepository>,
    pub sections: Arc<InMemorySectionRepository>,
    pub assignments: Arc<InMemoryAssignmentRepository>,
    pub quizzes: Arc<InMemoryQuizRepository>,
    pub materials: Arc<InMemoryMaterialRepository>,
    pub submissions: Arc<InMemorySubmissionRepository>,
    pub attempts: Arc<InMemoryQuizAttemptRepository>,
    pub files: Arc<InMemoryFileStorage>,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        let files = Arc::new(InMemoryFileStorage::default());
        Self::with_storage(files.clone(), files)
    }

    /// Wires the services over `storage` while `files` stays inspectable.
    pub fn with_storage(files: Arc<InMemoryFileStorage>, storage: Arc<dyn FileStorage>) -> Self {
        let users = Arc::new(InMemoryUserRepository::default());
        let offerings = Arc::new(InMemoryCourseOfferingRepository::default());
        let enrollments = Arc::new(InMemoryEnrollmentRepository::default());
        let sections = Arc::new(InMemorySectionRepository::default());
        let assignments = Arc::new(InMemoryAssignmentRepository::default());
        let quizzes = Arc::new(InMemoryQuizRepository::default());
        let materials = Arc::new(InMemoryMaterialRepository::default());
        let submissions = Arc::new(InMemorySubmissionRepository::default());
        let attempts = Arc::new(InMemoryQuizAttemptRepository::default());

        let repositories = Repositories {
            users: users.clone(),
            offerings: offerings.clone(),
            enrollments: enrollments.clone(),
            sections: sections.clone(),
            assignments: assignments.clone(),
            quizzes: quizzes.clone(),
            materials: materials.clone(),
            submissions: submissions.clone(),
            attempts: attempts.clone(),
        };

        let mut config = Config::from_env();
        config.max_upload_bytes = 1024;
        let state = AppState::from_parts(config, repositories, storage);

        Self {
            users,
            offerings,
            enrollments,
            sections,
            assignments,
            quizzes,
            materials,
            submissions,
            attempts,
            files,
            state,
        }
    }

    pub async fn user(&self, name: &str, role: UserRole) -> User {
        let username = name.to_lowercase().replace(' ', ".");
        let mut user = User::new(name, &username, &format!("{}@example.com", username), role);
        if role == UserRole::Student {
            user.student_number = Some(format!("S-{}", username));
        }
        self.users.create(user).await.expect("user should be stored")
    }

    pub async fn offering(&self, instructor: &User) -> CourseOffering {
        let offering = CourseOffering::new_draft("template-1", "A", "2026/2027-1", &instructor.id);
        self.offerings
            .create(offering)
            .await
            .expect("offering should be stored")
    }

    pub async fn enroll(&self, offering: &CourseOffering, student: &User) -> Enrollment {
        self.enrollments
            .create(Enrollment::new_active(&offering.id, &student.id, Utc::now()))
            .await
            .expect("enrollment should be stored")
    }

    pub async fn section(&self, offering: &CourseOffering, order: i32) -> Section {
        self.sections
            .create(Section::new(&offering.id, &format!("Week {}", order), order))
            .await
            .expect("section should be stored")
    }

    pub async fn quiz(&self, section: &Section, questions: Vec<QuizQuestion>) -> Quiz {
        self.store_quiz(Quiz::new(&section.id, "Quiz", questions)).await
    }

    pub async fn store_quiz(&self, quiz: Quiz) -> Quiz {
        self.quizzes.create(quiz).await.expect("quiz should be stored")
    }

    pub async fn assignment(
        &self,
        section: &Section,
        kind: SubmissionKind,
        deadline: Option<DateTime<Utc>>,
        allow_late: bool,
    ) -> Assignment {
        let mut assignment = Assignment::new(&section.id, "Assignment", kind);
        assignment.deadline = deadline;
        assignment.allow_late = allow_late;
        self.assignments
            .create(assignment)
            .await
            .expect("assignment should be stored")
    }
}

pub fn caller(user: &User) -> Caller {
    Caller::from(user)
}

/// One mcq worth 5 (answer "B") and one essay worth 5, as authored JSON.
pub fn mcq_and_essay() -> Vec<QuizQuestion> {
    serde_json::from_value(serde_json::json!([
        { "id": "q1", "type": "mcq", "options": ["A", "B"], "answer": "B", "points": 5 },
        { "id": "q2", "type": "essay", "points": 5 }
    ]))
    .expect("questions should parse")
}
